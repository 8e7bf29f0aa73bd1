//! Hosted backend access: identity, document store, blob store.
//!
//! Each service sits behind a small trait so the page logic can run against
//! the REST clients in the browser and against `memory` in tests.

mod auth;
mod error;
mod firestore;
#[cfg(test)]
pub(crate) mod memory;
mod storage;

pub(crate) use auth::IdentityClient;
pub(crate) use error::{AuthFailure, BackendError, BackendResult};
pub(crate) use firestore::FirestoreClient;
pub(crate) use storage::StorageClient;

use crate::models::{AuthUser, Doc, Entity};

/// Full delivery of a collection's current documents.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Snapshot<E> {
    pub docs: Vec<Doc<E>>,
    /// Changes whenever any document is added, removed or rewritten.
    pub version: u64,
}

/// A local file picked for upload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct FilePayload {
    pub name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

pub(crate) trait IdentityService {
    async fn sign_in(&self, email: &str, password: &str) -> BackendResult<AuthUser>;

    /// Confirms the user's ID token is still accepted.
    async fn lookup(&self, user: &AuthUser) -> BackendResult<()>;

    /// Exchanges the refresh token for a new ID token.
    async fn refresh(&self, user: &AuthUser) -> BackendResult<AuthUser>;
}

pub(crate) trait DocumentStore {
    async fn list<E: Entity>(&self) -> BackendResult<Snapshot<E>>;

    /// Creates a document; the store assigns and returns its identifier.
    async fn create<E: Entity>(&self, data: &E) -> BackendResult<String>;

    /// Overwrites every declared field of an existing document.
    async fn patch<E: Entity>(&self, id: &str, data: &E) -> BackendResult<()>;

    async fn remove<E: Entity>(&self, id: &str) -> BackendResult<()>;
}

pub(crate) trait BlobStore {
    /// Stores the bytes under `key` and returns a publicly fetchable URL.
    async fn upload(&self, key: &str, file: &FilePayload) -> BackendResult<String>;
}

/// Reads a JSON body, classifying non-success statuses.
pub(super) async fn read_json(
    res: reqwest::Response,
    context: &'static str,
) -> BackendResult<serde_json::Value> {
    let status = res.status();
    if status.is_success() {
        let text = res.text().await?;
        if text.trim().is_empty() {
            return Ok(serde_json::Value::Object(Default::default()));
        }
        serde_json::from_str(&text).map_err(BackendError::parse)
    } else {
        let body = res.text().await.unwrap_or_default();
        Err(BackendError::from_status(status.as_u16(), &body, context))
    }
}

fn with_bearer(req: reqwest::RequestBuilder, token: Option<&str>) -> reqwest::RequestBuilder {
    match token {
        Some(token) => req.header("Authorization", format!("Bearer {}", token)),
        None => req,
    }
}
