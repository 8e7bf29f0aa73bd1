//! In-memory stand-ins for the hosted services, used by unit tests.

use super::firestore::{decode_document, encode_fields};
use super::{
    AuthFailure, BackendError, BackendResult, BlobStore, DocumentStore, FilePayload,
    IdentityService, Snapshot,
};
use crate::models::{AuthUser, Doc, Entity};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::Mutex;

#[derive(Default)]
struct Inner {
    /// collection -> ordered (id, fields)
    collections: BTreeMap<String, Vec<(String, Value)>>,
    blobs: BTreeMap<String, FilePayload>,
    accounts: BTreeMap<String, String>,
    revoked_tokens: Vec<String>,
    next_id: u64,
    revision: u64,
    fail_writes: bool,
    fail_uploads: bool,
    fail_lists: bool,
    calls: Vec<String>,
}

#[derive(Default)]
pub(crate) struct MemoryBackend {
    inner: Mutex<Inner>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn with<T>(&self, f: impl FnOnce(&mut Inner) -> T) -> T {
        let mut guard = self.inner.lock().expect("memory backend lock poisoned");
        f(&mut guard)
    }

    pub fn insert<E: Entity>(&self, id: &str, data: &E) {
        self.with(|s| {
            s.revision += 1;
            s.collections
                .entry(E::COLLECTION.to_string())
                .or_default()
                .push((id.to_string(), encode_fields(data)));
        });
    }

    pub fn get<E: Entity>(&self, id: &str) -> Option<E> {
        self.with(|s| {
            s.collections
                .get(E::COLLECTION)?
                .iter()
                .find(|(doc_id, _)| doc_id == id)
                .and_then(|(doc_id, fields)| {
                    decode_document::<E>(&to_document(E::COLLECTION, doc_id, fields))
                })
                .map(|d| d.data)
        })
    }

    pub fn count(&self, collection: &str) -> usize {
        self.with(|s| s.collections.get(collection).map_or(0, |c| c.len()))
    }

    pub fn blob(&self, key: &str) -> Option<FilePayload> {
        self.with(|s| s.blobs.get(key).cloned())
    }

    pub fn blob_count(&self) -> usize {
        self.with(|s| s.blobs.len())
    }

    pub fn add_account(&self, email: &str, password: &str) {
        self.with(|s| {
            s.accounts.insert(email.to_string(), password.to_string());
        });
    }

    /// Makes the given ID token fail lookups, as if it had expired.
    pub fn revoke_token(&self, token: &str) {
        self.with(|s| s.revoked_tokens.push(token.to_string()));
    }

    pub fn fail_writes(&self, fail: bool) {
        self.with(|s| s.fail_writes = fail);
    }

    pub fn fail_uploads(&self, fail: bool) {
        self.with(|s| s.fail_uploads = fail);
    }

    pub fn fail_lists(&self, fail: bool) {
        self.with(|s| s.fail_lists = fail);
    }

    /// Operations received, in order (`"create:clientes"`, `"upload:<key>"`...).
    pub fn calls(&self) -> Vec<String> {
        self.with(|s| s.calls.clone())
    }
}

fn to_document(collection: &str, id: &str, fields: &Value) -> Value {
    json!({
        "name": format!("projects/test/databases/(default)/documents/{collection}/{id}"),
        "fields": fields,
    })
}

fn unavailable() -> BackendError {
    BackendError::Network("backend unavailable".to_string())
}

impl DocumentStore for MemoryBackend {
    async fn list<E: Entity>(&self) -> BackendResult<Snapshot<E>> {
        self.with(|s| {
            s.calls.push(format!("list:{}", E::COLLECTION));
            if s.fail_lists {
                return Err(unavailable());
            }
            let docs: Vec<Doc<E>> = s
                .collections
                .get(E::COLLECTION)
                .map(|c| {
                    c.iter()
                        .filter_map(|(id, fields)| {
                            decode_document::<E>(&to_document(E::COLLECTION, id, fields))
                        })
                        .collect()
                })
                .unwrap_or_default();
            Ok(Snapshot {
                docs,
                version: s.revision,
            })
        })
    }

    async fn create<E: Entity>(&self, data: &E) -> BackendResult<String> {
        self.with(|s| {
            s.calls.push(format!("create:{}", E::COLLECTION));
            if s.fail_writes {
                return Err(unavailable());
            }
            s.next_id += 1;
            s.revision += 1;
            let id = format!("doc-{}", s.next_id);
            s.collections
                .entry(E::COLLECTION.to_string())
                .or_default()
                .push((id.clone(), encode_fields(data)));
            Ok(id)
        })
    }

    async fn patch<E: Entity>(&self, id: &str, data: &E) -> BackendResult<()> {
        self.with(|s| {
            s.calls.push(format!("patch:{}:{}", E::COLLECTION, id));
            if s.fail_writes {
                return Err(unavailable());
            }
            let slot = s
                .collections
                .get_mut(E::COLLECTION)
                .and_then(|c| c.iter_mut().find(|(doc_id, _)| doc_id == id))
                .ok_or_else(|| BackendError::NotFound(id.to_string()))?;
            slot.1 = encode_fields(data);
            s.revision += 1;
            Ok(())
        })
    }

    async fn remove<E: Entity>(&self, id: &str) -> BackendResult<()> {
        self.with(|s| {
            s.calls.push(format!("remove:{}:{}", E::COLLECTION, id));
            if s.fail_writes {
                return Err(unavailable());
            }
            if let Some(c) = s.collections.get_mut(E::COLLECTION) {
                c.retain(|(doc_id, _)| doc_id != id);
            }
            s.revision += 1;
            Ok(())
        })
    }
}

impl BlobStore for MemoryBackend {
    async fn upload(&self, key: &str, file: &FilePayload) -> BackendResult<String> {
        self.with(|s| {
            s.calls.push(format!("upload:{key}"));
            if s.fail_uploads {
                return Err(unavailable());
            }
            s.blobs.insert(key.to_string(), file.clone());
            Ok(format!("https://blobs.test/{key}?alt=media"))
        })
    }
}

impl IdentityService for MemoryBackend {
    async fn sign_in(&self, email: &str, password: &str) -> BackendResult<AuthUser> {
        self.with(|s| {
            s.calls.push(format!("sign_in:{email}"));
            match s.accounts.get(email) {
                Some(p) if p == password => {
                    s.next_id += 1;
                    Ok(AuthUser {
                        uid: format!("uid-{email}"),
                        email: email.to_string(),
                        id_token: format!("id-{}", s.next_id),
                        refresh_token: format!("refresh-{email}"),
                    })
                }
                _ => Err(BackendError::Auth(AuthFailure::InvalidCredentials)),
            }
        })
    }

    async fn lookup(&self, user: &AuthUser) -> BackendResult<()> {
        self.with(|s| {
            s.calls.push("lookup".to_string());
            if s.revoked_tokens.contains(&user.id_token) {
                Err(BackendError::Auth(AuthFailure::SessionExpired))
            } else {
                Ok(())
            }
        })
    }

    async fn refresh(&self, user: &AuthUser) -> BackendResult<AuthUser> {
        self.with(|s| {
            s.calls.push("refresh".to_string());
            if user.refresh_token != format!("refresh-{}", user.email)
                || !s.accounts.contains_key(&user.email)
            {
                return Err(BackendError::Auth(AuthFailure::SessionExpired));
            }
            s.next_id += 1;
            Ok(AuthUser {
                id_token: format!("id-{}", s.next_id),
                ..user.clone()
            })
        })
    }
}
