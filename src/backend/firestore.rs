use super::{read_json, with_bearer, BackendError, BackendResult, DocumentStore, Snapshot};
use crate::config::BackendConfig;
use crate::models::{Doc, Entity};
use serde_json::{json, Map, Value};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

const LIST_PAGE_SIZE: &str = "300";

/// Document-store REST client scoped to one signed-in user.
#[derive(Clone, Debug)]
pub(crate) struct FirestoreClient {
    config: BackendConfig,
    id_token: Option<String>,
}

impl FirestoreClient {
    pub fn new(config: BackendConfig, id_token: Option<String>) -> Self {
        Self { config, id_token }
    }

    fn ensure_configured(&self) -> BackendResult<()> {
        if self.config.project_id.trim().is_empty() {
            return Err(BackendError::Config("project id"));
        }
        Ok(())
    }

    pub(crate) fn collection_url(&self, collection: &str) -> String {
        format!("{}/{}", self.config.documents_url(), collection)
    }

    pub(crate) fn document_url(&self, collection: &str, id: &str) -> String {
        format!(
            "{}/{}",
            self.collection_url(collection),
            urlencoding::encode(id)
        )
    }

    fn authorized(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        with_bearer(req, self.id_token.as_deref())
    }
}

impl DocumentStore for FirestoreClient {
    async fn list<E: Entity>(&self) -> BackendResult<Snapshot<E>> {
        self.ensure_configured()?;
        let client = reqwest::Client::new();

        let mut docs = Vec::new();
        let mut stamps = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut query = vec![("pageSize", LIST_PAGE_SIZE.to_string())];
            if let Some(token) = page_token.take() {
                query.push(("pageToken", token));
            }

            let req = client
                .get(self.collection_url(E::COLLECTION))
                .query(&query);
            let res = self.authorized(req).send().await?;
            let data = read_json(res, "List failed").await?;

            let page = parse_list_response::<E>(&data);
            docs.extend(page.docs);
            stamps.extend(page.stamps);

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        Ok(Snapshot {
            version: snapshot_version(&stamps),
            docs,
        })
    }

    async fn create<E: Entity>(&self, data: &E) -> BackendResult<String> {
        self.ensure_configured()?;
        let req = reqwest::Client::new()
            .post(self.collection_url(E::COLLECTION))
            .json(&json!({ "fields": encode_fields(data) }));
        let res = self.authorized(req).send().await?;
        let created = read_json(res, "Create failed").await?;

        created
            .get("name")
            .and_then(|v| v.as_str())
            .and_then(document_id)
            .map(|s| s.to_string())
            .ok_or_else(|| {
                BackendError::Parse(format!(
                    "Create succeeded but response is missing the document name: {}",
                    created
                ))
            })
    }

    async fn patch<E: Entity>(&self, id: &str, data: &E) -> BackendResult<()> {
        self.ensure_configured()?;
        let mut query: Vec<(&str, &str)> = E::FIELDS
            .iter()
            .map(|f| ("updateMask.fieldPaths", f.key))
            .collect();
        // Patching a removed document must fail rather than resurrect it.
        query.push(("currentDocument.exists", "true"));

        let req = reqwest::Client::new()
            .patch(self.document_url(E::COLLECTION, id))
            .query(&query)
            .json(&json!({ "fields": encode_fields(data) }));
        let res = self.authorized(req).send().await?;
        read_json(res, "Update failed").await?;
        Ok(())
    }

    async fn remove<E: Entity>(&self, id: &str) -> BackendResult<()> {
        self.ensure_configured()?;
        let req = reqwest::Client::new().delete(self.document_url(E::COLLECTION, id));
        let res = self.authorized(req).send().await?;
        read_json(res, "Delete failed").await?;
        Ok(())
    }
}

/// One page of a collection listing.
#[derive(Debug)]
pub(crate) struct ListPage<E> {
    pub docs: Vec<Doc<E>>,
    /// `(id, updateTime)` per document, used for the snapshot version.
    pub stamps: Vec<(String, String)>,
    pub next_page_token: Option<String>,
}

/// Declared fields as document-store `fields`, all `stringValue`.
pub(crate) fn encode_fields<E: Entity>(data: &E) -> Value {
    let mut fields = Map::new();
    for f in E::FIELDS {
        let value = data.get(f.key).unwrap_or_default();
        fields.insert(f.key.to_string(), json!({ "stringValue": value }));
    }
    Value::Object(fields)
}

/// Stringifies one typed document-store value.
pub(crate) fn decode_value(v: &Value) -> String {
    let Some(obj) = v.as_object() else {
        return String::new();
    };
    let Some((kind, inner)) = obj.iter().next() else {
        return String::new();
    };

    match kind.as_str() {
        "nullValue" => String::new(),
        _ => match inner {
            Value::String(s) => s.clone(),
            Value::Null => String::new(),
            other => other.to_string(),
        },
    }
}

/// Last path segment of a document resource name.
pub(crate) fn document_id(name: &str) -> Option<&str> {
    name.rsplit('/').next().filter(|s| !s.is_empty())
}

pub(crate) fn decode_document<E: Entity>(item: &Value) -> Option<Doc<E>> {
    let id = item.get("name").and_then(|v| v.as_str()).and_then(document_id)?;

    let mut data = E::default();
    if let Some(fields) = item.get("fields").and_then(|v| v.as_object()) {
        for f in E::FIELDS {
            if let Some(v) = fields.get(f.key) {
                data.set(f.key, decode_value(v));
            }
        }
    }

    Some(Doc::new(id, data))
}

pub(crate) fn parse_list_response<E: Entity>(data: &Value) -> ListPage<E> {
    let list = data
        .get("documents")
        .and_then(|v| v.as_array())
        .map(|v| v.as_slice())
        .unwrap_or_default();

    let mut docs = Vec::with_capacity(list.len());
    let mut stamps = Vec::with_capacity(list.len());
    for item in list {
        if let Some(doc) = decode_document::<E>(item) {
            let updated = item
                .get("updateTime")
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string();
            stamps.push((doc.id.clone(), updated));
            docs.push(doc);
        }
    }

    ListPage {
        docs,
        stamps,
        next_page_token: data
            .get("nextPageToken")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string()),
    }
}

pub(crate) fn snapshot_version(stamps: &[(String, String)]) -> u64 {
    let mut hasher = DefaultHasher::new();
    stamps.len().hash(&mut hasher);
    for (id, updated) in stamps {
        id.hash(&mut hasher);
        updated.hash(&mut hasher);
    }
    hasher.finish()
}
