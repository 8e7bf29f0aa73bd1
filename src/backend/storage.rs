use super::{read_json, with_bearer, BackendError, BackendResult, BlobStore, FilePayload};
use crate::config::BackendConfig;

/// Blob-store REST client scoped to one signed-in user.
#[derive(Clone, Debug)]
pub(crate) struct StorageClient {
    config: BackendConfig,
    id_token: Option<String>,
}

impl StorageClient {
    pub fn new(config: BackendConfig, id_token: Option<String>) -> Self {
        Self { config, id_token }
    }

    pub(crate) fn upload_url(&self) -> String {
        format!("{}/b/{}/o", self.config.storage_url, self.config.storage_bucket)
    }

    /// Public download URL for an uploaded object.
    pub(crate) fn download_url(&self, object: &str, token: Option<&str>) -> String {
        let mut url = format!(
            "{}/b/{}/o/{}?alt=media",
            self.config.storage_url,
            self.config.storage_bucket,
            urlencoding::encode(object)
        );
        if let Some(token) = token.filter(|t| !t.is_empty()) {
            url.push_str("&token=");
            url.push_str(&urlencoding::encode(token));
        }
        url
    }

    /// Builds the URL from an upload response. The object may carry several
    /// comma-separated download tokens; the first one is used.
    pub(crate) fn url_from_upload_response(
        &self,
        key: &str,
        data: &serde_json::Value,
    ) -> String {
        let object = data
            .get("name")
            .and_then(|v| v.as_str())
            .unwrap_or(key);
        let token = data
            .get("downloadTokens")
            .and_then(|v| v.as_str())
            .and_then(|s| s.split(',').next());
        self.download_url(object, token)
    }
}

impl BlobStore for StorageClient {
    async fn upload(&self, key: &str, file: &FilePayload) -> BackendResult<String> {
        if self.config.storage_bucket.trim().is_empty() {
            return Err(BackendError::Config("storage bucket"));
        }

        let content_type = if file.content_type.is_empty() {
            "application/octet-stream"
        } else {
            file.content_type.as_str()
        };

        let req = reqwest::Client::new()
            .post(self.upload_url())
            .query(&[("uploadType", "media"), ("name", key)])
            .header("Content-Type", content_type)
            .body(file.bytes.clone());
        let res = with_bearer(req, self.id_token.as_deref()).send().await?;
        let data = read_json(res, "Upload failed").await?;

        Ok(self.url_from_upload_response(key, &data))
    }
}
