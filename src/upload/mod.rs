//! Local file -> blob store -> public URL.

use crate::backend::{BackendError, BackendResult, BlobStore, FilePayload};
use wasm_bindgen_futures::JsFuture;

/// Random object name; never reused, so uploads cannot overwrite each other.
pub(crate) fn new_object_key() -> String {
    uuid::Uuid::new_v4().to_string()
}

pub(crate) async fn upload_file<B: BlobStore>(blobs: &B, file: &FilePayload) -> BackendResult<String> {
    let key = new_object_key();
    tracing::debug!(%key, name = %file.name, size = file.bytes.len(), "uploading file");

    let url = blobs.upload(&key, file).await.inspect_err(|e| {
        tracing::error!(%key, name = %file.name, error = %e, "upload failed");
    })?;
    Ok(url)
}

/// Reads a picked file's bytes.
pub(crate) async fn read_file(file: &web_sys::File) -> BackendResult<FilePayload> {
    let buffer = JsFuture::from(file.array_buffer())
        .await
        .map_err(BackendError::browser)?;
    Ok(FilePayload {
        name: file.name(),
        content_type: file.type_(),
        bytes: js_sys::Uint8Array::new(&buffer).to_vec(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::memory::MemoryBackend;
    use futures::executor::block_on;
    use std::collections::HashSet;

    fn payload() -> FilePayload {
        FilePayload {
            name: "escritura.pdf".to_string(),
            content_type: "application/pdf".to_string(),
            bytes: b"%PDF-1.4 demo".to_vec(),
        }
    }

    #[test]
    fn test_object_keys_are_unique_uuids() {
        let keys: HashSet<String> = (0..50).map(|_| new_object_key()).collect();
        assert_eq!(keys.len(), 50);
        for k in &keys {
            assert!(uuid::Uuid::parse_str(k).is_ok());
        }
    }

    #[test]
    fn test_upload_stores_bytes_under_fresh_key() {
        let backend = MemoryBackend::new();
        let url = block_on(upload_file(&backend, &payload())).expect("upload should succeed");

        let calls = backend.calls();
        assert_eq!(calls.len(), 1);
        let key = calls[0].strip_prefix("upload:").expect("upload call");
        assert_eq!(url, format!("https://blobs.test/{key}?alt=media"));
        assert_eq!(backend.blob(key), Some(payload()));
    }

    #[test]
    fn test_same_file_twice_gives_two_objects() {
        let backend = MemoryBackend::new();
        let a = block_on(upload_file(&backend, &payload())).expect("upload");
        let b = block_on(upload_file(&backend, &payload())).expect("upload");
        assert_ne!(a, b);
        assert_eq!(backend.blob_count(), 2);
    }

    #[test]
    fn test_upload_failure_propagates() {
        let backend = MemoryBackend::new();
        backend.fail_uploads(true);
        assert!(block_on(upload_file(&backend, &payload())).is_err());
        assert_eq!(backend.blob_count(), 0);
    }
}
