//! Create/edit/delete flow shared by every record page.

use crate::backend::{BackendError, BackendResult, BlobStore, DocumentStore, FilePayload};
use crate::models::{Doc, Entity};
use crate::upload::upload_file;
use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub(crate) enum SubmitError {
    /// Nothing was saved.
    #[error("upload failed: {0}")]
    Upload(BackendError),

    /// An upload that preceded this may now be orphaned.
    #[error("save failed: {0}")]
    Save(BackendError),
}

impl SubmitError {
    pub fn cause(&self) -> &BackendError {
        match self {
            Self::Upload(e) | Self::Save(e) => e,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum SubmitOutcome {
    Created(String),
    Updated(String),
}

/// Form values plus what the next submit will do with them.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct EditForm<E> {
    pub values: E,
    /// Identifier being edited; `None` means the next submit creates.
    pub edit_target: Option<String>,
    pub pending_file: Option<FilePayload>,
    /// Bumped by every reset, re-target and new pick; a file read that
    /// started under an older value is discarded.
    file_epoch: u64,
}

impl<E: Entity> EditForm<E> {
    pub fn is_editing(&self) -> bool {
        self.edit_target.is_some()
    }

    pub fn submit_label(&self) -> &'static str {
        if self.is_editing() {
            "Actualizar"
        } else {
            "Crear"
        }
    }

    /// Takes the text inputs; the file-kind value is not typed by the user,
    /// so the one already on the form is kept.
    pub fn merge_text_inputs(&mut self, mut inputs: E) {
        if let Some(field) = E::file_field() {
            inputs.set(field.key, self.values.get(field.key).unwrap_or_default());
        }
        self.values = inputs;
    }

    /// Loads a row into the form; the next submit updates it.
    pub fn begin_edit(&mut self, doc: &Doc<E>) {
        self.values = doc.data.clone();
        self.edit_target = Some(doc.id.clone());
        self.clear_file();
    }

    pub fn cancel(&mut self) {
        let file_epoch = self.file_epoch + 1;
        *self = Self {
            file_epoch,
            ..Self::default()
        };
    }

    /// Drops the picked file and any read still in flight.
    pub fn clear_file(&mut self) {
        self.pending_file = None;
        self.file_epoch += 1;
    }

    /// Ticket for a file read about to start. Supersedes earlier reads.
    pub fn begin_file_read(&mut self) -> u64 {
        self.file_epoch += 1;
        self.file_epoch
    }

    /// Stores the payload unless the form moved on since `ticket` was taken.
    pub fn finish_file_read(&mut self, ticket: u64, payload: FilePayload) -> bool {
        if ticket != self.file_epoch {
            return false;
        }
        self.pending_file = Some(payload);
        true
    }

    /// Uploads the picked file (if any), then creates or patches. The form
    /// resets only on success.
    pub async fn submit<S, B>(&mut self, store: &S, blobs: &B) -> Result<SubmitOutcome, SubmitError>
    where
        S: DocumentStore,
        B: BlobStore,
    {
        let mut data = self.values.clone();

        if let (Some(file), Some(field)) = (&self.pending_file, E::file_field()) {
            let url = upload_file(blobs, file).await.map_err(SubmitError::Upload)?;
            data.set(field.key, url);
        }

        let outcome = match &self.edit_target {
            Some(id) => store
                .patch(id, &data)
                .await
                .map(|()| SubmitOutcome::Updated(id.clone())),
            None => store.create(&data).await.map(SubmitOutcome::Created),
        }
        .map_err(|e| {
            tracing::error!(
                collection = E::COLLECTION,
                target = ?self.edit_target,
                error = %e,
                "save failed"
            );
            SubmitError::Save(e)
        })?;

        self.cancel();
        Ok(outcome)
    }
}

pub(crate) fn delete_prompt<E: Entity>() -> String {
    format!("¿Estás seguro de eliminar {}?", E::NOUN)
}

/// Deletes after `confirm` agrees. Returns whether a delete was sent.
pub(crate) async fn delete_record<E, S>(
    store: &S,
    id: &str,
    confirm: impl FnOnce(&str) -> bool,
) -> BackendResult<bool>
where
    E: Entity,
    S: DocumentStore,
{
    if !confirm(&delete_prompt::<E>()) {
        return Ok(false);
    }
    store.remove::<E>(id).await.inspect_err(|e| {
        tracing::error!(collection = E::COLLECTION, %id, error = %e, "delete failed");
    })?;
    Ok(true)
}
