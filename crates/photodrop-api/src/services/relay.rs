//! Upload and download-once lifecycle over a `Storage` backend.

use crate::constants::{FILE_NOT_FOUND, NO_FILE_UPLOADED};
use crate::error::storage_error_to_app_error;
use crate::services::consume::ConsumeOnComplete;
use axum::extract::Multipart;
use futures::StreamExt;
use photodrop_core::AppError;
use photodrop_storage::{
    validate_object_name, ClaimRegistry, ObjectNamer, Storage, StorageError,
};
use std::sync::Arc;
use tokio::io::AsyncRead;
use tokio_util::io::StreamReader;

/// Names tried before giving up when earlier objects already occupy them.
const MAX_NAME_ATTEMPTS: usize = 16;

#[derive(Debug, Clone)]
pub struct StoredObject {
    pub name: String,
    pub size: u64,
}

/// An object checked out for download. Dropping `body` before it is fully
/// read keeps the object; reading it to the end deletes it.
pub struct Checkout {
    pub name: String,
    pub content_length: u64,
    pub body: ConsumeOnComplete,
}

#[derive(Clone)]
pub struct RelayService {
    storage: Arc<dyn Storage>,
    namer: Arc<ObjectNamer>,
    claims: ClaimRegistry,
    upload_field: String,
}

impl RelayService {
    pub fn new(storage: Arc<dyn Storage>, upload_field: impl Into<String>) -> Self {
        Self {
            storage,
            namer: Arc::new(ObjectNamer::new()),
            claims: ClaimRegistry::new(),
            upload_field: upload_field.into(),
        }
    }

    pub fn claims(&self) -> &ClaimRegistry {
        &self.claims
    }

    /// Store the single file sent in the upload field.
    ///
    /// Parts with another field name, and parts in the upload field without a
    /// filename, are skipped. Either every failure leaves nothing stored, or
    /// exactly one object exists afterwards.
    pub async fn ingest(&self, multipart: Multipart) -> Result<StoredObject, AppError> {
        let mut stored = None;
        match self.read_upload(multipart, &mut stored).await {
            Ok(()) => stored.ok_or_else(|| AppError::InvalidInput(NO_FILE_UPLOADED.to_string())),
            Err(e) => {
                if let Some(object) = stored {
                    self.discard(&object.name).await;
                }
                Err(e)
            }
        }
    }

    async fn read_upload(
        &self,
        mut multipart: Multipart,
        stored: &mut Option<StoredObject>,
    ) -> Result<(), AppError> {
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::InvalidInput(format!("Failed to read multipart: {}", e)))?
        {
            if field.name() != Some(self.upload_field.as_str()) {
                continue;
            }
            let Some(original_filename) = field.file_name().map(|s| s.to_string()) else {
                tracing::debug!(field = %self.upload_field, "Skipping upload field without a filename");
                continue;
            };
            if stored.is_some() {
                return Err(AppError::InvalidInput(format!(
                    "Multiple files are not allowed; send exactly one file in '{}'",
                    self.upload_field
                )));
            }

            let mut reader =
                StreamReader::new(Box::pin(field.map(|chunk| chunk.map_err(std::io::Error::other))));
            *stored = Some(self.store(&original_filename, &mut reader).await?);
        }
        Ok(())
    }

    async fn store(
        &self,
        original_filename: &str,
        reader: &mut (dyn AsyncRead + Send + Unpin),
    ) -> Result<StoredObject, AppError> {
        let name = self.free_name(original_filename).await?;

        let size = self
            .storage
            .upload_stream(&name, reader)
            .await
            .map_err(|e| upload_failure(&name, e))?;

        tracing::info!(
            filename = %name,
            original_filename = %original_filename,
            size_bytes = size,
            "File uploaded"
        );
        Ok(StoredObject { name, size })
    }

    /// Next generated name not already present in the store.
    async fn free_name(&self, original_filename: &str) -> Result<String, AppError> {
        for _ in 0..MAX_NAME_ATTEMPTS {
            let name = self.namer.next_name(original_filename);
            let taken = self
                .storage
                .exists(&name)
                .await
                .map_err(|e| upload_failure(&name, e))?;
            if !taken {
                return Ok(name);
            }
            tracing::warn!(filename = %name, "Generated name already taken, trying next");
        }
        Err(AppError::Storage(format!(
            "No free object name after {} attempts",
            MAX_NAME_ATTEMPTS
        )))
    }

    async fn discard(&self, name: &str) {
        if let Err(e) = self.storage.delete(name).await {
            tracing::error!(error = %e, filename = %name, "Failed to remove rejected upload");
        }
    }

    /// Claim `name` for download and open its body.
    ///
    /// Unknown, invalid, already claimed and retired names all yield the same
    /// not-found error.
    pub async fn checkout(&self, name: &str) -> Result<Checkout, AppError> {
        check_name(name)?;

        let Some(claim) = self.claims.try_claim(name) else {
            if self.claims.is_retired(name) {
                self.prune_retired(name).await;
            } else {
                tracing::debug!(filename = %name, "File is being downloaded");
            }
            return Err(not_found());
        };

        let content_length = self
            .storage
            .content_length(name)
            .await
            .map_err(|e| self.lookup_failure(name, e))?;
        let stream = self
            .storage
            .download_stream(name)
            .await
            .map_err(|e| self.lookup_failure(name, e))?;

        tracing::debug!(filename = %name, size_bytes = content_length, "Streaming file");
        Ok(Checkout {
            name: name.to_string(),
            content_length,
            body: ConsumeOnComplete::new(stream, claim, content_length, self.storage.clone()),
        })
    }

    /// Size of a downloadable object without claiming or consuming it.
    pub async fn inspect(&self, name: &str) -> Result<StoredObject, AppError> {
        check_name(name)?;
        if self.claims.is_claimed(name) || self.claims.is_retired(name) {
            return Err(not_found());
        }

        let size = self
            .storage
            .content_length(name)
            .await
            .map_err(|e| self.lookup_failure(name, e))?;
        Ok(StoredObject {
            name: name.to_string(),
            size,
        })
    }

    /// Forget a retired name whose object has since left the store.
    async fn prune_retired(&self, name: &str) {
        match self.storage.exists(name).await {
            Ok(false) => {
                if self.claims.forget_retired(name) {
                    tracing::info!(filename = %name, "Retired file is gone, name released");
                }
            }
            Ok(true) => {
                tracing::debug!(filename = %name, "File was retired after a failed delete");
            }
            Err(e) => {
                tracing::warn!(error = %e, filename = %name, "Failed to check retired file");
            }
        }
    }

    fn lookup_failure(&self, name: &str, err: StorageError) -> AppError {
        match err {
            StorageError::NotFound(_) | StorageError::InvalidKey(_) => not_found(),
            other => {
                tracing::error!(error = %other, filename = %name, "Failed to read file from storage");
                storage_error_to_app_error(other)
            }
        }
    }
}

fn upload_failure(name: &str, err: StorageError) -> AppError {
    match err {
        StorageError::InvalidKey(reason) => {
            AppError::InvalidInput(format!("Unusable file name: {}", reason))
        }
        other => {
            tracing::error!(error = %other, filename = %name, "Failed to store uploaded file");
            storage_error_to_app_error(other)
        }
    }
}

fn check_name(name: &str) -> Result<(), AppError> {
    validate_object_name(name).map_err(|e| {
        tracing::debug!(error = %e, "Rejected download name");
        not_found()
    })
}

fn not_found() -> AppError {
    AppError::NotFound(FILE_NOT_FOUND.to_string())
}
