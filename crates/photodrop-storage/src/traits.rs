//! Storage abstraction trait
//!
//! This module defines the Storage trait that all storage backends must implement.

use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use std::pin::Pin;
use thiserror::Error;
use tokio::io::AsyncRead;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Object already exists: {0}")]
    AlreadyExists(String),

    #[error("Invalid object name: {0}")]
    InvalidKey(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Chunked object body as produced by `Storage::download_stream`
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, StorageError>> + Send>>;

/// Storage abstraction trait
///
/// All storage backends (local filesystem, memory) implement this trait so the
/// relay never touches a concrete backend. Names are flat, see the crate root
/// documentation for the accepted format.
///
/// Writes never replace an existing object: uploading to a name that is
/// already present fails with `StorageError::AlreadyExists`, and a failed
/// write leaves nothing behind under the target name.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Store `data` under `name`
    async fn upload(&self, name: &str, data: Vec<u8>) -> StorageResult<()>;

    /// Store everything `reader` yields under `name`, returning the byte count
    ///
    /// The reader is consumed until EOF without buffering the whole object in
    /// memory (backend permitting). The object only becomes visible once the
    /// reader is exhausted.
    async fn upload_stream(
        &self,
        name: &str,
        reader: &mut (dyn AsyncRead + Send + Unpin),
    ) -> StorageResult<u64>;

    /// Read a whole object
    async fn download(&self, name: &str) -> StorageResult<Vec<u8>>;

    /// Read an object as a stream of chunks
    async fn download_stream(&self, name: &str) -> StorageResult<ByteStream>;

    /// Remove an object. Removing a missing object is not an error.
    async fn delete(&self, name: &str) -> StorageResult<()>;

    /// Check if an object exists
    async fn exists(&self, name: &str) -> StorageResult<bool>;

    /// Size in bytes of an object, `NotFound` when absent
    async fn content_length(&self, name: &str) -> StorageResult<u64>;

    /// Check that the backend can serve requests
    async fn check_health(&self) -> StorageResult<()> {
        Ok(())
    }

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;
}
