use crate::keys::validate_object_name;
use crate::traits::{ByteStream, Storage, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::RwLock;

const CHUNK_SIZE: usize = 64 * 1024;

/// In-memory storage implementation
///
/// Objects live for the lifetime of the process. Useful for tests and for
/// ephemeral deployments where nothing should touch the disk.
#[derive(Clone, Debug, Default)]
pub struct MemoryStorage {
    objects: Arc<RwLock<HashMap<String, Bytes>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored objects
    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.objects.read().await.is_empty()
    }

    async fn insert_new(&self, name: &str, data: Bytes) -> StorageResult<()> {
        let mut objects = self.objects.write().await;
        if objects.contains_key(name) {
            return Err(StorageError::AlreadyExists(name.to_string()));
        }
        objects.insert(name.to_string(), data);
        Ok(())
    }

    async fn get(&self, name: &str) -> StorageResult<Bytes> {
        validate_object_name(name)?;
        self.objects
            .read()
            .await
            .get(name)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(name.to_string()))
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn upload(&self, name: &str, data: Vec<u8>) -> StorageResult<()> {
        validate_object_name(name)?;
        let size = data.len();
        self.insert_new(name, Bytes::from(data)).await?;
        tracing::debug!(name = %name, size_bytes = size, "Memory storage upload successful");
        Ok(())
    }

    async fn upload_stream(
        &self,
        name: &str,
        reader: &mut (dyn AsyncRead + Send + Unpin),
    ) -> StorageResult<u64> {
        validate_object_name(name)?;
        if self.objects.read().await.contains_key(name) {
            return Err(StorageError::AlreadyExists(name.to_string()));
        }

        let mut data = Vec::new();
        reader.read_to_end(&mut data).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to read upload stream: {}", e))
        })?;

        let size = data.len() as u64;
        self.insert_new(name, Bytes::from(data)).await?;
        tracing::debug!(name = %name, size_bytes = size, "Memory storage stream upload successful");
        Ok(size)
    }

    async fn download(&self, name: &str) -> StorageResult<Vec<u8>> {
        Ok(self.get(name).await?.to_vec())
    }

    async fn download_stream(&self, name: &str) -> StorageResult<ByteStream> {
        let data = self.get(name).await?;
        let chunks: Vec<Result<Bytes, StorageError>> = (0..data.len())
            .step_by(CHUNK_SIZE)
            .map(|offset| Ok(data.slice(offset..(offset + CHUNK_SIZE).min(data.len()))))
            .collect();
        Ok(Box::pin(futures::stream::iter(chunks)))
    }

    async fn delete(&self, name: &str) -> StorageResult<()> {
        validate_object_name(name)?;
        self.objects.write().await.remove(name);
        Ok(())
    }

    async fn exists(&self, name: &str) -> StorageResult<bool> {
        validate_object_name(name)?;
        Ok(self.objects.read().await.contains_key(name))
    }

    async fn content_length(&self, name: &str) -> StorageResult<u64> {
        Ok(self.get(name).await?.len() as u64)
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Memory
    }
}
