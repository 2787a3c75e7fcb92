use crate::keys::validate_object_name;
use crate::traits::{ByteStream, Storage, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use futures::StreamExt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::{AsyncRead, AsyncWriteExt};
use uuid::Uuid;

/// Local filesystem storage implementation
///
/// Every object is one file directly under `base_path`. Writes go to a
/// dot-prefixed temporary file first and are linked into place only when
/// complete, so readers never observe a partial object.
#[derive(Clone, Debug)]
pub struct LocalStorage {
    base_path: PathBuf,
}

impl LocalStorage {
    /// Create a new LocalStorage instance, creating `base_path` if absent
    ///
    /// # Arguments
    /// * `base_path` - Root directory for object files (e.g., "/var/lib/photodrop")
    pub async fn new(base_path: impl Into<PathBuf>) -> StorageResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(LocalStorage { base_path })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn name_to_path(&self, name: &str) -> StorageResult<PathBuf> {
        validate_object_name(name)?;
        Ok(self.base_path.join(name))
    }

    fn temp_path(&self, name: &str) -> PathBuf {
        self.base_path
            .join(format!(".{}.{}.part", name, Uuid::new_v4().simple()))
    }

    /// Move a finished temporary file to `path` without replacing anything
    /// already stored there. The temporary file is removed either way.
    async fn publish(&self, temp: &Path, path: &Path, name: &str) -> StorageResult<()> {
        let linked = fs::hard_link(temp, path).await;
        if let Err(e) = fs::remove_file(temp).await {
            tracing::warn!(path = %temp.display(), error = %e, "Failed to remove temporary file");
        }
        match linked {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                Err(StorageError::AlreadyExists(name.to_string()))
            }
            Err(e) => Err(StorageError::UploadFailed(format!(
                "Failed to publish file {}: {}",
                path.display(),
                e
            ))),
        }
    }

    async fn discard(temp: &Path) {
        if let Err(e) = fs::remove_file(temp).await {
            if e.kind() != ErrorKind::NotFound {
                tracing::warn!(path = %temp.display(), error = %e, "Failed to remove partial upload");
            }
        }
    }
}

#[async_trait]
impl Storage for LocalStorage {
    async fn upload(&self, name: &str, data: Vec<u8>) -> StorageResult<()> {
        let mut reader = std::io::Cursor::new(data);
        self.upload_stream(name, &mut reader).await.map(|_| ())
    }

    async fn upload_stream(
        &self,
        name: &str,
        reader: &mut (dyn AsyncRead + Send + Unpin),
    ) -> StorageResult<u64> {
        let path = self.name_to_path(name)?;
        let temp = self.temp_path(name);
        let start = std::time::Instant::now();

        if fs::try_exists(&path).await.unwrap_or(false) {
            return Err(StorageError::AlreadyExists(name.to_string()));
        }

        let mut file = fs::File::create(&temp).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to create file {}: {}", temp.display(), e))
        })?;

        let written = async {
            let bytes_copied = tokio::io::copy(reader, &mut file).await.map_err(|e| {
                StorageError::UploadFailed(format!(
                    "Failed to write stream to file {}: {}",
                    temp.display(),
                    e
                ))
            })?;
            file.flush().await?;
            file.sync_all().await.map_err(|e| {
                StorageError::UploadFailed(format!("Failed to sync file {}: {}", temp.display(), e))
            })?;
            Ok::<u64, StorageError>(bytes_copied)
        }
        .await;
        drop(file);

        let bytes_copied = match written {
            Ok(n) => n,
            Err(e) => {
                Self::discard(&temp).await;
                return Err(e);
            }
        };

        self.publish(&temp, &path, name).await?;

        tracing::info!(
            path = %path.display(),
            name = %name,
            size_bytes = bytes_copied,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage upload successful"
        );

        Ok(bytes_copied)
    }

    async fn download(&self, name: &str) -> StorageResult<Vec<u8>> {
        let path = self.name_to_path(name)?;
        let start = std::time::Instant::now();

        let data = fs::read(&path).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => StorageError::NotFound(name.to_string()),
            _ => StorageError::DownloadFailed(format!(
                "Failed to read file {}: {}",
                path.display(),
                e
            )),
        })?;

        tracing::debug!(
            path = %path.display(),
            name = %name,
            size_bytes = data.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage download successful"
        );

        Ok(data)
    }

    async fn download_stream(&self, name: &str) -> StorageResult<ByteStream> {
        let path = self.name_to_path(name)?;
        let start = std::time::Instant::now();

        let file = fs::File::open(&path).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => StorageError::NotFound(name.to_string()),
            _ => StorageError::DownloadFailed(format!(
                "Failed to open file {}: {}",
                path.display(),
                e
            )),
        })?;

        let reader = tokio_util::io::ReaderStream::new(file);

        let key = name.to_string();
        let path_display = path.display().to_string();
        let stream = reader.map(move |result| {
            result.map_err(|e| {
                tracing::error!(
                    path = %path_display,
                    name = %key,
                    error = %e,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "Local storage stream download error"
                );
                StorageError::DownloadFailed(format!("Failed to read chunk: {}", e))
            })
        });

        Ok(Box::pin(stream))
    }

    async fn delete(&self, name: &str) -> StorageResult<()> {
        let path = self.name_to_path(name)?;

        match fs::remove_file(&path).await {
            Ok(()) => {
                tracing::debug!(path = %path.display(), name = %name, "Local storage delete successful");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::DeleteFailed(format!(
                "Failed to delete file {}: {}",
                path.display(),
                e
            ))),
        }
    }

    async fn exists(&self, name: &str) -> StorageResult<bool> {
        let path = self.name_to_path(name)?;
        Ok(fs::try_exists(&path).await.unwrap_or(false))
    }

    async fn content_length(&self, name: &str) -> StorageResult<u64> {
        let path = self.name_to_path(name)?;
        let meta = fs::metadata(&path).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => StorageError::NotFound(name.to_string()),
            _ => StorageError::BackendError(e.to_string()),
        })?;
        if !meta.is_file() {
            return Err(StorageError::NotFound(name.to_string()));
        }
        Ok(meta.len())
    }

    async fn check_health(&self) -> StorageResult<()> {
        let meta = fs::metadata(&self.base_path).await.map_err(|e| {
            StorageError::BackendError(format!(
                "Storage directory {} is not accessible: {}",
                self.base_path.display(),
                e
            ))
        })?;
        if !meta.is_dir() {
            return Err(StorageError::BackendError(format!(
                "{} is not a directory",
                self.base_path.display()
            )));
        }
        Ok(())
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}
