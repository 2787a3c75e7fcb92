//! Response body that deletes its object once the transfer completes.
//!
//! The body counts the bytes it hands to the transport. The object is removed
//! when every byte has been handed over, either when the inner stream ends or
//! when the server drops the body after writing the declared
//! `Content-Length`. An I/O error or an early drop (client disconnect) keeps
//! the object so a later request can retry. A body that was never polled
//! (a discarded response) counts as an early drop, even for an empty object.

use bytes::Bytes;
use futures::future::BoxFuture;
use futures::{FutureExt, Stream};
use photodrop_storage::{ByteStream, ObjectClaim, Storage};
use std::future::Future;
use std::io;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{ready, Context, Poll};

enum State {
    Streaming,
    Finalizing(BoxFuture<'static, ()>),
    Done,
}

pub struct ConsumeOnComplete {
    inner: ByteStream,
    state: State,
    name: String,
    expected_len: u64,
    sent: u64,
    started: bool,
    storage: Arc<dyn Storage>,
    claim: Option<ObjectClaim>,
}

impl ConsumeOnComplete {
    pub fn new(
        inner: ByteStream,
        claim: ObjectClaim,
        expected_len: u64,
        storage: Arc<dyn Storage>,
    ) -> Self {
        Self {
            inner,
            state: State::Streaming,
            name: claim.name().to_string(),
            expected_len,
            sent: 0,
            started: false,
            storage,
            claim: Some(claim),
        }
    }

    fn fully_sent(&self) -> bool {
        self.sent >= self.expected_len
    }

    fn finalize(&mut self) -> BoxFuture<'static, ()> {
        finish_download(
            self.storage.clone(),
            self.name.clone(),
            self.sent,
            self.claim.take(),
        )
        .boxed()
    }

    fn abandon(&mut self, reason: &str) {
        tracing::warn!(
            filename = %self.name,
            sent_bytes = self.sent,
            expected_bytes = self.expected_len,
            reason = reason,
            "Download interrupted, file kept for retry"
        );
        self.claim.take();
        self.state = State::Done;
    }
}

/// Remove a fully transferred object. A failed delete retires the claim so
/// the name is never served again by this process.
async fn finish_download(
    storage: Arc<dyn Storage>,
    name: String,
    sent: u64,
    claim: Option<ObjectClaim>,
) {
    match storage.delete(&name).await {
        Ok(()) => {
            tracing::info!(filename = %name, size_bytes = sent, "File deleted after download");
        }
        Err(e) => {
            tracing::error!(
                error = %e,
                filename = %name,
                "Failed to delete file after download"
            );
            if let Some(claim) = claim {
                claim.retire();
            }
        }
    }
}

impl Stream for ConsumeOnComplete {
    type Item = Result<Bytes, io::Error>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        this.started = true;
        loop {
            match &mut this.state {
                State::Streaming => match ready!(this.inner.as_mut().poll_next(cx)) {
                    Some(Ok(chunk)) => {
                        this.sent += chunk.len() as u64;
                        return Poll::Ready(Some(Ok(chunk)));
                    }
                    Some(Err(e)) => {
                        let reason = e.to_string();
                        this.abandon(&reason);
                        return Poll::Ready(Some(Err(io::Error::other(format!(
                            "Storage stream error: {}",
                            e
                        )))));
                    }
                    None => {
                        if this.fully_sent() {
                            this.state = State::Finalizing(this.finalize());
                        } else {
                            this.abandon("storage stream ended early");
                            return Poll::Ready(Some(Err(io::Error::new(
                                io::ErrorKind::UnexpectedEof,
                                "Storage stream ended before the declared length",
                            ))));
                        }
                    }
                },
                State::Finalizing(delete) => {
                    ready!(delete.as_mut().poll(cx));
                    this.state = State::Done;
                    return Poll::Ready(None);
                }
                State::Done => return Poll::Ready(None),
            }
        }
    }
}

impl Drop for ConsumeOnComplete {
    fn drop(&mut self) {
        let pending = match std::mem::replace(&mut self.state, State::Done) {
            State::Finalizing(delete) => delete,
            State::Streaming if self.started && self.fully_sent() => self.finalize(),
            State::Streaming => {
                self.abandon("response body dropped");
                return;
            }
            State::Done => return,
        };

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(pending);
            }
            Err(_) => {
                tracing::error!(
                    filename = %self.name,
                    "No runtime available to delete downloaded file"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use photodrop_storage::{ClaimRegistry, MemoryStorage, StorageError};

    async fn setup(data: &[u8]) -> (Arc<MemoryStorage>, ClaimRegistry, ConsumeOnComplete) {
        let memory = Arc::new(MemoryStorage::new());
        memory.upload("1.png", data.to_vec()).await.unwrap();
        let storage: Arc<dyn Storage> = memory.clone();
        let claims = ClaimRegistry::new();
        let claim = claims.try_claim("1.png").unwrap();
        let inner = storage.download_stream("1.png").await.unwrap();
        let body = ConsumeOnComplete::new(inner, claim, data.len() as u64, storage);
        (memory, claims, body)
    }

    #[tokio::test]
    async fn test_deleted_after_full_read() {
        let (memory, claims, body) = setup(b"\x89PNG").await;
        let chunks: Vec<Bytes> = body.map(|c| c.unwrap()).collect().await;

        assert_eq!(chunks.concat(), b"\x89PNG".to_vec());
        assert!(!memory.exists("1.png").await.unwrap());
        assert!(!claims.is_claimed("1.png"));
        assert!(!claims.is_retired("1.png"));
    }

    #[tokio::test]
    async fn test_kept_when_dropped_midway() {
        let data = vec![7u8; 200 * 1024];
        let (memory, claims, mut body) = setup(&data).await;

        let first = body.next().await.unwrap().unwrap();
        assert!(!first.is_empty());
        drop(body);

        assert!(memory.exists("1.png").await.unwrap());
        assert!(!claims.is_claimed("1.png"));
        assert!(claims.try_claim("1.png").is_some());
    }

    #[tokio::test]
    async fn test_dropped_after_last_byte_still_deletes() {
        let (memory, claims, mut body) = setup(b"abc").await;
        let chunk = body.next().await.unwrap().unwrap();
        assert_eq!(&chunk[..], b"abc");
        drop(body);

        for _ in 0..100 {
            if !memory.exists("1.png").await.unwrap() {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert!(!memory.exists("1.png").await.unwrap());
        assert!(!claims.is_retired("1.png"));
    }

    #[tokio::test]
    async fn test_stream_error_keeps_object() {
        let memory = Arc::new(MemoryStorage::new());
        memory.upload("1.png", b"data".to_vec()).await.unwrap();
        let storage: Arc<dyn Storage> = memory.clone();
        let claims = ClaimRegistry::new();
        let claim = claims.try_claim("1.png").unwrap();
        let inner: ByteStream = Box::pin(futures::stream::iter(vec![
            Ok(Bytes::from_static(b"da")),
            Err(StorageError::DownloadFailed("disk gone".to_string())),
        ]));

        let mut body = ConsumeOnComplete::new(inner, claim, 4, storage);
        assert!(body.next().await.unwrap().is_ok());
        assert!(body.next().await.unwrap().is_err());
        assert!(body.next().await.is_none());
        drop(body);

        assert!(memory.exists("1.png").await.unwrap());
        assert!(!claims.is_claimed("1.png"));
    }

    #[tokio::test]
    async fn test_unpolled_empty_body_keeps_object() {
        let (memory, claims, body) = setup(b"").await;
        drop(body);

        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        assert!(memory.exists("1.png").await.unwrap());
        assert!(!claims.is_claimed("1.png"));
    }

    #[tokio::test]
    async fn test_empty_body_deleted_once_polled() {
        let (memory, claims, mut body) = setup(b"").await;
        assert!(body.next().await.is_none());
        drop(body);

        assert!(!memory.exists("1.png").await.unwrap());
        assert!(!claims.is_retired("1.png"));
    }

    struct FailingDelete(MemoryStorage);

    #[async_trait::async_trait]
    impl Storage for FailingDelete {
        async fn upload(&self, name: &str, data: Vec<u8>) -> photodrop_storage::StorageResult<()> {
            self.0.upload(name, data).await
        }
        async fn upload_stream(
            &self,
            name: &str,
            reader: &mut (dyn tokio::io::AsyncRead + Send + Unpin),
        ) -> photodrop_storage::StorageResult<u64> {
            self.0.upload_stream(name, reader).await
        }
        async fn download(&self, name: &str) -> photodrop_storage::StorageResult<Vec<u8>> {
            self.0.download(name).await
        }
        async fn download_stream(&self, name: &str) -> photodrop_storage::StorageResult<ByteStream> {
            self.0.download_stream(name).await
        }
        async fn delete(&self, _name: &str) -> photodrop_storage::StorageResult<()> {
            Err(StorageError::DeleteFailed("read-only".to_string()))
        }
        async fn exists(&self, name: &str) -> photodrop_storage::StorageResult<bool> {
            self.0.exists(name).await
        }
        async fn content_length(&self, name: &str) -> photodrop_storage::StorageResult<u64> {
            self.0.content_length(name).await
        }
        fn backend_type(&self) -> photodrop_core::StorageBackend {
            self.0.backend_type()
        }
    }

    #[tokio::test]
    async fn test_failed_delete_retires_name() {
        let memory = MemoryStorage::new();
        memory.upload("1.png", b"x".to_vec()).await.unwrap();
        let storage: Arc<dyn Storage> = Arc::new(FailingDelete(memory));
        let claims = ClaimRegistry::new();
        let claim = claims.try_claim("1.png").unwrap();
        let inner = storage.download_stream("1.png").await.unwrap();

        let body = ConsumeOnComplete::new(inner, claim, 1, storage.clone());
        let chunks: Vec<_> = body.collect().await;
        assert_eq!(chunks.len(), 1);

        assert!(storage.exists("1.png").await.unwrap());
        assert!(claims.is_retired("1.png"));
        assert!(claims.try_claim("1.png").is_none());
    }
}
