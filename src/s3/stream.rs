//! Buffered write stream for object storage.

use std::future::Future;
use std::io;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll, ready};

use tokio::io::AsyncWrite;

use super::client::ObjectClient;
use super::errors::map_s3_error;
use crate::{ErrorKind, FsError};

const OPERATION: &str = "create_write_stream";

type Upload = Pin<Box<dyn Future<Output = Result<(), FsError>> + Send>>;

enum State {
    Open,
    Uploading(Upload),
    Committed,
    /// The upload failed; every later call reports the same failure.
    Failed(ErrorKind, String),
}

/// Collects written bytes and uploads them as one object on shutdown.
///
/// Nothing reaches the bucket until `shutdown` completes. Dropping the
/// stream without shutting it down discards the data, and so does a failed
/// upload: the stream stays failed and is not retried.
pub(crate) struct ObjectWriteStream {
    client: Arc<dyn ObjectClient>,
    key: String,
    path: String,
    buffer: Vec<u8>,
    state: State,
}

impl ObjectWriteStream {
    pub(crate) fn new(client: Arc<dyn ObjectClient>, key: String, path: &str) -> Self {
        Self {
            client,
            key,
            path: path.to_owned(),
            buffer: Vec::new(),
            state: State::Open,
        }
    }

    fn start_upload(&mut self) -> Upload {
        let client = Arc::clone(&self.client);
        let key = self.key.clone();
        let path = self.path.clone();
        let body = std::mem::take(&mut self.buffer);
        Box::pin(async move {
            tracing::debug!(backend = "s3", key = %key, bytes = body.len(), "committing write stream");
            client
                .put_object(&key, body)
                .await
                .map_err(|e| map_s3_error(OPERATION, &path, e))
        })
    }
}

fn stream_error(kind: ErrorKind, path: &str, message: &str) -> io::Error {
    io::Error::other(FsError::from_kind(kind, OPERATION, path, message, None))
}

impl AsyncWrite for ObjectWriteStream {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        let this = self.get_mut();
        match &this.state {
            State::Open => {
                this.buffer.extend_from_slice(buf);
                Poll::Ready(Ok(buf.len()))
            }
            State::Failed(kind, message) => Poll::Ready(Err(stream_error(*kind, &this.path, message))),
            State::Uploading(_) | State::Committed => Poll::Ready(Err(stream_error(
                ErrorKind::Other,
                &this.path,
                "write stream already closed",
            ))),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        loop {
            match &mut this.state {
                State::Committed => return Poll::Ready(Ok(())),
                State::Failed(kind, message) => {
                    return Poll::Ready(Err(stream_error(*kind, &this.path, message)));
                }
                State::Open => {
                    let upload = this.start_upload();
                    this.state = State::Uploading(upload);
                }
                State::Uploading(upload) => {
                    let result = ready!(upload.as_mut().poll(cx));
                    this.state = match &result {
                        Ok(()) => State::Committed,
                        Err(e) => State::Failed(e.kind(), e.to_string()),
                    };
                    return Poll::Ready(result.map_err(io::Error::other));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryObjectClient;
    use tokio::io::AsyncWriteExt;

    #[tokio::test]
    async fn uploads_once_on_shutdown() {
        let client = Arc::new(MemoryObjectClient::new());
        let mut stream = ObjectWriteStream::new(client.clone(), "k".to_owned(), "k");

        stream.write_all(b"part-1 ").await.unwrap();
        stream.write_all(b"part-2").await.unwrap();
        assert!(client.keys().is_empty());

        stream.shutdown().await.unwrap();
        assert_eq!(client.get_object("k").await.unwrap(), b"part-1 part-2");

        let err = stream.write_all(b"late").await.unwrap_err();
        assert!(err.get_ref().is_some_and(|e| e.is::<FsError>()));
    }

    #[tokio::test]
    async fn failed_upload_stays_failed() {
        let client = Arc::new(MemoryObjectClient::new());
        client.fail_puts(true);
        let mut stream = ObjectWriteStream::new(client.clone(), "k".to_owned(), "k");
        stream.write_all(b"lost").await.unwrap();

        let first = stream.shutdown().await.unwrap_err();
        let kind = |e: &io::Error| {
            e.get_ref()
                .and_then(|inner| inner.downcast_ref::<FsError>())
                .map(FsError::kind)
        };
        assert_eq!(kind(&first), Some(ErrorKind::Permission));

        // Clearing the fault does not resurrect the discarded buffer.
        client.fail_puts(false);
        let second = stream.shutdown().await.unwrap_err();
        assert_eq!(kind(&second), Some(ErrorKind::Permission));
        assert!(stream.write_all(b"more").await.is_err());
        assert!(client.keys().is_empty());
    }

    #[tokio::test]
    async fn dropped_stream_writes_nothing() {
        let client = Arc::new(MemoryObjectClient::new());
        {
            let mut stream = ObjectWriteStream::new(client.clone(), "k".to_owned(), "k");
            stream.write_all(b"data").await.unwrap();
        }
        assert!(client.keys().is_empty());
    }
}
