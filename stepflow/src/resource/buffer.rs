//! In-memory write sink with asynchronous flush-on-teardown.

use super::scoped::{Operate, Teardown};
use async_trait::async_trait;
use tracing::debug;

/// An in-memory byte sink that must be flushed asynchronously on teardown.
///
/// Mirrors the shape of a buffered network or file stream: writes accumulate
/// while open, and the buffered bytes are flushed exactly once when the
/// owning [`CancellableResource`](super::CancellableResource) is disposed.
pub struct BufferSink {
    buffer: Vec<u8>,
    flushed: bool,
}

impl BufferSink {
    /// Asynchronously allocates a sink ready for writes.
    ///
    /// An async factory rather than a constructor that starts unawaited
    /// setup work, so callers always hold a fully initialised sink.
    pub async fn connect() -> Self {
        tokio::task::yield_now().await;
        Self {
            buffer: Vec::new(),
            flushed: false,
        }
    }

    /// Returns the number of buffered bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Returns true if nothing is buffered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Returns true once the teardown flush has run.
    #[must_use]
    pub fn is_flushed(&self) -> bool {
        self.flushed
    }
}

impl std::fmt::Debug for BufferSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BufferSink")
            .field("buffered", &self.buffer.len())
            .field("flushed", &self.flushed)
            .finish()
    }
}

#[async_trait]
impl Operate<Vec<u8>> for BufferSink {
    type Output = usize;

    /// Appends `input` to the buffer, returning the bytes written.
    async fn operate(&mut self, input: Vec<u8>) -> anyhow::Result<usize> {
        let written = input.len();
        self.buffer.extend_from_slice(&input);
        tokio::task::yield_now().await;
        Ok(written)
    }
}

#[async_trait]
impl Teardown for BufferSink {
    async fn teardown(&mut self) {
        // Simulated asynchronous flush before release.
        tokio::task::yield_now().await;
        debug!(buffered = self.buffer.len(), "buffer sink flushed");
        self.buffer.clear();
        self.flushed = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cancellation::CancelToken;
    use crate::resource::{using, CancellableResource};
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_connect_yields_empty_sink() {
        let sink = BufferSink::connect().await;
        assert!(sink.is_empty());
        assert!(!sink.is_flushed());
    }

    #[tokio::test]
    async fn test_writes_accumulate() {
        let sink = BufferSink::connect().await;
        let resource = CancellableResource::open("sink", sink);
        let token = CancelToken::new();

        let written = resource
            .operate(b"hello ".to_vec(), &token)
            .await
            .expect("write succeeds");
        assert_eq!(written, 6);

        let written = resource
            .operate(b"world".to_vec(), &token)
            .await
            .expect("write succeeds");
        assert_eq!(written, 5);
    }

    #[tokio::test]
    async fn test_write_after_dispose_fails() {
        let sink = BufferSink::connect().await;
        let resource = CancellableResource::open("sink", sink);
        let token = CancelToken::new();

        resource.dispose().await;

        let err = resource
            .operate(b"late".to_vec(), &token)
            .await
            .unwrap_err();
        assert!(err.is_disposed());
    }

    #[tokio::test]
    async fn test_using_writes_and_flushes() {
        let sink = BufferSink::connect().await;
        let token = CancelToken::new();

        let written = using(
            CancellableResource::open("sink", sink),
            b"test".to_vec(),
            &token,
        )
        .await
        .expect("scope succeeds");

        assert_eq!(written, 4);
    }
}
