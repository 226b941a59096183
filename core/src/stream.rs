//! Consumption of chunked text responses with cooperative cancellation.
//!
//! # Design
//! `StreamController::start` pulls chunks from a `ChunkSource` until the
//! source ends, fails, or the controller's `CancelHandle` fires. The
//! handle is a shared flag checked between chunks, so another thread (or a
//! UI callback) can stop a running stream. A cancelled stream never
//! reports an error, even if the source fails while shutting down.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, warn};

use crate::http::HttpResponse;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StreamError {
    #[error("HTTP error! status: {0}")]
    Status(u16),
    #[error("stream read failed: {0}")]
    Read(String),
}

/// A source of text chunks. `Ok(None)` marks the end of the stream.
pub trait ChunkSource {
    fn next_chunk(&mut self) -> Result<Option<String>, StreamError>;

    /// Release the underlying connection early.
    fn cancel(&mut self) {}
}

/// Chunks already held in memory.
#[derive(Debug, Clone, Default)]
pub struct BufferedChunks(VecDeque<String>);

impl BufferedChunks {
    pub fn new(chunks: impl IntoIterator<Item = String>) -> Self {
        Self(chunks.into_iter().collect())
    }
}

impl ChunkSource for BufferedChunks {
    fn next_chunk(&mut self) -> Result<Option<String>, StreamError> {
        Ok(self.0.pop_front())
    }
}

/// Chunks of an already buffered response, one per line. Fails up front on
/// a non-success status.
pub fn response_chunks(response: HttpResponse) -> Result<BufferedChunks, StreamError> {
    if !response.is_success() {
        return Err(StreamError::Status(response.status));
    }
    Ok(BufferedChunks::new(response.body.split_inclusive('\n').map(str::to_string)))
}

#[derive(Debug, Clone, Default)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StreamStatus {
    #[default]
    Idle,
    /// Waiting for the response to open.
    Loading,
    Receiving,
    Succeeded,
    Failed,
    Cancelled,
}

/// Callbacks fired while a stream runs. All default to doing nothing.
pub trait StreamObserver {
    fn on_message(&mut self, _chunk: &str) {}
    fn on_error(&mut self, _error: &StreamError) {}
    fn on_success(&mut self, _text: &str) {}
}

impl StreamObserver for () {}

#[derive(Debug, Default)]
pub struct StreamController {
    text: String,
    status: StreamStatus,
    error: Option<StreamError>,
    cancel: CancelHandle,
}

impl StreamController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle that cancels the run in progress. `start` clears it, so a
    /// cancel issued between runs does not carry over.
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    pub fn stop(&mut self) {
        self.cancel.cancel();
        if matches!(self.status, StreamStatus::Loading | StreamStatus::Receiving) {
            self.status = StreamStatus::Cancelled;
        }
    }

    /// Accumulated text with surrounding whitespace removed.
    pub fn text(&self) -> &str {
        self.text.trim()
    }

    pub fn status(&self) -> StreamStatus {
        self.status
    }

    pub fn error(&self) -> Option<&StreamError> {
        self.error.as_ref()
    }

    pub fn is_processing(&self) -> bool {
        matches!(self.status, StreamStatus::Loading | StreamStatus::Receiving)
    }

    /// Open a source with `open` and consume it to the end.
    pub fn start<S, F>(&mut self, open: F, observer: &mut dyn StreamObserver) -> StreamStatus
    where
        S: ChunkSource,
        F: FnOnce() -> Result<S, StreamError>,
    {
        self.text.clear();
        self.error = None;
        self.cancel.reset();
        self.status = StreamStatus::Loading;

        let outcome = open().and_then(|mut source| {
            self.status = StreamStatus::Receiving;
            self.pump(&mut source, observer)
        });

        self.status = match outcome {
            Ok(status) => status,
            Err(_) if self.cancel.is_cancelled() => StreamStatus::Cancelled,
            Err(e) => {
                warn!(error = %e, "stream failed");
                observer.on_error(&e);
                self.error = Some(e);
                StreamStatus::Failed
            }
        };
        debug!(status = ?self.status, bytes = self.text.len(), "stream finished");
        self.status
    }

    fn pump(
        &mut self,
        source: &mut dyn ChunkSource,
        observer: &mut dyn StreamObserver,
    ) -> Result<StreamStatus, StreamError> {
        loop {
            if self.cancel.is_cancelled() {
                source.cancel();
                return Ok(StreamStatus::Cancelled);
            }
            match source.next_chunk()? {
                Some(chunk) => {
                    self.text.push_str(&chunk);
                    observer.on_message(&chunk);
                }
                None => {
                    observer.on_success(self.text());
                    return Ok(StreamStatus::Succeeded);
                }
            }
        }
    }
}
