//! Transient notifications ("toasts"). The core queues them; the host
//! drains and renders.

use tracing::{info, warn};

use crate::error::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Error,
    Info,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub kind: ToastKind,
    pub message: String,
}

#[derive(Debug, Default)]
pub struct Toaster {
    queue: Vec<Toast>,
}

impl Toaster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn success(&mut self, message: impl Into<String>) {
        self.push(ToastKind::Success, message.into());
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.push(ToastKind::Info, message.into());
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.push(ToastKind::Error, message.into());
    }

    /// Report a request-level failure with the server's message when it
    /// has one.
    pub fn api_error(&mut self, err: &ApiError) {
        warn!(error = %err, "request failed");
        self.error(err.message());
    }

    pub fn pending(&self) -> &[Toast] {
        &self.queue
    }

    pub fn drain(&mut self) -> Vec<Toast> {
        std::mem::take(&mut self.queue)
    }

    fn push(&mut self, kind: ToastKind, message: String) {
        info!(?kind, message = %message, "toast");
        self.queue.push(Toast { kind, message });
    }
}
