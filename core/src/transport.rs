//! The seam between the core and the host's network stack.

use thiserror::Error;

use crate::http::{HttpRequest, HttpResponse};

#[derive(Debug, Error)]
#[error("{0}")]
pub struct TransportError(pub String);

/// Executes one HTTP round-trip. Non-2xx statuses are data, not errors;
/// only a failed round-trip is a `TransportError`.
pub trait Transport {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        (**self).execute(request)
    }
}
