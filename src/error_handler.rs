//! Fault classification decorator.
//!
//! Turns raw transport faults and in-band denials into typed errors. It does
//! not log; [`LoggingDecorator`](crate::logging::LoggingDecorator) wraps it and
//! sees every classified outcome.

use tracing::debug;

use crate::envelope;
use crate::error::{Error, Fault, Result};
use crate::transport::{Request, Response, Transport, HTTP_FAULT};

/// Message of every [`Error::Authentication`].
pub const AUTH_ERROR_MESSAGE: &str =
    "Authentication failed. Please check your access credentials.";

/// Fault messages the service uses to reject credentials or sessions.
const AUTH_FAULT_MESSAGES: &[&str] = &[
    "Unauthorized",
    "Authentication failed",
    "Invalid credentials",
    "Invalid session",
];

/// Classifies transport outcomes into authentication and service errors.
#[derive(Debug)]
pub struct ErrorHandlerDecorator<T> {
    inner: T,
}

impl<T: Transport> ErrorHandlerDecorator<T> {
    pub fn new(inner: T) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &T {
        &self.inner
    }
}

impl<T: Transport> Transport for ErrorHandlerDecorator<T> {
    fn send(&self, request: &Request) -> Result<Response> {
        let response = self.inner.send(request).map_err(classify)?;

        if envelope::has_authentication_error(response.body()) {
            debug!(operation = %request.operation(), "In-band authentication denial");
            let fault = Fault::new(HTTP_FAULT, "Unauthorized").with_response(response.xml());
            return Err(Error::Authentication(Box::new(fault)));
        }

        Ok(response)
    }
}

/// Map a raw fault to its typed error. Already classified errors pass through.
fn classify(error: Error) -> Error {
    match error {
        Error::Transport(fault) if is_authentication_fault(&fault) => {
            Error::Authentication(fault)
        }
        Error::Transport(fault) => Error::Service(fault),
        other => other,
    }
}

/// Whether a fault matches the service's authentication failure signature.
pub fn is_authentication_fault(fault: &Fault) -> bool {
    let message = fault.message.trim();

    if fault.local_code() == HTTP_FAULT && message == "Unauthorized" {
        return true;
    }

    AUTH_FAULT_MESSAGES
        .iter()
        .any(|known| known.eq_ignore_ascii_case(message))
}
