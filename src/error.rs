//! Error types for the ADDRESSFACTORY DIRECT client.

use std::fmt;
use thiserror::Error;

use crate::error_handler::AUTH_ERROR_MESSAGE;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Client errors.
///
/// Callers are expected to treat [`Error::Authentication`] and
/// [`Error::Service`] differently: the former calls for new credentials or a
/// new session, the latter is a candidate for retry.
#[derive(Error, Debug)]
pub enum Error {
    /// A request record or call argument was incomplete.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Credentials or session were rejected by the remote side.
    #[error("{}", AUTH_ERROR_MESSAGE)]
    Authentication(Box<Fault>),

    /// Any other server or transport fault. Displays the upstream message.
    #[error("{}", .0.message)]
    Service(Box<Fault>),

    /// Raw fault that has not been classified yet.
    #[error("unclassified fault {0}")]
    Transport(Box<Fault>),
}

impl Error {
    /// Underlying fault, if the error came from the remote side.
    pub fn fault(&self) -> Option<&Fault> {
        match self {
            Self::Validation(_) => None,
            Self::Authentication(fault) | Self::Service(fault) | Self::Transport(fault) => {
                Some(fault)
            }
        }
    }

    pub fn is_authentication(&self) -> bool {
        matches!(self, Self::Authentication(_))
    }
}

/// Builder and argument validation errors. Never reach the transport.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),
}

/// A fault reported by the transport or the remote service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fault {
    /// Fault code, e.g. `soap:Server` or `HTTP`
    pub code: String,
    /// Human-readable fault message
    pub message: String,
    /// Raw response payload that carried the fault (if any)
    pub response_xml: Option<String>,
}

impl Fault {
    /// Create a fault without a response payload.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            response_xml: None,
        }
    }

    /// Attach the raw response that carried this fault.
    pub fn with_response(mut self, response_xml: impl Into<String>) -> Self {
        self.response_xml = Some(response_xml.into());
        self
    }

    /// Fault code without its namespace prefix (`soap:Client` -> `Client`).
    pub fn local_code(&self) -> &str {
        self.code.rsplit(':').next().unwrap_or(&self.code)
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}
