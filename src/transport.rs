//! The transport capability and its HTTP implementation.
//!
//! A [`Transport`] sends one SOAP request and returns the raw response. The
//! decorators in [`crate::error_handler`] and [`crate::logging`] implement
//! the same trait and wrap another transport.

use std::fmt;
use std::time::Duration;

use tracing::debug;

use crate::config::ClientConfig;
use crate::envelope::{self, Element};
use crate::error::{Error, Fault, Result};

/// Operations offered by the remote service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Operation {
    OpenSession,
    GetRecords,
    CloseSession,
}

impl Operation {
    /// Operation name as used on the wire and in the SOAPAction header.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenSession => "openSession",
            Self::GetRecords => "getRecords",
            Self::CloseSession => "closeSession",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An encoded outbound SOAP request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    operation: Operation,
    xml: String,
}

impl Request {
    pub fn new(operation: Operation, xml: impl Into<String>) -> Self {
        Self {
            operation,
            xml: xml.into(),
        }
    }

    pub fn operation(&self) -> Operation {
        self.operation
    }

    /// Exact payload sent on the wire.
    pub fn xml(&self) -> &str {
        &self.xml
    }
}

/// A successfully read SOAP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    xml: String,
    body: Element,
}

impl Response {
    pub fn new(xml: impl Into<String>, body: Element) -> Self {
        Self {
            xml: xml.into(),
            body,
        }
    }

    /// Exact payload received from the wire.
    pub fn xml(&self) -> &str {
        &self.xml
    }

    /// Parsed SOAP Body element.
    pub fn body(&self) -> &Element {
        &self.body
    }
}

/// Sends SOAP requests.
///
/// Raw transports report every failure as [`Error::Transport`]; classifying
/// it is the job of [`ErrorHandlerDecorator`](crate::error_handler::ErrorHandlerDecorator).
pub trait Transport {
    fn send(&self, request: &Request) -> Result<Response>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn send(&self, request: &Request) -> Result<Response> {
        (**self).send(request)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn send(&self, request: &Request) -> Result<Response> {
        (**self).send(request)
    }
}

/// Fault code for HTTP level failures.
pub const HTTP_FAULT: &str = "HTTP";

/// Blocking SOAP-over-HTTP transport.
pub struct HttpTransport {
    endpoint: String,
    agent: ureq::Agent,
}

impl HttpTransport {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        Self {
            endpoint: endpoint.into(),
            agent,
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(
            config.endpoint.clone(),
            Duration::from_secs(config.timeout_secs),
        )
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn exchange(&self, request: &Request) -> std::result::Result<Response, Fault> {
        let result = self
            .agent
            .post(&self.endpoint)
            .set("Content-Type", "text/xml; charset=utf-8")
            .set("SOAPAction", &format!("\"{}\"", request.operation()))
            .send_string(request.xml());

        match result {
            Ok(response) => {
                let body = response
                    .into_string()
                    .map_err(|e| Fault::new(HTTP_FAULT, e.to_string()))?;
                envelope::read_response(&body)
            }
            Err(ureq::Error::Status(status, response)) => {
                let status_text = response.status_text().to_string();
                let body = response.into_string().unwrap_or_default();

                if status == 401 {
                    return Err(Fault::new(HTTP_FAULT, "Unauthorized").with_response(body));
                }
                Err(envelope::read_fault(&body)
                    .unwrap_or_else(|| Fault::new(HTTP_FAULT, status_text).with_response(body)))
            }
            Err(ureq::Error::Transport(transport)) => {
                Err(Fault::new(HTTP_FAULT, transport.to_string()))
            }
        }
    }
}

impl fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpTransport")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

impl Transport for HttpTransport {
    fn send(&self, request: &Request) -> Result<Response> {
        debug!(
            operation = %request.operation(),
            endpoint = %self.endpoint,
            "Sending SOAP request"
        );

        self.exchange(request)
            .map_err(|fault| Error::Transport(Box::new(fault)))
    }
}
