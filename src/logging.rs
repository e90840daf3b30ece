//! Communication logging decorator.

use std::sync::Arc;

use chrono::Utc;
use tracing::warn;

use crate::error::{Error, Result};
use crate::logger::{CommunicationLogger, LogRecord, Outcome};
use crate::transport::{Request, Response, Transport};

/// Records every exchange of the wrapped transport, successful or not.
///
/// The outcome of the inner call is returned untouched; a failing logger only
/// produces a warning.
pub struct LoggingDecorator<T> {
    inner: T,
    logger: Arc<dyn CommunicationLogger>,
}

impl<T: Transport> LoggingDecorator<T> {
    pub fn new(inner: T, logger: Arc<dyn CommunicationLogger>) -> Self {
        Self { inner, logger }
    }

    pub fn inner(&self) -> &T {
        &self.inner
    }
}

impl<T: Transport> Transport for LoggingDecorator<T> {
    fn send(&self, request: &Request) -> Result<Response> {
        let result = self.inner.send(request);

        let (response, outcome) = match &result {
            Ok(response) => (response.xml().to_string(), Outcome::Success),
            Err(error) => (failure_payload(error), failure_outcome(error)),
        };

        let record = LogRecord {
            timestamp: Utc::now(),
            operation: request.operation(),
            request: request.xml().to_string(),
            response,
            outcome,
        };

        if let Err(e) = self.logger.record(&record) {
            warn!(
                operation = %request.operation(),
                error = %e,
                "Failed to write communication log"
            );
        }

        result
    }
}

/// Raw response behind a failure, or a fault description if none was received.
fn failure_payload(error: &Error) -> String {
    match error.fault() {
        Some(fault) => fault
            .response_xml
            .clone()
            .unwrap_or_else(|| fault.to_string()),
        None => error.to_string(),
    }
}

fn failure_outcome(error: &Error) -> Outcome {
    match error {
        Error::Authentication(_) => Outcome::AuthenticationError,
        _ => Outcome::ServerError,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Fault;
    use crate::logger::{LogError, MemoryLogger};
    use crate::transport::Operation;

    struct Scripted(fn() -> Result<Response>);

    impl Transport for Scripted {
        fn send(&self, _request: &Request) -> Result<Response> {
            (self.0)()
        }
    }

    struct BrokenLogger;

    impl CommunicationLogger for BrokenLogger {
        fn record(&self, _record: &LogRecord) -> std::result::Result<(), LogError> {
            Err(LogError::Unavailable("disk full".to_string()))
        }
    }

    const RESPONSE: &str = r#"<soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/"><soap:Body/></soap:Envelope>"#;

    fn ok() -> Result<Response> {
        crate::envelope::read_response(RESPONSE).map_err(|f| Error::Transport(Box::new(f)))
    }

    fn request() -> Request {
        Request::new(Operation::OpenSession, "<openSession/>")
    }

    #[test]
    fn test_success_is_logged_once() {
        let logger = Arc::new(MemoryLogger::new());
        let decorator = LoggingDecorator::new(Scripted(ok), logger.clone());

        decorator.send(&request()).unwrap();

        let records = logger.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].operation, Operation::OpenSession);
        assert_eq!(records[0].request, "<openSession/>");
        assert_eq!(records[0].response, RESPONSE);
        assert_eq!(records[0].outcome, Outcome::Success);
    }

    #[test]
    fn test_failure_logs_raw_response() {
        let logger = Arc::new(MemoryLogger::new());
        let decorator = LoggingDecorator::new(
            Scripted(|| {
                Err(Error::Authentication(Box::new(
                    Fault::new("HTTP", "Unauthorized").with_response("<fault/>"),
                )))
            }),
            logger.clone(),
        );

        assert!(decorator.send(&request()).unwrap_err().is_authentication());

        let records = logger.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].response, "<fault/>");
        assert_eq!(records[0].outcome, Outcome::AuthenticationError);
    }

    #[test]
    fn test_failure_without_payload_logs_fault_description() {
        let logger = Arc::new(MemoryLogger::new());
        let decorator = LoggingDecorator::new(
            Scripted(|| Err(Error::Service(Box::new(Fault::new("HTTP", "Connection refused"))))),
            logger.clone(),
        );

        let err = decorator.send(&request()).unwrap_err();
        assert_eq!(err.to_string(), "Connection refused");
        assert_eq!(logger.records()[0].response, "[HTTP] Connection refused");
        assert_eq!(logger.records()[0].outcome, Outcome::ServerError);
    }

    #[test]
    fn test_broken_logger_does_not_mask_outcome() {
        let decorator = LoggingDecorator::new(Scripted(ok), Arc::new(BrokenLogger));
        assert_eq!(decorator.send(&request()).unwrap().xml(), RESPONSE);

        let decorator = LoggingDecorator::new(
            Scripted(|| Err(Error::Service(Box::new(Fault::new("soap:Server", "boom"))))),
            Arc::new(BrokenLogger),
        );
        assert_eq!(decorator.send(&request()).unwrap_err().to_string(), "boom");
    }
}
