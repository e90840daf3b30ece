//! Service construction.

use std::sync::Arc;

use crate::config::ClientConfig;
use crate::error_handler::ErrorHandlerDecorator;
use crate::logger::CommunicationLogger;
use crate::logging::LoggingDecorator;
use crate::request::RecordsOptions;
use crate::service::AddressVerificationService;
use crate::transport::{HttpTransport, Transport};

/// The decorated transport every service talks through.
pub type DecoratedTransport<T> = LoggingDecorator<ErrorHandlerDecorator<T>>;

/// Wraps a raw transport in the decorator chain and builds services on it.
///
/// The error handler sits directly on the raw transport and the logger
/// wraps it, so every exchange is logged once with its classified outcome.
pub struct ServiceFactory<T> {
    transport: T,
    options: RecordsOptions,
}

impl<T: Transport> ServiceFactory<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            options: RecordsOptions::default(),
        }
    }

    /// Default getRecords parameters for created services.
    pub fn with_options(mut self, options: RecordsOptions) -> Self {
        self.options = options;
        self
    }

    pub fn create_address_verification_service(
        self,
        logger: Arc<dyn CommunicationLogger>,
    ) -> AddressVerificationService<DecoratedTransport<T>> {
        let transport = LoggingDecorator::new(ErrorHandlerDecorator::new(self.transport), logger);
        AddressVerificationService::new(transport).with_options(self.options)
    }
}

impl ServiceFactory<HttpTransport> {
    /// Factory for an HTTP transport to the configured endpoint.
    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(HttpTransport::from_config(config)).with_options(config.records.clone())
    }
}
