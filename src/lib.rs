//! ADDRESSFACTORY DIRECT client
//!
//! Blocking SOAP client for a session based address verification service.
//!
//! # Features
//!
//! - Request builder producing immutable record snapshots
//! - Transport decorators for fault classification and communication logging
//! - Session API: open a session, verify record batches, close the session
//! - HTTP transport, YAML configuration and pluggable log sinks
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use addressfactory_direct::{ClientConfig, RequestBuilder, ServiceFactory, TracingLogger};
//!
//! let config = ClientConfig::default();
//! let mut service = ServiceFactory::from_config(&config)
//!     .create_address_verification_service(Arc::new(TracingLogger));
//!
//! let mut builder = RequestBuilder::new();
//! builder.set_address("Deutschland", "53114", "Bonn", "Sträßchenweg", "10")?;
//! let session_id = service.open_session(&config.credentials.to_credentials())?;
//! let results = service.get_records(&session_id, &[builder.create()?])?;
//! service.close_session(&session_id)?;
//! ```

pub mod config;
pub mod envelope;
pub mod error;
pub mod error_handler;
pub mod factory;
pub mod logger;
pub mod logging;
pub mod request;
pub mod service;
pub mod transport;

pub use config::ClientConfig;
pub use error::{Error, Fault, Result, ValidationError};
pub use error_handler::{ErrorHandlerDecorator, AUTH_ERROR_MESSAGE};
pub use factory::ServiceFactory;
pub use logger::{CommunicationLogger, LogRecord, MemoryLogger, Outcome, TracingLogger, WriterLogger};
pub use logging::LoggingDecorator;
pub use request::{Credentials, RecordRequest, RecordsOptions, RequestBuilder};
pub use service::{AddressVerificationService, RecordResult, SessionState};
pub use transport::{HttpTransport, Transport};
