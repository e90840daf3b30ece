//! Communication log sinks.
//!
//! Every exchange that passes the [`LoggingDecorator`](crate::logging::LoggingDecorator)
//! ends up as one [`LogRecord`] in a [`CommunicationLogger`].

use std::io::Write;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::{error, info};

use crate::transport::Operation;

/// Classification of one exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Success,
    AuthenticationError,
    ServerError,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::AuthenticationError => "authentication_error",
            Self::ServerError => "server_error",
        }
    }
}

/// One logged request/response exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogRecord {
    pub timestamp: DateTime<Utc>,
    pub operation: Operation,
    /// Exact request payload
    pub request: String,
    /// Exact response payload, or the fault description if none was received
    pub response: String,
    pub outcome: Outcome,
}

/// Errors raised by log sinks.
#[derive(Error, Debug)]
pub enum LogError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_yaml::Error),

    #[error("Log sink unavailable: {0}")]
    Unavailable(String),
}

/// Append-only sink for communication records.
pub trait CommunicationLogger: Send + Sync {
    fn record(&self, record: &LogRecord) -> Result<(), LogError>;
}

/// Emits records as structured `tracing` events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl CommunicationLogger for TracingLogger {
    fn record(&self, record: &LogRecord) -> Result<(), LogError> {
        match record.outcome {
            Outcome::Success => info!(
                operation = %record.operation,
                request = %record.request,
                response = %record.response,
                "SOAP communication"
            ),
            outcome => error!(
                operation = %record.operation,
                outcome = outcome.as_str(),
                request = %record.request,
                response = %record.response,
                "SOAP communication failed"
            ),
        }
        Ok(())
    }
}

/// Keeps records in memory, in call order.
#[derive(Debug, Default)]
pub struct MemoryLogger {
    records: Mutex<Vec<LogRecord>>,
}

impl MemoryLogger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all records so far.
    pub fn records(&self) -> Vec<LogRecord> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Records are only ever appended whole, so a poisoned lock still
    /// guards a consistent log.
    fn lock(&self) -> MutexGuard<'_, Vec<LogRecord>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl CommunicationLogger for MemoryLogger {
    fn record(&self, record: &LogRecord) -> Result<(), LogError> {
        self.lock().push(record.clone());
        Ok(())
    }
}

/// Appends records as YAML documents to a writer, e.g. an audit file.
#[derive(Debug)]
pub struct WriterLogger<W> {
    writer: Mutex<W>,
}

impl<W: Write + Send> WriterLogger<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    pub fn into_inner(self) -> Result<W, LogError> {
        self.writer
            .into_inner()
            .map_err(|e| LogError::Unavailable(e.to_string()))
    }
}

impl<W: Write + Send> CommunicationLogger for WriterLogger<W> {
    fn record(&self, record: &LogRecord) -> Result<(), LogError> {
        let document = serde_yaml::to_string(record)?;
        let mut writer = self
            .writer
            .lock()
            .map_err(|e| LogError::Unavailable(e.to_string()))?;

        writer.write_all(b"---\n")?;
        writer.write_all(document.as_bytes())?;
        writer.flush()?;
        Ok(())
    }
}
