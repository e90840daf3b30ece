//! Session-level address verification API.

use serde::Serialize;
use tracing::{debug, info};

use crate::envelope::{self, VerifiedRecord};
use crate::error::{Error, Fault, Result, ValidationError};
use crate::request::{Credentials, RecordRequest, RecordsOptions};
use crate::transport::Transport;

/// Session lifecycle as seen by one service instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Unopened,
    Open(String),
    Closed,
}

/// Verification result for one input record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordResult {
    /// Correlation id of the input record
    pub metadata_id: Option<u64>,
    /// Record returned by the service; `None` if nothing matched
    pub record: Option<VerifiedRecord>,
}

impl RecordResult {
    pub fn is_match(&self) -> bool {
        self.record.is_some()
    }
}

/// Opens sessions, verifies records and closes sessions over a transport.
///
/// The transport is expected to be the decorated chain built by
/// [`ServiceFactory`](crate::factory::ServiceFactory); errors from it are
/// passed on as they are.
pub struct AddressVerificationService<T> {
    transport: T,
    options: RecordsOptions,
    state: SessionState,
}

impl<T: Transport> AddressVerificationService<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            options: RecordsOptions::default(),
            state: SessionState::Unopened,
        }
    }

    /// Default getRecords parameters used by [`get_records`](Self::get_records).
    pub fn with_options(mut self, options: RecordsOptions) -> Self {
        self.options = options;
        self
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Id of the currently open session.
    pub fn session_id(&self) -> Option<&str> {
        match self.state {
            SessionState::Open(ref id) => Some(id),
            _ => None,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Open a session and return its id.
    pub fn open_session(&mut self, credentials: &Credentials) -> Result<String> {
        let request = envelope::open_session_request(credentials);
        let response = self.transport.send(&request)?;

        let session_id = envelope::session_id(response.body()).ok_or_else(|| {
            Error::Service(Box::new(
                Fault::new("Client", "Response does not contain a session id")
                    .with_response(response.xml()),
            ))
        })?;

        info!(user = credentials.user(), "Session opened");
        self.state = SessionState::Open(session_id.clone());
        Ok(session_id)
    }

    /// Verify a batch of records using the default options.
    ///
    /// Returns one result per input record, in input order.
    pub fn get_records(
        &self,
        session_id: &str,
        records: &[RecordRequest],
    ) -> Result<Vec<RecordResult>> {
        self.get_records_with(session_id, &self.options, records)
    }

    /// Verify a batch of records with explicit options.
    pub fn get_records_with(
        &self,
        session_id: &str,
        options: &RecordsOptions,
        records: &[RecordRequest],
    ) -> Result<Vec<RecordResult>> {
        require_session_id(session_id)?;
        if records.is_empty() {
            return Err(ValidationError::MissingField("records").into());
        }

        let request = envelope::get_records_request(session_id, options, records);
        let response = self.transport.send(&request)?;
        let verified = envelope::records(response.body());

        debug!(
            requested = records.len(),
            returned = verified.len(),
            "Records verified"
        );

        Ok(correlate(records, verified))
    }

    /// Close a session.
    ///
    /// The service answers with an empty response whether or not the session
    /// exists; authentication and server faults are still reported.
    pub fn close_session(&mut self, session_id: &str) -> Result<()> {
        require_session_id(session_id)?;

        let request = envelope::close_session_request(session_id);
        self.transport.send(&request)?;

        if self.session_id() == Some(session_id) {
            self.state = SessionState::Closed;
        }
        info!("Session closed");
        Ok(())
    }
}

fn require_session_id(session_id: &str) -> Result<()> {
    if session_id.trim().is_empty() {
        return Err(ValidationError::MissingField("sessionId").into());
    }
    Ok(())
}

/// Pair each input record with its response record.
///
/// Each response record is used at most once. Records with a metadata id
/// first claim the response record echoing that id; inputs still unmatched
/// then take the remaining response records in document order. A response
/// record carrying a different id is never given to a keyed input.
fn correlate(requests: &[RecordRequest], verified: Vec<VerifiedRecord>) -> Vec<RecordResult> {
    let mut pool: Vec<Option<VerifiedRecord>> = verified.into_iter().map(Some).collect();

    let mut matched: Vec<Option<VerifiedRecord>> = requests
        .iter()
        .map(|request| {
            let id = request.metadata_id()?;
            pool.iter_mut()
                .find(|slot| matches!(slot, Some(r) if r.metadata_id == Some(id)))
                .and_then(Option::take)
        })
        .collect();

    for (request, slot) in requests.iter().zip(matched.iter_mut()) {
        if slot.is_some() {
            continue;
        }
        *slot = pool
            .iter_mut()
            .find(|candidate| match (candidate.as_ref(), request.metadata_id()) {
                (Some(r), Some(_)) => r.metadata_id.is_none(),
                (Some(_), None) => true,
                (None, _) => false,
            })
            .and_then(Option::take);
    }

    requests
        .iter()
        .zip(matched)
        .map(|(request, record)| RecordResult {
            metadata_id: request.metadata_id(),
            record,
        })
        .collect()
}
