//! Request records and the builder that assembles them.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ValidationError;

/// Account credentials, sent once when a session is opened.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    user: String,
    password: String,
}

impl Credentials {
    pub fn new(user: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            password: password.into(),
        }
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("password", &"***")
            .finish()
    }
}

/// Optional getRecords parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordsOptions {
    /// Name of the processing configuration on the server
    pub config_name: Option<String>,
    /// Client (mandator) id
    pub client_id: Option<String>,
}

/// Name of the person living at an address.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Person {
    pub given_name: String,
    pub family_name: String,
}

/// Postal address.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Address {
    pub country: String,
    pub postal_code: String,
    pub city: String,
    pub street: String,
    pub house_number: String,
}

/// One address verification query.
///
/// Records are snapshots; they are never changed after [`RequestBuilder::create`]
/// hands them out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordRequest {
    metadata_id: Option<u64>,
    person: Option<Person>,
    address: Address,
}

impl RecordRequest {
    /// Caller-supplied correlation id.
    pub fn metadata_id(&self) -> Option<u64> {
        self.metadata_id
    }

    pub fn person(&self) -> Option<&Person> {
        self.person.as_ref()
    }

    pub fn address(&self) -> &Address {
        &self.address
    }
}

/// Accumulates record fields and emits [`RecordRequest`] snapshots.
///
/// Fields persist across [`create`](Self::create) calls, so a batch can be
/// built by changing only what differs between records.
#[derive(Debug, Clone, Default)]
pub struct RequestBuilder {
    metadata_id: Option<u64>,
    person: Option<Person>,
    address: Option<Address>,
}

impl RequestBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the correlation id echoed back in the response.
    pub fn set_metadata(&mut self, id: u64) -> &mut Self {
        self.metadata_id = Some(id);
        self
    }

    pub fn set_person(
        &mut self,
        given_name: &str,
        family_name: &str,
    ) -> Result<&mut Self, ValidationError> {
        self.person = Some(Person {
            given_name: required("givenName", given_name)?,
            family_name: required("familyName", family_name)?,
        });
        Ok(self)
    }

    pub fn set_address(
        &mut self,
        country: &str,
        postal_code: &str,
        city: &str,
        street: &str,
        house_number: &str,
    ) -> Result<&mut Self, ValidationError> {
        self.address = Some(Address {
            country: required("country", country)?,
            postal_code: required("postalCode", postal_code)?,
            city: required("city", city)?,
            street: required("street", street)?,
            house_number: required("houseNumber", house_number)?,
        });
        Ok(self)
    }

    /// Snapshot the current fields into a new record.
    ///
    /// Fails only if no address has been set.
    pub fn create(&self) -> Result<RecordRequest, ValidationError> {
        let address = self
            .address
            .clone()
            .ok_or(ValidationError::MissingField("address"))?;

        Ok(RecordRequest {
            metadata_id: self.metadata_id,
            person: self.person.clone(),
            address,
        })
    }
}

fn required(field: &'static str, value: &str) -> Result<String, ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::MissingField(field));
    }
    Ok(value.to_string())
}
