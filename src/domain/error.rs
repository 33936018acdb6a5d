use thiserror::Error;

use crate::domain::setup::MISSING_REQUIRED_FIELDS;

#[derive(Debug, Error)]
pub enum DomainError {
    /// Names the wire fields (`ownerName`, `siteName`) that were blank.
    #[error("{}: missing {}", MISSING_REQUIRED_FIELDS, .fields.join(", "))]
    MissingFields { fields: Vec<&'static str> },
}

impl DomainError {
    pub fn missing_fields(fields: Vec<&'static str>) -> Self {
        Self::MissingFields { fields }
    }
}
