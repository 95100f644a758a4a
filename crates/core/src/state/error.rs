//! Error types for status tracking.

use thiserror::Error;

use crate::api::ApiError;

/// Failures the tracker recovers from locally.
///
/// None of these are fatal: the affected record keeps its last known
/// state and views keep rendering it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TrackerError {
    /// The backend could not be reached or answered with an error.
    #[error("Network failure: {0}")]
    NetworkFailure(String),

    /// The backend does not recognise the company.
    #[error("Company not found: {0}")]
    NotFound(String),

    /// The backend reported a status that is not in the stage table.
    #[error("Unknown status '{status}' for {company}")]
    UnknownStatus { company: String, status: String },
}

impl TrackerError {
    pub fn from_api(company: &str, error: ApiError) -> Self {
        match error {
            ApiError::NotFound(_) => TrackerError::NotFound(company.to_string()),
            other => TrackerError::NetworkFailure(other.to_string()),
        }
    }
}
