//! Error types for snapshot fetching.

use thiserror::Error;

/// Failure of a single fetch cycle.
///
/// None of these are fatal: the poll loop records the failure and keeps its
/// cadence, and previously aggregated data is left untouched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Network or I/O failure talking to the source.
    #[error("transport failure: {0}")]
    Transport(String),

    /// The source answered with a non-success HTTP status.
    #[error("source returned HTTP status {0}")]
    Status(u16),

    /// The payload was not a usable snapshot. Nothing from it is admitted.
    #[error("malformed snapshot: {0}")]
    MalformedSnapshot(String),
}

impl FetchError {
    pub fn is_malformed(&self) -> bool {
        matches!(self, FetchError::MalformedSnapshot(_))
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(err: serde_json::Error) -> Self {
        FetchError::MalformedSnapshot(err.to_string())
    }
}
