use crate::http::error::TransportError;
use crate::measures::error::{FetchError, ValidationError};
use crate::stations::error::DirectoryError;
use polars::error::PolarsError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WisconetError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Directory(#[from] DirectoryError),

    #[error("Failed to set up the HTTP client")]
    ClientSetup(#[source] TransportError),

    #[error("All {} station fetch(es) failed", .failures.len())]
    AllFetchesFailed { failures: Vec<FetchError> },

    #[error("Failed to build DataFrame")]
    DataFrame(#[from] PolarsError),
}

impl WisconetError {
    /// True when an unknown station identifier caused the error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, WisconetError::Directory(e) if e.is_not_found())
    }

    /// Per-station failures, when every fetch in a batch failed.
    pub fn failures(&self) -> &[FetchError] {
        match self {
            WisconetError::AllFetchesFailed { failures } => failures,
            _ => &[],
        }
    }
}
