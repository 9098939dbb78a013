use crate::http::error::TransportError;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Bad input, caught before any request is made.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("At least one station is required")]
    EmptyStations,

    #[error("At least one field is required")]
    EmptyFields,

    #[error("Blank {0} in request")]
    BlankName(&'static str),

    #[error("Start time {start} is after end time {end}")]
    InvertedRange {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    #[error("Could not parse '{0}' as a date or date-time")]
    UnparseableTime(String),

    #[error("Station '{0}' does not report when its data starts")]
    UnknownStartDate(String),

    #[error("Chunk length must be at least one day")]
    InvalidChunkDays,

    #[error("Column name '{0}' is used more than once")]
    DuplicateColumnName(String),

    #[error("Column names must not be blank")]
    BlankColumnName,
}

/// Why one station's fetch failed.
#[derive(Debug, Error)]
pub enum FetchFailure {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("Unexpected response shape")]
    Decode(#[from] serde_json::Error),

    #[error("Malformed payload: {0}")]
    MalformedPayload(String),
}

/// A failed per-station fetch. Sibling stations are unaffected.
#[derive(Debug, Error)]
#[error("Fetching data for station '{station_id}' failed")]
pub struct FetchError {
    pub station_id: String,
    #[source]
    pub cause: FetchFailure,
}

impl FetchError {
    pub fn new(station_id: impl Into<String>, cause: impl Into<FetchFailure>) -> Self {
        Self {
            station_id: station_id.into(),
            cause: cause.into(),
        }
    }
}
