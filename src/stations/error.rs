use crate::http::error::TransportError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("Station '{0}' not found")]
    NotFound(String),

    #[error("Station directory request failed")]
    Transport(#[from] TransportError),

    #[error("Failed to decode response from {route}")]
    Decode {
        route: String,
        #[source]
        source: serde_json::Error,
    },
}

impl DirectoryError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, DirectoryError::NotFound(_))
    }
}
