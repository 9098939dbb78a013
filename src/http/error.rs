use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Network request failed for {0}")]
    NetworkRequest(String, #[source] reqwest::Error),

    #[error("HTTP request failed for {url} with status {status}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("Failed to decode JSON body from {url}")]
    JsonDecode {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    // Raised by transports that don't sit on top of reqwest.
    #[error("Transport unavailable for {url}: {message}")]
    Unavailable { url: String, message: String },
}

impl TransportError {
    /// The URL (or route) the failed request was aimed at.
    pub fn url(&self) -> &str {
        match self {
            TransportError::NetworkRequest(url, _) => url,
            TransportError::HttpStatus { url, .. }
            | TransportError::JsonDecode { url, .. }
            | TransportError::Unavailable { url, .. } => url,
        }
    }

    /// Whether the request timed out inside the transport.
    pub fn is_timeout(&self) -> bool {
        match self {
            TransportError::NetworkRequest(_, e) => e.is_timeout(),
            _ => false,
        }
    }
}
