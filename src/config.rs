//! Client configuration.

use bon::Builder;
use std::time::Duration;

/// Base URL of the Wisconet v1 API.
pub const BASE_URL: &str = "https://wisconet.wisc.edu/api/v1";

/// Stations the API lists but that never carry data.
pub const NO_DATA_STATION_IDS: [&str; 2] = ["WNTEST1", "MITEST1"];

/// Settings for a [`crate::Wisconet`] client.
///
/// All fields have defaults, so `ClientConfig::builder().build()` gives a
/// client pointed at the public API with a 60 second timeout, at most five
/// requests in flight and 30 day request windows.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use wisconet::ClientConfig;
///
/// let config = ClientConfig::builder()
///     .timeout(Duration::from_secs(10))
///     .chunk_days(7)
///     .build();
/// assert_eq!(config.chunk_days, 7);
/// assert_eq!(config.max_connections, 5);
/// ```
#[derive(Debug, Clone, Builder)]
pub struct ClientConfig {
    /// API root, without a trailing slash.
    #[builder(into, default = BASE_URL.to_string())]
    pub base_url: String,
    /// Per-request timeout handed to the HTTP client.
    #[builder(default = Duration::from_secs(60))]
    pub timeout: Duration,
    /// Most requests in flight at once, which is also the idle pool size per
    /// host.
    #[builder(default = 5)]
    pub max_connections: usize,
    /// Length of each request window inside a per-station task.
    #[builder(default = 30)]
    pub chunk_days: u32,
    /// Station ids dropped from the directory.
    #[builder(default = NO_DATA_STATION_IDS.iter().map(|s| s.to_string()).collect())]
    pub excluded_station_ids: Vec<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}
