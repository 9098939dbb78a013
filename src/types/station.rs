//! Station records as held by the directory.

use chrono::NaiveDate;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single Wisconet station and its metadata.
///
/// Stations are created when the directory loads and are read-only afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Station {
    /// Numeric key used internally by the API.
    pub id: i64,
    /// Short textual identifier, e.g. `"ALTN"`. This is what output rows carry.
    pub station_id: String,
    /// Full descriptive name, e.g. `"Arlington"`.
    pub station_name: String,
    /// URL-friendly name, e.g. `"arlington"`.
    pub station_slug: Option<String>,
    /// IANA timezone of the station's local time, e.g. `"America/Chicago"`.
    pub station_timezone: Option<String>,
    /// Earliest date the API has data for.
    pub earliest_api_date: Option<NaiveDate>,
    pub location: Option<Location>,
    pub city: Option<String>,
    pub county: Option<String>,
    pub region: Option<String>,
    pub state: Option<String>,
    /// Free-text description of where the station sits.
    pub location_description: Option<String>,
    pub campbell_cloud_id: Option<String>,
    pub legacy_id: Option<String>,
}

/// Geographic position of a station.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// Decimal degrees, positive north.
    pub latitude: f64,
    /// Decimal degrees, positive east.
    pub longitude: f64,
    /// Metres above sea level, when known.
    pub elevation: Option<f64>,
}

impl Station {
    /// True when `identifier` names this station by id, slug or display
    /// name, ignoring case and surrounding whitespace.
    pub fn matches(&self, identifier: &str) -> bool {
        let needle = identifier.trim();
        self.station_id.eq_ignore_ascii_case(needle)
            || self
                .station_slug
                .as_deref()
                .is_some_and(|slug| slug.eq_ignore_ascii_case(needle))
            || self.station_name.eq_ignore_ascii_case(needle)
    }
}

impl Station {
    /// The station's local zone, or UTC when the API gave none or an unknown
    /// name.
    pub fn time_zone(&self) -> Tz {
        self.station_timezone
            .as_deref()
            .and_then(|name| name.trim().parse::<Tz>().ok())
            .unwrap_or(Tz::UTC)
    }
}

impl fmt::Display for Station {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.station_name, self.station_id)
    }
}
