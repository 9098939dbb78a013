//! Wire shapes of the Wisconet v1 API and their decoding into the crate's
//! types. Nothing here does I/O.

use crate::types::field::FieldSpec;
use crate::types::station::{Location, Station};
use chrono::NaiveDate;
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

const EARLIEST_API_DATE_FORMAT: &str = "%m/%d/%Y";

/// A station as returned by `GET /stations/`.
///
/// Coordinates and elevation arrive as strings on some deployments and as
/// numbers on others; both are accepted.
#[derive(Debug, Clone, Deserialize)]
pub struct StationRecord {
    pub id: i64,
    pub station_id: String,
    #[serde(default)]
    pub station_name: Option<String>,
    #[serde(default)]
    pub station_slug: Option<String>,
    #[serde(default)]
    pub station_timezone: Option<String>,
    #[serde(default, deserialize_with = "lenient_date")]
    pub earliest_api_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub latitude: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub longitude: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub elevation: Option<f64>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub county: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub campbell_cloud_id: Option<String>,
    #[serde(default)]
    pub legacy_id: Option<String>,
}

impl From<StationRecord> for Station {
    fn from(record: StationRecord) -> Self {
        let location = match (record.latitude, record.longitude) {
            (Some(latitude), Some(longitude)) => Some(Location {
                latitude,
                longitude,
                elevation: record.elevation,
            }),
            _ => None,
        };
        Station {
            id: record.id,
            station_name: record
                .station_name
                .unwrap_or_else(|| record.station_id.clone()),
            station_id: record.station_id,
            station_slug: record.station_slug,
            station_timezone: record.station_timezone,
            earliest_api_date: record.earliest_api_date,
            location,
            city: record.city,
            county: record.county,
            region: record.region,
            state: record.state,
            location_description: record.location,
            campbell_cloud_id: record.campbell_cloud_id,
            legacy_id: record.legacy_id,
        }
    }
}

/// Body of `GET /stations/{id}/measures`.
#[derive(Debug, Clone, Deserialize)]
pub struct BulkMeasures {
    /// Fields referenced by `data`, keyed by their numeric `id`.
    pub fieldlist: Vec<FieldSpec>,
    pub data: Vec<DataByTime>,
}

/// All measures sharing one collection time.
#[derive(Debug, Clone, Deserialize)]
pub struct DataByTime {
    /// Unix seconds.
    pub collection_time: i64,
    /// `[field_id, value]` pairs. Left untyped; the executor validates them.
    pub measures: Vec<Vec<Value>>,
}

/// A single measured value as it came off the wire.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ObservationValue {
    Number(f64),
    Text(String),
    Null,
}

impl ObservationValue {
    /// Interprets a JSON scalar. Arrays and objects are not observation values.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Null => Some(ObservationValue::Null),
            Value::Number(n) => n.as_f64().map(ObservationValue::Number),
            Value::String(s) => Some(ObservationValue::Text(s.clone())),
            Value::Bool(b) => Some(ObservationValue::Text(b.to_string())),
            Value::Array(_) | Value::Object(_) => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ObservationValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, ObservationValue::Null)
    }
}

/// Reads the field id of a `[field_id, value]` pair; ids show up as integers,
/// whole floats or numeric strings.
pub fn field_id_of(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => Ok(n.as_f64()),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(|_| de::Error::custom(format!("expected a number, got '{s}'"))),
        Some(other) => Err(de::Error::custom(format!("expected a number, got {other}"))),
    }
}

fn lenient_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        None => Ok(None),
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => NaiveDate::parse_from_str(s.trim(), EARLIEST_API_DATE_FORMAT)
            .or_else(|_| NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d"))
            .map(Some)
            .map_err(|_| de::Error::custom(format!("unrecognised date '{s}'"))),
    }
}
