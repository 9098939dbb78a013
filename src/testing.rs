//! Deterministic stand-in for the Wisconet API used by the unit tests.

use crate::http::error::TransportError;
use crate::http::transport::HttpTransport;
use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, TimeZone, Utc};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

type Handler = Arc<dyn Fn(&str, &[(String, String)]) -> Result<Value, TransportError> + Send + Sync>;

struct Route {
    handler: Handler,
    delay: Duration,
}

/// Canned responses keyed by route, with optional per-route delays and a log
/// of every request seen.
#[derive(Default)]
pub struct FakeTransport {
    routes: HashMap<String, Route>,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
    seen: Mutex<Vec<(String, Vec<(String, String)>)>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// The standard fake network: four stations (one of them a test station)
    /// and field lists for each real one.
    pub fn wisconsin() -> Self {
        Self::new()
            .with_json("/stations/", stations_body())
            .with_json(
                "/fields/maple/available_fields",
                json!([air_temp_field(4), rh_field(5), pressure_field(6)]),
            )
            .with_json(
                "/fields/ALTN/available_fields",
                json!([air_temp_field(4), rh_field(5)]),
            )
            .with_json("/fields/SBAY/available_fields", json!([air_temp_field(4)]))
    }

    pub fn with_json(self, route: &str, body: Value) -> Self {
        self.with_handler(route, move |_, _| Ok(body.clone()))
    }

    pub fn with_status(self, route: &str, status: u16) -> Self {
        self.with_handler(route, move |url, _| {
            Err(TransportError::HttpStatus {
                url: url.to_string(),
                status: reqwest::StatusCode::from_u16(status).unwrap(),
            })
        })
    }

    pub fn with_handler<F>(mut self, route: &str, handler: F) -> Self
    where
        F: Fn(&str, &[(String, String)]) -> Result<Value, TransportError> + Send + Sync + 'static,
    {
        let delay = self
            .routes
            .remove(route)
            .map(|r| r.delay)
            .unwrap_or_default();
        self.routes.insert(
            route.to_string(),
            Route {
                handler: Arc::new(handler),
                delay,
            },
        );
        self
    }

    /// Serves a series of observations, answering each request with only
    /// the rows inside its `start_time..=end_time`.
    pub fn with_series(self, route: &str, fieldlist: Value, data: Vec<(i64, Value)>) -> Self {
        self.with_handler(route, move |_, query| {
            let bound = |key: &str| {
                query
                    .iter()
                    .find(|(k, _)| k == key)
                    .and_then(|(_, v)| v.parse::<i64>().ok())
            };
            let start = bound("start_time").unwrap_or(i64::MIN);
            let end = bound("end_time").unwrap_or(i64::MAX);
            let rows: Vec<Value> = data
                .iter()
                .filter(|(t, _)| (start..=end).contains(t))
                .map(|(t, measures)| json!({"collection_time": t, "measures": measures}))
                .collect();
            Ok(json!({"fieldlist": fieldlist, "data": rows}))
        })
    }

    pub fn with_delay(mut self, route: &str, delay: Duration) -> Self {
        if let Some(r) = self.routes.get_mut(route) {
            r.delay = delay;
        }
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Most requests that were ever being served at the same moment.
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    pub fn calls_to(&self, route: &str) -> usize {
        self.seen
            .lock()
            .unwrap()
            .iter()
            .filter(|(r, _)| r == route)
            .count()
    }

    pub fn requests_to(&self, route: &str) -> Vec<Vec<(String, String)>> {
        self.seen
            .lock()
            .unwrap()
            .iter()
            .filter(|(r, _)| r == route)
            .map(|(_, q)| q.clone())
            .collect()
    }
}

#[async_trait]
impl HttpTransport for FakeTransport {
    async fn get_json(
        &self,
        route: &str,
        query: &[(String, String)],
    ) -> Result<Value, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen
            .lock()
            .unwrap()
            .push((route.to_string(), query.to_vec()));

        let url = format!("fake://wisconet{route}");
        let Some(r) = self.routes.get(route) else {
            return Err(TransportError::HttpStatus {
                url,
                status: reqwest::StatusCode::NOT_FOUND,
            });
        };
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
        if !r.delay.is_zero() {
            tokio::time::sleep(r.delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        (r.handler)(&url, query)
    }
}

pub fn stations_body() -> Value {
    json!([
        {
            "id": 1, "station_id": "maple", "station_name": "Maple", "station_slug": "maple",
            "station_timezone": "America/Chicago", "earliest_api_date": "05/01/2023",
            "latitude": 46.58, "longitude": -91.73, "elevation": 340.0,
            "city": "Maple", "county": "Douglas", "region": "Northwest", "state": "WI"
        },
        {
            "id": 2, "station_id": "ALTN", "station_name": "Arlington", "station_slug": "arlington",
            "station_timezone": "America/Chicago", "earliest_api_date": "05/01/2023",
            "latitude": "43.30", "longitude": "-89.38", "elevation": "315",
            "county": "Columbia", "state": "WI"
        },
        {
            "id": 3, "station_id": "SBAY", "station_name": "Sister Bay", "station_slug": "sister-bay",
            "station_timezone": "America/Chicago", "earliest_api_date": "06/15/2023",
            "latitude": 45.19, "longitude": -87.12, "state": "WI"
        },
        {
            "id": 4, "station_id": "WNTEST1", "station_name": "Wisconet Test 1",
            "latitude": null, "longitude": null
        }
    ])
}

pub fn air_temp_field(id: i64) -> Value {
    json!({
        "id": id, "standard_name": "60min_air_temp_f_avg", "collection_frequency": "60min",
        "measure_type": "Air Temp", "final_units": "fahrenheit", "units_abbrev": "F", "qualifier": "avg"
    })
}

pub fn rh_field(id: i64) -> Value {
    json!({
        "id": id, "standard_name": "60min_relative_humidity_pct_avg", "collection_frequency": "60min",
        "measure_type": "Relative Humidity", "final_units": "pct", "qualifier": "avg"
    })
}

pub fn pressure_field(id: i64) -> Value {
    json!({
        "id": id, "standard_name": "60min_pressure_mb_avg", "collection_frequency": "60min",
        "measure_type": "Pressure", "final_units": "mb", "qualifier": "avg"
    })
}

/// Midnight on 2025-01-01 in America/Chicago, where every fake station sits.
pub fn jan_first() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 1, 6, 0, 0).unwrap()
}

/// `hours` hourly rows starting at `start`, one `[field_id, value]` pair per
/// field with value `base + hour`.
pub fn hourly(start: DateTime<Utc>, hours: i64, fields: &[(i64, f64)]) -> Vec<(i64, Value)> {
    (0..hours)
        .map(|h| {
            let t = (start + ChronoDuration::hours(h)).timestamp();
            let measures: Vec<Value> = fields
                .iter()
                .map(|(id, base)| json!([id, base + h as f64]))
                .collect();
            (t, Value::Array(measures))
        })
        .collect()
}
