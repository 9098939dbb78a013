use crate::http::transport::HttpTransport;
use crate::stations::error::DirectoryError;
use crate::stations::locate_station::StationLocator;
use crate::types::field::FieldSpec;
use crate::types::schema::StationRecord;
use crate::types::station::Station;
use log::{debug, info};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::{hash_map::Entry, BTreeSet, HashMap};
use std::sync::Arc;
use tokio::sync::Mutex;

const STATIONS_ROUTE: &str = "/stations/";

/// Every known station plus a memo of per-station field lists.
pub struct StationDirectory {
    transport: Arc<dyn HttpTransport>,
    stations: Vec<Station>,
    locator: StationLocator,
    field_cache: Mutex<HashMap<String, Arc<Vec<FieldSpec>>>>,
}

impl StationDirectory {
    /// Fetches the station list, dropping any station whose id is in `excluded`.
    pub async fn load(
        transport: Arc<dyn HttpTransport>,
        excluded: &[String],
    ) -> Result<Self, DirectoryError> {
        let body = transport.get_json(STATIONS_ROUTE, &[]).await?;
        let records: Vec<StationRecord> = decode(STATIONS_ROUTE, body)?;
        let total = records.len();

        let stations: Vec<Station> = records
            .into_iter()
            .map(Station::from)
            .filter(|s| {
                !excluded
                    .iter()
                    .any(|id| id.eq_ignore_ascii_case(&s.station_id))
            })
            .collect();

        info!(
            "Loaded {} stations ({} excluded)",
            stations.len(),
            total - stations.len()
        );
        Ok(Self::from_stations(transport, stations))
    }

    pub fn from_stations(transport: Arc<dyn HttpTransport>, stations: Vec<Station>) -> Self {
        Self {
            locator: StationLocator::new(&stations),
            transport,
            stations,
            field_cache: Mutex::new(HashMap::new()),
        }
    }

    /// Stations in the order the API listed them.
    pub fn stations(&self) -> &[Station] {
        &self.stations
    }

    pub fn list_station_ids(&self) -> BTreeSet<String> {
        self.stations.iter().map(|s| s.station_id.clone()).collect()
    }

    /// Display names, sorted.
    pub fn station_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.stations.iter().map(|s| s.station_name.clone()).collect();
        names.sort();
        names
    }

    /// Looks a station up by id, slug or name. An exact id match wins over a
    /// slug or name match on another station.
    pub fn get_station(&self, identifier: &str) -> Result<&Station, DirectoryError> {
        let needle = identifier.trim();
        self.stations
            .iter()
            .find(|s| s.station_id == needle)
            .or_else(|| self.stations.iter().find(|s| s.matches(needle)))
            .ok_or_else(|| DirectoryError::NotFound(identifier.to_string()))
    }

    /// Nearest stations to a point as `(station, metres)`, nearest first.
    pub fn nearest(
        &self,
        latitude: f64,
        longitude: f64,
        n_results: usize,
        max_distance_m: Option<f64>,
    ) -> Vec<(&Station, f64)> {
        self.locator
            .query(latitude, longitude, n_results, max_distance_m)
            .into_iter()
            .filter_map(|(i, d)| self.stations.get(i).map(|s| (s, d)))
            .collect()
    }

    /// Field lists fetched so far for `station_id`, without touching the network.
    pub async fn cached_fields(&self, station_id: &str) -> Option<Arc<Vec<FieldSpec>>> {
        self.field_cache.lock().await.get(station_id).cloned()
    }

    /// Fields the API offers for one station. Fetched once per directory.
    pub async fn get_fields(&self, identifier: &str) -> Result<Arc<Vec<FieldSpec>>, DirectoryError> {
        let station_id = self.get_station(identifier)?.station_id.clone();

        {
            let cache = self.field_cache.lock().await;
            if let Some(fields) = cache.get(&station_id) {
                return Ok(fields.clone());
            }
        }

        let route = format!("/fields/{station_id}/available_fields");
        let body = self.transport.get_json(&route, &[]).await?;
        let fields: Arc<Vec<FieldSpec>> = Arc::new(decode(&route, body)?);
        debug!("{} fields available at {}", fields.len(), station_id);

        let mut cache = self.field_cache.lock().await;
        match cache.entry(station_id) {
            Entry::Occupied(entry) => Ok(entry.get().clone()),
            Entry::Vacant(entry) => {
                entry.insert(fields.clone());
                Ok(fields)
            }
        }
    }
}

fn decode<T: DeserializeOwned>(route: &str, body: Value) -> Result<T, DirectoryError> {
    serde_json::from_value(body).map_err(|source| DirectoryError::Decode {
        route: route.to_string(),
        source,
    })
}
