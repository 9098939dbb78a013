//! The main entry point: a client for the Wisconet mesonet API.
//!
//! A [`Wisconet`] loads the station list once when it is built and then
//! answers station queries locally. Data requests go through the fetch
//! pipeline: one task per station, all run concurrently, merged into one
//! tidy table whose order never depends on which request finished first.

use crate::config::ClientConfig;
use crate::error::WisconetError;
use crate::filtering::{filter_fields, FieldCriterion};
use crate::http::transport::{ConnectionLimit, HttpTransport, ReqwestTransport};
use crate::measures::error::{FetchError, ValidationError};
use crate::measures::executor::{execute, TaskResult};
use crate::measures::planner::{plan, PlanRequest};
use crate::measures::reshaper::reshape;
use crate::registry::FieldRegistry;
use crate::stations::directory::StationDirectory;
use crate::stations::locate_station::distance_m;
use crate::types::field::FieldSpec;
use crate::types::selection::Selection;
use crate::types::station::{Location, Station};
use crate::types::table::{ColumnConfig, DataFrameOrient, ResultTable, TableData};
use crate::types::time_bound::TimeBound;
use bon::bon;
use chrono::Utc;
use log::info;
use polars::prelude::{DataFrame, LazyFrame};
use std::collections::BTreeSet;
use std::sync::Arc;

/// A geographical coordinate: latitude first, then longitude, in decimal degrees.
///
/// # Examples
///
/// ```
/// use wisconet::LatLon;
///
/// let madison = LatLon(43.07, -89.40);
/// assert_eq!(madison.0, 43.07);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatLon(pub f64, pub f64);

/// Result of a data request.
///
/// `failures` lists the stations whose fetch failed; their rows are absent
/// from `table`. When every station fails, [`Wisconet::get_data`] returns
/// [`WisconetError::AllFetchesFailed`] instead.
#[derive(Debug)]
pub struct DataResponse {
    pub table: ResultTable,
    pub failures: Vec<FetchError>,
}

impl DataResponse {
    pub fn table(&self) -> &ResultTable {
        &self.table
    }

    pub fn failures(&self) -> &[FetchError] {
        &self.failures
    }

    /// True when no station failed.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn failed_station_ids(&self) -> Vec<&str> {
        self.failures.iter().map(|f| f.station_id.as_str()).collect()
    }

    /// The table in the layout chosen by `dataframe_orient`.
    pub fn render(&self) -> TableData {
        self.table.render()
    }

    pub fn to_dataframe(&self) -> Result<DataFrame, WisconetError> {
        Ok(self.table.to_dataframe()?)
    }

    pub fn to_lazyframe(&self) -> Result<LazyFrame, WisconetError> {
        Ok(self.table.to_lazyframe()?)
    }
}

/// Client for the Wisconet API.
///
/// # Examples
///
/// ```no_run
/// # use wisconet::{Wisconet, WisconetError};
/// # #[tokio::main]
/// # async fn main() -> Result<(), WisconetError> {
/// let client = Wisconet::new().await?;
/// let response = client
///     .get_data()
///     .station_ids(["ALTN", "MAPL"])
///     .start_time("2025-01-01")
///     .end_time("2025-01-02")
///     .fields("60min_air_temp_f_avg")
///     .call()
///     .await?;
/// println!("{} rows", response.table.len());
/// # Ok(())
/// # }
/// ```
pub struct Wisconet {
    transport: Arc<dyn HttpTransport>,
    directory: StationDirectory,
    registry: FieldRegistry,
    chunk_days: u32,
}

#[bon]
impl Wisconet {
    /// A client for the public API with default settings.
    ///
    /// # Errors
    ///
    /// Fails if the HTTP client can't be built or the station list can't be
    /// fetched.
    pub async fn new() -> Result<Self, WisconetError> {
        Self::with_config(ClientConfig::default()).await
    }

    pub async fn with_config(config: ClientConfig) -> Result<Self, WisconetError> {
        let transport =
            ReqwestTransport::from_config(&config).map_err(WisconetError::ClientSetup)?;
        let limited = ConnectionLimit::new(transport, config.max_connections);
        Self::with_transport(Arc::new(limited), config).await
    }

    /// Uses a caller-built `reqwest::Client`, so its proxy, headers and
    /// timeouts apply. `config.timeout` is ignored; `config.max_connections`
    /// still caps requests in flight.
    pub async fn with_client(
        client: reqwest::Client,
        config: ClientConfig,
    ) -> Result<Self, WisconetError> {
        let transport = ReqwestTransport::new(client, config.base_url.clone());
        let limited = ConnectionLimit::new(transport, config.max_connections);
        Self::with_transport(Arc::new(limited), config).await
    }

    /// Uses any [`HttpTransport`]. Loads the station directory through it.
    /// The transport is used as given; wrap it in [`ConnectionLimit`] to cap
    /// concurrent requests.
    pub async fn with_transport(
        transport: Arc<dyn HttpTransport>,
        config: ClientConfig,
    ) -> Result<Self, WisconetError> {
        let directory =
            StationDirectory::load(transport.clone(), &config.excluded_station_ids).await?;
        Ok(Self {
            transport,
            directory,
            registry: FieldRegistry::default(),
            chunk_days: config.chunk_days,
        })
    }

    /// Replaces the field registry, e.g. to add unit conversions.
    pub fn with_registry(mut self, registry: FieldRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn registry(&self) -> &FieldRegistry {
        &self.registry
    }

    pub fn directory(&self) -> &StationDirectory {
        &self.directory
    }

    /// Fetches `fields` for every station in `station_ids` over
    /// `[start_time, end_time]` and merges them into one table.
    ///
    /// Station and field selections accept a single string or a list.
    /// Times accept dates, date-times and their string forms; naive values
    /// are UTC. The column options only change labels and layout.
    ///
    /// # Errors
    ///
    /// * [`WisconetError::Validation`] for empty selections, unparseable or
    ///   inverted times, or clashing column names. Nothing is sent.
    /// * [`WisconetError::Directory`] with `NotFound` for an unknown station.
    ///   Nothing is sent.
    /// * [`WisconetError::AllFetchesFailed`] when no station could be fetched.
    ///
    /// A partial failure is not an error; see [`DataResponse::failures`].
    #[builder]
    pub async fn get_data(
        &self,
        #[builder(into)] station_ids: Selection,
        #[builder(into)] start_time: TimeBound,
        #[builder(into)] end_time: TimeBound,
        #[builder(into)] fields: Selection,
        dataframe_orient: Option<DataFrameOrient>,
        #[builder(into)] datetime_col_name: Option<String>,
        #[builder(into)] station_id_col_name: Option<String>,
        #[builder(into)] variable_col_name: Option<String>,
        #[builder(into)] value_col_name: Option<String>,
        #[builder(into)] units_col_name: Option<String>,
        #[builder(into)] final_units_col_name: Option<String>,
    ) -> Result<DataResponse, WisconetError> {
        let request = PlanRequest::new(station_ids, start_time, end_time, fields)?;
        let columns = ColumnConfig::builder()
            .maybe_orient(dataframe_orient)
            .maybe_datetime_col_name(datetime_col_name)
            .maybe_station_id_col_name(station_id_col_name)
            .maybe_variable_col_name(variable_col_name)
            .maybe_value_col_name(value_col_name)
            .maybe_units_col_name(units_col_name)
            .maybe_final_units_col_name(final_units_col_name)
            .build();
        columns.validate()?;

        let tasks = plan(&request, &self.directory, self.chunk_days)?;
        let task_count = tasks.len();
        let results = execute(self.transport.as_ref(), tasks).await;
        let registry = self.merged_registry(&results).await;
        let output = reshape(results, &registry, &columns);

        info!(
            "Fetched {} rows from {} of {} station(s)",
            output.table.len(),
            task_count - output.failures.len(),
            task_count
        );
        if output.failures.len() == task_count {
            return Err(WisconetError::AllFetchesFailed {
                failures: output.failures,
            });
        }
        Ok(DataResponse {
            table: output.table,
            failures: output.failures,
        })
    }

    // Field metadata already discovered for these stations, overlaid with what
    // the responses themselves carried.
    async fn merged_registry(&self, results: &[TaskResult]) -> FieldRegistry {
        let mut registry = self.registry.clone();
        for result in results {
            if let Some(known) = self.directory.cached_fields(result.task.station_id()).await {
                registry.register_fields(known.iter().cloned());
            }
            if let Ok(set) = &result.outcome {
                registry.register_fields(set.fields.iter().cloned());
            }
        }
        registry
    }

    /// Display names of every station, sorted.
    pub fn all_station_names(&self) -> Vec<String> {
        self.directory.station_names()
    }

    pub fn station_ids(&self) -> BTreeSet<String> {
        self.directory.list_station_ids()
    }

    /// Looks a station up by id, slug or name.
    ///
    /// # Errors
    ///
    /// [`WisconetError::Directory`] with `NotFound` when nothing matches; see
    /// [`WisconetError::is_not_found`].
    pub fn get_station(&self, identifier: &str) -> Result<WisconetStation<'_>, WisconetError> {
        let station = self.directory.get_station(identifier)?;
        Ok(WisconetStation {
            client: self,
            station,
        })
    }

    /// The closest station to a point, if any station has coordinates.
    pub fn nearest_station(&self, location: LatLon) -> Option<WisconetStation<'_>> {
        self.directory
            .nearest(location.0, location.1, 1, None)
            .into_iter()
            .next()
            .map(|(station, _)| WisconetStation {
                client: self,
                station,
            })
    }

    /// Stations around a point with their distance in metres, nearest first.
    ///
    /// `station_limit` defaults to 3. Without `max_distance_m` there is no
    /// range limit.
    ///
    /// ```no_run
    /// # use wisconet::{LatLon, Wisconet, WisconetError};
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), WisconetError> {
    /// let client = Wisconet::new().await?;
    /// let nearby = client
    ///     .nearest_stations()
    ///     .location(LatLon(43.07, -89.40))
    ///     .max_distance_m(100_000.0)
    ///     .call();
    /// for (station, metres) in nearby {
    ///     println!("{} at {:.0} m", station.name(), metres);
    /// }
    /// # Ok(())
    /// # }
    /// ```
    #[builder]
    pub fn nearest_stations(
        &self,
        location: LatLon,
        max_distance_m: Option<f64>,
        station_limit: Option<usize>,
    ) -> Vec<(WisconetStation<'_>, f64)> {
        let limit = station_limit.unwrap_or(3);
        self.directory
            .nearest(location.0, location.1, limit, max_distance_m)
            .into_iter()
            .map(|(station, distance)| {
                (
                    WisconetStation {
                        client: self,
                        station,
                    },
                    distance,
                )
            })
            .collect()
    }
}

/// One station, bound to the client that found it.
#[derive(Clone, Copy)]
pub struct WisconetStation<'a> {
    client: &'a Wisconet,
    station: &'a Station,
}

impl std::fmt::Debug for WisconetStation<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("WisconetStation").field(self.station).finish()
    }
}

impl<'a> WisconetStation<'a> {
    pub fn station(&self) -> &'a Station {
        self.station
    }

    pub fn name(&self) -> &'a str {
        &self.station.station_name
    }

    pub fn id(&self) -> &'a str {
        &self.station.station_id
    }

    pub fn location(&self) -> Option<Location> {
        self.station.location
    }

    /// Great-circle distance in metres, or `None` without coordinates.
    pub fn distance_to_point(&self, location: LatLon) -> Option<f64> {
        self.station
            .location
            .map(|loc| distance_m(loc.latitude, loc.longitude, location.0, location.1))
    }

    /// Fields available at this station. Fetched once per client.
    pub async fn fields(&self) -> Result<Arc<Vec<FieldSpec>>, WisconetError> {
        Ok(self.client.directory.get_fields(self.id()).await?)
    }

    /// Standard names of the available fields, optionally only those
    /// containing `filter`.
    pub async fn get_field_names(&self, filter: Option<&str>) -> Result<Vec<String>, WisconetError> {
        let fields = self.fields().await?;
        Ok(fields
            .iter()
            .map(|f| &f.standard_name)
            .filter(|name| filter.map_or(true, |needle| name.contains(needle)))
            .cloned()
            .collect())
    }

    /// Standard names of the available fields meeting `criteria`.
    pub async fn filter_fields(
        &self,
        criteria: &[FieldCriterion],
    ) -> Result<Vec<String>, WisconetError> {
        let fields = self.fields().await?;
        Ok(filter_fields(&fields, criteria))
    }

    /// [`Wisconet::get_data`] for this station alone, with default columns.
    pub async fn fetch_data(
        &self,
        start_time: impl Into<TimeBound>,
        end_time: impl Into<TimeBound>,
        fields: impl Into<Selection>,
    ) -> Result<DataResponse, WisconetError> {
        self.client
            .get_data()
            .station_ids(self.id())
            .start_time(start_time)
            .end_time(end_time)
            .fields(fields)
            .call()
            .await
    }

    /// Everything from the station's first day of data until now.
    pub async fn fetch_all_available_data(
        &self,
        fields: impl Into<Selection>,
    ) -> Result<DataResponse, WisconetError> {
        let start = self
            .station
            .earliest_api_date
            .ok_or_else(|| ValidationError::UnknownStartDate(self.id().to_string()))?;
        self.fetch_data(start, Utc::now(), fields).await
    }
}
