use crate::error::WisconetError;
use crate::measures::error::ValidationError;
use crate::stations::directory::StationDirectory;
use crate::types::selection::Selection;
use crate::types::station::Station;
use crate::types::time_bound::TimeBound;
use chrono::{DateTime, Duration, TimeZone, Utc};
use chrono_tz::Tz;
use log::debug;

/// A caller's request after normalisation. Building one performs every check
/// that doesn't need the station directory.
///
/// Times stay unresolved here: wall-clock bounds are read in each station's
/// own zone when the plan is made.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanRequest {
    pub stations: Vec<String>,
    pub fields: Vec<String>,
    pub start: TimeBound,
    pub end: TimeBound,
}

impl PlanRequest {
    pub fn new(
        stations: Selection,
        start: TimeBound,
        end: TimeBound,
        fields: Selection,
    ) -> Result<Self, ValidationError> {
        if stations.is_empty() {
            return Err(ValidationError::EmptyStations);
        }
        if fields.is_empty() {
            return Err(ValidationError::EmptyFields);
        }
        let stations = stations.distinct();
        let fields = fields.distinct();
        if stations.iter().any(String::is_empty) {
            return Err(ValidationError::BlankName("station"));
        }
        if fields.iter().any(String::is_empty) {
            return Err(ValidationError::BlankName("field"));
        }

        let start_utc = resolve_in(&start, &Utc)?;
        let end_utc = resolve_in(&end, &Utc)?;
        // Two bounds of the same kind keep their order in any zone; mixed
        // kinds are checked per station.
        if start.is_wall_clock() == end.is_wall_clock() && start_utc > end_utc {
            return Err(ValidationError::InvertedRange {
                start: start_utc,
                end: end_utc,
            });
        }

        Ok(Self {
            stations,
            fields,
            start,
            end,
        })
    }

    /// The requested range as instants, reading wall-clock bounds in `tz`.
    pub fn range_in(&self, tz: &Tz) -> Result<(DateTime<Utc>, DateTime<Utc>), ValidationError> {
        let start = resolve_in(&self.start, tz)?;
        let end = resolve_in(&self.end, tz)?;
        if start > end {
            return Err(ValidationError::InvertedRange { start, end });
        }
        Ok((start, end))
    }
}

fn resolve_in<Z: TimeZone>(bound: &TimeBound, tz: &Z) -> Result<DateTime<Utc>, ValidationError> {
    bound
        .resolve_in(tz)
        .ok_or_else(|| ValidationError::UnparseableTime(bound.to_string()))
}

/// One request to the measures route. Both ends are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// All the work for one station.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchTask {
    /// Position in the plan; results are ordered by it.
    pub index: usize,
    pub station: Station,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub fields: Vec<String>,
    pub windows: Vec<TimeWindow>,
}

impl FetchTask {
    pub fn station_id(&self) -> &str {
        &self.station.station_id
    }
}

/// Splits `[start, end]` into consecutive windows of `chunk_days`. Windows
/// don't overlap: each ends one second before the next starts, except the
/// last which ends at `end`.
pub fn split_windows(start: DateTime<Utc>, end: DateTime<Utc>, chunk_days: u32) -> Vec<TimeWindow> {
    let step = Duration::days(i64::from(chunk_days.max(1)));
    let mut windows = Vec::new();
    let mut window_start = start;
    loop {
        match window_start.checked_add_signed(step) {
            Some(next) if next < end => {
                windows.push(TimeWindow {
                    start: window_start,
                    end: next - Duration::seconds(1),
                });
                window_start = next;
            }
            _ => {
                windows.push(TimeWindow {
                    start: window_start,
                    end,
                });
                return windows;
            }
        }
    }
}

/// Resolves each requested station and produces one task per distinct
/// station, in request order. Wall-clock bounds are read in each station's
/// zone, so stations in different zones get different windows.
///
/// # Errors
///
/// Returns [`WisconetError::Directory`] with a `NotFound` cause for the
/// first unknown station, or a validation error for a zero `chunk_days` or a
/// range that ends before it starts once resolved.
pub fn plan(
    request: &PlanRequest,
    directory: &StationDirectory,
    chunk_days: u32,
) -> Result<Vec<FetchTask>, WisconetError> {
    if chunk_days == 0 {
        return Err(ValidationError::InvalidChunkDays.into());
    }

    let mut stations: Vec<&Station> = Vec::with_capacity(request.stations.len());
    for identifier in &request.stations {
        let station = directory.get_station(identifier)?;
        if !stations.iter().any(|s| s.station_id == station.station_id) {
            stations.push(station);
        }
    }

    let mut tasks = Vec::with_capacity(stations.len());
    for (index, station) in stations.into_iter().enumerate() {
        let tz = station.time_zone();
        let (start, end) = request.range_in(&tz)?;
        let windows = split_windows(start, end, chunk_days);
        debug!(
            "Planned {} from {} to {} ({}) in {} window(s)",
            station.station_id,
            start,
            end,
            tz,
            windows.len()
        );
        tasks.push(FetchTask {
            index,
            station: station.clone(),
            start,
            end,
            fields: request.fields.clone(),
            windows,
        });
    }
    Ok(tasks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{jan_first, FakeTransport};
    use crate::types::station::fixtures::station;
    use std::sync::Arc;

    fn request(
        stations: impl Into<Selection>,
        start: impl Into<TimeBound>,
        end: impl Into<TimeBound>,
        fields: impl Into<Selection>,
    ) -> Result<PlanRequest, ValidationError> {
        PlanRequest::new(stations.into(), start.into(), end.into(), fields.into())
    }

    #[test]
    fn normalises_lone_strings_and_dates() -> Result<(), ValidationError> {
        let req = request("maple", "2025-01-01", "2025-01-02", "60min_air_temp_f_avg")?;
        assert_eq!(req.stations, ["maple"]);
        assert_eq!(req.fields, ["60min_air_temp_f_avg"]);
        let (start, end) = req.range_in(&chrono_tz::America::Chicago)?;
        assert_eq!(start, jan_first());
        assert_eq!(end, jan_first() + Duration::days(1));
        Ok(())
    }

    #[test]
    fn mixed_bounds_are_ordered_per_zone() -> Result<(), ValidationError> {
        // 05:00Z is before Chicago's 01:00 (07:00Z) but after UTC's 01:00.
        let req = request("maple", "2025-01-01T05:00:00Z", "2025-01-01T01:00:00", "x")?;
        assert!(req.range_in(&chrono_tz::America::Chicago).is_ok());
        assert!(matches!(
            req.range_in(&Tz::UTC),
            Err(ValidationError::InvertedRange { .. })
        ));
        Ok(())
    }

    #[test]
    fn validation_runs_in_order() {
        let empty: Vec<String> = vec![];
        assert_eq!(
            request(empty.clone(), "2025-01-02", "2025-01-01", empty.clone()),
            Err(ValidationError::EmptyStations)
        );
        assert_eq!(
            request("maple", "2025-01-01", "2025-01-02", empty),
            Err(ValidationError::EmptyFields)
        );
        assert_eq!(
            request(["maple", "  "], "2025-01-01", "2025-01-02", "x"),
            Err(ValidationError::BlankName("station"))
        );
        assert_eq!(
            request("maple", "soon", "2025-01-02", "x"),
            Err(ValidationError::UnparseableTime("soon".into()))
        );
        assert!(matches!(
            request("maple", "2025-01-02", "2025-01-01", "x"),
            Err(ValidationError::InvertedRange { .. })
        ));
    }

    #[test]
    fn same_start_and_end_is_allowed() {
        assert!(request("maple", "2025-01-01", "2025-01-01", "x").is_ok());
    }

    #[test]
    fn windows_tile_the_range() {
        let start = jan_first();
        let end = start + Duration::days(65);
        let windows = split_windows(start, end, 30);
        assert_eq!(windows.len(), 3);
        assert_eq!(windows[0].start, start);
        assert_eq!(windows[0].end, start + Duration::days(30) - Duration::seconds(1));
        assert_eq!(windows[1].start, start + Duration::days(30));
        assert_eq!(windows[2].end, end);
        for pair in windows.windows(2) {
            assert_eq!(pair[0].end + Duration::seconds(1), pair[1].start);
        }
    }

    #[test]
    fn short_range_is_one_window() {
        let start = jan_first();
        assert_eq!(
            split_windows(start, start + Duration::days(1), 30),
            [TimeWindow {
                start,
                end: start + Duration::days(1)
            }]
        );
        assert_eq!(split_windows(start, start, 30).len(), 1);
        // Exactly one chunk long stays a single window.
        assert_eq!(split_windows(start, start + Duration::days(30), 30).len(), 1);
    }

    #[tokio::test]
    async fn one_task_per_distinct_station() -> Result<(), WisconetError> {
        let dir = StationDirectory::load(Arc::new(FakeTransport::wisconsin()), &[]).await?;
        let req = request(
            ["ALTN", "maple", "Arlington", "sister-bay"],
            "2025-01-01",
            "2025-01-02",
            ["a", "b"],
        )?;
        let tasks = plan(&req, &dir, 30)?;
        let ids: Vec<&str> = tasks.iter().map(FetchTask::station_id).collect();
        assert_eq!(ids, ["ALTN", "maple", "SBAY"]);
        assert_eq!(tasks.iter().map(|t| t.index).collect::<Vec<_>>(), [0, 1, 2]);
        assert!(tasks.iter().all(|t| t.fields == ["a", "b"] && t.windows.len() == 1));
        Ok(())
    }

    #[tokio::test]
    async fn windows_follow_each_station_zone() -> Result<(), WisconetError> {
        let mut chicago = station(1, "ALTN", "Arlington", 43.30, -89.38);
        chicago.station_timezone = Some("America/Chicago".into());
        let mut unzoned = station(2, "SBAY", "Sister Bay", 45.19, -87.12);
        unzoned.station_timezone = None;
        let dir = StationDirectory::from_stations(
            Arc::new(FakeTransport::new()),
            vec![chicago, unzoned],
        );

        let req = request(["ALTN", "SBAY"], "2025-01-01", "2025-01-02", "a")?;
        let tasks = plan(&req, &dir, 30)?;
        // Midnight in Chicago is 06:00Z in January.
        assert_eq!(tasks[0].start.timestamp(), 1735711200);
        assert_eq!(tasks[0].windows[0].end.timestamp(), 1735797600);
        // No zone on record means UTC.
        assert_eq!(tasks[1].start.timestamp(), 1735689600);

        let fixed = request("ALTN", "2025-01-01T00:00:00Z", "2025-01-02T00:00:00Z", "a")?;
        assert_eq!(plan(&fixed, &dir, 30)?[0].start.timestamp(), 1735689600);
        Ok(())
    }

    #[tokio::test]
    async fn unknown_station_fails_the_plan() -> Result<(), WisconetError> {
        let dir = StationDirectory::load(Arc::new(FakeTransport::wisconsin()), &[]).await?;
        let req = request(["maple", "zzz"], "2025-01-01", "2025-01-02", "a")?;
        let err = plan(&req, &dir, 30).unwrap_err();
        assert!(err.is_not_found());
        assert!(matches!(
            plan(&req, &dir, 0),
            Err(WisconetError::Validation(ValidationError::InvalidChunkDays))
        ));
        Ok(())
    }
}
