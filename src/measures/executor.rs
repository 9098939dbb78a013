use crate::http::transport::HttpTransport;
use crate::measures::error::{FetchError, FetchFailure};
use crate::measures::planner::{FetchTask, TimeWindow};
use crate::types::field::FieldSpec;
use crate::types::schema::{field_id_of, BulkMeasures, ObservationValue};
use chrono::{DateTime, TimeZone, Utc};
use futures_util::future::join_all;
use log::{info, warn};
use std::collections::HashMap;

/// One measured value as the API returned it.
#[derive(Debug, Clone, PartialEq)]
pub struct RawObservation {
    pub timestamp: DateTime<Utc>,
    pub field: String,
    pub value: ObservationValue,
    pub units: Option<String>,
}

/// Everything fetched for one station, in response order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawObservationSet {
    pub observations: Vec<RawObservation>,
    /// Field metadata from the responses' field lists.
    pub fields: Vec<FieldSpec>,
}

impl RawObservationSet {
    fn absorb(&mut self, page: Self) {
        self.observations.extend(page.observations);
        for spec in page.fields {
            if !self
                .fields
                .iter()
                .any(|f| f.standard_name == spec.standard_name)
            {
                self.fields.push(spec);
            }
        }
    }
}

#[derive(Debug)]
pub struct TaskResult {
    pub task: FetchTask,
    pub outcome: Result<RawObservationSet, FetchError>,
}

/// Runs every task at once and waits for all of them. Results come back in
/// task order whatever order the requests finish in, and one station's
/// failure never touches another's result.
pub async fn execute(transport: &dyn HttpTransport, tasks: Vec<FetchTask>) -> Vec<TaskResult> {
    let runs = tasks.into_iter().map(|task| async move {
        let outcome = run_task(transport, &task).await;
        match &outcome {
            Ok(set) => info!(
                "Fetched {} observations for {} in {} request(s)",
                set.observations.len(),
                task.station_id(),
                task.windows.len()
            ),
            Err(e) => warn!("{}: {}", e, e.cause),
        }
        TaskResult { task, outcome }
    });
    join_all(runs).await
}

async fn run_task(
    transport: &dyn HttpTransport,
    task: &FetchTask,
) -> Result<RawObservationSet, FetchError> {
    let route = format!("/stations/{}/measures", task.station_id());
    let pages = join_all(
        task.windows
            .iter()
            .map(|window| fetch_window(transport, &route, window, &task.fields)),
    )
    .await;

    let mut set = RawObservationSet::default();
    for page in pages {
        set.absorb(page.map_err(|cause| FetchError::new(task.station_id(), cause))?);
    }
    Ok(set)
}

async fn fetch_window(
    transport: &dyn HttpTransport,
    route: &str,
    window: &TimeWindow,
    fields: &[String],
) -> Result<RawObservationSet, FetchFailure> {
    let query = vec![
        ("start_time".to_string(), window.start.timestamp().to_string()),
        ("end_time".to_string(), window.end.timestamp().to_string()),
        ("fields".to_string(), fields.join(",")),
    ];
    let body = transport.get_json(route, &query).await?;
    let bulk: BulkMeasures = serde_json::from_value(body)?;
    flatten(bulk)
}

/// Turns a bulk response into observations, checking every measure against
/// the response's field list.
pub fn flatten(bulk: BulkMeasures) -> Result<RawObservationSet, FetchFailure> {
    let by_id: HashMap<i64, usize> = bulk
        .fieldlist
        .iter()
        .enumerate()
        .map(|(i, f)| (f.id, i))
        .collect();
    let mut observations = Vec::new();

    for row in &bulk.data {
        let timestamp = Utc
            .timestamp_opt(row.collection_time, 0)
            .single()
            .ok_or_else(|| {
                FetchFailure::MalformedPayload(format!(
                    "collection_time {} is out of range",
                    row.collection_time
                ))
            })?;

        for pair in &row.measures {
            let [id, value] = pair.as_slice() else {
                return Err(FetchFailure::MalformedPayload(format!(
                    "measure at {} has {} elements, expected 2",
                    row.collection_time,
                    pair.len()
                )));
            };
            let field_id = field_id_of(id).ok_or_else(|| {
                FetchFailure::MalformedPayload(format!("invalid field id {id}"))
            })?;
            let spec = by_id
                .get(&field_id)
                .map(|&i| &bulk.fieldlist[i])
                .ok_or_else(|| {
                    FetchFailure::MalformedPayload(format!(
                        "field id {field_id} is not in the field list"
                    ))
                })?;
            let value = ObservationValue::from_json(value).ok_or_else(|| {
                FetchFailure::MalformedPayload(format!(
                    "value for {} is not a scalar",
                    spec.standard_name
                ))
            })?;

            observations.push(RawObservation {
                timestamp,
                field: spec.standard_name.clone(),
                value,
                units: spec.reported_units().map(str::to_string),
            });
        }
    }

    Ok(RawObservationSet {
        observations,
        fields: bulk.fieldlist,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::measures::planner::split_windows;
    use crate::testing::{air_temp_field, hourly, jan_first, rh_field, FakeTransport};
    use crate::types::station::fixtures::station;
    use chrono::Duration;
    use serde_json::json;
    use std::time::Duration as StdDuration;

    fn task(index: usize, station_id: &str, days: i64, chunk_days: u32) -> FetchTask {
        let start = jan_first();
        let end = start + Duration::days(days);
        FetchTask {
            index,
            station: station(index as i64, station_id, station_id, 43.0, -89.0),
            start,
            end,
            fields: vec!["60min_air_temp_f_avg".into()],
            windows: split_windows(start, end, chunk_days),
        }
    }

    #[test]
    fn flatten_rejects_unknown_field_ids() {
        let bulk: BulkMeasures = serde_json::from_value(json!({
            "fieldlist": [air_temp_field(4)],
            "data": [{"collection_time": 1735711200, "measures": [[9, 1.0]]}]
        }))
        .unwrap();
        let err = flatten(bulk).unwrap_err();
        assert!(matches!(err, FetchFailure::MalformedPayload(ref m) if m.contains("9")));
    }

    #[test]
    fn flatten_rejects_short_pairs() {
        let bulk: BulkMeasures = serde_json::from_value(json!({
            "fieldlist": [air_temp_field(4)],
            "data": [{"collection_time": 1735711200, "measures": [[4]]}]
        }))
        .unwrap();
        assert!(matches!(flatten(bulk), Err(FetchFailure::MalformedPayload(_))));
    }

    #[test]
    fn flatten_carries_units_and_nulls() {
        let bulk: BulkMeasures = serde_json::from_value(json!({
            "fieldlist": [air_temp_field(4), rh_field(5)],
            "data": [{"collection_time": 1735711200, "measures": [[4, 20.5], [5, null]]}]
        }))
        .unwrap();
        let set = flatten(bulk).unwrap();
        assert_eq!(set.observations.len(), 2);
        assert_eq!(set.observations[0].timestamp, jan_first());
        assert_eq!(set.observations[0].units.as_deref(), Some("fahrenheit"));
        assert!(set.observations[1].value.is_null());
        assert_eq!(set.fields.len(), 2);
    }

    #[tokio::test]
    async fn results_keep_task_order_when_completion_is_shuffled() {
        let fields = json!([air_temp_field(4)]);
        let fake = FakeTransport::new()
            .with_series("/stations/A/measures", fields.clone(), hourly(jan_first(), 3, &[(4, 1.0)]))
            .with_delay("/stations/A/measures", StdDuration::from_millis(40))
            .with_series("/stations/B/measures", fields.clone(), hourly(jan_first(), 3, &[(4, 2.0)]))
            .with_delay("/stations/B/measures", StdDuration::from_millis(5))
            .with_series("/stations/C/measures", fields, hourly(jan_first(), 3, &[(4, 3.0)]));

        let results = execute(&fake, vec![task(0, "A", 1, 30), task(1, "B", 1, 30), task(2, "C", 1, 30)]).await;
        let order: Vec<&str> = results.iter().map(|r| r.task.station_id()).collect();
        assert_eq!(order, ["A", "B", "C"]);
        assert!(results.iter().all(|r| r.outcome.is_ok()));
    }

    #[tokio::test]
    async fn one_failure_leaves_siblings_alone() {
        let fake = FakeTransport::new()
            .with_series("/stations/A/measures", json!([air_temp_field(4)]), hourly(jan_first(), 24, &[(4, 0.0)]))
            .with_status("/stations/B/measures", 503);

        let results = execute(&fake, vec![task(0, "A", 1, 30), task(1, "B", 1, 30)]).await;
        assert_eq!(results[0].outcome.as_ref().unwrap().observations.len(), 24);
        let err = results[1].outcome.as_ref().unwrap_err();
        assert_eq!(err.station_id, "B");
        assert!(matches!(err.cause, FetchFailure::Transport(_)));
    }

    #[tokio::test]
    async fn windows_are_fetched_and_joined() {
        let fake = FakeTransport::new().with_series(
            "/stations/A/measures",
            json!([air_temp_field(4)]),
            hourly(jan_first(), 24 * 5, &[(4, 0.0)]),
        );
        let results = execute(&fake, vec![task(0, "A", 5, 2)]).await;
        assert_eq!(fake.calls_to("/stations/A/measures"), 3);
        let set = results[0].outcome.as_ref().unwrap();
        assert_eq!(set.observations.len(), 24 * 5);
        assert_eq!(set.fields.len(), 1);

        let requests = fake.requests_to("/stations/A/measures");
        assert!(requests.iter().all(|q| q.iter().any(|(k, v)| k == "fields" && v == "60min_air_temp_f_avg")));
    }

    #[tokio::test]
    async fn a_failed_window_fails_the_station() {
        let fake = FakeTransport::new().with_handler("/stations/A/measures", |url, query| {
            let start: i64 = query[0].1.parse().unwrap();
            if start > jan_first().timestamp() {
                Err(crate::http::error::TransportError::Unavailable {
                    url: url.to_string(),
                    message: "second window".into(),
                })
            } else {
                Ok(json!({"fieldlist": [], "data": []}))
            }
        });
        let results = execute(&fake, vec![task(0, "A", 4, 2)]).await;
        assert!(results[0].outcome.is_err());
    }
}
