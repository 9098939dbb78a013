use crate::measures::error::FetchError;
use crate::measures::executor::{RawObservation, TaskResult};
use crate::registry::FieldRegistry;
use crate::types::table::{ColumnConfig, ResultTable, TidyRow};

/// The merged table plus the stations that contributed nothing because their
/// fetch failed.
#[derive(Debug)]
pub struct ReshapeOutput {
    pub table: ResultTable,
    pub failures: Vec<FetchError>,
}

/// Merges per-station results into one tidy table.
///
/// Rows are ordered by task, then timestamp, then field in the order the
/// request named them. Fields the API returned without being asked for come
/// after the requested ones, by name. Failed tasks add no rows and are
/// returned in `failures`, also in task order.
pub fn reshape(
    mut results: Vec<TaskResult>,
    registry: &FieldRegistry,
    columns: &ColumnConfig,
) -> ReshapeOutput {
    results.sort_by_key(|r| r.task.index);

    let mut rows = Vec::new();
    let mut failures = Vec::new();

    for TaskResult { task, outcome } in results {
        let set = match outcome {
            Ok(set) => set,
            Err(e) => {
                failures.push(e);
                continue;
            }
        };

        let rank = |obs: &RawObservation| {
            task.fields
                .iter()
                .position(|f| *f == obs.field)
                .unwrap_or(task.fields.len())
        };
        let mut observations = set.observations;
        observations.sort_by(|a, b| {
            a.timestamp
                .cmp(&b.timestamp)
                .then_with(|| rank(a).cmp(&rank(b)))
                .then_with(|| a.field.cmp(&b.field))
        });

        rows.extend(observations.into_iter().map(|obs| {
            let units = obs
                .units
                .or_else(|| registry.known_units(&obs.field).map(str::to_string));
            let (value, final_units) = registry.convert(units.as_deref(), &obs.value);
            TidyRow {
                datetime: obs.timestamp,
                station_id: task.station.station_id.clone(),
                variable: obs.field,
                value,
                units,
                final_units,
            }
        }));
    }

    ReshapeOutput {
        table: ResultTable::new(rows, columns.clone()),
        failures,
    }
}
