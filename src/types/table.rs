//! The tidy output table and its two layouts.
//!
//! A [`ResultTable`] holds one canonical, ordered list of [`TidyRow`]s. The
//! row-oriented and column-oriented layouts, as well as the polars export,
//! are all views over that list, so they always agree on content and order.

use crate::measures::error::ValidationError;
use crate::types::schema::ObservationValue;
use bon::Builder;
use chrono::{DateTime, Utc};
use polars::prelude::*;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::ops::Index;

/// One observation: a value of one variable at one station at one time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TidyRow {
    pub datetime: DateTime<Utc>,
    pub station_id: String,
    pub variable: String,
    /// Value expressed in `final_units`.
    pub value: ObservationValue,
    /// Units as reported by the API for this field at this station.
    pub units: Option<String>,
    /// Units after the registry's canonical conversion; equals `units` when
    /// no conversion applies.
    pub final_units: Option<String>,
}

/// Layout produced by [`ResultTable::render`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DataFrameOrient {
    /// A list of row mappings.
    #[default]
    Records,
    /// A mapping of column name to the ordered column values.
    Columns,
}

/// Output column labels and layout.
///
/// Only the labels change with this configuration; which column holds what
/// is fixed.
#[derive(Debug, Clone, PartialEq, Eq, Builder)]
pub struct ColumnConfig {
    #[builder(default)]
    pub orient: DataFrameOrient,
    #[builder(into, default = "collection_time".to_string())]
    pub datetime_col_name: String,
    #[builder(into, default = "station_id".to_string())]
    pub station_id_col_name: String,
    #[builder(into, default = "variable".to_string())]
    pub variable_col_name: String,
    #[builder(into, default = "value".to_string())]
    pub value_col_name: String,
    #[builder(into, default = "units".to_string())]
    pub units_col_name: String,
    #[builder(into, default = "final_units".to_string())]
    pub final_units_col_name: String,
}

impl Default for ColumnConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl ColumnConfig {
    /// Labels in column order: datetime, station id, variable, value, units,
    /// final units.
    pub fn names(&self) -> [&str; 6] {
        [
            &self.datetime_col_name,
            &self.station_id_col_name,
            &self.variable_col_name,
            &self.value_col_name,
            &self.units_col_name,
            &self.final_units_col_name,
        ]
    }

    /// Rejects blank or repeated labels.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let names = self.names();
        for (i, name) in names.iter().enumerate() {
            if name.trim().is_empty() {
                return Err(ValidationError::BlankColumnName);
            }
            if names[..i].contains(name) {
                return Err(ValidationError::DuplicateColumnName(name.to_string()));
            }
        }
        Ok(())
    }
}

/// A single cell in a rendered table.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    DateTime(DateTime<Utc>),
    Number(f64),
    Text(String),
    Null,
}

impl Cell {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Number(n) => Some(*n),
            _ => None,
        }
    }
}

impl From<&ObservationValue> for Cell {
    fn from(value: &ObservationValue) -> Self {
        match value {
            ObservationValue::Number(n) => Cell::Number(*n),
            ObservationValue::Text(s) => Cell::Text(s.clone()),
            ObservationValue::Null => Cell::Null,
        }
    }
}

fn optional_text(value: &Option<String>) -> Cell {
    value.clone().map_or(Cell::Null, Cell::Text)
}

/// A row keyed by column label, in column order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record(pub Vec<(String, Cell)>);

impl Record {
    pub fn get(&self, name: &str) -> Option<&Cell> {
        self.0
            .iter()
            .find(|(label, _)| label == name)
            .map(|(_, cell)| cell)
    }

    pub fn contains_key(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(label, _)| label.as_str())
    }
}

impl<Q: AsRef<str> + ?Sized> Index<&Q> for Record {
    type Output = Cell;

    /// # Panics
    ///
    /// Panics if the record has no column called `name`.
    fn index(&self, name: &Q) -> &Cell {
        let name = name.as_ref();
        match self.get(name) {
            Some(cell) => cell,
            None => panic!("no column named {name:?}"),
        }
    }
}

impl FromIterator<(String, Cell)> for Record {
    fn from_iter<T: IntoIterator<Item = (String, Cell)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (label, cell) in &self.0 {
            map.serialize_entry(label, cell)?;
        }
        map.end()
    }
}

/// Column label to values, in column order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ColumnTable(pub Vec<(String, Vec<Cell>)>);

impl ColumnTable {
    pub fn get(&self, name: &str) -> Option<&[Cell]> {
        self.0
            .iter()
            .find(|(label, _)| label == name)
            .map(|(_, values)| values.as_slice())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(label, _)| label.as_str())
    }
}

impl Serialize for ColumnTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (label, values) in &self.0 {
            map.serialize_entry(label, values)?;
        }
        map.end()
    }
}

/// A rendered table in the configured layout.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TableData {
    Records(Vec<Record>),
    Columns(ColumnTable),
}

/// The merged, ordered output of a fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultTable {
    rows: Vec<TidyRow>,
    columns: ColumnConfig,
}

impl ResultTable {
    pub fn new(rows: Vec<TidyRow>, columns: ColumnConfig) -> Self {
        Self { rows, columns }
    }

    pub fn rows(&self) -> &[TidyRow] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<TidyRow> {
        self.rows
    }

    pub fn columns(&self) -> &ColumnConfig {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Station ids present in the table, in row order.
    pub fn station_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = Vec::new();
        for row in &self.rows {
            if ids.last() != Some(&row.station_id.as_str())
                && !ids.contains(&row.station_id.as_str())
            {
                ids.push(&row.station_id);
            }
        }
        ids
    }

    /// Renders in the layout chosen by the column configuration.
    pub fn render(&self) -> TableData {
        match self.columns.orient {
            DataFrameOrient::Records => TableData::Records(self.to_records()),
            DataFrameOrient::Columns => TableData::Columns(self.to_columns()),
        }
    }

    pub fn to_records(&self) -> Vec<Record> {
        let names = self.columns.names();
        self.rows
            .iter()
            .map(|row| {
                names
                    .iter()
                    .map(|n| n.to_string())
                    .zip(Self::cells(row))
                    .collect()
            })
            .collect()
    }

    pub fn to_columns(&self) -> ColumnTable {
        let mut columns: Vec<(String, Vec<Cell>)> = self
            .columns
            .names()
            .iter()
            .map(|name| (name.to_string(), Vec::with_capacity(self.rows.len())))
            .collect();
        for row in &self.rows {
            for (column, cell) in columns.iter_mut().zip(Self::cells(row)) {
                column.1.push(cell);
            }
        }
        ColumnTable(columns)
    }

    fn cells(row: &TidyRow) -> [Cell; 6] {
        [
            Cell::DateTime(row.datetime),
            Cell::Text(row.station_id.clone()),
            Cell::Text(row.variable.clone()),
            Cell::from(&row.value),
            optional_text(&row.units),
            optional_text(&row.final_units),
        ]
    }

    /// Builds a polars `DataFrame` with the configured column labels.
    ///
    /// The datetime column is `Datetime(Milliseconds)` holding naive UTC. The
    /// value column is `Float64` when every value is numeric or null and
    /// `String` otherwise.
    ///
    /// # Errors
    ///
    /// Returns a [`PolarsError`] if polars rejects a column.
    pub fn to_dataframe(&self) -> PolarsResult<DataFrame> {
        let c = &self.columns;
        let datetime = Series::new(
            c.datetime_col_name.as_str().into(),
            self.rows
                .iter()
                .map(|r| r.datetime.timestamp_millis())
                .collect::<Vec<i64>>(),
        )
        .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?;

        let station_ids = Series::new(
            c.station_id_col_name.as_str().into(),
            self.rows
                .iter()
                .map(|r| r.station_id.as_str())
                .collect::<Vec<&str>>(),
        );
        let variables = Series::new(
            c.variable_col_name.as_str().into(),
            self.rows
                .iter()
                .map(|r| r.variable.as_str())
                .collect::<Vec<&str>>(),
        );

        let all_numeric = self
            .rows
            .iter()
            .all(|r| matches!(r.value, ObservationValue::Number(_) | ObservationValue::Null));
        let values = if all_numeric {
            Series::new(
                c.value_col_name.as_str().into(),
                self.rows
                    .iter()
                    .map(|r| r.value.as_f64())
                    .collect::<Vec<Option<f64>>>(),
            )
        } else {
            Series::new(
                c.value_col_name.as_str().into(),
                self.rows
                    .iter()
                    .map(|r| match &r.value {
                        ObservationValue::Number(n) => Some(n.to_string()),
                        ObservationValue::Text(s) => Some(s.clone()),
                        ObservationValue::Null => None,
                    })
                    .collect::<Vec<Option<String>>>(),
            )
        };

        let units = Series::new(
            c.units_col_name.as_str().into(),
            self.rows
                .iter()
                .map(|r| r.units.as_deref())
                .collect::<Vec<Option<&str>>>(),
        );
        let final_units = Series::new(
            c.final_units_col_name.as_str().into(),
            self.rows
                .iter()
                .map(|r| r.final_units.as_deref())
                .collect::<Vec<Option<&str>>>(),
        );

        DataFrame::new(vec![
            datetime.into(),
            station_ids.into(),
            variables.into(),
            values.into(),
            units.into(),
            final_units.into(),
        ])
    }

    /// [`Self::to_dataframe`] as a `LazyFrame`, for further polars queries.
    pub fn to_lazyframe(&self) -> PolarsResult<LazyFrame> {
        Ok(self.to_dataframe()?.lazy())
    }
}
