//! Client for the [Wisconet](https://wisconet.wisc.edu) mesonet API.
//!
//! Fetches observations for many stations at once and reshapes them into a
//! single tidy table (one row per station, time and variable).

mod config;
mod error;
mod filtering;
mod http;
mod measures;
mod registry;
mod stations;
mod types;
mod wisconet;

#[cfg(test)]
mod testing;

pub use config::{ClientConfig, BASE_URL, NO_DATA_STATION_IDS};
pub use error::WisconetError;
pub use filtering::{filter_fields, FieldCriterion};
pub use registry::{FieldRegistry, UnitConversion};
pub use wisconet::*;

pub use http::error::TransportError;
pub use http::transport::{ConnectionLimit, HttpTransport, ReqwestTransport};

pub use measures::error::{FetchError, FetchFailure, ValidationError};

pub use stations::directory::StationDirectory;
pub use stations::error::DirectoryError;

pub use types::field::FieldSpec;
pub use types::schema::ObservationValue;
pub use types::selection::Selection;
pub use types::station::{Location, Station};
pub use types::table::{
    Cell, ColumnConfig, ColumnTable, DataFrameOrient, Record, ResultTable, TableData, TidyRow,
};
pub use types::time_bound::TimeBound;
pub use types::variables::{CollectionFrequency, MeasureType, UnknownVariant, Units};
