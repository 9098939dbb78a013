//! Field (variable) metadata.

use crate::types::variables::{CollectionFrequency, MeasureType, Units};
use serde::{Deserialize, Serialize};

/// A measurable quantity at a station, as described by the API's field records.
///
/// `standard_name` (e.g. `60min_air_temp_f_avg`) is the identifier callers use
/// to request data; `id` is the numeric key bulk responses use to refer to the
/// field and is only meaningful inside the response that carried it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub id: i64,
    pub standard_name: String,
    #[serde(default)]
    pub collection_frequency: Option<String>,
    #[serde(default)]
    pub conversion_type: Option<String>,
    #[serde(default)]
    pub data_type: Option<String>,
    /// Units the API reports values in.
    #[serde(default)]
    pub final_units: Option<String>,
    #[serde(default)]
    pub measure_type: Option<String>,
    #[serde(default)]
    pub qualifier: Option<String>,
    #[serde(default)]
    pub sensor: Option<String>,
    #[serde(default)]
    pub source_field: Option<String>,
    #[serde(default)]
    pub source_units: Option<String>,
    #[serde(default)]
    pub units_abbrev: Option<String>,
    #[serde(default)]
    pub use_for: Option<String>,
}

impl FieldSpec {
    /// A spec carrying only a name; everything else unknown.
    pub fn named(id: i64, standard_name: impl Into<String>) -> Self {
        Self {
            id,
            standard_name: standard_name.into(),
            collection_frequency: None,
            conversion_type: None,
            data_type: None,
            final_units: None,
            measure_type: None,
            qualifier: None,
            sensor: None,
            source_field: None,
            source_units: None,
            units_abbrev: None,
            use_for: None,
        }
    }

    /// The unit label values of this field arrive in: `final_units`, falling
    /// back to `units_abbrev`.
    pub fn reported_units(&self) -> Option<&str> {
        self.final_units
            .as_deref()
            .or(self.units_abbrev.as_deref())
            .filter(|u| !u.trim().is_empty())
    }

    /// Collection frequency from metadata, or inferred from the name prefix.
    pub fn frequency(&self) -> Option<CollectionFrequency> {
        self.collection_frequency
            .as_deref()
            .and_then(|f| f.parse().ok())
            .or_else(|| CollectionFrequency::from_standard_name(&self.standard_name))
    }

    pub fn measure(&self) -> Option<MeasureType> {
        self.measure_type.as_deref().and_then(|m| m.parse().ok())
    }

    pub fn units(&self) -> Option<Units> {
        self.final_units.as_deref().and_then(|u| u.parse().ok())
    }

    /// Fills metadata this spec lacks from `other`. Values already present win.
    pub fn merge_missing(&mut self, other: &FieldSpec) {
        fn fill(slot: &mut Option<String>, from: &Option<String>) {
            if slot.is_none() {
                slot.clone_from(from);
            }
        }
        fill(&mut self.collection_frequency, &other.collection_frequency);
        fill(&mut self.conversion_type, &other.conversion_type);
        fill(&mut self.data_type, &other.data_type);
        fill(&mut self.final_units, &other.final_units);
        fill(&mut self.measure_type, &other.measure_type);
        fill(&mut self.qualifier, &other.qualifier);
        fill(&mut self.sensor, &other.sensor);
        fill(&mut self.source_field, &other.source_field);
        fill(&mut self.source_units, &other.source_units);
        fill(&mut self.units_abbrev, &other.units_abbrev);
        fill(&mut self.use_for, &other.use_for);
    }
}
