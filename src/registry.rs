//! Field metadata and unit conversions consulted while reshaping.

use crate::types::field::FieldSpec;
use crate::types::schema::ObservationValue;
use crate::types::variables::Units;
use std::collections::HashMap;

/// A linear conversion `value * scale + offset` from one unit label to another.
#[derive(Debug, Clone, PartialEq)]
pub struct UnitConversion {
    pub from: String,
    pub to: String,
    pub scale: f64,
    pub offset: f64,
}

impl UnitConversion {
    pub fn new(from: impl Into<String>, to: impl Into<String>, scale: f64, offset: f64) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            scale,
            offset,
        }
    }

    /// Renames a unit without touching values.
    pub fn alias(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self::new(from, to, 1.0, 0.0)
    }

    pub fn fahrenheit_to_celsius() -> Self {
        Self::new(
            Units::Fahrenheit.as_str(),
            Units::Celsius.as_str(),
            5.0 / 9.0,
            -32.0 * 5.0 / 9.0,
        )
    }

    pub fn inches_to_millimeters() -> Self {
        Self::new(Units::Inches.as_str(), Units::Millimeters.as_str(), 25.4, 0.0)
    }

    fn apply(&self, value: &ObservationValue) -> ObservationValue {
        match value {
            ObservationValue::Number(n) => ObservationValue::Number(n * self.scale + self.offset),
            other => other.clone(),
        }
    }
}

/// Field specs by standard name, plus unit conversions by source unit.
///
/// The default registry only carries the `mb` to `millibars` alias, so values
/// pass through unchanged. Any unit without a registered conversion keeps its
/// label as `final_units`.
#[derive(Debug, Clone)]
pub struct FieldRegistry {
    fields: HashMap<String, FieldSpec>,
    conversions: HashMap<String, UnitConversion>,
}

impl Default for FieldRegistry {
    fn default() -> Self {
        Self::empty().with_conversion(UnitConversion::alias(
            Units::Mb.as_str(),
            Units::Millibars.as_str(),
        ))
    }
}

impl FieldRegistry {
    /// A registry with no aliases or conversions at all.
    pub fn empty() -> Self {
        Self {
            fields: HashMap::new(),
            conversions: HashMap::new(),
        }
    }

    /// Registers a conversion, replacing any earlier one for the same source unit.
    pub fn with_conversion(mut self, conversion: UnitConversion) -> Self {
        self.add_conversion(conversion);
        self
    }

    pub fn add_conversion(&mut self, conversion: UnitConversion) {
        self.conversions
            .insert(conversion.from.trim().to_lowercase(), conversion);
    }

    /// Merges field specs into the registry. Incoming metadata wins; gaps are
    /// filled from what was already known.
    pub fn register_fields<I>(&mut self, specs: I)
    where
        I: IntoIterator<Item = FieldSpec>,
    {
        for mut spec in specs {
            if let Some(known) = self.fields.get(&spec.standard_name) {
                spec.merge_missing(known);
            }
            self.fields.insert(spec.standard_name.clone(), spec);
        }
    }

    pub fn field(&self, standard_name: &str) -> Option<&FieldSpec> {
        self.fields.get(standard_name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Unit label for a field when the response didn't carry one.
    pub fn known_units(&self, standard_name: &str) -> Option<&str> {
        self.field(standard_name).and_then(FieldSpec::reported_units)
    }

    /// Applies the canonical conversion for `units` and returns the converted
    /// value with its final unit label. A missing unit stays missing.
    pub fn convert(
        &self,
        units: Option<&str>,
        value: &ObservationValue,
    ) -> (ObservationValue, Option<String>) {
        let Some(units) = units else {
            return (value.clone(), None);
        };
        match self.conversions.get(&units.trim().to_lowercase()) {
            Some(conversion) => (conversion.apply(value), Some(conversion.to.clone())),
            None => (value.clone(), Some(units.to_string())),
        }
    }
}
