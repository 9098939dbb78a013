//! Controlled vocabularies for field metadata: collection frequency,
//! measurement type and units.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Frequency at which a field is collected or aggregated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CollectionFrequency {
    #[serde(rename = "5min")]
    Min5,
    #[serde(rename = "60min")]
    Min60,
    #[serde(rename = "daily")]
    Daily,
}

impl CollectionFrequency {
    pub const ALL: [CollectionFrequency; 3] = [Self::Min5, Self::Min60, Self::Daily];

    pub fn as_str(&self) -> &'static str {
        match self {
            CollectionFrequency::Min5 => "5min",
            CollectionFrequency::Min60 => "60min",
            CollectionFrequency::Daily => "daily",
        }
    }

    /// Infers the frequency from a standard name prefix such as
    /// `60min_air_temp_f_avg`.
    pub fn from_standard_name(standard_name: &str) -> Option<Self> {
        let prefix = standard_name.split('_').next()?;
        prefix.parse().ok()
    }
}

/// General kind of environmental measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MeasureType {
    #[serde(rename = "Air Temp")]
    AirTemp,
    #[serde(rename = "Battery")]
    Battery,
    #[serde(rename = "Dew Point")]
    DewPoint,
    #[serde(rename = "Leaf Wetness")]
    LeafWetness,
    #[serde(rename = "Rain")]
    Rain,
    #[serde(rename = "Relative Humidity")]
    RelativeHumidity,
    #[serde(rename = "Soil Moisture")]
    SoilMoisture,
    #[serde(rename = "Soil Temp")]
    SoilTemp,
    #[serde(rename = "Wind Speed")]
    WindSpeed,
    #[serde(rename = "Canopy Wetness")]
    CanopyWetness,
    #[serde(rename = "Pressure")]
    Pressure,
    #[serde(rename = "Wind Dir")]
    WindDir,
    #[serde(rename = "Solar Radiation")]
    SolarRadiation,
    #[serde(rename = "Other Calculated")]
    OtherCalculated,
}

impl MeasureType {
    pub const ALL: [MeasureType; 14] = [
        Self::AirTemp,
        Self::Battery,
        Self::DewPoint,
        Self::LeafWetness,
        Self::Rain,
        Self::RelativeHumidity,
        Self::SoilMoisture,
        Self::SoilTemp,
        Self::WindSpeed,
        Self::CanopyWetness,
        Self::Pressure,
        Self::WindDir,
        Self::SolarRadiation,
        Self::OtherCalculated,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MeasureType::AirTemp => "Air Temp",
            MeasureType::Battery => "Battery",
            MeasureType::DewPoint => "Dew Point",
            MeasureType::LeafWetness => "Leaf Wetness",
            MeasureType::Rain => "Rain",
            MeasureType::RelativeHumidity => "Relative Humidity",
            MeasureType::SoilMoisture => "Soil Moisture",
            MeasureType::SoilTemp => "Soil Temp",
            MeasureType::WindSpeed => "Wind Speed",
            MeasureType::CanopyWetness => "Canopy Wetness",
            MeasureType::Pressure => "Pressure",
            MeasureType::WindDir => "Wind Dir",
            MeasureType::SolarRadiation => "Solar Radiation",
            MeasureType::OtherCalculated => "Other Calculated",
        }
    }
}

/// Units a field can be reported in.
///
/// `Mb` and `Millibars` both occur in the API's metadata; the default
/// [`crate::FieldRegistry`] folds the former into the latter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Units {
    #[serde(rename = "celsius")]
    Celsius,
    #[serde(rename = "volts")]
    Volts,
    #[serde(rename = "mv")]
    Mv,
    #[serde(rename = "hst")]
    Hst,
    #[serde(rename = "millimeters")]
    Millimeters,
    #[serde(rename = "pct")]
    Pct,
    #[serde(rename = "meters/sec")]
    MetersPerSecond,
    #[serde(rename = "millibars")]
    Millibars,
    #[serde(rename = "hours")]
    Hours,
    #[serde(rename = "degrees")]
    Degrees,
    #[serde(rename = "seconds")]
    Seconds,
    #[serde(rename = "kilojoules")]
    Kilojoules,
    #[serde(rename = "fahrenheit")]
    Fahrenheit,
    #[serde(rename = "inches")]
    Inches,
    #[serde(rename = "mph")]
    Mph,
    #[serde(rename = "Dir")]
    Dir,
    #[serde(rename = "W/m\u{00B2}")]
    WattsPerSquareMeter,
    #[serde(rename = "mb")]
    Mb,
    #[serde(rename = "kWh/m\u{00B2}")]
    KilowattHoursPerSquareMeter,
}

impl Units {
    pub const ALL: [Units; 19] = [
        Self::Celsius,
        Self::Volts,
        Self::Mv,
        Self::Hst,
        Self::Millimeters,
        Self::Pct,
        Self::MetersPerSecond,
        Self::Millibars,
        Self::Hours,
        Self::Degrees,
        Self::Seconds,
        Self::Kilojoules,
        Self::Fahrenheit,
        Self::Inches,
        Self::Mph,
        Self::Dir,
        Self::WattsPerSquareMeter,
        Self::Mb,
        Self::KilowattHoursPerSquareMeter,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Units::Celsius => "celsius",
            Units::Volts => "volts",
            Units::Mv => "mv",
            Units::Hst => "hst",
            Units::Millimeters => "millimeters",
            Units::Pct => "pct",
            Units::MetersPerSecond => "meters/sec",
            Units::Millibars => "millibars",
            Units::Hours => "hours",
            Units::Degrees => "degrees",
            Units::Seconds => "seconds",
            Units::Kilojoules => "kilojoules",
            Units::Fahrenheit => "fahrenheit",
            Units::Inches => "inches",
            Units::Mph => "mph",
            Units::Dir => "Dir",
            Units::WattsPerSquareMeter => "W/m\u{00B2}",
            Units::Mb => "mb",
            Units::KilowattHoursPerSquareMeter => "kWh/m\u{00B2}",
        }
    }
}

/// Returned when a string is not part of a vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("'{value}' is not a known {vocabulary}")]
pub struct UnknownVariant {
    pub vocabulary: &'static str,
    pub value: String,
}

macro_rules! vocabulary {
    ($ty:ident, $name:literal) => {
        impl FromStr for $ty {
            type Err = UnknownVariant;

            // Case-insensitive; the API is not consistent about casing.
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let needle = s.trim();
                $ty::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str().eq_ignore_ascii_case(needle))
                    .ok_or_else(|| UnknownVariant {
                        vocabulary: $name,
                        value: s.to_string(),
                    })
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

vocabulary!(CollectionFrequency, "collection frequency");
vocabulary!(MeasureType, "measure type");
vocabulary!(Units, "unit");
