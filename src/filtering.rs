use crate::types::field::FieldSpec;
use crate::types::variables::{CollectionFrequency, MeasureType, Units};

/// One condition a field must meet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldCriterion {
    Frequency(CollectionFrequency),
    Measure(MeasureType),
    /// Matched against the field's `final_units`.
    Units(Units),
}

impl From<CollectionFrequency> for FieldCriterion {
    fn from(value: CollectionFrequency) -> Self {
        FieldCriterion::Frequency(value)
    }
}

impl From<MeasureType> for FieldCriterion {
    fn from(value: MeasureType) -> Self {
        FieldCriterion::Measure(value)
    }
}

impl From<Units> for FieldCriterion {
    fn from(value: Units) -> Self {
        FieldCriterion::Units(value)
    }
}

/// Standard names of the fields matching `criteria`, in input order.
///
/// Criteria of the same kind are alternatives (`Min5` or `Min60`); criteria
/// of different kinds must all hold (`Min60` and `AirTemp`). No criteria
/// matches everything.
///
/// # Examples
///
/// ```
/// use wisconet::{filter_fields, CollectionFrequency, FieldSpec, MeasureType};
///
/// let mut temp = FieldSpec::named(1, "60min_air_temp_f_avg");
/// temp.measure_type = Some("Air Temp".into());
/// let rain = FieldSpec::named(2, "daily_rain_in_tot");
///
/// let names = filter_fields(
///     &[temp, rain],
///     &[CollectionFrequency::Min60.into(), MeasureType::AirTemp.into()],
/// );
/// assert_eq!(names, ["60min_air_temp_f_avg"]);
/// ```
pub fn filter_fields(fields: &[FieldSpec], criteria: &[FieldCriterion]) -> Vec<String> {
    let frequencies: Vec<CollectionFrequency> = criteria
        .iter()
        .filter_map(|c| match c {
            FieldCriterion::Frequency(f) => Some(*f),
            _ => None,
        })
        .collect();
    let measures: Vec<MeasureType> = criteria
        .iter()
        .filter_map(|c| match c {
            FieldCriterion::Measure(m) => Some(*m),
            _ => None,
        })
        .collect();
    let units: Vec<Units> = criteria
        .iter()
        .filter_map(|c| match c {
            FieldCriterion::Units(u) => Some(*u),
            _ => None,
        })
        .collect();

    fn admits<T: PartialEq>(wanted: &[T], actual: Option<T>) -> bool {
        wanted.is_empty() || actual.is_some_and(|a| wanted.contains(&a))
    }

    fields
        .iter()
        .filter(|f| {
            admits(&frequencies, f.frequency())
                && admits(&measures, f.measure())
                && admits(&units, f.units())
        })
        .map(|f| f.standard_name.clone())
        .collect()
}
