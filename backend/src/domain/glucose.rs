//! Glucose test records, their validation state and list filters.
//!
//! Serialised field names follow the storage columns (`glucos_value`,
//! `is_validation`, ...) because partner systems read the same names from the
//! bridging store.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{GlucoseTestId, PatientId};

/// Measurement method recorded when the caller omits one.
pub const DEFAULT_METHOD: &str = "Elektrokimia";

/// Accepted measurement units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum GlucoseUnit {
    #[serde(rename = "mg/dL")]
    MgPerDl,
    #[serde(rename = "mmol/L")]
    MmolPerL,
}

impl GlucoseUnit {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MgPerDl => "mg/dL",
            Self::MmolPerL => "mmol/L",
        }
    }
}

impl fmt::Display for GlucoseUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GlucoseUnit {
    type Err = GlucoseInputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mg/dL" => Ok(Self::MgPerDl),
            "mmol/L" => Ok(Self::MmolPerL),
            _ => Err(GlucoseInputError::InvalidUnit),
        }
    }
}

/// Strictly positive, finite glucose reading.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize, ToSchema)]
#[serde(try_from = "f64", into = "f64")]
pub struct GlucoseValue(f64);

impl GlucoseValue {
    pub fn new(value: f64) -> Result<Self, GlucoseInputError> {
        if value.is_finite() && value > 0.0 {
            Ok(Self(value))
        } else {
            Err(GlucoseInputError::InvalidValue)
        }
    }

    pub fn get(self) -> f64 {
        self.0
    }
}

impl TryFrom<f64> for GlucoseValue {
    type Error = GlucoseInputError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<GlucoseValue> for f64 {
    fn from(value: GlucoseValue) -> Self {
        value.0
    }
}

/// `is_validation` column: `0` until a validator signs the result off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(try_from = "i16", into = "i16")]
pub enum ValidationState {
    Unvalidated,
    Validated,
}

impl ValidationState {
    pub fn as_flag(self) -> i16 {
        match self {
            Self::Unvalidated => 0,
            Self::Validated => 1,
        }
    }

    pub fn is_validated(self) -> bool {
        matches!(self, Self::Validated)
    }
}

impl TryFrom<i16> for ValidationState {
    type Error = GlucoseInputError;

    fn try_from(flag: i16) -> Result<Self, Self::Error> {
        match flag {
            0 => Ok(Self::Unvalidated),
            1 => Ok(Self::Validated),
            _ => Err(GlucoseInputError::InvalidValidationFlag),
        }
    }
}

impl From<ValidationState> for i16 {
    fn from(state: ValidationState) -> Self {
        state.as_flag()
    }
}

/// Validation failures for glucose test payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum GlucoseInputError {
    #[error("Date, glucose value, and unit are required")]
    MissingRequired,
    #[error("All fields are required")]
    MissingUpdateFields,
    #[error("Invalid glucose value")]
    InvalidValue,
    #[error("Invalid unit. Must be mg/dL or mmol/L")]
    InvalidUnit,
    #[error("Invalid date_time. Use YYYY-MM-DD HH:MM:SS or RFC 3339")]
    InvalidDateTime,
    #[error("is_validation must be 0 or 1")]
    InvalidValidationFlag,
}

/// Parse a measurement timestamp.
///
/// Accepts RFC 3339 (converted to UTC wall time), `YYYY-MM-DDTHH:MM:SS` and
/// `YYYY-MM-DD HH:MM:SS`; fractional seconds are allowed on the naive forms.
///
/// # Examples
/// ```
/// use glucose_backend::domain::parse_measured_at;
///
/// let a = parse_measured_at("2026-02-01 07:30:00").unwrap();
/// let b = parse_measured_at("2026-02-01T07:30:00Z").unwrap();
/// assert_eq!(a, b);
/// ```
pub fn parse_measured_at(raw: &str) -> Result<NaiveDateTime, GlucoseInputError> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Ok(parsed.naive_utc());
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .ok_or(GlucoseInputError::InvalidDateTime)
}

/// A stored glucose test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct GlucoseTest {
    #[schema(value_type = i64)]
    pub id: GlucoseTestId,
    #[schema(value_type = String, example = "2026-02-01T07:30:00")]
    pub date_time: NaiveDateTime,
    #[serde(rename = "glucos_value")]
    #[schema(value_type = f64, example = 5.5)]
    pub value: GlucoseValue,
    pub unit: GlucoseUnit,
    /// `None` when the sample is not linked to a patient (stored as `0`).
    #[serde(with = "patient_link")]
    #[schema(value_type = i64, example = 0)]
    pub patient_id: Option<PatientId>,
    pub device_name: Option<String>,
    #[serde(rename = "metode")]
    pub method: String,
    #[serde(rename = "is_validation")]
    #[schema(value_type = i16)]
    pub validation: ValidationState,
    #[serde(rename = "is_status", with = "flag")]
    #[schema(value_type = i16)]
    pub reported: bool,
    #[serde(rename = "user_validation")]
    pub validated_by: Option<String>,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl GlucoseTest {
    /// Projection written to the bridging store.
    pub fn to_bridging(&self) -> BridgingSnapshot {
        BridgingSnapshot {
            id: self.id,
            date_time: self.date_time,
            value: self.value,
            unit: self.unit,
            device_name: self.device_name.clone(),
            method: self.method.clone(),
            validation: self.validation,
            reported: self.reported,
            validated_by: self.validated_by.clone(),
            note: self.note.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// A glucose test joined with its patient's display fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct GlucoseTestDetail {
    #[serde(flatten)]
    pub test: GlucoseTest,
    pub patient_name: Option<String>,
    pub patient_code: Option<String>,
}

/// Row mirrored into the bridging store: a [`GlucoseTest`] without
/// `patient_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct BridgingSnapshot {
    #[schema(value_type = i64)]
    pub id: GlucoseTestId,
    #[schema(value_type = String)]
    pub date_time: NaiveDateTime,
    #[serde(rename = "glucos_value")]
    #[schema(value_type = f64)]
    pub value: GlucoseValue,
    pub unit: GlucoseUnit,
    pub device_name: Option<String>,
    #[serde(rename = "metode")]
    pub method: String,
    #[serde(rename = "is_validation")]
    #[schema(value_type = i16)]
    pub validation: ValidationState,
    #[serde(rename = "is_status", with = "flag")]
    #[schema(value_type = i16)]
    pub reported: bool,
    #[serde(rename = "user_validation")]
    pub validated_by: Option<String>,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Raw create/update payload before validation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct GlucoseTestInput {
    pub date_time: Option<String>,
    pub glucos_value: Option<f64>,
    pub unit: Option<String>,
    pub patient_id: Option<i64>,
    pub device_name: Option<String>,
    pub metode: Option<String>,
    pub note: Option<String>,
}

/// Validated insert payload.
#[derive(Debug, Clone, PartialEq)]
pub struct NewGlucoseTest {
    pub date_time: NaiveDateTime,
    pub value: GlucoseValue,
    pub unit: GlucoseUnit,
    pub patient_id: Option<PatientId>,
    pub device_name: Option<String>,
    pub method: String,
    pub note: Option<String>,
}

/// Validated update payload; only the measurement itself may change.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlucoseTestUpdate {
    pub date_time: NaiveDateTime,
    pub value: GlucoseValue,
    pub unit: GlucoseUnit,
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn measurement(
    input: &GlucoseTestInput,
    missing: GlucoseInputError,
) -> Result<GlucoseTestUpdate, GlucoseInputError> {
    let (Some(date_time), Some(value), Some(unit)) = (
        non_blank(input.date_time.as_deref()),
        input.glucos_value,
        non_blank(input.unit.as_deref()),
    ) else {
        return Err(missing);
    };
    // A zero reading counts as missing, matching the falsy check clients expect.
    if value == 0.0 {
        return Err(missing);
    }
    let value = GlucoseValue::new(value)?;
    let unit = unit.parse()?;
    let date_time = parse_measured_at(date_time)?;
    Ok(GlucoseTestUpdate {
        date_time,
        value,
        unit,
    })
}

impl GlucoseTestInput {
    /// Validate for insertion; `patient_id` of `0` or absent means unlinked.
    ///
    /// Whether a non-zero patient exists is checked by the service.
    pub fn into_new(self) -> Result<NewGlucoseTest, GlucoseInputError> {
        let GlucoseTestUpdate {
            date_time,
            value,
            unit,
        } = measurement(&self, GlucoseInputError::MissingRequired)?;
        Ok(NewGlucoseTest {
            date_time,
            value,
            unit,
            patient_id: self.patient_id.filter(|id| *id > 0).map(PatientId::new),
            device_name: self.device_name,
            method: non_blank(self.metode.as_deref())
                .unwrap_or(DEFAULT_METHOD)
                .to_owned(),
            note: self.note,
        })
    }

    /// Validate for update.
    pub fn into_update(self) -> Result<GlucoseTestUpdate, GlucoseInputError> {
        measurement(&self, GlucoseInputError::MissingUpdateFields)
    }
}

/// Optional constraints for the glucose test listing, combined with AND.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GlucoseTestFilter {
    /// Exact calendar date of `date_time`.
    pub date: Option<NaiveDate>,
    /// Inclusive `date_time` date range; both ends are required.
    pub range: Option<(NaiveDate, NaiveDate)>,
    pub validation: Option<ValidationState>,
    /// Case-insensitive substring of patient name or patient code.
    pub search: Option<String>,
}

impl GlucoseTestFilter {
    /// Build a filter from raw query values; blank values impose no
    /// constraint, and a half-open range is ignored.
    pub fn from_query(
        date_time: Option<&str>,
        start_date: Option<&str>,
        end_date: Option<&str>,
        is_validation: Option<&str>,
        search: Option<&str>,
    ) -> Result<Self, GlucoseInputError> {
        let date = non_blank(date_time).map(parse_date).transpose()?;
        let range = match (non_blank(start_date), non_blank(end_date)) {
            (Some(start), Some(end)) => Some((parse_date(start)?, parse_date(end)?)),
            _ => None,
        };
        let validation = non_blank(is_validation)
            .map(|raw| {
                raw.parse::<i16>()
                    .map_err(|_| GlucoseInputError::InvalidValidationFlag)
                    .and_then(ValidationState::try_from)
            })
            .transpose()?;
        Ok(Self {
            date,
            range,
            validation,
            search: non_blank(search).map(str::to_owned),
        })
    }

    /// In-memory evaluation of the same predicate the SQL builder emits.
    pub fn matches(&self, detail: &GlucoseTestDetail) -> bool {
        let day = detail.test.date_time.date();
        if self.date.is_some_and(|date| date != day) {
            return false;
        }
        if self
            .range
            .is_some_and(|(start, end)| day < start || day > end)
        {
            return false;
        }
        if self
            .validation
            .is_some_and(|state| state != detail.test.validation)
        {
            return false;
        }
        if let Some(needle) = &self.search {
            let needle = needle.to_lowercase();
            let hit = |field: &Option<String>| {
                field
                    .as_deref()
                    .is_some_and(|value| value.to_lowercase().contains(&needle))
            };
            if !hit(&detail.patient_name) && !hit(&detail.patient_code) {
                return false;
            }
        }
        true
    }
}

fn parse_date(raw: &str) -> Result<NaiveDate, GlucoseInputError> {
    let date_part = raw.get(..10).unwrap_or(raw);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").map_err(|_| GlucoseInputError::InvalidDateTime)
}

/// Patient display fields needed by the glucose workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Patient {
    #[schema(value_type = i64)]
    pub id: PatientId,
    pub name: String,
    pub patient_code: Option<String>,
}

mod patient_link {
    //! `Option<PatientId>` stored as `0` for "unlinked".
    use serde::{Deserialize, Deserializer, Serializer};

    use crate::domain::PatientId;

    pub fn serialize<S: Serializer>(value: &Option<PatientId>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_i64(value.map_or(0, PatientId::get))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<PatientId>, D::Error> {
        let raw = Option::<i64>::deserialize(d)?.unwrap_or(0);
        Ok((raw > 0).then(|| PatientId::new(raw)))
    }
}

mod flag {
    //! `bool` stored as a `0`/`1` smallint.
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &bool, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_i16(i16::from(*value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
        Ok(i16::deserialize(d)? != 0)
    }
}

#[cfg(test)]
mod tests;
