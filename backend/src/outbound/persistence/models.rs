//! Internal Diesel row structs.
//!
//! These types never leave the persistence layer. Conversions into domain
//! types live next to the rows so every adapter decodes columns the same way.

use chrono::{DateTime, NaiveDateTime, Utc};
use diesel::prelude::*;
use diesel::sql_types::{BigInt, Integer};

use crate::domain::{
    BridgingSnapshot, GlucoseInputError, GlucoseTest, GlucoseTestId, GlucoseUnit, GlucoseValue,
    NewGlucoseTest, Patient, PatientId, Permission, PermissionId, Role, RoleId, UserAccount,
    UserId, UserProfile, ValidationState,
};

use super::bridging_schema::glucosa_test;
use super::schema::{activity_logs, glucosa_tests, patients, permissions, roles, users};

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UserRow {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub password_hash: String,
}

impl From<UserRow> for UserAccount {
    fn from(row: UserRow) -> Self {
        Self {
            id: UserId::new(row.id),
            name: row.name,
            email: row.email,
            password_hash: row.password_hash,
        }
    }
}

impl From<UserRow> for UserProfile {
    fn from(row: UserRow) -> Self {
        Self {
            id: UserId::new(row.id),
            name: row.name,
            email: row.email,
        }
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = users)]
pub(crate) struct NewUserRow<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = roles)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct RoleRow {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
}

impl From<RoleRow> for Role {
    fn from(row: RoleRow) -> Self {
        Self {
            id: RoleId::new(row.id),
            name: row.name,
            description: row.description,
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = permissions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct PermissionRow {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
}

impl From<PermissionRow> for Permission {
    fn from(row: PermissionRow) -> Self {
        Self {
            id: PermissionId::new(row.id),
            name: row.name,
            description: row.description,
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = patients)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct PatientRow {
    pub id: i64,
    pub name: String,
    pub patient_code: Option<String>,
}

impl From<PatientRow> for Patient {
    fn from(row: PatientRow) -> Self {
        Self {
            id: PatientId::new(row.id),
            name: row.name,
            patient_code: row.patient_code,
        }
    }
}

// ---------------------------------------------------------------------------
// Glucose tests
// ---------------------------------------------------------------------------

/// Stored `patient_id` for an unlinked row.
pub(crate) const UNLINKED_PATIENT: i64 = 0;

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = glucosa_tests)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct GlucoseTestRow {
    pub id: i64,
    pub date_time: NaiveDateTime,
    pub glucos_value: f64,
    pub unit: String,
    pub patient_id: i64,
    pub device_name: Option<String>,
    pub metode: String,
    pub is_validation: i16,
    pub is_status: i16,
    pub user_validation: Option<String>,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<GlucoseTestRow> for GlucoseTest {
    type Error = GlucoseInputError;

    fn try_from(row: GlucoseTestRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: GlucoseTestId::new(row.id),
            date_time: row.date_time,
            value: GlucoseValue::new(row.glucos_value)?,
            unit: row.unit.parse()?,
            patient_id: (row.patient_id > UNLINKED_PATIENT).then(|| PatientId::new(row.patient_id)),
            device_name: row.device_name,
            method: row.metode,
            validation: ValidationState::try_from(row.is_validation)?,
            reported: row.is_status != 0,
            validated_by: row.user_validation,
            note: row.note,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = glucosa_tests)]
pub(crate) struct NewGlucoseTestRow<'a> {
    pub date_time: NaiveDateTime,
    pub glucos_value: f64,
    pub unit: &'static str,
    pub patient_id: i64,
    pub device_name: Option<&'a str>,
    pub metode: &'a str,
    pub note: Option<&'a str>,
}

impl<'a> From<&'a NewGlucoseTest> for NewGlucoseTestRow<'a> {
    fn from(test: &'a NewGlucoseTest) -> Self {
        Self {
            date_time: test.date_time,
            glucos_value: test.value.get(),
            unit: test.unit.as_str(),
            patient_id: test.patient_id.map_or(UNLINKED_PATIENT, PatientId::get),
            device_name: test.device_name.as_deref(),
            metode: &test.method,
            note: test.note.as_deref(),
        }
    }
}

#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = glucosa_tests)]
pub(crate) struct GlucoseMeasurementChangeset {
    pub date_time: NaiveDateTime,
    pub glucos_value: f64,
    pub unit: &'static str,
    pub updated_at: DateTime<Utc>,
}

/// `(month, total)` row produced by the monthly dashboard query.
#[derive(Debug, Clone, QueryableByName)]
pub(crate) struct MonthlyCountRow {
    #[diesel(sql_type = Integer)]
    pub month: i32,
    #[diesel(sql_type = BigInt)]
    pub total: i64,
}

// ---------------------------------------------------------------------------
// Bridging store
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = glucosa_test)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct BridgingRow {
    pub id: i64,
    pub date_time: NaiveDateTime,
    pub glucos_value: f64,
    pub unit: String,
    pub device_name: Option<String>,
    pub metode: String,
    pub is_validation: i16,
    pub is_status: i16,
    pub user_validation: Option<String>,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&BridgingSnapshot> for BridgingRow {
    fn from(snapshot: &BridgingSnapshot) -> Self {
        Self {
            id: snapshot.id.get(),
            date_time: snapshot.date_time,
            glucos_value: snapshot.value.get(),
            unit: snapshot.unit.as_str().to_owned(),
            device_name: snapshot.device_name.clone(),
            metode: snapshot.method.clone(),
            is_validation: snapshot.validation.as_flag(),
            is_status: i16::from(snapshot.reported),
            user_validation: snapshot.validated_by.clone(),
            note: snapshot.note.clone(),
            created_at: snapshot.created_at,
            updated_at: snapshot.updated_at,
        }
    }
}

impl TryFrom<BridgingRow> for BridgingSnapshot {
    type Error = GlucoseInputError;

    fn try_from(row: BridgingRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: GlucoseTestId::new(row.id),
            date_time: row.date_time,
            value: GlucoseValue::new(row.glucos_value)?,
            unit: row.unit.parse::<GlucoseUnit>()?,
            device_name: row.device_name,
            method: row.metode,
            validation: ValidationState::try_from(row.is_validation)?,
            reported: row.is_status != 0,
            validated_by: row.user_validation,
            note: row.note,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

// ---------------------------------------------------------------------------
// Activity log
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = activity_logs)]
pub(crate) struct NewActivityLogRow<'a> {
    pub user_id: Option<i64>,
    pub name: Option<&'a str>,
    pub method: &'a str,
    pub endpoint: &'a str,
    pub request_body: Option<&'a serde_json::Value>,
    pub ip_address: Option<&'a str>,
    pub status_code: i32,
    pub user_agent: Option<&'a str>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    //! Regression coverage for row decoding.
    use super::*;
    use chrono::NaiveDate;
    use rstest::{fixture, rstest};

    #[fixture]
    fn row() -> GlucoseTestRow {
        let date_time = NaiveDate::from_ymd_opt(2026, 4, 1)
            .and_then(|d| d.and_hms_opt(7, 45, 0))
            .expect("valid date");
        GlucoseTestRow {
            id: 31,
            date_time,
            glucos_value: 112.0,
            unit: "mg/dL".into(),
            patient_id: 0,
            device_name: None,
            metode: "Elektrokimia".into(),
            is_validation: 1,
            is_status: 0,
            user_validation: Some("Dewi".into()),
            note: None,
            created_at: DateTime::<Utc>::UNIX_EPOCH,
            updated_at: DateTime::<Utc>::UNIX_EPOCH,
        }
    }

    #[rstest]
    fn zero_patient_id_decodes_as_unlinked(row: GlucoseTestRow) {
        let test = GlucoseTest::try_from(row).expect("valid row");
        assert_eq!(test.patient_id, None);
        assert_eq!(test.validation, ValidationState::Validated);
    }

    #[rstest]
    #[case::unit(|r: &mut GlucoseTestRow| r.unit = "mg".into(), GlucoseInputError::InvalidUnit)]
    #[case::flag(|r: &mut GlucoseTestRow| r.is_validation = 7, GlucoseInputError::InvalidValidationFlag)]
    #[case::value(|r: &mut GlucoseTestRow| r.glucos_value = 0.0, GlucoseInputError::InvalidValue)]
    fn corrupt_rows_are_rejected(
        mut row: GlucoseTestRow,
        #[case] corrupt: fn(&mut GlucoseTestRow),
        #[case] expected: GlucoseInputError,
    ) {
        corrupt(&mut row);
        assert_eq!(GlucoseTest::try_from(row).expect_err("corrupt row"), expected);
    }

    #[rstest]
    fn bridging_row_mirrors_snapshot(row: GlucoseTestRow) {
        let snapshot = GlucoseTest::try_from(row).expect("valid row").to_bridging();
        let mirrored = BridgingRow::from(&snapshot);
        assert_eq!(mirrored.id, 31);
        assert_eq!(mirrored.is_validation, 1);
        assert_eq!(
            BridgingSnapshot::try_from(mirrored).expect("valid mirror"),
            snapshot
        );
    }
}
