//! Regression coverage for glucose payload validation and filters.

use super::*;
use chrono::TimeZone;
use rstest::{fixture, rstest};
use serde_json::json;

fn input(date_time: Option<&str>, value: Option<f64>, unit: Option<&str>) -> GlucoseTestInput {
    GlucoseTestInput {
        date_time: date_time.map(str::to_owned),
        glucos_value: value,
        unit: unit.map(str::to_owned),
        ..GlucoseTestInput::default()
    }
}

#[fixture]
fn stored() -> GlucoseTest {
    let stamp = Utc
        .with_ymd_and_hms(2026, 3, 2, 9, 0, 0)
        .single()
        .expect("valid timestamp");
    GlucoseTest {
        id: GlucoseTestId::new(12),
        date_time: parse_measured_at("2026-03-02 08:15:00").expect("valid date"),
        value: GlucoseValue::new(5.5).expect("positive"),
        unit: GlucoseUnit::MmolPerL,
        patient_id: Some(PatientId::new(3)),
        device_name: Some("GlucoSure".into()),
        method: DEFAULT_METHOD.into(),
        validation: ValidationState::Unvalidated,
        reported: false,
        validated_by: None,
        note: None,
        created_at: stamp,
        updated_at: stamp,
    }
}

#[rstest]
#[case(None, Some(110.0), Some("mg/dL"), GlucoseInputError::MissingRequired)]
#[case(Some("2026-01-01 08:00:00"), None, Some("mg/dL"), GlucoseInputError::MissingRequired)]
#[case(Some("2026-01-01 08:00:00"), Some(110.0), None, GlucoseInputError::MissingRequired)]
#[case(Some("  "), Some(110.0), Some("mg/dL"), GlucoseInputError::MissingRequired)]
#[case(Some("2026-01-01 08:00:00"), Some(0.0), Some("mg/dL"), GlucoseInputError::MissingRequired)]
#[case(Some("2026-01-01 08:00:00"), Some(-4.0), Some("mg/dL"), GlucoseInputError::InvalidValue)]
#[case(Some("2026-01-01 08:00:00"), Some(110.0), Some("mg/dl"), GlucoseInputError::InvalidUnit)]
#[case(Some("yesterday"), Some(110.0), Some("mg/dL"), GlucoseInputError::InvalidDateTime)]
fn create_validation_failures(
    #[case] date_time: Option<&str>,
    #[case] value: Option<f64>,
    #[case] unit: Option<&str>,
    #[case] expected: GlucoseInputError,
) {
    let err = input(date_time, value, unit)
        .into_new()
        .expect_err("invalid payload");
    assert_eq!(err, expected);
}

#[rstest]
fn update_uses_its_own_missing_message() {
    let err = input(None, Some(1.0), Some("mg/dL"))
        .into_update()
        .expect_err("missing date");
    assert_eq!(err.to_string(), "All fields are required");
}

#[rstest]
#[case(None)]
#[case(Some(0))]
#[case(Some(-9))]
fn non_positive_patient_ids_are_unlinked(#[case] patient_id: Option<i64>) {
    let mut payload = input(Some("2026-01-01T08:00:00"), Some(98.0), Some("mg/dL"));
    payload.patient_id = patient_id;
    let new = payload.into_new().expect("valid payload");
    assert_eq!(new.patient_id, None);
    assert_eq!(new.method, DEFAULT_METHOD);
}

#[rstest]
fn explicit_method_is_kept() {
    let mut payload = input(Some("2026-01-01T08:00:00"), Some(98.0), Some("mg/dL"));
    payload.metode = Some("Enzimatik".into());
    payload.patient_id = Some(4);
    let new = payload.into_new().expect("valid payload");
    assert_eq!(new.method, "Enzimatik");
    assert_eq!(new.patient_id, Some(PatientId::new(4)));
}

#[rstest]
#[case("2026-02-01 07:30:00")]
#[case("2026-02-01T07:30:00")]
#[case("2026-02-01T07:30:00.000")]
#[case("2026-02-01T07:30:00Z")]
#[case("2026-02-01T14:30:00+07:00")]
fn measured_at_formats_agree(#[case] raw: &str) {
    let expected = NaiveDate::from_ymd_opt(2026, 2, 1)
        .and_then(|d| d.and_hms_opt(7, 30, 0))
        .expect("valid date");
    assert_eq!(parse_measured_at(raw), Ok(expected));
}

#[rstest]
fn five_point_five_mmol_round_trips(stored: GlucoseTest) {
    let value = serde_json::to_value(&stored).expect("serialise");
    assert_eq!(value["glucos_value"], json!(5.5));
    assert_eq!(value["unit"], "mmol/L");
    assert_eq!(value["is_validation"], 0);
    assert_eq!(value["is_status"], 0);
    assert_eq!(value["patient_id"], 3);

    let back: GlucoseTest = serde_json::from_value(value).expect("deserialise");
    assert_eq!(back, stored);
}

#[rstest]
fn bridging_snapshot_has_no_patient(stored: GlucoseTest) {
    let snapshot = stored.to_bridging();
    let value = serde_json::to_value(&snapshot).expect("serialise");
    assert!(value.get("patient_id").is_none());
    assert_eq!(snapshot.id, stored.id);
    assert_eq!(snapshot.value, stored.value);
}

#[rstest]
fn unlinked_patient_serialises_as_zero(mut stored: GlucoseTest) {
    stored.patient_id = None;
    let value = serde_json::to_value(&stored).expect("serialise");
    assert_eq!(value["patient_id"], 0);
}

fn detail(test: GlucoseTest, name: Option<&str>, code: Option<&str>) -> GlucoseTestDetail {
    GlucoseTestDetail {
        test,
        patient_name: name.map(str::to_owned),
        patient_code: code.map(str::to_owned),
    }
}

#[rstest]
#[case(GlucoseTestFilter::default(), true)]
#[case(GlucoseTestFilter { date: NaiveDate::from_ymd_opt(2026, 3, 2), ..Default::default() }, true)]
#[case(GlucoseTestFilter { date: NaiveDate::from_ymd_opt(2026, 3, 3), ..Default::default() }, false)]
#[case(GlucoseTestFilter { validation: Some(ValidationState::Validated), ..Default::default() }, false)]
#[case(GlucoseTestFilter { search: Some("BUDI".into()), ..Default::default() }, true)]
#[case(GlucoseTestFilter { search: Some("p-00".into()), ..Default::default() }, true)]
#[case(GlucoseTestFilter { search: Some("sari".into()), ..Default::default() }, false)]
fn filter_predicate(stored: GlucoseTest, #[case] filter: GlucoseTestFilter, #[case] hit: bool) {
    let row = detail(stored, Some("Budi Santoso"), Some("P-0042"));
    assert_eq!(filter.matches(&row), hit);
}

#[rstest]
fn range_is_inclusive(stored: GlucoseTest) {
    let row = detail(stored, None, None);
    let day = NaiveDate::from_ymd_opt(2026, 3, 2).expect("date");
    let filter = GlucoseTestFilter {
        range: Some((day, day)),
        ..Default::default()
    };
    assert!(filter.matches(&row));
}

#[rstest]
fn half_open_range_is_ignored() {
    let filter = GlucoseTestFilter::from_query(None, Some("2026-01-01"), None, Some(""), Some(" "))
        .expect("valid query");
    assert_eq!(filter, GlucoseTestFilter::default());
}

#[rstest]
fn query_filter_parses_all_keys() {
    let filter = GlucoseTestFilter::from_query(
        Some("2026-03-02"),
        Some("2026-03-01"),
        Some("2026-03-31T23:59:59"),
        Some("1"),
        Some("budi"),
    )
    .expect("valid query");
    assert_eq!(filter.date, NaiveDate::from_ymd_opt(2026, 3, 2));
    assert_eq!(
        filter.range,
        NaiveDate::from_ymd_opt(2026, 3, 1).zip(NaiveDate::from_ymd_opt(2026, 3, 31))
    );
    assert_eq!(filter.validation, Some(ValidationState::Validated));
    assert_eq!(filter.search.as_deref(), Some("budi"));
}

#[rstest]
#[case("2")]
#[case("yes")]
fn bad_validation_flag_is_rejected(#[case] raw: &str) {
    let err = GlucoseTestFilter::from_query(None, None, None, Some(raw), None)
        .expect_err("invalid flag");
    assert_eq!(err, GlucoseInputError::InvalidValidationFlag);
}
