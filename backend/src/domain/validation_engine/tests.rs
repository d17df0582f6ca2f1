//! Regression coverage for the validation engine.

use std::sync::Mutex;

use super::*;
use crate::domain::ports::{
    GlucoseTestRepositoryError, MockBridgingRepository, MockGlucoseTestRepository,
};
use crate::domain::{
    ALREADY_BRIDGED, DEFAULT_METHOD, ErrorCode, GlucoseTest, GlucoseTestDetail, GlucoseUnit,
    GlucoseValue, MIRROR_PENDING, ValidationState, parse_measured_at,
};
use chrono::Utc;
use rstest::{fixture, rstest};

fn detail(id: i64, validated_by: Option<&str>) -> GlucoseTestDetail {
    let now = Utc::now();
    GlucoseTestDetail {
        test: GlucoseTest {
            id: GlucoseTestId::new(id),
            date_time: parse_measured_at("2026-03-02 08:15:00").expect("date"),
            value: GlucoseValue::new(110.0).expect("positive"),
            unit: GlucoseUnit::MgPerDl,
            patient_id: None,
            device_name: None,
            method: DEFAULT_METHOD.into(),
            validation: if validated_by.is_some() {
                ValidationState::Validated
            } else {
                ValidationState::Unvalidated
            },
            reported: false,
            validated_by: validated_by.map(str::to_owned),
            note: None,
            created_at: now,
            updated_at: now,
        },
        patient_name: Some("Budi".into()),
        patient_code: None,
    }
}

/// Canonical store double whose rows flip on `mark_validated`.
#[fixture]
fn canonical() -> MockGlucoseTestRepository {
    let validator: Arc<Mutex<Option<String>>> = Arc::new(Mutex::new(None));
    let mut repo = MockGlucoseTestRepository::new();
    let read = Arc::clone(&validator);
    repo.expect_find().returning(move |id| {
        let current = read.lock().expect("validator lock").clone();
        Ok(Some(detail(id.get(), current.as_deref())))
    });
    let write = Arc::clone(&validator);
    repo.expect_mark_validated().returning(move |_, name| {
        let mut slot = write.lock().expect("validator lock");
        if slot.is_some() {
            return Ok(false);
        }
        *slot = Some(name.to_owned());
        Ok(true)
    });
    repo
}

#[rstest]
#[tokio::test]
async fn validate_flips_and_mirrors_once(canonical: MockGlucoseTestRepository) {
    let mut bridging = MockBridgingRepository::new();
    bridging
        .expect_insert()
        .withf(|snapshot| snapshot.validation == ValidationState::Validated)
        .times(1)
        .return_once(|_| Ok(()));

    let engine = ValidationEngine::new(Arc::new(canonical), Arc::new(bridging));
    let outcome = engine
        .validate(GlucoseTestId::new(5), "Dewi")
        .await
        .expect("validated");
    assert!(outcome.flipped);
    assert_eq!(outcome.user_validation, "Dewi");
    assert_eq!(outcome.test.test.validated_by.as_deref(), Some("Dewi"));
}

#[rstest]
#[tokio::test]
async fn second_validate_reports_already_bridged(canonical: MockGlucoseTestRepository) {
    let inserted = Arc::new(Mutex::new(BTreeSet::new()));
    let mut bridging = MockBridgingRepository::new();
    let rows = Arc::clone(&inserted);
    bridging.expect_insert().times(2).returning(move |snapshot| {
        if rows.lock().expect("rows lock").insert(snapshot.id) {
            Ok(())
        } else {
            Err(BridgingRepositoryError::duplicate("glucosa_test_pkey"))
        }
    });

    let engine = ValidationEngine::new(Arc::new(canonical), Arc::new(bridging));
    engine
        .validate(GlucoseTestId::new(5), "Dewi")
        .await
        .expect("first validate");
    let err = engine
        .validate(GlucoseTestId::new(5), "Rina")
        .await
        .expect_err("second validate");

    assert_eq!(err.code(), ErrorCode::Conflict);
    assert_eq!(err.details().expect("details")["code"], ALREADY_BRIDGED);
    assert_eq!(inserted.lock().expect("rows lock").len(), 1);
}

#[rstest]
#[tokio::test]
async fn mirror_failure_is_pending_and_retry_repairs(canonical: MockGlucoseTestRepository) {
    let mut bridging = MockBridgingRepository::new();
    let mut attempts = 0;
    bridging.expect_insert().times(2).returning(move |_| {
        attempts += 1;
        if attempts == 1 {
            Err(BridgingRepositoryError::connection("bridging down"))
        } else {
            Ok(())
        }
    });

    let engine = ValidationEngine::new(Arc::new(canonical), Arc::new(bridging));
    let err = engine
        .validate(GlucoseTestId::new(9), "Dewi")
        .await
        .expect_err("mirror down");
    assert_eq!(err.code(), ErrorCode::ServiceUnavailable);
    assert_eq!(err.details().expect("details")["code"], MIRROR_PENDING);

    let outcome = engine
        .validate(GlucoseTestId::new(9), "Rina")
        .await
        .expect("retry mirrors");
    assert!(!outcome.flipped);
    assert_eq!(outcome.user_validation, "Dewi");
}

#[rstest]
#[tokio::test]
async fn validate_unknown_id_is_not_found() {
    let mut tests = MockGlucoseTestRepository::new();
    tests.expect_find().times(1).return_once(|_| Ok(None));
    tests.expect_mark_validated().times(0);
    let engine = ValidationEngine::new(Arc::new(tests), Arc::new(MockBridgingRepository::new()));
    let err = engine
        .validate(GlucoseTestId::new(1), "Dewi")
        .await
        .expect_err("missing");
    assert_eq!(err.message(), "Data not found");
}

#[rstest]
#[tokio::test]
async fn reconcile_inserts_only_missing_rows() {
    let mut tests = MockGlucoseTestRepository::new();
    tests.expect_validated_snapshots().times(1).return_once(|| {
        Ok((1..=4)
            .map(|id| detail(id, Some("Dewi")).test.to_bridging())
            .collect())
    });
    let mut bridging = MockBridgingRepository::new();
    bridging
        .expect_existing_ids()
        .times(1)
        .return_once(|_| Ok(vec![GlucoseTestId::new(1)]));
    bridging.expect_insert().times(3).returning(|snapshot| match snapshot.id.get() {
        2 => Ok(()),
        3 => Err(BridgingRepositoryError::duplicate("raced")),
        _ => Err(BridgingRepositoryError::query("disk full")),
    });

    let engine = ValidationEngine::new(Arc::new(tests), Arc::new(bridging));
    let report = engine.reconcile().await.expect("reconciled");
    assert_eq!(
        report,
        ReconcileReport {
            scanned: 4,
            repaired: 1,
            already_present: 2,
            failed: 1,
        }
    );
}

#[rstest]
#[tokio::test]
async fn sync_all_replaces_with_validated_projection() {
    let mut tests = MockGlucoseTestRepository::new();
    tests.expect_validated_snapshots().times(1).return_once(|| {
        Ok(vec![detail(3, Some("Dewi")).test.to_bridging()])
    });
    let mut bridging = MockBridgingRepository::new();
    bridging
        .expect_replace_all()
        .withf(|rows| rows.len() == 1)
        .times(1)
        .return_once(|rows| Ok(rows.len() as u64));

    let engine = ValidationEngine::new(Arc::new(tests), Arc::new(bridging));
    assert_eq!(engine.sync_all().await.expect("synced").mirrored, 1);
}

#[rstest]
#[tokio::test]
async fn sync_all_surfaces_canonical_outage() {
    let mut tests = MockGlucoseTestRepository::new();
    tests
        .expect_validated_snapshots()
        .times(1)
        .return_once(|| Err(GlucoseTestRepositoryError::connection("down")));
    let mut bridging = MockBridgingRepository::new();
    bridging.expect_replace_all().times(0);

    let engine = ValidationEngine::new(Arc::new(tests), Arc::new(bridging));
    let err = engine.sync_all().await.expect_err("outage");
    assert_eq!(err.code(), ErrorCode::ServiceUnavailable);
}

#[rstest]
#[tokio::test]
async fn bridging_get_missing_is_not_found() {
    let mut bridging = MockBridgingRepository::new();
    bridging.expect_find().times(1).return_once(|_| Ok(None));
    let reader = BridgingReadService::new(Arc::new(bridging));
    let err = reader
        .get(GlucoseTestId::new(4))
        .await
        .expect_err("missing");
    assert_eq!(err.message(), "Test data not found");
}
