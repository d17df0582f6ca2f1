//! Handler coverage for the glucose test surface.

use super::*;
use crate::domain::{ALREADY_BRIDGED, DEFAULT_METHOD, MIRROR_PENDING};
use crate::inbound::http::test_utils::{TestHarness, harness, test_app};
use actix_web::http::{StatusCode, header};
use actix_web::test as actix_test;
use rstest::rstest;
use serde_json::{Value, json};

async fn send(harness: &TestHarness, req: actix_test::TestRequest) -> (StatusCode, Value) {
    let app = actix_test::init_service(test_app(harness)).await;
    let res = actix_test::call_service(&app, req.to_request()).await;
    let status = res.status();
    let body: Value = actix_test::read_body_json(res).await;
    (status, body)
}

fn bearer(token: &str) -> (header::HeaderName, String) {
    (header::AUTHORIZATION, format!("Bearer {token}"))
}

fn sample(value: f64, unit: &str, patient_id: i64) -> Value {
    json!({
        "date_time": "2026-01-05 07:30:00",
        "glucos_value": value,
        "unit": unit,
        "patient_id": patient_id,
        "device_name": "GlucoSure",
    })
}

async fn create(harness: &TestHarness, token: &str, payload: Value) -> i64 {
    let req = actix_test::TestRequest::post()
        .uri("/api/test-glucosa")
        .insert_header(bearer(token))
        .set_json(payload);
    let (status, body) = send(harness, req).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["data"]["id"].as_i64().expect("created id")
}

#[rstest]
#[actix_web::test]
async fn create_stores_value_and_defaults_method(harness: TestHarness) {
    let token = harness.token_for_role(2);
    let req = actix_test::TestRequest::post()
        .uri("/api/test-glucosa")
        .insert_header(bearer(&token))
        .set_json(sample(5.5, "mmol/L", 1));
    let (status, body) = send(&harness, req).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "Glucose test added successfully");
    assert_eq!(body["data"]["glucos_value"], 5.5);
    assert_eq!(body["data"]["unit"], "mmol/L");
    assert_eq!(body["data"]["metode"], DEFAULT_METHOD);
    assert_eq!(body["data"]["is_validation"], 0);
    assert_eq!(body["data"]["patient_id"], 1);
}

#[rstest]
#[actix_web::test]
async fn unknown_patient_is_stored_unlinked(harness: TestHarness) {
    let token = harness.token_for_role(1);
    let id = create(&harness, &token, sample(110.0, "mg/dL", 999_999)).await;

    let req = actix_test::TestRequest::get()
        .uri(&format!("/api/test-glucosa/{id}"))
        .insert_header(bearer(&token));
    let (status, body) = send(&harness, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["patient_id"], 0);
    assert!(body["data"]["patient_name"].is_null());
}

#[rstest]
#[case(sample(5.5, "mg/dl", 0), "Invalid unit. Must be mg/dL or mmol/L")]
#[case(sample(-1.0, "mg/dL", 0), "Invalid glucose value")]
#[case(json!({ "glucos_value": 5.5, "unit": "mmol/L" }), "Date, glucose value, and unit are required")]
#[actix_web::test]
async fn create_rejects_invalid_payloads(
    harness: TestHarness,
    #[case] payload: Value,
    #[case] message: &str,
) {
    let token = harness.token_for_role(1);
    let req = actix_test::TestRequest::post()
        .uri("/api/test-glucosa")
        .insert_header(bearer(&token))
        .set_json(payload);
    let (status, body) = send(&harness, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], message);
}

#[rstest]
#[case(3, StatusCode::FORBIDDEN)]
#[case(5, StatusCode::FORBIDDEN)]
#[actix_web::test]
async fn roles_without_create_are_rejected(
    harness: TestHarness,
    #[case] role: i64,
    #[case] expected: StatusCode,
) {
    let token = harness.token_for_role(role);
    let req = actix_test::TestRequest::post()
        .uri("/api/test-glucosa")
        .insert_header(bearer(&token))
        .set_json(sample(5.5, "mmol/L", 0));
    let (status, _) = send(&harness, req).await;
    assert_eq!(status, expected);
    assert!(harness.store.tests().is_empty());
}

#[rstest]
#[actix_web::test]
async fn list_paginates_and_reports_metadata(harness: TestHarness) {
    let token = harness.token_for_role(1);
    for value in [90.0, 100.0, 110.0] {
        create(&harness, &token, sample(value, "mg/dL", 1)).await;
    }
    let req = actix_test::TestRequest::get()
        .uri("/api/test-glucosa?page=1&limit=2")
        .insert_header(bearer(&token));
    let (status, body) = send(&harness, req).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["items"].as_array().map(Vec::len), Some(2));
    assert_eq!(body["data"]["info"]["totalRecords"], 3);
    assert_eq!(body["data"]["info"]["totalPages"], 2);
    assert_eq!(body["data"]["info"]["nextPage"], 2);
}

#[rstest]
#[actix_web::test]
async fn list_filters_by_search_and_validation(harness: TestHarness) {
    let token = harness.token_for_role(1);
    create(&harness, &token, sample(90.0, "mg/dL", 1)).await;
    create(&harness, &token, sample(95.0, "mg/dL", 2)).await;
    let req = actix_test::TestRequest::get()
        .uri("/api/test-glucosa?search=siti&is_validation=0")
        .insert_header(bearer(&token));
    let (status, body) = send(&harness, req).await;

    assert_eq!(status, StatusCode::OK);
    let items = body["data"]["items"].as_array().expect("items");
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["patient_name"], "Siti Aminah");
}

#[rstest]
#[actix_web::test]
async fn list_rejects_bad_validation_flag(harness: TestHarness) {
    let token = harness.token_for_role(3);
    let req = actix_test::TestRequest::get()
        .uri("/api/test-glucosa?is_validation=7")
        .insert_header(bearer(&token));
    let (status, _) = send(&harness, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[rstest]
#[actix_web::test]
async fn missing_test_is_not_found(harness: TestHarness) {
    let token = harness.token_for_role(3);
    let req = actix_test::TestRequest::get()
        .uri("/api/test-glucosa/77")
        .insert_header(bearer(&token));
    let (status, body) = send(&harness, req).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Test data not found");
}

#[rstest]
#[actix_web::test]
async fn update_then_delete(harness: TestHarness) {
    let token = harness.token_for_role(1);
    let id = create(&harness, &token, sample(90.0, "mg/dL", 1)).await;

    let req = actix_test::TestRequest::put()
        .uri(&format!("/api/test-glucosa/{id}"))
        .insert_header(bearer(&token))
        .set_json(json!({ "date_time": "2026-01-05T09:00:00", "glucos_value": 6.1, "unit": "mmol/L" }));
    let (status, body) = send(&harness, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["glucos_value"], 6.1);

    let req = actix_test::TestRequest::delete()
        .uri(&format!("/api/test-glucosa/{id}"))
        .insert_header(bearer(&token));
    let (status, body) = send(&harness, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Glucose test deleted successfully");

    let req = actix_test::TestRequest::delete()
        .uri(&format!("/api/test-glucosa/{id}"))
        .insert_header(bearer(&token));
    let (status, body) = send(&harness, req).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Glucose test not found");
}

#[rstest]
#[actix_web::test]
async fn update_requires_measurement_fields(harness: TestHarness) {
    let token = harness.token_for_role(1);
    let id = create(&harness, &token, sample(90.0, "mg/dL", 1)).await;
    let req = actix_test::TestRequest::put()
        .uri(&format!("/api/test-glucosa/{id}"))
        .insert_header(bearer(&token))
        .set_json(json!({ "unit": "mg/dL" }));
    let (status, body) = send(&harness, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "All fields are required");
}

#[rstest]
#[actix_web::test]
async fn validate_mirrors_once_and_reports_duplicates(harness: TestHarness) {
    let (validator, token) = harness.user_with_role(2);
    let id = create(&harness, &token, sample(5.5, "mmol/L", 1)).await;
    let uri = format!("/api/test-glucosa/{id}/validate");

    let req = actix_test::TestRequest::put().uri(&uri).insert_header(bearer(&token));
    let (status, body) = send(&harness, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Validation and data migration successful");
    assert_eq!(body["data"]["userValidation"], validator.name.as_str());
    assert_eq!(body["data"]["flipped"], true);
    assert_eq!(harness.bridging.rows().len(), 1);

    let req = actix_test::TestRequest::put().uri(&uri).insert_header(bearer(&token));
    let (status, body) = send(&harness, req).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["data"]["code"], ALREADY_BRIDGED);
    assert_eq!(harness.bridging.rows().len(), 1);
}

#[rstest]
#[actix_web::test]
async fn mirror_failure_is_pending_until_reconciled(harness: TestHarness) {
    let token = harness.token_for_role(1);
    let id = create(&harness, &token, sample(5.5, "mmol/L", 1)).await;
    harness.bridging.fail_next_inserts(1);

    let req = actix_test::TestRequest::put()
        .uri(&format!("/api/test-glucosa/{id}/validate"))
        .insert_header(bearer(&token));
    let (status, body) = send(&harness, req).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["data"]["code"], MIRROR_PENDING);
    assert!(harness.bridging.rows().is_empty());

    let req = actix_test::TestRequest::post()
        .uri("/api/test-glucosa/reconcile-bridging")
        .insert_header(bearer(&token));
    let (status, body) = send(&harness, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["repaired"], 1);
    assert_eq!(harness.bridging.rows().len(), 1);
}

#[rstest]
#[case("abc", StatusCode::BAD_REQUEST, "Invalid test id")]
#[case("0", StatusCode::BAD_REQUEST, "Invalid test id")]
#[case("404", StatusCode::NOT_FOUND, "Data not found")]
#[actix_web::test]
async fn validate_rejects_unknown_ids(
    harness: TestHarness,
    #[case] id: &str,
    #[case] expected: StatusCode,
    #[case] message: &str,
) {
    let token = harness.token_for_role(1);
    let req = actix_test::TestRequest::put()
        .uri(&format!("/api/test-glucosa/{id}/validate"))
        .insert_header(bearer(&token));
    let (status, body) = send(&harness, req).await;
    assert_eq!(status, expected);
    assert_eq!(body["message"], message);
}

#[rstest]
#[actix_web::test]
async fn viewers_cannot_validate(harness: TestHarness) {
    let admin = harness.token_for_role(1);
    let id = create(&harness, &admin, sample(5.5, "mmol/L", 1)).await;
    let viewer = harness.token_for_role(3);
    let req = actix_test::TestRequest::put()
        .uri(&format!("/api/test-glucosa/{id}/validate"))
        .insert_header(bearer(&viewer));
    let (status, _) = send(&harness, req).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(harness.bridging.rows().is_empty());
}

#[rstest]
#[actix_web::test]
async fn sync_rebuilds_mirror_from_validated_rows(harness: TestHarness) {
    let token = harness.token_for_role(1);
    let validated = create(&harness, &token, sample(5.5, "mmol/L", 1)).await;
    create(&harness, &token, sample(6.0, "mmol/L", 1)).await;
    let req = actix_test::TestRequest::put()
        .uri(&format!("/api/test-glucosa/{validated}/validate"))
        .insert_header(bearer(&token));
    send(&harness, req).await;

    let req = actix_test::TestRequest::post()
        .uri("/api/test-glucosa/sync-glucosa-tests")
        .insert_header(bearer(&token));
    let (status, body) = send(&harness, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["mirrored"], 1);
    let mirrored: Vec<i64> = harness.bridging.rows().iter().map(|row| row.id.get()).collect();
    assert_eq!(mirrored, vec![validated]);
}

#[rstest]
#[actix_web::test]
async fn patient_listings(harness: TestHarness) {
    let token = harness.token_for_role(1);
    create(&harness, &token, sample(90.0, "mg/dL", 2)).await;
    create(&harness, &token, sample(91.0, "mg/dL", 2)).await;

    let req = actix_test::TestRequest::get()
        .uri("/api/test-glucosa/patient/2?limit=1")
        .insert_header(bearer(&token));
    let (status, body) = send(&harness, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["items"].as_array().map(Vec::len), Some(1));
    assert_eq!(body["data"]["info"]["nextPage"], 2);
    assert!(body["data"]["info"]["prevPage"].is_null());

    let req = actix_test::TestRequest::get()
        .uri("/api/test-glucosa/patient/2/glucose-tests")
        .insert_header(bearer(&token));
    let (status, body) = send(&harness, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().map(Vec::len), Some(2));

    let req = actix_test::TestRequest::get()
        .uri("/api/test-glucosa/patient/99")
        .insert_header(bearer(&token));
    let (status, body) = send(&harness, req).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Patient not found");
}

#[rstest]
#[actix_web::test]
async fn dashboard_projections(harness: TestHarness) {
    let token = harness.token_for_role(1);
    let id = create(&harness, &token, sample(5.5, "mmol/L", 1)).await;
    create(&harness, &token, sample(6.5, "mmol/L", 1)).await;
    let req = actix_test::TestRequest::put()
        .uri(&format!("/api/test-glucosa/{id}/validate"))
        .insert_header(bearer(&token));
    send(&harness, req).await;

    let req = actix_test::TestRequest::get()
        .uri("/api/test-glucosa/dashboard/summary")
        .insert_header(bearer(&token));
    let (_, body) = send(&harness, req).await;
    assert_eq!(
        body["data"],
        json!({ "totalValidated": 1, "totalUnvalidated": 1, "total": 2 })
    );

    let req = actix_test::TestRequest::get()
        .uri("/api/test-glucosa/dashboard/monthly?year=2026")
        .insert_header(bearer(&token));
    let (_, body) = send(&harness, req).await;
    let buckets = body["data"].as_array().expect("buckets");
    assert_eq!(buckets.len(), 12);
    assert_eq!(buckets[0]["total"], 2);

    let req = actix_test::TestRequest::get()
        .uri("/api/test-glucosa/dashboard/latest")
        .insert_header(bearer(&token));
    let (status, body) = send(&harness, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], 2);
    assert_eq!(body["data"]["dataList"].as_array().map(Vec::len), Some(2));
}

#[rstest]
#[actix_web::test]
async fn monthly_rejects_non_numeric_year(harness: TestHarness) {
    let token = harness.token_for_role(3);
    let req = actix_test::TestRequest::get()
        .uri("/api/test-glucosa/dashboard/monthly?year=next")
        .insert_header(bearer(&token));
    let (status, body) = send(&harness, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid year");
}

#[rstest]
#[actix_web::test]
async fn is_status_marks_reported(harness: TestHarness) {
    let token = harness.token_for_role(1);
    let id = create(&harness, &token, sample(5.5, "mmol/L", 1)).await;
    let req = actix_test::TestRequest::put()
        .uri(&format!("/api/test-glucosa/{id}/is-status"))
        .insert_header(bearer(&token));
    let (status, body) = send(&harness, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Is status updated successfully");
    assert!(harness.store.tests().iter().all(|test| test.reported));
}
