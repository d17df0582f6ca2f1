//! End-to-end access control over the HTTP surface.
//!
//! A self-registered user starts with the default viewer role; permission
//! changes made by an administrator take effect on the very next request.

use actix_web::dev::ServiceResponse;
use actix_web::http::{StatusCode, header};
use actix_web::{App, test as actix_test};
use glucose_backend::Trace;
use glucose_backend::domain::ports::AuthorizationGate;
use glucose_backend::domain::{
    CLAIM_VERSION, RequestContext, SessionClaims, TOKEN_COOKIE, TRACE_ID_HEADER,
};
use glucose_backend::inbound::http::configure;
use glucose_backend::test_support::TestHarness;
use rstest::{fixture, rstest};
use serde_json::{Value, json};

#[fixture]
fn harness() -> TestHarness {
    TestHarness::new()
}

async fn call(harness: &TestHarness, req: actix_test::TestRequest) -> ServiceResponse {
    let app = actix_test::init_service(
        App::new()
            .app_data(harness.state())
            .wrap(Trace)
            .configure(configure),
    )
    .await;
    actix_test::call_service(&app, req.to_request()).await
}

async fn send(harness: &TestHarness, req: actix_test::TestRequest) -> (StatusCode, Value) {
    let res = call(harness, req).await;
    let status = res.status();
    let body: Value = actix_test::read_body_json(res).await;
    (status, body)
}

fn bearer(token: &str) -> (header::HeaderName, String) {
    (header::AUTHORIZATION, format!("Bearer {token}"))
}

fn sample() -> Value {
    json!({
        "date_time": "2026-01-05 09:15:00",
        "glucos_value": 98,
        "unit": "mg/dL",
        "patient_id": 2,
    })
}

async fn register_and_login(harness: &TestHarness) -> String {
    let (status, body) = send(
        harness,
        actix_test::TestRequest::post().uri("/auth/register").set_json(json!({
            "name": "Dewi Lestari",
            "email": "dewi@example.com",
            "password": "rahasia1",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["data"]["roleId"], 3);

    let (status, body) = send(
        harness,
        actix_test::TestRequest::post().uri("/auth/login").set_json(json!({
            "email": "dewi@example.com",
            "password": "rahasia1",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    body["data"]["token"]
        .as_str()
        .expect("login token")
        .to_owned()
}

#[rstest]
#[actix_web::test]
async fn granted_permission_applies_to_next_request(harness: TestHarness) {
    let token = register_and_login(&harness).await;

    let (status, _) = send(
        &harness,
        actix_test::TestRequest::get()
            .uri("/api/test-glucosa")
            .insert_header(bearer(&token)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &harness,
        actix_test::TestRequest::post()
            .uri("/api/test-glucosa")
            .insert_header(bearer(&token))
            .set_json(sample()),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["status"], "error");

    let admin = harness.token_for_role(1);
    let (status, _) = send(
        &harness,
        actix_test::TestRequest::post()
            .uri("/api/role-permissions/assign-permission")
            .insert_header(bearer(&admin))
            .set_json(json!({ "roleId": 3, "permissionIds": [1] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &harness,
        actix_test::TestRequest::post()
            .uri("/api/test-glucosa")
            .insert_header(bearer(&token))
            .set_json(sample()),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["data"]["unit"], "mg/dL");
}

#[rstest]
#[actix_web::test]
async fn revoked_permission_applies_to_next_request(harness: TestHarness) {
    let token = harness.token_for_role(2);
    let admin = harness.token_for_role(1);

    let (status, _) = send(
        &harness,
        actix_test::TestRequest::delete()
            .uri("/api/role-permissions/remove-permission")
            .insert_header(bearer(&admin))
            .set_json(json!({ "roleId": 2, "permissionId": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &harness,
        actix_test::TestRequest::post()
            .uri("/api/test-glucosa")
            .insert_header(bearer(&token))
            .set_json(sample()),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[rstest]
#[actix_web::test]
async fn user_without_role_holds_no_permissions(harness: TestHarness) {
    let profile = harness
        .store
        .add_user("Tanpa Peran", "none@example.com", "secret123", None);
    let token = harness.token_for(&profile, 3);

    let (status, body) = send(
        &harness,
        actix_test::TestRequest::get()
            .uri("/api/test-glucosa")
            .insert_header(bearer(&token)),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN, "{body}");

    let context = RequestContext::session(SessionClaims {
        v: CLAIM_VERSION,
        sub: profile.id.get(),
        nm: profile.name.clone(),
        em: "no".into(),
        rid: 3,
        iat: 0,
        exp: i64::MAX,
    });
    let held = harness
        .state()
        .gate
        .effective_permissions(&context)
        .await
        .expect("effective permissions");
    assert!(held.is_empty());
}

#[rstest]
#[actix_web::test]
async fn login_cookie_authenticates_without_header(harness: TestHarness) {
    let token = register_and_login(&harness).await;

    let (status, body) = send(
        &harness,
        actix_test::TestRequest::get()
            .uri("/auth/verify-token")
            .cookie(actix_web::cookie::Cookie::new(TOKEN_COOKIE, token)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["email"], "dewi@example.com");
}

#[rstest]
#[actix_web::test]
async fn unauthorised_errors_carry_the_trace_id(harness: TestHarness) {
    let res = call(&harness, actix_test::TestRequest::get().uri("/api/test-glucosa")).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let trace_id = res
        .headers()
        .get(TRACE_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned)
        .expect("trace id header");

    let body: Value = actix_test::read_body_json(res).await;
    assert_eq!(body["traceId"].as_str(), Some(trace_id.as_str()));
}

#[rstest]
#[actix_web::test]
async fn partner_token_is_limited_to_bridging_routes(harness: TestHarness) {
    let (status, _) = send(
        &harness,
        actix_test::TestRequest::get()
            .uri("/api/v1/bridging/glucose-test")
            .insert_header((header::AUTHORIZATION, harness.static_authorization())),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &harness,
        actix_test::TestRequest::get()
            .uri("/api/test-glucosa")
            .insert_header((header::AUTHORIZATION, harness.static_authorization())),
    )
    .await;
    assert_ne!(status, StatusCode::OK);
}
