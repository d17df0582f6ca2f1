//! Partner read surface over the bridging mirror.
//!
//! ```text
//! GET /api/v1/bridging/glucose-test?page=1&limit=10
//! GET /api/v1/bridging/glucose-test/42
//! ```
//!
//! Accepts the partner's static bearer token as well as session tokens.

use actix_web::{HttpResponse, get, web};
use pagination::PageRequest;

use crate::domain::permission::ViewBridgingGlucoseTest;
use crate::domain::{BridgingSnapshot, GlucoseTestId};
use crate::inbound::http::ApiResult;
use crate::inbound::http::context::PartnerAuthorized;
use crate::inbound::http::error::ErrorEnvelope;
use crate::inbound::http::glucose_tests::PageQuery;
use crate::inbound::http::response::ok;
use crate::inbound::http::state::HttpState;

#[utoipa::path(
    get,
    path = "/api/v1/bridging/glucose-test",
    params(PageQuery),
    responses(
        (status = 200, description = "Page of mirrored tests"),
        (status = 401, description = "Unauthorized: Invalid static token.", body = ErrorEnvelope),
        (status = 403, description = "Missing view_bridging_glucose_test", body = ErrorEnvelope)
    ),
    security(("PartnerToken" = []), ("SessionToken" = [])),
    tags = ["bridging"],
    operation_id = "listBridgingGlucoseTests"
)]
#[get("")]
pub async fn list_bridged(
    state: web::Data<HttpState>,
    _auth: PartnerAuthorized<ViewBridgingGlucoseTest>,
    query: web::Query<PageQuery>,
) -> ApiResult<HttpResponse> {
    let page = PageRequest::from_query(query.page.as_deref(), query.limit.as_deref());
    let rows = state.bridging.list(page).await?;
    Ok(ok("Glucose tests retrieved successfully", rows))
}

#[utoipa::path(
    get,
    path = "/api/v1/bridging/glucose-test/{id}",
    params(("id" = i64, Path, description = "Glucose test id")),
    responses(
        (status = 200, description = "Mirrored test", body = BridgingSnapshot),
        (status = 404, description = "Test data not found", body = ErrorEnvelope)
    ),
    security(("PartnerToken" = []), ("SessionToken" = [])),
    tags = ["bridging"],
    operation_id = "getBridgingGlucoseTest"
)]
#[get("/{id}")]
pub async fn get_bridged(
    state: web::Data<HttpState>,
    _auth: PartnerAuthorized<ViewBridgingGlucoseTest>,
    path: web::Path<i64>,
) -> ApiResult<HttpResponse> {
    let row = state
        .bridging
        .get(GlucoseTestId::new(path.into_inner()))
        .await?;
    Ok(ok("Test data retrieved successfully", row))
}
