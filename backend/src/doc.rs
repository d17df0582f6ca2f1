//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] collects every HTTP operation from the inbound layer together
//! with the request and response schemas they reference. Two security
//! schemes are registered: the bearer session token (also accepted from the
//! `token` cookie) and the partner's static bridging token, which travels in
//! the same `Authorization` header.
//!
//! The generated specification is served by Swagger UI in debug builds.

use utoipa::openapi::security::{ApiKey, ApiKeyValue, HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::domain::ports::{AssignReport, RolePermissions, UserDetail, UserWithRole};
use crate::domain::{
    BridgingSnapshot, DashboardSummary, EffectivePermissions, ErrorCode, GlucoseTest,
    GlucoseTestDetail, GlucoseTestInput, GlucoseUnit, MonthlyCount, Patient, Permission,
    ReconcileReport, Role, SyncReport, UserProfile, ValidationOutcome,
};
use crate::inbound::http::auth::{LoginRequest, LoginResponse, RegisterRequest};
use crate::inbound::http::error::ErrorEnvelope;
use crate::inbound::http::glucose_tests::LatestBatch;
use crate::inbound::http::health::{DatabaseStatus, HealthReport};
use crate::inbound::http::role_permissions::{RemovePermissionRequest, RolePermissionsRequest};
use crate::inbound::http::users::UserRoleRequest;

/// Security scheme name for session tokens.
pub const SESSION_SCHEME: &str = "SessionToken";
/// Security scheme name for the partner's static token.
pub const PARTNER_SCHEME: &str = "PartnerToken";

/// Enrich the generated document with the token security schemes.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            SESSION_SCHEME,
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .description(Some(
                        "Token issued by POST /auth/login; the `token` cookie is accepted too.",
                    ))
                    .build(),
            ),
        );
        components.add_security_scheme(
            PARTNER_SCHEME,
            SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::with_description(
                "Authorization",
                "`Bearer <static token>` shared with the bridging partner.",
            ))),
        );
    }
}

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Glucose backend API",
        description = "Role-gated glucose test records, validation and the partner bridging feed."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("SessionToken" = [])),
    paths(
        crate::inbound::http::auth::register,
        crate::inbound::http::auth::login,
        crate::inbound::http::auth::verify_token,
        crate::inbound::http::auth::logout,
        crate::inbound::http::role_permissions::assign_permission,
        crate::inbound::http::role_permissions::remove_permission,
        crate::inbound::http::role_permissions::update_permission,
        crate::inbound::http::users::list_users,
        crate::inbound::http::users::user_detail,
        crate::inbound::http::users::assign_role,
        crate::inbound::http::users::update_role,
        crate::inbound::http::glucose_tests::create_test,
        crate::inbound::http::glucose_tests::list_tests,
        crate::inbound::http::glucose_tests::patient_tests,
        crate::inbound::http::glucose_tests::patient_tests_all,
        crate::inbound::http::glucose_tests::dashboard_summary,
        crate::inbound::http::glucose_tests::dashboard_monthly,
        crate::inbound::http::glucose_tests::dashboard_latest,
        crate::inbound::http::glucose_tests::sync_tests,
        crate::inbound::http::glucose_tests::reconcile_bridging,
        crate::inbound::http::glucose_tests::get_test,
        crate::inbound::http::glucose_tests::update_test,
        crate::inbound::http::glucose_tests::delete_test,
        crate::inbound::http::glucose_tests::validate_test,
        crate::inbound::http::glucose_tests::mark_reported,
        crate::inbound::http::bridging::list_bridged,
        crate::inbound::http::bridging::get_bridged,
        crate::inbound::http::health::health,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        ErrorEnvelope,
        ErrorCode,
        RegisterRequest,
        LoginRequest,
        LoginResponse,
        UserWithRole,
        UserProfile,
        Role,
        Permission,
        EffectivePermissions,
        RolePermissionsRequest,
        RemovePermissionRequest,
        AssignReport,
        RolePermissions,
        UserRoleRequest,
        UserDetail,
        GlucoseTestInput,
        GlucoseTest,
        GlucoseTestDetail,
        GlucoseUnit,
        Patient,
        DashboardSummary,
        MonthlyCount,
        LatestBatch,
        ValidationOutcome,
        SyncReport,
        ReconcileReport,
        BridgingSnapshot,
        HealthReport,
        DatabaseStatus,
    )),
    tags(
        (name = "auth", description = "Registration, login and token checks"),
        (name = "role-permissions", description = "Permission registry administration"),
        (name = "users", description = "User role administration"),
        (name = "glucose-tests", description = "Glucose test records and validation"),
        (name = "bridging", description = "Validated results for the partner system"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;
