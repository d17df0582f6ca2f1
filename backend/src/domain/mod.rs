//! Domain primitives, services and ports.
//!
//! Purpose: define strongly typed entities used by the HTTP and persistence
//! adapters, and the services that implement the driving ports. Keep types
//! immutable and document serialisation contracts on each type.
//!
//! Public surface:
//! - Error / ErrorCode: transport-agnostic failure payload.
//! - Identity types (`UserId`, `RoleId`, ...) and user records.
//! - Session tokens, permissions and the per-request [`RequestContext`].
//! - Glucose tests, bridging snapshots and dashboard projections.
//! - Services implementing [`ports`] driving traits.

pub mod auth;
pub mod auth_service;
pub mod authorization_service;
pub mod bridging;
pub mod dashboard;
pub mod error;
pub mod glucose;
pub mod glucose_service;
pub mod identity;
pub mod permission;
pub mod ports;
pub mod request_context;
pub mod role_permission_service;
pub mod session;
pub mod trace_id;
pub mod user_admin_service;
pub mod validation_engine;

pub use self::auth::{
    CredentialValidationError, LoginCredentials, NAME_MIN, PASSWORD_MIN, Registration,
};
pub use self::auth_service::PasswordAuthService;
pub use self::authorization_service::RegistryAuthorizationGate;
pub use self::bridging::{
    ALREADY_BRIDGED, MIRROR_PENDING, ReconcileReport, SyncReport, ValidationOutcome,
    already_bridged, mirror_pending,
};
pub use self::dashboard::{DashboardSummary, MonthlyCount, monthly_buckets};
pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::glucose::{
    BridgingSnapshot, DEFAULT_METHOD, GlucoseInputError, GlucoseTest, GlucoseTestDetail,
    GlucoseTestFilter, GlucoseTestInput, GlucoseTestUpdate, GlucoseUnit, GlucoseValue,
    NewGlucoseTest, Patient, ValidationState, parse_measured_at,
};
pub use self::glucose_service::GlucoseTestService;
pub use self::identity::{
    GlucoseTestId, NewUser, Permission, PermissionId, PatientId, Role, RoleId, UserAccount,
    UserId, UserProfile,
};
pub use self::permission::{
    EffectivePermissions, PermissionDiff, RequiredPermission, names as permission_names,
};
pub use self::request_context::{
    Principal, RequestContext, STATIC_BRIDGING_EMAIL, STATIC_BRIDGING_NAME,
    STATIC_BRIDGING_ROLE_ID, STATIC_BRIDGING_USER_ID, static_bridging_permissions,
};
pub use self::role_permission_service::RolePermissionService;
pub use self::session::{
    CLAIM_VERSION, CredentialError, DEFAULT_TOKEN_TTL_SECS, SessionClaims, SessionTokens,
    TOKEN_COOKIE, TokenError, email_fragment,
};
pub use self::trace_id::{TRACE_ID_HEADER, TraceId};
pub use self::user_admin_service::UserAdminService;
pub use self::validation_engine::{BridgingReadService, ValidationEngine};

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use actix_web::HttpResponse;
/// use glucose_backend::domain::{ApiResult, Error};
///
/// fn handler() -> ApiResult<HttpResponse> {
///     Err(Error::forbidden("nope"))
/// }
/// ```
pub type ApiResult<T> = Result<T, Error>;
