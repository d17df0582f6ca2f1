//! Builders wiring the Diesel adapters into domain services and HTTP state.

use std::sync::Arc;

use actix_web::web;
use mockable::DefaultClock;
use tracing::{info, warn};

use glucose_backend::domain::{
    BridgingReadService, GlucoseTestService, PasswordAuthService, RegistryAuthorizationGate,
    RolePermissionService, SessionTokens, UserAdminService, ValidationEngine,
};
use glucose_backend::inbound::http::health::HealthState;
use glucose_backend::inbound::http::session::{
    CookiePolicy, SessionTransport, StaticBridgingToken,
};
use glucose_backend::inbound::http::state::{HttpState, HttpStatePorts};
use glucose_backend::middleware::{ActivityFile, ActivitySink};
use glucose_backend::outbound::persistence::{
    DieselActivityLogRepository, DieselBridgingRepository, DieselGlucoseTestRepository,
    DieselPatientRepository, DieselPermissionRepository, DieselStoreHealthCheck, DieselUserRepository,
};

use super::ServerConfig;

/// Token transport settings: signing secret, TTL, cookie policy and the
/// optional partner token.
pub(crate) fn build_session(config: &ServerConfig) -> SessionTransport {
    let tokens = SessionTokens::new(
        &config.secret,
        config.token_ttl_secs,
        Arc::new(DefaultClock),
    );
    let static_token = config
        .static_bridging_token
        .as_deref()
        .and_then(StaticBridgingToken::new);
    match &static_token {
        Some(token) => info!(
            fingerprint = %token.fingerprint(),
            "partner static token configured"
        ),
        None => warn!("no partner static token configured; bridging requires a session"),
    }
    SessionTransport::new(
        tokens,
        static_token,
        CookiePolicy {
            secure: config.cookie_secure,
        },
    )
}

/// Build every HTTP port over the two database pools.
pub(crate) fn build_http_state(config: &ServerConfig) -> web::Data<HttpState> {
    let canonical = &config.canonical_pool;
    let users = Arc::new(DieselUserRepository::new(canonical.clone()));
    let registry = Arc::new(DieselPermissionRepository::new(canonical.clone()));
    let tests = Arc::new(DieselGlucoseTestRepository::new(canonical.clone()));
    let patients = Arc::new(DieselPatientRepository::new(canonical.clone()));
    let mirror = Arc::new(DieselBridgingRepository::new(config.bridging_pool.clone()));

    let session = build_session(config);
    let glucose = Arc::new(GlucoseTestService::new(tests.clone(), patients));
    let ports = HttpStatePorts {
        auth: Arc::new(
            PasswordAuthService::new(users.clone(), session.tokens().clone())
                .with_default_role(config.default_role),
        ),
        gate: Arc::new(RegistryAuthorizationGate::new(registry.clone())),
        role_permissions: Arc::new(RolePermissionService::new(registry.clone())),
        users: Arc::new(UserAdminService::new(users, registry)),
        glucose_tests: glucose.clone(),
        glucose_tests_query: glucose,
        validation: Arc::new(ValidationEngine::new(tests, mirror.clone())),
        bridging: Arc::new(BridgingReadService::new(mirror)),
    };
    web::Data::new(HttpState::new(ports, session))
}

/// Health checks over both pools.
pub(crate) fn build_health_state(config: &ServerConfig) -> web::Data<HealthState> {
    web::Data::new(HealthState::new(
        Arc::new(DieselStoreHealthCheck::new(config.canonical_pool.clone())),
        Arc::new(DieselStoreHealthCheck::new(config.bridging_pool.clone())),
        config.environment.clone(),
    ))
}

/// Activity sink writing to the `activity_logs` table and, when the file can
/// be opened, to the JSON-lines log.
pub(crate) fn build_activity_sink(config: &ServerConfig) -> Arc<ActivitySink> {
    let sink = ActivitySink::new(Arc::new(DieselActivityLogRepository::new(
        config.canonical_pool.clone(),
    )));
    let Some(path) = &config.activity_log_path else {
        return Arc::new(sink);
    };
    match ActivityFile::open(path) {
        Ok(file) => Arc::new(sink.with_file(file)),
        Err(error) => {
            warn!(path = %path.display(), %error, "activity log file unavailable; using database only");
            Arc::new(sink)
        }
    }
}
