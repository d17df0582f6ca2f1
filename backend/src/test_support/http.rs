//! HTTP state wired to in-memory stores.
//!
//! Builds the real domain services over [`InMemoryStore`] and
//! [`InMemoryBridgingStore`] so handler tests exercise the same code paths
//! as the server, minus PostgreSQL.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use actix_web::web;
use chrono::{TimeZone, Utc};

use crate::domain::{
    BridgingReadService, GlucoseTestService, PasswordAuthService, RegistryAuthorizationGate,
    RoleId, RolePermissionService, SessionTokens, UserAdminService, UserProfile,
    ValidationEngine,
};
use crate::inbound::http::session::{CookiePolicy, SessionTransport, StaticBridgingToken};
use crate::inbound::http::state::{HttpState, HttpStatePorts};

use super::{InMemoryBridgingStore, InMemoryStore, MutableClock, RecordingActivityLog};

/// Signing secret used by every harness.
pub const TEST_SECRET: &[u8] = b"glucose-test-secret";
/// Partner static token accepted by every harness.
pub const TEST_STATIC_TOKEN: &str = "partner-static-token";
/// Token lifetime used by every harness.
pub const TEST_TOKEN_TTL_SECS: u64 = 3600;

/// In-memory stores plus the [`HttpState`] built over them.
pub struct TestHarness {
    pub store: Arc<InMemoryStore>,
    pub bridging: Arc<InMemoryBridgingStore>,
    pub activity: Arc<RecordingActivityLog>,
    pub clock: Arc<MutableClock>,
    tokens: SessionTokens,
    state: web::Data<HttpState>,
    next_user: AtomicU32,
}

impl TestHarness {
    /// Seeded canonical store, empty bridging store, clock at 2026-01-05.
    pub fn new() -> Self {
        let store = Arc::new(InMemoryStore::seeded());
        let bridging = Arc::new(InMemoryBridgingStore::new());
        let clock = Arc::new(MutableClock::new(
            Utc.with_ymd_and_hms(2026, 1, 5, 8, 0, 0)
                .single()
                .unwrap_or_else(Utc::now),
        ));
        let tokens = SessionTokens::new(TEST_SECRET, TEST_TOKEN_TTL_SECS, clock.clone());

        let glucose = Arc::new(GlucoseTestService::new(store.clone(), store.clone()));
        let ports = HttpStatePorts {
            auth: Arc::new(
                PasswordAuthService::new(store.clone(), tokens.clone())
                    .with_hash_cost(super::TEST_HASH_COST),
            ),
            gate: Arc::new(RegistryAuthorizationGate::new(store.clone())),
            role_permissions: Arc::new(RolePermissionService::new(store.clone())),
            users: Arc::new(UserAdminService::new(store.clone(), store.clone())),
            glucose_tests: glucose.clone(),
            glucose_tests_query: glucose,
            validation: Arc::new(ValidationEngine::new(store.clone(), bridging.clone())),
            bridging: Arc::new(BridgingReadService::new(bridging.clone())),
        };
        let session = SessionTransport::new(
            tokens.clone(),
            StaticBridgingToken::new(TEST_STATIC_TOKEN),
            CookiePolicy { secure: false },
        );

        Self {
            store,
            bridging,
            activity: Arc::new(RecordingActivityLog::new()),
            clock,
            tokens,
            state: web::Data::new(HttpState::new(ports, session)),
            next_user: AtomicU32::new(0),
        }
    }

    pub fn state(&self) -> web::Data<HttpState> {
        self.state.clone()
    }

    /// Create a fresh user holding `role` and return a session token for it.
    pub fn token_for_role(&self, role: i64) -> String {
        let (_, token) = self.user_with_role(role);
        token
    }

    /// Create a fresh user holding `role`; returns its profile and token.
    pub fn user_with_role(&self, role: i64) -> (UserProfile, String) {
        let n = self.next_user.fetch_add(1, Ordering::Relaxed);
        let profile = self.store.add_user(
            &format!("Tester {n}"),
            &format!("tester{n}@example.com"),
            "secret123",
            Some(role),
        );
        let token = self.token_for(&profile, role);
        (profile, token)
    }

    /// Issue a token for an existing user.
    pub fn token_for(&self, user: &UserProfile, role: i64) -> String {
        match self.tokens.issue(user, RoleId::new(role)) {
            Ok(token) => token,
            Err(error) => panic!("token issue failed: {error}"),
        }
    }

    /// `Authorization` header value carrying the partner static token.
    pub fn static_authorization(&self) -> String {
        format!("Bearer {TEST_STATIC_TOKEN}")
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}
