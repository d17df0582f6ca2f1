//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain ports (use-cases) and remain testable without I/O.

use std::sync::Arc;

use crate::domain::ports::{
    AuthService, AuthorizationGate, BridgingQuery, GlucoseTestCommand, GlucoseTestQuery,
    RolePermissionCommand, UserAdministration, ValidationCommand,
};

use super::session::SessionTransport;

/// Parameter object bundling all port implementations for HTTP handlers.
#[derive(Clone)]
pub struct HttpStatePorts {
    pub auth: Arc<dyn AuthService>,
    pub gate: Arc<dyn AuthorizationGate>,
    pub role_permissions: Arc<dyn RolePermissionCommand>,
    pub users: Arc<dyn UserAdministration>,
    pub glucose_tests: Arc<dyn GlucoseTestCommand>,
    pub glucose_tests_query: Arc<dyn GlucoseTestQuery>,
    pub validation: Arc<dyn ValidationCommand>,
    pub bridging: Arc<dyn BridgingQuery>,
}

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub auth: Arc<dyn AuthService>,
    pub gate: Arc<dyn AuthorizationGate>,
    pub role_permissions: Arc<dyn RolePermissionCommand>,
    pub users: Arc<dyn UserAdministration>,
    pub glucose_tests: Arc<dyn GlucoseTestCommand>,
    pub glucose_tests_query: Arc<dyn GlucoseTestQuery>,
    pub validation: Arc<dyn ValidationCommand>,
    pub bridging: Arc<dyn BridgingQuery>,
    pub session: SessionTransport,
}

impl HttpState {
    /// Construct state from the ports bundle and token transport settings.
    pub fn new(ports: HttpStatePorts, session: SessionTransport) -> Self {
        let HttpStatePorts {
            auth,
            gate,
            role_permissions,
            users,
            glucose_tests,
            glucose_tests_query,
            validation,
            bridging,
        } = ports;
        Self {
            auth,
            gate,
            role_permissions,
            users,
            glucose_tests,
            glucose_tests_query,
            validation,
            bridging,
            session,
        }
    }
}
