//! Per-request permission checks against the live registry.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

use crate::domain::ports::{AuthorizationGate, PermissionRepository, PermissionRepositoryError};
use crate::domain::{
    EffectivePermissions, Error, Principal, RequestContext, static_bridging_permissions,
};

/// Message returned when the principal lacks the required permission.
pub const FORBIDDEN_MESSAGE: &str = "Forbidden: insufficient permission";

/// [`AuthorizationGate`] that queries the registry on every call.
///
/// Session principals are resolved through their user id; the static
/// bridging principal carries a fixed set and never touches the store.
#[derive(Clone)]
pub struct RegistryAuthorizationGate<P> {
    registry: Arc<P>,
}

impl<P> RegistryAuthorizationGate<P> {
    /// Gate every check on `registry`; nothing is cached.
    pub fn new(registry: Arc<P>) -> Self {
        Self { registry }
    }
}

pub(crate) fn map_registry_error(error: PermissionRepositoryError) -> Error {
    match error {
        PermissionRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("permission registry unavailable: {message}"))
        }
        PermissionRepositoryError::Query { message } => {
            Error::internal(format!("permission registry error: {message}"))
        }
        PermissionRepositoryError::Duplicate { message } => {
            Error::conflict(format!("permission already assigned: {message}"))
        }
        PermissionRepositoryError::MissingReference { message } => {
            Error::not_found(format!("Permission not found: {message}"))
        }
    }
}

#[async_trait]
impl<P> AuthorizationGate for RegistryAuthorizationGate<P>
where
    P: PermissionRepository,
{
    async fn effective_permissions(
        &self,
        context: &RequestContext,
    ) -> Result<EffectivePermissions, Error> {
        match context.principal() {
            Principal::StaticBridging => Ok(static_bridging_permissions()),
            Principal::Session(claims) => self
                .registry
                .effective_permissions(claims.user_id())
                .await
                .map_err(map_registry_error),
        }
    }

    async fn authorize(&self, context: &RequestContext, permission: &str) -> Result<(), Error> {
        let held = self.effective_permissions(context).await?;
        if held.contains(permission) {
            return Ok(());
        }
        debug!(user_id = %context.user_id(), permission, "permission denied");
        Err(Error::forbidden(FORBIDDEN_MESSAGE).with_details(json!({ "permission": permission })))
    }
}
