//! Driving port for per-request permission checks.

use async_trait::async_trait;

use crate::domain::{EffectivePermissions, Error, RequestContext};

#[async_trait]
pub trait AuthorizationGate: Send + Sync {
    /// Permissions the principal holds right now.
    async fn effective_permissions(
        &self,
        context: &RequestContext,
    ) -> Result<EffectivePermissions, Error>;

    /// Allow iff `permission` is held; otherwise fail closed with `Forbidden`.
    async fn authorize(&self, context: &RequestContext, permission: &str) -> Result<(), Error>;
}
