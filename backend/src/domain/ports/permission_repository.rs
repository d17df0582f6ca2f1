//! Port for the role/permission registry.
//!
//! The registry joins `users → user_roles → roles → role_permissions →
//! permissions`. Adapters must apply [`PermissionDiff`]s inside a single
//! transaction so a role never exposes a half-replaced permission set.

use async_trait::async_trait;

use crate::domain::{
    EffectivePermissions, Permission, PermissionDiff, PermissionId, Role, RoleId, UserId,
};

use super::define_port_error;

define_port_error! {
    /// Errors raised by permission registry adapters.
    pub enum PermissionRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "permission repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "permission repository query failed: {message}",
        /// The role/permission pair already exists.
        Duplicate { message: String } => "permission repository duplicate key: {message}",
        /// A referenced role or permission does not exist.
        MissingReference { message: String } =>
            "permission repository missing reference: {message}",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PermissionRepository: Send + Sync {
    /// Permission names granted through the user's role; empty without a role.
    async fn effective_permissions(
        &self,
        user: UserId,
    ) -> Result<EffectivePermissions, PermissionRepositoryError>;

    async fn find_role(&self, role: RoleId) -> Result<Option<Role>, PermissionRepositoryError>;

    /// Permissions currently granted to the role, ordered by id.
    async fn permissions_for_role(
        &self,
        role: RoleId,
    ) -> Result<Vec<Permission>, PermissionRepositoryError>;

    /// Grant one permission; a repeated pair fails with `Duplicate`.
    async fn insert_pair(
        &self,
        role: RoleId,
        permission: PermissionId,
    ) -> Result<(), PermissionRepositoryError>;

    /// Revoke one permission; returns the number of rows removed.
    async fn delete_pair(
        &self,
        role: RoleId,
        permission: PermissionId,
    ) -> Result<u64, PermissionRepositoryError>;

    /// Apply removals then insertions atomically.
    async fn apply_diff(
        &self,
        role: RoleId,
        diff: &PermissionDiff,
    ) -> Result<(), PermissionRepositoryError>;
}
