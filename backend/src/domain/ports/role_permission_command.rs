//! Driving port for role/permission administration.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{Error, Permission, PermissionId, RoleId};

/// Outcome of a bulk grant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssignReport {
    #[schema(value_type = Vec<i64>)]
    pub assigned: Vec<PermissionId>,
    #[schema(value_type = Vec<i64>)]
    pub already_assigned: Vec<PermissionId>,
}

/// A role and the permissions it now holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RolePermissions {
    #[schema(value_type = i64)]
    pub role_id: RoleId,
    pub role_name: String,
    pub permissions: Vec<Permission>,
}

#[async_trait]
pub trait RolePermissionCommand: Send + Sync {
    /// Grant each permission, skipping pairs that already exist.
    async fn assign_permissions(
        &self,
        role: RoleId,
        permissions: &[PermissionId],
    ) -> Result<AssignReport, Error>;

    async fn remove_permission(&self, role: RoleId, permission: PermissionId)
    -> Result<(), Error>;

    /// Make the role hold exactly `permissions`, writing only the difference.
    async fn replace_permissions(
        &self,
        role: RoleId,
        permissions: &[PermissionId],
    ) -> Result<RolePermissions, Error>;
}
