//! Role/permission administration.

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::domain::authorization_service::map_registry_error;
use crate::domain::ports::{
    AssignReport, PermissionRepository, PermissionRepositoryError, RolePermissionCommand,
    RolePermissions,
};
use crate::domain::{Error, PermissionDiff, PermissionId, Role, RoleId};

/// [`RolePermissionCommand`] over a [`PermissionRepository`].
#[derive(Clone)]
pub struct RolePermissionService<P> {
    registry: Arc<P>,
}

impl<P> RolePermissionService<P> {
    /// Build the service over the permission registry.
    pub fn new(registry: Arc<P>) -> Self {
        Self { registry }
    }
}

impl<P> RolePermissionService<P>
where
    P: PermissionRepository,
{
    async fn require_role(&self, role: RoleId) -> Result<Role, Error> {
        self.registry
            .find_role(role)
            .await
            .map_err(map_registry_error)?
            .ok_or_else(|| Error::not_found("Role not found"))
    }
}

/// Ids in first-seen order with repeats dropped.
fn distinct(ids: &[PermissionId]) -> Vec<PermissionId> {
    let mut seen = BTreeSet::new();
    ids.iter().copied().filter(|id| seen.insert(*id)).collect()
}

#[async_trait]
impl<P> RolePermissionCommand for RolePermissionService<P>
where
    P: PermissionRepository,
{
    async fn assign_permissions(
        &self,
        role: RoleId,
        permissions: &[PermissionId],
    ) -> Result<AssignReport, Error> {
        if permissions.is_empty() {
            return Err(Error::invalid_request(
                "Role ID and Permission IDs are required",
            ));
        }
        self.require_role(role).await?;

        let mut report = AssignReport::default();
        for permission in distinct(permissions) {
            match self.registry.insert_pair(role, permission).await {
                Ok(()) => report.assigned.push(permission),
                Err(PermissionRepositoryError::Duplicate { .. }) => {
                    report.already_assigned.push(permission);
                }
                Err(PermissionRepositoryError::MissingReference { .. }) => {
                    return Err(Error::not_found(format!("Permission {permission} not found")));
                }
                Err(other) => return Err(map_registry_error(other)),
            }
        }
        info!(
            role_id = %role,
            assigned = report.assigned.len(),
            already_assigned = report.already_assigned.len(),
            "permissions assigned"
        );
        Ok(report)
    }

    async fn remove_permission(
        &self,
        role: RoleId,
        permission: PermissionId,
    ) -> Result<(), Error> {
        let removed = self
            .registry
            .delete_pair(role, permission)
            .await
            .map_err(map_registry_error)?;
        if removed == 0 {
            return Err(Error::not_found("Permission not found for role"));
        }
        info!(role_id = %role, permission_id = %permission, "permission removed");
        Ok(())
    }

    async fn replace_permissions(
        &self,
        role: RoleId,
        permissions: &[PermissionId],
    ) -> Result<RolePermissions, Error> {
        let record = self.require_role(role).await?;
        let current: Vec<PermissionId> = self
            .registry
            .permissions_for_role(role)
            .await
            .map_err(map_registry_error)?
            .into_iter()
            .map(|permission| permission.id)
            .collect();

        let diff = PermissionDiff::compute(&current, permissions);
        if !diff.is_empty() {
            self.registry
                .apply_diff(role, &diff)
                .await
                .map_err(map_registry_error)?;
        }
        info!(
            role_id = %role,
            removed = diff.to_remove.len(),
            added = diff.to_add.len(),
            "role permissions replaced"
        );

        let permissions = self
            .registry
            .permissions_for_role(role)
            .await
            .map_err(map_registry_error)?;
        Ok(RolePermissions {
            role_id: record.id,
            role_name: record.name,
            permissions,
        })
    }
}
