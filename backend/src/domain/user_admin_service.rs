//! User listing and single-role assignment.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::domain::auth_service::map_user_error;
use crate::domain::authorization_service::map_registry_error;
use crate::domain::ports::{
    PermissionRepository, UserAdministration, UserDetail, UserRepository, UserRepositoryError,
};
use crate::domain::{Error, RoleId, UserId, UserProfile};

/// [`UserAdministration`] over the user and permission repositories.
#[derive(Clone)]
pub struct UserAdminService<U, P> {
    users: Arc<U>,
    registry: Arc<P>,
}

impl<U, P> UserAdminService<U, P> {
    /// `registry` supplies role lookups and effective permissions.
    pub fn new(users: Arc<U>, registry: Arc<P>) -> Self {
        Self { users, registry }
    }
}

impl<U, P> UserAdminService<U, P>
where
    U: UserRepository,
    P: PermissionRepository,
{
    async fn require_role(&self, role: RoleId) -> Result<(), Error> {
        self.registry
            .find_role(role)
            .await
            .map_err(map_registry_error)?
            .map(|_| ())
            .ok_or_else(|| Error::not_found("Role ID not found"))
    }
}

#[async_trait]
impl<U, P> UserAdministration for UserAdminService<U, P>
where
    U: UserRepository,
    P: PermissionRepository,
{
    async fn list_users(&self) -> Result<Vec<UserProfile>, Error> {
        self.users.list().await.map_err(map_user_error)
    }

    async fn user_detail(&self, user: UserId) -> Result<UserDetail, Error> {
        let account = self
            .users
            .find_by_id(user)
            .await
            .map_err(map_user_error)?
            .ok_or_else(|| Error::not_found("User not found"))?;
        let roles = self.users.roles_of(user).await.map_err(map_user_error)?;

        let mut permissions = BTreeMap::new();
        for role in &roles {
            for permission in self
                .registry
                .permissions_for_role(role.id)
                .await
                .map_err(map_registry_error)?
            {
                permissions.entry(permission.id).or_insert(permission);
            }
        }

        Ok(UserDetail {
            user: account.profile(),
            roles,
            permissions: permissions.into_values().collect(),
        })
    }

    async fn assign_role(&self, user: UserId, role: RoleId) -> Result<(), Error> {
        self.require_role(role).await?;
        match self.users.assign_role(user, role).await {
            Ok(()) => {
                info!(user_id = %user, role_id = %role, "role assigned");
                Ok(())
            }
            Err(UserRepositoryError::MissingReference { .. }) => {
                Err(Error::not_found("User not found"))
            }
            Err(other) => Err(map_user_error(other)),
        }
    }

    async fn update_role(&self, user: UserId, role: RoleId) -> Result<(), Error> {
        self.require_role(role).await?;
        let updated = self
            .users
            .update_role(user, role)
            .await
            .map_err(map_user_error)?;
        if !updated {
            return Err(Error::not_found("User or role assignment not found"));
        }
        info!(user_id = %user, role_id = %role, "role updated");
        Ok(())
    }
}
