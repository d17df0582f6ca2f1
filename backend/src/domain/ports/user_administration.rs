//! Driving port for user listing and role assignment.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{Error, Permission, Role, RoleId, UserId, UserProfile};

/// A user with their roles and the permissions those roles grant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UserDetail {
    pub user: UserProfile,
    pub roles: Vec<Role>,
    /// Distinct by id, ordered by id.
    pub permissions: Vec<Permission>,
}

#[async_trait]
pub trait UserAdministration: Send + Sync {
    async fn list_users(&self) -> Result<Vec<UserProfile>, Error>;

    async fn user_detail(&self, user: UserId) -> Result<UserDetail, Error>;

    /// Set the user's single role, replacing any previous one.
    async fn assign_role(&self, user: UserId, role: RoleId) -> Result<(), Error>;

    /// Change an existing assignment.
    async fn update_role(&self, user: UserId, role: RoleId) -> Result<(), Error>;
}
