//! Driving port for registration, login and token introspection.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{Error, LoginCredentials, Registration, RoleId, SessionClaims, UserProfile};

/// A user together with its active role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserWithRole {
    #[serde(flatten)]
    pub user: UserProfile,
    #[schema(value_type = i64)]
    pub role_id: RoleId,
}

/// Successful login: the signed token and who it identifies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginOutcome {
    pub user: UserWithRole,
    pub token: String,
}

#[async_trait]
pub trait AuthService: Send + Sync {
    /// Check credentials and issue a session token.
    async fn login(&self, credentials: &LoginCredentials) -> Result<LoginOutcome, Error>;

    /// Create a user with the default role.
    async fn register(&self, registration: &Registration) -> Result<UserWithRole, Error>;

    /// Resolve the user behind verified claims; fails if it has been removed.
    async fn current_user(&self, claims: &SessionClaims) -> Result<UserWithRole, Error>;
}
