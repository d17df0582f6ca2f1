//! Port abstraction for user persistence adapters and their errors.
use async_trait::async_trait;

use crate::domain::{NewUser, Role, RoleId, UserAccount, UserId, UserProfile};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by user repository adapters.
    pub enum UserRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "user repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "user repository query failed: {message}",
        /// A unique constraint rejected the write.
        Duplicate { message: String } => "user repository duplicate key: {message}",
        /// A referenced user or role does not exist.
        MissingReference { message: String } => "user repository missing reference: {message}",
    }
}

/// Users and their single active role assignment.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Fetch a user by exact email.
    async fn find_by_email(&self, email: &str) -> Result<Option<UserAccount>, UserRepositoryError>;

    /// Fetch a user by identifier.
    async fn find_by_id(&self, id: UserId) -> Result<Option<UserAccount>, UserRepositoryError>;

    /// All users ordered by id.
    async fn list(&self) -> Result<Vec<UserProfile>, UserRepositoryError>;

    /// Insert the user and its role assignment in one transaction.
    ///
    /// Returns [`UserRepositoryError::Duplicate`] when the email is taken.
    async fn create_with_role(
        &self,
        user: &NewUser,
        role: RoleId,
    ) -> Result<UserAccount, UserRepositoryError>;

    /// The user's active role, if assigned.
    async fn role_of(&self, id: UserId) -> Result<Option<RoleId>, UserRepositoryError>;

    /// Role records assigned to the user.
    async fn roles_of(&self, id: UserId) -> Result<Vec<Role>, UserRepositoryError>;

    /// Set the user's role, replacing any existing assignment.
    async fn assign_role(&self, id: UserId, role: RoleId) -> Result<(), UserRepositoryError>;

    /// Change an existing assignment; returns `false` when none exists.
    async fn update_role(&self, id: UserId, role: RoleId) -> Result<bool, UserRepositoryError>;
}
