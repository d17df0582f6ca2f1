//! Password authentication and self-registration.
//!
//! Implements [`AuthService`]. Password hashing and verification run on the
//! blocking pool so bcrypt never stalls the async workers.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::domain::ports::{AuthService, LoginOutcome, UserRepository, UserRepositoryError, UserWithRole};
use crate::domain::{
    Error, LoginCredentials, NewUser, Registration, RoleId, SessionClaims, SessionTokens,
};

/// Role given to self-registered users.
pub const DEFAULT_ROLE_ID: i64 = 3;
/// bcrypt cost for newly stored password hashes.
pub const HASH_COST: u32 = 10;

/// [`AuthService`] backed by a [`UserRepository`] and bcrypt hashes.
#[derive(Clone)]
pub struct PasswordAuthService<U> {
    users: Arc<U>,
    tokens: SessionTokens,
    default_role: RoleId,
    hash_cost: u32,
}

impl<U> PasswordAuthService<U> {
    /// Build the service with [`DEFAULT_ROLE_ID`] and [`HASH_COST`].
    pub fn new(users: Arc<U>, tokens: SessionTokens) -> Self {
        Self {
            users,
            tokens,
            default_role: RoleId::new(DEFAULT_ROLE_ID),
            hash_cost: HASH_COST,
        }
    }

    /// Override the role assigned on registration.
    #[must_use]
    pub fn with_default_role(mut self, role: RoleId) -> Self {
        self.default_role = role;
        self
    }

    /// Override the bcrypt cost.
    #[must_use]
    pub fn with_hash_cost(mut self, cost: u32) -> Self {
        self.hash_cost = cost;
        self
    }
}

pub(crate) fn map_user_error(error: UserRepositoryError) -> Error {
    match error {
        UserRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("user repository unavailable: {message}"))
        }
        UserRepositoryError::Query { message } => {
            Error::internal(format!("user repository error: {message}"))
        }
        UserRepositoryError::Duplicate { .. } => Error::conflict("Email already registered"),
        UserRepositoryError::MissingReference { message } => {
            Error::internal(format!("default role is not configured: {message}"))
        }
    }
}

async fn hash_password(password: String, cost: u32) -> Result<String, Error> {
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|err| Error::internal(format!("password hashing task failed: {err}")))?
        .map_err(|err| Error::internal(format!("password hashing failed: {err}")))
}

async fn verify_password(password: String, hash: String) -> Result<bool, Error> {
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|err| Error::internal(format!("password check task failed: {err}")))?
        .map_err(|err| Error::internal(format!("stored password hash is unreadable: {err}")))
}

#[async_trait]
impl<U> AuthService for PasswordAuthService<U>
where
    U: UserRepository + 'static,
{
    async fn login(&self, credentials: &LoginCredentials) -> Result<LoginOutcome, Error> {
        let account = self
            .users
            .find_by_email(credentials.email())
            .await
            .map_err(map_user_error)?
            .ok_or_else(|| Error::not_found("User not found"))?;

        let matches = verify_password(
            credentials.password().to_owned(),
            account.password_hash.clone(),
        )
        .await?;
        if !matches {
            debug!(user_id = %account.id, "password mismatch");
            return Err(Error::unauthorized("Invalid credentials"));
        }

        let role_id = self
            .users
            .role_of(account.id)
            .await
            .map_err(map_user_error)?
            .ok_or_else(|| Error::not_found("User role not found"))?;

        let user = account.profile();
        let token = self.tokens.issue(&user, role_id)?;
        info!(user_id = %user.id, role_id = %role_id, "login succeeded");
        Ok(LoginOutcome {
            user: UserWithRole { user, role_id },
            token,
        })
    }

    async fn register(&self, registration: &Registration) -> Result<UserWithRole, Error> {
        let password_hash =
            hash_password(registration.password().to_owned(), self.hash_cost).await?;
        let new_user = NewUser {
            name: registration.name().to_owned(),
            email: registration.email().to_owned(),
            password_hash,
        };
        let account = self
            .users
            .create_with_role(&new_user, self.default_role)
            .await
            .map_err(map_user_error)?;
        info!(user_id = %account.id, "user registered");
        Ok(UserWithRole {
            user: account.profile(),
            role_id: self.default_role,
        })
    }

    async fn current_user(&self, claims: &SessionClaims) -> Result<UserWithRole, Error> {
        let account = self
            .users
            .find_by_id(claims.user_id())
            .await
            .map_err(map_user_error)?
            .ok_or_else(|| Error::not_found("User not found"))?;
        Ok(UserWithRole {
            user: account.profile(),
            role_id: claims.role_id(),
        })
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use crate::domain::ports::MockUserRepository;
    use crate::domain::{ErrorCode, UserAccount, UserId};
    use mockable::DefaultClock;
    use rstest::{fixture, rstest};

    const TEST_COST: u32 = 4;

    #[fixture]
    fn tokens() -> SessionTokens {
        SessionTokens::new(b"test-secret", 3600, Arc::new(DefaultClock))
    }

    fn account(password: &str) -> UserAccount {
        UserAccount {
            id: UserId::new(7),
            name: "Siti Rahma".into(),
            email: "siti@example.com".into(),
            password_hash: bcrypt::hash(password, TEST_COST).expect("hash"),
        }
    }

    fn service(repo: MockUserRepository, tokens: SessionTokens) -> PasswordAuthService<MockUserRepository> {
        PasswordAuthService::new(Arc::new(repo), tokens).with_hash_cost(TEST_COST)
    }

    fn creds(password: &str) -> LoginCredentials {
        LoginCredentials::try_from_parts("siti@example.com", password).expect("valid creds")
    }

    #[rstest]
    #[tokio::test]
    async fn login_issues_token_carrying_role(tokens: SessionTokens) {
        let mut repo = MockUserRepository::new();
        let stored = account("secret1");
        repo.expect_find_by_email()
            .times(1)
            .return_once(move |_| Ok(Some(stored)));
        repo.expect_role_of()
            .times(1)
            .return_once(|_| Ok(Some(RoleId::new(2))));

        let outcome = service(repo, tokens.clone())
            .login(&creds("secret1"))
            .await
            .expect("login succeeds");
        assert_eq!(outcome.user.role_id, RoleId::new(2));
        let claims = tokens.verify(&outcome.token).expect("token verifies");
        assert_eq!(claims.sub, 7);
        assert_eq!(claims.rid, 2);
        assert_eq!(claims.em, "si");
    }

    #[rstest]
    #[tokio::test]
    async fn wrong_password_is_unauthorized_and_skips_role_lookup(tokens: SessionTokens) {
        let mut repo = MockUserRepository::new();
        let stored = account("secret1");
        repo.expect_find_by_email()
            .times(1)
            .return_once(move |_| Ok(Some(stored)));
        repo.expect_role_of().times(0);

        let err = service(repo, tokens)
            .login(&creds("wrong-pass"))
            .await
            .expect_err("rejected");
        assert_eq!(err.code(), ErrorCode::Unauthorized);
        assert_eq!(err.message(), "Invalid credentials");
    }

    #[rstest]
    #[tokio::test]
    async fn unknown_email_is_not_found(tokens: SessionTokens) {
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_email().times(1).return_once(|_| Ok(None));

        let err = service(repo, tokens)
            .login(&creds("secret1"))
            .await
            .expect_err("missing user");
        assert_eq!(err.code(), ErrorCode::NotFound);
        assert_eq!(err.message(), "User not found");
    }

    #[rstest]
    #[tokio::test]
    async fn user_without_role_cannot_log_in(tokens: SessionTokens) {
        let mut repo = MockUserRepository::new();
        let stored = account("secret1");
        repo.expect_find_by_email()
            .times(1)
            .return_once(move |_| Ok(Some(stored)));
        repo.expect_role_of().times(1).return_once(|_| Ok(None));

        let err = service(repo, tokens)
            .login(&creds("secret1"))
            .await
            .expect_err("no role");
        assert_eq!(err.message(), "User role not found");
    }

    #[rstest]
    #[tokio::test]
    async fn register_hashes_password_and_assigns_default_role(tokens: SessionTokens) {
        let mut repo = MockUserRepository::new();
        repo.expect_create_with_role()
            .withf(|user, role| {
                *role == RoleId::new(DEFAULT_ROLE_ID)
                    && user.password_hash != "secret1"
                    && bcrypt::verify("secret1", &user.password_hash).unwrap_or(false)
            })
            .times(1)
            .return_once(|user, _| {
                Ok(UserAccount {
                    id: UserId::new(12),
                    name: user.name.clone(),
                    email: user.email.clone(),
                    password_hash: user.password_hash.clone(),
                })
            });

        let registration =
            Registration::try_from_parts("Budi", "budi@example.com", "secret1").expect("valid");
        let created = service(repo, tokens)
            .register(&registration)
            .await
            .expect("registered");
        assert_eq!(created.user.id, UserId::new(12));
        assert_eq!(created.role_id, RoleId::new(3));
    }

    #[rstest]
    #[tokio::test]
    async fn stored_hashes_use_cost_ten_by_default(tokens: SessionTokens) {
        let mut repo = MockUserRepository::new();
        repo.expect_create_with_role()
            .withf(|user, _| user.password_hash.starts_with("$2b$10$"))
            .times(1)
            .return_once(|user, _| {
                Ok(UserAccount {
                    id: UserId::new(13),
                    name: user.name.clone(),
                    email: user.email.clone(),
                    password_hash: user.password_hash.clone(),
                })
            });

        let registration =
            Registration::try_from_parts("Budi", "budi@example.com", "secret1").expect("valid");
        PasswordAuthService::new(Arc::new(repo), tokens)
            .register(&registration)
            .await
            .expect("registered with the default cost");
    }

    #[rstest]
    #[tokio::test]
    async fn duplicate_email_is_conflict(tokens: SessionTokens) {
        let mut repo = MockUserRepository::new();
        repo.expect_create_with_role()
            .times(1)
            .return_once(|_, _| Err(UserRepositoryError::duplicate("users_email_key")));

        let registration =
            Registration::try_from_parts("Budi", "budi@example.com", "secret1").expect("valid");
        let err = service(repo, tokens)
            .register(&registration)
            .await
            .expect_err("duplicate");
        assert_eq!(err.code(), ErrorCode::Conflict);
        assert_eq!(err.message(), "Email already registered");
    }

    #[rstest]
    #[tokio::test]
    async fn connection_failures_are_service_unavailable(tokens: SessionTokens) {
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_id()
            .times(1)
            .return_once(|_| Err(UserRepositoryError::connection("pool exhausted")));
        let claims = tokens
            .verify(
                &tokens
                    .issue(&account("secret1").profile(), RoleId::new(1))
                    .expect("issued"),
            )
            .expect("verifies");

        let err = service(repo, tokens)
            .current_user(&claims)
            .await
            .expect_err("unavailable");
        assert_eq!(err.code(), ErrorCode::ServiceUnavailable);
    }
}
