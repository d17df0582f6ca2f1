//! PostgreSQL-backed `UserRepository` implementation using Diesel ORM.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel::upsert::excluded;
use diesel_async::AsyncConnection as _;
use diesel_async::RunQueryDsl;
use diesel_async::scoped_futures::ScopedFutureExt as _;

use crate::domain::ports::{UserRepository, UserRepositoryError};
use crate::domain::{NewUser, Role, RoleId, UserAccount, UserId, UserProfile};

use super::error_mapping::{DieselFailure, classify, map_basic_pool_error};
use super::models::{NewUserRow, RoleRow, UserRow};
use super::pool::{DbPool, PoolError};
use super::schema::{roles, user_roles, users};

/// Diesel-backed implementation of the `UserRepository` port.
#[derive(Clone)]
pub struct DieselUserRepository {
    pool: DbPool,
}

impl DieselUserRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> UserRepositoryError {
    map_basic_pool_error(error, UserRepositoryError::connection)
}

fn map_diesel_error(error: &diesel::result::Error) -> UserRepositoryError {
    match classify(error) {
        DieselFailure::Connection => UserRepositoryError::connection("database connection error"),
        DieselFailure::UniqueViolation(constraint) => UserRepositoryError::duplicate(constraint),
        DieselFailure::ForeignKeyViolation(constraint) => {
            UserRepositoryError::missing_reference(constraint)
        }
        DieselFailure::Query(message) => UserRepositoryError::query(message),
    }
}

#[async_trait]
impl UserRepository for DieselUserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserAccount>, UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<UserRow> = users::table
            .filter(users::email.eq(email))
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(|err| map_diesel_error(&err))?;
        Ok(row.map(UserAccount::from))
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<UserAccount>, UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<UserRow> = users::table
            .find(id.get())
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(|err| map_diesel_error(&err))?;
        Ok(row.map(UserAccount::from))
    }

    async fn list(&self) -> Result<Vec<UserProfile>, UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<UserRow> = users::table
            .order(users::id.asc())
            .select(UserRow::as_select())
            .load(&mut conn)
            .await
            .map_err(|err| map_diesel_error(&err))?;
        Ok(rows.into_iter().map(UserProfile::from).collect())
    }

    async fn create_with_role(
        &self,
        user: &NewUser,
        role: RoleId,
    ) -> Result<UserAccount, UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let new_row = NewUserRow {
            name: &user.name,
            email: &user.email,
            password_hash: &user.password_hash,
        };

        // The account and its role land together or not at all.
        let row = conn
            .transaction::<_, diesel::result::Error, _>(|conn| {
                async move {
                    let row: UserRow = diesel::insert_into(users::table)
                        .values(&new_row)
                        .returning(UserRow::as_returning())
                        .get_result(conn)
                        .await?;
                    diesel::insert_into(user_roles::table)
                        .values((
                            user_roles::user_id.eq(row.id),
                            user_roles::role_id.eq(role.get()),
                        ))
                        .execute(conn)
                        .await?;
                    Ok(row)
                }
                .scope_boxed()
            })
            .await
            .map_err(|err| map_diesel_error(&err))?;
        Ok(UserAccount::from(row))
    }

    async fn role_of(&self, id: UserId) -> Result<Option<RoleId>, UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let role: Option<i64> = user_roles::table
            .filter(user_roles::user_id.eq(id.get()))
            .select(user_roles::role_id)
            .first(&mut conn)
            .await
            .optional()
            .map_err(|err| map_diesel_error(&err))?;
        Ok(role.map(RoleId::new))
    }

    async fn roles_of(&self, id: UserId) -> Result<Vec<Role>, UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<RoleRow> = user_roles::table
            .inner_join(roles::table)
            .filter(user_roles::user_id.eq(id.get()))
            .order(roles::id.asc())
            .select(RoleRow::as_select())
            .load(&mut conn)
            .await
            .map_err(|err| map_diesel_error(&err))?;
        Ok(rows.into_iter().map(Role::from).collect())
    }

    async fn assign_role(&self, id: UserId, role: RoleId) -> Result<(), UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(user_roles::table)
            .values((
                user_roles::user_id.eq(id.get()),
                user_roles::role_id.eq(role.get()),
            ))
            .on_conflict(user_roles::user_id)
            .do_update()
            .set(user_roles::role_id.eq(excluded(user_roles::role_id)))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(|err| map_diesel_error(&err))
    }

    async fn update_role(&self, id: UserId, role: RoleId) -> Result<bool, UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let affected = diesel::update(user_roles::table.filter(user_roles::user_id.eq(id.get())))
            .set(user_roles::role_id.eq(role.get()))
            .execute(&mut conn)
            .await
            .map_err(|err| map_diesel_error(&err))?;
        Ok(affected > 0)
    }
}
