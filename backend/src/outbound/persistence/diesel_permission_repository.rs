//! PostgreSQL-backed permission registry.
//!
//! Resolves a user's permission names through `user_roles` and
//! `role_permissions`, and maintains the role/permission pairs.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::AsyncConnection as _;
use diesel_async::RunQueryDsl;
use diesel_async::scoped_futures::ScopedFutureExt as _;

use crate::domain::ports::{PermissionRepository, PermissionRepositoryError};
use crate::domain::{
    EffectivePermissions, Permission, PermissionDiff, PermissionId, Role, RoleId, UserId,
};

use super::error_mapping::{DieselFailure, classify, map_basic_pool_error};
use super::models::{PermissionRow, RoleRow};
use super::pool::{DbPool, PoolError};
use super::schema::{permissions, role_permissions, roles, user_roles};

/// Diesel-backed implementation of the `PermissionRepository` port.
#[derive(Clone)]
pub struct DieselPermissionRepository {
    pool: DbPool,
}

impl DieselPermissionRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> PermissionRepositoryError {
    map_basic_pool_error(error, PermissionRepositoryError::connection)
}

fn map_diesel_error(error: &diesel::result::Error) -> PermissionRepositoryError {
    match classify(error) {
        DieselFailure::Connection => {
            PermissionRepositoryError::connection("database connection error")
        }
        DieselFailure::UniqueViolation(constraint) => {
            PermissionRepositoryError::duplicate(constraint)
        }
        DieselFailure::ForeignKeyViolation(constraint) => {
            PermissionRepositoryError::missing_reference(constraint)
        }
        DieselFailure::Query(message) => PermissionRepositoryError::query(message),
    }
}

fn pair_rows(role: RoleId, ids: &[PermissionId]) -> Vec<(i64, i64)> {
    ids.iter().map(|id| (role.get(), id.get())).collect()
}

#[async_trait]
impl PermissionRepository for DieselPermissionRepository {
    async fn effective_permissions(
        &self,
        user: UserId,
    ) -> Result<EffectivePermissions, PermissionRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let names: Vec<String> = user_roles::table
            .inner_join(
                role_permissions::table.on(role_permissions::role_id.eq(user_roles::role_id)),
            )
            .inner_join(permissions::table.on(permissions::id.eq(role_permissions::permission_id)))
            .filter(user_roles::user_id.eq(user.get()))
            .select(permissions::name)
            .distinct()
            .load(&mut conn)
            .await
            .map_err(|err| map_diesel_error(&err))?;
        Ok(EffectivePermissions::from_names(names))
    }

    async fn find_role(&self, role: RoleId) -> Result<Option<Role>, PermissionRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<RoleRow> = roles::table
            .find(role.get())
            .select(RoleRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(|err| map_diesel_error(&err))?;
        Ok(row.map(Role::from))
    }

    async fn permissions_for_role(
        &self,
        role: RoleId,
    ) -> Result<Vec<Permission>, PermissionRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<PermissionRow> = role_permissions::table
            .inner_join(permissions::table)
            .filter(role_permissions::role_id.eq(role.get()))
            .order(permissions::id.asc())
            .select(PermissionRow::as_select())
            .load(&mut conn)
            .await
            .map_err(|err| map_diesel_error(&err))?;
        Ok(rows.into_iter().map(Permission::from).collect())
    }

    async fn insert_pair(
        &self,
        role: RoleId,
        permission: PermissionId,
    ) -> Result<(), PermissionRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(role_permissions::table)
            .values((
                role_permissions::role_id.eq(role.get()),
                role_permissions::permission_id.eq(permission.get()),
            ))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(|err| map_diesel_error(&err))
    }

    async fn delete_pair(
        &self,
        role: RoleId,
        permission: PermissionId,
    ) -> Result<u64, PermissionRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let affected = diesel::delete(
            role_permissions::table
                .filter(role_permissions::role_id.eq(role.get()))
                .filter(role_permissions::permission_id.eq(permission.get())),
        )
        .execute(&mut conn)
        .await
        .map_err(|err| map_diesel_error(&err))?;
        Ok(u64::try_from(affected).unwrap_or(u64::MAX))
    }

    async fn apply_diff(
        &self,
        role: RoleId,
        diff: &PermissionDiff,
    ) -> Result<(), PermissionRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let to_remove: Vec<i64> = diff.to_remove.iter().map(|id| id.get()).collect();
        let to_add = pair_rows(role, &diff.to_add);

        conn.transaction::<_, diesel::result::Error, _>(|conn| {
            async move {
                if !to_remove.is_empty() {
                    diesel::delete(
                        role_permissions::table
                            .filter(role_permissions::role_id.eq(role.get()))
                            .filter(role_permissions::permission_id.eq_any(&to_remove)),
                    )
                    .execute(conn)
                    .await?;
                }
                if !to_add.is_empty() {
                    let values: Vec<_> = to_add
                        .iter()
                        .map(|(role_id, permission_id)| {
                            (
                                role_permissions::role_id.eq(*role_id),
                                role_permissions::permission_id.eq(*permission_id),
                            )
                        })
                        .collect();
                    diesel::insert_into(role_permissions::table)
                        .values(&values)
                        .on_conflict_do_nothing()
                        .execute(conn)
                        .await?;
                }
                Ok(())
            }
            .scope_boxed()
        })
        .await
        .map_err(|err| map_diesel_error(&err))
    }
}
