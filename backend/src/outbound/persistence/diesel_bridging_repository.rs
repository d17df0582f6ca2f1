//! PostgreSQL-backed bridging mirror.
//!
//! Writes go to a separate database whose `glucosa_test.id` primary key is
//! the canonical test id, so a second insert of the same row surfaces as
//! [`BridgingRepositoryError::Duplicate`] rather than a second copy.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::AsyncConnection as _;
use diesel_async::RunQueryDsl;
use diesel_async::scoped_futures::ScopedFutureExt as _;
use pagination::PageRequest;

use crate::domain::ports::{BridgingRepository, BridgingRepositoryError};
use crate::domain::{BridgingSnapshot, GlucoseTestId};

use super::bridging_schema::glucosa_test;
use super::error_mapping::{DieselFailure, classify, map_basic_pool_error};
use super::models::BridgingRow;
use super::pool::{DbPool, PoolError};

/// Rows per multi-row insert during a full resync.
const INSERT_CHUNK: usize = 500;

/// Diesel-backed implementation of the `BridgingRepository` port.
#[derive(Clone)]
pub struct DieselBridgingRepository {
    pool: DbPool,
}

impl DieselBridgingRepository {
    /// Create a repository over the bridging database pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> BridgingRepositoryError {
    map_basic_pool_error(error, BridgingRepositoryError::connection)
}

fn map_diesel_error(error: &diesel::result::Error) -> BridgingRepositoryError {
    match classify(error) {
        DieselFailure::Connection => BridgingRepositoryError::connection("database connection error"),
        DieselFailure::UniqueViolation(constraint) => BridgingRepositoryError::duplicate(constraint),
        DieselFailure::ForeignKeyViolation(constraint) => {
            BridgingRepositoryError::query(format!("foreign key violation on {constraint}"))
        }
        DieselFailure::Query(message) => BridgingRepositoryError::query(message),
    }
}

fn decode(row: BridgingRow) -> Result<BridgingSnapshot, BridgingRepositoryError> {
    let id = row.id;
    BridgingSnapshot::try_from(row)
        .map_err(|err| BridgingRepositoryError::query(format!("bridging row {id} is malformed: {err}")))
}

#[async_trait]
impl BridgingRepository for DieselBridgingRepository {
    async fn insert(&self, snapshot: &BridgingSnapshot) -> Result<(), BridgingRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(glucosa_test::table)
            .values(BridgingRow::from(snapshot))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(|err| map_diesel_error(&err))
    }

    async fn existing_ids(
        &self,
        ids: &[GlucoseTestId],
    ) -> Result<Vec<GlucoseTestId>, BridgingRepositoryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let raw: Vec<i64> = ids.iter().map(|id| id.get()).collect();
        let found: Vec<i64> = glucosa_test::table
            .filter(glucosa_test::id.eq_any(raw))
            .select(glucosa_test::id)
            .order(glucosa_test::id.asc())
            .load(&mut conn)
            .await
            .map_err(|err| map_diesel_error(&err))?;
        Ok(found.into_iter().map(GlucoseTestId::new).collect())
    }

    async fn replace_all(
        &self,
        snapshots: &[BridgingSnapshot],
    ) -> Result<u64, BridgingRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<BridgingRow> = snapshots.iter().map(BridgingRow::from).collect();

        // Readers never observe a half-populated mirror.
        let inserted = conn
            .transaction::<_, diesel::result::Error, _>(|conn| {
                async move {
                    diesel::delete(glucosa_test::table).execute(conn).await?;
                    let mut inserted = 0_usize;
                    for chunk in rows.chunks(INSERT_CHUNK) {
                        inserted += diesel::insert_into(glucosa_test::table)
                            .values(chunk)
                            .execute(conn)
                            .await?;
                    }
                    Ok(inserted)
                }
                .scope_boxed()
            })
            .await
            .map_err(|err| map_diesel_error(&err))?;
        Ok(u64::try_from(inserted).unwrap_or(u64::MAX))
    }

    async fn list(
        &self,
        page: PageRequest,
    ) -> Result<(Vec<BridgingSnapshot>, u64), BridgingRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let total: i64 = glucosa_test::table
            .count()
            .get_result(&mut conn)
            .await
            .map_err(|err| map_diesel_error(&err))?;
        let rows: Vec<BridgingRow> = glucosa_test::table
            .order(glucosa_test::id.desc())
            .limit(i64::from(page.limit()))
            .offset(i64::try_from(page.offset()).unwrap_or(i64::MAX))
            .select(BridgingRow::as_select())
            .load(&mut conn)
            .await
            .map_err(|err| map_diesel_error(&err))?;
        let snapshots = rows
            .into_iter()
            .map(decode)
            .collect::<Result<Vec<_>, _>>()?;
        Ok((snapshots, u64::try_from(total).unwrap_or_default()))
    }

    async fn find(
        &self,
        id: GlucoseTestId,
    ) -> Result<Option<BridgingSnapshot>, BridgingRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<BridgingRow> = glucosa_test::table
            .find(id.get())
            .select(BridgingRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(|err| map_diesel_error(&err))?;
        row.map(decode).transpose()
    }
}
