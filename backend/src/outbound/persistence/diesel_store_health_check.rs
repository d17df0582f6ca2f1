//! `SELECT 1` liveness check for a database pool.

use async_trait::async_trait;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{StoreHealthCheck, StoreHealthCheckError};

use super::error_mapping::{map_basic_diesel_error, map_basic_pool_error};
use super::pool::DbPool;

/// Checks one database by checking out a connection and running `SELECT 1`.
#[derive(Clone)]
pub struct DieselStoreHealthCheck {
    pool: DbPool,
}

impl DieselStoreHealthCheck {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StoreHealthCheck for DieselStoreHealthCheck {
    async fn ping(&self) -> Result<(), StoreHealthCheckError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_basic_pool_error(err, StoreHealthCheckError::connection))?;
        diesel::sql_query("SELECT 1")
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(|err| {
                map_basic_diesel_error(&err, StoreHealthCheckError::query, StoreHealthCheckError::connection)
            })
    }
}
