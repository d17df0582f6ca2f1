//! PostgreSQL sink for request activity records.

use async_trait::async_trait;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{ActivityLogError, ActivityLogRepository, ActivityRecord};

use super::error_mapping::{map_basic_diesel_error, map_basic_pool_error};
use super::models::NewActivityLogRow;
use super::pool::DbPool;
use super::schema::activity_logs;

/// Diesel-backed implementation of the `ActivityLogRepository` port.
#[derive(Clone)]
pub struct DieselActivityLogRepository {
    pool: DbPool,
}

impl DieselActivityLogRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ActivityLogRepository for DieselActivityLogRepository {
    async fn record(&self, entry: &ActivityRecord) -> Result<(), ActivityLogError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_basic_pool_error(err, ActivityLogError::connection))?;
        let row = NewActivityLogRow {
            user_id: entry.user_id.map(|id| id.get()),
            name: entry.name.as_deref(),
            method: &entry.method,
            endpoint: &entry.endpoint,
            request_body: entry.request_body.as_ref(),
            ip_address: entry.ip_address.as_deref(),
            status_code: i32::from(entry.status_code),
            user_agent: entry.user_agent.as_deref(),
            created_at: entry.created_at,
        };
        diesel::insert_into(activity_logs::table)
            .values(&row)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(|err| {
                map_basic_diesel_error(&err, ActivityLogError::write, ActivityLogError::connection)
            })
    }
}
