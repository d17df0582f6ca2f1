//! Temporary canonical and bridging databases with migrations applied.
//!
//! Both schemas are applied through the crate's own embedded migration sets,
//! so the adapters are tested against exactly what production runs.

use diesel::Connection;
use diesel::connection::SimpleConnection;
use diesel::pg::PgConnection;
use glucose_backend::outbound::persistence::{DbPool, PoolConfig, Store, run_migrations};
use pg_embedded_setup_unpriv::{ClusterHandle, TemporaryDatabase};
use tokio::runtime::Runtime;

/// Pools over one canonical and one bridging database.
///
/// The temporary databases are dropped with this value.
pub struct MigratedDatabases {
    pub canonical: DbPool,
    pub bridging: DbPool,
    pub canonical_url: String,
    _canonical_db: TemporaryDatabase,
    _bridging_db: TemporaryDatabase,
}

impl MigratedDatabases {
    /// Run raw SQL against the canonical database outside any pool.
    pub fn execute_canonical(&self, sql: &str) -> Result<(), String> {
        let mut conn = PgConnection::establish(&self.canonical_url).map_err(|err| err.to_string())?;
        conn.batch_execute(sql).map_err(|err| err.to_string())
    }
}

fn migrated_pool(
    runtime: &Runtime,
    database: &TemporaryDatabase,
    store: Store,
) -> Result<DbPool, String> {
    let url = database.url().to_owned();
    runtime
        .block_on(run_migrations(store, url.clone()))
        .map_err(|err| err.to_string())?;
    runtime
        .block_on(DbPool::new(
            PoolConfig::new(url).with_max_size(4).with_min_idle(Some(1)),
        ))
        .map_err(|err| err.to_string())
}

/// Create and migrate a fresh pair of databases on `cluster`.
pub fn provision_databases(
    runtime: &Runtime,
    cluster: &ClusterHandle,
) -> Result<MigratedDatabases, String> {
    let canonical_db = cluster
        .temporary_database(format!("canonical_{}", uuid::Uuid::new_v4().simple()))
        .map_err(|err| format!("create canonical database: {err:?}"))?;
    let bridging_db = cluster
        .temporary_database(format!("bridging_{}", uuid::Uuid::new_v4().simple()))
        .map_err(|err| format!("create bridging database: {err:?}"))?;

    let canonical = migrated_pool(runtime, &canonical_db, Store::Canonical)?;
    let bridging = migrated_pool(runtime, &bridging_db, Store::Bridging)?;

    Ok(MigratedDatabases {
        canonical,
        bridging,
        canonical_url: canonical_db.url().to_owned(),
        _canonical_db: canonical_db,
        _bridging_db: bridging_db,
    })
}
