//! Embedded schema migrations for both databases.
//!
//! Migrations run once at startup on a blocking thread with a synchronous
//! `PgConnection`; the async pools are built afterwards.

use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use tracing::info;

const CANONICAL_MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");
const BRIDGING_MIGRATIONS: EmbeddedMigrations = embed_migrations!("bridging_migrations");

/// Which database a migration set belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Store {
    /// Users, registry, patients and glucose tests.
    Canonical,
    /// The partner-facing `glucosa_test` mirror.
    Bridging,
}

impl Store {
    fn migrations(self) -> EmbeddedMigrations {
        match self {
            Self::Canonical => CANONICAL_MIGRATIONS,
            Self::Bridging => BRIDGING_MIGRATIONS,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Canonical => "canonical",
            Self::Bridging => "bridging",
        }
    }
}

/// Errors raised while applying migrations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MigrationError {
    /// The synchronous migration connection could not be opened.
    #[error("failed to connect to the {store} database: {message}")]
    Connect { store: &'static str, message: String },
    /// A migration failed to apply.
    #[error("failed to migrate the {store} database: {message}")]
    Apply { store: &'static str, message: String },
    /// The blocking migration task did not complete.
    #[error("migration task for the {store} database aborted: {message}")]
    Task { store: &'static str, message: String },
}

fn apply(store: Store, database_url: &str) -> Result<usize, MigrationError> {
    let mut conn = PgConnection::establish(database_url).map_err(|err| MigrationError::Connect {
        store: store.label(),
        message: err.to_string(),
    })?;
    let applied = conn
        .run_pending_migrations(store.migrations())
        .map_err(|err| MigrationError::Apply {
            store: store.label(),
            message: err.to_string(),
        })?;
    Ok(applied.len())
}

/// Apply pending migrations for `store` and return how many ran.
///
/// # Errors
///
/// Returns [`MigrationError`] when the database is unreachable or a
/// migration fails.
pub async fn run_migrations(store: Store, database_url: String) -> Result<usize, MigrationError> {
    let applied = tokio::task::spawn_blocking(move || apply(store, &database_url))
        .await
        .map_err(|err| MigrationError::Task {
            store: store.label(),
            message: err.to_string(),
        })??;
    info!(store = store.label(), applied, "database migrations applied");
    Ok(applied)
}
