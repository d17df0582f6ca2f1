//! Shared helpers for the adapter integration tests.

pub mod cluster_skip;
pub mod databases;

pub use cluster_skip::handle_cluster_setup_failure;
pub use databases::{MigratedDatabases, provision_databases};
