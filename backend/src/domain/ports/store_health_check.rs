//! Liveness check for a backing store.
use async_trait::async_trait;

use super::define_port_error;

define_port_error! {
    /// Health check failures.
    pub enum StoreHealthCheckError {
        /// No connection could be checked out.
        Connection { message: String } => "store connection failed: {message}",
        /// The check query failed.
        Query { message: String } => "store health check query failed: {message}",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StoreHealthCheck: Send + Sync {
    /// Run `SELECT 1`.
    async fn ping(&self) -> Result<(), StoreHealthCheckError>;
}
