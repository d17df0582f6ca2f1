//! Port for the partner-facing bridging store.
//!
//! The store's primary key is the canonical test id, which makes it the
//! idempotency key of the mirror: a second insert for the same id must fail
//! with [`BridgingRepositoryError::Duplicate`] and write nothing.

use async_trait::async_trait;
use pagination::PageRequest;

use crate::domain::{BridgingSnapshot, GlucoseTestId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by bridging store adapters.
    pub enum BridgingRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "bridging repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "bridging repository query failed: {message}",
        /// A row with this id is already mirrored.
        Duplicate { message: String } => "bridging repository duplicate key: {message}",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BridgingRepository: Send + Sync {
    async fn insert(&self, snapshot: &BridgingSnapshot) -> Result<(), BridgingRepositoryError>;

    /// The subset of `ids` already present in the store.
    async fn existing_ids(
        &self,
        ids: &[GlucoseTestId],
    ) -> Result<Vec<GlucoseTestId>, BridgingRepositoryError>;

    /// Delete every row then insert `snapshots`, in one transaction.
    async fn replace_all(&self, snapshots: &[BridgingSnapshot])
    -> Result<u64, BridgingRepositoryError>;

    /// One page ordered by id descending, plus the total row count.
    async fn list(
        &self,
        page: PageRequest,
    ) -> Result<(Vec<BridgingSnapshot>, u64), BridgingRepositoryError>;

    async fn find(
        &self,
        id: GlucoseTestId,
    ) -> Result<Option<BridgingSnapshot>, BridgingRepositoryError>;
}
