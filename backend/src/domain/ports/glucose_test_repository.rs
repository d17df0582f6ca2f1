//! Port for the canonical glucose test store.
//!
//! The validation flip must be a single conditional statement
//! (`... WHERE id = $1 AND is_validation = 0`) so that concurrent validators
//! converge on one winner without application-level locks.

use async_trait::async_trait;
use pagination::PageRequest;

use crate::domain::{
    BridgingSnapshot, DashboardSummary, GlucoseTest, GlucoseTestDetail, GlucoseTestFilter,
    GlucoseTestId, GlucoseTestUpdate, NewGlucoseTest, PatientId,
};

use super::define_port_error;

define_port_error! {
    /// Errors raised by glucose test repository adapters.
    pub enum GlucoseTestRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "glucose test repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "glucose test repository query failed: {message}",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GlucoseTestRepository: Send + Sync {
    /// Insert an unvalidated, unreported test.
    async fn insert(&self, test: &NewGlucoseTest) -> Result<GlucoseTest, GlucoseTestRepositoryError>;

    /// Fetch one test with patient display fields.
    async fn find(
        &self,
        id: GlucoseTestId,
    ) -> Result<Option<GlucoseTestDetail>, GlucoseTestRepositoryError>;

    /// One page of tests matching `filter`, newest first, plus the total
    /// matching row count under the same predicate.
    async fn list(
        &self,
        filter: &GlucoseTestFilter,
        page: PageRequest,
    ) -> Result<(Vec<GlucoseTestDetail>, u64), GlucoseTestRepositoryError>;

    /// Tests linked to a patient; all of them when `page` is `None`.
    async fn list_by_patient(
        &self,
        patient: PatientId,
        page: Option<PageRequest>,
    ) -> Result<(Vec<GlucoseTest>, u64), GlucoseTestRepositoryError>;

    /// Overwrite the measurement; `None` when the id does not exist.
    async fn update(
        &self,
        id: GlucoseTestId,
        update: &GlucoseTestUpdate,
    ) -> Result<Option<GlucoseTest>, GlucoseTestRepositoryError>;

    /// Returns `false` when the id does not exist.
    async fn delete(&self, id: GlucoseTestId) -> Result<bool, GlucoseTestRepositoryError>;

    /// Flip `is_validation` 0 → 1 and record the validator.
    ///
    /// Returns `true` only for the caller whose statement changed the row.
    async fn mark_validated(
        &self,
        id: GlucoseTestId,
        validator: &str,
    ) -> Result<bool, GlucoseTestRepositoryError>;

    /// Set `is_status = 1`; returns `false` when the id does not exist.
    async fn mark_reported(&self, id: GlucoseTestId) -> Result<bool, GlucoseTestRepositoryError>;

    /// Bridging projections of every validated test, ordered by id.
    async fn validated_snapshots(&self)
    -> Result<Vec<BridgingSnapshot>, GlucoseTestRepositoryError>;

    async fn summary(&self) -> Result<DashboardSummary, GlucoseTestRepositoryError>;

    /// `(month, count)` pairs for tests measured in `year`; empty months may be absent.
    async fn monthly_counts(&self, year: i32) -> Result<Vec<(u32, u64)>, GlucoseTestRepositoryError>;

    /// Every test created on the most recent day that has an unvalidated,
    /// unreported test.
    async fn latest_unreported_batch(
        &self,
    ) -> Result<Vec<GlucoseTestDetail>, GlucoseTestRepositoryError>;
}
