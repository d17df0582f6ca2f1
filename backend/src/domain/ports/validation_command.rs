//! Driving port for the validate-then-mirror workflow.

use async_trait::async_trait;

use crate::domain::{Error, GlucoseTestId, ReconcileReport, SyncReport, ValidationOutcome};

#[async_trait]
pub trait ValidationCommand: Send + Sync {
    /// Flip the test to validated and mirror it.
    ///
    /// Fails with `Conflict` (`already_bridged`) when the mirror row exists
    /// and with `ServiceUnavailable` (`mirror_pending`) when the flip
    /// succeeded but the mirror insert did not.
    async fn validate(&self, id: GlucoseTestId, validator: &str)
    -> Result<ValidationOutcome, Error>;

    /// Insert mirror rows for validated tests that lack one.
    async fn reconcile(&self) -> Result<ReconcileReport, Error>;

    /// Rebuild the mirror from every validated test.
    async fn sync_all(&self) -> Result<SyncReport, Error>;
}
