//! Validate-then-mirror workflow and the partner read surface.
//!
//! `validate` flips the canonical row with a single conditional update and
//! then inserts the bridging snapshot keyed by the test id. The bridging
//! primary key makes the mirror at-most-once; a failed insert after the flip
//! is repaired by calling `validate` again or by [`ValidationCommand::reconcile`].

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use pagination::{Page, PageRequest};
use tracing::{info, warn};

use crate::domain::glucose_service::map_test_error;
use crate::domain::ports::{
    BridgingQuery, BridgingRepository, BridgingRepositoryError, GlucoseTestRepository,
    ValidationCommand,
};
use crate::domain::{
    BridgingSnapshot, Error, GlucoseTestId, ReconcileReport, SyncReport, ValidationOutcome,
    already_bridged, mirror_pending,
};

fn map_bridging_error(error: BridgingRepositoryError) -> Error {
    match error {
        BridgingRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("bridging store unavailable: {message}"))
        }
        BridgingRepositoryError::Query { message } => {
            Error::internal(format!("bridging store error: {message}"))
        }
        BridgingRepositoryError::Duplicate { message } => {
            Error::conflict(format!("bridging row already exists: {message}"))
        }
    }
}

/// Implements [`ValidationCommand`] across the canonical and bridging stores.
#[derive(Clone)]
pub struct ValidationEngine<G, B> {
    tests: Arc<G>,
    bridging: Arc<B>,
}

impl<G, B> ValidationEngine<G, B> {
    /// Pair the canonical test store with the bridging mirror.
    pub fn new(tests: Arc<G>, bridging: Arc<B>) -> Self {
        Self { tests, bridging }
    }
}

#[async_trait]
impl<G, B> ValidationCommand for ValidationEngine<G, B>
where
    G: GlucoseTestRepository,
    B: BridgingRepository,
{
    async fn validate(
        &self,
        id: GlucoseTestId,
        validator: &str,
    ) -> Result<ValidationOutcome, Error> {
        let data_not_found = || Error::not_found("Data not found");
        self.tests
            .find(id)
            .await
            .map_err(map_test_error)?
            .ok_or_else(data_not_found)?;

        let flipped = self
            .tests
            .mark_validated(id, validator)
            .await
            .map_err(map_test_error)?;

        // Re-read so the snapshot carries the validator that actually won.
        let detail = self
            .tests
            .find(id)
            .await
            .map_err(map_test_error)?
            .ok_or_else(data_not_found)?;
        if !detail.test.validation.is_validated() {
            return Err(Error::internal(format!(
                "glucose test {id} did not transition to validated"
            )));
        }
        let user_validation = detail
            .test
            .validated_by
            .clone()
            .unwrap_or_else(|| validator.to_owned());

        match self.bridging.insert(&detail.test.to_bridging()).await {
            Ok(()) => {
                info!(test_id = %id, flipped, "glucose test validated and bridged");
                Ok(ValidationOutcome {
                    user_validation,
                    flipped,
                    test: detail,
                })
            }
            Err(BridgingRepositoryError::Duplicate { .. }) => {
                info!(test_id = %id, "glucose test already bridged");
                Err(already_bridged(id))
            }
            Err(err) => {
                warn!(test_id = %id, error = %err, "mirror insert failed; row left for reconciliation");
                Err(mirror_pending(id, &user_validation))
            }
        }
    }

    async fn reconcile(&self) -> Result<ReconcileReport, Error> {
        let snapshots = self
            .tests
            .validated_snapshots()
            .await
            .map_err(map_test_error)?;
        let ids: Vec<GlucoseTestId> = snapshots.iter().map(|snapshot| snapshot.id).collect();
        let existing: BTreeSet<GlucoseTestId> = self
            .bridging
            .existing_ids(&ids)
            .await
            .map_err(map_bridging_error)?
            .into_iter()
            .collect();

        let mut report = ReconcileReport {
            scanned: snapshots.len() as u64,
            ..ReconcileReport::default()
        };
        for snapshot in snapshots {
            if existing.contains(&snapshot.id) {
                report.already_present += 1;
                continue;
            }
            match self.bridging.insert(&snapshot).await {
                Ok(()) => report.repaired += 1,
                Err(BridgingRepositoryError::Duplicate { .. }) => report.already_present += 1,
                Err(err) => {
                    warn!(test_id = %snapshot.id, error = %err, "reconcile insert failed");
                    report.failed += 1;
                }
            }
        }
        info!(
            scanned = report.scanned,
            repaired = report.repaired,
            already_present = report.already_present,
            failed = report.failed,
            "bridging reconciliation finished"
        );
        Ok(report)
    }

    async fn sync_all(&self) -> Result<SyncReport, Error> {
        let snapshots = self
            .tests
            .validated_snapshots()
            .await
            .map_err(map_test_error)?;
        let mirrored = self
            .bridging
            .replace_all(&snapshots)
            .await
            .map_err(map_bridging_error)?;
        info!(mirrored, "bridging store rebuilt");
        Ok(SyncReport { mirrored })
    }
}

/// Implements [`BridgingQuery`] over the bridging store.
#[derive(Clone)]
pub struct BridgingReadService<B> {
    bridging: Arc<B>,
}

impl<B> BridgingReadService<B> {
    /// Read-only view over the bridging mirror.
    pub fn new(bridging: Arc<B>) -> Self {
        Self { bridging }
    }
}

#[async_trait]
impl<B> BridgingQuery for BridgingReadService<B>
where
    B: BridgingRepository,
{
    async fn list(&self, page: PageRequest) -> Result<Page<BridgingSnapshot>, Error> {
        let (items, total) = self.bridging.list(page).await.map_err(map_bridging_error)?;
        Ok(Page::new(items, page, total))
    }

    async fn get(&self, id: GlucoseTestId) -> Result<BridgingSnapshot, Error> {
        self.bridging
            .find(id)
            .await
            .map_err(map_bridging_error)?
            .ok_or_else(|| Error::not_found("Test data not found"))
    }
}

#[cfg(test)]
mod tests;
