//! Periodic bridging reconciliation.
//!
//! Replays mirror inserts for validated tests that never reached the
//! bridging database. Failures are logged and the loop keeps running.

use std::sync::Arc;
use std::time::Duration;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use glucose_backend::domain::ports::ValidationCommand;

/// Upper bound of the random delay before the first sweep, so replicas
/// started together do not sweep in lockstep.
const MAX_START_JITTER_SECS: u64 = 30;

fn start_jitter(interval: Duration) -> Duration {
    let cap = MAX_START_JITTER_SECS.min(interval.as_secs());
    if cap == 0 {
        return Duration::ZERO;
    }
    let mut rng = SmallRng::from_entropy();
    Duration::from_secs(rng.gen_range(0..=cap))
}

/// Run one reconciliation sweep and log its outcome.
pub(crate) async fn sweep(validation: &dyn ValidationCommand) {
    match validation.reconcile().await {
        Ok(report) if report.repaired > 0 || report.failed > 0 => info!(
            scanned = report.scanned,
            repaired = report.repaired,
            already_present = report.already_present,
            failed = report.failed,
            "bridging reconciliation finished"
        ),
        Ok(report) => debug!(scanned = report.scanned, "bridging mirror up to date"),
        Err(error) => warn!(%error, "bridging reconciliation failed"),
    }
}

/// Spawn the reconciliation loop on the tokio runtime.
pub(crate) fn spawn(validation: Arc<dyn ValidationCommand>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::time::sleep(start_jitter(interval)).await;
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        info!(interval_secs = interval.as_secs(), "bridging reconciliation scheduled");
        loop {
            ticker.tick().await;
            sweep(validation.as_ref()).await;
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    use async_trait::async_trait;
    use glucose_backend::domain::{
        Error, GlucoseTestId, ReconcileReport, SyncReport, ValidationOutcome,
    };
    use rstest::rstest;

    #[derive(Default)]
    struct CountingValidation {
        calls: AtomicU32,
        fail: bool,
    }

    #[async_trait]
    impl ValidationCommand for CountingValidation {
        async fn validate(
            &self,
            _id: GlucoseTestId,
            _validator: &str,
        ) -> Result<ValidationOutcome, Error> {
            Err(Error::internal("not used"))
        }

        async fn reconcile(&self) -> Result<ReconcileReport, Error> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(Error::service_unavailable("bridging database unavailable"))
            } else {
                Ok(ReconcileReport {
                    scanned: 3,
                    repaired: 1,
                    already_present: 2,
                    failed: 0,
                })
            }
        }

        async fn sync_all(&self) -> Result<SyncReport, Error> {
            Err(Error::internal("not used"))
        }
    }

    #[rstest]
    #[case(Duration::ZERO, Duration::ZERO)]
    #[case(Duration::from_secs(5), Duration::from_secs(5))]
    #[case(Duration::from_secs(600), Duration::from_secs(MAX_START_JITTER_SECS))]
    fn jitter_never_exceeds_its_cap(#[case] interval: Duration, #[case] cap: Duration) {
        for _ in 0..32 {
            assert!(start_jitter(interval) <= cap);
        }
    }

    #[rstest]
    #[case(false)]
    #[case(true)]
    #[tokio::test]
    async fn sweep_tolerates_both_outcomes(#[case] fail: bool) {
        let validation = CountingValidation {
            fail,
            ..CountingValidation::default()
        };
        sweep(&validation).await;
        assert_eq!(validation.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn loop_keeps_running_after_failures() {
        let validation = Arc::new(CountingValidation {
            fail: true,
            ..CountingValidation::default()
        });
        let handle = spawn(validation.clone(), Duration::from_millis(10));

        for _ in 0..100 {
            if validation.calls.load(Ordering::SeqCst) >= 3 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        handle.abort();
        assert!(validation.calls.load(Ordering::SeqCst) >= 3);
    }
}
