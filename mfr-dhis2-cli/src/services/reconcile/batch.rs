//! Sequential batch reconciliation with failure isolation

use log::{error, info};
use serde::Serialize;

use super::models::{ReconcileFailure, ReconciliationOutcome};
use super::Reconciler;
use crate::models::FacilityRecord;
use crate::services::failed_queue::{FailedQueue, FailedQueueEntry};

/// Per-item progress callback: `(index, total, facility)`
pub type ProgressFn<'p> = &'p (dyn Fn(usize, usize, &FacilityRecord) + Send + Sync);

/// Accumulated result of a batch run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchReport {
    /// Reconciled facilities, in input order
    pub outcomes: Vec<ReconciliationOutcome>,
    /// Facilities handed to the failed queue, in input order
    pub failed: Vec<FailedQueueEntry>,
}

impl BatchReport {
    /// Fold one facility's result into the report.
    ///
    /// Returns the failed queue entry when the facility must be retried later.
    pub fn record(
        &mut self,
        facility: &FacilityRecord,
        result: Result<ReconciliationOutcome, ReconcileFailure>,
    ) -> Option<&FailedQueueEntry> {
        let reason = match result {
            Ok(ReconciliationOutcome::NoParentResolvable { .. }) => {
                format!("no existing org unit for any ancestor of '{}'", facility.name)
            }
            Ok(outcome) => {
                self.outcomes.push(outcome);
                return None;
            }
            Err(failure) => failure.to_string(),
        };

        self.failed.push(FailedQueueEntry::new(facility.id.clone(), reason));
        self.failed.last()
    }

    pub fn processed(&self) -> usize {
        self.outcomes.len() + self.failed.len()
    }

    pub fn count(&self, label: &str) -> usize {
        self.outcomes.iter().filter(|o| o.label() == label).count()
    }
}

pub struct BatchOrchestrator<'a> {
    reconciler: Reconciler<'a>,
    queue: &'a dyn FailedQueue,
}

impl<'a> BatchOrchestrator<'a> {
    pub fn new(reconciler: Reconciler<'a>, queue: &'a dyn FailedQueue) -> Self {
        Self { reconciler, queue }
    }

    /// Reconcile every facility in order, always updating existing matches.
    ///
    /// A facility that fails (or has no resolvable parent) is enqueued once
    /// and left out of the outcomes; the run always continues.
    pub async fn reconcile_batch(
        &self,
        facilities: &[FacilityRecord],
        progress: Option<ProgressFn<'_>>,
    ) -> BatchReport {
        let total = facilities.len();
        info!("Preparing {} facilities to send to DHIS2", total);

        let mut report = BatchReport::default();
        for (index, facility) in facilities.iter().enumerate() {
            if let Some(progress) = progress {
                progress(index, total, facility);
            }

            let result = self.reconciler.reconcile(facility, true).await;
            let Some(entry) = report.record(facility, result).cloned() else {
                info!("Successfully sent facility {}", facility.id);
                continue;
            };

            error!("Failed to send facility {}: {}", facility.id, entry.reason);
            if let Err(e) = self.queue.enqueue(entry).await {
                error!("Could not enqueue facility {} for retry: {:#}", facility.id, e);
            }
        }

        info!(
            "Batch finished: {} reconciled, {} queued for retry",
            report.outcomes.len(),
            report.failed.len()
        );
        report
    }
}
