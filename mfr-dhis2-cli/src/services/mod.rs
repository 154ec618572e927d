// Business logic services layer
//
// Reconciliation of MFR facilities into DHIS2 org units, the failed queue
// seam, and the approval datastore mirror.

pub mod approval;
pub mod failed_queue;
pub mod reconcile;

#[cfg(test)]
pub(crate) mod fakes;

// Re-export commonly used types
pub use approval::{ApprovalStoreSynchronizer, ApprovalSyncStatus};
pub use failed_queue::{FailedQueue, FailedQueueEntry};
pub use reconcile::{
    BatchOrchestrator, BatchReport, HierarchyResolver, OrgUnitRef, ReconcileFailure,
    ReconcileStage, ReconciliationOutcome, Reconciler,
};
