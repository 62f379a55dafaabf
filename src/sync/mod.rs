// Vendor Reconciliation Module
//
// Batched idempotent upserts with partial-failure isolation; see engine.rs
// for the failure discipline.

pub mod engine;
pub mod report;

pub use engine::{SyncEngine, SyncError, DEFAULT_BATCH_SIZE};
pub use report::{SyncReport, MAX_ERROR_MESSAGE_LEN, MAX_REPORT_ERRORS};
