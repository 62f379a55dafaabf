// Accounting for one reconciliation run. Not persisted; returned to the
// caller that triggered the sync.

use serde::{Deserialize, Serialize};

/// Most errors the report will carry; anything past this is dropped so the
/// response stays bounded no matter how broken the vendor feed is
pub const MAX_REPORT_ERRORS: usize = 10;

/// Longest individual error message kept in the report
pub const MAX_ERROR_MESSAGE_LEN: usize = 200;

/// Summary of one sync run: how many vendor plants were seen, how many
/// landed, split into created vs. updated, plus a bounded error list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SyncReport {
    /// Plants the vendor reported
    pub total: usize,
    /// Plants that upserted successfully
    pub synced: usize,
    /// Successfully upserted plants that did not exist before this run
    pub created: usize,
    /// Successfully upserted plants that already existed
    pub updated: usize,
    /// Per-item failures, capped at [`MAX_REPORT_ERRORS`] entries
    pub errors: Vec<String>,
}

impl SyncReport {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            ..Self::default()
        }
    }

    pub fn record_success(&mut self, existed: bool) {
        self.synced += 1;
        if existed {
            self.updated += 1;
        } else {
            self.created += 1;
        }
    }

    /// Append a per-item failure referencing the vendor external id.
    /// The message is length-capped; entries past the report cap are dropped.
    pub fn record_error(&mut self, external_id: &str, error: &impl std::fmt::Display) {
        if self.errors.len() >= MAX_REPORT_ERRORS {
            return;
        }
        let mut message = format!("{external_id}: {error}");
        if message.len() > MAX_ERROR_MESSAGE_LEN {
            let mut end = MAX_ERROR_MESSAGE_LEN;
            while !message.is_char_boundary(end) {
                end -= 1;
            }
            message.truncate(end);
        }
        self.errors.push(message);
    }

    /// Plants that failed to land this run
    pub fn failed(&self) -> usize {
        self.total - self.synced
    }
}
