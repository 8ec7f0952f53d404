//! Banded token allocation.
//!
//! Tokens are the human-facing sequence numbers shown to waiting patients.
//! Each priority class owns a disjoint numeric band (non-urgent 100+,
//! urgent 200+, critical 300+) so a glance at the board tells the class.
//!
//! Allocation goes through [`Store::next_sequence`] rather than counting
//! currently waiting patients: a point-in-time count is racy under
//! concurrent registrations and can hand out the same token twice. The
//! counter trades point-in-time density for guaranteed uniqueness within a
//! series; tokens are never reused after discharge.

use crate::config::{TokenSeries, TriageConfig};
use crate::models::PriorityClass;
use crate::store::Store;
use crate::TriageResult;
use chrono::NaiveDate;
use std::sync::Arc;

/// Allocates per-priority token numbers.
pub struct TokenAllocator {
    store: Arc<dyn Store>,
    cfg: Arc<TriageConfig>,
}

impl TokenAllocator {
    pub fn new(store: Arc<dyn Store>, cfg: Arc<TriageConfig>) -> Self {
        Self { store, cfg }
    }

    /// Allocates the next token in the series for `priority`.
    ///
    /// Under [`TokenSeries::PerDate`] the series is scoped to the
    /// appointment date; under [`TokenSeries::Global`] one series spans all
    /// dates.
    pub async fn allocate(&self, priority: PriorityClass, date: NaiveDate) -> TriageResult<u32> {
        let key = match self.cfg.token_series() {
            TokenSeries::Global => format!("token:{}", priority.as_tag()),
            TokenSeries::PerDate => format!("token:{}:{}", priority.as_tag(), date),
        };
        let n = self.store.next_sequence(&key).await?;
        Ok(self.cfg.token_base(priority) + n as u32)
    }
}
