//! Appointment slot scheduling.
//!
//! Finds the earliest calendar date with free daily capacity and converts
//! zero-based slot indices into start/end times within clinic hours.

use crate::config::TriageConfig;
use crate::constants::PATIENTS_COLLECTION;
use crate::store::{Filter, Store};
use crate::{TriageError, TriageResult};
use chrono::{Duration, NaiveDate, NaiveTime};
use std::sync::Arc;

/// Per-date capacity scanning and slot arithmetic.
pub struct SlotScheduler {
    store: Arc<dyn Store>,
    cfg: Arc<TriageConfig>,
}

impl SlotScheduler {
    pub fn new(store: Arc<dyn Store>, cfg: Arc<TriageConfig>) -> Self {
        Self { store, cfg }
    }

    /// Scans forward one day at a time from `from`, returning the first
    /// date whose waiting count is below the daily capacity, together with
    /// the zero-based slot index for the new appointment.
    ///
    /// The count is a soft limit: two concurrent registrations can both
    /// observe a free slot on the last-capacity day and exceed the cap by
    /// one.
    ///
    /// # Errors
    ///
    /// Returns `TriageError::CapacityExhausted` when no date within the
    /// configured scan horizon has free capacity.
    pub async fn find_earliest(&self, from: NaiveDate) -> TriageResult<(NaiveDate, u32)> {
        let horizon = self.cfg.scan_horizon_days();
        let mut date = from;

        for _ in 0..horizon {
            let filters = [
                Filter::eq("appointment_date", date.to_string()),
                Filter::eq("status", "waiting"),
            ];
            let scheduled = self
                .store
                .query(PATIENTS_COLLECTION, &filters, &[])
                .await?
                .len() as u32;

            if scheduled < self.cfg.daily_capacity() {
                return Ok((date, scheduled));
            }

            date = date
                .succ_opt()
                .ok_or(TriageError::CapacityExhausted(horizon))?;
        }

        Err(TriageError::CapacityExhausted(horizon))
    }

    /// Start/end times for a zero-based slot index.
    ///
    /// Start is the clinic-open time plus `index × (consult + buffer)`
    /// minutes; end is start plus the consult duration.
    ///
    /// Slot times are clock-of-day values on the appointment date. Under
    /// the default timings (open 09:00, 30-minute stride) indices ≥ 30
    /// pass midnight and wrap around it; the appointment stays filed on
    /// the scheduled date. The daily capacity caps how many patients share
    /// a date, not how late the clinic day runs.
    pub fn slot_times(&self, slot_index: u32) -> (NaiveTime, NaiveTime) {
        let stride = self.cfg.slot_stride_minutes();
        let start =
            self.cfg.clinic_open() + Duration::minutes(i64::from(slot_index) * i64::from(stride));
        let end = start + Duration::minutes(i64::from(self.cfg.consult_minutes()));
        (start, end)
    }
}
