//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and passed into the
//! services as an `Arc<TriageConfig>`. Nothing in a request path reads
//! process-wide state, which keeps behaviour consistent across threads and
//! test harnesses.

use crate::constants::{
    DEFAULT_BUFFER_MINUTES, DEFAULT_CLINIC_OPEN_HOUR, DEFAULT_CLINIC_OPEN_MINUTE,
    DEFAULT_CONSULT_MINUTES, DEFAULT_DAILY_CAPACITY, DEFAULT_ROOM_COUNT,
    DEFAULT_SCAN_HORIZON_DAYS, TOKEN_BAND_CRITICAL, TOKEN_BAND_NON_URGENT, TOKEN_BAND_URGENT,
};
use crate::models::PriorityClass;
use crate::{TriageError, TriageResult};
use chrono::NaiveTime;

/// Scope within which token numbers and daily-capacity counts are computed.
///
/// The board historically shipped with two divergent behaviours; the scope
/// is now an explicit policy choice. [`TokenSeries::PerDate`] is the default
/// because it matches the per-date capacity scan in the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenSeries {
    /// One counter per priority class across all dates.
    Global,
    /// One counter per priority class per appointment date.
    PerDate,
}

/// Clinic configuration resolved at startup.
#[derive(Debug, Clone)]
pub struct TriageConfig {
    daily_capacity: u32,
    consult_minutes: u32,
    buffer_minutes: u32,
    clinic_open: NaiveTime,
    room_count: u32,
    scan_horizon_days: u32,
    token_series: TokenSeries,
}

impl TriageConfig {
    /// Create a new `TriageConfig`.
    ///
    /// # Errors
    ///
    /// Returns `TriageError::Validation` if any capacity or duration is zero.
    pub fn new(
        daily_capacity: u32,
        consult_minutes: u32,
        buffer_minutes: u32,
        clinic_open: NaiveTime,
        room_count: u32,
        scan_horizon_days: u32,
        token_series: TokenSeries,
    ) -> TriageResult<Self> {
        if daily_capacity == 0 {
            return Err(TriageError::Validation(
                "daily_capacity must be at least 1".into(),
            ));
        }
        if consult_minutes == 0 {
            return Err(TriageError::Validation(
                "consult_minutes must be at least 1".into(),
            ));
        }
        if room_count == 0 {
            return Err(TriageError::Validation(
                "room_count must be at least 1".into(),
            ));
        }
        if scan_horizon_days == 0 {
            return Err(TriageError::Validation(
                "scan_horizon_days must be at least 1".into(),
            ));
        }

        Ok(Self {
            daily_capacity,
            consult_minutes,
            buffer_minutes,
            clinic_open,
            room_count,
            scan_horizon_days,
            token_series,
        })
    }

    pub fn daily_capacity(&self) -> u32 {
        self.daily_capacity
    }

    pub fn consult_minutes(&self) -> u32 {
        self.consult_minutes
    }

    pub fn buffer_minutes(&self) -> u32 {
        self.buffer_minutes
    }

    /// Minutes from one slot start to the next.
    pub fn slot_stride_minutes(&self) -> u32 {
        self.consult_minutes + self.buffer_minutes
    }

    pub fn clinic_open(&self) -> NaiveTime {
        self.clinic_open
    }

    pub fn room_count(&self) -> u32 {
        self.room_count
    }

    pub fn scan_horizon_days(&self) -> u32 {
        self.scan_horizon_days
    }

    pub fn token_series(&self) -> TokenSeries {
        self.token_series
    }

    /// Base of the token band owned by a priority class. Bands are disjoint
    /// so tokens are visually distinguishable across classes.
    pub fn token_base(&self, priority: PriorityClass) -> u32 {
        match priority {
            PriorityClass::Critical => TOKEN_BAND_CRITICAL,
            PriorityClass::Urgent => TOKEN_BAND_URGENT,
            PriorityClass::NonUrgent => TOKEN_BAND_NON_URGENT,
        }
    }
}

impl Default for TriageConfig {
    fn default() -> Self {
        Self {
            daily_capacity: DEFAULT_DAILY_CAPACITY,
            consult_minutes: DEFAULT_CONSULT_MINUTES,
            buffer_minutes: DEFAULT_BUFFER_MINUTES,
            clinic_open: NaiveTime::from_hms_opt(
                DEFAULT_CLINIC_OPEN_HOUR,
                DEFAULT_CLINIC_OPEN_MINUTE,
                0,
            )
            .unwrap_or(NaiveTime::MIN),
            room_count: DEFAULT_ROOM_COUNT,
            scan_horizon_days: DEFAULT_SCAN_HORIZON_DAYS,
            token_series: TokenSeries::PerDate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_matches_clinic_defaults() {
        let cfg = TriageConfig::default();
        assert_eq!(cfg.daily_capacity(), 50);
        assert_eq!(cfg.slot_stride_minutes(), 30);
        assert_eq!(cfg.clinic_open(), NaiveTime::from_hms_opt(9, 0, 0).unwrap());
        assert_eq!(cfg.token_series(), TokenSeries::PerDate);
    }

    #[test]
    fn rejects_zero_capacity() {
        let err = TriageConfig::new(
            0,
            25,
            5,
            NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            12,
            365,
            TokenSeries::PerDate,
        )
        .unwrap_err();
        assert!(matches!(err, TriageError::Validation(_)));
    }

    #[test]
    fn token_bands_are_disjoint() {
        let cfg = TriageConfig::default();
        assert_eq!(cfg.token_base(PriorityClass::NonUrgent), 100);
        assert_eq!(cfg.token_base(PriorityClass::Urgent), 200);
        assert_eq!(cfg.token_base(PriorityClass::Critical), 300);
    }
}
