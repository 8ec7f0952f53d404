//! Constants used throughout the triage core crate.
//!
//! Collection names and clinic defaults live here so that the rest of the
//! codebase never hardcodes them inline.

/// Store collection holding patient documents.
pub const PATIENTS_COLLECTION: &str = "patients";

/// Store collection holding room documents.
pub const ROOMS_COLLECTION: &str = "rooms";

/// Store collection holding append-only audit entries.
pub const AUDIT_COLLECTION: &str = "audit_logs";

/// Default number of appointments accepted per calendar day.
pub const DEFAULT_DAILY_CAPACITY: u32 = 50;

/// Default consultation length in minutes.
pub const DEFAULT_CONSULT_MINUTES: u32 = 25;

/// Default buffer between consecutive slots in minutes.
pub const DEFAULT_BUFFER_MINUTES: u32 = 5;

/// Default clinic opening hour (24h clock).
pub const DEFAULT_CLINIC_OPEN_HOUR: u32 = 9;

/// Default clinic opening minute.
pub const DEFAULT_CLINIC_OPEN_MINUTE: u32 = 0;

/// Number of rooms seeded at bootstrap when the rooms collection is empty.
pub const DEFAULT_ROOM_COUNT: u32 = 12;

/// Display prefix for seeded room numbers (`R1`, `R2`, ...).
pub const ROOM_NUMBER_PREFIX: &str = "R";

/// How many days ahead the scheduler scans before giving up.
pub const DEFAULT_SCAN_HORIZON_DAYS: u32 = 365;

/// Token band base for non-urgent patients.
pub const TOKEN_BAND_NON_URGENT: u32 = 100;

/// Token band base for urgent patients.
pub const TOKEN_BAND_URGENT: u32 = 200;

/// Token band base for critical patients.
pub const TOKEN_BAND_CRITICAL: u32 = 300;

/// Pulse above this (bpm) classifies a patient as urgent.
pub const URGENT_PULSE_BPM: u32 = 120;

/// Temperature above this (Fahrenheit) classifies a patient as urgent.
pub const URGENT_TEMPERATURE_F: f64 = 103.0;
