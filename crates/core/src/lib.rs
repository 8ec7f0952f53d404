//! # Triage Core
//!
//! Queueing, scheduling and room-matching engine for a hospital front-desk
//! triage board. Patients register, receive a priority class and a banded
//! token, wait in a totally ordered queue for a room, and are discharged.
//!
//! The core owns no state of its own: patient and room records live in an
//! external document store reached through the [`store::Store`] seam, and
//! completed operations are reported through the fire-and-forget
//! [`notifier::Notifier`]. Persistence, rendering, authentication and
//! audit-log consumers all live outside this crate.
//!
//! Concurrency posture: the store may serve many sessions at once, so
//! nothing here relies on implicit mutual exclusion between operations.
//! Room occupation is a conditional write and token allocation is an
//! atomic server-side counter; see [`matcher`] and [`token`].

pub mod board;
pub mod classifier;
pub mod config;
pub mod constants;
pub mod error;
pub mod matcher;
pub mod models;
pub mod notifier;
pub mod queue;
pub mod scheduler;
pub mod service;
pub mod store;
pub mod token;

pub use config::{TokenSeries, TriageConfig};
pub use error::{TriageError, TriageResult};
pub use models::{
    AuditAction, AuditEntry, Patient, PatientStatus, PriorityClass, Room, RoomStatus, Statistics,
    SymptomTag, Vitals,
};
pub use service::{RegisterInput, TriageService};
