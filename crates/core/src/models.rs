//! Domain types for the triage board.
//!
//! These types are what the Store persists (as JSON documents) and what the
//! services operate on. Serde tags follow the wire spellings used by the
//! board (`camelCase` for clinical enums, `snake_case` for audit actions).
//!
//! ## Cross-reference invariants
//!
//! - A [`Patient`] has `assigned_room == Some(..)` iff its status is
//!   [`PatientStatus::InTreatment`], and `assigned_room_number` then caches
//!   the room's display number.
//! - A [`Room`] is [`RoomStatus::Occupied`] iff `assigned_patient` is set.
//! - The cached display fields (`assigned_room_number`,
//!   `assigned_patient_name`) are updated only by the room matcher alongside
//!   the relation change; they are never used as the source of truth for
//!   matching.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

/// Priority class assigned at registration; drives queue order and the
/// token band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PriorityClass {
    Critical,
    Urgent,
    NonUrgent,
}

impl PriorityClass {
    /// Queue rank, ascending: critical patients sort first.
    pub fn rank(self) -> u8 {
        match self {
            PriorityClass::Critical => 1,
            PriorityClass::Urgent => 2,
            PriorityClass::NonUrgent => 3,
        }
    }

    /// The wire/display tag for this class.
    pub fn as_tag(self) -> &'static str {
        match self {
            PriorityClass::Critical => "critical",
            PriorityClass::Urgent => "urgent",
            PriorityClass::NonUrgent => "nonUrgent",
        }
    }
}

impl std::fmt::Display for PriorityClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_tag())
    }
}

/// Symptom tags the front desk can record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SymptomTag {
    ChestPain,
    BreathingDifficulty,
    Bleeding,
    Unconscious,
    Fever,
    Pain,
    Headache,
    Nausea,
    Other,
}

impl SymptomTag {
    /// Whether this tag alone makes a patient critical.
    pub fn is_critical(self) -> bool {
        matches!(
            self,
            SymptomTag::ChestPain
                | SymptomTag::BreathingDifficulty
                | SymptomTag::Bleeding
                | SymptomTag::Unconscious
        )
    }
}

/// Vitals recorded at check-in. Every field is optional; a missing value
/// never triggers a classification threshold.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Vitals {
    #[serde(default)]
    pub blood_pressure: Option<String>,
    #[serde(default)]
    pub pulse: Option<u32>,
    #[serde(default)]
    pub temperature: Option<f64>,
}

/// Patient lifecycle status. Discharge deletes the record rather than
/// adding a terminal variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PatientStatus {
    Waiting,
    InTreatment,
}

/// A registered patient waiting for, or receiving, treatment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Patient {
    /// Store-assigned opaque id.
    #[serde(default)]
    pub id: String,
    pub name: String,
    pub age: u32,
    /// Contact string; together with `name` forms the dedupe key.
    pub contact: String,
    pub complaint: String,
    #[serde(default)]
    pub symptoms: Vec<SymptomTag>,
    #[serde(default)]
    pub vitals: Vitals,
    pub priority: PriorityClass,
    /// Human-facing sequence number, banded by priority class.
    pub token: u32,
    pub appointment_date: NaiveDate,
    pub appointment_start: NaiveTime,
    pub appointment_end: NaiveTime,
    pub status: PatientStatus,
    /// Check-in timestamp, stamped by the Store on insert. `None` while the
    /// stamp is unresolved; the queue sorts such patients as oldest.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    /// Weak reference to the occupied room (id only, no ownership).
    #[serde(default)]
    pub assigned_room: Option<String>,
    /// Cached copy of the room's display number, maintained by the matcher.
    #[serde(default)]
    pub assigned_room_number: Option<String>,
    #[serde(default)]
    pub notes: String,
}

/// Room availability status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RoomStatus {
    Available,
    Occupied,
}

/// A treatment room. Rooms are seeded once at bootstrap and cycle between
/// available and occupied for their whole lifetime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Room {
    #[serde(default)]
    pub id: String,
    /// Unique display number, e.g. `R3`. Also the sort key for room lists.
    pub number: String,
    pub status: RoomStatus,
    /// Weak back-reference to the occupying patient.
    #[serde(default)]
    pub assigned_patient: Option<String>,
    /// Cached copy of the occupying patient's name, maintained by the matcher.
    #[serde(default)]
    pub assigned_patient_name: Option<String>,
    #[serde(default)]
    pub assigned_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Aggregate board statistics, recomputed on demand from the live patient
/// and room sets. Never persisted as a source of truth.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statistics {
    pub total_waiting: usize,
    pub critical: usize,
    pub urgent: usize,
    pub non_urgent: usize,
    /// Mean wait of currently waiting patients, in floored minutes. Zero
    /// when no patient has a resolvable check-in time.
    pub mean_wait_minutes: i64,
    pub rooms_occupied: usize,
    pub rooms_available: usize,
}

/// Action tag for an audit entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    Registered,
    StatusChanged,
    AssignedRoom,
    Discharged,
    Deleted,
}

/// Append-only audit record. Written by service side-effects, never read
/// back by the core logic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub action: AuditAction,
    pub patient_id: String,
    pub patient_name: String,
    pub actor: String,
    pub detail: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_serializes_with_camel_case_tags() {
        assert_eq!(
            serde_json::to_value(PriorityClass::NonUrgent).unwrap(),
            serde_json::json!("nonUrgent")
        );
        assert_eq!(
            serde_json::to_value(PatientStatus::InTreatment).unwrap(),
            serde_json::json!("inTreatment")
        );
    }

    #[test]
    fn audit_actions_serialize_with_snake_case_tags() {
        assert_eq!(
            serde_json::to_value(AuditAction::AssignedRoom).unwrap(),
            serde_json::json!("assigned_room")
        );
        assert_eq!(
            serde_json::to_value(AuditAction::StatusChanged).unwrap(),
            serde_json::json!("status_changed")
        );
    }

    #[test]
    fn critical_tags_match_the_critical_set() {
        let critical = [
            SymptomTag::ChestPain,
            SymptomTag::BreathingDifficulty,
            SymptomTag::Bleeding,
            SymptomTag::Unconscious,
        ];
        for tag in critical {
            assert!(tag.is_critical());
        }
        assert!(!SymptomTag::Fever.is_critical());
        assert!(!SymptomTag::Other.is_critical());
    }

    #[test]
    fn priority_rank_orders_critical_first() {
        assert!(PriorityClass::Critical.rank() < PriorityClass::Urgent.rank());
        assert!(PriorityClass::Urgent.rank() < PriorityClass::NonUrgent.rank());
    }
}
