//! Atomic room ↔ patient matching.
//!
//! Assigning occupies the room with a conditional write ("set occupied only
//! if currently available"), so two sessions racing on the same room cannot
//! both win. Both sides of the relation — the room's patient reference and
//! the patient's room reference, plus the denormalized display caches — are
//! only ever touched here.

use crate::constants::{PATIENTS_COLLECTION, ROOMS_COLLECTION};
use crate::models::{Patient, Room, RoomStatus};
use crate::store::{from_document, Document, Filter, Store};
use crate::{TriageError, TriageResult};
use chrono::{SecondsFormat, Utc};
use serde_json::Value;
use std::sync::Arc;

/// Names captured on a successful assignment, for audit detail.
#[derive(Debug, Clone)]
pub struct Assignment {
    pub patient_name: String,
    pub room_number: String,
}

/// Binds rooms to patients and releases them at discharge.
pub struct RoomMatcher {
    store: Arc<dyn Store>,
}

impl RoomMatcher {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Assigns one available room to one waiting patient.
    ///
    /// The room is occupied first, via a compare-and-swap on its status;
    /// then the patient transitions to in-treatment with the room reference
    /// and cached room number, through a second compare-and-swap on the
    /// patient still being waiting. If the patient side fails after the
    /// room was taken, the room is rolled back to available before the
    /// error is surfaced, so no half-assigned pair is left behind and a
    /// patient can never end up referenced by two rooms.
    ///
    /// # Errors
    ///
    /// - `PatientNotFound` / `RoomNotFound` if either id does not resolve.
    /// - `RoomUnavailable` if the room is not available at the time of the
    ///   conditional write. Neither record is modified in that case.
    /// - `PatientUnavailable` if the patient is no longer waiting, e.g.
    ///   already in treatment in another room. The room is rolled back.
    pub async fn assign(&self, patient_id: &str, room_id: &str) -> TriageResult<Assignment> {
        let patient_doc = self
            .store
            .get(PATIENTS_COLLECTION, patient_id)
            .await?
            .ok_or_else(|| TriageError::PatientNotFound(patient_id.to_owned()))?;
        let patient: Patient = from_document(patient_doc)?;

        let room_doc = self
            .store
            .get(ROOMS_COLLECTION, room_id)
            .await?
            .ok_or_else(|| TriageError::RoomNotFound(room_id.to_owned()))?;
        let room: Room = from_document(room_doc)?;

        let now = Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true);

        let mut room_patch = Document::new();
        room_patch.insert("status".into(), Value::String("occupied".into()));
        room_patch.insert(
            "assigned_patient".into(),
            Value::String(patient_id.to_owned()),
        );
        room_patch.insert(
            "assigned_patient_name".into(),
            Value::String(patient.name.clone()),
        );
        room_patch.insert("assigned_at".into(), Value::String(now));

        // CAS: take the room only if it is still available.
        let occupied = self
            .store
            .update_if(
                ROOMS_COLLECTION,
                room_id,
                &[Filter::eq("status", "available")],
                room_patch,
            )
            .await?;
        if !occupied {
            return Err(TriageError::RoomUnavailable(room.number));
        }

        let mut patient_patch = Document::new();
        patient_patch.insert("status".into(), Value::String("inTreatment".into()));
        patient_patch.insert("assigned_room".into(), Value::String(room_id.to_owned()));
        patient_patch.insert(
            "assigned_room_number".into(),
            Value::String(room.number.clone()),
        );

        // CAS: transition the patient only if still waiting, so a patient
        // already in treatment cannot be bound to a second room.
        let transitioned = self
            .store
            .update_if(
                PATIENTS_COLLECTION,
                patient_id,
                &[Filter::eq("status", "waiting")],
                patient_patch,
            )
            .await;
        match transitioned {
            Ok(true) => {}
            Ok(false) => {
                self.roll_back_room(room_id).await;
                return Err(TriageError::PatientUnavailable(patient.name));
            }
            Err(err) => {
                self.roll_back_room(room_id).await;
                return Err(err.into());
            }
        }

        tracing::info!(
            patient = %patient.name,
            room = %room.number,
            "assigned room to patient"
        );

        Ok(Assignment {
            patient_name: patient.name,
            room_number: room.number,
        })
    }

    /// Returns a freshly taken room to available after the patient side of
    /// an assignment failed. Failure here only leaves the room occupied
    /// with no in-treatment patient, which `release` can still clear later.
    async fn roll_back_room(&self, room_id: &str) {
        if let Err(rollback) = self.release(room_id).await {
            tracing::warn!(
                room_id,
                error = %rollback,
                "failed to roll back room after patient update failure"
            );
        }
    }

    /// Releases a room back to available, clearing the patient reference,
    /// cached name, and assignment time.
    ///
    /// Idempotent: releasing a room that is already available is a no-op
    /// success.
    ///
    /// # Errors
    ///
    /// Returns `RoomNotFound` if the id does not resolve.
    pub async fn release(&self, room_id: &str) -> TriageResult<()> {
        let room_doc = self
            .store
            .get(ROOMS_COLLECTION, room_id)
            .await?
            .ok_or_else(|| TriageError::RoomNotFound(room_id.to_owned()))?;
        let room: Room = from_document(room_doc)?;

        if room.status == RoomStatus::Available {
            return Ok(());
        }

        let mut patch = Document::new();
        patch.insert("status".into(), Value::String("available".into()));
        patch.insert("assigned_patient".into(), Value::Null);
        patch.insert("assigned_patient_name".into(), Value::Null);
        patch.insert("assigned_at".into(), Value::Null);

        self.store.update(ROOMS_COLLECTION, room_id, patch).await?;
        tracing::info!(room = %room.number, "released room");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PatientStatus;
    use crate::store::memory::MemoryStore;
    use crate::store::to_document;
    use chrono::{NaiveDate, NaiveTime};
    use crate::models::{PriorityClass, Vitals};

    async fn seed_patient(store: &MemoryStore, name: &str) -> String {
        let patient = Patient {
            id: String::new(),
            name: name.to_owned(),
            age: 40,
            contact: format!("555-{name}"),
            complaint: "test".into(),
            symptoms: Vec::new(),
            vitals: Vitals::default(),
            priority: PriorityClass::NonUrgent,
            token: 101,
            appointment_date: NaiveDate::from_ymd_opt(2026, 5, 4).unwrap(),
            appointment_start: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            appointment_end: NaiveTime::from_hms_opt(9, 25, 0).unwrap(),
            status: PatientStatus::Waiting,
            created_at: None,
            assigned_room: None,
            assigned_room_number: None,
            notes: String::new(),
        };
        let mut doc = to_document(&patient).unwrap();
        doc.remove("id");
        doc.remove("created_at");
        store.create(PATIENTS_COLLECTION, doc).await.unwrap()
    }

    async fn seed_room(store: &MemoryStore, number: &str) -> String {
        let room = Room {
            id: String::new(),
            number: number.to_owned(),
            status: RoomStatus::Available,
            assigned_patient: None,
            assigned_patient_name: None,
            assigned_at: None,
            created_at: None,
        };
        let mut doc = to_document(&room).unwrap();
        doc.remove("id");
        doc.remove("created_at");
        store.create(ROOMS_COLLECTION, doc).await.unwrap()
    }

    async fn load_patient(store: &MemoryStore, id: &str) -> Patient {
        from_document(store.get(PATIENTS_COLLECTION, id).await.unwrap().unwrap()).unwrap()
    }

    async fn load_room(store: &MemoryStore, id: &str) -> Room {
        from_document(store.get(ROOMS_COLLECTION, id).await.unwrap().unwrap()).unwrap()
    }

    #[tokio::test]
    async fn assign_updates_both_sides_of_the_relation() {
        let store = Arc::new(MemoryStore::new());
        let patient_id = seed_patient(&store, "Jane").await;
        let room_id = seed_room(&store, "R1").await;
        let matcher = RoomMatcher::new(store.clone());

        let assignment = matcher.assign(&patient_id, &room_id).await.unwrap();
        assert_eq!(assignment.patient_name, "Jane");
        assert_eq!(assignment.room_number, "R1");

        let patient = load_patient(&store, &patient_id).await;
        assert_eq!(patient.status, PatientStatus::InTreatment);
        assert_eq!(patient.assigned_room.as_deref(), Some(room_id.as_str()));
        assert_eq!(patient.assigned_room_number.as_deref(), Some("R1"));

        let room = load_room(&store, &room_id).await;
        assert_eq!(room.status, RoomStatus::Occupied);
        assert_eq!(room.assigned_patient.as_deref(), Some(patient_id.as_str()));
        assert_eq!(room.assigned_patient_name.as_deref(), Some("Jane"));
        assert!(room.assigned_at.is_some());
    }

    #[tokio::test]
    async fn assign_to_occupied_room_fails_without_partial_writes() {
        let store = Arc::new(MemoryStore::new());
        let first = seed_patient(&store, "Jane").await;
        let second = seed_patient(&store, "Amir").await;
        let room_id = seed_room(&store, "R1").await;
        let matcher = RoomMatcher::new(store.clone());

        matcher.assign(&first, &room_id).await.unwrap();
        let err = matcher.assign(&second, &room_id).await.unwrap_err();
        assert!(matches!(err, TriageError::RoomUnavailable(ref n) if n == "R1"));

        let second_patient = load_patient(&store, &second).await;
        assert_eq!(second_patient.status, PatientStatus::Waiting);
        assert_eq!(second_patient.assigned_room, None);

        let room = load_room(&store, &room_id).await;
        assert_eq!(room.assigned_patient.as_deref(), Some(first.as_str()));
    }

    #[tokio::test]
    async fn in_treatment_patient_cannot_take_a_second_room() {
        let store = Arc::new(MemoryStore::new());
        let patient_id = seed_patient(&store, "Jane").await;
        let first_room = seed_room(&store, "R1").await;
        let second_room = seed_room(&store, "R2").await;
        let matcher = RoomMatcher::new(store.clone());

        matcher.assign(&patient_id, &first_room).await.unwrap();
        let err = matcher.assign(&patient_id, &second_room).await.unwrap_err();
        assert!(matches!(err, TriageError::PatientUnavailable(ref n) if n == "Jane"));

        // The first assignment is intact and the second room was rolled back.
        let patient = load_patient(&store, &patient_id).await;
        assert_eq!(patient.status, PatientStatus::InTreatment);
        assert_eq!(patient.assigned_room.as_deref(), Some(first_room.as_str()));
        assert_eq!(patient.assigned_room_number.as_deref(), Some("R1"));

        let second = load_room(&store, &second_room).await;
        assert_eq!(second.status, RoomStatus::Available);
        assert_eq!(second.assigned_patient, None);
        assert_eq!(second.assigned_patient_name, None);
    }

    #[tokio::test]
    async fn release_is_idempotent() {
        let store = Arc::new(MemoryStore::new());
        let patient_id = seed_patient(&store, "Jane").await;
        let room_id = seed_room(&store, "R1").await;
        let matcher = RoomMatcher::new(store.clone());

        matcher.assign(&patient_id, &room_id).await.unwrap();
        matcher.release(&room_id).await.unwrap();
        matcher.release(&room_id).await.unwrap();

        let room = load_room(&store, &room_id).await;
        assert_eq!(room.status, RoomStatus::Available);
        assert_eq!(room.assigned_patient, None);
    }

    #[tokio::test]
    async fn assign_then_release_restores_the_room() {
        let store = Arc::new(MemoryStore::new());
        let patient_id = seed_patient(&store, "Jane").await;
        let room_id = seed_room(&store, "R1").await;
        let matcher = RoomMatcher::new(store.clone());

        let before = load_room(&store, &room_id).await;
        matcher.assign(&patient_id, &room_id).await.unwrap();
        matcher.release(&room_id).await.unwrap();
        let after = load_room(&store, &room_id).await;

        assert_eq!(after.status, before.status);
        assert_eq!(after.assigned_patient, None);
        assert_eq!(after.assigned_patient_name, None);
        assert_eq!(after.assigned_at, None);
        assert_eq!(after.number, before.number);
    }

    #[tokio::test]
    async fn unknown_ids_resolve_to_specific_errors() {
        let store = Arc::new(MemoryStore::new());
        let patient_id = seed_patient(&store, "Jane").await;
        let room_id = seed_room(&store, "R1").await;
        let matcher = RoomMatcher::new(store.clone());

        let err = matcher.assign("missing", &room_id).await.unwrap_err();
        assert!(matches!(err, TriageError::PatientNotFound(_)));

        let err = matcher.assign(&patient_id, "missing").await.unwrap_err();
        assert!(matches!(err, TriageError::RoomNotFound(_)));

        let err = matcher.release("missing").await.unwrap_err();
        assert!(matches!(err, TriageError::RoomNotFound(_)));
    }
}
