//! The triage orchestrator.
//!
//! `TriageService` composes the classifier, scheduler, token allocator and
//! room matcher into the three externally visible operations — register,
//! assign room, discharge — plus aggregate statistics and the one-time
//! room bootstrap. Every operation re-reads current state from the Store
//! before mutating it; nothing is cached across calls.

use crate::classifier;
use crate::config::TriageConfig;
use crate::constants::{PATIENTS_COLLECTION, ROOMS_COLLECTION, ROOM_NUMBER_PREFIX};
use crate::matcher::RoomMatcher;
use crate::models::{
    AuditAction, Patient, PatientStatus, PriorityClass, Room, RoomStatus, Statistics, SymptomTag,
    Vitals,
};
use crate::notifier::Notifier;
use crate::scheduler::SlotScheduler;
use crate::store::{from_document, to_document, Filter, Store};
use crate::token::TokenAllocator;
use crate::{TriageError, TriageResult};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use triage_types::NonEmptyText;

/// Front-desk registration input.
#[derive(Debug, Clone, Default)]
pub struct RegisterInput {
    pub name: String,
    pub age: u32,
    pub contact: String,
    pub complaint: String,
    pub symptoms: Vec<SymptomTag>,
    pub vitals: Vitals,
    pub notes: String,
}

/// Orchestrates the triage board operations over a Store and a Notifier.
pub struct TriageService {
    store: Arc<dyn Store>,
    notifier: Arc<dyn Notifier>,
    cfg: Arc<TriageConfig>,
    scheduler: SlotScheduler,
    tokens: TokenAllocator,
    matcher: RoomMatcher,
}

impl TriageService {
    pub fn new(
        store: Arc<dyn Store>,
        notifier: Arc<dyn Notifier>,
        cfg: Arc<TriageConfig>,
    ) -> Self {
        Self {
            scheduler: SlotScheduler::new(store.clone(), cfg.clone()),
            tokens: TokenAllocator::new(store.clone(), cfg.clone()),
            matcher: RoomMatcher::new(store.clone()),
            store,
            notifier,
            cfg,
        }
    }

    /// Registers a new patient and returns the store-assigned id.
    ///
    /// Classifies priority from symptoms and vitals, finds the earliest
    /// date with free capacity, converts the slot index into appointment
    /// times, allocates a banded token, and persists the record.
    ///
    /// # Errors
    ///
    /// - `Validation` if name or contact is empty.
    /// - `DuplicatePatient` if a non-discharged patient with the same
    ///   (name, contact) pair already exists; the conflicting record is
    ///   attached so the caller can show it. Dedupe is a business rule,
    ///   not a storage constraint.
    /// - `CapacityExhausted` if no date within the scan horizon has a free
    ///   slot.
    pub async fn register(&self, input: RegisterInput) -> TriageResult<String> {
        let name = NonEmptyText::new(&input.name)
            .map_err(|_| TriageError::Validation("patient name is required".into()))?;
        let contact = NonEmptyText::new(&input.contact)
            .map_err(|_| TriageError::Validation("patient contact is required".into()))?;

        // Discharge hard-deletes records, so every stored patient is
        // non-discharged and counts for dedupe.
        let duplicates = self
            .store
            .query(
                PATIENTS_COLLECTION,
                &[
                    Filter::eq("name", name.as_str()),
                    Filter::eq("contact", contact.as_str()),
                ],
                &[],
            )
            .await?;
        if let Some(doc) = duplicates.into_iter().next() {
            let existing: Patient = from_document(doc)?;
            return Err(TriageError::DuplicatePatient {
                existing: Box::new(existing),
            });
        }

        let priority = classifier::classify(&input.symptoms, &input.vitals);
        let today = Utc::now().date_naive();
        let (date, slot) = self.scheduler.find_earliest(today).await?;
        let (start, end) = self.scheduler.slot_times(slot);
        let token = self.tokens.allocate(priority, date).await?;

        let patient = Patient {
            id: String::new(),
            name: name.as_str().to_owned(),
            age: input.age,
            contact: contact.as_str().to_owned(),
            complaint: input.complaint,
            symptoms: input.symptoms,
            vitals: input.vitals,
            priority,
            token,
            appointment_date: date,
            appointment_start: start,
            appointment_end: end,
            status: PatientStatus::Waiting,
            created_at: None,
            assigned_room: None,
            assigned_room_number: None,
            notes: input.notes,
        };

        let mut doc = to_document(&patient)?;
        // The store assigns both.
        doc.remove("id");
        doc.remove("created_at");
        let id = self.store.create(PATIENTS_COLLECTION, doc).await?;

        tracing::info!(patient = %name, priority = %priority, token, "registered patient");
        self.notifier
            .log(
                AuditAction::Registered,
                &id,
                name.as_str(),
                &format!("token {token}, priority {priority}, scheduled {date} {start}"),
            )
            .await;

        Ok(id)
    }

    /// Assigns an available room to a waiting patient.
    pub async fn assign_room(&self, patient_id: &str, room_id: &str) -> TriageResult<()> {
        let assignment = self.matcher.assign(patient_id, room_id).await?;

        self.notifier
            .log(
                AuditAction::StatusChanged,
                patient_id,
                &assignment.patient_name,
                "waiting -> inTreatment",
            )
            .await;
        self.notifier
            .log(
                AuditAction::AssignedRoom,
                patient_id,
                &assignment.patient_name,
                &format!("room {}", assignment.room_number),
            )
            .await;

        Ok(())
    }

    /// Discharges a patient: releases their room (if any) and hard-deletes
    /// the record. If the release fails the discharge is aborted — an
    /// in-treatment patient is never deleted while a room still references
    /// them.
    pub async fn discharge(&self, patient_id: &str) -> TriageResult<()> {
        let doc = self
            .store
            .get(PATIENTS_COLLECTION, patient_id)
            .await?
            .ok_or_else(|| TriageError::PatientNotFound(patient_id.to_owned()))?;
        let patient: Patient = from_document(doc)?;

        let held_room = patient.assigned_room.clone();
        if let Some(room_id) = &held_room {
            self.matcher.release(room_id).await?;
        }

        self.store.delete(PATIENTS_COLLECTION, patient_id).await?;
        tracing::info!(patient = %patient.name, "discharged patient");

        let (action, detail) = match (&held_room, &patient.assigned_room_number) {
            (Some(_), Some(number)) => {
                (AuditAction::Discharged, format!("released room {number}"))
            }
            (Some(_), None) => (AuditAction::Discharged, "released room".to_owned()),
            (None, _) => (AuditAction::Deleted, "discharged while waiting".to_owned()),
        };
        self.notifier
            .log(action, patient_id, &patient.name, &detail)
            .await;

        Ok(())
    }

    /// Recomputes board statistics from the live patient and room sets.
    pub async fn statistics(&self) -> TriageResult<Statistics> {
        let patients = self.patients().await?;
        let rooms = self.rooms().await?;
        Ok(compute_statistics(&patients, &rooms, Utc::now()))
    }

    /// Seeds the fixed room set if the rooms collection is empty. A
    /// one-time idempotent bootstrap, not a migration system. Returns the
    /// number of rooms created (zero when already seeded).
    pub async fn seed_rooms(&self) -> TriageResult<usize> {
        let existing = self.store.query(ROOMS_COLLECTION, &[], &[]).await?;
        if !existing.is_empty() {
            return Ok(0);
        }

        let count = self.cfg.room_count();
        for i in 1..=count {
            let room = Room {
                id: String::new(),
                number: format!("{ROOM_NUMBER_PREFIX}{i}"),
                status: RoomStatus::Available,
                assigned_patient: None,
                assigned_patient_name: None,
                assigned_at: None,
                created_at: None,
            };
            let mut doc = to_document(&room)?;
            doc.remove("id");
            doc.remove("created_at");
            self.store.create(ROOMS_COLLECTION, doc).await?;
        }

        tracing::info!(count, "seeded rooms");
        Ok(count as usize)
    }

    /// Current patient set.
    pub async fn patients(&self) -> TriageResult<Vec<Patient>> {
        let docs = self.store.query(PATIENTS_COLLECTION, &[], &[]).await?;
        let patients = docs
            .into_iter()
            .map(from_document)
            .collect::<Result<Vec<Patient>, _>>()?;
        Ok(patients)
    }

    /// Current room set.
    pub async fn rooms(&self) -> TriageResult<Vec<Room>> {
        let docs = self.store.query(ROOMS_COLLECTION, &[], &[]).await?;
        let rooms = docs
            .into_iter()
            .map(from_document)
            .collect::<Result<Vec<Room>, _>>()?;
        Ok(rooms)
    }
}

/// Computes board statistics from patient and room snapshots.
///
/// Counts cover currently waiting patients; mean wait is the average of
/// `now − check-in` in floored minutes over waiting patients with a
/// resolvable check-in time, and zero when there are none. Room occupancy
/// comes from the room set directly.
pub fn compute_statistics(
    patients: &[Patient],
    rooms: &[Room],
    now: DateTime<Utc>,
) -> Statistics {
    let waiting: Vec<&Patient> = patients
        .iter()
        .filter(|p| p.status == PatientStatus::Waiting)
        .collect();

    let count_class = |class: PriorityClass| waiting.iter().filter(|p| p.priority == class).count();

    let waits: Vec<i64> = waiting
        .iter()
        .filter_map(|p| p.created_at)
        .map(|t| (now - t).num_minutes().max(0))
        .collect();
    let mean_wait_minutes = if waits.is_empty() {
        0
    } else {
        waits.iter().sum::<i64>() / waits.len() as i64
    };

    let rooms_occupied = rooms
        .iter()
        .filter(|r| r.status == RoomStatus::Occupied)
        .count();

    Statistics {
        total_waiting: waiting.len(),
        critical: count_class(PriorityClass::Critical),
        urgent: count_class(PriorityClass::Urgent),
        non_urgent: count_class(PriorityClass::NonUrgent),
        mean_wait_minutes,
        rooms_occupied,
        rooms_available: rooms.len() - rooms_occupied,
    }
}
