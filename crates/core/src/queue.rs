//! Queue ordering for display and dispatch.

use crate::models::Patient;
use chrono::{DateTime, Utc};

/// Returns the waiting set in board order without mutating the input.
///
/// Primary key is the priority rank (critical first), tie-break is the
/// check-in timestamp (earlier arrival first). A patient whose check-in
/// stamp has not resolved yet sorts as if checked in at time zero — oldest,
/// a deliberate fallback rather than an error. The sort is stable, so
/// fully-tied patients keep their relative input order.
pub fn order(patients: &[Patient]) -> Vec<Patient> {
    let mut ordered = patients.to_vec();
    ordered.sort_by_key(|p| {
        (
            p.priority.rank(),
            p.created_at.unwrap_or(DateTime::<Utc>::UNIX_EPOCH),
        )
    });
    ordered
}
