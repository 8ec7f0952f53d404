use crate::models::Patient;
use crate::store::StoreError;

/// Errors surfaced by the triage core operations.
///
/// Every externally visible operation returns one of these rather than
/// panicking, so callers can render a specific message and decide whether
/// to retry. Audit-log failures never appear here; they are swallowed by
/// the notifier.
#[derive(Debug, thiserror::Error)]
pub enum TriageError {
    #[error("invalid input: {0}")]
    Validation(String),
    #[error("a patient with this name and contact is already registered (token {})", existing.token)]
    DuplicatePatient {
        /// The conflicting record, so the caller can show it.
        existing: Box<Patient>,
    },
    #[error("patient not found: {0}")]
    PatientNotFound(String),
    #[error("room not found: {0}")]
    RoomNotFound(String),
    #[error("room {0} is not available")]
    RoomUnavailable(String),
    #[error("patient {0} is not waiting")]
    PatientUnavailable(String),
    #[error("no appointment capacity within the next {0} days")]
    CapacityExhausted(u32),
    #[error("store operation failed: {0}")]
    Store(#[from] StoreError),
}

pub type TriageResult<T> = std::result::Result<T, TriageError>;

impl From<triage_types::TextError> for TriageError {
    fn from(err: triage_types::TextError) -> Self {
        TriageError::Validation(err.to_string())
    }
}
