//! Fire-and-forget audit notification.
//!
//! The service layer reports each completed operation through a
//! [`Notifier`]. Audit failures must never fail the primary operation, so
//! the trait has no error channel; implementations log and swallow their
//! own failures.

use crate::constants::AUDIT_COLLECTION;
use crate::models::{AuditAction, AuditEntry};
use crate::store::{to_document, Store};
use async_trait::async_trait;
use std::sync::Arc;

/// Sink for audit events.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn log(&self, action: AuditAction, subject_id: &str, subject_name: &str, detail: &str);
}

/// Notifier that appends [`AuditEntry`] documents to the `audit_logs`
/// collection, stamped with a fixed actor identity.
pub struct StoreNotifier {
    store: Arc<dyn Store>,
    actor: String,
}

impl StoreNotifier {
    pub fn new(store: Arc<dyn Store>, actor: impl Into<String>) -> Self {
        Self {
            store,
            actor: actor.into(),
        }
    }
}

#[async_trait]
impl Notifier for StoreNotifier {
    async fn log(&self, action: AuditAction, subject_id: &str, subject_name: &str, detail: &str) {
        let entry = AuditEntry {
            action,
            patient_id: subject_id.to_owned(),
            patient_name: subject_name.to_owned(),
            actor: self.actor.clone(),
            detail: detail.to_owned(),
            created_at: None,
        };

        let doc = match to_document(&entry) {
            Ok(mut doc) => {
                doc.remove("created_at");
                doc
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to serialize audit entry; dropping it");
                return;
            }
        };

        if let Err(err) = self.store.create(AUDIT_COLLECTION, doc).await {
            tracing::warn!(error = %err, ?action, "audit log write failed; continuing");
        }
    }
}

/// Notifier that discards every event. Useful in tests.
#[derive(Default)]
pub struct NullNotifier;

#[async_trait]
impl Notifier for NullNotifier {
    async fn log(&self, _action: AuditAction, _subject_id: &str, _subject_name: &str, _detail: &str) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;
    use crate::store::from_document;

    #[tokio::test]
    async fn store_notifier_appends_audit_entries() {
        let store = Arc::new(MemoryStore::new());
        let notifier = StoreNotifier::new(store.clone(), "front-desk");

        notifier
            .log(AuditAction::Registered, "p-1", "Jane", "token 101")
            .await;
        notifier
            .log(AuditAction::Discharged, "p-1", "Jane", "released R1")
            .await;

        let entries = store.query(AUDIT_COLLECTION, &[], &[]).await.unwrap();
        assert_eq!(entries.len(), 2);

        let first: AuditEntry = from_document(entries[0].clone()).unwrap();
        assert_eq!(first.action, AuditAction::Registered);
        assert_eq!(first.actor, "front-desk");
        assert_eq!(first.patient_name, "Jane");
        assert!(first.created_at.is_some(), "store stamps the entry");
    }
}
