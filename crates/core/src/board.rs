//! Live queue view.
//!
//! The board subscribes to the patients collection and re-derives the
//! display order and statistics on every pushed snapshot. It owns its
//! [`Subscription`] handle: dropping the board releases the live query,
//! with no process-wide unsubscribe state anywhere.

use crate::constants::PATIENTS_COLLECTION;
use crate::models::{Patient, Room, Statistics};
use crate::queue;
use crate::service::compute_statistics;
use crate::store::{from_document, Store, Subscription};
use crate::TriageResult;
use chrono::Utc;
use std::sync::Arc;

/// One rendered board state: the ordered waiting queue plus aggregates.
#[derive(Debug, Clone)]
pub struct QueueView {
    pub queue: Vec<Patient>,
    pub statistics: Statistics,
}

/// A live view over the waiting queue.
pub struct QueueBoard {
    store: Arc<dyn Store>,
    subscription: Subscription,
}

impl QueueBoard {
    /// Opens the board. The store pushes an initial snapshot immediately,
    /// so the first [`QueueBoard::next_view`] resolves without waiting for
    /// a change.
    pub async fn open(store: Arc<dyn Store>) -> TriageResult<Self> {
        let subscription = store.subscribe(PATIENTS_COLLECTION, &[], &[]).await?;
        Ok(Self {
            store,
            subscription,
        })
    }

    /// Waits for the next patients snapshot and derives the board state
    /// from it. Rooms are re-read so occupancy counts stay current.
    /// Returns `None` once the store side has shut down.
    pub async fn next_view(&mut self) -> TriageResult<Option<QueueView>> {
        let Some(docs) = self.subscription.recv().await else {
            return Ok(None);
        };

        let patients = docs
            .into_iter()
            .map(from_document)
            .collect::<Result<Vec<Patient>, _>>()?;
        let rooms = self
            .store
            .query(crate::constants::ROOMS_COLLECTION, &[], &[])
            .await?
            .into_iter()
            .map(from_document)
            .collect::<Result<Vec<Room>, _>>()?;

        let statistics = compute_statistics(&patients, &rooms, Utc::now());
        let queue = queue::order(&patients);
        Ok(Some(QueueView { queue, statistics }))
    }
}
