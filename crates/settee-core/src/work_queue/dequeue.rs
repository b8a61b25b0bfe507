use tracing::warn;

use super::*;
use crate::document::Revision;

/// What a dequeue did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DequeueOutcome {
    pub rev: Revision,
    /// False when the message had already been dequeued; the dequeue time
    /// was rewritten anyway.
    pub was_queued: bool,
}

impl WorkQueue {
    /// Mark `id` as dequeued.
    ///
    /// Only `queued` and `dequeue_time` change; other fields are kept. The
    /// write is conditional on the revision read by the existence check, so
    /// a concurrent write in between fails with `Conflict` instead of being
    /// silently overwritten. Dequeuing an already-dequeued message succeeds.
    #[tracing::instrument(skip_all, fields(queue = %self.name(), id = %id))]
    pub async fn dequeue(&self, id: &str) -> Result<DequeueOutcome> {
        let dequeue_time = self.clock.now_ns();
        let doc = self
            .store
            .get(id)
            .await?
            .ok_or_else(|| QueueError::ItemNotFound(id.to_string()))?;
        let was_queued = queued_flag(&doc).unwrap_or(false);
        if !was_queued {
            warn!("item was not queued, rewriting dequeue time");
        }

        let patch = Message::dequeued_patch(dequeue_time);
        let rev = match self.store.merge(id, patch, Some(doc.rev)).await {
            Ok(rev) => rev,
            Err(StoreError::Conflict { expected, actual, .. }) => {
                debug!(expected, actual, "revision changed since read");
                return Err(QueueError::Conflict(id.to_string()));
            }
            Err(StoreError::DocumentNotFound(_)) => {
                return Err(QueueError::ItemNotFound(id.to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        debug!(rev, "dequeued");
        Ok(DequeueOutcome { rev, was_queued })
    }
}
