use futures::future::join_all;

use super::*;
use crate::document::Revision;
use crate::queue::EnqueueOptions;

/// What an enqueue did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnqueueOutcome {
    /// A new message document was written.
    Inserted { rev: Revision },
    /// An existing document was replaced (override, or a racing producer
    /// wrote the same id first).
    Overwritten { rev: Revision },
    /// The document already existed and was left untouched.
    AlreadyPresent { queued: Option<bool> },
}

impl EnqueueOutcome {
    pub fn is_written(&self) -> bool {
        !matches!(self, EnqueueOutcome::AlreadyPresent { .. })
    }
}

/// Per-id result of `enqueue_many`.
#[derive(Debug)]
pub struct BatchEntry {
    pub id: String,
    pub result: Result<EnqueueOutcome>,
}

impl WorkQueue {
    /// Enqueue `id` with the queue's configured override setting.
    pub async fn enqueue(&self, id: &str) -> Result<EnqueueOutcome> {
        self.enqueue_with(id, self.config.enqueue_options()).await
    }

    /// Enqueue `id`.
    ///
    /// Without override an existing document is never touched, so dequeued
    /// messages are not resurrected. The existence check and the write are
    /// separate store calls: two producers racing on one id may both write,
    /// which lands on the same document (last write wins).
    #[tracing::instrument(
        skip_all,
        fields(queue = %self.name(), id = %id, override_existing = options.override_existing)
    )]
    pub async fn enqueue_with(&self, id: &str, options: EnqueueOptions) -> Result<EnqueueOutcome> {
        // Taken before any store call so batch insert times follow call order.
        let insert_time = self.clock.now_ns();
        if !options.override_existing {
            if let Some(existing) = self.store.get(id).await? {
                let queued = queued_flag(&existing);
                debug!(?queued, "already present, not requeued");
                return Ok(EnqueueOutcome::AlreadyPresent { queued });
            }
        }

        let body = Message::queued_body(insert_time);
        let rev = self.store.save(id, body).await?;
        debug!(rev, "queued");

        Ok(if rev == 1 {
            EnqueueOutcome::Inserted { rev }
        } else {
            EnqueueOutcome::Overwritten { rev }
        })
    }

    /// Enqueue every id concurrently. Each id gets its own result, in input
    /// order; one failure does not affect the others. Insert times increase
    /// in input order.
    pub async fn enqueue_many<I, S>(&self, ids: I, options: EnqueueOptions) -> Vec<BatchEntry>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let ids: Vec<String> = ids.into_iter().map(Into::into).collect();
        let results = join_all(ids.iter().map(|id| self.enqueue_with(id, options))).await;
        ids.into_iter()
            .zip(results)
            .map(|(id, result)| BatchEntry { id, result })
            .collect()
    }
}
