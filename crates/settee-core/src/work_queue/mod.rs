use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info};

use crate::clock::{Clock, SystemClock};
use crate::config::{StoreLocation, StoreSettings};
use crate::design::{self, queue_design};
use crate::error::{QueueError, Result, StoreError};
use crate::message::{queued_flag, Message};
use crate::queue::QueueConfig;
use crate::store::{DocumentStore, MemoryStore, RocksDbConnection};
use crate::view::ViewQuery;

mod dequeue;
mod enqueue;
mod selection;

#[cfg(test)]
mod tests;

pub use dequeue::DequeueOutcome;
pub use enqueue::{BatchEntry, EnqueueOutcome};
pub use selection::{NextItem, StartKeySource, ThreadRngStartKey};

/// Result of `ensure_queue`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provisioned {
    Created,
    AlreadyExists,
}

/// One row of a queued/dequeued listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueEntry {
    pub id: String,
    /// Insert time for queued listings, dequeue time for dequeued ones.
    pub time: Option<u64>,
}

/// A work queue persisted in a document store.
///
/// Holds no state besides its configuration and the store handle, so clones
/// can be shared freely between producer and worker tasks. All coordination
/// between concurrent callers is left to the store's per-document atomicity.
#[derive(Clone)]
pub struct WorkQueue {
    store: Arc<dyn DocumentStore>,
    config: QueueConfig,
    clock: Arc<dyn Clock>,
    start_keys: Arc<dyn StartKeySource>,
}

impl fmt::Debug for WorkQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkQueue")
            .field("name", &self.store.name())
            .field("config", &self.config)
            .field("clock", &self.clock)
            .finish()
    }
}

impl WorkQueue {
    pub fn new(store: Arc<dyn DocumentStore>, config: QueueConfig) -> Self {
        Self {
            store,
            config,
            clock: Arc::new(SystemClock),
            start_keys: Arc::new(ThreadRngStartKey),
        }
    }

    /// Validate `settings` and connect to the store they describe.
    ///
    /// Fails with `QueueError::Config` when the name, location or
    /// credentials are missing. The bundled local stores do not
    /// authenticate; credentials are checked for presence only.
    pub fn open(settings: &StoreSettings, config: QueueConfig) -> Result<Self> {
        settings.validate()?;
        let store: Arc<dyn DocumentStore> = match settings.resolve_location()? {
            StoreLocation::Memory => Arc::new(MemoryStore::new(settings.name.clone())),
            StoreLocation::RocksDb(path) => {
                Arc::new(RocksDbConnection::open(&path)?.database(settings.name.clone()))
            }
        };
        debug!(
            queue = %settings.name,
            location = %settings.location,
            user = settings.credentials.as_ref().map(|c| c.username.as_str()),
            "store opened, local stores do not authenticate"
        );
        Ok(Self::new(store, config))
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_start_keys(mut self, start_keys: Arc<dyn StartKeySource>) -> Self {
        self.start_keys = start_keys;
        self
    }

    pub fn name(&self) -> &str {
        self.store.name()
    }

    pub fn config(&self) -> QueueConfig {
        self.config
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    /// Create the queue database with its views unless it already exists.
    ///
    /// Meant for deployment time rather than the request path. A concurrent
    /// provisioner winning the race is reported as `AlreadyExists`.
    #[tracing::instrument(skip_all, fields(queue = %self.name()))]
    pub async fn ensure_queue(&self) -> Result<Provisioned> {
        if self.store.exists().await? {
            debug!("queue already provisioned");
            return Ok(Provisioned::AlreadyExists);
        }
        match self.store.create(&queue_design()).await {
            Ok(()) => {
                info!("queue created");
                Ok(Provisioned::Created)
            }
            Err(StoreError::DatabaseExists(_)) => Ok(Provisioned::AlreadyExists),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn check_if_item_exists(&self, id: &str) -> Result<bool> {
        Ok(self.store.get(id).await?.is_some())
    }

    /// The stored `queued` flag, or `None` if the document has none.
    pub async fn check_if_item_is_queued(&self, id: &str) -> Result<Option<bool>> {
        let doc = self
            .store
            .get(id)
            .await?
            .ok_or_else(|| QueueError::ItemNotFound(id.to_string()))?;
        Ok(queued_flag(&doc))
    }

    pub async fn message(&self, id: &str) -> Result<Message> {
        let doc = self
            .store
            .get(id)
            .await?
            .ok_or_else(|| QueueError::ItemNotFound(id.to_string()))?;
        Ok(Message::from_document(&doc))
    }

    /// Number of queued messages, from the reduced count view.
    pub async fn count_queued(&self) -> Result<u64> {
        let count = self.store.query_reduced(design::COUNT_QUEUED).await?;
        Ok(match count {
            Some(Value::Number(n)) => n.as_u64().unwrap_or_else(|| n.as_f64().unwrap_or(0.0) as u64),
            _ => 0,
        })
    }

    /// Queued messages, oldest insert first.
    pub async fn list_queued(&self, limit: usize) -> Result<Vec<QueueEntry>> {
        self.list(design::QUEUED_BY_INSERT_TIME, limit).await
    }

    /// Dequeued messages, earliest dequeue first.
    pub async fn list_dequeued(&self, limit: usize) -> Result<Vec<QueueEntry>> {
        self.list(design::DEQUEUED_BY_DEQUEUE_TIME, limit).await
    }

    async fn list(&self, view: &str, limit: usize) -> Result<Vec<QueueEntry>> {
        let rows = self
            .store
            .query_view(view, &ViewQuery::new().limit(limit))
            .await?;
        Ok(rows
            .into_iter()
            .map(|row| QueueEntry {
                time: row.key.as_u64(),
                id: row.id,
            })
            .collect())
    }
}
