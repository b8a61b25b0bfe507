use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use super::*;
use crate::document::{Body, Document, Revision};
use crate::error::StoreResult;
use crate::view::{DesignDocument, ViewRow};

pub(super) const QUEUE: &str = "jobs";

/// Queue over a fresh in-memory store, with a manual clock.
pub(super) fn test_queue(order: Order) -> (WorkQueue, MemoryStore, Arc<ManualClock>) {
    let store = MemoryStore::new(QUEUE);
    let clock = Arc::new(ManualClock::default());
    let queue = WorkQueue::new(
        Arc::new(store.clone()),
        QueueConfig::default().with_order(order),
    )
    .with_clock(clock.clone());
    (queue, store, clock)
}

/// Helper: a queue that is already provisioned.
pub(super) async fn provisioned_queue(order: Order) -> (WorkQueue, MemoryStore, Arc<ManualClock>) {
    let (queue, store, clock) = test_queue(order);
    queue.ensure_queue().await.unwrap();
    (queue, store, clock)
}

/// Helper: enqueue every id, asserting each was written.
pub(super) async fn enqueue_all(queue: &WorkQueue, ids: &[&str]) {
    for id in ids {
        let outcome = queue.enqueue(id).await.unwrap();
        assert!(outcome.is_written(), "{id} not written: {outcome:?}");
    }
}

/// Always starts random scans at the same key.
#[derive(Debug)]
pub(super) struct FixedStartKey(pub u64);

impl StartKeySource for FixedStartKey {
    fn draw(&self, _upper: u64) -> u64 {
        self.0
    }
}

/// Faults a `FaultyStore` injects in front of a `MemoryStore`.
#[derive(Debug, Default)]
pub(super) struct Faults {
    /// `save` of this id fails with a RocksDB error.
    pub fail_save_for: Option<String>,
    /// `exists` always answers false.
    pub hide_existence: bool,
    /// `query_reduced` reports this count regardless of contents.
    pub stale_count: Option<u64>,
    /// `get` bumps the document's revision right after reading it, as if
    /// another writer got in between.
    pub write_after_get: bool,
    /// `get` of this id answers `None`, as if a racing producer had not
    /// written it yet.
    pub hide_on_get: Option<String>,
    /// `get` of these ids completes only after the given delay.
    pub get_delays: HashMap<String, Duration>,
}

pub(super) struct FaultyStore {
    pub inner: MemoryStore,
    pub faults: Faults,
    /// Start keys of every query against the random-order view.
    pub random_starts: Mutex<Vec<Option<Value>>>,
}

impl FaultyStore {
    pub(super) fn new(inner: MemoryStore, faults: Faults) -> Arc<Self> {
        Arc::new(Self {
            inner,
            faults,
            random_starts: Mutex::new(Vec::new()),
        })
    }

    pub(super) fn random_starts(&self) -> Vec<Option<Value>> {
        self.random_starts.lock().unwrap().clone()
    }
}

#[async_trait]
impl DocumentStore for FaultyStore {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn exists(&self) -> StoreResult<bool> {
        if self.faults.hide_existence {
            return Ok(false);
        }
        self.inner.exists().await
    }

    async fn create(&self, design: &DesignDocument) -> StoreResult<()> {
        self.inner.create(design).await
    }

    async fn get(&self, id: &str) -> StoreResult<Option<Document>> {
        if let Some(delay) = self.faults.get_delays.get(id) {
            tokio::time::sleep(*delay).await;
        }
        if self.faults.hide_on_get.as_deref() == Some(id) {
            return Ok(None);
        }
        let doc = self.inner.get(id).await?;
        if self.faults.write_after_get && doc.is_some() {
            self.inner.merge(id, Body::new(), None).await?;
        }
        Ok(doc)
    }

    async fn save(&self, id: &str, body: Body) -> StoreResult<Revision> {
        if self.faults.fail_save_for.as_deref() == Some(id) {
            return Err(StoreError::RocksDb("injected write failure".to_string()));
        }
        self.inner.save(id, body).await
    }

    async fn merge(
        &self,
        id: &str,
        partial: Body,
        expected: Option<Revision>,
    ) -> StoreResult<Revision> {
        self.inner.merge(id, partial, expected).await
    }

    async fn query_view(&self, view: &str, query: &ViewQuery) -> StoreResult<Vec<ViewRow>> {
        if view == design::RANDOM_ORDER {
            self.random_starts.lock().unwrap().push(query.start_key.clone());
        }
        self.inner.query_view(view, query).await
    }

    async fn query_reduced(&self, view: &str) -> StoreResult<Option<Value>> {
        if let Some(count) = self.faults.stale_count {
            return Ok(Some(Value::from(count)));
        }
        self.inner.query_reduced(view).await
    }
}

/// Helper: a provisioned queue behind a `FaultyStore`.
pub(super) async fn faulty_queue(
    order: Order,
    faults: Faults,
) -> (WorkQueue, Arc<FaultyStore>, MemoryStore) {
    let inner = MemoryStore::new(QUEUE);
    inner.create(&queue_design()).await.unwrap();
    let store = FaultyStore::new(inner.clone(), faults);
    let queue = WorkQueue::new(store.clone(), QueueConfig::default().with_order(order))
        .with_clock(Arc::new(ManualClock::default()));
    (queue, store, inner)
}
