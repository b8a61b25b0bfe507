use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::document::{Body, Document, Revision};
use crate::error::{StoreError, StoreResult};
use crate::store::traits::DocumentStore;
use crate::view::{DesignDocument, ViewQuery, ViewRow};

#[derive(Debug)]
struct MemoryDatabase {
    design: DesignDocument,
    docs: BTreeMap<String, Document>,
}

/// In-process document store. Clones share the same database, so several
/// queue handles built from clones behave like workers on one store.
#[derive(Clone)]
pub struct MemoryStore {
    name: String,
    state: Arc<RwLock<Option<MemoryDatabase>>>,
}

impl fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryStore")
            .field("name", &self.name)
            .field("state", &"<RwLock<Option<MemoryDatabase>>>")
            .finish()
    }
}

impl MemoryStore {
    /// A handle to a database that has not been created yet.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: Arc::new(RwLock::new(None)),
        }
    }

    fn missing(&self) -> StoreError {
        StoreError::DatabaseNotFound(self.name.clone())
    }

    fn scan(db: &MemoryDatabase, view: &str, query: &ViewQuery) -> StoreResult<Vec<ViewRow>> {
        let definition = db
            .design
            .view(view)
            .ok_or_else(|| StoreError::ViewNotFound(view.to_string()))?;
        Ok(definition.scan(db.docs.values(), query, &mut rand::thread_rng()))
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    fn name(&self) -> &str {
        &self.name
    }

    async fn exists(&self) -> StoreResult<bool> {
        Ok(self.state.read().await.is_some())
    }

    async fn create(&self, design: &DesignDocument) -> StoreResult<()> {
        let mut state = self.state.write().await;
        if state.is_some() {
            return Err(StoreError::DatabaseExists(self.name.clone()));
        }
        *state = Some(MemoryDatabase {
            design: design.clone(),
            docs: BTreeMap::new(),
        });
        Ok(())
    }

    async fn get(&self, id: &str) -> StoreResult<Option<Document>> {
        if id.is_empty() {
            return Err(StoreError::InvalidKey("document id is empty".to_string()));
        }
        let state = self.state.read().await;
        let db = state.as_ref().ok_or_else(|| self.missing())?;
        Ok(db.docs.get(id).cloned())
    }

    async fn save(&self, id: &str, body: Body) -> StoreResult<Revision> {
        if id.is_empty() {
            return Err(StoreError::InvalidKey("document id is empty".to_string()));
        }
        let mut state = self.state.write().await;
        let db = state.as_mut().ok_or_else(|| self.missing())?;
        let rev = db.docs.get(id).map_or(1, |existing| existing.rev + 1);
        db.docs.insert(id.to_string(), Document::new(id, rev, body));
        Ok(rev)
    }

    async fn merge(
        &self,
        id: &str,
        partial: Body,
        expected: Option<Revision>,
    ) -> StoreResult<Revision> {
        let mut state = self.state.write().await;
        let db = state.as_mut().ok_or_else(|| self.missing())?;
        let doc = db
            .docs
            .get_mut(id)
            .ok_or_else(|| StoreError::DocumentNotFound(id.to_string()))?;
        if let Some(expected) = expected {
            if doc.rev != expected {
                return Err(StoreError::Conflict {
                    id: id.to_string(),
                    expected,
                    actual: doc.rev,
                });
            }
        }
        doc.merge(partial);
        doc.rev += 1;
        Ok(doc.rev)
    }

    async fn query_view(&self, view: &str, query: &ViewQuery) -> StoreResult<Vec<ViewRow>> {
        let state = self.state.read().await;
        let db = state.as_ref().ok_or_else(|| self.missing())?;
        Self::scan(db, view, query)
    }

    async fn query_reduced(&self, view: &str) -> StoreResult<Option<Value>> {
        let state = self.state.read().await;
        let db = state.as_ref().ok_or_else(|| self.missing())?;
        let definition = db
            .design
            .view(view)
            .ok_or_else(|| StoreError::ViewNotFound(view.to_string()))?;
        if definition.reduce.is_none() {
            return Err(StoreError::NotReducible(view.to_string()));
        }
        let rows = Self::scan(db, view, &ViewQuery::new())?;
        Ok(definition.reduce(&rows))
    }
}
