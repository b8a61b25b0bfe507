use async_trait::async_trait;
use serde_json::Value;

use crate::document::{Body, Document, Revision};
use crate::error::StoreResult;
use crate::view::{DesignDocument, ViewQuery, ViewRow};

/// A single named database in a document store.
///
/// Implementations must be thread-safe and make every single-document write
/// atomic. Nothing else is atomic: callers that check and then write race
/// against other callers.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Database name.
    fn name(&self) -> &str;

    /// Whether the database has been created.
    async fn exists(&self) -> StoreResult<bool>;

    /// Create the database and install `design` in the same write.
    /// Fails with `DatabaseExists` when the database is already present.
    async fn create(&self, design: &DesignDocument) -> StoreResult<()>;

    /// Fetch a document by id.
    async fn get(&self, id: &str) -> StoreResult<Option<Document>>;

    /// Replace (or create) a document with `body`. Returns the new revision.
    async fn save(&self, id: &str, body: Body) -> StoreResult<Revision>;

    /// Merge `partial` into an existing document, keeping fields it does not
    /// name. When `expected` is set the write only happens if the stored
    /// revision still matches, otherwise it fails with `Conflict`.
    async fn merge(
        &self,
        id: &str,
        partial: Body,
        expected: Option<Revision>,
    ) -> StoreResult<Revision>;

    /// Scan a view of the installed design document.
    async fn query_view(&self, view: &str, query: &ViewQuery) -> StoreResult<Vec<ViewRow>>;

    /// Reduce every row of a view to a single value. `None` when the view
    /// has no rows.
    async fn query_reduced(&self, view: &str) -> StoreResult<Option<Value>>;
}
