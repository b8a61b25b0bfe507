use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rocksdb::{
    BoundColumnFamily, ColumnFamilyDescriptor, DBWithThreadMode, Direction, IteratorMode,
    MultiThreaded, Options,
};
use serde_json::Value;
use tracing::debug;

use crate::document::{Body, Document, Revision};
use crate::error::{StoreError, StoreResult};
use crate::store::keys;
use crate::store::traits::DocumentStore;
use crate::view::{DesignDocument, ViewQuery, ViewRow};

const CF_DATABASES: &str = "databases";
const CF_DOCUMENTS: &str = "documents";

/// All column family names (excluding `default` which RocksDB creates automatically).
const COLUMN_FAMILIES: &[&str] = &[CF_DATABASES, CF_DOCUMENTS];

type DB = DBWithThreadMode<MultiThreaded>;

struct Shared {
    db: DB,
    /// Serializes read-modify-write sequences so a merge never interleaves
    /// with another write to the same key.
    write_lock: Mutex<()>,
}

/// An open RocksDB instance holding any number of named databases.
#[derive(Clone)]
pub struct RocksDbConnection {
    shared: Arc<Shared>,
}

impl RocksDbConnection {
    /// Open or create a RocksDB instance at the given path with all column families.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let mut db_opts = Options::default();
        db_opts.create_if_missing(true);
        db_opts.create_missing_column_families(true);

        let cf_descriptors: Vec<ColumnFamilyDescriptor> = COLUMN_FAMILIES
            .iter()
            .map(|name| ColumnFamilyDescriptor::new(*name, Options::default()))
            .collect();

        let db = DB::open_cf_descriptors(&db_opts, path, cf_descriptors)?;
        Ok(Self {
            shared: Arc::new(Shared {
                db,
                write_lock: Mutex::new(()),
            }),
        })
    }

    /// Handle to one named database. The database need not exist yet.
    pub fn database(&self, name: impl Into<String>) -> RocksDbDatabase {
        RocksDbDatabase {
            name: name.into(),
            shared: Arc::clone(&self.shared),
        }
    }

    /// Flush memtables to disk.
    pub fn flush(&self) -> StoreResult<()> {
        self.shared.db.flush()?;
        Ok(())
    }
}

/// RocksDB-backed `DocumentStore` for a single named database.
pub struct RocksDbDatabase {
    name: String,
    shared: Arc<Shared>,
}

impl Shared {
    fn cf(&self, name: &str) -> StoreResult<Arc<BoundColumnFamily<'_>>> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StoreError::RocksDb(format!("column family not found: {name}")))
    }

    fn design(&self, database: &str) -> StoreResult<Option<DesignDocument>> {
        let cf = self.cf(CF_DATABASES)?;
        match self.db.get_cf(&cf, keys::database_key(database)?)? {
            Some(value) => Ok(Some(serde_json::from_slice(&value)?)),
            None => Ok(None),
        }
    }

    fn require_design(&self, database: &str) -> StoreResult<DesignDocument> {
        self.design(database)?
            .ok_or_else(|| StoreError::DatabaseNotFound(database.to_string()))
    }

    fn read_document(&self, database: &str, id: &str) -> StoreResult<Option<Document>> {
        let cf = self.cf(CF_DOCUMENTS)?;
        match self.db.get_cf(&cf, keys::document_key(database, id)?)? {
            Some(value) => Ok(Some(serde_json::from_slice(&value)?)),
            None => Ok(None),
        }
    }

    fn write_document(&self, database: &str, doc: &Document) -> StoreResult<()> {
        let cf = self.cf(CF_DOCUMENTS)?;
        let value = serde_json::to_vec(doc)?;
        self.db
            .put_cf(&cf, keys::document_key(database, &doc.id)?, &value)?;
        Ok(())
    }

    fn documents(&self, database: &str) -> StoreResult<Vec<Document>> {
        let cf = self.cf(CF_DOCUMENTS)?;
        let prefix = keys::document_prefix(database)?;
        let iter = self
            .db
            .iterator_cf(&cf, IteratorMode::From(&prefix, Direction::Forward));
        let mut results = Vec::new();
        for item in iter {
            let (key, value) = item?;
            if !key.starts_with(&prefix) {
                break;
            }
            results.push(serde_json::from_slice(&value)?);
        }
        Ok(results)
    }

    fn scan(&self, database: &str, view: &str, query: &ViewQuery) -> StoreResult<Vec<ViewRow>> {
        let design = self.require_design(database)?;
        let definition = design
            .view(view)
            .ok_or_else(|| StoreError::ViewNotFound(view.to_string()))?;
        let docs = self.documents(database)?;
        Ok(definition.scan(&docs, query, &mut rand::thread_rng()))
    }
}

impl RocksDbDatabase {
    /// Run a blocking RocksDB operation off the async executor.
    async fn run<T, F>(&self, op: F) -> StoreResult<T>
    where
        F: FnOnce(&Shared, &str) -> StoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let shared = Arc::clone(&self.shared);
        let name = self.name.clone();
        tokio::task::spawn_blocking(move || op(&shared, &name)).await?
    }
}

#[async_trait]
impl DocumentStore for RocksDbDatabase {
    fn name(&self) -> &str {
        &self.name
    }

    async fn exists(&self) -> StoreResult<bool> {
        self.run(|shared, name| Ok(shared.design(name)?.is_some()))
            .await
    }

    async fn create(&self, design: &DesignDocument) -> StoreResult<()> {
        let value = serde_json::to_vec(design)?;
        self.run(move |shared, name| {
            let _guard = shared.write_lock.lock().map_err(|_| StoreError::LockPoisoned)?;
            if shared.design(name)?.is_some() {
                return Err(StoreError::DatabaseExists(name.to_string()));
            }
            let cf = shared.cf(CF_DATABASES)?;
            shared.db.put_cf(&cf, keys::database_key(name)?, &value)?;
            debug!(database = %name, "database created");
            Ok(())
        })
        .await
    }

    async fn get(&self, id: &str) -> StoreResult<Option<Document>> {
        let id = id.to_owned();
        self.run(move |shared, name| {
            shared.require_design(name)?;
            shared.read_document(name, &id)
        })
        .await
    }

    async fn save(&self, id: &str, body: Body) -> StoreResult<Revision> {
        let id = id.to_owned();
        self.run(move |shared, name| {
            let _guard = shared.write_lock.lock().map_err(|_| StoreError::LockPoisoned)?;
            shared.require_design(name)?;
            let rev = shared
                .read_document(name, &id)?
                .map_or(1, |existing| existing.rev + 1);
            shared.write_document(name, &Document::new(id, rev, body))?;
            Ok(rev)
        })
        .await
    }

    async fn merge(
        &self,
        id: &str,
        partial: Body,
        expected: Option<Revision>,
    ) -> StoreResult<Revision> {
        let id = id.to_owned();
        self.run(move |shared, name| {
            let _guard = shared.write_lock.lock().map_err(|_| StoreError::LockPoisoned)?;
            shared.require_design(name)?;
            let mut doc = shared
                .read_document(name, &id)?
                .ok_or_else(|| StoreError::DocumentNotFound(id.clone()))?;
            if let Some(expected) = expected {
                if doc.rev != expected {
                    return Err(StoreError::Conflict {
                        id,
                        expected,
                        actual: doc.rev,
                    });
                }
            }
            doc.merge(partial);
            doc.rev += 1;
            shared.write_document(name, &doc)?;
            Ok(doc.rev)
        })
        .await
    }

    async fn query_view(&self, view: &str, query: &ViewQuery) -> StoreResult<Vec<ViewRow>> {
        let view = view.to_owned();
        let query = query.clone();
        self.run(move |shared, name| shared.scan(name, &view, &query))
            .await
    }

    async fn query_reduced(&self, view: &str) -> StoreResult<Option<Value>> {
        let view = view.to_owned();
        self.run(move |shared, name| {
            let design = shared.require_design(name)?;
            let definition = design
                .view(&view)
                .ok_or_else(|| StoreError::ViewNotFound(view.clone()))?;
            if definition.reduce.is_none() {
                return Err(StoreError::NotReducible(view.clone()));
            }
            let rows = shared.scan(name, &view, &ViewQuery::new())?;
            Ok(definition.reduce(&rows))
        })
        .await
    }
}
