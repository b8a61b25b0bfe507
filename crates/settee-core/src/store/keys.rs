//! Key encoding for the RocksDB column families.
//!
//! Document keys are `{database}:{doc_id}` where the database name is
//! length-prefixed with a big-endian u16, so every document of one database
//! shares a prefix and no database name can be a prefix of another's keys.
//! The document id is appended raw and is always the last component.

use crate::error::{StoreError, StoreResult};

const SEPARATOR: u8 = b':';

/// Encode a variable-length string with a 2-byte big-endian length prefix.
fn encode_string(s: &str) -> StoreResult<Vec<u8>> {
    let len = u16::try_from(s.len())
        .map_err(|_| StoreError::InvalidKey(format!("key component exceeds 64 KiB: {s:.32}")))?;
    let mut buf = Vec::with_capacity(2 + s.len());
    buf.extend_from_slice(&len.to_be_bytes());
    buf.extend_from_slice(s.as_bytes());
    Ok(buf)
}

/// Build a prefix for iterating all documents of a database.
pub fn document_prefix(database: &str) -> StoreResult<Vec<u8>> {
    let mut prefix = encode_string(database)?;
    prefix.push(SEPARATOR);
    Ok(prefix)
}

/// Build a document key: `{database}:{doc_id}`.
pub fn document_key(database: &str, doc_id: &str) -> StoreResult<Vec<u8>> {
    if doc_id.is_empty() {
        return Err(StoreError::InvalidKey("document id is empty".to_string()));
    }
    let mut key = document_prefix(database)?;
    key.extend_from_slice(doc_id.as_bytes());
    Ok(key)
}

/// Key of a database's record in the `databases` column family.
pub fn database_key(database: &str) -> StoreResult<Vec<u8>> {
    if database.is_empty() {
        return Err(StoreError::InvalidKey("database name is empty".to_string()));
    }
    encode_string(database)
}
