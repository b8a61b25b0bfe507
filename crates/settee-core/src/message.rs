use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::document::{is_truthy, Body, Document};

pub const FIELD_QUEUED: &str = "queued";
pub const FIELD_INSERT_TIME: &str = "insert_time";
pub const FIELD_DEQUEUE_TIME: &str = "dequeue_time";

/// Queue state of one message document. Timestamps are nanoseconds since
/// the UNIX epoch. `dequeue_time` is set exactly when `queued` is false.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    pub id: String,
    pub queued: bool,
    pub insert_time: Option<u64>,
    pub dequeue_time: Option<u64>,
}

impl Message {
    pub fn from_document(doc: &Document) -> Self {
        Self {
            id: doc.id.clone(),
            queued: is_truthy(doc.field(FIELD_QUEUED)),
            insert_time: doc.field(FIELD_INSERT_TIME).and_then(Value::as_u64),
            dequeue_time: doc.field(FIELD_DEQUEUE_TIME).and_then(Value::as_u64),
        }
    }

    /// Body written on enqueue. It replaces the whole document, so any
    /// earlier `dequeue_time` is dropped.
    pub(crate) fn queued_body(insert_time: u64) -> Body {
        let mut body = Body::new();
        body.insert(FIELD_QUEUED.to_string(), Value::Bool(true));
        body.insert(FIELD_INSERT_TIME.to_string(), Value::from(insert_time));
        body
    }

    /// Partial update applied on dequeue.
    pub(crate) fn dequeued_patch(dequeue_time: u64) -> Body {
        let mut patch = Body::new();
        patch.insert(FIELD_QUEUED.to_string(), Value::Bool(false));
        patch.insert(FIELD_DEQUEUE_TIME.to_string(), Value::from(dequeue_time));
        patch
    }
}

/// The `queued` flag as stored, or `None` when the document has no flag.
pub(crate) fn queued_flag(doc: &Document) -> Option<bool> {
    doc.field(FIELD_QUEUED).map(|v| is_truthy(Some(v)))
}
