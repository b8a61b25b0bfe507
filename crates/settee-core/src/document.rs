use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Monotonic per-document write counter. The first write of a document
/// produces revision 1.
pub type Revision = u64;

/// JSON object holding a document's fields.
pub type Body = Map<String, Value>;

/// A stored document: its key, current revision and field body.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    pub id: String,
    pub rev: Revision,
    pub body: Body,
}

impl Document {
    pub fn new(id: impl Into<String>, rev: Revision, body: Body) -> Self {
        Self {
            id: id.into(),
            rev,
            body,
        }
    }

    /// Look up a top-level field. Explicit `null` reads as absent.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.body.get(name).filter(|v| !v.is_null())
    }

    /// Shallow merge: fields in `partial` replace fields of the same name,
    /// everything else is preserved.
    pub fn merge(&mut self, partial: Body) {
        self.body.extend(partial);
    }
}

/// JSON truthiness: absent, `null`, `false`, `0` and `""` are falsy.
pub fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
    }
}
