//! Declarative secondary views over a document set.
//!
//! A view is plain data (filter, key projection, value projection, optional
//! reducer) so it can be persisted alongside the database it indexes. Every
//! scan evaluates the view against the current documents:
//!
//! 1. keep documents matching all filter predicates
//! 2. project each one to a `(key, value)` row
//! 3. sort rows by key (JSON collation), then by document id
//! 4. reverse when `descending`, skip rows before `start_key`, apply `limit`
//!
//! `KeyExpr::Random` draws a fresh key for every row on every scan. The key is
//! never written back to the document, so two scans of the same unchanged
//! document may place it at different positions.

use std::cmp::Ordering;

use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

use crate::document::{is_truthy, Document};

/// A filter clause; a document is indexed only when every clause matches.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", content = "field", rename_all = "snake_case")]
pub enum Predicate {
    Truthy(String),
    Falsy(String),
    Present(String),
}

impl Predicate {
    fn matches(&self, doc: &Document) -> bool {
        match self {
            Predicate::Truthy(field) => is_truthy(doc.field(field)),
            Predicate::Falsy(field) => !is_truthy(doc.field(field)),
            Predicate::Present(field) => doc.field(field).is_some(),
        }
    }
}

/// How a row's key is derived.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum KeyExpr {
    Field { field: String },
    Null,
    /// Uniform integer in `[0, upper)`, resampled per row per scan.
    Random { upper: u64 },
}

/// How a row's value is derived.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValueExpr {
    Id,
    Field { field: String },
    Constant { value: Value },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Reducer {
    /// Sum of numeric row values. Integers stay exact while they fit a u64.
    Sum,
    /// Number of rows.
    Count,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ViewDefinition {
    pub name: String,
    #[serde(default)]
    pub filter: Vec<Predicate>,
    pub key: KeyExpr,
    pub value: ValueExpr,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reduce: Option<Reducer>,
}

/// A named group of views installed together when a database is created.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DesignDocument {
    pub name: String,
    pub views: Vec<ViewDefinition>,
}

impl DesignDocument {
    pub fn view(&self, name: &str) -> Option<&ViewDefinition> {
        self.views.iter().find(|v| v.name == name)
    }
}

/// Scan parameters. The default scans every row in ascending key order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewQuery {
    pub start_key: Option<Value>,
    pub limit: Option<usize>,
    pub descending: bool,
}

impl ViewQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start_key(mut self, key: impl Into<Value>) -> Self {
        self.start_key = Some(key.into());
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn descending(mut self, descending: bool) -> Self {
        self.descending = descending;
        self
    }
}

/// One projected row of a view scan.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ViewRow {
    pub id: String,
    pub key: Value,
    pub value: Value,
}

impl ViewDefinition {
    pub fn new(name: impl Into<String>, key: KeyExpr, value: ValueExpr) -> Self {
        Self {
            name: name.into(),
            filter: Vec::new(),
            key,
            value,
            reduce: None,
        }
    }

    pub fn with_filter(mut self, predicate: Predicate) -> Self {
        self.filter.push(predicate);
        self
    }

    pub fn with_reducer(mut self, reducer: Reducer) -> Self {
        self.reduce = Some(reducer);
        self
    }

    /// Project a single document, or `None` when the filter rejects it.
    pub fn map<R: Rng + ?Sized>(&self, doc: &Document, rng: &mut R) -> Option<ViewRow> {
        if !self.filter.iter().all(|p| p.matches(doc)) {
            return None;
        }

        let key = match &self.key {
            KeyExpr::Field { field } => doc.field(field).cloned().unwrap_or(Value::Null),
            KeyExpr::Null => Value::Null,
            KeyExpr::Random { upper } => Value::from(rng.gen_range(0..(*upper).max(1))),
        };
        let value = match &self.value {
            ValueExpr::Id => Value::String(doc.id.clone()),
            ValueExpr::Field { field } => doc.field(field).cloned().unwrap_or(Value::Null),
            ValueExpr::Constant { value } => value.clone(),
        };

        Some(ViewRow {
            id: doc.id.clone(),
            key,
            value,
        })
    }

    /// Evaluate the view over `docs` and return the rows selected by `query`.
    pub fn scan<'a, I, R>(&self, docs: I, query: &ViewQuery, rng: &mut R) -> Vec<ViewRow>
    where
        I: IntoIterator<Item = &'a Document>,
        R: Rng + ?Sized,
    {
        let mut rows: Vec<ViewRow> = docs
            .into_iter()
            .filter_map(|doc| self.map(doc, rng))
            .collect();
        rows.sort_by(|a, b| collate(&a.key, &b.key).then_with(|| a.id.cmp(&b.id)));
        if query.descending {
            rows.reverse();
        }

        // Rows are sorted, so everything before the start key is a prefix.
        let before_start = if query.descending {
            Ordering::Greater
        } else {
            Ordering::Less
        };
        let iter = rows.into_iter().skip_while(|row| match &query.start_key {
            Some(start) => collate(&row.key, start) == before_start,
            None => false,
        });

        match query.limit {
            Some(limit) => iter.take(limit).collect(),
            None => iter.collect(),
        }
    }

    /// Aggregate rows with the view's reducer. `None` when there are no rows
    /// or the view has no reducer.
    pub fn reduce(&self, rows: &[ViewRow]) -> Option<Value> {
        let reducer = self.reduce?;
        if rows.is_empty() {
            return None;
        }
        Some(match reducer {
            Reducer::Count => Value::from(rows.len() as u64),
            Reducer::Sum => sum(rows.iter().map(|r| &r.value)),
        })
    }
}

fn sum<'a>(values: impl Iterator<Item = &'a Value>) -> Value {
    let mut exact = Some(0u64);
    let mut approx = 0.0f64;
    for value in values {
        exact = match (exact, value.as_u64()) {
            (Some(acc), Some(n)) => acc.checked_add(n),
            _ => None,
        };
        approx += value.as_f64().unwrap_or(0.0);
    }
    exact.map(Value::from).unwrap_or_else(|| Value::from(approx))
}

/// Total order over JSON keys:
/// null < false < true < numbers < strings < arrays < objects.
/// Arrays compare element-wise, objects entry-wise in stored order.
pub fn collate(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => compare_numbers(x, y),
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Array(x), Value::Array(y)) => x
            .iter()
            .zip(y.iter())
            .map(|(l, r)| collate(l, r))
            .find(|o| o.is_ne())
            .unwrap_or_else(|| x.len().cmp(&y.len())),
        (Value::Object(x), Value::Object(y)) => x
            .iter()
            .zip(y.iter())
            .map(|((lk, lv), (rk, rv))| lk.cmp(rk).then_with(|| collate(lv, rv)))
            .find(|o| o.is_ne())
            .unwrap_or_else(|| x.len().cmp(&y.len())),
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(false) => 1,
        Value::Bool(true) => 2,
        Value::Number(_) => 3,
        Value::String(_) => 4,
        Value::Array(_) => 5,
        Value::Object(_) => 6,
    }
}

fn compare_numbers(x: &Number, y: &Number) -> Ordering {
    if let (Some(a), Some(b)) = (x.as_u64(), y.as_u64()) {
        return a.cmp(&b);
    }
    if let (Some(a), Some(b)) = (x.as_i64(), y.as_i64()) {
        return a.cmp(&b);
    }
    let a = x.as_f64().unwrap_or(0.0);
    let b = y.as_f64().unwrap_or(0.0);
    a.total_cmp(&b)
}
