//! Views installed with every queue database.

use serde_json::json;

use crate::message::{FIELD_DEQUEUE_TIME, FIELD_INSERT_TIME, FIELD_QUEUED};
use crate::view::{DesignDocument, KeyExpr, Predicate, Reducer, ValueExpr, ViewDefinition};

pub const DESIGN_NAME: &str = "queue";

/// Queued messages keyed by insert time, value = id.
pub const QUEUED_BY_INSERT_TIME: &str = "queued_by_insert_time";
/// Dequeued messages keyed by dequeue time, value = id.
pub const DEQUEUED_BY_DEQUEUE_TIME: &str = "dequeued_by_dequeue_time";
/// Reduced count of queued messages.
pub const COUNT_QUEUED: &str = "count_queued";
/// Selection view for FIFO (ascending) and LIFO (descending).
pub const INSERT_TIME_ORDER: &str = "insert_time_order";
/// Selection view for random order: key resampled per scan, value = insert time.
pub const RANDOM_ORDER: &str = "random_order";

/// Random keys are drawn from `[0, RANDOM_KEY_SPACE)`.
pub const RANDOM_KEY_SPACE: u64 = 1_000_000_000;

fn field(name: &str) -> String {
    name.to_string()
}

pub fn queue_design() -> DesignDocument {
    DesignDocument {
        name: DESIGN_NAME.to_string(),
        views: vec![
            ViewDefinition::new(
                QUEUED_BY_INSERT_TIME,
                KeyExpr::Field {
                    field: field(FIELD_INSERT_TIME),
                },
                ValueExpr::Id,
            )
            .with_filter(Predicate::Truthy(field(FIELD_QUEUED))),
            ViewDefinition::new(
                DEQUEUED_BY_DEQUEUE_TIME,
                KeyExpr::Field {
                    field: field(FIELD_DEQUEUE_TIME),
                },
                ValueExpr::Id,
            )
            .with_filter(Predicate::Falsy(field(FIELD_QUEUED))),
            ViewDefinition::new(
                COUNT_QUEUED,
                KeyExpr::Null,
                ValueExpr::Constant { value: json!(1) },
            )
            .with_filter(Predicate::Truthy(field(FIELD_QUEUED)))
            .with_reducer(Reducer::Sum),
            ViewDefinition::new(
                INSERT_TIME_ORDER,
                KeyExpr::Field {
                    field: field(FIELD_INSERT_TIME),
                },
                ValueExpr::Id,
            )
            .with_filter(Predicate::Truthy(field(FIELD_QUEUED)))
            .with_filter(Predicate::Present(field(FIELD_INSERT_TIME))),
            ViewDefinition::new(
                RANDOM_ORDER,
                KeyExpr::Random {
                    upper: RANDOM_KEY_SPACE,
                },
                ValueExpr::Field {
                    field: field(FIELD_INSERT_TIME),
                },
            )
            .with_filter(Predicate::Truthy(field(FIELD_QUEUED)))
            .with_filter(Predicate::Present(field(FIELD_INSERT_TIME))),
        ],
    }
}
