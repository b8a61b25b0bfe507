pub mod clock;
pub mod config;
pub mod design;
pub mod document;
pub mod error;
pub mod message;
pub mod queue;
pub mod store;
pub mod telemetry;
pub mod view;
mod work_queue;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{Credentials, SetteeConfig, StoreLocation, StoreSettings, TelemetryConfig};
pub use document::{Body, Document, Revision};
pub use error::{QueueError, Result, StoreError, StoreResult};
pub use message::Message;
pub use queue::{EnqueueOptions, Order, QueueConfig};
pub use store::{DocumentStore, MemoryStore, RocksDbConnection, RocksDbDatabase};
pub use work_queue::{
    BatchEntry, DequeueOutcome, EnqueueOutcome, NextItem, Provisioned, QueueEntry,
    StartKeySource, ThreadRngStartKey, WorkQueue,
};
