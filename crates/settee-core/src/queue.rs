use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::QueueError;

/// Policy used by `next()` to pick among queued messages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Order {
    /// Oldest insert time first.
    Fifo,
    /// Newest insert time first.
    Lifo,
    /// A random queued message, so racing workers tend to pick different ones.
    #[default]
    Random,
}

impl FromStr for Order {
    type Err = QueueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "fifo" | "f" => Ok(Order::Fifo),
            "lifo" | "l" => Ok(Order::Lifo),
            "random" | "r" => Ok(Order::Random),
            other => Err(QueueError::Config(format!(
                "unknown order \"{other}\", expected fifo, lifo or random"
            ))),
        }
    }
}

impl TryFrom<String> for Order {
    type Error = QueueError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Order> for String {
    fn from(order: Order) -> Self {
        order.to_string()
    }
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Order::Fifo => "fifo",
            Order::Lifo => "lifo",
            Order::Random => "random",
        })
    }
}

/// Per-queue behaviour, fixed at construction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    pub order: Order,
    /// Enqueue rewrites existing messages instead of leaving them untouched.
    #[serde(rename = "override")]
    pub override_existing: bool,
}

impl QueueConfig {
    pub fn with_order(mut self, order: Order) -> Self {
        self.order = order;
        self
    }

    pub fn with_override(mut self, override_existing: bool) -> Self {
        self.override_existing = override_existing;
        self
    }

    /// Enqueue options matching this configuration.
    pub fn enqueue_options(&self) -> EnqueueOptions {
        EnqueueOptions {
            override_existing: self.override_existing,
        }
    }
}

/// Options for a single enqueue call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnqueueOptions {
    pub override_existing: bool,
}

impl EnqueueOptions {
    /// Force the message back into rotation, discarding any dequeue state.
    pub fn overriding() -> Self {
        Self {
            override_existing: true,
        }
    }
}
