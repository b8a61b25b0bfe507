use rand::Rng;

use super::*;
use crate::design::{INSERT_TIME_ORDER, RANDOM_KEY_SPACE, RANDOM_ORDER};
use crate::queue::Order;
use crate::view::ViewRow;

/// Draws the start key of a random-order scan.
pub trait StartKeySource: Send + Sync {
    /// A key in `[0, upper)`.
    fn draw(&self, upper: u64) -> u64;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRngStartKey;

impl StartKeySource for ThreadRngStartKey {
    fn draw(&self, upper: u64) -> u64 {
        rand::thread_rng().gen_range(0..upper.max(1))
    }
}

/// The message selected by `next()`. Selection does not claim it: call
/// `dequeue` to mark it taken.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NextItem {
    pub id: String,
    pub insert_time: Option<u64>,
}

impl WorkQueue {
    /// Select the next message using the configured order.
    pub async fn next(&self) -> Result<NextItem> {
        self.next_with(self.config.order).await
    }

    /// Select the next message using `order` for this call only.
    ///
    /// Fails with `EmptyQueue` when nothing is queued, including when the
    /// queue drains between the count check and the scan. Two concurrent
    /// calls may return the same message.
    #[tracing::instrument(skip_all, fields(queue = %self.name(), %order))]
    pub async fn next_with(&self, order: Order) -> Result<NextItem> {
        if self.count_queued().await? == 0 {
            return Err(QueueError::EmptyQueue(self.name().to_string()));
        }

        let item = match order {
            Order::Fifo => self.scan_insert_time_order(false).await?,
            Order::Lifo => self.scan_insert_time_order(true).await?,
            Order::Random => self.scan_random_order().await?,
        };

        item.ok_or_else(|| {
            debug!("queue drained during selection");
            QueueError::EmptyQueue(self.name().to_string())
        })
    }

    async fn scan_insert_time_order(&self, descending: bool) -> Result<Option<NextItem>> {
        let query = ViewQuery::new().limit(1).descending(descending);
        let rows = self.store.query_view(INSERT_TIME_ORDER, &query).await?;
        Ok(rows.into_iter().next().map(|row| NextItem {
            insert_time: row.key.as_u64(),
            id: row.id,
        }))
    }

    /// Start at a random key; if no row sorts at or after it, wrap around
    /// and scan once more from zero.
    async fn scan_random_order(&self) -> Result<Option<NextItem>> {
        let start_key = self.start_keys.draw(RANDOM_KEY_SPACE);
        if let Some(item) = self.scan_random_from(start_key).await? {
            return Ok(Some(item));
        }
        debug!(start_key, "nothing at or above start key, wrapping around");
        self.scan_random_from(0).await
    }

    async fn scan_random_from(&self, start_key: u64) -> Result<Option<NextItem>> {
        let query = ViewQuery::new().start_key(start_key).limit(1);
        let rows = self.store.query_view(RANDOM_ORDER, &query).await?;
        Ok(rows.into_iter().next().map(random_row_item))
    }
}

fn random_row_item(row: ViewRow) -> NextItem {
    NextItem {
        insert_time: row.value.as_u64(),
        id: row.id,
    }
}
