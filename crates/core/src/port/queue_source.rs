// Queue Source Port - batched lookup of queue items

use crate::domain::QueueItem;
use crate::error::Result;
use async_trait::async_trait;

/// Collection a focus queue is loaded from
#[async_trait]
pub trait QueueSource: Send + Sync {
    /// Maximum ids per `fetch_batch` call
    fn batch_limit(&self) -> usize;

    /// Multi-id lookup. No ordering promise; missing ids are simply absent.
    async fn fetch_batch(&self, ids: &[String]) -> Result<Vec<QueueItem>>;
}
