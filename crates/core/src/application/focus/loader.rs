// Queue Loader - batched lookup with order restoration

use crate::domain::QueueItem;
use crate::error::Result;
use crate::port::QueueSource;
use std::collections::HashMap;
use tracing::debug;

/// Load the items for `ids` in the caller's order.
///
/// Lookups are issued one chunk at a time, each at most `source.batch_limit()` ids.
/// The store gives no ordering promise, so the merged set is re-sorted to match `ids`.
/// Ids the store does not know are dropped. Any failed chunk fails the whole load.
pub async fn load_queue(source: &dyn QueueSource, ids: &[String]) -> Result<Vec<QueueItem>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let limit = source.batch_limit().max(1);
    let mut fetched = Vec::with_capacity(ids.len());

    for (batch, chunk) in ids.chunks(limit).enumerate() {
        debug!(batch, size = chunk.len(), "Fetching queue batch");
        fetched.extend(source.fetch_batch(chunk).await?);
    }

    Ok(restore_order(fetched, ids))
}

fn restore_order(items: Vec<QueueItem>, ids: &[String]) -> Vec<QueueItem> {
    let mut by_id: HashMap<String, QueueItem> =
        items.into_iter().map(|item| (item.id.clone(), item)).collect();

    ids.iter().filter_map(|id| by_id.remove(id)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::focus::source::TaskQueueSource;
    use crate::domain::{Task, TaskNature};
    use crate::port::mocks::InMemoryStore;
    use std::sync::Arc;

    fn tasks(n: usize) -> Vec<Task> {
        (0..n)
            .map(|i| {
                Task::new(
                    format!("t-{}", i),
                    i as i64,
                    format!("l-{}", i),
                    format!("Lead {}", i),
                    "Day 1 Follow-up",
                    TaskNature::Interactive,
                    None,
                )
            })
            .collect()
    }

    fn ids(range: impl Iterator<Item = usize>) -> Vec<String> {
        range.map(|i| format!("t-{}", i)).collect()
    }

    #[tokio::test]
    async fn test_single_batch_keeps_input_order() {
        let store = Arc::new(InMemoryStore::new().with_tasks(tasks(10)));
        let source = TaskQueueSource::new(store.clone());

        let wanted = vec!["t-3".to_string(), "t-0".to_string(), "t-7".to_string()];
        let items = load_queue(&source, &wanted).await.unwrap();

        let got: Vec<&str> = items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(got, vec!["t-3", "t-0", "t-7"]);
        assert_eq!(store.batch_calls(), 1);
    }

    #[tokio::test]
    async fn test_45_ids_use_two_batches() {
        let store = Arc::new(InMemoryStore::new().with_tasks(tasks(45)));
        let source = TaskQueueSource::new(store.clone());

        let wanted = ids(0..45);
        let items = load_queue(&source, &wanted).await.unwrap();

        assert_eq!(store.batch_calls(), 2);
        let got: Vec<String> = items.into_iter().map(|i| i.id).collect();
        assert_eq!(got, wanted);
    }

    #[tokio::test]
    async fn test_unknown_ids_are_dropped() {
        let store = Arc::new(InMemoryStore::new().with_tasks(tasks(2)));
        let source = TaskQueueSource::new(store);

        let wanted = vec!["t-1".to_string(), "missing".to_string(), "t-0".to_string()];
        let items = load_queue(&source, &wanted).await.unwrap();

        let got: Vec<&str> = items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(got, vec!["t-1", "t-0"]);
    }

    #[tokio::test]
    async fn test_empty_ids_issue_no_request() {
        let store = Arc::new(InMemoryStore::new().with_tasks(tasks(3)));
        let source = TaskQueueSource::new(store.clone());

        let items = load_queue(&source, &[]).await.unwrap();

        assert!(items.is_empty());
        assert_eq!(store.batch_calls(), 0);
    }

    #[tokio::test]
    async fn test_failed_batch_fails_the_load() {
        let store = Arc::new(InMemoryStore::new().with_tasks(tasks(3)));
        store.fail_batches(true);
        let source = TaskQueueSource::new(store);

        assert!(load_queue(&source, &ids(0..3)).await.is_err());
    }
}
