// Associated-Record Fetcher - lazy, de-duplicated lead lookups

use crate::domain::{Lead, LeadId};
use crate::port::{LeadRepository, Notice, Notifier};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use tokio::sync::OnceCell;
use tracing::{debug, warn};

type InFlight = Arc<OnceCell<Option<Lead>>>;

/// Caches leads by id. Concurrent requests for the same uncached id share one lookup.
pub struct AssociatedRecordFetcher {
    leads: Arc<dyn LeadRepository>,
    notifier: Arc<dyn Notifier>,
    cache: Mutex<HashMap<LeadId, Lead>>,
    in_flight: Mutex<HashMap<LeadId, InFlight>>,
    /// Ids whose last lookup came back empty or failed
    misses: Mutex<HashSet<LeadId>>,
}

impl AssociatedRecordFetcher {
    pub fn new(leads: Arc<dyn LeadRepository>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            leads,
            notifier,
            cache: Mutex::new(HashMap::new()),
            in_flight: Mutex::new(HashMap::new()),
            misses: Mutex::new(HashSet::new()),
        }
    }

    pub fn cached(&self, id: &str) -> Option<Lead> {
        self.cache.lock().unwrap().get(id).cloned()
    }

    /// True while a lookup for `id` is running
    pub fn is_loading(&self, id: &str) -> bool {
        self.in_flight
            .lock()
            .unwrap()
            .get(id)
            .is_some_and(|cell| !cell.initialized())
    }

    /// True once a lookup for `id` has finished, whatever it found
    pub fn is_resolved(&self, id: &str) -> bool {
        self.cache.lock().unwrap().contains_key(id) || self.misses.lock().unwrap().contains(id)
    }

    /// Return the cached lead, fetching it first when absent.
    ///
    /// Not-found and store errors are reported through the notifier and yield `None`;
    /// the cache entry stays absent so a later call retries.
    pub async fn ensure(&self, id: &LeadId) -> Option<Lead> {
        if let Some(lead) = self.cached(id) {
            return Some(lead);
        }

        let cell = {
            let mut in_flight = self.in_flight.lock().unwrap();
            Arc::clone(in_flight.entry(id.clone()).or_default())
        };

        let result = cell.get_or_init(|| self.fetch(id)).await.clone();

        {
            let mut in_flight = self.in_flight.lock().unwrap();
            if in_flight.get(id).is_some_and(|c| Arc::ptr_eq(c, &cell)) {
                in_flight.remove(id);
            }
        }

        result
    }

    async fn fetch(&self, id: &LeadId) -> Option<Lead> {
        debug!(lead_id = %id, "Fetching associated lead");
        match self.leads.find_by_id(id).await {
            Ok(Some(lead)) => {
                self.misses.lock().unwrap().remove(id);
                self.cache
                    .lock()
                    .unwrap()
                    .insert(id.clone(), lead.clone());
                Some(lead)
            }
            Ok(None) => {
                warn!(lead_id = %id, "Associated lead not found");
                self.misses.lock().unwrap().insert(id.clone());
                self.notifier
                    .notify(Notice::error(format!("Contact {} not found", id)));
                None
            }
            Err(e) => {
                warn!(lead_id = %id, error = %e, "Associated lead lookup failed");
                self.misses.lock().unwrap().insert(id.clone());
                self.notifier
                    .notify(Notice::error(format!("Could not load contact: {}", e)));
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::mocks::{InMemoryStore, RecordingNotifier};
    use crate::port::NoticeLevel;
    use std::time::Duration;

    fn setup() -> (Arc<InMemoryStore>, Arc<RecordingNotifier>, AssociatedRecordFetcher) {
        let store = Arc::new(InMemoryStore::new().with_leads([Lead::new("l-1", 0, "Amal")]));
        let notifier = Arc::new(RecordingNotifier::new());
        let fetcher = AssociatedRecordFetcher::new(store.clone(), notifier.clone());
        (store, notifier, fetcher)
    }

    #[tokio::test]
    async fn test_fetch_then_cache_hit() {
        let (store, _notifier, fetcher) = setup();
        let id = "l-1".to_string();
        assert!(!fetcher.is_resolved("l-1"));

        assert_eq!(fetcher.ensure(&id).await.map(|l| l.name), Some("Amal".into()));
        assert!(fetcher.is_resolved("l-1"));
        assert!(fetcher.ensure(&id).await.is_some());

        assert_eq!(store.single_lookups("l-1"), 1);
        assert!(fetcher.cached("l-1").is_some());
    }

    #[tokio::test]
    async fn test_not_found_notifies_and_stays_uncached() {
        let (store, notifier, fetcher) = setup();
        let id = "ghost".to_string();

        assert!(fetcher.ensure(&id).await.is_none());
        assert_eq!(notifier.count(NoticeLevel::Error), 1);
        assert!(fetcher.cached("ghost").is_none());
        assert!(fetcher.is_resolved("ghost"));

        // Absent entries are looked up again next time
        assert!(fetcher.ensure(&id).await.is_none());
        assert_eq!(store.single_lookups("ghost"), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_requests_share_one_lookup() {
        let (store, _notifier, fetcher) = setup();
        store.set_lookup_delay(Duration::from_millis(50));
        let id = "l-1".to_string();

        let (a, b, c) = tokio::join!(fetcher.ensure(&id), fetcher.ensure(&id), fetcher.ensure(&id));

        assert!(a.is_some() && b.is_some() && c.is_some());
        assert_eq!(store.single_lookups("l-1"), 1);
        assert!(!fetcher.is_loading("l-1"));
    }
}
