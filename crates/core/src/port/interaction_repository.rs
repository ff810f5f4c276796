// Interaction Repository Port (Interface)

use crate::domain::{InteractionId, InteractionRecord, LeadId};
use crate::error::Result;
use async_trait::async_trait;

/// Append-only store for interaction records
#[async_trait]
pub trait InteractionRepository: Send + Sync {
    /// Append a new interaction
    async fn insert(&self, record: &InteractionRecord) -> Result<()>;

    /// Interactions of a lead, oldest first
    async fn find_for_lead(&self, lead_id: &LeadId) -> Result<Vec<InteractionRecord>>;

    /// Interactions neither processed nor parked as failed, oldest first
    async fn find_unprocessed(&self, limit: i64) -> Result<Vec<InteractionRecord>>;

    /// Count one failed processing attempt; returns the attempts so far
    async fn record_failure(&self, id: &InteractionId, error: &str) -> Result<u32>;

    /// Park an interaction so `find_unprocessed` stops returning it
    async fn mark_failed(&self, id: &InteractionId, at_millis: i64) -> Result<()>;
}
