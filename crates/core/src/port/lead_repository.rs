// Lead Repository Port (Interface)

use crate::domain::{Lead, LeadId, LeadUpdate};
use crate::error::Result;
use async_trait::async_trait;

/// Upper bound on ids accepted by one multi-id lookup
pub const MAX_IDS_PER_LOOKUP: usize = 30;

/// Rows removed by a lead cascade delete
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CascadeStats {
    pub tasks_deleted: u64,
    pub interactions_deleted: u64,
}

/// Repository interface for Lead persistence
#[async_trait]
pub trait LeadRepository: Send + Sync {
    /// Insert a new lead
    async fn insert(&self, lead: &Lead) -> Result<()>;

    /// Find lead by ID
    async fn find_by_id(&self, id: &LeadId) -> Result<Option<Lead>>;

    /// Multi-id lookup (at most MAX_IDS_PER_LOOKUP ids, results unordered)
    async fn find_by_ids(&self, ids: &[LeadId]) -> Result<Vec<Lead>>;

    /// Find lead by email (exact match)
    async fn find_by_email(&self, email: &str) -> Result<Option<Lead>>;

    /// List leads, newest first
    async fn list(&self, limit: i64) -> Result<Vec<Lead>>;

    /// Replace the whole record (used by imports)
    async fn replace(&self, lead: &Lead) -> Result<()>;

    /// Field-level partial update
    async fn update_fields(&self, id: &LeadId, update: &LeadUpdate) -> Result<()>;

    /// Delete the lead with its tasks and interactions, atomically
    async fn delete_cascade(&self, id: &LeadId) -> Result<CascadeStats>;
}
