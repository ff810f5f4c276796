// Follow-up Store Port (Interface)

use crate::domain::FollowUpPlan;
use crate::error::Result;
use async_trait::async_trait;

/// Applies follow-up plans atomically
#[async_trait]
pub trait FollowUpStore: Send + Sync {
    /// Apply every write of `plan` and mark its interaction processed, all or
    /// nothing. Fails with `Conflict` when the interaction was already processed.
    async fn apply(&self, plan: &FollowUpPlan) -> Result<()>;
}
