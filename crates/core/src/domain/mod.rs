// Domain Layer - Pure business logic and entities

pub mod afc;
pub mod error;
pub mod interaction;
pub mod lead;
pub mod plan;
pub mod queue;
pub mod task;

// Re-exports
pub use error::DomainError;
pub use interaction::{
    EventStatus, FeedbackCategory, InteractionId, InteractionKind, InteractionRecord, LogDraft,
    Outcome, Perception, QuickLogType, Sentiment,
};
pub use lead::{Lead, LeadId, LeadStatus, LeadUpdate, Phone, PhoneKind, DEFAULT_RELATIONSHIP};
pub use plan::FollowUpPlan;
pub use queue::{QueueItem, QueueKind};
pub use task::{Task, TaskId, TaskNature};
