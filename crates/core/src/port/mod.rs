// Port Layer - Interfaces for external dependencies

pub mod followup_store;
pub mod id_provider; // For deterministic testing
pub mod interaction_repository;
pub mod lead_repository;
pub mod location;
pub mod mocks;
pub mod notifier;
pub mod queue_source;
pub mod task_repository;
pub mod time_provider;

// Re-exports
pub use followup_store::FollowUpStore;
pub use id_provider::IdProvider;
pub use interaction_repository::InteractionRepository;
pub use lead_repository::{CascadeStats, LeadRepository, MAX_IDS_PER_LOOKUP};
pub use location::{FocusLocation, LocationBar};
pub use notifier::{Notice, NoticeLevel, Notifier};
pub use queue_source::QueueSource;
pub use task_repository::TaskRepository;
pub use time_provider::TimeProvider;
