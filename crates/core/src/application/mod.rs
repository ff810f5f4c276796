// Application Layer - Use Cases and Business Logic

pub mod focus;
pub mod followup;
pub mod scheduler;
pub mod worker;

// Re-exports
pub use focus::{FocusConfig, FocusPorts, FocusSession};
pub use followup::{
    AfcAdvancer, ContactImporter, FollowUpCycle, FollowUpProcessor, ImportSummary, LeadService,
    TaskService,
};
pub use scheduler::AdvancerScheduler;
pub use worker::{shutdown_channel, InteractionWorker, ShutdownSender, ShutdownToken};
