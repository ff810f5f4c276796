// Focus Queue - sequential processing of tasks or leads

pub mod fetcher;
pub mod loader;
pub mod logger;
pub mod session;
pub mod source;
pub mod tracker;
pub mod view;

pub use fetcher::AssociatedRecordFetcher;
pub use loader::load_queue;
pub use logger::{InteractionLogger, LoggerState};
pub use session::{FocusPorts, FocusSession, Progress, SubmitOutcome};
pub use source::{source_for, LeadQueueSource, TaskQueueSource};
pub use tracker::{Advance, PositionTracker};
pub use view::{render, FocusView};

use std::time::Duration;

/// Pause between a successful log and the auto-advance (500ms)
pub const DEFAULT_ADVANCE_DELAY: Duration = Duration::from_millis(500);

#[derive(Debug, Clone)]
pub struct FocusConfig {
    pub advance_delay: Duration,
}

impl Default for FocusConfig {
    fn default() -> Self {
        Self {
            advance_delay: DEFAULT_ADVANCE_DELAY,
        }
    }
}
