// Follow-up cycle (AFC) - automatic follow-up scheduling driven by interactions

mod advancer;
mod cycle;
mod import;
mod leads;
mod processor;
mod tasks;

pub use advancer::AfcAdvancer;
pub use cycle::FollowUpCycle;
pub use import::{ContactImporter, ImportSummary};
pub use leads::LeadService;
pub use processor::{FollowUpProcessor, ProcessOutcome};
pub use tasks::{CompleteOutcome, TaskService};
