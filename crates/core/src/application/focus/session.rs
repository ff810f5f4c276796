// Focus Session - queue loading, navigation and logging wired together

use super::fetcher::AssociatedRecordFetcher;
use super::loader::load_queue;
use super::logger::{build_record, InteractionLogger, LoggerState};
use super::source::source_for;
use super::tracker::{Advance, PositionTracker};
use super::view::{render, FocusView};
use super::FocusConfig;
use crate::domain::{InteractionRecord, LogDraft, QueueItem, QueueKind};
use crate::error::{AppError, Result};
use crate::port::{
    FocusLocation, IdProvider, InteractionRepository, LeadRepository, LocationBar, Notice,
    Notifier, TaskRepository, TimeProvider,
};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Collaborators of a focus session
#[derive(Clone)]
pub struct FocusPorts {
    pub tasks: Arc<dyn TaskRepository>,
    pub leads: Arc<dyn LeadRepository>,
    pub interactions: Arc<dyn InteractionRepository>,
    pub notifier: Arc<dyn Notifier>,
    pub location_bar: Arc<dyn LocationBar>,
    pub id_provider: Arc<dyn IdProvider>,
    pub time_provider: Arc<dyn TimeProvider>,
}

/// Result of a successful submission
#[derive(Debug, Clone, PartialEq)]
pub struct SubmitOutcome {
    pub record: InteractionRecord,
    pub advance: Advance,
}

/// Position summary for the status line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub position: Option<usize>,
    pub total: usize,
    pub completed: usize,
}

pub struct FocusSession {
    ports: FocusPorts,
    fetcher: AssociatedRecordFetcher,
    config: FocusConfig,
    kind: QueueKind,
    tracker: PositionTracker,
    logger: InteractionLogger,
    finished: bool,
}

impl FocusSession {
    pub fn new(ports: FocusPorts, config: FocusConfig) -> Self {
        let fetcher =
            AssociatedRecordFetcher::new(Arc::clone(&ports.leads), Arc::clone(&ports.notifier));
        Self {
            ports,
            fetcher,
            config,
            kind: QueueKind::Tasks,
            tracker: PositionTracker::default(),
            logger: InteractionLogger::new(),
            finished: false,
        }
    }

    /// Load the queue named by `location` and move to its current id.
    ///
    /// A failed load is reported once and leaves the queue empty.
    /// Returns the number of items loaded.
    pub async fn open(&mut self, location: FocusLocation) -> usize {
        self.kind = location.kind;
        self.finished = false;
        self.logger = InteractionLogger::new();
        self.tracker = PositionTracker::new(location.ids);

        let source = source_for(
            self.kind,
            Arc::clone(&self.ports.tasks),
            Arc::clone(&self.ports.leads),
        );

        match load_queue(source.as_ref(), self.tracker.ids()).await {
            Ok(items) => {
                info!(kind = %self.kind, requested = self.tracker.len(), loaded = items.len(), "Focus queue loaded");
                self.tracker.set_items(items);
            }
            Err(e) => {
                error!(kind = %self.kind, error = %e, "Focus queue load failed");
                self.ports
                    .notifier
                    .notify(Notice::error(format!("Could not load queue: {}", e)));
                self.tracker = PositionTracker::default();
                return 0;
            }
        }

        let positioned = match location.current.as_deref() {
            Some(id) => self.tracker.seek(id),
            None => self.tracker.navigate_to(0),
        };
        if positioned {
            self.publish_location();
            self.load_current().await;
        } else if let Some(id) = location.current {
            debug!(current = %id, "Start id not in queue; waiting for navigation");
        }

        self.tracker.items().len()
    }

    /// Move to `index` and fetch its lead. Out-of-range requests are ignored.
    pub async fn navigate_to(&mut self, index: usize) -> bool {
        if !self.select(index) {
            return false;
        }
        self.load_current().await;
        true
    }

    /// Move to `index` without fetching. Until `load_current` resolves the
    /// lead, `view()` reports `Loading`.
    pub fn select(&mut self, index: usize) -> bool {
        if !self.tracker.navigate_to(index) {
            debug!(index, total = self.tracker.len(), "Ignoring out-of-range navigation");
            return false;
        }
        self.finished = false;
        self.publish_location();
        true
    }

    /// Fetch the lead of the current item unless it is cached
    pub async fn load_current(&self) {
        let lead_id = self
            .tracker
            .current_item()
            .and_then(|item| item.associated_id.clone());
        if let Some(id) = lead_id {
            self.fetcher.ensure(&id).await;
        }
    }

    pub async fn next(&mut self) -> bool {
        match self.tracker.position() {
            Some(p) => self.navigate_to(p + 1).await,
            None => self.navigate_to(0).await,
        }
    }

    pub async fn previous(&mut self) -> bool {
        match self.tracker.position() {
            Some(p) if p > 0 => self.navigate_to(p - 1).await,
            _ => false,
        }
    }

    /// Jump to the next incomplete item, or mark the queue finished
    pub async fn advance_to_next_incomplete(&mut self) -> Advance {
        let advance = self.tracker.advance_to_next_incomplete();
        match advance {
            Advance::Moved(index) => {
                debug!(index, "Advanced to next item");
                self.publish_location();
                self.load_current().await;
            }
            Advance::Finished => {
                info!(total = self.tracker.len(), "Focus queue finished");
                self.finished = true;
                self.ports
                    .notifier
                    .notify(Notice::info("Queue finished"));
            }
        }
        advance
    }

    /// Log an interaction against the current item.
    ///
    /// The item is marked completed locally before the write and reverted if the
    /// write fails. On success the session waits `advance_delay`, then advances.
    /// The draft is borrowed so the caller still has it for a retry.
    pub async fn submit(&mut self, draft: &LogDraft) -> Result<SubmitOutcome> {
        if let Err(e) = draft.validate() {
            self.ports.notifier.notify(Notice::error(e.to_string()));
            return Err(e.into());
        }

        let item = self
            .tracker
            .current_item()
            .cloned()
            .ok_or_else(|| AppError::InvalidState("no current item to log against".to_string()))?;

        let record = build_record(
            draft,
            &item,
            self.ports.id_provider.generate_id(),
            self.ports.time_provider.now_millis(),
        )?;

        self.logger.begin()?;
        let previous = self.tracker.set_completed(&item.id, true);

        // Close the task in the store first so a failed log write can undo it
        let task_id = item.task_id().map(str::to_string);
        let stored_previous = match &task_id {
            Some(task_id) => match self.ports.tasks.set_completed(task_id, true).await {
                Ok(was) => Some(was),
                Err(e) => {
                    warn!(item_id = %item.id, error = %e, "Task completion failed; reverting");
                    return self.fail_submit(&item.id, previous, e);
                }
            },
            None => None,
        };

        if let Err(e) = self.ports.interactions.insert(&record).await {
            warn!(item_id = %item.id, error = %e, "Interaction write failed; reverting");
            if let (Some(task_id), Some(false)) = (&task_id, stored_previous) {
                if let Err(revert) = self.ports.tasks.set_completed(task_id, false).await {
                    error!(item_id = %item.id, error = %revert, "Could not reopen task");
                }
            }
            return self.fail_submit(&item.id, previous, e);
        }

        self.logger.succeed()?;
        info!(
            item_id = %item.id,
            lead_id = %record.lead_id,
            kind = record.kind.label(),
            "Interaction logged"
        );
        self.ports
            .notifier
            .notify(Notice::success(format!("Logged for {}", item.name)));

        tokio::time::sleep(self.config.advance_delay).await;

        let advance = self.advance_to_next_incomplete().await;
        self.logger.settle()?;

        Ok(SubmitOutcome { record, advance })
    }

    pub fn view(&self) -> FocusView {
        let item = self.tracker.current_item().cloned();
        let lead_id = item.as_ref().and_then(|i| i.associated_id.clone());
        let lead = lead_id.as_deref().and_then(|id| self.fetcher.cached(id));
        let loading = lead_id
            .as_deref()
            .is_some_and(|id| self.fetcher.is_loading(id) || !self.fetcher.is_resolved(id));
        render(item, lead, loading, self.finished)
    }

    pub fn progress(&self) -> Progress {
        Progress {
            position: self.tracker.position(),
            total: self.tracker.len(),
            completed: self.tracker.completed_count(),
        }
    }

    pub fn location(&self) -> FocusLocation {
        let location = FocusLocation::new(self.kind, self.tracker.ids().to_vec());
        match self.tracker.current_id() {
            Some(id) => location.with_current(id),
            None => location,
        }
    }

    pub fn current_item(&self) -> Option<&QueueItem> {
        self.tracker.current_item()
    }

    pub fn items(&self) -> &[QueueItem] {
        self.tracker.items()
    }

    pub fn logger_state(&self) -> LoggerState {
        self.logger.state()
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    fn fail_submit(
        &mut self,
        item_id: &str,
        previous: Option<bool>,
        e: AppError,
    ) -> Result<SubmitOutcome> {
        if let Some(previous) = previous {
            self.tracker.set_completed(item_id, previous);
        }
        self.logger.fail()?;
        self.ports
            .notifier
            .notify(Notice::error(format!("Could not save log: {}", e)));
        Err(e)
    }

    fn publish_location(&self) {
        self.ports.location_bar.replace(&self.location());
    }
}
