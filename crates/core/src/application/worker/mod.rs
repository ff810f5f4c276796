// Worker - interaction processing loop
//
// Every appended interaction is handed to the follow-up processor until it
// is processed or parked; `processed_at` is the cursor.

pub mod constants;
mod shutdown;

use constants::*;
pub use shutdown::{shutdown_channel, ShutdownSender, ShutdownToken};

use crate::application::followup::{FollowUpProcessor, ProcessOutcome};
use crate::domain::{InteractionId, InteractionRecord};
use crate::error::{AppError, Result};
use crate::port::{InteractionRepository, TimeProvider};
use std::sync::Arc;
use tokio::time::sleep;
use tracing::{error, info, warn};

/// Worker draining unprocessed interactions
pub struct InteractionWorker {
    interactions: Arc<dyn InteractionRepository>,
    processor: Arc<FollowUpProcessor>,
    time_provider: Arc<dyn TimeProvider>,
    batch: i64,
}

impl InteractionWorker {
    pub fn new(
        interactions: Arc<dyn InteractionRepository>,
        processor: Arc<FollowUpProcessor>,
        time_provider: Arc<dyn TimeProvider>,
    ) -> Self {
        Self {
            interactions,
            processor,
            time_provider,
            batch: DEFAULT_POLL_BATCH,
        }
    }

    pub fn with_batch(mut self, batch: i64) -> Self {
        self.batch = batch.max(1);
        self
    }

    /// Run worker loop with graceful shutdown support
    pub async fn run(&self, mut shutdown: ShutdownToken) -> Result<()> {
        info!(batch = self.batch, "Interaction worker started");
        loop {
            if shutdown.is_shutdown() {
                info!("Interaction worker shutting down");
                break;
            }
            match self.process_pending().await {
                Ok(processed) => {
                    if processed == 0 {
                        tokio::select! {
                            _ = sleep(IDLE_SLEEP_DURATION) => {},
                            _ = shutdown.wait() => {
                                info!("Worker interrupted during idle");
                                break;
                            }
                        }
                    }
                }
                Err(e) => {
                    error!("Worker error: {}", e);
                    tokio::select! {
                        _ = sleep(ERROR_RECOVERY_SLEEP_DURATION) => {},
                        _ = shutdown.wait() => {
                            info!("Worker interrupted during error recovery");
                            break;
                        }
                    }
                }
            }
        }
        info!("Interaction worker stopped");
        Ok(())
    }

    /// Process one batch of pending interactions. Returns how many succeeded.
    ///
    /// A failed record does not hold up the rest of the batch. It is retried
    /// on later polls until `MAX_PROCESS_ATTEMPTS`, or parked at once when the
    /// record itself is invalid.
    pub async fn process_pending(&self) -> Result<usize> {
        let pending = self.interactions.find_unprocessed(self.batch).await?;
        let mut handled = 0;

        for record in pending {
            let id = record.id.clone();
            match self.process_one(record).await {
                Ok(()) => handled += 1,
                Err(e) => self.handle_failure(&id, e).await,
            }
        }
        Ok(handled)
    }

    async fn process_one(&self, record: InteractionRecord) -> Result<()> {
        info!(
            interaction_id = %record.id,
            lead_id = %record.lead_id,
            kind = record.kind.label(),
            "Processing interaction"
        );

        // Spawned so a panic in one record cannot take the daemon down
        let processor = Arc::clone(&self.processor);
        let record = Arc::new(record);
        let record_for_exec = Arc::clone(&record);
        let handle =
            tokio::task::spawn(async move { processor.process(&record_for_exec).await });

        match handle.await {
            Ok(Ok(ProcessOutcome::Applied)) => Ok(()),
            Ok(Ok(ProcessOutcome::LeadMissing)) => {
                warn!(interaction_id = %record.id, "Interaction for missing lead dropped");
                Ok(())
            }
            Ok(Err(e)) => Err(e),
            Err(join_err) => {
                error!(interaction_id = %record.id, "Processing panicked: {:?}", join_err);
                Err(AppError::Internal(format!(
                    "processing of {} aborted",
                    record.id
                )))
            }
        }
    }

    async fn handle_failure(&self, id: &InteractionId, e: AppError) {
        if let AppError::Conflict(_) = e {
            warn!(interaction_id = %id, "Interaction already processed elsewhere");
            return;
        }

        let attempts = match self.interactions.record_failure(id, &e.to_string()).await {
            Ok(attempts) => attempts,
            Err(store_err) => {
                error!(interaction_id = %id, error = %store_err, "Could not record failed attempt");
                return;
            }
        };

        if e.is_validation() || attempts >= MAX_PROCESS_ATTEMPTS {
            error!(interaction_id = %id, attempts, error = %e, "Interaction parked after failed processing");
            if let Err(store_err) = self
                .interactions
                .mark_failed(id, self.time_provider.now_millis())
                .await
            {
                error!(interaction_id = %id, error = %store_err, "Could not park interaction");
            }
        } else {
            warn!(interaction_id = %id, attempts, error = %e, "Interaction processing failed; will retry");
        }
    }
}
