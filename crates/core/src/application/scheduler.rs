// Advancer Scheduler - periodic overdue sweep

use crate::application::followup::AfcAdvancer;
use crate::application::worker::ShutdownToken;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::interval;
use tracing::{error, info};

/// Runs the overdue sweep every `interval_hours`.
///
/// The first sweep happens immediately on start.
pub struct AdvancerScheduler {
    advancer: Arc<AfcAdvancer>,
    interval_hours: u64,
}

impl AdvancerScheduler {
    pub fn new(advancer: Arc<AfcAdvancer>, interval_hours: u64) -> Self {
        Self {
            advancer,
            interval_hours: interval_hours.max(1),
        }
    }

    /// Scheduler loop (background task). Should be spawned in tokio::spawn.
    pub async fn run(self, mut shutdown: ShutdownToken) {
        info!(
            interval_hours = self.interval_hours,
            "Advancer scheduler started"
        );

        let mut tick = interval(Duration::from_secs(self.interval_hours * 3600));

        loop {
            tokio::select! {
                _ = tick.tick() => {},
                _ = shutdown.wait() => {
                    info!("Advancer scheduler stopped");
                    break;
                }
            }

            info!("Running scheduled overdue sweep...");
            match self.advancer.run_once().await {
                Ok(advanced) => {
                    info!(advanced, "Scheduled overdue sweep completed");
                }
                Err(e) => {
                    error!(error = ?e, "Scheduled overdue sweep failed");
                }
            }
        }
    }
}
