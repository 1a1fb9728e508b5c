//! Simulated feed lane.

use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use orrery_core::ledger::{FeedLauncher, LaunchRequest};

use super::types::EngineCommand;

/// Feed launcher that reports each ball as launched after a fixed delay.
///
/// Stands in for the trough and plunger hardware. Completions come back
/// through the engine's own command queue, one per ball, in request order.
pub struct SimulatedLauncher {
    tx: mpsc::WeakSender<EngineCommand>,
    delay: Duration,
}

impl SimulatedLauncher {
    /// Holds only a weak sender so the launcher never keeps the engine alive.
    pub fn new(tx: &mpsc::Sender<EngineCommand>, delay_ms: u64) -> Self {
        Self {
            tx: tx.downgrade(),
            delay: Duration::from_millis(delay_ms),
        }
    }
}

impl FeedLauncher for SimulatedLauncher {
    fn launch(&self, request: LaunchRequest) {
        let Some(tx) = self.tx.upgrade() else {
            warn!(count = request.count, "Engine gone, dropping launch request");
            return;
        };
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!(count = request.count, "No runtime available, dropping launch request");
            return;
        };

        let delay = self.delay;
        runtime.spawn(async move {
            for _ in 0..request.count {
                tokio::time::sleep(delay).await;
                debug!(stealth = request.stealth, "Simulated launch complete");
                if tx.send(EngineCommand::LaunchCompleted).await.is_err() {
                    break;
                }
            }
        });
    }
}
