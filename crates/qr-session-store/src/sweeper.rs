use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, error, info};

use crate::registry::SessionRegistry;

/// Shortest accepted sweep period
pub const MIN_SWEEP_PERIOD: Duration = Duration::from_millis(1);

/// Longest accepted sweep period; longer requests are capped to this
pub const MAX_SWEEP_PERIOD: Duration = Duration::from_secs(24 * 60 * 60);

/// Periodic eviction of expired sessions
pub struct Sweeper {
    registry: Arc<SessionRegistry>,
    period: Duration,
}

impl Sweeper {
    pub fn new(registry: Arc<SessionRegistry>) -> Self {
        let period = registry.config().sweep_interval;
        Self::with_period(registry, period)
    }

    pub fn with_period(registry: Arc<SessionRegistry>, period: Duration) -> Self {
        Self { registry, period }
    }

    /// Spawn the sweep loop on the current tokio runtime.
    ///
    /// The first pass runs one full period after spawning.
    pub fn spawn(self) -> SweeperHandle {
        let (stop_tx, stop_rx) = watch::channel(false);
        let join = tokio::spawn(self.run(stop_rx));
        SweeperHandle { stop_tx, join }
    }

    async fn run(self, mut stop_rx: watch::Receiver<bool>) {
        // interval panics on a zero period or a deadline past Instant's range
        let period = self.period.clamp(MIN_SWEEP_PERIOD, MAX_SWEEP_PERIOD);
        let now = Instant::now();
        let start = now
            .checked_add(period)
            .unwrap_or_else(|| now + MIN_SWEEP_PERIOD);
        let mut ticker = interval_at(start, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        debug!("Session sweeper started (every {:?})", period);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let removed = self.registry.sweep_expired();
                    if removed > 0 {
                        info!(
                            removed,
                            remaining = self.registry.len(),
                            "Swept expired upload sessions"
                        );
                    }
                }
                changed = stop_rx.changed() => {
                    // A dropped sender counts as a stop request
                    if changed.is_err() || *stop_rx.borrow() {
                        break;
                    }
                }
            }
        }

        debug!("Session sweeper stopped");
    }
}

/// Owner of a running sweep loop
pub struct SweeperHandle {
    stop_tx: watch::Sender<bool>,
    join: JoinHandle<()>,
}

impl SweeperHandle {
    /// Signal the loop to stop and wait for it to finish
    pub async fn shutdown(self) {
        let _ = self.stop_tx.send(true);
        if let Err(e) = self.join.await {
            error!("Session sweeper task failed: {}", e);
        }
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }
}
