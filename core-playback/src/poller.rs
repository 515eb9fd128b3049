//! # Position Sync Poller
//!
//! Fixed-period task that pulls the playback position from the active
//! backend. Ticks while paused are no-ops on the target's side. Missed
//! ticks are skipped, not bunched up.

use std::sync::Weak;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Something whose position can be refreshed from its media backend.
pub trait PositionSync: Send + Sync {
    /// Refreshes and returns the position, or `None` when not playing.
    fn sync_position(&self) -> Option<f64>;
}

#[derive(Debug, Clone, Copy)]
pub struct PositionPoller {
    interval: Duration,
}

impl PositionPoller {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Runs until `cancel` fires or the target is dropped.
    pub fn spawn(self, target: Weak<dyn PositionSync>, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        let Some(target) = target.upgrade() else {
                            break;
                        };
                        target.sync_position();
                    }
                }
            }
            debug!("Position poller stopped");
        })
    }
}
