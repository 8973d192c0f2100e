// ── Reconciler tuning ──
//
// Built by the host and handed to `Reconciler::new`. Core never reads
// config files.

use std::time::Duration;

/// Default delay between two poll cycles of the same device.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(60);

/// Battery percentage below which the low-battery flag is raised.
pub const DEFAULT_LOW_BATTERY_THRESHOLD: u8 = 15;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcilerConfig {
    /// Delay between cycles. Each device runs on its own timer.
    pub poll_interval: Duration,
    pub low_battery_threshold: u8,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            low_battery_threshold: DEFAULT_LOW_BATTERY_THRESHOLD,
        }
    }
}

impl ReconcilerConfig {
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }
}
