//! Backoff between a failed partition and the next one.

use crate::shutdown::ShutdownSignal;
use std::time::Duration;

/// How a cooldown ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CooldownOutcome {
    Elapsed,
    Interrupted,
}

/// A fixed sleep that an interrupt cuts short.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cooldown {
    duration: Duration,
}

impl Cooldown {
    pub fn new(duration: Duration) -> Self {
        Self { duration }
    }

    pub async fn wait(&self, shutdown: &ShutdownSignal) -> CooldownOutcome {
        if shutdown.is_triggered() {
            return CooldownOutcome::Interrupted;
        }
        tracing::info!(
            cooldown_secs = self.duration.as_secs(),
            "Cooling down for {}s before the next partition",
            self.duration.as_secs()
        );
        tokio::select! {
            _ = tokio::time::sleep(self.duration) => CooldownOutcome::Elapsed,
            _ = shutdown.triggered() => CooldownOutcome::Interrupted,
        }
    }
}
