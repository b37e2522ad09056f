//! Run-wide interrupt flag.

use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Shared "stop now" flag backed by a watch channel.
///
/// Cloning is cheap; every clone observes the same flag. Once triggered it
/// stays triggered.
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    tx: Arc<watch::Sender<bool>>,
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl ShutdownSignal {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_triggered(&self) -> bool {
        *self.tx.borrow()
    }

    /// Resolves once the flag is set.
    pub async fn triggered(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives in `self`, so the channel cannot close underneath us.
        let _ = rx.wait_for(|stop| *stop).await;
    }

    /// Spawn a task that triggers the flag on the first Ctrl-C.
    ///
    /// The Hive child shares the terminal's process group and receives the
    /// same SIGINT, so its exit status usually reports the interrupt too.
    pub fn listen_for_ctrl_c(&self) -> JoinHandle<()> {
        let signal = self.clone();
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    tracing::warn!("Interrupt received, stopping after the current step");
                    signal.trigger();
                }
                Err(err) => {
                    tracing::warn!(error = %err, "Could not install interrupt handler");
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_trigger_is_shared_between_clones() {
        let signal = ShutdownSignal::new();
        let other = signal.clone();
        assert!(!other.is_triggered());
        signal.trigger();
        assert!(other.is_triggered());
        signal.trigger();
        assert!(other.is_triggered());
    }

    #[tokio::test]
    async fn test_triggered_resolves_after_trigger() {
        let signal = ShutdownSignal::new();
        let waiter = signal.clone();
        let handle = tokio::spawn(async move { waiter.triggered().await });
        signal.trigger();
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_triggered_resolves_immediately_when_already_set() {
        let signal = ShutdownSignal::new();
        signal.trigger();
        tokio::time::timeout(Duration::from_secs(5), signal.triggered())
            .await
            .unwrap();
    }
}
