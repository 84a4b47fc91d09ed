//! Ctrl-C routing
//!
//! While a watch is running, Ctrl-C stops only the watch and the run goes
//! on. At any other time it asks the whole run to end.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

#[derive(Default)]
struct Inner {
    watching: AtomicBool,
    stop_watch: Notify,
    exit: Notify,
}

/// Shared handle to the process interrupt state
#[derive(Clone, Default)]
pub struct Interrupts {
    inner: Arc<Inner>,
}

/// Marks a watch as active for as long as it lives
struct Watching<'a>(&'a Inner);

impl Drop for Watching<'_> {
    fn drop(&mut self) {
        self.0.watching.store(false, Ordering::SeqCst);
    }
}

impl Interrupts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forward every Ctrl-C to [`raise`](Self::raise)
    pub fn listen(&self) -> JoinHandle<()> {
        let interrupts = self.clone();
        tokio::spawn(async move {
            loop {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    warn!("Failed to listen for Ctrl-C: {}", e);
                    return;
                }
                interrupts.raise();
            }
        })
    }

    /// Deliver one interrupt
    pub fn raise(&self) {
        if self.inner.watching.load(Ordering::SeqCst) {
            debug!("Interrupt stops watch");
            self.inner.stop_watch.notify_one();
        } else {
            debug!("Interrupt ends run");
            self.inner.exit.notify_one();
        }
    }

    /// Resolves once an interrupt arrives outside a watch
    pub async fn exit_requested(&self) {
        self.inner.exit.notified().await;
    }

    /// Resolves on the next interrupt; interrupts go here while it is pending
    pub async fn stop_watching(&self) {
        self.inner.watching.store(true, Ordering::SeqCst);
        let _watching = Watching(&self.inner);
        self.inner.stop_watch.notified().await;
    }

    pub fn is_watching(&self) -> bool {
        self.inner.watching.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    async fn resolves<F: std::future::Future>(fut: F) -> bool {
        tokio::time::timeout(Duration::from_millis(50), fut).await.is_ok()
    }

    #[tokio::test]
    async fn test_interrupt_outside_watch_requests_exit() {
        let interrupts = Interrupts::new();
        interrupts.raise();
        assert!(resolves(interrupts.exit_requested()).await);
    }

    #[tokio::test]
    async fn test_interrupt_during_watch_only_stops_watch() {
        let interrupts = Interrupts::new();
        let watcher = interrupts.clone();
        let stop = tokio::spawn(async move { watcher.stop_watching().await });

        while !interrupts.is_watching() {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
        interrupts.raise();

        assert!(resolves(stop).await);
        assert!(!interrupts.is_watching());
        assert!(!resolves(interrupts.exit_requested()).await);

        // Back to ending the run
        interrupts.raise();
        assert!(resolves(interrupts.exit_requested()).await);
    }

    #[tokio::test]
    async fn test_dropped_watch_releases_interrupts() {
        let interrupts = Interrupts::new();
        assert!(!resolves(interrupts.stop_watching()).await);
        assert!(!interrupts.is_watching());

        interrupts.raise();
        assert!(resolves(interrupts.exit_requested()).await);
    }
}
