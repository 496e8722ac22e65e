//! Cancellation of an in-flight round trip.

use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::Notify;

/// A latch set from a signal handler and awaited by the controller.
///
/// Once triggered it stays set until [`Interrupt::reset`] is called, so a
/// trigger that lands before anyone waits is not lost.
#[derive(Debug, Default)]
pub struct Interrupt {
    flag: AtomicBool,
    notify: Notify,
}

impl Interrupt {
    /// Creates an untriggered interrupt.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the latch and wakes every waiter.
    pub fn trigger(&self) {
        self.flag.store(true, Ordering::SeqCst);
        self.notify.notify_waiters();
    }

    /// Clears the latch.
    pub fn reset(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }

    /// Returns true if the latch is set.
    pub fn is_triggered(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Completes once the latch is set.
    pub async fn triggered(&self) {
        loop {
            // Register before checking the flag so a concurrent trigger wakes us.
            let notified = self.notify.notified();
            if self.is_triggered() {
                return;
            }
            notified.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn trigger_before_wait_is_seen() {
        let interrupt = Interrupt::new();
        interrupt.trigger();
        tokio::time::timeout(Duration::from_secs(1), interrupt.triggered())
            .await
            .expect("latched trigger should complete immediately");
    }

    #[tokio::test]
    async fn trigger_wakes_waiter() {
        let interrupt = Arc::new(Interrupt::new());
        let waiter = {
            let interrupt = Arc::clone(&interrupt);
            tokio::spawn(async move { interrupt.triggered().await })
        };
        tokio::task::yield_now().await;
        interrupt.trigger();
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter should wake")
            .unwrap();
    }

    #[tokio::test]
    async fn reset_clears_latch() {
        let interrupt = Interrupt::new();
        interrupt.trigger();
        assert!(interrupt.is_triggered());
        interrupt.reset();
        assert!(!interrupt.is_triggered());
        let waited = tokio::time::timeout(Duration::from_millis(10), interrupt.triggered()).await;
        assert!(waited.is_err());
    }
}
