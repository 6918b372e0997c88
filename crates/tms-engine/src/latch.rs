//! Countdown barrier for overall completion.
//!
//! Each target decrements the latch exactly once when it completes; the
//! initiating task blocks on [`CompletionLatch::wait`] until the count
//! reaches zero. Single use, no reset.

use tokio::sync::watch;
use tracing::error;

/// Synchronization barrier counting down from an initial value.
pub struct CompletionLatch {
    count: watch::Sender<usize>,
}

impl CompletionLatch {
    /// Create a latch with the given initial count.
    #[must_use]
    pub fn new(count: usize) -> Self {
        Self {
            count: watch::channel(count).0,
        }
    }

    /// Current count.
    #[must_use]
    pub fn count(&self) -> usize {
        *self.count.borrow()
    }

    /// Decrement the count; at zero, releases all current and future
    /// waiters.
    ///
    /// Decrementing an already-zero latch is a logic fault: it is logged
    /// and the count stays at zero.
    pub fn count_down(&self) {
        self.count.send_modify(|count| {
            if *count == 0 {
                error!("Latch counted down below zero");
            } else {
                *count -= 1;
            }
        });
    }

    /// Block until the count reaches zero; returns immediately if already
    /// zero.
    pub async fn wait(&self) {
        let mut rx = self.count.subscribe();
        // The sender lives in self, so the channel cannot close while we
        // hold the borrow.
        let _ = rx.wait_for(|count| *count == 0).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::time::timeout;

    #[tokio::test]
    async fn test_wait_returns_immediately_at_zero() {
        let latch = CompletionLatch::new(0);
        timeout(Duration::from_millis(100), latch.wait())
            .await
            .expect("wait at zero must not block");
    }

    #[tokio::test]
    async fn test_count_down_releases_waiter() {
        let latch = Arc::new(CompletionLatch::new(2));
        let waiter = {
            let latch = latch.clone();
            tokio::spawn(async move { latch.wait().await })
        };

        latch.count_down();
        assert_eq!(latch.count(), 1);
        assert!(!waiter.is_finished());

        latch.count_down();
        timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter must be released")
            .unwrap();
    }

    #[tokio::test]
    async fn test_concurrent_count_down_releases_exactly_at_zero() {
        let latch = Arc::new(CompletionLatch::new(8));
        let mut handles = Vec::new();
        for _ in 0..8 {
            let latch = latch.clone();
            handles.push(tokio::spawn(async move { latch.count_down() }));
        }
        for h in handles {
            h.await.unwrap();
        }
        assert_eq!(latch.count(), 0);
        timeout(Duration::from_millis(100), latch.wait())
            .await
            .expect("latch must be open");
    }

    #[tokio::test]
    async fn test_underflow_clamps_at_zero() {
        let latch = CompletionLatch::new(1);
        latch.count_down();
        latch.count_down();
        assert_eq!(latch.count(), 0);
    }

    #[tokio::test]
    async fn test_late_waiter_sees_open_latch() {
        let latch = CompletionLatch::new(1);
        latch.count_down();
        timeout(Duration::from_millis(100), latch.wait())
            .await
            .expect("future waiters must not block after release");
    }
}
