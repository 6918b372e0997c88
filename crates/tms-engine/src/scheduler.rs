//! Cooperative delayed-action scheduler.
//!
//! A single runner task owns the timer loop: callers schedule an action to
//! run after a delay and may cancel it by handle until it fires. Entries
//! live in a binary min-heap keyed by (due time, priority, insertion
//! sequence); cancellation flips a shared flag checked at fire time, so the
//! heap is never edited in place. Lower priority values fire first among
//! entries due at the same instant.
//!
//! A panic inside one fired action is contained and logged; the loop keeps
//! running until [`ActionScheduler::shutdown`] is called.

use parking_lot::Mutex;
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, trace};

type Action = Box<dyn FnOnce() + Send + 'static>;

/// Handle to a pending scheduled action.
///
/// Valid until the action fires or is canceled; canceling after the action
/// has fired is a no-op.
#[derive(Debug, Clone)]
pub struct ScheduledHandle {
    canceled: Arc<AtomicBool>,
}

impl ScheduledHandle {
    /// Cancel the pending action. No-op if it already fired.
    pub fn cancel(&self) {
        self.canceled.store(true, AtomicOrdering::Relaxed);
    }

    /// Whether the action has been canceled.
    #[must_use]
    pub fn is_canceled(&self) -> bool {
        self.canceled.load(AtomicOrdering::Relaxed)
    }
}

struct Entry {
    due: Instant,
    priority: u32,
    seq: u64,
    canceled: Arc<AtomicBool>,
    action: Action,
}

impl Entry {
    fn key(&self) -> (Instant, u32, u64) {
        (self.due, self.priority, self.seq)
    }
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Entry {}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entry {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap; reverse for earliest-first ordering.
        self.key().cmp(&other.key()).reverse()
    }
}

/// Priority-timer loop executing delayed actions on its own task.
pub struct ActionScheduler {
    queue: Mutex<BinaryHeap<Entry>>,
    seq: AtomicU64,
    wake: Notify,
    shutdown: CancellationToken,
}

impl Default for ActionScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl ActionScheduler {
    /// Create a scheduler. Call [`spawn`](Self::spawn) to start its runner.
    #[must_use]
    pub fn new() -> Self {
        Self {
            queue: Mutex::new(BinaryHeap::new()),
            seq: AtomicU64::new(0),
            wake: Notify::new(),
            shutdown: CancellationToken::new(),
        }
    }

    /// Arrange for `action` to run after at least `delay`, on the
    /// scheduler's task.
    ///
    /// Among entries due at the same instant, lower `priority` fires first,
    /// then insertion order.
    pub fn schedule<F>(&self, delay: Duration, priority: u32, action: F) -> ScheduledHandle
    where
        F: FnOnce() + Send + 'static,
    {
        let canceled = Arc::new(AtomicBool::new(false));
        let entry = Entry {
            due: Instant::now() + delay,
            priority,
            seq: self.seq.fetch_add(1, AtomicOrdering::Relaxed),
            canceled: canceled.clone(),
            action: Box::new(action),
        };
        self.queue.lock().push(entry);
        // The runner may be sleeping toward a later deadline.
        self.wake.notify_one();
        ScheduledHandle { canceled }
    }

    /// Cancel a pending entry; no-op if it already fired.
    pub fn cancel(&self, handle: &ScheduledHandle) {
        handle.cancel();
    }

    /// Number of queued entries, canceled ones included until they come due.
    #[must_use]
    pub fn queued(&self) -> usize {
        self.queue.lock().len()
    }

    /// Stop the runner task.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    /// Start the runner task.
    pub fn spawn(self: Arc<Self>) -> JoinHandle<()> {
        tokio::spawn(async move { self.run().await })
    }

    async fn run(&self) {
        debug!("Action scheduler started");
        loop {
            let next_due = self.queue.lock().peek().map(|entry| entry.due);
            match next_due {
                None => {
                    tokio::select! {
                        () = self.wake.notified() => {}
                        () = self.shutdown.cancelled() => break,
                    }
                }
                Some(due) => {
                    if due > Instant::now() {
                        tokio::select! {
                            () = tokio::time::sleep_until(due) => {}
                            // An earlier entry may have been inserted.
                            () = self.wake.notified() => continue,
                            () = self.shutdown.cancelled() => break,
                        }
                    }
                    self.run_due_actions();
                }
            }
        }
        debug!("Action scheduler stopped");
    }

    fn run_due_actions(&self) {
        loop {
            let entry = {
                let mut queue = self.queue.lock();
                match queue.peek() {
                    Some(entry) if entry.due <= Instant::now() => queue.pop(),
                    _ => None,
                }
            };
            let Some(entry) = entry else { break };
            let Entry {
                seq,
                canceled,
                action,
                ..
            } = entry;
            if canceled.load(AtomicOrdering::Relaxed) {
                trace!(seq, "Skipping canceled action");
                continue;
            }
            if let Err(panic) = catch_unwind(AssertUnwindSafe(action)) {
                error!(seq, panic = panic_message(&panic), "Scheduled action panicked");
            }
        }
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> &str {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message
    } else {
        "non-string panic payload"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn recorder() -> (Arc<Mutex<Vec<&'static str>>>, impl Fn(&'static str) + Clone) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let push = {
            let log = log.clone();
            move |label: &'static str| log.lock().push(label)
        };
        (log, push)
    }

    #[tokio::test(start_paused = true)]
    async fn test_fires_in_due_order() {
        let scheduler = Arc::new(ActionScheduler::new());
        let _runner = scheduler.clone().spawn();
        let (log, push) = recorder();

        let push_a = push.clone();
        scheduler.schedule(Duration::from_secs(3), 1, move || push_a("a"));
        let push_b = push;
        scheduler.schedule(Duration::from_secs(1), 1, move || push_b("b"));

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(*log.lock(), vec!["b"]);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(*log.lock(), vec!["b", "a"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ties_break_by_priority_then_insertion() {
        let scheduler = Arc::new(ActionScheduler::new());
        let _runner = scheduler.clone().spawn();
        let (log, push) = recorder();

        let p = push.clone();
        scheduler.schedule(Duration::from_secs(1), 5, move || p("low-prio"));
        let p = push.clone();
        scheduler.schedule(Duration::from_secs(1), 1, move || p("high-prio"));
        let p = push;
        scheduler.schedule(Duration::from_secs(1), 5, move || p("low-prio-2"));

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(*log.lock(), vec!["high-prio", "low-prio", "low-prio-2"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_before_fire() {
        let scheduler = Arc::new(ActionScheduler::new());
        let _runner = scheduler.clone().spawn();
        let (log, push) = recorder();

        let handle = scheduler.schedule(Duration::from_secs(1), 1, move || push("canceled"));
        scheduler.cancel(&handle);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(log.lock().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_after_fire_is_noop() {
        let scheduler = Arc::new(ActionScheduler::new());
        let _runner = scheduler.clone().spawn();
        let (log, push) = recorder();

        let handle = scheduler.schedule(Duration::from_secs(1), 1, move || push("fired"));
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(*log.lock(), vec!["fired"]);

        handle.cancel();
        assert!(handle.is_canceled());
        assert_eq!(*log.lock(), vec!["fired"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_panicking_action_does_not_stop_loop() {
        let scheduler = Arc::new(ActionScheduler::new());
        let _runner = scheduler.clone().spawn();
        let (log, push) = recorder();

        scheduler.schedule(Duration::from_secs(1), 1, || panic!("boom"));
        scheduler.schedule(Duration::from_secs(2), 1, move || push("survivor"));

        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(*log.lock(), vec!["survivor"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_stops_runner() {
        let scheduler = Arc::new(ActionScheduler::new());
        let runner = scheduler.clone().spawn();
        let (log, push) = recorder();

        scheduler.schedule(Duration::from_secs(5), 1, move || push("late"));
        scheduler.shutdown();
        runner.await.unwrap();

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(log.lock().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_earlier_insertion_preempts_sleep() {
        let scheduler = Arc::new(ActionScheduler::new());
        let _runner = scheduler.clone().spawn();
        let (log, push) = recorder();

        let p = push.clone();
        scheduler.schedule(Duration::from_secs(60), 1, move || p("slow"));
        // Give the runner a chance to start sleeping toward the slow entry.
        tokio::time::sleep(Duration::from_millis(10)).await;
        let p = push;
        scheduler.schedule(Duration::from_secs(1), 1, move || p("fast"));

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(*log.lock(), vec!["fast"]);
    }
}
