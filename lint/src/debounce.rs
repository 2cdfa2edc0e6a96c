//! Per-key debouncing of change bursts.
//!
//! Each key owns at most one pending timer. Scheduling again aborts the
//! previous timer before it fires, so only the last trigger of a burst runs.
//! A trigger that already fired and queued work is recognised as stale via
//! [`DebounceScheduler::take_fired`].

use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::time::Duration;

use tokio::task::JoinHandle;

/// Identity of one scheduled timer, unique per scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(u64);

struct PendingTimer {
    id: TimerId,
    handle: JoinHandle<()>,
}

/// Per-key quiet-period timers; the last trigger of a burst wins.
pub struct DebounceScheduler<K> {
    quiet: Duration,
    next_id: u64,
    pending: HashMap<K, PendingTimer>,
}

impl<K: Eq + Hash + Clone> DebounceScheduler<K> {
    #[must_use]
    pub fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            next_id: 0,
            pending: HashMap::new(),
        }
    }

    #[must_use]
    pub fn quiet_interval(&self) -> Duration {
        self.quiet
    }

    /// Run the trigger built by `make_trigger` once `key` has been quiet for
    /// the full interval, replacing any timer still pending for `key`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn schedule<F, Fut>(&mut self, key: K, make_trigger: F) -> TimerId
    where
        F: FnOnce(TimerId) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.next_id += 1;
        let id = TimerId(self.next_id);
        let trigger = make_trigger(id);
        let quiet = self.quiet;
        let handle = tokio::spawn(async move {
            tokio::time::sleep(quiet).await;
            trigger.await;
        });
        if let Some(previous) = self.pending.insert(key, PendingTimer { id, handle }) {
            previous.handle.abort();
        }
        id
    }

    /// Acknowledge that timer `id` fired for `key`.
    ///
    /// Returns `true` only if `id` is still the latest timer for `key`; the
    /// entry is then forgotten. A `false` means the trigger was superseded or
    /// cancelled after it fired and its work must be ignored.
    pub fn take_fired(&mut self, key: &K, id: TimerId) -> bool {
        match self.pending.get(key) {
            Some(timer) if timer.id == id => {
                self.pending.remove(key);
                true
            }
            _ => false,
        }
    }

    /// Cancel the timer for `key`. Returns whether one was still waiting.
    pub fn cancel(&mut self, key: &K) -> bool {
        match self.pending.remove(key) {
            Some(timer) => {
                let waiting = !timer.handle.is_finished();
                timer.handle.abort();
                waiting
            }
            None => false,
        }
    }

    pub fn cancel_all(&mut self) {
        for (_, timer) in self.pending.drain() {
            timer.handle.abort();
        }
    }

    #[must_use]
    pub fn is_pending(&self, key: &K) -> bool {
        self.pending
            .get(key)
            .is_some_and(|timer| !timer.handle.is_finished())
    }
}

impl<K> Drop for DebounceScheduler<K> {
    fn drop(&mut self) {
        for timer in self.pending.values() {
            timer.handle.abort();
        }
    }
}
