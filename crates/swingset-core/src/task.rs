//! Work deferred until the current event has been delivered.
//!
//! Controllers post closures to a [`SharedTaskQueue`] instead of running them
//! inline, for example the navigator's pre-insert hook, which must see the
//! field values that the insert-row move is about to blank. The host drains
//! the queue from its event loop.
//!
//! [`Coalescer`] keeps only the newest of several tasks scheduled under one
//! key. A burst of cursor notifications then costs one navigator refresh.

use std::collections::{HashMap, VecDeque};
use std::hash::Hash;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

use crate::logging::targets;

type Deferred = Box<dyn FnOnce() + Send + 'static>;

/// FIFO of deferred closures, safe to post to from inside a running task.
///
/// The lock is never held while a task runs. Tasks posted during
/// [`process_all`](Self::process_all) run in the same drain, behind
/// everything that was already waiting.
#[derive(Default)]
pub struct SharedTaskQueue {
    waiting: Mutex<VecDeque<Deferred>>,
}

static_assertions::assert_impl_all!(SharedTaskQueue: Send, Sync);

impl SharedTaskQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn post<F>(&self, task: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.waiting.lock().push_back(Box::new(task));
    }

    pub fn has_pending(&self) -> bool {
        !self.waiting.lock().is_empty()
    }

    pub fn pending_count(&self) -> usize {
        self.waiting.lock().len()
    }

    /// Drain the queue, including follow-ups posted along the way.
    ///
    /// Returns how many tasks ran.
    pub fn process_all(&self) -> usize {
        let mut ran = 0;
        while let Some(task) = self.take_next() {
            task();
            ran += 1;
        }
        if ran > 0 {
            tracing::trace!(target: targets::TASK, ran, "deferred tasks drained");
        }
        ran
    }

    fn take_next(&self) -> Option<Deferred> {
        self.waiting.lock().pop_front()
    }
}

/// Last-scheduled-wins collapsing of deferred tasks, per key.
///
/// Each [`schedule`](Self::schedule) call stamps its task with a fresh
/// generation and records it as the newest for the key. When a stamped task
/// comes off the queue it runs only if its stamp is still the newest.
///
/// ```
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use swingset_core::{Coalescer, SharedTaskQueue};
///
/// let queue = SharedTaskQueue::new();
/// let refresh = Coalescer::new();
/// let refreshes = Arc::new(AtomicUsize::new(0));
///
/// for _row_event in 0..5 {
///     let refreshes = Arc::clone(&refreshes);
///     refresh.schedule(&queue, "buttons", move || {
///         refreshes.fetch_add(1, Ordering::SeqCst);
///     });
/// }
/// queue.process_all();
/// assert_eq!(refreshes.load(Ordering::SeqCst), 1);
/// ```
pub struct Coalescer<K> {
    newest: Arc<Mutex<HashMap<K, u64>>>,
    stamps: AtomicU64,
}

impl<K: Hash + Eq + Clone + Send + 'static> Default for Coalescer<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Hash + Eq + Clone + Send + 'static> Coalescer<K> {
    pub fn new() -> Self {
        Self {
            newest: Arc::new(Mutex::new(HashMap::new())),
            stamps: AtomicU64::new(0),
        }
    }

    /// Post `task` under `key`, making any earlier task for `key` stale.
    ///
    /// Returns the stamp given to this task.
    pub fn schedule<F>(&self, queue: &SharedTaskQueue, key: K, task: F) -> u64
    where
        F: FnOnce() + Send + 'static,
    {
        let stamp = self.stamps.fetch_add(1, Ordering::SeqCst) + 1;
        self.newest.lock().insert(key.clone(), stamp);

        let newest = Arc::clone(&self.newest);
        queue.post(move || {
            let still_newest = {
                let mut table = newest.lock();
                let hit = table.get(&key) == Some(&stamp);
                if hit {
                    table.remove(&key);
                }
                hit
            };
            if still_newest {
                task();
            } else {
                tracing::trace!(target: targets::TASK, stamp, "superseded task skipped");
            }
        });
        stamp
    }

    /// Whether a task for `key` is queued and not yet run.
    pub fn is_pending(&self, key: &K) -> bool {
        self.newest.lock().contains_key(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recorder<T: Send + 'static>() -> (Arc<Mutex<Vec<T>>>, Arc<Mutex<Vec<T>>>) {
        let log = Arc::new(Mutex::new(Vec::new()));
        (Arc::clone(&log), log)
    }

    #[test]
    fn drains_in_posting_order() {
        let queue = SharedTaskQueue::new();
        let (log, sink) = recorder();
        for step in ["settle", "hook", "recompute"] {
            let sink = Arc::clone(&sink);
            queue.post(move || sink.lock().push(step));
        }

        assert_eq!(queue.pending_count(), 3);
        assert_eq!(queue.process_all(), 3);
        assert_eq!(*log.lock(), vec!["settle", "hook", "recompute"]);
        assert!(!queue.has_pending());
        assert_eq!(queue.process_all(), 0);
    }

    #[test]
    fn followups_run_after_waiting_tasks() {
        let queue = Arc::new(SharedTaskQueue::new());
        let (log, sink) = recorder();

        queue.post({
            let queue = Arc::clone(&queue);
            let sink = Arc::clone(&sink);
            move || {
                sink.lock().push("pre-insert");
                let sink = Arc::clone(&sink);
                queue.post(move || sink.lock().push("blank fields"));
            }
        });
        queue.post({
            let sink = Arc::clone(&sink);
            move || sink.lock().push("buttons")
        });

        assert_eq!(queue.process_all(), 3);
        assert_eq!(*log.lock(), vec!["pre-insert", "buttons", "blank fields"]);
    }

    #[test]
    fn burst_collapses_to_newest() {
        let queue = SharedTaskQueue::new();
        let refresh = Coalescer::new();
        let (log, sink) = recorder();

        let mut last = 0;
        for row in 0..4 {
            let sink = Arc::clone(&sink);
            last = refresh.schedule(&queue, (), move || sink.lock().push(row));
        }
        assert_eq!(last, 4);
        assert!(refresh.is_pending(&()));

        queue.process_all();

        assert_eq!(*log.lock(), vec![3]);
        assert!(!refresh.is_pending(&()));
    }

    #[test]
    fn keys_collapse_independently() {
        let queue = SharedTaskQueue::new();
        let refresh = Coalescer::new();
        let (log, sink) = recorder();

        for table in ["customers", "orders", "customers"] {
            let sink = Arc::clone(&sink);
            refresh.schedule(&queue, table, move || sink.lock().push(table));
        }
        queue.process_all();

        let mut ran = log.lock().clone();
        ran.sort_unstable();
        assert_eq!(ran, vec!["customers", "orders"]);
    }

    #[test]
    fn each_drained_burst_runs_once() {
        let queue = SharedTaskQueue::new();
        let refresh = Coalescer::new();
        let (log, sink) = recorder();

        for burst in 0..2 {
            for _ in 0..3 {
                let sink = Arc::clone(&sink);
                refresh.schedule(&queue, 'n', move || sink.lock().push(burst));
            }
            queue.process_all();
        }

        assert_eq!(*log.lock(), vec![0, 1]);
    }
}
