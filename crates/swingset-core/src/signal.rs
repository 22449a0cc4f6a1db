//! Change notifications between cursors, controllers and widgets.
//!
//! A cursor announces that it moved, a selection announces that the user
//! picked an item, a navigator announces new button states. Each of these is
//! a [`Signal`] that any number of handlers can subscribe to.
//!
//! Handlers run synchronously on the emitting thread, oldest subscription
//! first. Emission works on a snapshot of the handler table, so a handler is
//! free to subscribe, unsubscribe or emit again; a handler added mid-emission
//! first hears the next one.
//!
//! ```
//! use swingset_core::{Signal, SignalBlocker};
//!
//! let row_changed = Signal::<usize>::new();
//! let id = row_changed.connect(|row| println!("now on row {row}"));
//!
//! row_changed.emit(1);
//! {
//!     // Repositioning during a search must not look like navigation.
//!     let _quiet = SignalBlocker::new(&row_changed);
//!     row_changed.emit(2);
//! }
//! row_changed.disconnect(id);
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use slotmap::{SlotMap, new_key_type};

use crate::logging::targets;

new_key_type! {
    /// Handle to one subscription, passed back to [`Signal::disconnect`].
    pub struct ConnectionId;
}

type Handler<Args> = Arc<dyn Fn(&Args) + Send + Sync>;

/// A notification carrying `Args` to every subscribed handler.
///
/// Use `()` when the event has no payload.
pub struct Signal<Args> {
    handlers: Mutex<SlotMap<ConnectionId, Handler<Args>>>,
    suppressed: AtomicBool,
}

static_assertions::assert_impl_all!(Signal<()>: Send, Sync);
static_assertions::assert_impl_all!(Signal<Option<String>>: Send, Sync);

impl<Args: Clone + Send + 'static> Default for Signal<Args> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Args: Clone + Send + 'static> Signal<Args> {
    pub fn new() -> Self {
        Self {
            handlers: Mutex::new(SlotMap::with_key()),
            suppressed: AtomicBool::new(false),
        }
    }

    /// Subscribe `handler`; keep the id to unsubscribe later.
    pub fn connect<F>(&self, handler: F) -> ConnectionId
    where
        F: Fn(&Args) + Send + Sync + 'static,
    {
        self.handlers.lock().insert(Arc::new(handler))
    }

    /// Unsubscribe. Returns `false` when `id` was already gone.
    pub fn disconnect(&self, id: ConnectionId) -> bool {
        self.handlers.lock().remove(id).is_some()
    }

    pub fn disconnect_all(&self) {
        self.handlers.lock().clear();
    }

    pub fn connection_count(&self) -> usize {
        self.handlers.lock().len()
    }

    /// Turn suppression on or off. Scoped code should use [`SignalBlocker`].
    pub fn set_blocked(&self, blocked: bool) {
        self.suppressed.store(blocked, Ordering::SeqCst);
    }

    pub fn is_blocked(&self) -> bool {
        self.suppressed.load(Ordering::SeqCst)
    }

    /// Deliver `args` to every handler unless the signal is suppressed.
    pub fn emit(&self, args: Args) {
        if self.is_blocked() {
            tracing::trace!(target: targets::SIGNAL, "suppressed emission dropped");
            return;
        }

        let snapshot: Vec<Handler<Args>> = self.handlers.lock().values().cloned().collect();
        if snapshot.is_empty() {
            return;
        }
        tracing::trace!(target: targets::SIGNAL, handlers = snapshot.len(), "delivering");
        for handler in &snapshot {
            handler(&args);
        }
    }
}

/// Suppresses a signal until dropped.
///
/// Drop puts back whatever suppression state was in force at creation, so
/// blockers nest and survive a panic in the guarded code.
#[must_use = "the signal is unblocked as soon as the blocker is dropped"]
pub struct SignalBlocker<'a, Args: Clone + Send + 'static> {
    signal: &'a Signal<Args>,
    restore_to: bool,
}

impl<'a, Args: Clone + Send + 'static> SignalBlocker<'a, Args> {
    pub fn new(signal: &'a Signal<Args>) -> Self {
        let restore_to = signal.is_blocked();
        signal.set_blocked(true);
        Self { signal, restore_to }
    }
}

impl<Args: Clone + Send + 'static> Drop for SignalBlocker<'_, Args> {
    fn drop(&mut self) {
        self.signal.set_blocked(self.restore_to);
    }
}
