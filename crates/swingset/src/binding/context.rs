//! Shared per-cursor state.

use std::collections::BTreeSet;
use std::error::Error;
use std::sync::Arc;

use parking_lot::Mutex;
use swingset_core::logging::targets;
use swingset_core::{Property, SharedTaskQueue, Signal};

use crate::cursor::TabularCursor;
use crate::error::CursorResult;
use crate::notice::{LogNotifier, Notice, Notifier};

/// Signals emitted by a [`CursorContext`].
#[derive(Default)]
pub struct ContextSignals {
    /// Emitted with the new value when the insert flag changes.
    pub inserting_changed: Signal<bool>,
    /// Emitted with the new value when the row-modified flag changes.
    pub row_modified_changed: Signal<bool>,
    /// Emitted with the new error count when the error set changes.
    pub errors_changed: Signal<usize>,
}

/// State shared by every controller bound to one cursor.
///
/// All controllers bound to the same cursor hold the same `CursorContext`.
/// It answers "is this cursor on the insert row" and "does the current row
/// have unsaved edits" for components that have no navigator of their own,
/// and it owns the deferred task queue and the notifier.
pub struct CursorContext {
    cursor: Arc<dyn TabularCursor>,
    tasks: Arc<SharedTaskQueue>,
    notifier: Arc<dyn Notifier>,
    inserting: Property<bool>,
    row_modified: Property<bool>,
    errors: Mutex<BTreeSet<String>>,
    signals: ContextSignals,
}

static_assertions::assert_impl_all!(CursorContext: Send, Sync);

impl CursorContext {
    /// Create a context with its own task queue and a [`LogNotifier`].
    pub fn new(cursor: Arc<dyn TabularCursor>) -> Arc<Self> {
        Self::with_parts(cursor, Arc::new(SharedTaskQueue::new()), Arc::new(LogNotifier))
    }

    /// Create a context from explicit parts.
    pub fn with_parts(
        cursor: Arc<dyn TabularCursor>,
        tasks: Arc<SharedTaskQueue>,
        notifier: Arc<dyn Notifier>,
    ) -> Arc<Self> {
        Arc::new(Self {
            cursor,
            tasks,
            notifier,
            inserting: Property::new(false),
            row_modified: Property::new(false),
            errors: Mutex::new(BTreeSet::new()),
            signals: ContextSignals::default(),
        })
    }

    /// The bound cursor.
    pub fn cursor(&self) -> &Arc<dyn TabularCursor> {
        &self.cursor
    }

    /// The deferred task queue.
    pub fn tasks(&self) -> &Arc<SharedTaskQueue> {
        &self.tasks
    }

    /// The notifier used for user-facing messages.
    pub fn notifier(&self) -> &Arc<dyn Notifier> {
        &self.notifier
    }

    /// The context's signals.
    pub fn signals(&self) -> &ContextSignals {
        &self.signals
    }

    /// Run deferred tasks until the queue is empty.
    pub fn process_events(&self) -> usize {
        self.tasks.process_all()
    }

    /// Whether the cursor is on the insert row.
    pub fn is_inserting(&self) -> bool {
        self.inserting.get()
    }

    /// Update the insert flag. Returns `true` if it changed.
    pub fn set_inserting(&self, inserting: bool) -> bool {
        let changed = self.inserting.set(inserting);
        if changed {
            tracing::debug!(target: targets::NAVIGATOR, inserting, "insert flag changed");
            self.signals.inserting_changed.emit(inserting);
        }
        changed
    }

    /// Whether the current row has edits not yet written.
    pub fn is_row_modified(&self) -> bool {
        self.row_modified.get()
    }

    /// Update the row-modified flag. Returns `true` if it changed.
    pub fn set_row_modified(&self, modified: bool) -> bool {
        let changed = self.row_modified.set(modified);
        if changed {
            self.signals.row_modified_changed.emit(modified);
        }
        changed
    }

    /// Mark `component` as holding invalid input.
    pub fn add_error(&self, component: impl Into<String>) -> bool {
        let (added, count) = {
            let mut errors = self.errors.lock();
            (errors.insert(component.into()), errors.len())
        };
        if added {
            self.signals.errors_changed.emit(count);
        }
        added
    }

    /// Clear the error mark of `component`.
    pub fn clear_error(&self, component: &str) -> bool {
        let (removed, count) = {
            let mut errors = self.errors.lock();
            (errors.remove(component), errors.len())
        };
        if removed {
            self.signals.errors_changed.emit(count);
        }
        removed
    }

    /// Clear every error mark.
    pub fn clear_errors(&self) {
        let had_errors = {
            let mut errors = self.errors.lock();
            let had = !errors.is_empty();
            errors.clear();
            had
        };
        if had_errors {
            self.signals.errors_changed.emit(0);
        }
    }

    /// Whether any component holds invalid input.
    pub fn has_errors(&self) -> bool {
        !self.errors.lock().is_empty()
    }

    /// Names of components holding invalid input, sorted.
    pub fn error_components(&self) -> Vec<String> {
        self.errors.lock().iter().cloned().collect()
    }

    /// Text of `column` on the current row.
    pub fn read_text(&self, column: &str) -> CursorResult<Option<String>> {
        self.cursor.column_text(column)
    }

    /// Stage `value` into `column` if it differs from the current text.
    ///
    /// A successful write marks the row modified. Failures are reported to
    /// the user and logged. Returns `true` if a value was written.
    pub fn write_column(&self, column: &str, value: Option<&str>) -> bool {
        match self.cursor.column_text(column) {
            Ok(current) if current.as_deref() == value => return false,
            Ok(_) => {}
            Err(err) => {
                self.report("Read failed", &err);
                return false;
            }
        }
        match self.cursor.set_column_text(column, value) {
            Ok(()) => {
                tracing::trace!(target: targets::CURSOR, column, ?value, "column staged");
                self.set_row_modified(true);
                true
            }
            Err(err) => {
                self.report("Write failed", &err);
                false
            }
        }
    }

    /// Log `err` and show it to the user.
    pub fn report(&self, title: &str, err: &dyn Error) {
        tracing::error!(target: targets::CURSOR, error = %err, "{title}");
        self.notifier.notify(&Notice::critical(title, err.to_string()));
    }
}
