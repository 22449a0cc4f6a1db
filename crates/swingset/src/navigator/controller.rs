//! The row navigator and its commit state machine.

use std::sync::{Arc, Weak};

use parking_lot::{Mutex, RwLock};
use swingset_core::logging::{span_names, targets};
use swingset_core::{Coalescer, ConnectionId, PerfSpan, Signal, SignalBlocker};

use super::enablement::{ButtonStates, EnablementInputs, EnablementPolicy, compute};
use super::hook::{NavigationDirection, NavigationHook, NoopHook};
use super::state::NavigatorRowState;
use crate::binding::{CursorContext, FieldContainer, reset_fields};
use crate::config::NavigatorConfig;
use crate::cursor::{CursorConnections, TabularCursor};
use crate::error::{CursorError, CursorResult};
use crate::notice::Notice;

/// Result of a navigator command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NavOutcome {
    /// The command completed.
    Done,
    /// The hook or the user declined. Nothing changed.
    Rejected,
    /// The command is not available in the current state. Nothing changed.
    Blocked,
    /// A cursor operation failed. The failure was reported and nothing changed.
    Failed,
    /// No row matched. The cursor stayed where it was.
    NotFound,
}

impl NavOutcome {
    /// Whether the command completed.
    pub fn is_done(self) -> bool {
        self == Self::Done
    }
}

/// Signals emitted by a [`DataNavigator`].
#[derive(Default)]
pub struct NavigatorSignals {
    /// Emitted when button enablement changes.
    pub buttons_changed: Signal<ButtonStates>,
    /// Emitted once per coalesced refresh, after cursor or context changes.
    pub state_refreshed: Signal<NavigatorRowState>,
}

struct NavigatorConnections {
    cursor: CursorConnections,
    inserting: ConnectionId,
    row_modified: ConnectionId,
    errors: ConnectionId,
}

/// Moves a cursor between rows and commits, discards, inserts and deletes.
///
/// The navigator keeps the [`CursorContext`] flags in step with the cursor,
/// calls its [`NavigationHook`] at each transition and recomputes button
/// enablement after every command. Cursor failures never escape: they are
/// logged, shown through the context's notifier and reported as
/// [`NavOutcome::Failed`].
///
/// Cursor and context notifications are coalesced. However many arrive for
/// one logical change, the deferred refresh runs once and
/// [`state_refreshed`](NavigatorSignals::state_refreshed) fires once.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use swingset::binding::CursorContext;
/// use swingset::cursor::{ColumnSpec, ColumnType, MemoryCursor, TabularCursor};
/// use swingset::navigator::{DataNavigator, NavOutcome};
///
/// let cursor = Arc::new(
///     MemoryCursor::new(vec![ColumnSpec::new("id", ColumnType::Integer)])
///         .with_row([Some("1")])
///         .with_row([Some("2")]),
/// );
/// cursor.first().unwrap();
///
/// let navigator = DataNavigator::new(CursorContext::new(cursor.clone()));
/// assert_eq!(navigator.next(), NavOutcome::Done);
/// assert_eq!(cursor.current_row().unwrap(), 2);
/// assert!(!navigator.buttons().next);
/// ```
pub struct DataNavigator {
    context: Arc<CursorContext>,
    config: RwLock<NavigatorConfig>,
    hook: RwLock<Arc<dyn NavigationHook>>,
    fields: RwLock<Option<Arc<FieldContainer>>>,
    buttons: Mutex<ButtonStates>,
    refresher: Coalescer<()>,
    connections: Mutex<Option<NavigatorConnections>>,
    signals: NavigatorSignals,
    this: Weak<DataNavigator>,
}

static_assertions::assert_impl_all!(DataNavigator: Send, Sync);

impl DataNavigator {
    /// Create a navigator over the cursor in `context` with default settings.
    pub fn new(context: Arc<CursorContext>) -> Arc<Self> {
        Self::with_config(context, NavigatorConfig::default())
    }

    /// Create a navigator with explicit settings.
    pub fn with_config(context: Arc<CursorContext>, config: NavigatorConfig) -> Arc<Self> {
        let navigator = Arc::new_cyclic(|this: &Weak<Self>| Self {
            context,
            config: RwLock::new(config),
            hook: RwLock::new(Arc::new(NoopHook)),
            fields: RwLock::new(None),
            buttons: Mutex::new(ButtonStates::default()),
            refresher: Coalescer::new(),
            connections: Mutex::new(None),
            signals: NavigatorSignals::default(),
            this: this.clone(),
        });
        navigator.connect();
        navigator.recompute();
        navigator
    }

    fn connect(&self) {
        let cursor = {
            let this = self.this.clone();
            self.context.cursor().signals().connect_all(move |event| {
                if let Some(navigator) = this.upgrade() {
                    tracing::trace!(target: targets::NAVIGATOR, ?event, "cursor notification");
                    navigator.schedule_refresh();
                }
            })
        };
        let signals = self.context.signals();
        let this = self.this.clone();
        let inserting = signals.inserting_changed.connect(move |_| {
            if let Some(navigator) = this.upgrade() {
                navigator.schedule_refresh();
            }
        });
        let this = self.this.clone();
        let row_modified = signals.row_modified_changed.connect(move |_| {
            if let Some(navigator) = this.upgrade() {
                navigator.schedule_refresh();
            }
        });
        let this = self.this.clone();
        let errors = signals.errors_changed.connect(move |_| {
            if let Some(navigator) = this.upgrade() {
                navigator.schedule_refresh();
            }
        });
        *self.connections.lock() = Some(NavigatorConnections {
            cursor,
            inserting,
            row_modified,
            errors,
        });
    }

    // =========================================================================
    // Accessors and settings
    // =========================================================================

    /// The shared cursor context.
    pub fn context(&self) -> &Arc<CursorContext> {
        &self.context
    }

    /// The navigator's signals.
    pub fn signals(&self) -> &NavigatorSignals {
        &self.signals
    }

    /// Current button enablement.
    pub fn buttons(&self) -> ButtonStates {
        *self.buttons.lock()
    }

    /// A copy of the current settings.
    pub fn config(&self) -> NavigatorConfig {
        self.config.read().clone()
    }

    /// Replace all settings.
    pub fn apply_config(&self, config: &NavigatorConfig) {
        *self.config.write() = config.clone();
        self.recompute();
    }

    /// Switch the enablement policy.
    pub fn set_policy(&self, policy: EnablementPolicy) {
        self.config.write().policy = policy;
        self.recompute();
    }

    /// Commit modified rows implicitly on navigation.
    pub fn set_auto_commit(&self, auto_commit: bool) {
        self.config.write().auto_commit = auto_commit;
        self.recompute();
    }

    /// Ask the user before deleting a row.
    pub fn set_confirm_deletions(&self, confirm: bool) {
        self.config.write().confirm_deletions = confirm;
    }

    /// Allow or forbid writing modified rows.
    pub fn set_modification_allowed(&self, allowed: bool) {
        self.config.write().modification_allowed = allowed;
        self.recompute();
    }

    /// Allow or forbid inserting rows.
    pub fn set_insertion_allowed(&self, allowed: bool) {
        self.config.write().insertion_allowed = allowed;
        self.recompute();
    }

    /// Allow or forbid deleting rows.
    pub fn set_deletion_allowed(&self, allowed: bool) {
        self.config.write().deletion_allowed = allowed;
        self.recompute();
    }

    /// Install the host's customization hook.
    pub fn set_hook(&self, hook: Arc<dyn NavigationHook>) {
        *self.hook.write() = hook;
    }

    /// Fields blanked when the insert row is shown.
    pub fn set_field_container(&self, container: Option<Arc<FieldContainer>>) {
        *self.fields.write() = container;
    }

    fn hook(&self) -> Arc<dyn NavigationHook> {
        self.hook.read().clone()
    }

    fn cursor(&self) -> &dyn TabularCursor {
        self.context.cursor().as_ref()
    }

    /// Snapshot of cursor position and context flags.
    ///
    /// Position queries that fail read as "no row".
    pub fn row_state(&self) -> NavigatorRowState {
        let cursor = self.cursor();
        NavigatorRowState {
            inserting: self.context.is_inserting(),
            row_modified: self.context.is_row_modified(),
            has_errors: self.context.has_errors(),
            current_row: cursor.current_row().unwrap_or_default(),
            row_count: cursor.row_count().unwrap_or_default(),
        }
    }

    // =========================================================================
    // Navigation
    // =========================================================================

    /// Move to the first row.
    pub fn first(&self) -> NavOutcome {
        self.navigate(NavigationDirection::First, |cursor| cursor.first())
    }

    /// Move to the previous row.
    pub fn previous(&self) -> NavOutcome {
        self.navigate(NavigationDirection::Previous, |cursor| cursor.previous())
    }

    /// Move to the next row.
    pub fn next(&self) -> NavOutcome {
        self.navigate(NavigationDirection::Next, |cursor| cursor.next())
    }

    /// Move to the last row.
    pub fn last(&self) -> NavOutcome {
        self.navigate(NavigationDirection::Last, |cursor| cursor.last())
    }

    /// Move to the 1-based `row`.
    ///
    /// A row outside the result is reported to the user.
    pub fn go_to_row(&self, row: usize) -> NavOutcome {
        let row_count = self.cursor().row_count().unwrap_or_default();
        if row == 0 || row > row_count {
            self.context
                .report("Navigation failed", &CursorError::RowOutOfRange { row, row_count });
            return NavOutcome::Failed;
        }
        self.navigate(NavigationDirection::Direct, move |cursor| cursor.absolute(row))
    }

    /// Move to the first row whose `column` text equals `text`.
    ///
    /// The search itself emits no movement notifications; one is emitted
    /// when a row is found. If none matches, the cursor returns to where it
    /// was and [`NavOutcome::NotFound`] is returned.
    ///
    /// A modified row is committed first under auto-commit. Without
    /// auto-commit the search is refused with [`NavOutcome::Blocked`], since
    /// a miss would otherwise cost the user their edits.
    pub fn go_to_mapping(&self, column: &str, text: Option<&str>) -> NavOutcome {
        if let Some(blocked) = self.check_can_leave(NavigationDirection::Direct) {
            return blocked;
        }
        let cursor = self.cursor();
        let start = cursor.current_row().unwrap_or_default();
        if start > 0 {
            match cursor.column_text(column) {
                Ok(current) if current.as_deref() == text => return NavOutcome::Done,
                Ok(_) => {}
                Err(err) => {
                    self.context.report("Navigation failed", &err);
                    self.recompute();
                    return NavOutcome::Failed;
                }
            }
        }
        if self.context.is_row_modified() && !self.config.read().auto_commit {
            tracing::debug!(target: targets::NAVIGATOR, column, "search refused; row has unsaved edits");
            return NavOutcome::Blocked;
        }
        if let Some(outcome) = self.settle_modified_row() {
            return outcome;
        }

        let (found, restored) = {
            let _blocker = SignalBlocker::new(&cursor.signals().cursor_moved);
            let found = scan_for(cursor, column, text);
            let restored = match found {
                Ok(true) => Ok(()),
                _ => restore(cursor, start),
            };
            (found, restored)
        };
        match (found, restored) {
            (Ok(true), _) => {
                cursor.signals().cursor_moved.emit(());
                self.after_move(NavigationDirection::Direct)
            }
            (Ok(false), Ok(())) => {
                tracing::debug!(target: targets::NAVIGATOR, column, ?text, "no row matches");
                NavOutcome::NotFound
            }
            (found, restored) => {
                if let Err(err) = found {
                    self.context.report("Navigation failed", &err);
                }
                if let Err(err) = restored {
                    // The cursor is stranded somewhere in the scan.
                    self.context.report("Could not return to the starting row", &err);
                    cursor.signals().cursor_moved.emit(());
                }
                self.recompute();
                NavOutcome::Failed
            }
        }
    }

    fn navigate<F>(&self, direction: NavigationDirection, mover: F) -> NavOutcome
    where
        F: FnOnce(&dyn TabularCursor) -> CursorResult<bool>,
    {
        if let Some(blocked) = self.check_can_leave(direction) {
            return blocked;
        }
        if let Some(outcome) = self.settle_modified_row() {
            return outcome;
        }

        let cursor = self.cursor();
        let start = cursor.current_row().unwrap_or_default();
        match mover(cursor) {
            Ok(true) => self.after_move(direction),
            Ok(false) => {
                // Fell off either end; go back to the row we started on.
                if let Err(err) = restore(cursor, start) {
                    self.context.report("Navigation failed", &err);
                    self.recompute();
                    return NavOutcome::Failed;
                }
                self.recompute();
                NavOutcome::Blocked
            }
            Err(err) => {
                self.context.report("Navigation failed", &err);
                self.recompute();
                NavOutcome::Failed
            }
        }
    }

    /// Why the cursor may not leave its row, if it may not.
    fn check_can_leave(&self, direction: NavigationDirection) -> Option<NavOutcome> {
        let state = self.row_state();
        let config = self.config.read();
        let strict = config.policy == EnablementPolicy::Strict;

        let reason = if state.inserting {
            Some("on the insert row")
        } else if strict && state.has_errors {
            Some("invalid input")
        } else if strict && state.row_modified && !config.auto_commit {
            Some("row has unsaved edits")
        } else if state.row_count == 0 {
            Some("no rows")
        } else {
            let at_first = state.current_row == 1;
            let at_last = state.current_row == state.row_count;
            match direction {
                NavigationDirection::Previous if state.current_row <= 1 => Some("at first row"),
                NavigationDirection::Next if at_last => Some("at last row"),
                NavigationDirection::First if at_first => Some("already on first row"),
                NavigationDirection::Last if at_last => Some("already on last row"),
                _ => None,
            }
        };
        reason.map(|reason| {
            tracing::debug!(target: targets::NAVIGATOR, ?direction, reason, "navigation blocked");
            NavOutcome::Blocked
        })
    }

    /// Commit or discard the modified row before leaving it.
    ///
    /// Returns an outcome only when navigation must stop.
    fn settle_modified_row(&self) -> Option<NavOutcome> {
        if !self.context.is_row_modified() {
            return None;
        }
        if self.config.read().auto_commit {
            return match self.commit_update() {
                NavOutcome::Done => None,
                outcome => Some(outcome),
            };
        }
        tracing::debug!(target: targets::NAVIGATOR, "discarding unsaved edits");
        if let Err(err) = self.cursor().cancel_row_updates() {
            self.context.report("Discard failed", &err);
            return Some(NavOutcome::Failed);
        }
        self.context.set_row_modified(false);
        None
    }

    fn after_move(&self, direction: NavigationDirection) -> NavOutcome {
        self.context.set_row_modified(false);
        self.context.clear_errors();
        tracing::debug!(
            target: targets::NAVIGATOR,
            ?direction,
            row = self.cursor().current_row().unwrap_or_default(),
            "moved"
        );
        self.hook().perform_navigation_ops(direction);
        self.recompute();
        NavOutcome::Done
    }

    // =========================================================================
    // Row commands
    // =========================================================================

    /// Start a new row.
    ///
    /// Modified values are committed first; if that commit does not go
    /// through, nothing else happens. The hook's pre-insert callback runs
    /// from the task queue, after the blanked fields have settled.
    pub fn add(&self) -> NavOutcome {
        let state = self.row_state();
        {
            let config = self.config.read();
            let strict = config.policy == EnablementPolicy::Strict;
            if state.inserting || !config.insertion_allowed || (strict && state.has_errors) {
                return NavOutcome::Blocked;
            }
        }
        if state.row_modified {
            match self.commit_update() {
                NavOutcome::Done => {}
                outcome => return outcome,
            }
        }

        if let Err(err) = self.cursor().move_to_insert_row() {
            self.context.report("Insert failed", &err);
            self.recompute();
            return NavOutcome::Failed;
        }
        self.context.set_inserting(true);
        self.context.set_row_modified(false);
        self.context.clear_errors();

        let fields = self.fields.read().clone();
        if let Some(fields) = fields {
            let reset = reset_fields(&fields);
            tracing::trace!(target: targets::NAVIGATOR, reset, "fields blanked for insert");
        }

        let this = self.this.clone();
        self.context.tasks().post(move || {
            if let Some(navigator) = this.upgrade()
                && navigator.context.is_inserting()
            {
                navigator.hook().perform_pre_insert_ops();
            }
        });

        tracing::debug!(target: targets::NAVIGATOR, "insert row opened");
        self.recompute();
        NavOutcome::Done
    }

    /// Write the insert row or the modified row.
    ///
    /// Committing an unmodified stored row does nothing.
    pub fn commit(&self) -> NavOutcome {
        let _span = tracing::debug_span!(target: targets::NAVIGATOR, span_names::NAVIGATOR, op = "commit").entered();
        let _perf = PerfSpan::new("commit");
        if self.context.is_inserting() {
            self.commit_insert()
        } else if self.context.is_row_modified() {
            self.commit_update()
        } else {
            tracing::debug!(target: targets::NAVIGATOR, "nothing to commit");
            NavOutcome::Done
        }
    }

    fn commit_insert(&self) -> NavOutcome {
        if self.config.read().policy == EnablementPolicy::Strict && self.context.has_errors() {
            return NavOutcome::Blocked;
        }
        let hook = self.hook();
        if !hook.allow_insertion() {
            tracing::debug!(target: targets::NAVIGATOR, "insertion rejected by hook");
            return NavOutcome::Rejected;
        }
        let cursor = self.cursor();
        if let Err(err) = cursor.insert_row() {
            self.context.report("Insert failed", &err);
            self.recompute();
            return NavOutcome::Failed;
        }
        self.context.set_inserting(false);
        self.context.set_row_modified(false);
        // The new row is appended; show it.
        if let Err(err) = cursor.move_to_current_row().and_then(|()| cursor.last().map(drop)) {
            self.context.report("Navigation failed", &err);
        }
        tracing::debug!(target: targets::NAVIGATOR, "row inserted");
        hook.perform_post_insert_ops();
        self.recompute();
        NavOutcome::Done
    }

    fn commit_update(&self) -> NavOutcome {
        {
            let config = self.config.read();
            if !config.modification_allowed
                || (config.policy == EnablementPolicy::Strict && self.context.has_errors())
            {
                return NavOutcome::Blocked;
            }
        }
        let hook = self.hook();
        if !hook.allow_update() {
            tracing::debug!(target: targets::NAVIGATOR, "update rejected by hook");
            return NavOutcome::Rejected;
        }
        if let Err(err) = self.cursor().update_row() {
            self.context.report("Update failed", &err);
            self.recompute();
            return NavOutcome::Failed;
        }
        self.context.set_row_modified(false);
        tracing::debug!(target: targets::NAVIGATOR, "row updated");
        hook.perform_post_update_ops();
        self.recompute();
        NavOutcome::Done
    }

    /// Abandon the insert row or the unsaved edits.
    ///
    /// Leaving the insert row returns to the row that was current before
    /// [`add`](Self::add). Discarded edits are re-read from the source.
    pub fn undo(&self) -> NavOutcome {
        let cursor = self.cursor();
        if self.context.is_inserting() {
            let result = cursor
                .cancel_row_updates()
                .and_then(|()| cursor.move_to_current_row());
            if let Err(err) = result {
                self.context.report("Undo failed", &err);
                self.recompute();
                return NavOutcome::Failed;
            }
            self.context.set_inserting(false);
        } else if self.context.is_row_modified() {
            let result = cursor.cancel_row_updates().and_then(|()| cursor.refresh_row());
            if let Err(err) = result {
                self.context.report("Undo failed", &err);
                self.recompute();
                return NavOutcome::Failed;
            }
        } else {
            return NavOutcome::Done;
        }
        self.context.set_row_modified(false);
        self.context.clear_errors();
        tracing::debug!(target: targets::NAVIGATOR, "changes abandoned");
        self.hook().perform_cancel_ops();
        self.recompute();
        NavOutcome::Done
    }

    /// Delete the current row and show the one that followed it.
    ///
    /// When it was the last row, the new last row is shown.
    pub fn delete(&self) -> NavOutcome {
        let state = self.row_state();
        let confirm = {
            let config = self.config.read();
            let strict = config.policy == EnablementPolicy::Strict;
            if state.inserting
                || !config.deletion_allowed
                || state.current_row == 0
                || (strict && state.has_errors)
            {
                return NavOutcome::Blocked;
            }
            config.confirm_deletions
        };
        if confirm {
            let question = Notice::question("Delete", "Delete the current row?");
            if !self.context.notifier().confirm(&question) {
                return NavOutcome::Rejected;
            }
        }
        let hook = self.hook();
        if !hook.allow_deletion() {
            tracing::debug!(target: targets::NAVIGATOR, "deletion rejected by hook");
            return NavOutcome::Rejected;
        }

        hook.perform_pre_deletion_ops();
        let cursor = self.cursor();
        if let Err(err) = cursor.delete_row() {
            self.context.report("Delete failed", &err);
            self.recompute();
            return NavOutcome::Failed;
        }
        self.context.set_row_modified(false);
        self.context.clear_errors();
        tracing::debug!(target: targets::NAVIGATOR, row = state.current_row, "row deleted");
        hook.perform_post_deletion_ops();

        let outcome = match reposition_after_delete(cursor, state.current_row) {
            Ok(()) => NavOutcome::Done,
            Err(err) => {
                self.context.report("Navigation failed", &err);
                NavOutcome::Failed
            }
        };
        self.recompute();
        outcome
    }

    /// Re-run the query and show the first row. Unsaved edits are lost.
    pub fn refresh(&self) -> NavOutcome {
        if self.context.is_inserting() {
            return NavOutcome::Blocked;
        }
        let _perf = PerfSpan::new("refresh");
        let cursor = self.cursor();
        if let Err(err) = cursor.execute().and_then(|()| cursor.first().map(drop)) {
            self.context.report("Refresh failed", &err);
            self.recompute();
            return NavOutcome::Failed;
        }
        self.context.set_row_modified(false);
        self.context.clear_errors();
        tracing::debug!(target: targets::NAVIGATOR, "refreshed");
        self.hook().perform_refresh_ops();
        self.recompute();
        NavOutcome::Done
    }

    // =========================================================================
    // Enablement and refresh
    // =========================================================================

    /// Recompute button enablement now. Emits `buttons_changed` on change.
    fn recompute(&self) -> ButtonStates {
        let (policy, inputs) = {
            let config = self.config.read();
            (config.policy, EnablementInputs::new(&self.row_state(), &config))
        };
        let next = compute(policy, &inputs);
        let changed = {
            let mut buttons = self.buttons.lock();
            let changed = *buttons != next;
            *buttons = next;
            changed
        };
        if changed {
            self.signals.buttons_changed.emit(next);
        }
        next
    }

    fn schedule_refresh(&self) {
        let this = self.this.clone();
        self.refresher.schedule(self.context.tasks(), (), move || {
            if let Some(navigator) = this.upgrade() {
                navigator.run_refresh();
            }
        });
    }

    fn run_refresh(&self) {
        let _span = tracing::trace_span!(target: targets::NAVIGATOR, span_names::NAVIGATOR, op = "refresh_state").entered();
        self.recompute();
        let state = self.row_state();
        tracing::trace!(target: targets::NAVIGATOR, state = %state.nav_state(), row = state.current_row, "state refreshed");
        self.signals.state_refreshed.emit(state);
    }
}

impl Drop for DataNavigator {
    fn drop(&mut self) {
        if let Some(connections) = self.connections.get_mut().take() {
            self.context
                .cursor()
                .signals()
                .disconnect_all(&connections.cursor);
            let signals = self.context.signals();
            signals.inserting_changed.disconnect(connections.inserting);
            signals.row_modified_changed.disconnect(connections.row_modified);
            signals.errors_changed.disconnect(connections.errors);
        }
    }
}

/// Advance from the first row until `column` equals `text`.
fn scan_for(cursor: &dyn TabularCursor, column: &str, text: Option<&str>) -> CursorResult<bool> {
    let mut more = cursor.first()?;
    while more {
        if cursor.column_text(column)?.as_deref() == text {
            return Ok(true);
        }
        more = cursor.next()?;
    }
    Ok(false)
}

fn restore(cursor: &dyn TabularCursor, row: usize) -> CursorResult<()> {
    if row > 0 {
        cursor.absolute(row)?;
    }
    Ok(())
}

fn reposition_after_delete(cursor: &dyn TabularCursor, deleted: usize) -> CursorResult<()> {
    let row_count = cursor.row_count()?;
    if row_count > 0 {
        cursor.absolute(deleted.min(row_count))?;
    }
    Ok(())
}
