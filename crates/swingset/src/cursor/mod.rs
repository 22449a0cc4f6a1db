//! The tabular cursor abstraction.
//!
//! A cursor is a live, positionable view over a query result (a JDBC
//! `RowSet` equivalent). SwingSet never talks to a database directly: every
//! controller reads and writes column text through [`TabularCursor`] and
//! listens to [`CursorSignals`] for movement and data changes.
//!
//! Row numbers are 1-based. `current_row()` reports 0 when the cursor is
//! before the first row, after the last row, or on the insert row.
//!
//! # Implementations
//!
//! - [`MemoryCursor`]: in-memory rows with JDBC-like semantics, for
//!   prototyping and tests
//!
//! Hosts backed by a real database implement [`TabularCursor`] over their
//! driver and emit the signals after each successful operation.

mod column;
mod memory;

pub use column::{ColumnScalar, ColumnType};
pub use memory::{ColumnSpec, CursorOp, MemoryCursor};

use std::sync::Arc;

use swingset_core::{ConnectionId, Signal};

use crate::error::CursorResult;

/// The minimal cursor surface SwingSet consumes.
///
/// All methods take `&self`; implementations use interior mutability, the
/// same way item models do. Implementations must emit their signals only
/// after releasing any internal locks, because slots call back into the
/// cursor.
pub trait TabularCursor: Send + Sync {
    /// Text of `column` on the current row (or insert row). `None` is SQL NULL.
    fn column_text(&self, column: &str) -> CursorResult<Option<String>>;

    /// Stage a new value for `column` on the current row (or insert row).
    ///
    /// Staged values become permanent with [`update_row`](Self::update_row) or
    /// [`insert_row`](Self::insert_row).
    fn set_column_text(&self, column: &str, value: Option<&str>) -> CursorResult<()>;

    /// Declared type of `column`.
    fn column_type(&self, column: &str) -> CursorResult<ColumnType>;

    /// Whether `column` accepts NULL.
    fn column_nullable(&self, column: &str) -> CursorResult<bool> {
        self.column_type(column).map(|_| true)
    }

    /// 1-based current row, or 0 when not on a row.
    fn current_row(&self) -> CursorResult<usize>;

    /// Number of rows in the result.
    fn row_count(&self) -> CursorResult<usize>;

    /// Move to the first row. Returns `false` if the result is empty.
    fn first(&self) -> CursorResult<bool>;

    /// Move to the next row. Returns `false` if it moved past the last row.
    fn next(&self) -> CursorResult<bool>;

    /// Move to the previous row. Returns `false` if it moved before the first row.
    fn previous(&self) -> CursorResult<bool>;

    /// Move to the last row. Returns `false` if the result is empty.
    fn last(&self) -> CursorResult<bool>;

    /// Move to the 1-based `row`. Returns `false` if `row` is not in the result.
    fn absolute(&self, row: usize) -> CursorResult<bool>;

    /// Write the insert buffer as a new row.
    fn insert_row(&self) -> CursorResult<()>;

    /// Write staged values of the current row.
    fn update_row(&self) -> CursorResult<()>;

    /// Delete the current row.
    fn delete_row(&self) -> CursorResult<()>;

    /// Move to a blank insert buffer, remembering the current position.
    fn move_to_insert_row(&self) -> CursorResult<()>;

    /// Leave the insert buffer and return to the remembered position.
    fn move_to_current_row(&self) -> CursorResult<()>;

    /// Discard staged values (or the insert buffer).
    fn cancel_row_updates(&self) -> CursorResult<()>;

    /// Re-read the current row from its source, discarding staged values.
    fn refresh_row(&self) -> CursorResult<()>;

    /// Re-run the query. The cursor is left before the first row.
    fn execute(&self) -> CursorResult<()>;

    /// Change notifications.
    fn signals(&self) -> &CursorSignals;
}

/// Which cursor notification fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CursorEvent {
    /// The cursor moved to another row (or the insert row).
    CursorMoved,
    /// The current row was written, deleted, cancelled or refreshed.
    RowChanged,
    /// The whole result was replaced.
    RowSetChanged,
}

/// Signals emitted by a cursor.
#[derive(Default)]
pub struct CursorSignals {
    /// Emitted after the cursor moves.
    pub cursor_moved: Signal<()>,
    /// Emitted after the current row's stored data changes.
    pub row_changed: Signal<()>,
    /// Emitted after the query is re-executed.
    pub rowset_changed: Signal<()>,
}

impl CursorSignals {
    /// Create a new set of cursor signals.
    pub fn new() -> Self {
        Self::default()
    }

    /// Connect one slot to all three signals.
    pub fn connect_all<F>(&self, slot: F) -> CursorConnections
    where
        F: Fn(CursorEvent) + Send + Sync + 'static,
    {
        let slot = Arc::new(slot);
        let moved = Arc::clone(&slot);
        let changed = Arc::clone(&slot);
        CursorConnections {
            cursor_moved: self
                .cursor_moved
                .connect(move |_| moved(CursorEvent::CursorMoved)),
            row_changed: self
                .row_changed
                .connect(move |_| changed(CursorEvent::RowChanged)),
            rowset_changed: self
                .rowset_changed
                .connect(move |_| slot(CursorEvent::RowSetChanged)),
        }
    }

    /// Disconnect a set of connections made with [`connect_all`](Self::connect_all).
    pub fn disconnect_all(&self, connections: &CursorConnections) {
        self.cursor_moved.disconnect(connections.cursor_moved);
        self.row_changed.disconnect(connections.row_changed);
        self.rowset_changed.disconnect(connections.rowset_changed);
    }
}

/// Connection ids returned by [`CursorSignals::connect_all`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CursorConnections {
    cursor_moved: ConnectionId,
    row_changed: ConnectionId,
    rowset_changed: ConnectionId,
}
