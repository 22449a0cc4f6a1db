//! An in-memory cursor with JDBC-like semantics.

use std::collections::{HashMap, HashSet};

use parking_lot::RwLock;
use swingset_core::logging::targets;

use super::{ColumnType, CursorSignals, TabularCursor};
use crate::error::{CursorError, CursorResult};

/// Declaration of one column of a [`MemoryCursor`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSpec {
    /// Column name, matched case-insensitively.
    pub name: String,
    /// Declared SQL type.
    pub column_type: ColumnType,
    /// Whether the column accepts NULL.
    pub nullable: bool,
}

impl ColumnSpec {
    /// A nullable column.
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            nullable: true,
        }
    }

    /// Mark the column `NOT NULL`.
    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }
}

/// Operation classes that can be made to fail with [`MemoryCursor::fail_next`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CursorOp {
    /// `column_text`.
    Read,
    /// `set_column_text`.
    Write,
    /// `first`, `next`, `previous`, `last` and `absolute`.
    Navigate,
    /// `insert_row`.
    Insert,
    /// `update_row`.
    Update,
    /// `delete_row`.
    Delete,
    /// `move_to_insert_row`.
    MoveToInsertRow,
    /// `move_to_current_row`.
    MoveToCurrentRow,
    /// `cancel_row_updates`.
    CancelRowUpdates,
    /// `refresh_row`.
    RefreshRow,
    /// `execute`.
    Execute,
}

type Row = Vec<Option<String>>;

struct MemoryData {
    columns: Vec<ColumnSpec>,
    rows: Vec<Row>,
    /// 0 is before the first row, `rows.len() + 1` is after the last.
    position: usize,
    pending: HashMap<usize, Option<String>>,
    insert_buffer: Option<Row>,
    saved_position: usize,
    failures: HashSet<CursorOp>,
}

impl MemoryData {
    fn column_index(&self, column: &str) -> CursorResult<usize> {
        self.columns
            .iter()
            .position(|c| c.name.eq_ignore_ascii_case(column))
            .ok_or_else(|| CursorError::NoSuchColumn(column.to_string()))
    }

    fn on_row(&self) -> bool {
        self.insert_buffer.is_none() && (1..=self.rows.len()).contains(&self.position)
    }

    fn take_failure(&mut self, op: CursorOp) -> CursorResult<()> {
        if self.failures.remove(&op) {
            tracing::debug!(target: targets::CURSOR, ?op, "injected failure");
            return Err(CursorError::Backend(format!("injected {op:?} failure")));
        }
        Ok(())
    }

    fn check_not_null(&self, row: &Row) -> CursorResult<()> {
        for (spec, value) in self.columns.iter().zip(row) {
            if !spec.nullable && value.is_none() {
                return Err(CursorError::Backend(format!(
                    "column '{}' cannot be null",
                    spec.name
                )));
            }
        }
        Ok(())
    }

    fn navigate(&mut self, target: usize) -> bool {
        self.insert_buffer = None;
        self.pending.clear();
        self.position = target.min(self.rows.len() + 1);
        self.on_row()
    }
}

/// A [`TabularCursor`] over rows held in memory.
///
/// Values are stored as column text. Edits on the current row are staged
/// until [`update_row`](TabularCursor::update_row); moving away discards
/// them. The insert row is a separate buffer.
///
/// # Example
///
/// ```
/// use swingset::cursor::{ColumnSpec, ColumnType, MemoryCursor, TabularCursor};
///
/// let cursor = MemoryCursor::new(vec![
///     ColumnSpec::new("id", ColumnType::Integer).not_null(),
///     ColumnSpec::new("name", ColumnType::VarChar),
/// ])
/// .with_row([Some("1"), Some("Red")])
/// .with_row([Some("2"), None]);
///
/// assert!(cursor.first().unwrap());
/// assert_eq!(cursor.column_text("name").unwrap().as_deref(), Some("Red"));
/// assert_eq!(cursor.row_count().unwrap(), 2);
/// ```
pub struct MemoryCursor {
    data: RwLock<MemoryData>,
    signals: CursorSignals,
}

static_assertions::assert_impl_all!(MemoryCursor: Send, Sync);

impl MemoryCursor {
    /// Create an empty cursor with the given columns.
    pub fn new(columns: Vec<ColumnSpec>) -> Self {
        Self {
            data: RwLock::new(MemoryData {
                columns,
                rows: Vec::new(),
                position: 0,
                pending: HashMap::new(),
                insert_buffer: None,
                saved_position: 0,
                failures: HashSet::new(),
            }),
            signals: CursorSignals::new(),
        }
    }

    /// Append a row, builder style. Missing trailing values are NULL.
    pub fn with_row<I, S>(self, values: I) -> Self
    where
        I: IntoIterator<Item = Option<S>>,
        S: Into<String>,
    {
        self.push_row(values);
        self
    }

    /// Append a row without emitting any signal.
    pub fn push_row<I, S>(&self, values: I)
    where
        I: IntoIterator<Item = Option<S>>,
        S: Into<String>,
    {
        let mut data = self.data.write();
        let width = data.columns.len();
        let mut row: Row = values
            .into_iter()
            .map(|value| value.map(Into::into))
            .take(width)
            .collect();
        row.resize(width, None);
        data.rows.push(row);
    }

    /// Make the next operation of class `op` fail with a backend error.
    pub fn fail_next(&self, op: CursorOp) {
        self.data.write().failures.insert(op);
    }

    /// Stored values of the 1-based `row`, ignoring staged edits.
    pub fn row_values(&self, row: usize) -> Option<Vec<Option<String>>> {
        let data = self.data.read();
        row.checked_sub(1).and_then(|i| data.rows.get(i).cloned())
    }

    /// Whether the cursor is on the insert row.
    pub fn is_on_insert_row(&self) -> bool {
        self.data.read().insert_buffer.is_some()
    }

    /// Number of staged edits on the current row.
    pub fn pending_count(&self) -> usize {
        self.data.read().pending.len()
    }

    fn move_with<F>(&self, f: F) -> CursorResult<bool>
    where
        F: FnOnce(&MemoryData) -> usize,
    {
        let valid = {
            let mut data = self.data.write();
            data.take_failure(CursorOp::Navigate)?;
            let target = f(&data);
            data.navigate(target)
        };
        self.signals.cursor_moved.emit(());
        Ok(valid)
    }
}

impl TabularCursor for MemoryCursor {
    fn column_text(&self, column: &str) -> CursorResult<Option<String>> {
        let mut data = self.data.write();
        data.take_failure(CursorOp::Read)?;
        let index = data.column_index(column)?;
        if let Some(buffer) = &data.insert_buffer {
            return Ok(buffer[index].clone());
        }
        if !data.on_row() {
            return Err(CursorError::NoCurrentRow);
        }
        if let Some(staged) = data.pending.get(&index) {
            return Ok(staged.clone());
        }
        Ok(data.rows[data.position - 1][index].clone())
    }

    fn set_column_text(&self, column: &str, value: Option<&str>) -> CursorResult<()> {
        let mut data = self.data.write();
        data.take_failure(CursorOp::Write)?;
        let index = data.column_index(column)?;
        let value = value.map(str::to_string);
        if let Some(buffer) = data.insert_buffer.as_mut() {
            buffer[index] = value;
            return Ok(());
        }
        if !data.on_row() {
            return Err(CursorError::NoCurrentRow);
        }
        data.pending.insert(index, value);
        Ok(())
    }

    fn column_type(&self, column: &str) -> CursorResult<ColumnType> {
        let data = self.data.read();
        let index = data.column_index(column)?;
        Ok(data.columns[index].column_type)
    }

    fn column_nullable(&self, column: &str) -> CursorResult<bool> {
        let data = self.data.read();
        let index = data.column_index(column)?;
        Ok(data.columns[index].nullable)
    }

    fn current_row(&self) -> CursorResult<usize> {
        let data = self.data.read();
        Ok(if data.on_row() { data.position } else { 0 })
    }

    fn row_count(&self) -> CursorResult<usize> {
        Ok(self.data.read().rows.len())
    }

    fn first(&self) -> CursorResult<bool> {
        self.move_with(|_| 1)
    }

    fn next(&self) -> CursorResult<bool> {
        self.move_with(|data| {
            if data.insert_buffer.is_some() {
                data.saved_position + 1
            } else {
                data.position + 1
            }
        })
    }

    fn previous(&self) -> CursorResult<bool> {
        self.move_with(|data| {
            let from = if data.insert_buffer.is_some() {
                data.saved_position
            } else {
                data.position
            };
            from.saturating_sub(1)
        })
    }

    fn last(&self) -> CursorResult<bool> {
        self.move_with(|data| data.rows.len())
    }

    fn absolute(&self, row: usize) -> CursorResult<bool> {
        self.move_with(|_| row)
    }

    fn insert_row(&self) -> CursorResult<()> {
        {
            let mut data = self.data.write();
            data.take_failure(CursorOp::Insert)?;
            let Some(buffer) = data.insert_buffer.clone() else {
                return Err(CursorError::NotOnInsertRow);
            };
            data.check_not_null(&buffer)?;
            data.rows.push(buffer);
            let width = data.columns.len();
            data.insert_buffer = Some(vec![None; width]);
            tracing::debug!(target: targets::CURSOR, rows = data.rows.len(), "row inserted");
        }
        self.signals.row_changed.emit(());
        Ok(())
    }

    fn update_row(&self) -> CursorResult<()> {
        {
            let mut data = self.data.write();
            data.take_failure(CursorOp::Update)?;
            if data.insert_buffer.is_some() {
                return Err(CursorError::Backend(
                    "cannot update the insert row".to_string(),
                ));
            }
            if !data.on_row() {
                return Err(CursorError::NoCurrentRow);
            }
            let mut row = data.rows[data.position - 1].clone();
            for (&index, value) in &data.pending {
                row[index] = value.clone();
            }
            data.check_not_null(&row)?;
            let position = data.position;
            data.rows[position - 1] = row;
            data.pending.clear();
            tracing::debug!(target: targets::CURSOR, row = position, "row updated");
        }
        self.signals.row_changed.emit(());
        Ok(())
    }

    fn delete_row(&self) -> CursorResult<()> {
        {
            let mut data = self.data.write();
            data.take_failure(CursorOp::Delete)?;
            if !data.on_row() {
                return Err(CursorError::NoCurrentRow);
            }
            let position = data.position;
            data.rows.remove(position - 1);
            data.pending.clear();
            // The cursor now rests on the row that followed, or the new last row.
            data.position = position.min(data.rows.len());
            tracing::debug!(target: targets::CURSOR, row = position, "row deleted");
        }
        self.signals.row_changed.emit(());
        Ok(())
    }

    fn move_to_insert_row(&self) -> CursorResult<()> {
        {
            let mut data = self.data.write();
            data.take_failure(CursorOp::MoveToInsertRow)?;
            if data.insert_buffer.is_none() {
                data.saved_position = data.position;
            }
            let width = data.columns.len();
            data.insert_buffer = Some(vec![None; width]);
            data.pending.clear();
        }
        self.signals.cursor_moved.emit(());
        Ok(())
    }

    fn move_to_current_row(&self) -> CursorResult<()> {
        let moved = {
            let mut data = self.data.write();
            data.take_failure(CursorOp::MoveToCurrentRow)?;
            if data.insert_buffer.take().is_some() {
                data.position = data.saved_position.min(data.rows.len() + 1);
                true
            } else {
                false
            }
        };
        if moved {
            self.signals.cursor_moved.emit(());
        }
        Ok(())
    }

    fn cancel_row_updates(&self) -> CursorResult<()> {
        {
            let mut data = self.data.write();
            data.take_failure(CursorOp::CancelRowUpdates)?;
            let width = data.columns.len();
            if let Some(buffer) = data.insert_buffer.as_mut() {
                *buffer = vec![None; width];
            } else {
                data.pending.clear();
            }
        }
        self.signals.row_changed.emit(());
        Ok(())
    }

    fn refresh_row(&self) -> CursorResult<()> {
        {
            let mut data = self.data.write();
            data.take_failure(CursorOp::RefreshRow)?;
            if !data.on_row() {
                return Err(CursorError::NoCurrentRow);
            }
            data.pending.clear();
        }
        self.signals.row_changed.emit(());
        Ok(())
    }

    fn execute(&self) -> CursorResult<()> {
        {
            let mut data = self.data.write();
            data.take_failure(CursorOp::Execute)?;
            data.navigate(0);
            tracing::debug!(target: targets::CURSOR, rows = data.rows.len(), "query executed");
        }
        self.signals.rowset_changed.emit(());
        Ok(())
    }

    fn signals(&self) -> &CursorSignals {
        &self.signals
    }
}
