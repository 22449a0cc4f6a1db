//! Connection between one controller and one cursor column.

use std::sync::Arc;

use crate::binding::CursorContext;
use crate::cursor::{ColumnType, CursorConnections, CursorEvent};
use crate::error::CursorResult;

/// A controller's subscription to a cursor column.
///
/// Holds the shared context, the column name and its declared type, and the
/// cursor signal connections. Dropping the binding disconnects them.
pub struct ColumnBinding {
    context: Arc<CursorContext>,
    column: String,
    column_type: ColumnType,
    connections: CursorConnections,
}

impl ColumnBinding {
    /// Subscribe `slot` to every cursor notification of `context`.
    ///
    /// Fails if `column` does not exist.
    pub fn new<F>(context: Arc<CursorContext>, column: impl Into<String>, slot: F) -> CursorResult<Self>
    where
        F: Fn(CursorEvent) + Send + Sync + 'static,
    {
        let column = column.into();
        let column_type = context.cursor().column_type(&column)?;
        let connections = context.cursor().signals().connect_all(slot);
        Ok(Self {
            context,
            column,
            column_type,
            connections,
        })
    }

    /// The shared context.
    pub fn context(&self) -> &Arc<CursorContext> {
        &self.context
    }

    /// The bound column name.
    pub fn column(&self) -> &str {
        &self.column
    }

    /// The bound column's declared type.
    pub fn column_type(&self) -> ColumnType {
        self.column_type
    }
}

impl Drop for ColumnBinding {
    fn drop(&mut self) {
        self.context
            .cursor()
            .signals()
            .disconnect_all(&self.connections);
    }
}
