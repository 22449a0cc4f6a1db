//! Navigator row state.

use std::fmt;

/// High-level navigator state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NavState {
    /// On a stored row with no unsaved edits.
    Browsing,
    /// On the insert row.
    Inserting,
    /// On a stored row with unsaved edits.
    RowModified,
}

impl fmt::Display for NavState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Browsing => write!(f, "browsing"),
            Self::Inserting => write!(f, "inserting"),
            Self::RowModified => write!(f, "row modified"),
        }
    }
}

/// Snapshot of what a navigator knows about its cursor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NavigatorRowState {
    /// On the insert row.
    pub inserting: bool,
    /// The current row has unsaved edits.
    pub row_modified: bool,
    /// Some bound component holds invalid input.
    pub has_errors: bool,
    /// 1-based current row, 0 when not on a stored row.
    pub current_row: usize,
    /// Rows in the result.
    pub row_count: usize,
}

impl NavigatorRowState {
    /// The high-level state.
    pub fn nav_state(&self) -> NavState {
        if self.inserting {
            NavState::Inserting
        } else if self.row_modified {
            NavState::RowModified
        } else {
            NavState::Browsing
        }
    }
}
