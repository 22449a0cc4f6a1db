//! Host callbacks at navigator lifecycle points.

/// Which way a navigation command moved the cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NavigationDirection {
    /// To the first row.
    First,
    /// One row back.
    Previous,
    /// One row forward.
    Next,
    /// To the last row.
    Last,
    /// Directly to a row by number or by key.
    Direct,
}

/// Per-row customization points called by a [`DataNavigator`](super::DataNavigator).
///
/// Every method has a no-op default; implement only what the form needs.
/// `allow_*` returning `false` cancels the transition silently, so the hook
/// is responsible for telling the user why.
///
/// ```
/// use swingset::navigator::NavigationHook;
///
/// struct RequireReviewer;
///
/// impl NavigationHook for RequireReviewer {
///     fn allow_deletion(&self) -> bool {
///         false
///     }
/// }
/// ```
pub trait NavigationHook: Send + Sync {
    /// Whether the insert row may be written.
    fn allow_insertion(&self) -> bool {
        true
    }

    /// Whether the modified row may be written.
    fn allow_update(&self) -> bool {
        true
    }

    /// Whether the current row may be deleted.
    fn allow_deletion(&self) -> bool {
        true
    }

    /// Called after the insert row is shown and pending events have run.
    /// Typically fills in default values.
    fn perform_pre_insert_ops(&self) {}

    /// Called after a new row is written.
    fn perform_post_insert_ops(&self) {}

    /// Called before the current row is deleted.
    fn perform_pre_deletion_ops(&self) {}

    /// Called after a row is deleted. May re-run the query.
    fn perform_post_deletion_ops(&self) {}

    /// Called after a modified row is written.
    fn perform_post_update_ops(&self) {}

    /// Called after an insert or an edit is abandoned.
    fn perform_cancel_ops(&self) {}

    /// Called after the query is re-run.
    fn perform_refresh_ops(&self) {}

    /// Called after the cursor moved.
    fn perform_navigation_ops(&self, _direction: NavigationDirection) {}
}

/// A hook that accepts everything and does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHook;

impl NavigationHook for NoopHook {}
