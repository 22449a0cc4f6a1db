//! A selection control used to jump between rows.

use std::sync::{Arc, Weak};

use swingset_core::ConnectionId;
use swingset_core::logging::targets;

use super::{DataNavigator, NavOutcome};
use crate::binding::BoundSelection;
use crate::cursor::{ColumnScalar, ColumnType};
use crate::error::{BindingResult, CursorError};
use crate::model::OptionValue;

/// Keeps a [`BoundSelection`] and a [`DataNavigator`] pointing at the same row.
///
/// Returned by [`attach_navigation_selector`]. Dropping it disconnects the two.
#[must_use = "the selector detaches when dropped"]
pub struct NavigationSelector<M, O = String, O2 = String>
where
    M: ColumnScalar,
    O: OptionValue,
    O2: OptionValue,
{
    navigator: Weak<DataNavigator>,
    selection: Weak<BoundSelection<M, O, O2>>,
    column: String,
    activated: ConnectionId,
    refreshed: ConnectionId,
}

impl<M: ColumnScalar, O: OptionValue, O2: OptionValue> NavigationSelector<M, O, O2> {
    /// The column rows are matched on.
    pub fn column(&self) -> &str {
        &self.column
    }
}

impl<M: ColumnScalar, O: OptionValue, O2: OptionValue> Drop for NavigationSelector<M, O, O2> {
    fn drop(&mut self) {
        if let Some(selection) = self.selection.upgrade() {
            selection.signals().activated.disconnect(self.activated);
        }
        if let Some(navigator) = self.navigator.upgrade() {
            navigator.signals().state_refreshed.disconnect(self.refreshed);
        }
    }
}

/// Use `selection` to navigate the cursor of `navigator`.
///
/// Picking an item moves to the first row whose `column` holds the item's
/// mapping. While the move is delivered the selection is pending and shows
/// blank; the row's value appears once deferred events are processed. When
/// the move does not happen, the selection snaps back to the current row at
/// once. After each navigator refresh the selection shows the current row's
/// value without writing anything.
///
/// `selection` should not also be bound to a column of the same cursor.
pub fn attach_navigation_selector<M, O, O2>(
    navigator: &Arc<DataNavigator>,
    selection: &Arc<BoundSelection<M, O, O2>>,
    column: impl Into<String>,
) -> BindingResult<NavigationSelector<M, O, O2>>
where
    M: ColumnScalar,
    O: OptionValue,
    O2: OptionValue,
{
    let column = column.into();
    let column_type = navigator.context().cursor().column_type(&column)?;

    let activated = {
        let navigator = Arc::downgrade(navigator);
        let weak_selection = Arc::downgrade(selection);
        let column = column.clone();
        selection.signals().activated.connect(move |mapping: &Option<M>| {
            let (Some(navigator), Some(selection)) = (navigator.upgrade(), weak_selection.upgrade()) else {
                return;
            };
            let text = mapping.as_ref().map(|m| m.format_column(column_type));
            selection.set_selection_pending(true);
            let outcome = navigator.go_to_mapping(&column, text.as_deref());
            tracing::debug!(target: targets::NAVIGATOR, %column, ?outcome, "selector navigation");
            if outcome != NavOutcome::Done {
                show_current(&navigator, &selection, &column, column_type);
                return;
            }
            let navigator_weak = Arc::downgrade(&navigator);
            let selection_weak = Arc::downgrade(&selection);
            let column = column.clone();
            navigator.context().tasks().post(move || {
                if let (Some(navigator), Some(selection)) = (navigator_weak.upgrade(), selection_weak.upgrade()) {
                    show_current(&navigator, &selection, &column, column_type);
                }
            });
        })
    };

    let refreshed = {
        let navigator_weak = Arc::downgrade(navigator);
        let selection = Arc::downgrade(selection);
        let column = column.clone();
        navigator.signals().state_refreshed.connect(move |_| {
            if let (Some(navigator), Some(selection)) = (navigator_weak.upgrade(), selection.upgrade()) {
                show_current(&navigator, &selection, &column, column_type);
            }
        })
    };

    show_current(navigator, selection, &column, column_type);
    Ok(NavigationSelector {
        navigator: Arc::downgrade(navigator),
        selection: Arc::downgrade(selection),
        column,
        activated,
        refreshed,
    })
}

fn show_current<M, O, O2>(
    navigator: &DataNavigator,
    selection: &BoundSelection<M, O, O2>,
    column: &str,
    column_type: ColumnType,
) where
    M: ColumnScalar,
    O: OptionValue,
    O2: OptionValue,
{
    selection.set_selection_pending(false);
    match navigator.context().read_text(column) {
        Ok(text) => match M::read_column(text.as_deref(), column_type) {
            Ok(mapping) => selection.show_mapping(mapping),
            Err(err) => {
                tracing::warn!(target: targets::SELECTION, error = %err, "selector cannot show row");
                selection.clear_selection();
            }
        },
        Err(CursorError::NoCurrentRow) => selection.clear_selection(),
        Err(err) => {
            tracing::warn!(target: targets::SELECTION, error = %err, "selector cannot read row");
            selection.clear_selection();
        }
    }
}
