//! The bound selection controller behind data-aware combo boxes.
//!
//! A [`BoundSelection`] owns an [`OptionMappingStore`] and tracks which
//! item is selected. Any widget adapter (combo box, list, radio group)
//! delegates to it:
//!
//! - user picks go through [`select_item`](BoundSelection::select_item) or
//!   [`commit_edit_text`](BoundSelection::commit_edit_text) and are written to
//!   the bound column
//! - cursor movement re-reads the column and selects the matching item
//!   without writing anything back
//!
//! Writes happen in a slot connected to
//! [`activated`](SelectionSignals::activated). Housekeeping changes (null
//! item adjustment, cursor reads) run with that signal blocked, so they are
//! never mistaken for user edits.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use swingset::binding::{BoundSelection, CursorContext};
//! use swingset::cursor::{ColumnSpec, ColumnType, MemoryCursor, TabularCursor};
//!
//! let cursor = Arc::new(
//!     MemoryCursor::new(vec![ColumnSpec::new("color_id", ColumnType::Integer)])
//!         .with_row([Some("2")]),
//! );
//! cursor.first().unwrap();
//!
//! let selection: Arc<BoundSelection<i32>> = Arc::new(BoundSelection::new());
//! selection
//!     .set_options(vec![1, 2, 3], vec!["Red".into(), "Green".into(), "Blue".into()])
//!     .unwrap();
//! selection.bind(CursorContext::new(cursor), "color_id").unwrap();
//!
//! assert_eq!(selection.selected_mapping(), Some(2));
//! assert_eq!(selection.selected_option().as_deref(), Some("Green"));
//! ```

use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use parking_lot::Mutex;
use swingset_core::logging::targets;
use swingset_core::{ConnectionId, Signal, SignalBlocker};

use crate::binding::reset::ResetField;
use crate::binding::{ColumnBinding, CursorContext};
use crate::config::SelectionConfig;
use crate::cursor::{ColumnScalar, ColumnType};
use crate::error::{BindingError, BindingResult, CursorError};
use crate::model::{
    FilterMode, FilterOverlay, ItemId, ListItem, NullItemAdjustment, NullItemPolicy,
    OptionMappingStore, OptionValue, Remodel,
};

/// What a selection control currently shows.
#[derive(Debug, Clone, PartialEq)]
pub enum Selection<O> {
    /// Nothing is selected.
    None,
    /// A store item, possibly the null item.
    Item(ItemId),
    /// Typed text that matches no option.
    FreeText(O),
}

/// Result of [`BoundSelection::commit_edit_text`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOutcome {
    /// The text matched an item, which is now selected.
    Selected(ItemId),
    /// The text was kept as a free-text selection.
    FreeText,
    /// The text was rejected and the previous selection kept.
    Reverted,
}

/// Signals emitted by a [`BoundSelection`].
pub struct SelectionSignals<M> {
    /// User-originated selection, carrying the mapping to store.
    ///
    /// Blocked during housekeeping. A bound controller writes to its column
    /// from a slot on this signal.
    pub activated: Signal<Option<M>>,
    /// Any selection change, programmatic or not.
    pub current_item_changed: Signal<Option<ItemId>>,
}

impl<M: Clone + Send + 'static> Default for SelectionSignals<M> {
    fn default() -> Self {
        Self {
            activated: Signal::new(),
            current_item_changed: Signal::new(),
        }
    }
}

struct SelectionState<O> {
    current: Selection<O>,
    policy: NullItemPolicy,
    filter: FilterOverlay,
    editable: bool,
    null_from_metadata: bool,
}

struct SelectionBinding {
    column: ColumnBinding,
    activated: ConnectionId,
}

/// A selection controller bound to a cursor column.
///
/// Selection is tracked by item identity. The null item is present exactly
/// when nulls are allowed or a selection is pending, and is re-derived after
/// each change to either flag and after every remodel.
pub struct BoundSelection<M, O = String, O2 = String>
where
    M: ColumnScalar,
    O: OptionValue,
    O2: OptionValue,
{
    store: OptionMappingStore<M, O, O2>,
    state: Mutex<SelectionState<O>>,
    binding: Mutex<Option<SelectionBinding>>,
    signals: SelectionSignals<M>,
}

static_assertions::assert_impl_all!(BoundSelection<i32>: Send, Sync);

impl<M: ColumnScalar, O: OptionValue, O2: OptionValue> Default for BoundSelection<M, O, O2> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: ColumnScalar, O: OptionValue, O2: OptionValue> BoundSelection<M, O, O2> {
    /// Create an unbound controller with an empty list.
    pub fn new() -> Self {
        Self {
            store: OptionMappingStore::new(),
            state: Mutex::new(SelectionState {
                current: Selection::None,
                policy: NullItemPolicy::default(),
                filter: FilterOverlay::default(),
                editable: false,
                null_from_metadata: false,
            }),
            binding: Mutex::new(None),
            signals: SelectionSignals::default(),
        }
    }

    /// Create a controller configured from `config`.
    pub fn with_config(config: &SelectionConfig) -> Self {
        let selection = Self::new();
        selection.apply_config(config);
        selection
    }

    /// The option list.
    pub fn store(&self) -> &OptionMappingStore<M, O, O2> {
        &self.store
    }

    /// The controller's signals.
    pub fn signals(&self) -> &SelectionSignals<M> {
        &self.signals
    }

    // =========================================================================
    // Reading the selection
    // =========================================================================

    /// Whether the list holds any item besides the null item.
    pub fn has_items(&self) -> bool {
        self.store.real_len() > 0
    }

    /// Whether a real item (not the null item, not free text) is selected.
    pub fn has_selection(&self) -> bool {
        self.selected_item().is_some_and(|item| !item.is_null())
    }

    /// The current selection.
    pub fn selection(&self) -> Selection<O> {
        self.state.lock().current.clone()
    }

    /// Identity of the selected item, the null item included.
    pub fn selected_id(&self) -> Option<ItemId> {
        match self.state.lock().current {
            Selection::Item(id) => Some(id),
            _ => None,
        }
    }

    /// The selected item, the null item included.
    pub fn selected_item(&self) -> Option<ListItem<M, O, O2>> {
        self.selected_id().and_then(|id| self.store.item(id))
    }

    /// Store index of the selected item.
    pub fn selected_index(&self) -> Option<usize> {
        self.selected_id().and_then(|id| self.store.index_of_id(id))
    }

    /// Mapping of the selected item; `None` for none, the null item or free text.
    pub fn selected_mapping(&self) -> Option<M> {
        self.selected_item()
            .and_then(|item| item.mapping().cloned())
    }

    /// Option of the selected item, or the free text.
    pub fn selected_option(&self) -> Option<O> {
        match self.selection() {
            Selection::None => None,
            Selection::Item(id) => self.store.option_of(id),
            Selection::FreeText(text) => Some(text),
        }
    }

    /// Whether null is offered.
    pub fn allow_null(&self) -> bool {
        self.state.lock().policy.allow_null()
    }

    /// Whether the control is blank while awaiting a fresh value.
    pub fn is_selection_pending(&self) -> bool {
        self.state.lock().policy.selection_pending()
    }

    /// Whether typed text that matches no option is accepted.
    pub fn is_editable(&self) -> bool {
        self.state.lock().editable
    }

    /// Accept or reject typed text that matches no option.
    pub fn set_editable(&self, editable: bool) {
        self.state.lock().editable = editable;
    }

    // =========================================================================
    // Selecting
    // =========================================================================

    /// Select an item as the user would. Returns `false` if it is not listed.
    ///
    /// Clears the filter and writes the item's mapping to the bound column.
    pub fn select_item(&self, id: ItemId) -> bool {
        if self.store.item(id).is_none() {
            tracing::warn!(target: targets::SELECTION, id = id.as_u64(), "item is not in the list");
            return false;
        }
        self.state.lock().filter.clear();
        self.change_selection(Selection::Item(id));
        true
    }

    /// Select the first item with `mapping`.
    ///
    /// A miss selects the null item if present, otherwise nothing, and logs a
    /// warning. Passing the mapping [`selected_mapping`](Self::selected_mapping)
    /// already reports does nothing, even for free text or no selection.
    pub fn set_selected_mapping(&self, mapping: Option<M>) {
        if self.selected_mapping() == mapping {
            return;
        }
        self.select_mapping(mapping);
    }

    /// Look `mapping` up and select it, keeping the current item if it
    /// already holds `mapping`.
    fn select_mapping(&self, mapping: Option<M>) {
        if let Some(current) = self.selected_item()
            && current.mapping() == mapping.as_ref()
        {
            return;
        }
        let target = match &mapping {
            Some(key) => match self.store.find_mapping(key) {
                Some(item) => Selection::Item(item.id()),
                None => {
                    tracing::warn!(
                        target: targets::SELECTION,
                        mapping = ?key,
                        "mapping not found in option list"
                    );
                    self.null_or_none()
                }
            },
            None => self.null_or_none(),
        };
        self.change_selection(target);
    }

    /// Select the first item whose option equals `option`.
    ///
    /// A miss keeps `option` as a free-text selection.
    pub fn set_selected_option(&self, option: O) {
        let target = match self.store.find_option(&option) {
            Some(item) => Selection::Item(item.id()),
            None => {
                tracing::debug!(target: targets::SELECTION, %option, "option not listed; keeping free text");
                Selection::FreeText(option)
            }
        };
        self.change_selection(target);
    }

    /// Select `mapping` without writing to the cursor.
    ///
    /// Unlike [`set_selected_mapping`](Self::set_selected_mapping) this
    /// replaces free text, so the control always shows the stored value.
    pub fn show_mapping(&self, mapping: Option<M>) {
        self.quietly(|| self.select_mapping(mapping));
    }

    /// Clear the selection without writing to the cursor.
    pub fn clear_selection(&self) {
        self.quietly(|| self.change_selection(self.null_or_none()));
    }

    // =========================================================================
    // Null item
    // =========================================================================

    /// Offer or withdraw the null item.
    pub fn set_allow_null(&self, allow_null: bool) {
        let changed = self.state.lock().policy.set_allow_null(allow_null);
        if changed {
            self.adjust_null_item();
        }
    }

    /// Show a blank control until the next value arrives.
    ///
    /// While pending, the selection is the null item.
    pub fn set_selection_pending(&self, pending: bool) {
        let changed = self.state.lock().policy.set_selection_pending(pending);
        if !changed {
            return;
        }
        self.adjust_null_item();
        if pending {
            self.quietly(|| self.change_selection(self.null_or_none()));
        }
    }

    fn null_or_none(&self) -> Selection<O> {
        self.store
            .null_item()
            .map_or(Selection::None, |null| Selection::Item(null.id()))
    }

    fn adjust_null_item(&self) {
        let plan = {
            let state = self.state.lock();
            state.policy.plan(self.store.has_null_item())
        };
        match plan {
            NullItemAdjustment::None => {}
            NullItemAdjustment::Insert => {
                let id = match self.store.remodel() {
                    Ok(mut session) => session.insert_null(),
                    Err(err) => {
                        tracing::debug!(target: targets::SELECTION, error = %err, "null item insertion skipped");
                        return;
                    }
                };
                if self.selection() == Selection::None {
                    self.quietly(|| self.change_selection(Selection::Item(id)));
                }
            }
            NullItemAdjustment::Remove => {
                let null_selected = self.selected_item().is_some_and(|item| item.is_null());
                if null_selected {
                    self.quietly(|| self.change_selection(Selection::None));
                }
                match self.store.remodel() {
                    Ok(mut session) => {
                        session.remove_null();
                    }
                    Err(err) => {
                        tracing::debug!(target: targets::SELECTION, error = %err, "null item removal skipped");
                    }
                }
            }
        }
    }

    // =========================================================================
    // Bulk changes
    // =========================================================================

    /// Open a remodel session on the option list.
    ///
    /// When the session ends the null item is re-derived, a selection whose
    /// item was removed is cleared, and a bound controller re-reads its
    /// column.
    pub fn remodel(&self) -> BindingResult<SelectionRemodel<'_, M, O, O2>> {
        let session = self.store.remodel()?;
        Ok(SelectionRemodel {
            session,
            _finish: RemodelFinish { owner: self },
        })
    }

    /// Replace the list with `mappings` paired with `options`.
    pub fn set_options(&self, mappings: Vec<M>, options: Vec<O>) -> BindingResult<()> {
        if mappings.len() != options.len() {
            return Err(BindingError::MismatchedLengths {
                options: options.len(),
                mappings: mappings.len(),
            });
        }
        let mut session = self.remodel()?;
        session.clear();
        session.add_all(mappings.into_iter().zip(options));
        Ok(())
    }

    /// Replace the list with `mappings` paired with two options each.
    pub fn set_options_with_secondary(
        &self,
        mappings: Vec<M>,
        options: Vec<O>,
        options2: Vec<O2>,
    ) -> BindingResult<()> {
        for len in [options.len(), options2.len()] {
            if len != mappings.len() {
                return Err(BindingError::MismatchedLengths {
                    options: len,
                    mappings: mappings.len(),
                });
            }
        }
        let mut session = self.remodel()?;
        session.clear();
        for ((mapping, option), option2) in mappings.into_iter().zip(options).zip(options2) {
            session.add_with_option2(mapping, option, option2);
        }
        Ok(())
    }

    fn after_remodel(&self) {
        if let Selection::Item(id) = self.selection()
            && self.store.item(id).is_none()
        {
            self.quietly(|| self.change_selection(self.null_or_none()));
        }
        self.adjust_null_item();
        if self.is_bound() {
            self.update_from_cursor();
        }
    }

    // =========================================================================
    // Filtering
    // =========================================================================

    /// Narrow the visible items to those matching `text`.
    pub fn set_filter_text(&self, text: impl Into<String>) {
        self.state.lock().filter.set_text(text);
    }

    /// Show every item again.
    pub fn clear_filter(&self) {
        self.state.lock().filter.clear();
    }

    /// The current filter text.
    pub fn filter_text(&self) -> String {
        self.state.lock().filter.text().to_string()
    }

    /// Change how filter text matches.
    pub fn set_filter_mode(&self, mode: FilterMode) {
        self.state.lock().filter.set_mode(mode);
    }

    /// Change whether filtering ignores case.
    pub fn set_case_insensitive(&self, case_insensitive: bool) {
        self.state.lock().filter.set_case_insensitive(case_insensitive);
    }

    /// Items passing the filter, in display order.
    pub fn visible_items(&self) -> Vec<ListItem<M, O, O2>> {
        let items = self.store.items();
        let separator = self.store.separator();
        let visible = self.state.lock().filter.visible(&items, &separator);
        items
            .into_iter()
            .filter(|item| visible.contains(&item.id()))
            .collect()
    }

    // =========================================================================
    // Configuration
    // =========================================================================

    /// Apply selection settings.
    pub fn apply_config(&self, config: &SelectionConfig) {
        self.store.set_separator(config.separator.clone());
        {
            let mut state = self.state.lock();
            state.editable = config.editable;
            state.null_from_metadata = config.null_from_metadata;
            state.filter.set_mode(config.filter_mode);
            state.filter.set_case_insensitive(config.case_insensitive);
        }
        self.set_allow_null(config.allow_null);
    }

    // =========================================================================
    // Cursor binding
    // =========================================================================

    /// Bind to `column` of the cursor in `context`.
    ///
    /// Replaces any previous binding and selects the column's current value.
    pub fn bind(self: &Arc<Self>, context: Arc<CursorContext>, column: impl Into<String>) -> BindingResult<()> {
        self.unbind();

        let weak = Arc::downgrade(self);
        let column = ColumnBinding::new(context, column, move |_| {
            if let Some(selection) = weak.upgrade() {
                selection.update_from_cursor();
            }
        })?;

        let null_from_metadata = self.state.lock().null_from_metadata;
        if null_from_metadata {
            let nullable = column.context().cursor().column_nullable(column.column())?;
            self.set_allow_null(nullable);
        }

        let weak = Arc::downgrade(self);
        let activated = self.signals.activated.connect(move |mapping| {
            if let Some(selection) = weak.upgrade() {
                selection.write_mapping(mapping.as_ref());
            }
        });

        tracing::debug!(target: targets::SELECTION, column = column.column(), "selection bound");
        *self.binding.lock() = Some(SelectionBinding { column, activated });
        self.update_from_cursor();
        Ok(())
    }

    /// Drop the cursor binding.
    pub fn unbind(&self) {
        let previous = self.binding.lock().take();
        if let Some(binding) = previous {
            self.signals.activated.disconnect(binding.activated);
        }
    }

    /// Whether the controller is bound to a column.
    pub fn is_bound(&self) -> bool {
        self.binding.lock().is_some()
    }

    /// The bound column name.
    pub fn bound_column(&self) -> Option<String> {
        self.binding
            .lock()
            .as_ref()
            .map(|binding| binding.column.column().to_string())
    }

    /// Re-read the bound column and select the matching item.
    ///
    /// Nothing is written back. Text that cannot be converted to the mapping
    /// type is reported to the user and leaves nothing selected.
    pub fn update_from_cursor(&self) {
        let Some((context, column, column_type)) = self.binding_parts() else {
            return;
        };
        let text = match context.read_text(&column) {
            Ok(text) => text,
            Err(CursorError::NoCurrentRow) => {
                tracing::trace!(target: targets::SELECTION, %column, "cursor is not on a row");
                self.set_selection_pending(false);
                self.clear_selection();
                return;
            }
            Err(err) => {
                context.report("Read failed", &err);
                self.quietly(|| self.change_selection(Selection::None));
                return;
            }
        };
        self.set_selection_pending(false);
        match M::read_column(text.as_deref(), column_type) {
            Ok(mapping) => self.show_mapping(mapping),
            Err(err) => {
                context.report("Conversion failed", &err);
                self.quietly(|| self.change_selection(Selection::None));
            }
        }
    }

    fn binding_parts(&self) -> Option<(Arc<CursorContext>, String, ColumnType)> {
        self.binding.lock().as_ref().map(|binding| {
            (
                Arc::clone(binding.column.context()),
                binding.column.column().to_string(),
                binding.column.column_type(),
            )
        })
    }

    fn write_mapping(&self, mapping: Option<&M>) {
        let Some((context, column, column_type)) = self.binding_parts() else {
            return;
        };
        let text = mapping.map(|m| m.format_column(column_type));
        context.write_column(&column, text.as_deref());
    }

    // =========================================================================
    // Internals
    // =========================================================================

    /// Run `f` with user-selection propagation suppressed.
    fn quietly<R>(&self, f: impl FnOnce() -> R) -> R {
        let _blocker = SignalBlocker::new(&self.signals.activated);
        f()
    }

    /// Switch to `next`, emitting signals if it differs from the current selection.
    ///
    /// Free text is never propagated to the cursor.
    fn change_selection(&self, next: Selection<O>) -> bool {
        {
            let mut state = self.state.lock();
            if state.current == next {
                return false;
            }
            state.current = next.clone();
        }
        let id = match next {
            Selection::Item(id) => Some(id),
            _ => None,
        };
        tracing::trace!(target: targets::SELECTION, id = id.map(ItemId::as_u64), "selection changed");
        self.signals.current_item_changed.emit(id);
        if let Some(id) = id {
            self.signals.activated.emit(self.store.mapping_of(id));
        }
        true
    }
}

impl<M, O, O2> BoundSelection<M, O, O2>
where
    M: ColumnScalar,
    O: OptionValue + From<String>,
    O2: OptionValue,
{
    /// Resolve text the user typed into an editable or filtering control.
    ///
    /// An exact option (or display text) match selects that item as a user
    /// action. Empty text selects the null item when present. Any other text
    /// is kept as free text by an editable control and rejected otherwise.
    /// The filter is cleared in every case.
    pub fn commit_edit_text(&self, text: &str) -> EditOutcome {
        let (filter, editable) = {
            let mut state = self.state.lock();
            let filter = state.filter.clone();
            state.filter.clear();
            (filter, state.editable)
        };
        let separator = self.store.separator();
        let hit = self.store.items().into_iter().find(|item| {
            !item.is_null()
                && (filter.same_text(&item.option().to_string(), text)
                    || filter.same_text(&item.display_text(&separator), text))
        });

        if let Some(item) = hit {
            self.change_selection(Selection::Item(item.id()));
            return EditOutcome::Selected(item.id());
        }
        if text.is_empty()
            && let Some(null) = self.store.null_item()
        {
            self.change_selection(Selection::Item(null.id()));
            return EditOutcome::Selected(null.id());
        }
        if editable && !text.is_empty() {
            self.change_selection(Selection::FreeText(O::from(text.to_string())));
            return EditOutcome::FreeText;
        }
        tracing::debug!(target: targets::SELECTION, text, "typed text rejected; keeping selection");
        EditOutcome::Reverted
    }
}

impl<M: ColumnScalar, O: OptionValue, O2: OptionValue> ResetField for BoundSelection<M, O, O2> {
    fn reset_field(&self) {
        self.clear_filter();
        self.clear_selection();
    }
}

/// An open remodel session on a [`BoundSelection`]'s list.
///
/// Dereferences to [`Remodel`]. When dropped, the store session closes first
/// and then the controller re-derives its null item and selection.
#[must_use = "changes are published when the session is dropped"]
pub struct SelectionRemodel<'a, M, O, O2>
where
    M: ColumnScalar,
    O: OptionValue,
    O2: OptionValue,
{
    session: Remodel<'a, M, O, O2>,
    _finish: RemodelFinish<'a, M, O, O2>,
}

struct RemodelFinish<'a, M, O, O2>
where
    M: ColumnScalar,
    O: OptionValue,
    O2: OptionValue,
{
    owner: &'a BoundSelection<M, O, O2>,
}

impl<M: ColumnScalar, O: OptionValue, O2: OptionValue> Drop for RemodelFinish<'_, M, O, O2> {
    fn drop(&mut self) {
        self.owner.after_remodel();
    }
}

impl<'a, M: ColumnScalar, O: OptionValue, O2: OptionValue> Deref for SelectionRemodel<'a, M, O, O2> {
    type Target = Remodel<'a, M, O, O2>;

    fn deref(&self) -> &Self::Target {
        &self.session
    }
}

impl<M: ColumnScalar, O: OptionValue, O2: OptionValue> DerefMut for SelectionRemodel<'_, M, O, O2> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.session
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn setup() -> BoundSelection<i32> {
        let selection = BoundSelection::new();
        selection
            .set_options(vec![1, 2, 3], vec!["Red".into(), "Green".into(), "Blue".into()])
            .unwrap();
        selection
    }

    fn count_activations(selection: &BoundSelection<i32>) -> Arc<AtomicUsize> {
        let count = Arc::new(AtomicUsize::new(0));
        let count_clone = count.clone();
        selection.signals().activated.connect(move |_| {
            count_clone.fetch_add(1, Ordering::SeqCst);
        });
        count
    }

    #[test]
    fn test_allow_null_adds_and_removes_null_item() {
        let selection = setup();
        assert_eq!(selection.store().len(), 3);
        assert_eq!(selection.selection(), Selection::None);

        selection.set_allow_null(true);
        assert_eq!(selection.store().len(), 4);
        assert!(selection.store().item_at(0).unwrap().is_null());
        assert_eq!(selection.selected_index(), Some(0));
        assert!(!selection.has_selection());

        selection.set_allow_null(false);
        assert_eq!(selection.store().len(), 3);
        assert_eq!(selection.selection(), Selection::None);
    }

    #[test]
    fn test_null_adjustment_does_not_activate() {
        let selection = setup();
        let activations = count_activations(&selection);
        selection.set_allow_null(true);
        selection.set_allow_null(false);
        selection.set_selection_pending(true);
        selection.set_selection_pending(false);
        assert_eq!(activations.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_set_selected_mapping_hit_and_miss() {
        let selection = setup();
        selection.set_selected_mapping(Some(2));
        assert_eq!(selection.selected_mapping(), Some(2));
        assert!(selection.has_selection());

        selection.set_selected_mapping(Some(5));
        assert_eq!(selection.selection(), Selection::None);

        selection.set_allow_null(true);
        selection.set_selected_mapping(Some(3));
        selection.set_selected_mapping(Some(5));
        assert_eq!(selection.selected_index(), Some(0));
        assert_eq!(selection.selected_mapping(), None);
    }

    #[test]
    fn test_set_selected_mapping_is_idempotent() {
        let selection = setup();
        selection.set_selected_mapping(Some(1));
        let activations = count_activations(&selection);
        selection.set_selected_mapping(selection.selected_mapping());
        assert_eq!(activations.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_idempotence_with_duplicate_mappings() {
        let selection = setup();
        let duplicate = {
            let mut session = selection.remodel().unwrap();
            session.add(2, "Lime".into())
        };
        assert!(selection.select_item(duplicate));
        selection.set_selected_mapping(Some(2));
        assert_eq!(selection.selected_id(), Some(duplicate));
    }

    #[test]
    fn test_selection_pending_shows_null_item() {
        let selection = setup();
        selection.set_selected_mapping(Some(3));
        selection.set_selection_pending(true);
        assert!(selection.is_selection_pending());
        assert!(selection.store().has_null_item());
        assert!(selection.selected_item().unwrap().is_null());

        selection.set_selection_pending(false);
        assert!(!selection.store().has_null_item());
        assert_eq!(selection.selection(), Selection::None);
    }

    #[test]
    fn test_set_selected_option_falls_back_to_free_text() {
        let selection = setup();
        selection.set_selected_option("Blue".into());
        assert_eq!(selection.selected_mapping(), Some(3));

        selection.set_selected_option("Teal".into());
        assert_eq!(selection.selection(), Selection::FreeText("Teal".to_string()));
        assert_eq!(selection.selected_option().as_deref(), Some("Teal"));
        assert_eq!(selection.selected_mapping(), None);
        assert!(!selection.has_selection());
    }

    #[test]
    fn test_select_item_activates_with_mapping() {
        let selection = setup();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = seen.clone();
        selection.signals().activated.connect(move |mapping| {
            seen_clone.lock().push(*mapping);
        });

        let green = selection.store().find_mapping(&2).unwrap().id();
        assert!(selection.select_item(green));
        assert!(selection.select_item(green));
        assert_eq!(*seen.lock(), vec![Some(2)]);
    }

    #[test]
    fn test_remodel_clears_removed_selection_and_restores_null() {
        let selection = setup();
        selection.set_allow_null(true);
        selection.set_selected_mapping(Some(2));
        {
            let mut session = selection.remodel().unwrap();
            session.clear();
            session.add(7, "Black".into());
        }
        assert!(selection.store().has_null_item());
        assert_eq!(selection.store().len(), 2);
        assert!(selection.selected_item().unwrap().is_null());
    }

    #[test]
    fn test_removing_selected_item_falls_back_to_null_item() {
        let selection = setup();
        selection.set_allow_null(true);
        selection.set_selected_mapping(Some(2));
        let activations = count_activations(&selection);
        {
            let mut session = selection.remodel().unwrap();
            assert!(session.remove_mapping(&2));
        }
        assert!(selection.store().has_null_item());
        assert_eq!(selection.selected_index(), Some(0));
        assert!(selection.selected_item().unwrap().is_null());

        selection.set_allow_null(false);
        assert_eq!(selection.selected_index(), None);
        selection.set_allow_null(true);
        assert_eq!(selection.selected_index(), Some(0));
        assert_eq!(activations.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_reselecting_free_text_mapping_keeps_text() {
        let selection = setup();
        selection.set_allow_null(true);
        selection.set_editable(true);
        selection.set_selected_option("Teal".into());
        let activations = count_activations(&selection);

        selection.set_selected_mapping(selection.selected_mapping());
        assert_eq!(selection.selection(), Selection::FreeText("Teal".to_string()));
        assert_eq!(activations.load(Ordering::SeqCst), 0);

        // A cursor-driven update still replaces the text.
        selection.show_mapping(None);
        assert!(selection.selected_item().unwrap().is_null());
        assert_eq!(activations.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_remodel_wrapper_is_exclusive() {
        let selection = setup();
        let session = selection.remodel().unwrap();
        assert!(matches!(selection.remodel(), Err(BindingError::RemodelActive)));
        drop(session);
        assert!(selection.remodel().is_ok());
    }

    #[test]
    fn test_set_options_length_mismatch() {
        let selection = setup();
        let err = selection
            .set_options(vec![1, 2], vec!["One".into()])
            .unwrap_err();
        assert_eq!(
            err,
            BindingError::MismatchedLengths {
                options: 1,
                mappings: 2
            }
        );
        assert_eq!(selection.store().len(), 3);

        let err = selection
            .set_options_with_secondary(vec![1], vec!["One".into()], vec![])
            .unwrap_err();
        assert!(matches!(err, BindingError::MismatchedLengths { options: 0, mappings: 1 }));
    }

    #[test]
    fn test_secondary_options_and_filter() {
        let selection: BoundSelection<i32> = BoundSelection::new();
        selection
            .set_options_with_secondary(
                vec![1, 2, 3],
                vec!["Smith".into(), "Smythe".into(), "Jones".into()],
                vec!["Ann".into(), "Bob".into(), "Cal".into()],
            )
            .unwrap();
        selection.set_filter_text("sm");
        let visible: Vec<_> = selection
            .visible_items()
            .iter()
            .filter_map(|item| item.mapping().copied())
            .collect();
        assert_eq!(visible, vec![1, 2]);

        selection.set_filter_mode(FilterMode::Contains);
        selection.set_filter_text("o");
        assert_eq!(selection.visible_items().len(), 2);
    }

    #[test]
    fn test_commit_edit_text() {
        let selection = setup();
        selection.set_filter_text("gr");
        assert_eq!(
            selection.commit_edit_text("green"),
            EditOutcome::Selected(selection.store().find_mapping(&2).unwrap().id())
        );
        assert_eq!(selection.filter_text(), "");

        assert_eq!(selection.commit_edit_text("Teal"), EditOutcome::Reverted);
        assert_eq!(selection.selected_mapping(), Some(2));

        selection.set_editable(true);
        assert_eq!(selection.commit_edit_text("Teal"), EditOutcome::FreeText);
        assert_eq!(selection.selected_option().as_deref(), Some("Teal"));
    }

    #[test]
    fn test_commit_empty_text_selects_null_item() {
        let selection = setup();
        selection.set_selected_mapping(Some(1));
        assert_eq!(selection.commit_edit_text(""), EditOutcome::Reverted);

        selection.set_allow_null(true);
        let null = selection.store().null_item().unwrap().id();
        assert_eq!(selection.commit_edit_text(""), EditOutcome::Selected(null));
    }

    #[test]
    fn test_apply_config() {
        let selection = setup();
        let config = SelectionConfig {
            separator: " / ".into(),
            allow_null: true,
            editable: true,
            filter_mode: FilterMode::Contains,
            ..SelectionConfig::default()
        };
        selection.apply_config(&config);
        assert!(selection.allow_null());
        assert!(selection.is_editable());
        assert_eq!(selection.store().separator(), " / ");
        assert!(selection.store().has_null_item());
    }

    #[test]
    fn test_reset_field_clears_quietly() {
        let selection = setup();
        selection.set_selected_mapping(Some(2));
        let activations = count_activations(&selection);
        selection.reset_field();
        assert_eq!(selection.selection(), Selection::None);
        assert_eq!(activations.load(Ordering::SeqCst), 0);
    }
}
