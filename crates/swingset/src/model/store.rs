//! The option/mapping store and its remodel sessions.

use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::RwLock;
use swingset_core::Signal;
use swingset_core::logging::{span_names, targets};

use super::item::{ItemId, ListItem, MappingValue, OptionValue};
use crate::error::{BindingError, BindingResult};

/// Default text placed between the primary and secondary option.
pub const DEFAULT_SEPARATOR: &str = " - ";

/// Signals emitted by an [`OptionMappingStore`].
#[derive(Default)]
pub struct StoreSignals {
    /// Emitted once when a remodel session ends.
    pub model_reset: Signal<()>,
}

/// An ordered list of items pairing display options with mapping keys.
///
/// Reads are available at any time. Every structural change goes through a
/// [`Remodel`] session obtained from [`remodel`](Self::remodel), which emits
/// a single [`model_reset`](StoreSignals::model_reset) when it ends.
///
/// Duplicate mappings are accepted with a warning; lookups by mapping
/// resolve to the first match in display order.
///
/// # Example
///
/// ```
/// use swingset::model::OptionMappingStore;
///
/// let store: OptionMappingStore<i32> = OptionMappingStore::new();
/// {
///     let mut session = store.remodel().unwrap();
///     session.add(1, "Red".to_string());
///     session.add(2, "Green".to_string());
/// }
/// assert_eq!(store.index_of(&2), Some(1));
/// assert_eq!(store.index_of(&5), None);
/// ```
pub struct OptionMappingStore<M, O = String, O2 = String> {
    items: RwLock<Vec<ListItem<M, O, O2>>>,
    separator: RwLock<String>,
    remodeling: AtomicBool,
    signals: StoreSignals,
}

impl<M: MappingValue, O: OptionValue, O2: OptionValue> Default for OptionMappingStore<M, O, O2> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: MappingValue, O: OptionValue, O2: OptionValue> OptionMappingStore<M, O, O2> {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            items: RwLock::new(Vec::new()),
            separator: RwLock::new(DEFAULT_SEPARATOR.to_string()),
            remodeling: AtomicBool::new(false),
            signals: StoreSignals::default(),
        }
    }

    /// Open a remodel session.
    ///
    /// Fails with [`BindingError::RemodelActive`] if a session is already
    /// open on this store.
    pub fn remodel(&self) -> BindingResult<Remodel<'_, M, O, O2>> {
        if self
            .remodeling
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(BindingError::RemodelActive);
        }
        let span = tracing::debug_span!(target: targets::STORE, span_names::REMODEL).entered();
        Ok(Remodel {
            store: self,
            changes: 0,
            _span: span,
        })
    }

    /// Whether a remodel session is open.
    pub fn is_remodeling(&self) -> bool {
        self.remodeling.load(Ordering::Acquire)
    }

    /// The store's signals.
    pub fn signals(&self) -> &StoreSignals {
        &self.signals
    }

    /// Number of items, including the null item if present.
    pub fn len(&self) -> usize {
        self.items.read().len()
    }

    /// Whether the store holds no items at all.
    pub fn is_empty(&self) -> bool {
        self.items.read().is_empty()
    }

    /// Snapshot of all items in display order.
    pub fn items(&self) -> Vec<ListItem<M, O, O2>> {
        self.items.read().clone()
    }

    /// The item with the given identity.
    pub fn item(&self, id: ItemId) -> Option<ListItem<M, O, O2>> {
        self.items.read().iter().find(|item| item.id() == id).cloned()
    }

    /// The item at `index`.
    pub fn item_at(&self, index: usize) -> Option<ListItem<M, O, O2>> {
        self.items.read().get(index).cloned()
    }

    /// Index of the first item whose mapping equals `mapping`.
    pub fn index_of(&self, mapping: &M) -> Option<usize> {
        self.items
            .read()
            .iter()
            .position(|item| item.mapping() == Some(mapping))
    }

    /// Index of the item with the given identity.
    pub fn index_of_id(&self, id: ItemId) -> Option<usize> {
        self.items.read().iter().position(|item| item.id() == id)
    }

    /// First item whose mapping equals `mapping`.
    pub fn find_mapping(&self, mapping: &M) -> Option<ListItem<M, O, O2>> {
        self.items
            .read()
            .iter()
            .find(|item| item.mapping() == Some(mapping))
            .cloned()
    }

    /// First non-null item whose primary option equals `option`.
    pub fn find_option(&self, option: &O) -> Option<ListItem<M, O, O2>> {
        self.items
            .read()
            .iter()
            .find(|item| !item.is_null() && item.option() == option)
            .cloned()
    }

    /// Mapping of the item with the given identity.
    pub fn mapping_of(&self, id: ItemId) -> Option<M> {
        self.item(id).and_then(|item| item.mapping().cloned())
    }

    /// Primary option of the item with the given identity.
    pub fn option_of(&self, id: ItemId) -> Option<O> {
        self.item(id).map(|item| item.option().clone())
    }

    /// Secondary option of the item with the given identity.
    pub fn option2_of(&self, id: ItemId) -> Option<O2> {
        self.item(id).and_then(|item| item.option2().cloned())
    }

    /// Whether some item has the given mapping.
    pub fn contains(&self, mapping: &M) -> bool {
        self.index_of(mapping).is_some()
    }

    /// The null item, if present.
    pub fn null_item(&self) -> Option<ListItem<M, O, O2>> {
        self.items.read().iter().find(|item| item.is_null()).cloned()
    }

    /// Whether the null item is present.
    pub fn has_null_item(&self) -> bool {
        self.items.read().iter().any(ListItem::is_null)
    }

    /// Number of items excluding the null item.
    pub fn real_len(&self) -> usize {
        self.items.read().iter().filter(|item| !item.is_null()).count()
    }

    /// Text placed between the primary and secondary option.
    pub fn separator(&self) -> String {
        self.separator.read().clone()
    }

    /// Change the option separator.
    pub fn set_separator(&self, separator: impl Into<String>) {
        *self.separator.write() = separator.into();
    }

    /// Display text of the item with the given identity.
    pub fn display_text(&self, id: ItemId) -> Option<String> {
        let separator = self.separator.read().clone();
        self.item(id).map(|item| item.display_text(&separator))
    }

    fn push(&self, item: ListItem<M, O, O2>) -> ItemId {
        let id = item.id();
        let mut items = self.items.write();
        if let Some(mapping) = item.mapping()
            && items.iter().any(|existing| existing.mapping() == Some(mapping))
        {
            tracing::warn!(
                target: targets::STORE,
                ?mapping,
                "duplicate mapping added; lookups resolve to the first match"
            );
        }
        items.push(item);
        id
    }
}

/// An open remodel session on an [`OptionMappingStore`].
///
/// Only one session can be open per store. Dropping the session, on any
/// exit path, closes it and emits exactly one `model_reset`.
#[must_use = "changes are published when the session is dropped"]
pub struct Remodel<'a, M: MappingValue, O: OptionValue = String, O2: OptionValue = String> {
    store: &'a OptionMappingStore<M, O, O2>,
    changes: usize,
    _span: tracing::span::EnteredSpan,
}

impl<M: MappingValue, O: OptionValue, O2: OptionValue> Remodel<'_, M, O, O2> {
    /// Append an item.
    pub fn add(&mut self, mapping: M, option: O) -> ItemId {
        self.changes += 1;
        self.store.push(ListItem::new(mapping, option, None))
    }

    /// Append an item with a secondary option.
    pub fn add_with_option2(&mut self, mapping: M, option: O, option2: O2) -> ItemId {
        self.changes += 1;
        self.store.push(ListItem::new(mapping, option, Some(option2)))
    }

    /// Append every `(mapping, option)` pair.
    pub fn add_all<I>(&mut self, pairs: I) -> Vec<ItemId>
    where
        I: IntoIterator<Item = (M, O)>,
    {
        pairs
            .into_iter()
            .map(|(mapping, option)| self.add(mapping, option))
            .collect()
    }

    /// Remove the item with the given identity.
    pub fn remove(&mut self, id: ItemId) -> bool {
        self.remove_where(|item| item.id() == id)
    }

    /// Remove the first item whose mapping equals `mapping`.
    pub fn remove_mapping(&mut self, mapping: &M) -> bool {
        self.remove_where(|item| item.mapping() == Some(mapping))
    }

    /// Remove the item at `index`.
    pub fn remove_at(&mut self, index: usize) -> bool {
        let mut items = self.store.items.write();
        if index >= items.len() {
            return false;
        }
        items.remove(index);
        self.changes += 1;
        true
    }

    /// Replace the primary option of the item with the given identity.
    pub fn set_option(&mut self, id: ItemId, option: O) -> bool {
        let mut items = self.store.items.write();
        match items.iter_mut().find(|item| item.id() == id) {
            Some(item) => {
                *item = item.with_option(option);
                self.changes += 1;
                true
            }
            None => false,
        }
    }

    /// Remove every item, the null item included.
    pub fn clear(&mut self) {
        let mut items = self.store.items.write();
        if !items.is_empty() {
            items.clear();
            self.changes += 1;
        }
    }

    /// Number of mutations made in this session.
    pub fn changes(&self) -> usize {
        self.changes
    }

    pub(crate) fn insert_null(&mut self) -> ItemId {
        let null = ListItem::null();
        let id = null.id();
        self.store.items.write().insert(0, null);
        self.changes += 1;
        id
    }

    pub(crate) fn remove_null(&mut self) -> bool {
        self.remove_where(ListItem::is_null)
    }

    fn remove_where<F>(&mut self, predicate: F) -> bool
    where
        F: Fn(&ListItem<M, O, O2>) -> bool,
    {
        let mut items = self.store.items.write();
        match items.iter().position(predicate) {
            Some(index) => {
                items.remove(index);
                self.changes += 1;
                true
            }
            None => false,
        }
    }
}

impl<M: MappingValue, O: OptionValue, O2: OptionValue> Drop for Remodel<'_, M, O, O2> {
    fn drop(&mut self) {
        self.store.remodeling.store(false, Ordering::Release);
        tracing::trace!(
            target: targets::STORE,
            changes = self.changes,
            len = self.store.len(),
            "remodel session closed"
        );
        self.store.signals.model_reset.emit(());
    }
}
