//! List items pairing display options with mapping keys.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Global counter for item identities.
static NEXT_ITEM_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a [`ListItem`].
///
/// Selection is tracked by identity rather than by index, because a filter
/// can hide part of the list and two items may share a mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemId(u64);

impl ItemId {
    fn next() -> Self {
        Self(NEXT_ITEM_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

/// Values that can be used as mapping keys.
pub trait MappingValue: Clone + PartialEq + fmt::Debug + Send + Sync + 'static {}

impl<T> MappingValue for T where T: Clone + PartialEq + fmt::Debug + Send + Sync + 'static {}

/// Values that can be shown as an option.
pub trait OptionValue: Clone + PartialEq + Default + fmt::Display + Send + Sync + 'static {}

impl<T> OptionValue for T where T: Clone + PartialEq + Default + fmt::Display + Send + Sync + 'static {}

/// One entry of an option list.
///
/// `mapping` is the value stored in the database; `option` and the optional
/// `option2` are what the user sees. Only the null item has no mapping.
#[derive(Debug, Clone, PartialEq)]
pub struct ListItem<M, O = String, O2 = String> {
    id: ItemId,
    mapping: Option<M>,
    option: O,
    option2: Option<O2>,
}

impl<M: Clone, O: OptionValue, O2: OptionValue> ListItem<M, O, O2> {
    /// Create an item with a fresh identity.
    pub fn new(mapping: M, option: O, option2: Option<O2>) -> Self {
        Self {
            id: ItemId::next(),
            mapping: Some(mapping),
            option,
            option2,
        }
    }

    /// Create a null item: no mapping and a blank option.
    pub fn null() -> Self {
        Self {
            id: ItemId::next(),
            mapping: None,
            option: O::default(),
            option2: None,
        }
    }

    /// The item's identity.
    pub fn id(&self) -> ItemId {
        self.id
    }

    /// The mapping key, `None` for the null item.
    pub fn mapping(&self) -> Option<&M> {
        self.mapping.as_ref()
    }

    /// The primary display value.
    pub fn option(&self) -> &O {
        &self.option
    }

    /// The secondary display value.
    pub fn option2(&self) -> Option<&O2> {
        self.option2.as_ref()
    }

    /// Whether this is the null item.
    pub fn is_null(&self) -> bool {
        self.mapping.is_none()
    }

    /// Text shown for the item, joining both options with `separator`.
    pub fn display_text(&self, separator: &str) -> String {
        match &self.option2 {
            Some(option2) => format!("{}{}{}", self.option, separator, option2),
            None => self.option.to_string(),
        }
    }

    pub(crate) fn with_option(&self, option: O) -> Self {
        Self {
            id: self.id,
            mapping: self.mapping.clone(),
            option,
            option2: self.option2.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identities_are_unique() {
        let a = ListItem::<i32>::new(1, "Red".into(), None);
        let b = ListItem::<i32>::new(1, "Red".into(), None);
        assert_ne!(a.id(), b.id());
        assert_ne!(a, b);
    }

    #[test]
    fn test_display_text() {
        let item = ListItem::<i32>::new(7, "Smith".into(), Some("John".into()));
        assert_eq!(item.display_text(" - "), "Smith - John");

        let plain = ListItem::<i32>::new(8, "Doe".into(), None);
        assert_eq!(plain.display_text(" - "), "Doe");
    }

    #[test]
    fn test_null_item() {
        let null = ListItem::<i32>::null();
        assert!(null.is_null());
        assert_eq!(null.mapping(), None);
        assert_eq!(null.option(), "");
        assert_eq!(null.display_text(" - "), "");
    }
}
