//! Text filtering over an option list.

use serde::{Deserialize, Serialize};

use super::item::{ItemId, ListItem, MappingValue, OptionValue};

/// How filter text is matched against display text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterMode {
    /// Display text starts with the filter text.
    #[default]
    StartsWith,
    /// Display text contains the filter text anywhere.
    Contains,
}

/// A narrowing view over an option list, driven by typed text.
///
/// The overlay never changes the underlying list. While it is active,
/// positions in the visible subset differ from store indices, so callers
/// work with [`ItemId`]s.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterOverlay {
    text: String,
    mode: FilterMode,
    case_insensitive: bool,
}

impl Default for FilterOverlay {
    fn default() -> Self {
        Self::new(FilterMode::StartsWith, true)
    }
}

impl FilterOverlay {
    /// Create an inactive overlay.
    pub fn new(mode: FilterMode, case_insensitive: bool) -> Self {
        Self {
            text: String::new(),
            mode,
            case_insensitive,
        }
    }

    /// The current filter text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Replace the filter text.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    /// Clear the filter text, showing every item.
    pub fn clear(&mut self) {
        self.text.clear();
    }

    /// Whether any filter text is set.
    pub fn is_active(&self) -> bool {
        !self.text.is_empty()
    }

    /// The matching mode.
    pub fn mode(&self) -> FilterMode {
        self.mode
    }

    /// Change the matching mode.
    pub fn set_mode(&mut self, mode: FilterMode) {
        self.mode = mode;
    }

    /// Whether matching ignores case.
    pub fn is_case_insensitive(&self) -> bool {
        self.case_insensitive
    }

    /// Change case sensitivity.
    pub fn set_case_insensitive(&mut self, case_insensitive: bool) {
        self.case_insensitive = case_insensitive;
    }

    /// Whether `display` passes the filter.
    pub fn matches(&self, display: &str) -> bool {
        if self.text.is_empty() {
            return true;
        }
        let (needle, haystack) = if self.case_insensitive {
            (self.text.to_lowercase(), display.to_lowercase())
        } else {
            (self.text.clone(), display.to_string())
        };
        match self.mode {
            FilterMode::StartsWith => haystack.starts_with(&needle),
            FilterMode::Contains => haystack.contains(&needle),
        }
    }

    /// Whether two display texts are equal under this overlay's case rule.
    pub fn same_text(&self, a: &str, b: &str) -> bool {
        if self.case_insensitive {
            a.to_lowercase() == b.to_lowercase()
        } else {
            a == b
        }
    }

    /// Identities of the visible items, in display order.
    ///
    /// The null item is visible only while no filter text is set.
    pub fn visible<M, O, O2>(&self, items: &[ListItem<M, O, O2>], separator: &str) -> Vec<ItemId>
    where
        M: MappingValue,
        O: OptionValue,
        O2: OptionValue,
    {
        items
            .iter()
            .filter(|item| {
                if item.is_null() {
                    !self.is_active()
                } else {
                    self.matches(&item.display_text(separator))
                }
            })
            .map(ListItem::id)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn states() -> Vec<ListItem<i32>> {
        vec![
            ListItem::null(),
            ListItem::new(1, "Alabama".into(), None),
            ListItem::new(2, "Alaska".into(), None),
            ListItem::new(3, "Kansas".into(), None),
        ]
    }

    #[test]
    fn test_inactive_overlay_shows_everything() {
        let items = states();
        let overlay = FilterOverlay::default();
        assert!(!overlay.is_active());
        assert_eq!(overlay.visible(&items, " - ").len(), 4);
    }

    #[test]
    fn test_prefix_filter_hides_null_item() {
        let items = states();
        let mut overlay = FilterOverlay::default();
        overlay.set_text("al");
        let visible = overlay.visible(&items, " - ");
        assert_eq!(visible, vec![items[1].id(), items[2].id()]);
    }

    #[test]
    fn test_contains_mode() {
        let items = states();
        let mut overlay = FilterOverlay::new(FilterMode::Contains, true);
        overlay.set_text("AS");
        let visible = overlay.visible(&items, " - ");
        assert_eq!(visible, vec![items[2].id(), items[3].id()]);
    }

    #[test]
    fn test_case_sensitive_matching() {
        let mut overlay = FilterOverlay::new(FilterMode::StartsWith, false);
        overlay.set_text("al");
        assert!(!overlay.matches("Alaska"));
        assert!(overlay.matches("alaska"));
        assert!(!overlay.same_text("Kansas", "kansas"));

        overlay.clear();
        assert!(overlay.matches("anything"));
    }
}
