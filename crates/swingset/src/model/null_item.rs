//! Presence rule for the synthetic null item.

/// What to do with the null item after the policy inputs changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NullItemAdjustment {
    /// The store already agrees with the policy.
    None,
    /// Insert a null item at index 0.
    Insert,
    /// Remove the null item.
    Remove,
}

/// Inputs deciding whether a list shows a null item.
///
/// The null item is present exactly when nulls are allowed or a selection is
/// pending. Presence is never stored here; callers compare the rule against
/// the store with [`plan`](Self::plan) after every change.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NullItemPolicy {
    allow_null: bool,
    selection_pending: bool,
}

impl NullItemPolicy {
    /// Create a policy.
    pub fn new(allow_null: bool) -> Self {
        Self {
            allow_null,
            selection_pending: false,
        }
    }

    /// Whether the bound column accepts NULL from this control.
    pub fn allow_null(&self) -> bool {
        self.allow_null
    }

    /// Whether the control is blank while awaiting a fresh value.
    pub fn selection_pending(&self) -> bool {
        self.selection_pending
    }

    /// Returns `true` if the flag changed.
    pub fn set_allow_null(&mut self, allow_null: bool) -> bool {
        std::mem::replace(&mut self.allow_null, allow_null) != allow_null
    }

    /// Returns `true` if the flag changed.
    pub fn set_selection_pending(&mut self, pending: bool) -> bool {
        std::mem::replace(&mut self.selection_pending, pending) != pending
    }

    /// Whether the null item should be present.
    pub fn wants_null(&self) -> bool {
        self.allow_null || self.selection_pending
    }

    /// Adjustment needed given whether the null item is currently `present`.
    pub fn plan(&self, present: bool) -> NullItemAdjustment {
        match (self.wants_null(), present) {
            (true, false) => NullItemAdjustment::Insert,
            (false, true) => NullItemAdjustment::Remove,
            _ => NullItemAdjustment::None,
        }
    }
}
