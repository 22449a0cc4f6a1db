//! Flags that know when they change.
//!
//! The cursor context keeps its insert and row-modified flags in a
//! [`Property`]. Writing the value it already holds reports `false`, and the
//! owner emits its signal only on `true`, so repeated "row is dirty" writes
//! from several fields produce a single notification.
//!
//! ```
//! use swingset_core::{Property, Signal};
//!
//! let row_modified = Property::new(false);
//! let row_modified_changed = Signal::<bool>::new();
//!
//! for _edited_field in ["name", "age"] {
//!     if row_modified.set(true) {
//!         row_modified_changed.emit(true);
//!     }
//! }
//! assert!(row_modified.get());
//! ```

use std::fmt;

use parking_lot::RwLock;

/// Shared, lock-protected value with change detection on write.
pub struct Property<T> {
    cell: RwLock<T>,
}

impl<T: Clone> Property<T> {
    pub fn new(initial: T) -> Self {
        Self {
            cell: RwLock::new(initial),
        }
    }

    pub fn get(&self) -> T {
        self.cell.read().clone()
    }
}

impl<T: Clone + PartialEq> Property<T> {
    /// Store `value`. `true` means the stored value actually changed.
    pub fn set(&self, value: T) -> bool {
        let mut guard = self.cell.write();
        if *guard == value {
            return false;
        }
        *guard = value;
        true
    }
}

impl<T: Clone + Default> Default for Property<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: fmt::Debug> fmt::Debug for Property<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.cell.read(), f)
    }
}
