//! Option list model.
//!
//! - [`ListItem`]: a mapping key paired with one or two display options
//! - [`OptionMappingStore`]: the ordered item list, mutated only through
//!   [`Remodel`] sessions
//! - [`NullItemPolicy`]: when the synthetic "no selection" item is shown
//! - [`FilterOverlay`]: a typed-text view over the list

mod filter;
mod item;
mod null_item;
mod store;

pub use filter::{FilterMode, FilterOverlay};
pub use item::{ItemId, ListItem, MappingValue, OptionValue};
pub use null_item::{NullItemAdjustment, NullItemPolicy};
pub use store::{DEFAULT_SEPARATOR, OptionMappingStore, Remodel, StoreSignals};
