//! Controllers that bind controls to cursor columns.
//!
//! Every controller bound to one cursor shares a [`CursorContext`], which
//! carries the insert and row-modified flags, the error set, the deferred
//! task queue and the notifier.
//!
//! - [`BoundSelection`]: option lists (combo boxes) keyed by a mapping column
//! - [`BoundField`]: single values (text fields, check boxes, sliders, labels)
//! - [`FieldContainer`] and [`reset_fields`]: blanking a form before an insert

mod column;
mod context;
mod fields;
mod loader;
mod reset;
mod selection;

pub use column::ColumnBinding;
pub use context::{ContextSignals, CursorContext};
pub use fields::{
    BoundCheckBox, BoundField, BoundLabel, BoundSlider, BoundTextField, FieldSignals,
};
pub use reset::{FieldContainer, ResetField, reset_fields};
pub use selection::{BoundSelection, EditOutcome, Selection, SelectionRemodel, SelectionSignals};
