//! SwingSet - data-aware controls bound to database cursors.
//!
//! SwingSet keeps on-screen controls in step with a live query result as the
//! user moves between rows, edits, inserts and deletes. It is toolkit
//! independent: widgets delegate to the controllers here and render
//! whatever state they report.
//!
//! # Modules
//!
//! - [`cursor`]: the [`TabularCursor`](cursor::TabularCursor) abstraction,
//!   column types and value conversion, and an in-memory cursor
//! - [`model`]: the option/mapping store behind selection controls, with
//!   batch "remodel" sessions, the null item policy and filtering
//! - [`binding`]: controllers that bind selections and single-value fields to
//!   a cursor column through a shared [`CursorContext`](binding::CursorContext)
//! - [`navigator`]: the row navigator, its commit state machine and button
//!   enablement
//! - [`notice`]: user-facing messages and confirmations
//! - [`config`]: TOML configuration
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use swingset::prelude::*;
//!
//! let cursor = Arc::new(
//!     MemoryCursor::new(vec![
//!         ColumnSpec::new("id", ColumnType::Integer),
//!         ColumnSpec::new("color_id", ColumnType::Integer),
//!     ])
//!     .with_row([Some("1"), Some("1")])
//!     .with_row([Some("2"), Some("3")]),
//! );
//! cursor.first().unwrap();
//!
//! let context = CursorContext::new(cursor.clone());
//! let navigator = DataNavigator::new(context.clone());
//!
//! let color: Arc<BoundSelection<i32>> = Arc::new(BoundSelection::new());
//! color
//!     .set_options(vec![1, 2, 3], vec!["Red".into(), "Green".into(), "Blue".into()])
//!     .unwrap();
//! color.bind(context, "color_id").unwrap();
//! assert_eq!(color.selected_option().as_deref(), Some("Red"));
//!
//! navigator.next();
//! assert_eq!(color.selected_option().as_deref(), Some("Blue"));
//! ```

pub mod binding;
pub mod config;
pub mod cursor;
pub mod error;
pub mod model;
pub mod navigator;
pub mod notice;

pub use error::{BindingError, BindingResult, ConfigError, ConversionError, CursorError, CursorResult};

/// Commonly used types.
pub mod prelude {
    pub use crate::binding::{
        BoundCheckBox, BoundField, BoundLabel, BoundSelection, BoundSlider, BoundTextField,
        CursorContext, FieldContainer, ResetField, Selection,
    };
    pub use crate::config::SwingSetConfig;
    pub use crate::cursor::{ColumnScalar, ColumnSpec, ColumnType, MemoryCursor, TabularCursor};
    pub use crate::error::{BindingError, CursorError};
    pub use crate::model::{ItemId, ListItem, OptionMappingStore};
    pub use crate::navigator::{
        ButtonStates, DataNavigator, EnablementPolicy, NavOutcome, NavigationHook,
        attach_navigation_selector,
    };
    pub use crate::notice::{Notice, Notifier};
}
