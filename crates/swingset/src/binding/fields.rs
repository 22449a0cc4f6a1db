//! Single-value controls bound to one cursor column.

use std::sync::Arc;

use parking_lot::Mutex;
use swingset_core::logging::targets;
use swingset_core::{ConnectionId, Signal};

use crate::binding::reset::ResetField;
use crate::binding::{ColumnBinding, CursorContext};
use crate::cursor::{ColumnScalar, ColumnType};
use crate::error::{BindingResult, ConversionError, CursorError};

/// Signals emitted by a [`BoundField`].
pub struct FieldSignals<V> {
    /// Any change of the shown value.
    pub value_changed: Signal<Option<V>>,
    /// A user edit, carrying the value to store.
    pub edited: Signal<Option<V>>,
}

impl<V: Clone + Send + 'static> Default for FieldSignals<V> {
    fn default() -> Self {
        Self {
            value_changed: Signal::new(),
            edited: Signal::new(),
        }
    }
}

struct FieldBinding {
    column: ColumnBinding,
    edited: Option<ConnectionId>,
}

type Normalizer<V> = Box<dyn Fn(V) -> V + Send + Sync>;

/// A scalar control (text field, check box, slider, label) bound to a column.
///
/// Cursor notifications update the shown value without writing back. User
/// edits are written to the column and mark the row modified. A read-only
/// field ignores edits.
pub struct BoundField<V: ColumnScalar> {
    name: String,
    read_only: bool,
    value: Mutex<Option<V>>,
    normalize: Option<Normalizer<V>>,
    binding: Mutex<Option<FieldBinding>>,
    signals: FieldSignals<V>,
}

/// A text field.
pub type BoundTextField = BoundField<String>;
/// A check box.
pub type BoundCheckBox = BoundField<bool>;
/// A slider over an integer range.
pub type BoundSlider = BoundField<i32>;
/// A read-only text label.
pub type BoundLabel = BoundField<String>;

impl<V: ColumnScalar> BoundField<V> {
    /// Create an editable field. `name` identifies it in the error set.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            read_only: false,
            value: Mutex::new(None),
            normalize: None,
            binding: Mutex::new(None),
            signals: FieldSignals::default(),
        }
    }

    /// Create a field that only displays its column.
    pub fn read_only(name: impl Into<String>) -> Self {
        Self {
            read_only: true,
            ..Self::new(name)
        }
    }

    /// The field's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether edits are ignored.
    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// The field's signals.
    pub fn signals(&self) -> &FieldSignals<V> {
        &self.signals
    }

    /// The shown value.
    pub fn value(&self) -> Option<V> {
        self.value.lock().clone()
    }

    /// Show `value` without writing it. Returns `true` if it changed.
    pub fn set_value(&self, value: Option<V>) -> bool {
        let value = value.map(|v| self.normalized(v));
        {
            let mut current = self.value.lock();
            if *current == value {
                return false;
            }
            *current = value.clone();
        }
        self.signals.value_changed.emit(value);
        true
    }

    /// Apply a user edit. Returns `true` if the value changed.
    pub fn edit(&self, value: Option<V>) -> bool {
        if self.read_only {
            tracing::debug!(target: targets::FIELD, field = %self.name, "edit ignored on read-only field");
            return false;
        }
        if !self.set_value(value) {
            return false;
        }
        self.signals.edited.emit(self.value());
        true
    }

    /// Apply typed text as a user edit.
    ///
    /// Text that does not convert marks the field as holding an error in the
    /// bound context and is returned as `Err`.
    pub fn edit_text(&self, text: &str) -> Result<bool, ConversionError> {
        let (context, column_type) = match self.binding_parts() {
            Some((context, _, column_type)) => (Some(context), column_type),
            None => (None, ColumnType::VarChar),
        };
        match V::read_column(Some(text), column_type) {
            Ok(value) => {
                if let Some(context) = &context {
                    context.clear_error(&self.name);
                }
                Ok(self.edit(value))
            }
            Err(err) => {
                tracing::debug!(target: targets::FIELD, field = %self.name, error = %err, "invalid input");
                if let Some(context) = &context {
                    context.add_error(self.name.clone());
                }
                Err(err)
            }
        }
    }

    fn normalized(&self, value: V) -> V {
        match &self.normalize {
            Some(normalize) => normalize(value),
            None => value,
        }
    }

    /// Bind to `column` of the cursor in `context` and show its value.
    pub fn bind(self: &Arc<Self>, context: Arc<CursorContext>, column: impl Into<String>) -> BindingResult<()> {
        self.unbind();

        let weak = Arc::downgrade(self);
        let column = ColumnBinding::new(context, column, move |_| {
            if let Some(field) = weak.upgrade() {
                field.update_from_cursor();
            }
        })?;

        let edited = (!self.read_only).then(|| {
            let weak = Arc::downgrade(self);
            self.signals.edited.connect(move |value| {
                if let Some(field) = weak.upgrade() {
                    field.write_value(value.as_ref());
                }
            })
        });

        *self.binding.lock() = Some(FieldBinding { column, edited });
        self.update_from_cursor();
        Ok(())
    }

    /// Drop the cursor binding.
    pub fn unbind(&self) {
        let previous = self.binding.lock().take();
        if let Some(FieldBinding {
            edited: Some(id), ..
        }) = previous
        {
            self.signals.edited.disconnect(id);
        }
    }

    /// Whether the field is bound to a column.
    pub fn is_bound(&self) -> bool {
        self.binding.lock().is_some()
    }

    /// Re-read the bound column and show its value.
    pub fn update_from_cursor(&self) {
        let Some((context, column, column_type)) = self.binding_parts() else {
            return;
        };
        let text = match context.read_text(&column) {
            Ok(text) => text,
            Err(CursorError::NoCurrentRow) => {
                self.set_value(None);
                return;
            }
            Err(err) => {
                context.report("Read failed", &err);
                self.set_value(None);
                return;
            }
        };
        match V::read_column(text.as_deref(), column_type) {
            Ok(value) => {
                self.set_value(value);
            }
            Err(err) => {
                context.report("Conversion failed", &err);
                self.set_value(None);
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

    fn write_value(&self, value: Option<&V>) {
        let Some((context, column, column_type)) = self.binding_parts() else {
            return;
        };
        let text = value.map(|v| v.format_column(column_type));
        context.write_column(&column, text.as_deref());
    }
}

impl<V: ColumnScalar + PartialOrd> BoundField<V> {
    /// Clamp every shown value to `min..=max`.
    pub fn with_range(mut self, min: V, max: V) -> Self {
        self.normalize = Some(Box::new(move |value| {
            if value < min {
                min.clone()
            } else if value > max {
                max.clone()
            } else {
                value
            }
        }));
        self
    }
}

impl BoundField<String> {
    /// The shown text, empty for NULL.
    pub fn text(&self) -> String {
        self.value().unwrap_or_default()
    }
}

impl BoundField<bool> {
    /// Whether the box is checked. NULL shows unchecked.
    pub fn is_checked(&self) -> bool {
        self.value().unwrap_or(false)
    }

    /// Check or uncheck the box as the user would.
    pub fn set_checked(&self, checked: bool) -> bool {
        self.edit(Some(checked))
    }
}

impl<V: ColumnScalar> ResetField for BoundField<V> {
    fn reset_field(&self) {
        self.set_value(None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cursor::{ColumnSpec, MemoryCursor, TabularCursor};

    fn setup() -> (Arc<MemoryCursor>, Arc<CursorContext>) {
        let cursor = Arc::new(
            MemoryCursor::new(vec![
                ColumnSpec::new("name", ColumnType::VarChar),
                ColumnSpec::new("active", ColumnType::Integer),
                ColumnSpec::new("volume", ColumnType::Integer),
            ])
            .with_row([Some("Ada"), Some("1"), Some("40")])
            .with_row([Some("Linus"), Some("0"), None]),
        );
        cursor.first().unwrap();
        let context = CursorContext::new(cursor.clone());
        (cursor, context)
    }

    #[test]
    fn test_text_field_follows_cursor() {
        let (cursor, context) = setup();
        let field = Arc::new(BoundTextField::new("name"));
        field.bind(context.clone(), "name").unwrap();
        assert_eq!(field.text(), "Ada");

        cursor.next().unwrap();
        assert_eq!(field.text(), "Linus");
        assert!(!context.is_row_modified());
    }

    #[test]
    fn test_edit_writes_and_marks_modified() {
        let (cursor, context) = setup();
        let field = Arc::new(BoundTextField::new("name"));
        field.bind(context.clone(), "name").unwrap();

        assert!(field.edit(Some("Grace".into())));
        assert_eq!(cursor.column_text("name").unwrap().as_deref(), Some("Grace"));
        assert!(context.is_row_modified());
    }

    #[test]
    fn test_check_box_uses_numeric_column() {
        let (cursor, context) = setup();
        let check = Arc::new(BoundCheckBox::new("active"));
        check.bind(context, "active").unwrap();
        assert!(check.is_checked());

        check.set_checked(false);
        assert_eq!(cursor.column_text("active").unwrap().as_deref(), Some("0"));
    }

    #[test]
    fn test_slider_clamps() {
        let (cursor, context) = setup();
        let slider = Arc::new(BoundSlider::new("volume").with_range(0, 10));
        slider.bind(context, "volume").unwrap();
        assert_eq!(slider.value(), Some(10));

        slider.edit(Some(-4));
        assert_eq!(slider.value(), Some(0));
        assert_eq!(cursor.column_text("volume").unwrap().as_deref(), Some("0"));

        cursor.next().unwrap();
        assert_eq!(slider.value(), None);
    }

    #[test]
    fn test_label_is_read_only() {
        let (cursor, context) = setup();
        let label = Arc::new(BoundLabel::read_only("name"));
        label.bind(context.clone(), "name").unwrap();
        assert!(!label.edit(Some("changed".into())));
        assert_eq!(label.text(), "Ada");
        assert_eq!(cursor.column_text("name").unwrap().as_deref(), Some("Ada"));
        assert!(!context.is_row_modified());
    }

    #[test]
    fn test_edit_text_tracks_errors() {
        let (cursor, context) = setup();
        let slider = Arc::new(BoundSlider::new("volume"));
        slider.bind(context.clone(), "volume").unwrap();

        assert!(slider.edit_text("loud").is_err());
        assert_eq!(context.error_components(), vec!["volume"]);
        assert_eq!(slider.value(), Some(40));

        assert_eq!(slider.edit_text("55"), Ok(true));
        assert!(!context.has_errors());
        assert_eq!(cursor.column_text("volume").unwrap().as_deref(), Some("55"));
    }

    #[test]
    fn test_reset_blanks_without_writing() {
        let (cursor, context) = setup();
        let field = Arc::new(BoundTextField::new("name"));
        field.bind(context.clone(), "name").unwrap();
        field.reset_field();
        assert_eq!(field.value(), None);
        assert_eq!(cursor.column_text("name").unwrap().as_deref(), Some("Ada"));
        assert!(!context.is_row_modified());
    }

    #[test]
    fn test_unbound_field_edits_locally() {
        let field = BoundTextField::new("free");
        assert!(field.edit(Some("x".into())));
        assert_eq!(field.edit_text("y"), Ok(true));
        assert_eq!(field.text(), "y");
    }
}
