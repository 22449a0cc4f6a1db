//! Blanking bound fields before a new row is entered.

use std::sync::Arc;

/// A control that can be blanked without writing to its cursor.
pub trait ResetField: Send + Sync {
    /// Show an empty value. Must not propagate to the cursor.
    fn reset_field(&self);
}

/// A named tree of resettable fields, mirroring a form's panel layout.
#[derive(Default)]
pub struct FieldContainer {
    name: String,
    fields: Vec<Arc<dyn ResetField>>,
    children: Vec<FieldContainer>,
}

impl FieldContainer {
    /// Create an empty container.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Add a field, builder style.
    pub fn with_field(mut self, field: Arc<dyn ResetField>) -> Self {
        self.fields.push(field);
        self
    }

    /// Add a nested container, builder style.
    pub fn with_child(mut self, child: FieldContainer) -> Self {
        self.children.push(child);
        self
    }

    /// Add a field.
    pub fn add_field(&mut self, field: Arc<dyn ResetField>) {
        self.fields.push(field);
    }

    /// Add a nested container.
    pub fn add_child(&mut self, child: FieldContainer) {
        self.children.push(child);
    }

    /// The container's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Names of this container and its descendants, depth-first pre-order.
    pub fn container_names(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.collect_names(&mut names);
        names
    }

    fn collect_names<'a>(&'a self, names: &mut Vec<&'a str>) {
        names.push(&self.name);
        for child in &self.children {
            child.collect_names(names);
        }
    }
}

/// Reset every field in `container` and its descendants.
///
/// Visits a container's own fields before its children. Returns the number
/// of fields reset.
pub fn reset_fields(container: &FieldContainer) -> usize {
    let mut count = 0;
    for field in &container.fields {
        field.reset_field();
        count += 1;
    }
    for child in &container.children {
        count += reset_fields(child);
    }
    count
}
