//! Error types for SwingSet.

use std::path::PathBuf;

use crate::cursor::ColumnType;

/// Result type for cursor operations.
pub type CursorResult<T> = std::result::Result<T, CursorError>;

/// Result type for binding operations.
pub type BindingResult<T> = std::result::Result<T, BindingError>;

/// Data-access failures reported by a [`TabularCursor`](crate::cursor::TabularCursor).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CursorError {
    /// The named column does not exist in the result set.
    #[error("no such column '{0}'")]
    NoSuchColumn(String),

    /// The operation needs a current row but the cursor is before the first
    /// or after the last row.
    #[error("cursor is not positioned on a row")]
    NoCurrentRow,

    /// The operation is only valid on the insert row.
    #[error("cursor is not on the insert row")]
    NotOnInsertRow,

    /// An absolute position outside `1..=row_count` was requested.
    #[error("row {row} is out of range (row count {row_count})")]
    RowOutOfRange { row: usize, row_count: usize },

    /// The backing store rejected the operation.
    #[error("data access error: {0}")]
    Backend(String),
}

/// Column text that could not be converted to the bound scalar type.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("cannot convert '{text}' from {column_type} to {target}: {reason}")]
pub struct ConversionError {
    /// The offending text.
    pub text: String,
    /// Name of the Rust type the text was converted to.
    pub target: &'static str,
    /// The declared type of the source column.
    pub column_type: ColumnType,
    /// Parser message.
    pub reason: String,
}

impl ConversionError {
    /// Create a conversion error.
    pub fn new(
        text: impl Into<String>,
        target: &'static str,
        column_type: ColumnType,
        reason: impl ToString,
    ) -> Self {
        Self {
            text: text.into(),
            target,
            column_type,
            reason: reason.to_string(),
        }
    }
}

/// Errors raised by selection and field controllers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BindingError {
    /// A remodel session was opened while another one is still open on the
    /// same store.
    #[error("a remodel session is already open on this store")]
    RemodelActive,

    /// Bulk option assignment received lists of different lengths.
    #[error("{options} options supplied for {mappings} mappings")]
    MismatchedLengths { options: usize, mappings: usize },

    /// A data-access failure.
    #[error(transparent)]
    Cursor(#[from] CursorError),

    /// A type-conversion failure.
    #[error(transparent)]
    Conversion(#[from] ConversionError),
}

/// Errors that can occur while loading or saving configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The TOML text is malformed or does not match the schema.
    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// The configuration could not be serialized.
    #[error("cannot serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// The configuration file could not be read.
    #[error("failed to read configuration '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
