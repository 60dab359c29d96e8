use thiserror::Error;

use crate::schema::ColumnType;

/// Errors that can occur while building, bootstrapping, or querying tables.
#[derive(Debug, Error)]
pub enum TableError {
    /// An error originating from the underlying SQLite database.
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// An error reported by a non-SQLite [`SqlEngine`](crate::SqlEngine).
    #[error("Engine error: {0}")]
    Engine(String),

    /// A typed column was built from a structure declaring another type.
    #[error("Type mismatch for column '{column}': expected {expected}, got {actual}")]
    TypeMismatch {
        column: String,
        expected: ColumnType,
        actual: ColumnType,
    },

    /// A key, join, or query reference could not be resolved by name.
    #[error("Could not resolve {what}: {name}")]
    Resolution { what: &'static str, name: String },

    /// A table could not be created, or an expected table is missing.
    #[error("Schema bootstrap failed for table '{table}': {reason}")]
    SchemaBootstrap { table: String, reason: String },

    /// A single-row insert produced no persisted row.
    #[error("Insert into '{0}' returned no rows")]
    NoRowsReturned(String),

    /// The provided schema is invalid (e.g., no columns, duplicate names).
    #[error("Invalid schema: {0}")]
    InvalidSchema(String),

    /// An error occurred while reading or parsing a schema file.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl TableError {
    pub(crate) fn unresolved(what: &'static str, name: impl Into<String>) -> Self {
        Self::Resolution {
            what,
            name: name.into(),
        }
    }
}

impl From<serde_json::Error> for TableError {
    fn from(e: serde_json::Error) -> Self {
        Self::SerializationError(e.to_string())
    }
}
