//! Error types for schema sync.

use drift_core::DriftError;

/// Errors that can occur while syncing a model's table.
#[derive(Debug, thiserror::Error)]
pub enum MigrateError {
    /// Database error while reading or altering the schema.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The model declaration is invalid.
    #[error("Schema error: {0}")]
    Schema(#[from] DriftError),

    /// The plan would drop columns and destructive changes are disabled.
    #[error("Refusing to drop columns {columns:?} from '{table}'")]
    DestructiveChange {
        /// Target table.
        table: String,
        /// Columns the plan would drop.
        columns: Vec<String>,
    },
}

/// Result type for schema sync operations.
pub type Result<T> = std::result::Result<T, MigrateError>;
