//! Error types shared by every drift crate.

use thiserror::Error;

/// Boxed error raised by a store adapter.
pub type StoreError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors raised while declaring models, diffing schemas or running queries.
#[derive(Debug, Error)]
pub enum DriftError {
    /// A value violates a length constraint, or the primary key rule is broken.
    #[error("validation error: {0}")]
    Validation(String),

    /// A value or option does not have the representation its field expects.
    #[error("type mismatch for {field}: expected {expected}, found {found}")]
    TypeMismatch {
        /// Field (or option) name.
        field: String,
        /// Expected representation.
        expected: &'static str,
        /// What was supplied.
        found: String,
    },

    /// Invalid table or field identifier, or a field bound twice.
    #[error("naming error: {0}")]
    Naming(String),

    /// `latest()` could not resolve a date field to order by.
    #[error("cannot resolve ordering field: {0}")]
    AmbiguousOrderingField(String),

    /// An insert did not yield a generated row identifier.
    #[error("failed to create record in '{table}'")]
    CreationFailed {
        /// Target table.
        table: String,
    },

    /// A fetched row does not have one value per declared field.
    #[error("row has {found} values but model '{table}' declares {expected} fields")]
    RowArityMismatch {
        /// Model table.
        table: String,
        /// Declared field count.
        expected: usize,
        /// Values in the row.
        found: usize,
    },

    /// The store adapter failed.
    #[error("store error: {0}")]
    Store(#[source] StoreError),
}

impl DriftError {
    /// Wraps an adapter error.
    pub fn store(err: impl Into<StoreError>) -> Self {
        Self::Store(err.into())
    }
}

/// Result type alias for drift operations.
pub type Result<T> = std::result::Result<T, DriftError>;
