//! Store adapter trait.
//!
//! Driver crates (drift-sqlite, etc.) implement [`Store`] to execute
//! statements and read live columns. The core crate defines only the
//! trait so it stays driver-agnostic.

use crate::diff::ColumnSnapshot;
use crate::value::SqlValue;

/// One fetched row, values in selected-column order.
pub type Row = Vec<SqlValue>;

/// Executes statements against a database.
///
/// Calls are awaited one at a time; nothing here assumes the store can run
/// statements concurrently.
#[allow(async_fn_in_trait)]
pub trait Store {
    /// Error type for store failures.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Executes a write statement with positional `?` parameters.
    ///
    /// Returns the generated row id of an `INSERT`, and `None` for any
    /// other statement or when no row was inserted.
    async fn execute_write(
        &self,
        statement: &str,
        params: &[SqlValue],
    ) -> Result<Option<i64>, Self::Error>;

    /// Runs a parameterless query and returns every row.
    async fn query_all(&self, statement: &str) -> Result<Vec<Row>, Self::Error>;

    /// Runs a query and returns its first row, if any.
    async fn query_one(
        &self,
        statement: &str,
        params: &[SqlValue],
    ) -> Result<Option<Row>, Self::Error>;

    /// Returns the live columns of `table` in ordinal order, or an empty
    /// list if the table does not exist.
    async fn column_info(&self, table: &str) -> Result<Vec<ColumnSnapshot>, Self::Error>;

    /// Runs a multi-statement script as one unit: all statements apply, or none.
    async fn execute_batch(&self, script: &str) -> Result<(), Self::Error>;
}
