//! SQLite store adapter over a `sqlx` pool.

use std::str::FromStr;

use drift_core::{quote_identifier, ColumnSnapshot, Row, SqlValue, Store};
use sqlx::sqlite::{SqliteArguments, SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{Row as _, TypeInfo, ValueRef};
use tracing::debug;

/// A [`Store`] backed by a SQLite connection pool.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Wraps an existing pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connects to `url`, creating the database file if missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or the database cannot be opened.
    pub async fn connect(url: &str) -> Result<Self, sqlx::Error> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new().connect_with(options).await?;
        Ok(Self::new(pool))
    }

    /// Opens a private in-memory database.
    ///
    /// The pool holds exactly one connection that is never recycled, since
    /// every connection to `:memory:` sees its own database.
    ///
    /// # Errors
    ///
    /// Returns an error if SQLite cannot be opened.
    pub async fn in_memory() -> Result<Self, sqlx::Error> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;
        Ok(Self::new(pool))
    }

    /// Returns the underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Closes every connection of the pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

fn is_insert(statement: &str) -> bool {
    statement
        .trim_start()
        .get(..6)
        .is_some_and(|keyword| keyword.eq_ignore_ascii_case("insert"))
}

/// Binds a SqlValue parameter to a raw query.
fn bind_param<'q>(
    query: sqlx::query::Query<'q, sqlx::Sqlite, SqliteArguments<'q>>,
    value: SqlValue,
) -> sqlx::query::Query<'q, sqlx::Sqlite, SqliteArguments<'q>> {
    match value {
        SqlValue::Null => query.bind(Option::<i64>::None),
        SqlValue::Int(i) => query.bind(i),
        SqlValue::Float(f) => query.bind(f),
        SqlValue::Text(s) => query.bind(s),
        SqlValue::Blob(b) => query.bind(b),
    }
}

fn prepare<'q>(
    statement: &'q str,
    params: &[SqlValue],
) -> sqlx::query::Query<'q, sqlx::Sqlite, SqliteArguments<'q>> {
    params
        .iter()
        .cloned()
        .fold(sqlx::query(statement), bind_param)
}

/// Decodes every column of a row by its storage class.
fn decode_row(row: &SqliteRow) -> Result<Row, sqlx::Error> {
    (0..row.len())
        .map(|index| {
            let raw = row.try_get_raw(index)?;
            if raw.is_null() {
                return Ok(SqlValue::Null);
            }
            let storage = raw.type_info().name().to_string();
            match storage.as_str() {
                "INTEGER" => row.try_get::<i64, _>(index).map(SqlValue::Int),
                "REAL" => row.try_get::<f64, _>(index).map(SqlValue::Float),
                "BLOB" => row.try_get::<Vec<u8>, _>(index).map(SqlValue::Blob),
                _ => row.try_get::<String, _>(index).map(SqlValue::Text),
            }
        })
        .collect()
}

impl Store for SqliteStore {
    type Error = sqlx::Error;

    async fn execute_write(
        &self,
        statement: &str,
        params: &[SqlValue],
    ) -> Result<Option<i64>, Self::Error> {
        debug!(sql = %statement, params = params.len(), "Executing write");
        let result = prepare(statement, params).execute(&self.pool).await?;

        if !is_insert(statement) || result.rows_affected() == 0 {
            return Ok(None);
        }
        let id = result.last_insert_rowid();
        Ok((id > 0).then_some(id))
    }

    async fn query_all(&self, statement: &str) -> Result<Vec<Row>, Self::Error> {
        debug!(sql = %statement, "Executing query");
        let rows = sqlx::query(statement).fetch_all(&self.pool).await?;
        rows.iter().map(decode_row).collect()
    }

    async fn query_one(
        &self,
        statement: &str,
        params: &[SqlValue],
    ) -> Result<Option<Row>, Self::Error> {
        debug!(sql = %statement, params = params.len(), "Executing query");
        let row = prepare(statement, params).fetch_optional(&self.pool).await?;
        row.as_ref().map(decode_row).transpose()
    }

    async fn column_info(&self, table: &str) -> Result<Vec<ColumnSnapshot>, Self::Error> {
        let sql = format!("PRAGMA table_info({})", quote_identifier(table));
        debug!(sql = %sql, "Reading live columns");

        let rows: Vec<(i64, String, String, i64, Option<String>, i64)> =
            sqlx::query_as(&sql).fetch_all(&self.pool).await?;

        rows.into_iter()
            .map(|(cid, name, sql_type, not_null, default_value, pk)| {
                let ordinal = usize::try_from(cid).map_err(|e| sqlx::Error::Decode(Box::new(e)))?;
                Ok(ColumnSnapshot {
                    ordinal,
                    name,
                    sql_type,
                    not_null: not_null != 0,
                    default_value,
                    primary_key: pk != 0,
                })
            })
            .collect()
    }

    async fn execute_batch(&self, script: &str) -> Result<(), Self::Error> {
        debug!(sql = %script, "Executing batch");
        let mut tx = self.pool.begin().await?;
        sqlx::raw_sql(script).execute(&mut *tx).await?;
        tx.commit().await?;
        Ok(())
    }
}
