//! # drift-sqlite
//!
//! SQLite backend for drift models.
//!
//! - [`SqliteStore`] implements the [`Store`](drift_core::Store) adapter over
//!   a `sqlx` pool.
//! - [`SqliteDialect`] renders a [`SchemaPlan`](drift_core::SchemaPlan) to
//!   SQLite DDL, rebuilding the table when `ALTER TABLE` cannot express it.
//! - [`Migrator`] reads the live columns of a model's table, diffs them
//!   against the declaration and applies the result in one transaction.
//!
//! ```rust,no_run
//! use drift_core::{Field, ModelSchema};
//! use drift_sqlite::{Migrator, SqliteStore};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let mut schema = ModelSchema::new("Giraffe", None)?;
//! schema
//!     .add_field("id", Field::integer().primary_key())?
//!     .add_field("name", Field::string().max_length(10))?;
//!
//! let store = SqliteStore::connect("sqlite:zoo.db").await?;
//! let outcome = Migrator::new(store).sync_schema(&schema).await?;
//! println!("{} statements applied", outcome.statements.len());
//! # Ok(())
//! # }
//! ```

pub mod dialect;
pub mod error;
pub mod migrator;
pub mod store;

pub use dialect::{to_script, SqliteDialect};
pub use error::{MigrateError, Result};
pub use migrator::{Migrator, SyncOutcome};
pub use store::SqliteStore;
