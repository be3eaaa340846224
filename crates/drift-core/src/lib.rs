//! # drift-core
//!
//! Field descriptors, model schemas and the schema diff engine.
//!
//! A model is declared as an ordered list of [`Field`]s registered on a
//! [`ModelSchema`]. [`compute_changes`] compares that declaration with the
//! live columns a [`Store`] reports and returns the [`SchemaPlan`] that
//! reconciles them:
//!
//! ```rust
//! use drift_core::{compute_changes, Field, ModelSchema, SchemaChange};
//!
//! let mut schema = ModelSchema::new("Giraffe", None).unwrap();
//! schema
//!     .add_field("id", Field::integer().primary_key()).unwrap()
//!     .add_field("name", Field::string().max_length(10)).unwrap();
//!
//! // No live columns: the table gets created.
//! let plan = compute_changes(&schema, &[]).unwrap();
//! assert_eq!(plan.create.len(), 2);
//!
//! // The live table still has an old column.
//! let mut live = schema.column_snapshots();
//! let mut legacy = live[1].clone();
//! legacy.name = "legacy".into();
//! legacy.sql_type = "INTEGER".into();
//! live.push(legacy);
//!
//! let plan = compute_changes(&schema, &live).unwrap();
//! assert_eq!(plan.alter, vec![SchemaChange::Drop { name: "legacy".into() }]);
//! ```
//!
//! This crate performs no I/O. Driver crates implement [`Store`].

pub mod diff;
pub mod error;
pub mod fields;
pub mod schema;
pub mod store;
pub mod value;

pub use diff::{compute_changes, ColumnChanges, ColumnSnapshot, SchemaChange, SchemaPlan};
pub use error::{DriftError, Result, StoreError};
pub use fields::{DefaultValue, Field, FieldBuilder, FieldKind, IntoField, SqlType};
pub use schema::{quote_identifier, ModelSchema, Record};
pub use store::{Row, Store};
pub use value::{FromSqlValue, SqlValue, ToSqlValue};
