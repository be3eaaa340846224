//! # drift-orm
//!
//! Models on top of drift-core schemas.
//!
//! - [`Model`] declares a type's fields once, through explicit registration
//!   calls, and resolves its schema from a per-type registry.
//! - [`Query`] inserts rows (`create`) and fetches the most recent one
//!   (`latest`) through any [`Store`](drift_core::Store).
//! - [`Migration`] is an optional model for recording applied migrations.
//!
//! ```rust,ignore
//! let giraffe = Giraffe::query()
//!     .create(&store, InsertValues::new().set("name", "Amazing").set("date", "2024-01-01"))
//!     .await?;
//!
//! let mut query = Giraffe::query();
//! let newest = query.latest(&store).await?;
//! ```

pub mod migration;
pub mod model;
pub mod query;

pub use migration::Migration;
pub use model::Model;
pub use query::{FieldRef, InsertValues, Query};
