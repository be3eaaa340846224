//! Model trait and the per-type schema registry.
//!
//! A model declares its fields once, through explicit
//! [`ModelSchema::add_field`] calls in [`Model::define`]. The resulting
//! schema is stored in a process-wide registry keyed by the model's type,
//! so two models never share a field list.

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use drift_core::{ModelSchema, Record, Result};
use tracing::debug;

use crate::query::Query;

/// A database model.
///
/// # Example
///
/// ```rust
/// use drift_core::{Field, ModelSchema, Record, Result};
/// use drift_orm::Model;
///
/// struct Giraffe {
///     id: i64,
///     name: Option<String>,
/// }
///
/// impl Model for Giraffe {
///     const NAME: &'static str = "Giraffe";
///
///     fn define(schema: &mut ModelSchema) -> Result<()> {
///         schema
///             .add_field("id", Field::integer().primary_key())?
///             .add_field("name", Field::string().max_length(10))?;
///         Ok(())
///     }
///
///     fn from_record(record: &Record) -> Result<Self> {
///         Ok(Self {
///             id: record.get("id")?,
///             name: record.get("name")?,
///         })
///     }
/// }
///
/// let schema = Giraffe::schema().unwrap();
/// assert_eq!(schema.table_name(), "giraffe");
/// ```
pub trait Model: Sized + 'static {
    /// Model name. The default table name is its lower-cased form.
    const NAME: &'static str;

    /// Explicit table name.
    const TABLE: Option<&'static str> = None;

    /// Registers the model's fields, in column order.
    ///
    /// # Errors
    ///
    /// Propagates field construction and registration errors.
    fn define(schema: &mut ModelSchema) -> Result<()>;

    /// Builds an instance from a fetched row.
    ///
    /// # Errors
    ///
    /// Returns an error if a value is missing or has the wrong type.
    fn from_record(record: &Record) -> Result<Self>;

    /// Returns the model's schema, building it on first use.
    ///
    /// # Errors
    ///
    /// Returns the error raised by [`Model::define`] or by table name
    /// validation. Failures are not cached.
    fn schema() -> Result<Arc<ModelSchema>> {
        schema_for::<Self>()
    }

    /// Returns a new query builder for this model.
    #[must_use]
    fn query() -> Query<Self> {
        Query::new()
    }
}

type Registry = Mutex<HashMap<TypeId, Arc<ModelSchema>>>;

static REGISTRY: OnceLock<Registry> = OnceLock::new();

fn registry() -> &'static Registry {
    REGISTRY.get_or_init(Registry::default)
}

fn schema_for<M: Model>() -> Result<Arc<ModelSchema>> {
    let key = TypeId::of::<M>();

    if let Some(schema) = registry()
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .get(&key)
    {
        return Ok(Arc::clone(schema));
    }

    // Built outside the lock so `define` may resolve other models.
    let mut schema = ModelSchema::new(M::NAME, M::TABLE)?;
    M::define(&mut schema)?;
    debug!(
        model = M::NAME,
        table = schema.table_name(),
        fields = schema.fields().len(),
        "Registered model schema"
    );

    let mut map = registry().lock().unwrap_or_else(PoisonError::into_inner);
    Ok(Arc::clone(map.entry(key).or_insert_with(|| Arc::new(schema))))
}
