//! Query builder: insert-and-reload and "latest row" lookups.

use std::fmt;
use std::marker::PhantomData;

use drift_core::{
    quote_identifier, DriftError, Field, FieldKind, ModelSchema, Result, SqlValue, Store,
    ToSqlValue,
};
use tracing::debug;

use crate::model::Model;

/// Column values for an insert, in caller order.
///
/// Setting a name twice replaces the earlier value in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InsertValues {
    values: Vec<(String, SqlValue)>,
}

impl InsertValues {
    /// Creates an empty set of values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a value, builder style.
    #[must_use]
    pub fn set(mut self, name: impl Into<String>, value: impl ToSqlValue) -> Self {
        self.insert(name, value);
        self
    }

    /// Sets a value.
    pub fn insert(&mut self, name: impl Into<String>, value: impl ToSqlValue) {
        let name = name.into();
        let value = value.to_sql_value();
        match self.values.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.values.push((name, value)),
        }
    }

    /// Number of values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns whether no value is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterates over `(name, value)` pairs in caller order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &SqlValue)> {
        self.values.iter().map(|(n, v)| (n.as_str(), v))
    }
}

impl<K: Into<String>, V: ToSqlValue> FromIterator<(K, V)> for InsertValues {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut values = Self::new();
        for (name, value) in iter {
            values.insert(name, value);
        }
        values
    }
}

/// Something that names a field: a name or a field descriptor.
pub trait FieldRef {
    /// Returns the field name.
    fn field_name(&self) -> &str;
}

impl FieldRef for &str {
    fn field_name(&self) -> &str {
        self
    }
}

impl FieldRef for String {
    fn field_name(&self) -> &str {
        self
    }
}

impl FieldRef for &Field {
    fn field_name(&self) -> &str {
        self.name()
    }
}

/// Query builder for one model.
///
/// Remembers the field the last successful [`Query::latest`] or
/// [`Query::latest_by`] ordered by, so later calls without an explicit field
/// reuse it. The cache is plain per-instance state: share
/// a builder across tasks only behind external synchronization.
pub struct Query<M: Model> {
    ordering_field: Option<String>,
    _marker: PhantomData<fn() -> M>,
}

impl<M: Model> fmt::Debug for Query<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Query")
            .field("model", &M::NAME)
            .field("ordering_field", &self.ordering_field)
            .finish()
    }
}

impl<M: Model> Clone for Query<M> {
    fn clone(&self) -> Self {
        Self {
            ordering_field: self.ordering_field.clone(),
            _marker: PhantomData,
        }
    }
}

impl<M: Model> Default for Query<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: Model> Query<M> {
    /// Creates a query builder with no cached ordering field.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            ordering_field: None,
            _marker: PhantomData,
        }
    }

    /// Returns the ordering field resolved by an earlier [`Query::latest`].
    #[must_use]
    pub fn cached_ordering_field(&self) -> Option<&str> {
        self.ordering_field.as_deref()
    }

    /// Forgets the cached ordering field.
    pub fn clear_ordering_field(&mut self) {
        self.ordering_field = None;
    }

    /// Inserts a row and returns it as stored, generated id and defaults included.
    ///
    /// Every value is checked against its field before anything is written.
    ///
    /// # Errors
    ///
    /// - [`DriftError::Validation`] if `values` is empty or a value fails its field's checks.
    /// - [`DriftError::TypeMismatch`] if a value has the wrong representation.
    /// - [`DriftError::Naming`] if a name is not a field of the model.
    /// - [`DriftError::CreationFailed`] if the store reports no generated id
    ///   or the inserted row cannot be read back.
    /// - [`DriftError::Store`] if the store fails.
    pub async fn create<S: Store>(&self, store: &S, values: InsertValues) -> Result<M> {
        let schema = M::schema()?;
        let (sql, params) = insert_sql(&schema, &values)?;

        let id = store
            .execute_write(&sql, &params)
            .await
            .map_err(DriftError::store)?
            .filter(|id| *id > 0)
            .ok_or_else(|| DriftError::CreationFailed {
                table: schema.table_name().to_string(),
            })?;
        debug!(table = schema.table_name(), id, "Inserted row");

        let select = format!(
            "SELECT {} FROM {} WHERE rowid = ?",
            schema.select_list(),
            quote_identifier(schema.table_name())
        );
        let row = store
            .query_one(&select, &[SqlValue::Int(id)])
            .await
            .map_err(DriftError::store)?
            .ok_or_else(|| DriftError::CreationFailed {
                table: schema.table_name().to_string(),
            })?;

        M::from_record(&schema.from_row(row)?)
    }

    /// Returns the row with the greatest value of the model's ordering field.
    ///
    /// The field is the one cached by the last successful call, or else the
    /// first DATE field the model declares. Returns `None` for an empty table.
    ///
    /// # Errors
    ///
    /// Returns [`DriftError::AmbiguousOrderingField`] if the model declares
    /// no DATE field, and store or reconstruction errors.
    pub async fn latest<S: Store>(&mut self, store: &S) -> Result<Option<M>> {
        self.fetch_latest(store, None).await
    }

    /// Like [`Query::latest`], ordering by `field`.
    ///
    /// On success `field` replaces the cached ordering field.
    ///
    /// # Errors
    ///
    /// Returns [`DriftError::AmbiguousOrderingField`] if `field` is not a
    /// DATE field of the model, and store or reconstruction errors.
    pub async fn latest_by<S: Store>(
        &mut self,
        store: &S,
        field: impl FieldRef,
    ) -> Result<Option<M>> {
        self.fetch_latest(store, Some(field.field_name())).await
    }

    async fn fetch_latest<S: Store>(
        &mut self,
        store: &S,
        explicit: Option<&str>,
    ) -> Result<Option<M>> {
        let schema = M::schema()?;
        let field = self.resolve_ordering_field(&schema, explicit)?;

        let sql = format!(
            "SELECT {} FROM {} ORDER BY {} DESC LIMIT 1",
            schema.select_list(),
            quote_identifier(schema.table_name()),
            quote_identifier(&field)
        );
        let row = store.query_one(&sql, &[]).await.map_err(DriftError::store)?;
        let latest = row
            .map(|row| M::from_record(&schema.from_row(row)?))
            .transpose()?;

        if self.ordering_field.as_deref() != Some(field.as_str()) {
            debug!(model = M::NAME, field = %field, "Caching ordering field");
            self.ordering_field = Some(field);
        }
        Ok(latest)
    }

    /// Picks the ordering field: the explicit argument, then the cache,
    /// then the first DATE field.
    fn resolve_ordering_field(
        &self,
        schema: &ModelSchema,
        explicit: Option<&str>,
    ) -> Result<String> {
        if let Some(name) = explicit {
            return match schema.field(name) {
                Some(field) if field.kind() == FieldKind::Date => Ok(name.to_string()),
                Some(_) => Err(DriftError::AmbiguousOrderingField(format!(
                    "'{name}' is not a date field of model '{}'",
                    M::NAME
                ))),
                None => Err(DriftError::AmbiguousOrderingField(format!(
                    "model '{}' has no field '{name}'",
                    M::NAME
                ))),
            };
        }

        if let Some(cached) = &self.ordering_field {
            return Ok(cached.clone());
        }

        schema
            .fields_of_type(FieldKind::Date)
            .next()
            .map(|field| field.name().to_string())
            .ok_or_else(|| {
                DriftError::AmbiguousOrderingField(format!(
                    "model '{}' declares no date field",
                    M::NAME
                ))
            })
    }
}

/// Builds the parameterized insert for `values`, checking each one.
fn insert_sql(schema: &ModelSchema, values: &InsertValues) -> Result<(String, Vec<SqlValue>)> {
    if values.is_empty() {
        return Err(DriftError::Validation(format!(
            "No values supplied to create a '{}' row",
            schema.model_name()
        )));
    }

    let mut columns = Vec::with_capacity(values.len());
    let mut params = Vec::with_capacity(values.len());
    for (name, value) in values.entries() {
        let field = schema.field(name).ok_or_else(|| {
            DriftError::Naming(format!(
                "Model '{}' has no field '{name}'",
                schema.model_name()
            ))
        })?;
        field.check_value(value)?;

        columns.push(quote_identifier(name));
        params.push(value.clone());
    }

    let placeholders = vec![SqlValue::placeholder(); params.len()].join(", ");
    let sql = format!(
        "INSERT INTO {} ({}) VALUES ({placeholders})",
        quote_identifier(schema.table_name()),
        columns.join(", ")
    );
    Ok((sql, params))
}
