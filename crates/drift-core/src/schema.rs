//! Model schemas: the ordered field list and table name of one model.

use crate::diff::{ColumnSnapshot, SchemaPlan};
use crate::error::{DriftError, Result};
use crate::fields::{Field, FieldKind, IntoField};
use crate::value::{FromSqlValue, SqlValue};

/// Longest accepted table name.
pub const MAX_TABLE_NAME_LENGTH: usize = 128;

/// Quotes an identifier for SQLite.
#[must_use]
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn validate_table_name(name: &str) -> Result<()> {
    if name.is_empty() || name.chars().count() > MAX_TABLE_NAME_LENGTH {
        return Err(DriftError::Naming(format!(
            "Table name must be between 1 and {MAX_TABLE_NAME_LENGTH} characters: {name:?}"
        )));
    }
    if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        || !name.chars().any(|c| c.is_ascii_alphanumeric())
    {
        return Err(DriftError::Naming(format!("Invalid table name: {name:?}")));
    }
    Ok(())
}

/// The declared shape of a model.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelSchema {
    model_name: String,
    table_name: String,
    fields: Vec<Field>,
}

impl ModelSchema {
    /// Starts an empty schema for `model_name`.
    ///
    /// The table is named `table_override` when given, otherwise the
    /// lower-cased model name.
    ///
    /// # Errors
    ///
    /// Returns [`DriftError::Naming`] if the table name is empty, longer
    /// than [`MAX_TABLE_NAME_LENGTH`] or not made of letters, digits and
    /// underscores.
    pub fn new(model_name: &str, table_override: Option<&str>) -> Result<Self> {
        let table_name = table_override.map_or_else(|| model_name.to_lowercase(), str::to_string);
        validate_table_name(&table_name)?;

        Ok(Self {
            model_name: model_name.to_string(),
            table_name,
            fields: Vec::new(),
        })
    }

    /// Registers a field under `name`, after the fields already registered.
    ///
    /// # Errors
    ///
    /// Returns [`DriftError::Naming`] for a duplicate or invalid name or a
    /// field that is already bound, and any error raised building the field.
    pub fn add_field(&mut self, name: &str, field: impl IntoField) -> Result<&mut Self> {
        if self.has_field(name) {
            return Err(DriftError::Naming(format!(
                "Model '{}' already declares field '{name}'",
                self.model_name
            )));
        }

        let mut field = field.into_field()?;
        field.bind_name(name)?;
        self.fields.push(field);
        Ok(self)
    }

    /// Returns the model name.
    #[must_use]
    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    /// Returns the table name.
    #[must_use]
    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// Returns the fields in declaration order.
    #[must_use]
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Looks up a field by name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name() == name)
    }

    /// Returns whether a field with this name is declared.
    #[must_use]
    pub fn has_field(&self, name: &str) -> bool {
        self.field(name).is_some()
    }

    /// Returns the fields of one kind, in declaration order.
    pub fn fields_of_type(&self, kind: FieldKind) -> impl Iterator<Item = &Field> + '_ {
        self.fields.iter().filter(move |f| f.kind() == kind)
    }

    /// Returns the declared column names, in declaration order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.fields.iter().map(Field::name)
    }

    /// Returns the quoted, comma-separated column list for a `SELECT`.
    #[must_use]
    pub fn select_list(&self) -> String {
        self.column_names()
            .map(quote_identifier)
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Returns the single primary key field.
    ///
    /// # Errors
    ///
    /// Returns [`DriftError::Validation`] unless exactly one field is the
    /// primary key.
    pub fn primary_key(&self) -> Result<&Field> {
        self.ensure_single_primary_key()?;
        self.fields.iter().find(|f| f.primary_key()).ok_or_else(|| {
            DriftError::Validation(format!("Model '{}' must have a primary key", self.model_name))
        })
    }

    pub(crate) fn ensure_single_primary_key(&self) -> Result<()> {
        if self.fields.iter().filter(|f| f.primary_key()).count() > 1 {
            return Err(DriftError::Validation(format!(
                "Model '{}' can only have one primary key",
                self.model_name
            )));
        }
        Ok(())
    }

    /// Returns the plan that creates this model's table.
    ///
    /// # Errors
    ///
    /// Returns [`DriftError::Validation`] unless exactly one field is the
    /// primary key.
    pub fn create_plan(&self) -> Result<SchemaPlan> {
        self.primary_key()?;
        Ok(SchemaPlan::create(&self.table_name, self.fields.clone()))
    }

    /// Describes the declared fields the way the store reports live columns.
    #[must_use]
    pub fn column_snapshots(&self) -> Vec<ColumnSnapshot> {
        self.fields
            .iter()
            .enumerate()
            .map(|(ordinal, field)| ColumnSnapshot {
                ordinal,
                ..field.to_column_schema(field.name())
            })
            .collect()
    }

    /// Pairs a fetched row with the declared field names.
    ///
    /// `row` must hold one value per field, in declaration order.
    ///
    /// # Errors
    ///
    /// Returns [`DriftError::RowArityMismatch`] if the counts differ.
    pub fn from_row(&self, row: Vec<SqlValue>) -> Result<Record> {
        if row.len() != self.fields.len() {
            return Err(DriftError::RowArityMismatch {
                table: self.table_name.clone(),
                expected: self.fields.len(),
                found: row.len(),
            });
        }

        let values = self
            .column_names()
            .map(str::to_string)
            .zip(row)
            .collect();
        Ok(Record { values })
    }
}

/// One row, keyed by field name in declaration order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    values: Vec<(String, SqlValue)>,
}

impl Record {
    /// Returns the raw value of a field.
    #[must_use]
    pub fn value(&self, name: &str) -> Option<&SqlValue> {
        self.values.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Returns a field converted to `T`.
    ///
    /// # Errors
    ///
    /// Returns [`DriftError::Naming`] for an unknown field, or the
    /// conversion error of `T`.
    pub fn get<T: FromSqlValue>(&self, name: &str) -> Result<T> {
        let value = self
            .value(name)
            .ok_or_else(|| DriftError::Naming(format!("Record has no field '{name}'")))?;
        T::from_sql_value(value, name)
    }

    /// Iterates over `(name, value)` pairs in declaration order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &SqlValue)> {
        self.values.iter().map(|(n, v)| (n.as_str(), v))
    }

    /// Number of values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns whether the record has no values.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn giraffe() -> ModelSchema {
        let mut schema = ModelSchema::new("Giraffe", None).unwrap();
        schema
            .add_field("id", Field::integer().primary_key())
            .unwrap()
            .add_field("name", Field::string().max_length(10))
            .unwrap()
            .add_field("date", Field::date())
            .unwrap();
        schema
    }

    #[test]
    fn test_table_name_defaults_to_lowercase_model_name() {
        assert_eq!(giraffe().table_name(), "giraffe");
        let schema = ModelSchema::new("Giraffe", Some("giraffes")).unwrap();
        assert_eq!(schema.table_name(), "giraffes");
        assert_eq!(schema.model_name(), "Giraffe");
    }

    #[test]
    fn test_invalid_table_names() {
        let too_long = "t".repeat(MAX_TABLE_NAME_LENGTH + 1);
        for bad in ["", "___", "drop table", "semi;colon", "dash-ed", too_long.as_str()] {
            assert!(
                matches!(ModelSchema::new("M", Some(bad)), Err(DriftError::Naming(_))),
                "{bad:?} should be rejected"
            );
        }
        let longest = "t".repeat(MAX_TABLE_NAME_LENGTH);
        assert!(ModelSchema::new("M", Some(&longest)).is_ok());
        assert!(ModelSchema::new("M", Some("my_table_2")).is_ok());
    }

    #[test]
    fn test_fields_keep_declaration_order() {
        let schema = giraffe();
        let names: Vec<&str> = schema.column_names().collect();
        assert_eq!(names, ["id", "name", "date"]);
        assert_eq!(schema.select_list(), "\"id\", \"name\", \"date\"");
    }

    #[test]
    fn test_duplicate_field_name_rejected() {
        let mut schema = giraffe();
        let err = schema.add_field("name", Field::integer()).unwrap_err();
        assert!(matches!(err, DriftError::Naming(_)));
        assert_eq!(schema.fields().len(), 3);
    }

    #[test]
    fn test_bound_field_cannot_be_registered_again() {
        let schema = giraffe();
        let id = schema.field("id").unwrap().clone();

        let mut other = ModelSchema::new("Other", None).unwrap();
        assert!(matches!(other.add_field("key", id), Err(DriftError::Naming(_))));
    }

    #[test]
    fn test_builder_errors_propagate() {
        let mut schema = ModelSchema::new("Broken", None).unwrap();
        let err = schema
            .add_field("n", Field::integer().default("nope"))
            .unwrap_err();
        assert!(matches!(err, DriftError::TypeMismatch { .. }));
        assert!(schema.fields().is_empty());
    }

    #[test]
    fn test_fields_of_type() {
        let mut schema = giraffe();
        schema.add_field("born", Field::date()).unwrap();

        let dates: Vec<&str> = schema.fields_of_type(FieldKind::Date).map(Field::name).collect();
        assert_eq!(dates, ["date", "born"]);
        assert_eq!(schema.fields_of_type(FieldKind::Float).count(), 0);
    }

    #[test]
    fn test_create_plan() {
        let plan = giraffe().create_plan().unwrap();
        assert_eq!(plan.table_name, "giraffe");
        assert_eq!(plan.create.len(), 3);
        assert!(plan.alter.is_empty());
    }

    #[test]
    fn test_create_plan_requires_exactly_one_primary_key() {
        let mut none = ModelSchema::new("NoKey", None).unwrap();
        none.add_field("a", Field::integer()).unwrap();
        assert!(matches!(none.create_plan(), Err(DriftError::Validation(_))));

        let mut two = ModelSchema::new("TwoKeys", None).unwrap();
        two.add_field("a", Field::integer().primary_key())
            .unwrap()
            .add_field("b", Field::integer().primary_key())
            .unwrap();
        assert!(matches!(two.create_plan(), Err(DriftError::Validation(_))));
    }

    #[test]
    fn test_column_snapshots_carry_ordinals() {
        let snapshots = giraffe().column_snapshots();
        assert_eq!(snapshots.len(), 3);
        assert_eq!(snapshots[2].ordinal, 2);
        assert_eq!(snapshots[2].name, "date");
        assert_eq!(snapshots[2].default_value.as_deref(), Some("CURRENT_TIMESTAMP"));
        assert!(snapshots[0].primary_key);
    }

    #[test]
    fn test_from_row() {
        let record = giraffe()
            .from_row(vec![
                SqlValue::Int(1),
                SqlValue::from("Amazing"),
                SqlValue::from("2024-03-01"),
            ])
            .unwrap();

        assert_eq!(record.len(), 3);
        assert_eq!(record.get::<i64>("id").unwrap(), 1);
        assert_eq!(record.get::<String>("name").unwrap(), "Amazing");
        assert!(matches!(record.get::<i64>("missing"), Err(DriftError::Naming(_))));
        let names: Vec<&str> = record.entries().map(|(n, _)| n).collect();
        assert_eq!(names, ["id", "name", "date"]);
    }

    #[test]
    fn test_from_row_arity_mismatch() {
        let err = giraffe().from_row(vec![SqlValue::Int(1)]).unwrap_err();
        assert!(matches!(
            err,
            DriftError::RowArityMismatch {
                expected: 3,
                found: 1,
                ..
            }
        ));
    }

    #[test]
    fn test_quote_identifier() {
        assert_eq!(quote_identifier("users"), "\"users\"");
        assert_eq!(quote_identifier("we\"ird"), "\"we\"\"ird\"");
    }
}
