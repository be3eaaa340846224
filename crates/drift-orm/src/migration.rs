//! The `migrations` convenience model.
//!
//! drift itself keeps no migration history. Applications that want one can
//! sync this model and record a row per applied change.

use chrono::NaiveDateTime;
use drift_core::{Field, ModelSchema, Record, Result, Store};

use crate::model::Model;
use crate::query::InsertValues;

/// One applied migration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Migration {
    /// Generated id.
    pub id: i64,
    /// Short migration name, 1 to 10 characters.
    pub name: String,
    /// When the row was recorded.
    pub applied_at: NaiveDateTime,
}

impl Model for Migration {
    const NAME: &'static str = "Migration";
    const TABLE: Option<&'static str> = Some("migrations");

    fn define(schema: &mut ModelSchema) -> Result<()> {
        schema
            .add_field("id", Field::integer().primary_key())?
            .add_field("name", Field::string().min_length(1).max_length(10).not_null())?
            .add_field("applied_at", Field::date().not_null())?;
        Ok(())
    }

    fn from_record(record: &Record) -> Result<Self> {
        Ok(Self {
            id: record.get("id")?,
            name: record.get("name")?,
            applied_at: record.get("applied_at")?,
        })
    }
}

impl Migration {
    /// Records `name` as applied now.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an empty or over-long name, and
    /// store errors.
    pub async fn record<S: Store>(store: &S, name: &str) -> Result<Self> {
        Self::query()
            .create(store, InsertValues::new().set("name", name))
            .await
    }

    /// Returns the most recently applied migration.
    ///
    /// # Errors
    ///
    /// Returns store or reconstruction errors.
    pub async fn last_applied<S: Store>(store: &S) -> Result<Option<Self>> {
        Self::query().latest(store).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use drift_core::FieldKind;

    #[test]
    fn test_migration_schema() {
        let schema = Migration::schema().unwrap();
        assert_eq!(schema.table_name(), "migrations");

        let names: Vec<&str> = schema.column_names().collect();
        assert_eq!(names, ["id", "name", "applied_at"]);

        let name = schema.field("name").unwrap();
        assert_eq!(name.min_length(), Some(1));
        assert_eq!(name.max_length(), Some(10));
        assert_eq!(schema.fields_of_type(FieldKind::Date).count(), 1);
        assert!(schema.create_plan().is_ok());
    }
}
