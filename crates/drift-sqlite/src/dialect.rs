//! SQLite DDL for schema plans.
//!
//! SQLite can rename a column or append one in place, but it cannot change
//! a column's type, nullability, default or key flags, and dropping columns
//! is restricted. Plans holding such changes are applied with the "table
//! rebuild" strategy: create a new table with the declared columns, copy
//! the surviving data, drop the old table and rename the new one.

use drift_core::{quote_identifier, DefaultValue, Field, ModelSchema, SchemaChange, SchemaPlan};
use tracing::warn;

/// Prefix of the scratch table used while rebuilding a table.
pub const REBUILD_PREFIX: &str = "_drift_new_";

/// SQLite migration dialect.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteDialect;

impl SqliteDialect {
    /// Creates a new SQLite dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Returns the dialect name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        "sqlite"
    }

    /// Generates the column definition for a field.
    ///
    /// The rendered type and default are exactly what `PRAGMA table_info`
    /// reports back, so a created column diffs as unchanged.
    #[must_use]
    pub fn column_definition(&self, field: &Field) -> String {
        let mut parts = vec![quote_identifier(field.name()), field.sql_type().to_string()];

        if field.primary_key() {
            parts.push("PRIMARY KEY".to_string());
        }
        if !field.nullable() {
            parts.push("NOT NULL".to_string());
        }
        if field.unique() && !field.primary_key() {
            parts.push("UNIQUE".to_string());
        }
        if let Some(default_sql) = field.default_value().to_sql() {
            parts.push(format!("DEFAULT {default_sql}"));
        }

        parts.join(" ")
    }

    /// Generates SQL for creating a table.
    #[must_use]
    pub fn create_table_sql(&self, table: &str, fields: &[Field]) -> String {
        let columns: Vec<String> = fields.iter().map(|f| self.column_definition(f)).collect();
        format!(
            "CREATE TABLE {} (\n  {}\n)",
            quote_identifier(table),
            columns.join(",\n  ")
        )
    }

    /// Generates SQL for adding a column.
    #[must_use]
    pub fn add_column_sql(&self, table: &str, field: &Field) -> String {
        format!(
            "ALTER TABLE {} ADD COLUMN {}",
            quote_identifier(table),
            self.column_definition(field)
        )
    }

    /// Generates SQL for renaming a column (SQLite 3.25.0+).
    #[must_use]
    pub fn rename_column_sql(&self, table: &str, old_name: &str, new_name: &str) -> String {
        format!(
            "ALTER TABLE {} RENAME COLUMN {} TO {}",
            quote_identifier(table),
            quote_identifier(old_name),
            quote_identifier(new_name)
        )
    }

    /// Generates SQL for dropping a table.
    #[must_use]
    pub fn drop_table_sql(&self, table: &str) -> String {
        format!("DROP TABLE {}", quote_identifier(table))
    }

    /// Generates SQL for renaming a table.
    #[must_use]
    pub fn rename_table_sql(&self, old_name: &str, new_name: &str) -> String {
        format!(
            "ALTER TABLE {} RENAME TO {}",
            quote_identifier(old_name),
            quote_identifier(new_name)
        )
    }

    /// Returns whether `ALTER TABLE ... ADD COLUMN` can add this field.
    ///
    /// SQLite rejects added primary keys, UNIQUE columns, non-constant
    /// defaults and NOT NULL columns without a default.
    #[must_use]
    pub fn can_add_in_place(&self, field: &Field) -> bool {
        let constant_default = !matches!(field.default_value(), DefaultValue::Expression(_));
        let not_null_ok = field.nullable() || field.default_value().is_some();
        !field.primary_key() && !field.unique() && constant_default && not_null_ok
    }

    /// Returns whether applying `plan` needs the table rebuild strategy.
    #[must_use]
    pub fn needs_rebuild(&self, plan: &SchemaPlan) -> bool {
        plan.alter.iter().any(|change| match change {
            SchemaChange::Rename { .. } => false,
            SchemaChange::Add(field) => !self.can_add_in_place(field),
            SchemaChange::Create { .. } | SchemaChange::Alter(_) | SchemaChange::Drop { .. } => {
                true
            }
        })
    }

    /// Renders the statements that apply `plan` to the table of `schema`.
    ///
    /// An empty plan renders no statements.
    #[must_use]
    pub fn render(&self, schema: &ModelSchema, plan: &SchemaPlan) -> Vec<String> {
        if plan.is_create() {
            return vec![self.create_table_sql(&plan.table_name, &plan.create)];
        }
        if plan.alter.is_empty() {
            return Vec::new();
        }
        if self.needs_rebuild(plan) {
            return self.rebuild_sql(schema, plan);
        }

        let mut statements = Vec::new();
        for change in &plan.alter {
            if let SchemaChange::Rename { old_name, new_name } = change {
                statements.push(self.rename_column_sql(&plan.table_name, old_name, new_name));
            }
        }
        for change in &plan.alter {
            if let SchemaChange::Add(field) = change {
                statements.push(self.add_column_sql(&plan.table_name, field));
            }
        }
        statements
    }

    /// Rebuilds the table with the declared columns, copying each one from
    /// its live column (same name, or the source of a rename). Added columns
    /// start from their defaults.
    fn rebuild_sql(&self, schema: &ModelSchema, plan: &SchemaPlan) -> Vec<String> {
        let table = plan.table_name.as_str();
        let scratch = format!("{REBUILD_PREFIX}{table}");

        let dropped: Vec<&str> = plan
            .alter
            .iter()
            .filter_map(|change| match change {
                SchemaChange::Drop { name } => Some(name.as_str()),
                _ => None,
            })
            .collect();
        if dropped.is_empty() {
            warn!(table, "Rebuilding table to apply column changes");
        } else {
            warn!(table, columns = ?dropped, "Rebuilding table, dropped columns lose their data");
        }

        let mut targets = Vec::new();
        let mut sources = Vec::new();
        for field in schema.fields() {
            let added = plan
                .alter
                .iter()
                .any(|c| matches!(c, SchemaChange::Add(f) if f.name() == field.name()));
            if added {
                continue;
            }

            let source = plan
                .alter
                .iter()
                .find_map(|change| match change {
                    SchemaChange::Rename { old_name, new_name } if new_name == field.name() => {
                        Some(old_name.as_str())
                    }
                    _ => None,
                })
                .unwrap_or_else(|| field.name());

            targets.push(quote_identifier(field.name()));
            sources.push(quote_identifier(source));
        }

        let mut statements = vec![self.create_table_sql(&scratch, schema.fields())];
        if !targets.is_empty() {
            statements.push(format!(
                "INSERT INTO {} ({}) SELECT {} FROM {}",
                quote_identifier(&scratch),
                targets.join(", "),
                sources.join(", "),
                quote_identifier(table)
            ));
        }
        statements.push(self.drop_table_sql(table));
        statements.push(self.rename_table_sql(&scratch, table));
        statements
    }
}

/// Joins statements into one script for [`Store::execute_batch`](drift_core::Store::execute_batch).
#[must_use]
pub fn to_script(statements: &[String]) -> String {
    statements
        .iter()
        .map(|sql| format!("{sql};"))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use drift_core::{compute_changes, ColumnSnapshot};

    fn giraffe(name_field: &str) -> ModelSchema {
        let mut schema = ModelSchema::new("Giraffe", None).unwrap();
        schema
            .add_field("id", Field::integer().primary_key())
            .unwrap()
            .add_field(name_field, Field::string().max_length(10))
            .unwrap()
            .add_field("date", Field::date())
            .unwrap();
        schema
    }

    fn column(ordinal: usize, name: &str, sql_type: &str) -> ColumnSnapshot {
        ColumnSnapshot {
            ordinal,
            name: name.to_string(),
            sql_type: sql_type.to_string(),
            not_null: false,
            default_value: None,
            primary_key: false,
        }
    }

    #[test]
    fn test_column_definition() {
        let dialect = SqliteDialect::new();
        let mut schema = ModelSchema::new("M", None).unwrap();
        schema
            .add_field("id", Field::integer().primary_key())
            .unwrap()
            .add_field("email", Field::string().max_length(50).not_null().unique())
            .unwrap()
            .add_field("title", Field::string().default("it's"))
            .unwrap()
            .add_field("date", Field::date())
            .unwrap();

        let defs: Vec<String> = schema
            .fields()
            .iter()
            .map(|f| dialect.column_definition(f))
            .collect();
        assert_eq!(
            defs,
            [
                "\"id\" INTEGER PRIMARY KEY",
                "\"email\" VARCHAR(50) NOT NULL UNIQUE",
                "\"title\" VARCHAR(255) DEFAULT 'it''s'",
                "\"date\" DATE DEFAULT CURRENT_TIMESTAMP",
            ]
        );
    }

    #[test]
    fn test_render_create() {
        let schema = giraffe("name");
        let plan = compute_changes(&schema, &[]).unwrap();
        let sql = SqliteDialect::new().render(&schema, &plan);
        assert_eq!(
            sql,
            [concat!(
                "CREATE TABLE \"giraffe\" (\n",
                "  \"id\" INTEGER PRIMARY KEY,\n",
                "  \"name\" VARCHAR(10),\n",
                "  \"date\" DATE DEFAULT CURRENT_TIMESTAMP\n",
                ")"
            )]
        );
    }

    #[test]
    fn test_render_empty_plan() {
        let schema = giraffe("name");
        let plan = compute_changes(&schema, &schema.column_snapshots()).unwrap();
        assert!(SqliteDialect::new().render(&schema, &plan).is_empty());
    }

    #[test]
    fn test_render_rename_in_place() {
        let live = giraffe("name").column_snapshots();
        let schema = giraffe("nickname");
        let plan = compute_changes(&schema, &live).unwrap();

        let sql = SqliteDialect::new().render(&schema, &plan);
        assert_eq!(
            sql,
            ["ALTER TABLE \"giraffe\" RENAME COLUMN \"name\" TO \"nickname\""]
        );
    }

    #[test]
    fn test_render_simple_add_in_place() {
        let mut schema = giraffe("name");
        let live = schema.column_snapshots();
        schema.add_field("height", Field::float().not_null().default(4.5)).unwrap();

        let plan = compute_changes(&schema, &live).unwrap();
        let sql = SqliteDialect::new().render(&schema, &plan);
        assert_eq!(
            sql,
            ["ALTER TABLE \"giraffe\" ADD COLUMN \"height\" FLOAT NOT NULL DEFAULT 4.5"]
        );
    }

    #[test]
    fn test_render_drop_rebuilds() {
        let schema = giraffe("name");
        let mut live = schema.column_snapshots();
        live.push(column(3, "legacy", "VARCHAR(5)"));

        let plan = compute_changes(&schema, &live).unwrap();
        let sql = SqliteDialect::new().render(&schema, &plan);

        assert_eq!(sql.len(), 4);
        assert!(sql[0].starts_with("CREATE TABLE \"_drift_new_giraffe\""));
        assert_eq!(
            sql[1],
            concat!(
                "INSERT INTO \"_drift_new_giraffe\" (\"id\", \"name\", \"date\") ",
                "SELECT \"id\", \"name\", \"date\" FROM \"giraffe\""
            )
        );
        assert_eq!(sql[2], "DROP TABLE \"giraffe\"");
        assert_eq!(sql[3], "ALTER TABLE \"_drift_new_giraffe\" RENAME TO \"giraffe\"");
    }

    #[test]
    fn test_rebuild_copies_from_rename_source_and_skips_added() {
        let mut live = giraffe("name").column_snapshots();
        live.push(column(3, "legacy", "INTEGER"));

        let mut schema = giraffe("nickname");
        schema.add_field("born", Field::date()).unwrap();

        let plan = compute_changes(&schema, &live).unwrap();
        let sql = SqliteDialect::new().render(&schema, &plan);
        assert_eq!(
            sql[1],
            concat!(
                "INSERT INTO \"_drift_new_giraffe\" (\"id\", \"nickname\", \"date\") ",
                "SELECT \"id\", \"name\", \"date\" FROM \"giraffe\""
            )
        );
    }

    #[test]
    fn test_can_add_in_place() {
        let dialect = SqliteDialect::new();
        let plain = Field::integer().build().unwrap();
        let keyed = Field::integer().primary_key().build().unwrap();
        let unique = Field::string().unique().build().unwrap();
        let dated = Field::date().build().unwrap();
        let required = Field::integer().not_null().build().unwrap();
        let required_default = Field::integer().not_null().default(0).build().unwrap();

        assert!(dialect.can_add_in_place(&plain));
        assert!(!dialect.can_add_in_place(&keyed));
        assert!(!dialect.can_add_in_place(&unique));
        assert!(!dialect.can_add_in_place(&dated));
        assert!(!dialect.can_add_in_place(&required));
        assert!(dialect.can_add_in_place(&required_default));
    }

    #[test]
    fn test_to_script() {
        let script = to_script(&[
            "CREATE TABLE a (x INTEGER)".to_string(),
            "DROP TABLE b".to_string(),
        ]);
        assert_eq!(script, "CREATE TABLE a (x INTEGER);\nDROP TABLE b;");
    }
}
