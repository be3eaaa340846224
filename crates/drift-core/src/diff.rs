//! Schema diff engine.
//!
//! Compares the live columns of a table (as reported by the store) with the
//! fields a [`ModelSchema`] declares and produces the [`SchemaPlan`] that
//! brings the table in line with the declaration.
//!
//! The plan is ordered: alterations, drops and renames appear in live-column
//! order, followed by additions in declaration order. A dropped column whose
//! type, nullability, default and primary-key flag all match an undeclared
//! field is reported as a rename of that column instead of a drop plus an
//! add. Matching is first-match: each new field claims the earliest
//! compatible dropped column, and a dropped column can be claimed once.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;
use crate::fields::{DefaultValue, Field, SqlType};
use crate::schema::ModelSchema;

/// A live column, in the shape of SQLite's `PRAGMA table_info`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSnapshot {
    /// Position of the column in the table.
    pub ordinal: usize,
    /// Column name.
    pub name: String,
    /// Declared type as reported by the store.
    #[serde(rename = "type")]
    pub sql_type: String,
    /// Whether the column is NOT NULL.
    #[serde(rename = "notnull")]
    pub not_null: bool,
    /// Default value as SQL text, e.g. `'abc'` or `CURRENT_TIMESTAMP`.
    #[serde(rename = "dflt_value")]
    pub default_value: Option<String>,
    /// Whether the column is (part of) the primary key.
    #[serde(rename = "pk")]
    pub primary_key: bool,
}

/// The attributes of one column that differ from its declaration.
///
/// Each set attribute carries the declared (target) value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnChanges {
    /// Name of the live column.
    pub name: String,
    /// New data type (if changing).
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub sql_type: Option<SqlType>,
    /// New NOT NULL flag (if changing).
    #[serde(rename = "notnull", skip_serializing_if = "Option::is_none")]
    pub not_null: Option<bool>,
    /// New default value (if changing).
    #[serde(rename = "dflt_value", skip_serializing_if = "Option::is_none")]
    pub default: Option<DefaultValue>,
    /// New primary key flag (if changing).
    #[serde(rename = "pk", skip_serializing_if = "Option::is_none")]
    pub primary_key: Option<bool>,
}

impl ColumnChanges {
    /// Creates empty changes for the named column.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sql_type: None,
            not_null: None,
            default: None,
            primary_key: None,
        }
    }

    /// Returns whether no attribute changed.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.sql_type.is_none()
            && self.not_null.is_none()
            && self.default.is_none()
            && self.primary_key.is_none()
    }
}

/// One unit of schema evolution.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum SchemaChange {
    /// Create the table with all declared fields.
    Create {
        /// Fields in declaration order.
        fields: Vec<Field>,
    },
    /// Add a declared field as a new column.
    Add(Field),
    /// Change attributes of an existing column.
    Alter(ColumnChanges),
    /// Drop a column that is no longer declared.
    Drop {
        /// Column name.
        name: String,
    },
    /// Rename a column whose attributes match a newly declared field.
    Rename {
        /// Current column name.
        old_name: String,
        /// Declared field name.
        new_name: String,
    },
}

impl SchemaChange {
    /// Returns a human-readable description of this change.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Create { fields } => format!("Create table with {} columns", fields.len()),
            Self::Add(field) => format!("Add column '{}' {}", field.name(), field.sql_type()),
            Self::Alter(changes) => format!("Alter column '{}'", changes.name),
            Self::Drop { name } => format!("Drop column '{name}'"),
            Self::Rename { old_name, new_name } => {
                format!("Rename column '{old_name}' to '{new_name}'")
            }
        }
    }
}

/// The changes needed to bring one table in line with its model.
///
/// `create` is non-empty only when the table does not exist yet; otherwise
/// `alter` carries the incremental changes. An empty plan means the table
/// is in sync.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchemaPlan {
    /// Target table.
    #[serde(rename = "tablename")]
    pub table_name: String,
    /// Fields of a table to create.
    pub create: Vec<Field>,
    /// Incremental changes to an existing table.
    pub alter: Vec<SchemaChange>,
}

impl SchemaPlan {
    /// A plan that creates `table_name` with `fields`.
    #[must_use]
    pub fn create(table_name: impl Into<String>, fields: Vec<Field>) -> Self {
        Self {
            table_name: table_name.into(),
            create: fields,
            alter: Vec::new(),
        }
    }

    /// A plan of incremental changes.
    #[must_use]
    pub fn alter(table_name: impl Into<String>, changes: Vec<SchemaChange>) -> Self {
        Self {
            table_name: table_name.into(),
            create: Vec::new(),
            alter: changes,
        }
    }

    /// Returns whether the plan has nothing to do.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.create.is_empty() && self.alter.is_empty()
    }

    /// Returns whether this plan creates the table.
    #[must_use]
    pub fn is_create(&self) -> bool {
        !self.create.is_empty()
    }

    /// Returns the plan as a flat list: a single `Create`, or the alterations.
    #[must_use]
    pub fn changes(&self) -> Vec<SchemaChange> {
        if self.create.is_empty() {
            self.alter.clone()
        } else {
            vec![SchemaChange::Create {
                fields: self.create.clone(),
            }]
        }
    }

    /// Returns whether applying the plan discards a column.
    #[must_use]
    pub fn has_destructive_changes(&self) -> bool {
        self.alter
            .iter()
            .any(|change| matches!(change, SchemaChange::Drop { .. }))
    }
}

/// Computes the plan that reconciles `live` columns with `schema`.
///
/// An empty `live` list means the table does not exist and yields the
/// create plan. Running this again against a table migrated to the plan
/// yields an empty plan.
///
/// # Errors
///
/// Returns [`DriftError::Validation`](crate::DriftError::Validation) if the
/// model declares more than one primary key, or (for a new table) none.
pub fn compute_changes(schema: &ModelSchema, live: &[ColumnSnapshot]) -> Result<SchemaPlan> {
    if live.is_empty() {
        debug!(table = schema.table_name(), "Table has no live columns, planning create");
        return schema.create_plan();
    }
    schema.ensure_single_primary_key()?;

    let mut alter: Vec<SchemaChange> = Vec::new();
    // (slot in `alter`, live column) of every pending drop, in live order.
    let mut dropped: Vec<(usize, &ColumnSnapshot)> = Vec::new();
    let mut seen: HashSet<&str> = HashSet::new();

    for column in live {
        seen.insert(column.name.as_str());

        match schema.field(&column.name) {
            Some(field) => {
                if let Some(changes) = field.diff_against(column) {
                    alter.push(SchemaChange::Alter(changes));
                }
            }
            None => {
                dropped.push((alter.len(), column));
                alter.push(SchemaChange::Drop {
                    name: column.name.clone(),
                });
            }
        }
    }

    let mut added = Vec::new();
    for field in schema.fields() {
        if seen.contains(field.name()) {
            continue;
        }

        let compatible = dropped
            .iter()
            .position(|(_, column)| field.diff_against(column).is_none());

        match compatible {
            Some(index) => {
                let (slot, column) = dropped.remove(index);
                alter[slot] = SchemaChange::Rename {
                    old_name: column.name.clone(),
                    new_name: field.name().to_string(),
                };
            }
            None => added.push(SchemaChange::Add(field.clone())),
        }
    }
    alter.extend(added);

    for change in &alter {
        debug!(table = schema.table_name(), change = %change.describe(), "Schema change");
    }

    Ok(SchemaPlan::alter(schema.table_name(), alter))
}
