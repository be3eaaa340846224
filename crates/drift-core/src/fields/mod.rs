//! Field descriptors.
//!
//! A [`Field`] describes one column of a model: its SQL type, nullability,
//! key flags, default and (for strings) length bounds. Fields are declared
//! through the kind-specific builders and validated when built:
//!
//! ```
//! use drift_core::fields::Field;
//!
//! let name = Field::string().min_length(1).max_length(10).build().unwrap();
//! assert_eq!(name.sql_type().to_string(), "VARCHAR(10)");
//! assert!(name.validate(&"Amazing".into()).is_ok());
//! ```
//!
//! A field has no name until a model schema binds it (see
//! [`ModelSchema::add_field`](crate::schema::ModelSchema::add_field)).

mod types;

pub use types::{DefaultValue, FieldKind, SqlType};

use serde::Serialize;

use crate::diff::{ColumnChanges, ColumnSnapshot};
use crate::error::{DriftError, Result};
use crate::value::{parse_date, SqlValue};

/// Default maximum length of string fields.
pub const DEFAULT_MAX_LENGTH: usize = 255;

/// Returns whether `name` is a valid field identifier: non-empty, made of
/// letters, digits and underscores, and not starting with a digit.
#[must_use]
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_alphabetic() || first == '_' => {
            chars.all(|c| c.is_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

/// A validated column declaration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Field {
    name: Option<String>,
    #[serde(rename = "type")]
    sql_type: SqlType,
    nullable: bool,
    #[serde(rename = "pk")]
    primary_key: bool,
    unique: bool,
    #[serde(rename = "dflt_value")]
    default: DefaultValue,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_length: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    min_length: Option<usize>,
}

impl Field {
    /// Starts a `VARCHAR` field (max length 255, min length 0).
    #[must_use]
    pub fn string() -> FieldBuilder {
        FieldBuilder::new(FieldKind::String)
    }

    /// Starts an `INTEGER` field.
    #[must_use]
    pub fn integer() -> FieldBuilder {
        FieldBuilder::new(FieldKind::Integer)
    }

    /// Starts a `FLOAT` field.
    #[must_use]
    pub fn float() -> FieldBuilder {
        FieldBuilder::new(FieldKind::Float)
    }

    /// Starts a `DATE` field. Defaults to `CURRENT_TIMESTAMP`.
    #[must_use]
    pub fn date() -> FieldBuilder {
        FieldBuilder::new(FieldKind::Date)
    }

    /// Starts a field of the given kind.
    #[must_use]
    pub fn of_kind(kind: FieldKind) -> FieldBuilder {
        FieldBuilder::new(kind)
    }

    /// Returns the bound name, or `""` while the field is unbound.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or("")
    }

    /// Returns whether a model has bound this field's name.
    #[must_use]
    pub const fn is_bound(&self) -> bool {
        self.name.is_some()
    }

    /// Returns the SQL type.
    #[must_use]
    pub const fn sql_type(&self) -> SqlType {
        self.sql_type
    }

    /// Returns the type family.
    #[must_use]
    pub const fn kind(&self) -> FieldKind {
        self.sql_type.kind()
    }

    /// Whether the column accepts NULL.
    #[must_use]
    pub const fn nullable(&self) -> bool {
        self.nullable
    }

    /// Whether the column is the primary key.
    #[must_use]
    pub const fn primary_key(&self) -> bool {
        self.primary_key
    }

    /// Whether the column carries a UNIQUE constraint.
    #[must_use]
    pub const fn unique(&self) -> bool {
        self.unique
    }

    /// Returns the default value.
    #[must_use]
    pub const fn default_value(&self) -> &DefaultValue {
        &self.default
    }

    /// Maximum length, for string fields.
    #[must_use]
    pub const fn max_length(&self) -> Option<usize> {
        self.max_length
    }

    /// Minimum length, for string fields.
    #[must_use]
    pub const fn min_length(&self) -> Option<usize> {
        self.min_length
    }

    /// Sets the field name. A field can be bound exactly once.
    ///
    /// # Errors
    ///
    /// Returns [`DriftError::Naming`] if the field is already bound or
    /// `name` is not a valid identifier.
    pub fn bind_name(&mut self, name: &str) -> Result<()> {
        if let Some(existing) = &self.name {
            return Err(DriftError::Naming(format!(
                "field '{existing}' cannot be rebound to '{name}'"
            )));
        }
        if !is_identifier(name) {
            return Err(DriftError::Naming(format!("Invalid field name: {name:?}")));
        }
        self.name = Some(name.to_string());
        Ok(())
    }

    /// Checks the length bounds of string values.
    ///
    /// Values of any other kind, and non-text values, are accepted here;
    /// their representation is checked by [`Field::check_value`].
    ///
    /// # Errors
    ///
    /// Returns the reason the value was rejected.
    pub fn validate(&self, value: &SqlValue) -> std::result::Result<(), String> {
        let SqlValue::Text(text) = value else {
            return Ok(());
        };
        let len = text.chars().count();

        if self.max_length.is_some_and(|max| len > max) {
            return Err("Maximum length exceeded".to_string());
        }
        if self.min_length.is_some_and(|min| len < min) {
            return Err("Minimum length not reached".to_string());
        }
        Ok(())
    }

    /// Checks a value about to be written to this column: NULL only when
    /// nullable, the representation expected by the kind, then [`Field::validate`].
    ///
    /// # Errors
    ///
    /// Returns [`DriftError::Validation`] for NULL into a NOT NULL column or
    /// a length violation, and [`DriftError::TypeMismatch`] for a value of
    /// the wrong representation.
    pub fn check_value(&self, value: &SqlValue) -> Result<()> {
        if value.is_null() {
            if self.nullable {
                return Ok(());
            }
            return Err(DriftError::Validation(format!("{} (may not be null)", self.name())));
        }

        let accepted = match (self.kind(), value) {
            (FieldKind::String, SqlValue::Text(_))
            | (FieldKind::Integer, SqlValue::Int(_))
            | (FieldKind::Float, SqlValue::Float(_) | SqlValue::Int(_)) => true,
            (FieldKind::Date, SqlValue::Text(text)) => parse_date(text).is_some(),
            _ => false,
        };
        if !accepted {
            return Err(DriftError::TypeMismatch {
                field: self.name().to_string(),
                expected: kind_representation(self.kind()),
                found: value.type_name().to_string(),
            });
        }

        self.validate(value)
            .map_err(|reason| DriftError::Validation(format!("{} ({reason})", self.name())))
    }

    /// Describes this field in the shape the store reports live columns in.
    #[must_use]
    pub fn to_column_schema(&self, name: &str) -> ColumnSnapshot {
        ColumnSnapshot {
            ordinal: 0,
            name: name.to_string(),
            sql_type: self.sql_type.to_string(),
            not_null: !self.nullable,
            default_value: self.default.to_sql(),
            primary_key: self.primary_key,
        }
    }

    /// Compares this declaration to a live column.
    ///
    /// Returns `None` if type, nullability, default and primary-key flag
    /// all agree; otherwise an alteration naming the live column and
    /// carrying only the attributes that differ, set to their declared values.
    #[must_use]
    pub fn diff_against(&self, old: &ColumnSnapshot) -> Option<ColumnChanges> {
        let mut changes = ColumnChanges::new(old.name.clone());

        if SqlType::parse(&old.sql_type) != Some(self.sql_type) {
            changes.sql_type = Some(self.sql_type);
        }
        if self.nullable == old.not_null {
            changes.not_null = Some(!self.nullable);
        }
        if self.default.to_sql() != old.default_value {
            changes.default = Some(self.default.clone());
        }
        if self.primary_key != old.primary_key {
            changes.primary_key = Some(self.primary_key);
        }

        if changes.is_empty() {
            None
        } else {
            Some(changes)
        }
    }
}

const fn kind_representation(kind: FieldKind) -> &'static str {
    match kind {
        FieldKind::String => "text",
        FieldKind::Integer => "integer",
        FieldKind::Float => "float",
        FieldKind::Date => "ISO date text",
    }
}

/// Builder for [`Field`]; [`FieldBuilder::build`] runs the construction checks.
#[derive(Debug, Clone)]
#[must_use]
pub struct FieldBuilder {
    kind: FieldKind,
    nullable: bool,
    primary_key: bool,
    unique: bool,
    default: DefaultValue,
    max_length: Option<usize>,
    min_length: Option<usize>,
}

impl FieldBuilder {
    fn new(kind: FieldKind) -> Self {
        Self {
            kind,
            nullable: true,
            primary_key: false,
            unique: false,
            default: DefaultValue::None,
            max_length: None,
            min_length: None,
        }
    }

    /// Sets whether the column accepts NULL (default `true`).
    pub fn nullable(mut self, value: bool) -> Self {
        self.nullable = value;
        self
    }

    /// Marks the column NOT NULL.
    pub fn not_null(self) -> Self {
        self.nullable(false)
    }

    /// Marks the column as the primary key.
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    /// Adds a UNIQUE constraint.
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Sets the default value.
    pub fn default(mut self, value: impl Into<DefaultValue>) -> Self {
        self.default = value.into();
        self
    }

    /// Sets the maximum length (string fields only).
    pub fn max_length(mut self, length: usize) -> Self {
        self.max_length = Some(length);
        self
    }

    /// Sets the minimum length (string fields only).
    pub fn min_length(mut self, length: usize) -> Self {
        self.min_length = Some(length);
        self
    }

    /// Validates the options and produces an unbound [`Field`].
    ///
    /// # Errors
    ///
    /// Returns [`DriftError::TypeMismatch`] when a length option is set on a
    /// non-string field or the default does not match the kind, and
    /// [`DriftError::Validation`] when `min_length > max_length` or a string
    /// default fails the length bounds.
    pub fn build(self) -> Result<Field> {
        if self.kind != FieldKind::String {
            for (option, set) in [
                ("max_length", self.max_length.is_some()),
                ("min_length", self.min_length.is_some()),
            ] {
                if set {
                    return Err(DriftError::TypeMismatch {
                        field: option.to_string(),
                        expected: "string field",
                        found: format!("{} field", self.kind),
                    });
                }
            }
        }

        let default_ok = match (&self.default, self.kind) {
            (DefaultValue::None, _)
            | (DefaultValue::Text(_), FieldKind::String)
            | (DefaultValue::Integer(_), FieldKind::Integer)
            | (DefaultValue::Float(_), FieldKind::Float)
            | (DefaultValue::Expression(_), FieldKind::Date) => true,
            (DefaultValue::Text(text), FieldKind::Date) => parse_date(text).is_some(),
            _ => false,
        };
        if !default_ok {
            return Err(DriftError::TypeMismatch {
                field: "default".to_string(),
                expected: kind_representation(self.kind),
                found: self.default.type_name().to_string(),
            });
        }

        let field = match self.kind {
            FieldKind::String => {
                let max_length = self.max_length.unwrap_or(DEFAULT_MAX_LENGTH);
                let min_length = self.min_length.unwrap_or(0);
                if min_length > max_length {
                    return Err(DriftError::Validation(format!(
                        "min_length {min_length} exceeds max_length {max_length}"
                    )));
                }
                Field {
                    sql_type: SqlType::VarChar(max_length),
                    max_length: Some(max_length),
                    min_length: Some(min_length),
                    ..self.into_field(SqlType::VarChar(max_length))
                }
            }
            FieldKind::Integer => self.into_field(SqlType::Integer),
            FieldKind::Float => self.into_field(SqlType::Float),
            FieldKind::Date => {
                let mut field = self.into_field(SqlType::Date);
                if !field.default.is_some() {
                    field.default = DefaultValue::current_timestamp();
                }
                field
            }
        };

        if let DefaultValue::Text(text) = &field.default {
            if field.kind() == FieldKind::String
                && field.validate(&SqlValue::Text(text.clone())).is_err()
            {
                return Err(DriftError::Validation(format!(
                    "Invalid default '{text}' provided"
                )));
            }
        }

        Ok(field)
    }

    fn into_field(self, sql_type: SqlType) -> Field {
        Field {
            name: None,
            sql_type,
            nullable: self.nullable,
            primary_key: self.primary_key,
            unique: self.unique,
            default: self.default,
            max_length: None,
            min_length: None,
        }
    }
}

/// Anything a model schema can register as a field.
pub trait IntoField {
    /// Produces the (still unbound) field.
    ///
    /// # Errors
    ///
    /// Propagates construction-time validation errors.
    fn into_field(self) -> Result<Field>;
}

impl IntoField for Field {
    fn into_field(self) -> Result<Field> {
        Ok(self)
    }
}

impl IntoField for FieldBuilder {
    fn into_field(self) -> Result<Field> {
        self.build()
    }
}
