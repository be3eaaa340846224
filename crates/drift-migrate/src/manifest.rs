//! JSON model manifests.
//!
//! A manifest lists models and their fields:
//!
//! ```json
//! {"models": [{"name": "Giraffe", "table": "giraffes", "fields": [
//!     {"name": "id", "kind": "integer", "primary_key": true},
//!     {"name": "name", "kind": "string", "max_length": 10, "default": "x"},
//!     {"name": "date", "kind": "date"}
//! ]}]}
//! ```
//!
//! Every entry goes through the same field builders and registration calls
//! as a model declared in code.

use std::fs;
use std::path::{Path, PathBuf};

use drift_core::{DefaultValue, DriftError, Field, FieldKind, ModelSchema};
use serde::Deserialize;
use serde_json::Value;

/// Errors raised while loading a manifest.
#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    /// The file could not be read.
    #[error("Failed to read manifest '{path}': {source}")]
    Io {
        /// Manifest path.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// The file is not a valid manifest.
    #[error("Failed to parse manifest: {0}")]
    Parse(#[from] serde_json::Error),

    /// A default value does not fit its field kind.
    #[error("Invalid default for {model}.{field}: {message}")]
    Default {
        /// Model name.
        model: String,
        /// Field name.
        field: String,
        /// What is wrong.
        message: String,
    },

    /// A model declaration was rejected.
    #[error("Invalid model '{model}': {source}")]
    Model {
        /// Model name.
        model: String,
        /// Underlying error.
        source: DriftError,
    },

    /// Two models map to the same table.
    #[error("Models '{first}' and '{second}' both use table '{table}'")]
    DuplicateTable {
        /// Table name.
        table: String,
        /// First model.
        first: String,
        /// Second model.
        second: String,
    },
}

/// A parsed manifest.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    /// Declared models, in file order.
    pub models: Vec<ModelSpec>,
}

/// One model entry.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelSpec {
    /// Model name.
    pub name: String,
    /// Explicit table name.
    #[serde(default)]
    pub table: Option<String>,
    /// Fields, in column order.
    pub fields: Vec<FieldSpec>,
}

/// One field entry.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldSpec {
    /// Field name.
    pub name: String,
    /// Field kind.
    pub kind: FieldKind,
    /// Primary key flag.
    #[serde(default)]
    pub primary_key: bool,
    /// Whether NULL is accepted.
    #[serde(default = "nullable_by_default")]
    pub nullable: bool,
    /// UNIQUE flag.
    #[serde(default)]
    pub unique: bool,
    /// Default value, interpreted per kind.
    #[serde(default)]
    pub default: Option<Value>,
    /// Maximum length (string fields).
    #[serde(default)]
    pub max_length: Option<usize>,
    /// Minimum length (string fields).
    #[serde(default)]
    pub min_length: Option<usize>,
}

const fn nullable_by_default() -> bool {
    true
}

impl Manifest {
    /// Reads and parses a manifest file.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError::Io`] or [`ManifestError::Parse`].
    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        let text = fs::read_to_string(path).map_err(|source| ManifestError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text)
    }

    /// Parses manifest JSON.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError::Parse`] for malformed JSON or unknown keys.
    pub fn parse(text: &str) -> Result<Self, ManifestError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Builds the schema of every model.
    ///
    /// # Errors
    ///
    /// Returns the first invalid model, default or duplicated table.
    pub fn schemas(&self) -> Result<Vec<ModelSchema>, ManifestError> {
        let mut schemas: Vec<ModelSchema> = Vec::with_capacity(self.models.len());
        for spec in &self.models {
            let schema = spec.to_schema()?;
            if let Some(other) = schemas.iter().find(|s| s.table_name() == schema.table_name()) {
                return Err(ManifestError::DuplicateTable {
                    table: schema.table_name().to_string(),
                    first: other.model_name().to_string(),
                    second: spec.name.clone(),
                });
            }
            schemas.push(schema);
        }
        Ok(schemas)
    }
}

impl ModelSpec {
    /// Registers every field on a fresh schema.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError::Model`] or [`ManifestError::Default`].
    pub fn to_schema(&self) -> Result<ModelSchema, ManifestError> {
        let model_error = |source| ManifestError::Model {
            model: self.name.clone(),
            source,
        };

        let mut schema = ModelSchema::new(&self.name, self.table.as_deref()).map_err(model_error)?;
        for field in &self.fields {
            let builder = field.builder(&self.name)?;
            schema.add_field(&field.name, builder).map_err(model_error)?;
        }
        Ok(schema)
    }
}

impl FieldSpec {
    fn builder(&self, model: &str) -> Result<drift_core::FieldBuilder, ManifestError> {
        let mut builder = Field::of_kind(self.kind).nullable(self.nullable);
        if self.primary_key {
            builder = builder.primary_key();
        }
        if self.unique {
            builder = builder.unique();
        }
        if let Some(max) = self.max_length {
            builder = builder.max_length(max);
        }
        if let Some(min) = self.min_length {
            builder = builder.min_length(min);
        }
        if let Some(value) = &self.default {
            builder = builder.default(self.default_value(model, value)?);
        }
        Ok(builder)
    }

    fn default_value(&self, model: &str, value: &Value) -> Result<DefaultValue, ManifestError> {
        let converted = match (self.kind, value) {
            (_, Value::Null) => Some(DefaultValue::None),
            (FieldKind::String, Value::String(s)) => Some(DefaultValue::Text(s.clone())),
            (FieldKind::Integer, Value::Number(n)) => n.as_i64().map(DefaultValue::Integer),
            (FieldKind::Float, Value::Number(n)) => n.as_f64().map(DefaultValue::Float),
            (FieldKind::Date, Value::String(s)) => Some(
                if s.eq_ignore_ascii_case(DefaultValue::CURRENT_TIMESTAMP) {
                    DefaultValue::current_timestamp()
                } else {
                    DefaultValue::Text(s.clone())
                },
            ),
            _ => None,
        };

        converted.ok_or_else(|| ManifestError::Default {
            model: model.to_string(),
            field: self.name.clone(),
            message: format!("{value} is not a valid {} default", self.kind),
        })
    }
}
