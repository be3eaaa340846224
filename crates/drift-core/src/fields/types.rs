//! Column types and default values.

use std::fmt;

use serde::{Deserialize, Serialize, Serializer};

/// Family of a field, independent of any length parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    /// Variable-length text.
    String,
    /// 64-bit integer.
    Integer,
    /// Floating point.
    Float,
    /// Calendar date, stored as ISO text.
    Date,
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Date => "date",
        })
    }
}

/// SQL column types a field can map to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SqlType {
    /// Variable-length character string.
    VarChar(usize),
    /// Integer.
    Integer,
    /// Floating point.
    Float,
    /// Date.
    Date,
}

impl SqlType {
    /// Returns the family of this type.
    #[must_use]
    pub const fn kind(self) -> FieldKind {
        match self {
            Self::VarChar(_) => FieldKind::String,
            Self::Integer => FieldKind::Integer,
            Self::Float => FieldKind::Float,
            Self::Date => FieldKind::Date,
        }
    }

    /// Parses a type name as reported by the store (`PRAGMA table_info`).
    ///
    /// Matching is case-insensitive and ignores whitespace, so
    /// `varchar ( 20 )` reads as `VARCHAR(20)`. Unknown names yield `None`.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        let normalized: String = text
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_ascii_uppercase();

        match normalized.as_str() {
            "INTEGER" => Some(Self::Integer),
            "FLOAT" => Some(Self::Float),
            "DATE" => Some(Self::Date),
            other => other
                .strip_prefix("VARCHAR(")
                .and_then(|rest| rest.strip_suffix(')'))
                .and_then(|len| len.parse().ok())
                .map(Self::VarChar),
        }
    }
}

impl fmt::Display for SqlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::VarChar(len) => write!(f, "VARCHAR({len})"),
            Self::Integer => f.write_str("INTEGER"),
            Self::Float => f.write_str("FLOAT"),
            Self::Date => f.write_str("DATE"),
        }
    }
}

impl Serialize for SqlType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Default value for a column.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(untagged)]
pub enum DefaultValue {
    /// No default value.
    #[default]
    None,
    /// Integer default.
    Integer(i64),
    /// Float default.
    Float(f64),
    /// String default.
    Text(String),
    /// SQL expression (e.g., `CURRENT_TIMESTAMP`).
    Expression(String),
}

impl DefaultValue {
    /// The expression date fields fall back to.
    pub const CURRENT_TIMESTAMP: &'static str = "CURRENT_TIMESTAMP";

    /// Shorthand for the `CURRENT_TIMESTAMP` expression.
    #[must_use]
    pub fn current_timestamp() -> Self {
        Self::Expression(Self::CURRENT_TIMESTAMP.to_string())
    }

    /// Returns the SQL representation of this default value.
    ///
    /// The text matches what SQLite reports back in `dflt_value`, which is
    /// what makes a freshly created column diff as unchanged.
    #[must_use]
    pub fn to_sql(&self) -> Option<String> {
        match self {
            Self::None => None,
            Self::Integer(i) => Some(i.to_string()),
            Self::Float(f) => Some(f.to_string()),
            Self::Text(s) => Some(format!("'{}'", s.replace('\'', "''"))),
            Self::Expression(expr) => Some(expr.clone()),
        }
    }

    /// Returns `true` unless this is [`DefaultValue::None`].
    #[must_use]
    pub const fn is_some(&self) -> bool {
        !matches!(self, Self::None)
    }

    pub(crate) const fn type_name(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Integer(_) => "integer",
            Self::Float(_) => "float",
            Self::Text(_) => "text",
            Self::Expression(_) => "expression",
        }
    }
}

impl From<i64> for DefaultValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for DefaultValue {
    fn from(value: i32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<f64> for DefaultValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for DefaultValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for DefaultValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sql_type_display() {
        assert_eq!(SqlType::VarChar(255).to_string(), "VARCHAR(255)");
        assert_eq!(SqlType::Integer.to_string(), "INTEGER");
        assert_eq!(SqlType::Float.to_string(), "FLOAT");
        assert_eq!(SqlType::Date.to_string(), "DATE");
    }

    #[test]
    fn test_sql_type_parse() {
        assert_eq!(SqlType::parse("VARCHAR(10)"), Some(SqlType::VarChar(10)));
        assert_eq!(SqlType::parse("varchar ( 20 )"), Some(SqlType::VarChar(20)));
        assert_eq!(SqlType::parse("integer"), Some(SqlType::Integer));
        assert_eq!(SqlType::parse("DATE"), Some(SqlType::Date));
        assert_eq!(SqlType::parse("TEXT"), None);
        assert_eq!(SqlType::parse("VARCHAR(x)"), None);
        assert_eq!(SqlType::parse(""), None);
    }

    #[test]
    fn test_default_value_to_sql() {
        assert_eq!(DefaultValue::None.to_sql(), None);
        assert_eq!(DefaultValue::Integer(42).to_sql(), Some("42".to_string()));
        assert_eq!(DefaultValue::Float(1.5).to_sql(), Some("1.5".to_string()));
        assert_eq!(DefaultValue::from("it's").to_sql(), Some("'it''s'".to_string()));
        assert_eq!(
            DefaultValue::current_timestamp().to_sql(),
            Some("CURRENT_TIMESTAMP".to_string())
        );
    }
}
