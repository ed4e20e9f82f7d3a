//! Source row values.

use rusqlite::types::ValueRef;

use crate::temporal::Temporal;

/// A single column value from the relational source.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    /// Typed temporal value (drivers that distinguish dates from timestamps).
    Temporal(Temporal),
}

impl SourceValue {
    /// Whether the value is SQL NULL.
    pub fn is_null(&self) -> bool {
        matches!(self, SourceValue::Null)
    }

    /// Short type name used in mapping error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            SourceValue::Null => "null",
            SourceValue::Integer(_) => "integer",
            SourceValue::Real(_) => "real",
            SourceValue::Text(_) => "text",
            SourceValue::Temporal(_) => "temporal",
        }
    }

    /// Convert a borrowed SQLite value.
    ///
    /// Blobs have no meaning in the review schema. Blobs and text that is not
    /// valid UTF-8 are rejected with a reason.
    pub fn from_sqlite(value: ValueRef<'_>) -> Result<Self, String> {
        match value {
            ValueRef::Null => Ok(SourceValue::Null),
            ValueRef::Integer(i) => Ok(SourceValue::Integer(i)),
            ValueRef::Real(f) => Ok(SourceValue::Real(f)),
            ValueRef::Text(bytes) => std::str::from_utf8(bytes)
                .map(|s| SourceValue::Text(s.to_string()))
                .map_err(|e| format!("invalid UTF-8 text: {}", e)),
            ValueRef::Blob(_) => Err("unexpected blob".to_string()),
        }
    }
}

impl From<i64> for SourceValue {
    fn from(v: i64) -> Self {
        SourceValue::Integer(v)
    }
}

impl From<f64> for SourceValue {
    fn from(v: f64) -> Self {
        SourceValue::Real(v)
    }
}

impl From<bool> for SourceValue {
    fn from(v: bool) -> Self {
        SourceValue::Integer(v as i64)
    }
}

impl From<&str> for SourceValue {
    fn from(v: &str) -> Self {
        SourceValue::Text(v.to_string())
    }
}

impl From<String> for SourceValue {
    fn from(v: String) -> Self {
        SourceValue::Text(v)
    }
}

impl From<Temporal> for SourceValue {
    fn from(v: Temporal) -> Self {
        SourceValue::Temporal(v)
    }
}

impl<T: Into<SourceValue>> From<Option<T>> for SourceValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(SourceValue::Null, Into::into)
    }
}

/// One flat row of the review/user/book join, in declared column order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct JoinedRow {
    values: Vec<SourceValue>,
}

impl JoinedRow {
    pub fn new(values: Vec<SourceValue>) -> Self {
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value at a column position, if present.
    pub fn get(&self, index: usize) -> Option<&SourceValue> {
        self.values.get(index)
    }

    /// Append a column value (builder style).
    pub fn with(mut self, value: impl Into<SourceValue>) -> Self {
        self.values.push(value.into());
        self
    }
}
