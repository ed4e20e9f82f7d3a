//! Document filters.
//!
//! Field paths are dotted (`comments.comment`). When a path step lands on an
//! array, the rest of the path is applied to each element and the filter
//! matches if any element matches.

use regex::{Regex, RegexBuilder};
use serde_json::Value;

use crate::error::Result;

/// A predicate over stored documents.
#[derive(Debug, Clone)]
pub enum Filter {
    /// Field equals a value.
    Eq { path: String, value: Value },
    /// String field matches a regular expression.
    Regex { path: String, regex: Regex },
    /// Any sub-filter matches.
    Or(Vec<Filter>),
}

impl Filter {
    /// Equality on a dotted field path.
    pub fn eq(path: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Eq {
            path: path.into(),
            value: value.into(),
        }
    }

    /// Case-insensitive regular expression on a dotted field path.
    pub fn regex_ci(path: impl Into<String>, pattern: &str) -> Result<Self> {
        let regex = RegexBuilder::new(pattern).case_insensitive(true).build()?;
        Ok(Filter::Regex {
            path: path.into(),
            regex,
        })
    }

    pub fn or(filters: Vec<Filter>) -> Self {
        Filter::Or(filters)
    }

    /// Evaluate against a document.
    pub fn matches(&self, doc: &Value) -> bool {
        match self {
            Filter::Eq { path, value } => any_at_path(doc, path, &|v: &Value| v == value),
            Filter::Regex { path, regex } => any_at_path(doc, path, &|v: &Value| match v {
                Value::String(s) => regex.is_match(s),
                _ => false,
            }),
            Filter::Or(filters) => filters.iter().any(|f| f.matches(doc)),
        }
    }
}

fn any_at_path(doc: &Value, path: &str, pred: &dyn Fn(&Value) -> bool) -> bool {
    let segments: Vec<&str> = path.split('.').collect();
    walk(doc, &segments, pred)
}

fn walk(value: &Value, segments: &[&str], pred: &dyn Fn(&Value) -> bool) -> bool {
    match segments.split_first() {
        None => match value {
            Value::Array(items) => pred(value) || items.iter().any(|item| pred(item)),
            _ => pred(value),
        },
        Some((head, rest)) => match value {
            Value::Object(map) => map
                .get(*head)
                .is_some_and(|child| walk(child, rest, pred)),
            Value::Array(items) => items.iter().any(|item| walk(item, segments, pred)),
            _ => false,
        },
    }
}
