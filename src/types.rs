//! Core data model types shared by the feed resolvers.
//!
//! Caller parameters arrive as loosely-shaped JSON bags; they are held as [`RequestParams`], a
//! map of explicitly tagged [`ParamValue`]s. Parsed CSV lands in a [`ParsedTable`] and leaves
//! the crate as a list of [`Record`]s.

use std::collections::BTreeMap;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A caller-supplied parameter value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    /// Explicit JSON `null`.
    Null,
    /// Boolean flag.
    Bool(bool),
    /// Integer.
    Int(i64),
    /// Floating point number.
    Float(f64),
    /// UTF-8 string.
    String(String),
    /// Ordered list of values (column lists are lists of strings).
    List(Vec<ParamValue>),
    /// Nested option bag.
    Map(RequestParams),
}

impl ParamValue {
    /// Whether this value survives payload pruning.
    ///
    /// Booleans and integers are always kept, whatever their value. Everything else must be
    /// non-empty (or non-zero for floats).
    pub fn is_retained(&self) -> bool {
        match self {
            Self::Bool(_) | Self::Int(_) => true,
            Self::Null => false,
            Self::Float(f) => *f != 0.0,
            Self::String(s) => !s.is_empty(),
            Self::List(items) => !items.is_empty(),
            Self::Map(map) => !map.is_empty(),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Render a scalar as it would appear in a query string or form field.
    ///
    /// Lists are not scalars and return `None`; callers expand them element by element.
    pub fn to_query_value(&self) -> Option<String> {
        match self {
            Self::Null | Self::List(_) => None,
            Self::Bool(b) => Some(if *b { "True" } else { "False" }.to_string()),
            Self::Int(i) => Some(i.to_string()),
            Self::Float(f) => Some(f.to_string()),
            Self::String(s) => Some(s.clone()),
            Self::Map(map) => serde_json::to_string(map).ok(),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl<T: Into<ParamValue>> From<Vec<T>> for ParamValue {
    fn from(value: Vec<T>) -> Self {
        Self::List(value.into_iter().map(Into::into).collect())
    }
}

/// Parameter bag keyed by parameter name.
pub type RequestParams = BTreeMap<String, ParamValue>;

/// Flatten params into `(key, value)` pairs for query strings and form bodies.
///
/// Lists repeat their key once per element, nested maps are JSON-encoded and nulls are omitted.
pub fn to_query_pairs(params: &RequestParams) -> Vec<(String, String)> {
    let mut pairs = Vec::with_capacity(params.len());
    for (key, value) in params {
        match value {
            ParamValue::List(items) => {
                for item in items {
                    if let Some(v) = item.to_query_value() {
                        pairs.push((key.clone(), v));
                    }
                }
            }
            other => {
                if let Some(v) = other.to_query_value() {
                    pairs.push((key.clone(), v));
                }
            }
        }
    }
    pairs
}

/// One output row: column name to cell value, in column order.
///
/// Empty cells are `None` and serialize as JSON `null`.
pub type Record = IndexMap<String, Option<String>>;

/// An in-memory parsed CSV table.
///
/// Every row has exactly `columns.len()` cells.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedTable {
    /// Column names (from the header, the caller, or positional `column_N`).
    pub columns: Vec<String>,
    /// Row-major cell storage.
    pub rows: Vec<Vec<Option<String>>>,
}

impl ParsedTable {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Option<String>>>) -> Self {
        Self { columns, rows }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

/// Result of an entry operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FeedResponse {
    /// Records returned directly to the caller.
    Records(Vec<Record>),
    /// Acknowledgement returned after forwarding records to ingestion.
    Message { message: String },
}

impl FeedResponse {
    pub fn records(&self) -> Option<&[Record]> {
        match self {
            Self::Records(records) => Some(records),
            Self::Message { .. } => None,
        }
    }
}
