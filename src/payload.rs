//! Normalization of caller-supplied parameters.
//!
//! [`build_payload`] turns a raw parameter bag into its canonical form. [`FeedRequest`] then
//! pulls out the typed knobs the resolvers need.

use std::collections::HashMap;

use crate::error::{FeedError, FeedResult};
use crate::types::{ParamValue, RequestParams};

/// Nested option bag flattened into the top level.
pub const OTHER_FIELDS: &str = "other_fields";
/// Expected column names (comma-separated string or list).
pub const COL_NAME: &str = "col_name";
pub const DELIMITER: &str = "delimiter";
pub const N_ROWS: &str = "n_rows";
pub const PROCESS_RESPONSE_AS: &str = "process_response_as";
/// File or attachment reference.
pub const VALUE: &str = "value";
/// Playbook used when forwarding records to ingestion.
pub const CREATE_PB_ID: &str = "create_pb_id";

pub const DEFAULT_N_ROWS: usize = 100;
pub const RETURN_AS_JSON: &str = "Return as JSON";

/// Canonicalize a raw parameter bag.
///
/// - `other_fields`, when it is a nested map, is merged into the top level and removed. Any
///   other `other_fields` value is kept as an ordinary entry.
/// - A string `col_name` is split on commas into a list of trimmed names. Empty pieces and
///   duplicates are kept as written.
/// - Entries whose value is not a boolean or integer and is empty (null, `""`, `[]`, `{}`,
///   `0.0`) are dropped.
/// - String values are looked up in `options` and replaced by their alias when one exists.
pub fn build_payload(
    mut params: RequestParams,
    options: Option<&HashMap<String, String>>,
) -> RequestParams {
    if let Some(ParamValue::Map(_)) = params.get(OTHER_FIELDS) {
        if let Some(ParamValue::Map(extra)) = params.remove(OTHER_FIELDS) {
            params.extend(extra);
        }
    }

    if let Some(ParamValue::String(raw)) = params.get(COL_NAME) {
        if !raw.is_empty() {
            let columns: Vec<ParamValue> = raw
                .split(',')
                .map(|col| ParamValue::String(col.trim().to_string()))
                .collect();
            params.insert(COL_NAME.to_string(), ParamValue::List(columns));
        }
    }

    params
        .into_iter()
        .filter(|(_, value)| value.is_retained())
        .map(|(key, value)| {
            let value = match (value, options) {
                (ParamValue::String(s), Some(aliases)) => {
                    ParamValue::String(aliases.get(&s).cloned().unwrap_or(s))
                }
                (other, _) => other,
            };
            (key, value)
        })
        .collect()
}

/// How the attachment operation should hand back its records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseMode {
    /// Return the records to the caller.
    ReturnAsJson,
    /// Forward the records to the ingestion collaborator (any other label, or none).
    CreateFeedRecords,
}

impl ResponseMode {
    pub fn from_label(label: Option<&str>) -> Self {
        match label {
            Some(RETURN_AS_JSON) => Self::ReturnAsJson,
            _ => Self::CreateFeedRecords,
        }
    }
}

/// Typed view over a normalized parameter bag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedRequest {
    pub delimiter: u8,
    /// Empty when the caller did not name any columns.
    pub expected_columns: Vec<String>,
    pub n_rows: usize,
    pub response_mode: ResponseMode,
    pub value: Option<String>,
    pub playbook_id: Option<String>,
}

impl FeedRequest {
    /// Extract the typed request from already-normalized params.
    pub fn from_params(params: &RequestParams) -> FeedResult<Self> {
        Ok(Self {
            delimiter: parse_delimiter(params.get(DELIMITER))?,
            expected_columns: parse_columns(params.get(COL_NAME)),
            n_rows: parse_n_rows(params.get(N_ROWS))?,
            response_mode: ResponseMode::from_label(
                params.get(PROCESS_RESPONSE_AS).and_then(ParamValue::as_str),
            ),
            value: params.get(VALUE).and_then(scalar_to_string),
            playbook_id: params.get(CREATE_PB_ID).and_then(scalar_to_string),
        })
    }
}

fn parse_delimiter(value: Option<&ParamValue>) -> FeedResult<u8> {
    match value {
        None => Ok(b','),
        Some(ParamValue::String(s)) if s.len() == 1 => Ok(s.as_bytes()[0]),
        Some(other) => Err(FeedError::unclassified(format!(
            "delimiter must be a single-byte character, got {other:?}"
        ))),
    }
}

fn parse_columns(value: Option<&ParamValue>) -> Vec<String> {
    match value {
        Some(ParamValue::List(items)) => items.iter().filter_map(scalar_to_string).collect(),
        Some(ParamValue::String(s)) => s.split(',').map(|c| c.trim().to_string()).collect(),
        _ => Vec::new(),
    }
}

fn parse_n_rows(value: Option<&ParamValue>) -> FeedResult<usize> {
    let invalid = |v: &ParamValue| {
        FeedError::unclassified(format!("n_rows must be a non-negative integer, got {v:?}"))
    };
    match value {
        None => Ok(DEFAULT_N_ROWS),
        Some(v @ ParamValue::Int(n)) => usize::try_from(*n).map_err(|_| invalid(v)),
        Some(v @ ParamValue::String(s)) => s.trim().parse::<usize>().map_err(|_| invalid(v)),
        Some(other) => Err(invalid(other)),
    }
}

fn scalar_to_string(value: &ParamValue) -> Option<String> {
    match value {
        ParamValue::String(s) => Some(s.clone()),
        ParamValue::Int(i) => Some(i.to_string()),
        ParamValue::Float(f) => Some(f.to_string()),
        ParamValue::Bool(b) => Some(b.to_string()),
        ParamValue::Null | ParamValue::List(_) | ParamValue::Map(_) => None,
    }
}
