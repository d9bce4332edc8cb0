//! CSV fetched from the configured server URL.

use reqwest::Method;

use crate::client::{RequestClient, RequestOptions};
use crate::config::FeedConfig;
use crate::error::FeedResult;
use crate::payload::FeedRequest;
use crate::types::{Record, RequestParams};

use super::csv::{CsvReadOptions, read_csv_from_reader};
use super::format::format_result;
use super::header::resolve_header_lines;

/// GET the base URL (all params go on the query string), then parse the body.
pub fn fetch_and_parse(config: &FeedConfig, params: &RequestParams) -> FeedResult<Vec<Record>> {
    let request = FeedRequest::from_params(params)?;
    let client = RequestClient::new(config)?;

    let body = client.execute_text("", Method::GET, RequestOptions::with_params(params))?;
    tracing::debug!(bytes = body.len(), "fetched CSV body");

    parse_body(&body, &request)
}

/// Locate the header in `body` and parse it into records.
///
/// With a header, exactly the expected columns are returned, in the order given. Without one,
/// every column is returned under positional names.
pub fn parse_body(body: &str, request: &FeedRequest) -> FeedResult<Vec<Record>> {
    let resolved = resolve_header_lines(body, &request.expected_columns, request.delimiter);
    let has_header = resolved.header.is_some();
    tracing::info!(
        header_found = has_header,
        data_lines = resolved.data_lines.len(),
        "resolved CSV header"
    );

    let opts = CsvReadOptions {
        delimiter: request.delimiter,
        has_header,
        n_rows: request.n_rows,
        columns: has_header.then(|| request.expected_columns.clone()),
    };
    let input = resolved.to_parse_input();
    let table = read_csv_from_reader(input.as_bytes(), &opts)?;
    Ok(format_result(table))
}
