//! Header discovery for CSV text fetched from a server.
//!
//! Feeds published over HTTP often carry their header as a `#`-prefixed comment, or as a fully
//! quoted first line. [`resolve_header_lines`] splits a body into an optional header line and
//! the remaining data lines.

/// Header line (if one was found) and data lines, in body order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedLines {
    pub header: Option<String>,
    pub data_lines: Vec<String>,
}

impl ResolvedLines {
    /// Text to hand to the CSV parser: header first (when present), then data, newline-joined.
    pub fn to_parse_input(&self) -> String {
        let data = self.data_lines.join("\n");
        match &self.header {
            Some(header) => format!("{header}\n{data}"),
            None => data,
        }
    }
}

/// Locate the header line for `expected` columns.
///
/// 1. The first `#` line containing every expected name as a substring becomes the header,
///    with the `#` markers and surrounding whitespace stripped. Other `#` lines are dropped.
/// 2. Failing that, the first data line is treated as a quoted header: outer quotes are
///    stripped, the line is split on `"<delimiter>"`, and if every expected name is one of the
///    pieces the pieces are rejoined with the delimiter and the line leaves the data set.
///
/// With no expected columns no header is ever found.
pub fn resolve_header_lines(body: &str, expected: &[String], delimiter: u8) -> ResolvedLines {
    let mut header = None;
    let mut data_lines = Vec::new();

    for line in body.lines() {
        if line.starts_with('#') {
            if header.is_none() && contains_all(line, expected) {
                header = Some(line.trim_start_matches('#').trim().to_string());
            }
        } else {
            data_lines.push(line.to_string());
        }
    }

    if header.is_none() && !expected.is_empty() {
        if let Some(first) = data_lines.first() {
            if let Some(candidate) = quoted_header_candidate(first, expected, delimiter) {
                tracing::debug!(header = %candidate, "using quoted first line as header");
                header = Some(candidate);
                data_lines.remove(0);
            }
        }
    }

    ResolvedLines { header, data_lines }
}

fn contains_all(line: &str, expected: &[String]) -> bool {
    !expected.is_empty() && expected.iter().all(|col| line.contains(col.as_str()))
}

fn quoted_header_candidate(line: &str, expected: &[String], delimiter: u8) -> Option<String> {
    let delimiter = char::from(delimiter).to_string();
    let separator = format!("\"{delimiter}\"");
    let pieces: Vec<&str> = line.trim_matches('"').split(separator.as_str()).collect();
    let matched = expected.iter().all(|col| pieces.contains(&col.as_str()));
    matched.then(|| pieces.join(delimiter.as_str()))
}
