//! Delimited-text parsing into a [`ParsedTable`].

use std::io::Read;
use std::path::Path;

use crate::error::{FeedError, FeedResult};
use crate::payload::DEFAULT_N_ROWS;
use crate::types::ParsedTable;

/// Options controlling a single CSV parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvReadOptions {
    pub delimiter: u8,
    /// Whether the first record is a header row.
    pub has_header: bool,
    /// Upper bound on returned data rows.
    pub n_rows: usize,
    /// Restrict output to these columns, in this order.
    ///
    /// With a header they are looked up by name; without one they name the leading columns
    /// positionally.
    pub columns: Option<Vec<String>>,
}

impl Default for CsvReadOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            has_header: true,
            n_rows: DEFAULT_N_ROWS,
            columns: None,
        }
    }
}

/// Parse a CSV file on disk.
pub fn read_csv_from_path(path: impl AsRef<Path>, opts: &CsvReadOptions) -> FeedResult<ParsedTable> {
    let file = std::fs::File::open(path)?;
    read_csv_from_reader(file, opts)
}

/// Parse CSV data from any reader.
///
/// Rows with a different width than the header are padded or truncated. Records the parser
/// cannot decode (e.g. invalid UTF-8) are skipped.
pub fn read_csv_from_reader<R: Read>(reader: R, opts: &CsvReadOptions) -> FeedResult<ParsedTable> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(opts.delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut records = rdr.records();

    let mut pending_first = None;
    let source_columns: Vec<String> = if opts.has_header {
        match next_record(&mut records)? {
            Some(header) => dedupe_names(header.iter().map(str::to_owned).collect()),
            None => Vec::new(),
        }
    } else {
        pending_first = next_record(&mut records)?;
        let width = pending_first.as_ref().map_or(0, |r| r.len());
        (1..=width).map(|n| format!("column_{n}")).collect()
    };

    let (columns, col_idxs) = select_columns(&source_columns, opts)?;

    let mut rows = Vec::new();
    let mut next = pending_first;
    while rows.len() < opts.n_rows {
        let record = match next.take() {
            Some(record) => record,
            None => match next_record(&mut records)? {
                Some(record) => record,
                None => break,
            },
        };
        let row = col_idxs
            .iter()
            .map(|&idx| record.get(idx).filter(|cell| !cell.is_empty()).map(str::to_owned))
            .collect();
        rows.push(row);
    }

    Ok(ParsedTable::new(columns, rows))
}

/// Next decodable record; malformed ones are logged and skipped, I/O errors propagate.
fn next_record<R: Read>(
    records: &mut csv::StringRecordsIter<'_, R>,
) -> FeedResult<Option<csv::StringRecord>> {
    for result in records.by_ref() {
        match result {
            Ok(record) => return Ok(Some(record)),
            Err(err) if matches!(err.kind(), csv::ErrorKind::Io(_)) => return Err(err.into()),
            Err(err) => tracing::debug!(error = %err, "skipping malformed CSV row"),
        }
    }
    Ok(None)
}

/// Resolve the output column names and their source indexes.
fn select_columns(
    source_columns: &[String],
    opts: &CsvReadOptions,
) -> FeedResult<(Vec<String>, Vec<usize>)> {
    let Some(wanted) = opts.columns.as_ref() else {
        return Ok((source_columns.to_vec(), (0..source_columns.len()).collect()));
    };

    if !opts.has_header {
        if !source_columns.is_empty() && wanted.len() > source_columns.len() {
            return Err(FeedError::unclassified(format!(
                "{} columns requested but the data has only {}",
                wanted.len(),
                source_columns.len()
            )));
        }
        return Ok((wanted.clone(), (0..wanted.len()).collect()));
    }

    let mut idxs = Vec::with_capacity(wanted.len());
    for name in wanted {
        match source_columns.iter().position(|c| c == name) {
            Some(idx) => idxs.push(idx),
            None => {
                return Err(FeedError::unclassified(format!(
                    "column \"{name}\" not found in header {source_columns:?}"
                )));
            }
        }
    }
    Ok((wanted.clone(), idxs))
}

/// Make header names unique so no record silently loses a cell.
fn dedupe_names(names: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(names.len());
    for name in names {
        let mut candidate = name.clone();
        let mut n = 0;
        while out.contains(&candidate) {
            candidate = format!("{name}_duplicated_{n}");
            n += 1;
        }
        out.push(candidate);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts(has_header: bool) -> CsvReadOptions {
        CsvReadOptions {
            has_header,
            ..Default::default()
        }
    }

    #[test]
    fn header_names_key_the_columns() {
        let table = read_csv_from_reader("id,name\n1,Ada\n2,\n".as_bytes(), &opts(true)).unwrap();
        assert_eq!(table.columns, vec!["id", "name"]);
        assert_eq!(table.rows[0], vec![Some("1".to_string()), Some("Ada".to_string())]);
        assert_eq!(table.rows[1], vec![Some("2".to_string()), None]);
    }

    #[test]
    fn headerless_data_gets_positional_names() {
        let table = read_csv_from_reader("1,a\n2,b\n".as_bytes(), &opts(false)).unwrap();
        assert_eq!(table.columns, vec!["column_1", "column_2"]);
        assert_eq!(table.row_count(), 2);
    }

    #[test]
    fn ragged_rows_are_padded_and_truncated() {
        let table = read_csv_from_reader("a,b\n1\n1,2,3\n".as_bytes(), &opts(true)).unwrap();
        assert_eq!(table.rows[0], vec![Some("1".to_string()), None]);
        assert_eq!(table.rows[1], vec![Some("1".to_string()), Some("2".to_string())]);
    }

    #[test]
    fn row_limit_bounds_output() {
        let o = CsvReadOptions {
            n_rows: 2,
            ..Default::default()
        };
        let table = read_csv_from_reader("a\n1\n2\n3\n".as_bytes(), &o).unwrap();
        assert_eq!(table.row_count(), 2);
    }

    #[test]
    fn column_subset_follows_requested_order() {
        let o = CsvReadOptions {
            columns: Some(vec!["c".to_string(), "a".to_string()]),
            ..Default::default()
        };
        let table = read_csv_from_reader("a,b,c\n1,2,3\n".as_bytes(), &o).unwrap();
        assert_eq!(table.columns, vec!["c", "a"]);
        assert_eq!(table.rows[0], vec![Some("3".to_string()), Some("1".to_string())]);
    }

    #[test]
    fn missing_requested_column_fails() {
        let o = CsvReadOptions {
            columns: Some(vec!["zzz".to_string()]),
            ..Default::default()
        };
        let err = read_csv_from_reader("a,b\n1,2\n".as_bytes(), &o).unwrap_err();
        assert!(err.to_string().contains("column \"zzz\" not found"));
    }

    #[test]
    fn headerless_subset_names_leading_columns() {
        let o = CsvReadOptions {
            has_header: false,
            columns: Some(vec!["id".to_string()]),
            ..Default::default()
        };
        let table = read_csv_from_reader("1,a\n2,b\n".as_bytes(), &o).unwrap();
        assert_eq!(table.columns, vec!["id"]);
        assert_eq!(table.rows[1], vec![Some("2".to_string())]);
    }

    #[test]
    fn custom_delimiter_and_duplicate_headers() {
        let o = CsvReadOptions {
            delimiter: b';',
            ..Default::default()
        };
        let table = read_csv_from_reader("a;a\n1;2\n".as_bytes(), &o).unwrap();
        assert_eq!(table.columns, vec!["a", "a_duplicated_0"]);
    }

    #[test]
    fn invalid_utf8_row_is_skipped() {
        let mut input = b"a,b\n1,2\n".to_vec();
        input.extend_from_slice(&[0xff, 0xfe, b',', b'x', b'\n']);
        input.extend_from_slice(b"3,4\n");
        let table = read_csv_from_reader(input.as_slice(), &opts(true)).unwrap();
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.rows[1][0].as_deref(), Some("3"));
    }

    #[test]
    fn empty_input_yields_empty_table() {
        let table = read_csv_from_reader("".as_bytes(), &opts(true)).unwrap();
        assert!(table.columns.is_empty());
        assert_eq!(table.row_count(), 0);
    }
}
