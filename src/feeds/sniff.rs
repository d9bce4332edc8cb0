//! Header-presence sniffing for files whose layout is unknown.
//!
//! The heuristic is statistical and can be wrong on small or ambiguous samples. Callers that
//! need determinism inject their own [`HeaderSniffer`].

use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::FeedResult;

/// Number of leading bytes inspected.
pub const SAMPLE_BYTES: usize = 2048;

/// Rows after the candidate header that take part in the vote.
const ROWS_CHECKED: usize = 20;

/// Decides whether a sample of delimited text starts with a header row.
pub trait HeaderSniffer: Send + Sync {
    fn has_header(&self, sample: &[u8], delimiter: u8) -> bool;
}

impl<F> HeaderSniffer for F
where
    F: Fn(&[u8], u8) -> bool + Send + Sync,
{
    fn has_header(&self, sample: &[u8], delimiter: u8) -> bool {
        self(sample, delimiter)
    }
}

/// Read up to [`SAMPLE_BYTES`] from `path`.
///
/// When the sample was cut short of the file end, the trailing partial line is discarded.
pub fn read_sample(path: impl AsRef<Path>) -> FeedResult<Vec<u8>> {
    let mut sample = Vec::with_capacity(SAMPLE_BYTES);
    File::open(path)?
        .take(SAMPLE_BYTES as u64)
        .read_to_end(&mut sample)?;

    if sample.len() == SAMPLE_BYTES && sample.last() != Some(&b'\n') {
        if let Some(last_newline) = sample.iter().rposition(|&b| b == b'\n') {
            sample.truncate(last_newline + 1);
        }
    }
    Ok(sample)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CellKind {
    Int,
    Float,
    Text(usize),
}

impl CellKind {
    fn of(cell: &str) -> Self {
        let trimmed = cell.trim();
        if trimmed.parse::<i64>().is_ok() {
            Self::Int
        } else if trimmed.parse::<f64>().is_ok() {
            Self::Float
        } else {
            Self::Text(cell.chars().count())
        }
    }

    /// Whether a header cell looks like it belongs to a column of this kind.
    fn fits(self, cell: &str) -> bool {
        let trimmed = cell.trim();
        match self {
            Self::Int => trimmed.parse::<i64>().is_ok(),
            Self::Float => trimmed.parse::<f64>().is_ok(),
            Self::Text(len) => cell.chars().count() == len,
        }
    }
}

/// Column-type voting sniffer.
///
/// The first row is the candidate header. Each column of the next rows (of the same width) is
/// classified as integer, float or text-of-a-given-length; columns whose class varies are
/// ignored. A column votes "header" when the candidate cell does not fit its class and
/// "no header" otherwise. A positive total means the sample has a header.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuralSniffer;

impl HeaderSniffer for StructuralSniffer {
    fn has_header(&self, sample: &[u8], delimiter: u8) -> bool {
        let mut rdr = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(false)
            .flexible(true)
            .from_reader(sample);
        let mut rows = rdr.records().filter_map(Result::ok);

        let Some(header) = rows.next() else {
            return false;
        };
        let width = header.len();

        // None = no sample row seen yet, Some(None) = inconsistent, Some(Some(kind)) = stable.
        let mut kinds: Vec<Option<Option<CellKind>>> = vec![None; width];
        for row in rows.take(ROWS_CHECKED + 1) {
            if row.len() != width {
                continue;
            }
            for (slot, cell) in kinds.iter_mut().zip(row.iter()) {
                let kind = CellKind::of(cell);
                *slot = match *slot {
                    None => Some(Some(kind)),
                    Some(Some(seen)) if seen == kind => Some(Some(seen)),
                    _ => Some(None),
                };
            }
        }

        let votes: i64 = kinds
            .iter()
            .zip(header.iter())
            .map(|(slot, cell)| match slot {
                None => 1,
                Some(None) => 0,
                Some(Some(kind)) if kind.fits(cell) => -1,
                Some(Some(_)) => 1,
            })
            .sum();
        tracing::debug!(votes, columns = width, "sniffed header votes");
        votes > 0
    }
}
