use crate::types::{ParsedTable, Record};

/// Turn every row of `table` into a [`Record`] keyed by column name, preserving row order.
pub fn format_result(table: ParsedTable) -> Vec<Record> {
    let ParsedTable { columns, rows } = table;
    rows.into_iter()
        .map(|row| columns.iter().cloned().zip(row).collect())
        .collect()
}
