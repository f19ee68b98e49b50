use crate::error::{ClinicError, Result};
use std::collections::{HashMap, HashSet};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// One data row, keyed by column name. Every cell is kept as text; typed
/// coercion belongs to whoever owns the schema.
pub type Row = HashMap<String, String>;

/// A decoded tabular file: the header as written, plus the data rows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

impl Table {
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }
}

fn format_error(err: csv::Error) -> ClinicError {
    ClinicError::Format(format!("not a readable table: {}", err))
}

/// Decode CSV bytes into a [`Table`].
///
/// The first record is the header and must be present with at least one
/// non-empty, unique column name. Every data record must have the same
/// number of cells as the header.
pub fn decode_tabular(bytes: &[u8]) -> Result<Table> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    if bytes.iter().all(|b| b.is_ascii_whitespace()) {
        return Err(ClinicError::Format("table has no header row".to_string()));
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(bytes);

    let columns: Vec<String> = reader
        .headers()
        .map_err(format_error)?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    if columns.iter().any(|c| c.is_empty()) {
        return Err(ClinicError::Format(
            "table header contains an empty column name".to_string(),
        ));
    }
    let mut seen = HashSet::new();
    for column in &columns {
        if !seen.insert(column.as_str()) {
            return Err(ClinicError::Format(format!(
                "table header repeats column '{}'",
                column
            )));
        }
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(format_error)?;
        let row: Row = columns
            .iter()
            .cloned()
            .zip(record.iter().map(str::to_string))
            .collect();
        rows.push(row);
    }

    Ok(Table { columns, rows })
}

/// Encode rows as CSV with the given column order.
///
/// The header row is always written, even for an empty `rows`. Cells a row
/// does not carry are written empty; keys outside `columns` are dropped.
pub fn encode_tabular<S: AsRef<str>>(rows: &[Row], columns: &[S]) -> Result<Vec<u8>> {
    let columns: Vec<&str> = columns.iter().map(|c| c.as_ref()).collect();
    let mut writer = csv::WriterBuilder::new().from_writer(Vec::new());

    writer
        .write_record(&columns)
        .map_err(|e| ClinicError::Encode(e.to_string()))?;

    for row in rows {
        let cells = columns
            .iter()
            .map(|c| row.get(*c).map(String::as_str).unwrap_or(""));
        writer
            .write_record(cells)
            .map_err(|e| ClinicError::Encode(e.to_string()))?;
    }

    writer
        .into_inner()
        .map_err(|e| ClinicError::Encode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pairs: &[(&str, &str)]) -> Row {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn header_only_table_has_no_rows() {
        let bytes = encode_tabular(&[], &["identity", "name"]).unwrap();
        assert_eq!(String::from_utf8(bytes.clone()).unwrap(), "identity,name\n");

        let table = decode_tabular(&bytes).unwrap();
        assert_eq!(table.columns, vec!["identity", "name"]);
        assert!(table.rows.is_empty());
    }

    #[test]
    fn cells_with_separators_survive() {
        let rows = vec![row(&[
            ("identity", "A1"),
            ("notes", "line one\nline two, with \"quotes\""),
        ])];
        let bytes = encode_tabular(&rows, &["identity", "notes"]).unwrap();
        let table = decode_tabular(&bytes).unwrap();
        assert_eq!(table.rows, rows);
    }

    #[test]
    fn missing_cells_are_written_empty() {
        let rows = vec![row(&[("identity", "A1")])];
        let bytes = encode_tabular(&rows, &["identity", "name"]).unwrap();
        let table = decode_tabular(&bytes).unwrap();
        assert_eq!(table.rows[0].get("name").map(String::as_str), Some(""));
    }

    #[test]
    fn column_order_follows_argument() {
        let rows = vec![row(&[("a", "1"), ("b", "2")])];
        let bytes = encode_tabular(&rows, &["b", "a"]).unwrap();
        assert_eq!(String::from_utf8(bytes).unwrap(), "b,a\n2,1\n");
    }

    #[test]
    fn bom_is_ignored() {
        let mut bytes = UTF8_BOM.to_vec();
        bytes.extend_from_slice(b"identity,name\nA1,Omar\n");
        let table = decode_tabular(&bytes).unwrap();
        assert_eq!(table.columns[0], "identity");
        assert_eq!(table.rows.len(), 1);
    }

    #[test]
    fn empty_input_is_a_format_error() {
        assert!(matches!(decode_tabular(b""), Err(ClinicError::Format(_))));
        assert!(matches!(decode_tabular(b"  \n"), Err(ClinicError::Format(_))));
    }

    #[test]
    fn ragged_rows_are_a_format_error() {
        let result = decode_tabular(b"identity,name\nA1,Omar,extra\n");
        assert!(matches!(result, Err(ClinicError::Format(_))));
    }

    #[test]
    fn duplicate_header_is_a_format_error() {
        let result = decode_tabular(b"identity,identity\nA1,A2\n");
        assert!(matches!(result, Err(ClinicError::Format(_))));
    }

    #[test]
    fn binary_garbage_is_a_format_error() {
        // A zip container (what a spreadsheet application would write)
        // is not valid UTF-8 CSV.
        let garbage = [0x50, 0x4b, 0x03, 0x04, 0xff, 0xfe, 0x00, 0x81, b'\n', 0xc3];
        assert!(matches!(
            decode_tabular(&garbage),
            Err(ClinicError::Format(_))
        ));
    }
}
