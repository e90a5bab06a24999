//! Raw tabular data read from a headed CSV file.
//!
//! Cells are kept as trimmed strings; typing happens in `preprocess` (features)
//! and `task::labels` (targets).

use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, Trim};

use crate::error::{FitError, Result};

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

impl Table {
    pub fn from_path(path: &Path) -> Result<Table> {
        let file = std::fs::File::open(path).map_err(|e| {
            FitError::Data(format!("cannot open '{}': {e}", path.display()))
        })?;
        Table::from_reader(std::io::BufReader::new(file))
    }

    /// Parses CSV with a header row. Ragged rows are rejected.
    pub fn from_reader<R: Read>(reader: R) -> Result<Table> {
        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .trim(Trim::All)
            .flexible(true)
            .from_reader(reader);

        let headers: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();
        let mut rows = Vec::new();
        for (row_idx, record) in rdr.records().enumerate() {
            let record = record?;
            // a trailing blank line parses as a single empty field
            if record.len() == 1 && record[0].is_empty() && headers.len() > 1 {
                continue;
            }
            if record.len() != headers.len() {
                return Err(FitError::Data(format!(
                    "row {} has {} cells, header has {}",
                    row_idx + 2,
                    record.len(),
                    headers.len()
                )));
            }
            rows.push(record.iter().map(str::to_string).collect());
        }

        Ok(Table { headers, rows })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    /// Cells of the given columns, row by row.
    pub fn select(&self, columns: &[usize]) -> Vec<Vec<String>> {
        self.rows
            .iter()
            .map(|row| columns.iter().map(|&c| row[c].clone()).collect())
            .collect()
    }

    /// One column's cells.
    pub fn column(&self, idx: usize) -> Vec<&str> {
        self.rows.iter().map(|row| row[idx].as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_headers_and_trimmed_cells() {
        let t = Table::from_reader("a, b\n1, x \n2,y\n".as_bytes()).unwrap();
        assert_eq!(t.headers(), &["a".to_string(), "b".to_string()]);
        assert_eq!(t.n_rows(), 2);
        assert_eq!(t.select(&[1]), vec![vec!["x".to_string()], vec!["y".to_string()]]);
        assert_eq!(t.column(0), vec!["1", "2"]);
    }

    #[test]
    fn quoted_fields_keep_commas() {
        let t = Table::from_reader("name,v\n\"a,b\",1\n".as_bytes()).unwrap();
        assert_eq!(t.column(0), vec!["a,b"]);
    }

    #[test]
    fn ragged_rows_are_data_errors() {
        let err = Table::from_reader("a,b\n1\n".as_bytes()).unwrap_err();
        assert!(matches!(err, FitError::Data(_)));
    }
}
