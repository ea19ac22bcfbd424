//! Raw CSV loading
//!
//! Reads a header-first, comma-separated UTF-8 file into string cells,
//! preserving declared column order.

use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::errors::{DataQualityError, PrepareError, Result};

/// Source rows exactly as read, one `String` per cell.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl RawTable {
    /// Load a table from a CSV file on disk.
    pub fn from_csv_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|err| PrepareError::load(path, err))?;
        Self::from_reader(file, path)
    }

    /// Load a table from any reader; `origin` is only used in error messages.
    pub fn from_reader<R: Read>(reader: R, origin: &Path) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(false)
            .from_reader(reader);

        let headers: Vec<String> = reader
            .headers()
            .map_err(|err| PrepareError::load(origin, err))?
            .iter()
            .map(str::to_owned)
            .collect();

        if headers.is_empty() {
            return Err(PrepareError::load(origin, "file is empty"));
        }

        let mut seen = HashSet::with_capacity(headers.len());
        for (idx, name) in headers.iter().enumerate() {
            if name.trim().is_empty() {
                return Err(PrepareError::load(
                    origin,
                    format!("header column {} has no name", idx + 1),
                ));
            }
            if !seen.insert(name.as_str()) {
                return Err(PrepareError::load(
                    origin,
                    format!("duplicate column name `{name}`"),
                ));
            }
        }

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|err| PrepareError::load(origin, err))?;
            rows.push(record.iter().map(str::to_owned).collect());
        }

        if rows.is_empty() {
            return Err(PrepareError::load(origin, "file has a header but no rows"));
        }

        Ok(Self { headers, rows })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Number of data rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn width(&self) -> usize {
        self.headers.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn require_column(&self, name: &str) -> std::result::Result<usize, DataQualityError> {
        self.column_index(name)
            .ok_or_else(|| DataQualityError::MissingColumn {
                column: name.to_string(),
            })
    }

    /// Values of one column, top to bottom.
    pub fn column(&self, idx: usize) -> impl Iterator<Item = &str> + '_ {
        self.rows.iter().map(move |row| row[idx].as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn parse(text: &str) -> Result<RawTable> {
        RawTable::from_reader(text.as_bytes(), Path::new("inline.csv"))
    }

    #[test]
    fn test_load_preserves_order_and_quotes() -> anyhow::Result<()> {
        let table = parse("customerID,gender,TotalCharges,Churn\nC1,Male,29.85,No\nC2,Female,\"\",Yes\n")?;

        assert_eq!(table.headers(), ["customerID", "gender", "TotalCharges", "Churn"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows()[1], vec!["C2", "Female", "", "Yes"]);
        assert_eq!(table.column_index("Churn"), Some(3));
        assert_eq!(table.column(1).collect::<Vec<_>>(), vec!["Male", "Female"]);
        Ok(())
    }

    #[test]
    fn test_load_from_path() -> anyhow::Result<()> {
        let mut file = NamedTempFile::new()?;
        writeln!(file, "a,b")?;
        writeln!(file, "1,2")?;
        file.flush()?;

        let table = RawTable::from_csv_path(file.path())?;
        assert_eq!(table.width(), 2);
        assert_eq!(table.len(), 1);
        Ok(())
    }

    #[test]
    fn test_missing_file_is_load_error() {
        let err = RawTable::from_csv_path("/definitely/not/here.csv").unwrap_err();
        match err {
            PrepareError::DataLoad { path, .. } => {
                assert_eq!(path, Path::new("/definitely/not/here.csv"))
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_empty_and_header_only_inputs() {
        assert!(matches!(parse(""), Err(PrepareError::DataLoad { .. })));
        assert!(matches!(parse("a,b\n"), Err(PrepareError::DataLoad { .. })));
    }

    #[test]
    fn test_ragged_row_is_load_error() {
        assert!(matches!(
            parse("a,b\n1,2\n3\n"),
            Err(PrepareError::DataLoad { .. })
        ));
    }

    #[test]
    fn test_duplicate_header_is_load_error() {
        let err = parse("a,a\n1,2\n").unwrap_err();
        assert!(err.to_string().contains("duplicate column name `a`"));
    }

    #[test]
    fn test_invalid_utf8_is_load_error() {
        let bytes: &[u8] = b"a,b\n1,\xff\xfe\n";
        assert!(matches!(
            RawTable::from_reader(bytes, Path::new("bad.csv")),
            Err(PrepareError::DataLoad { .. })
        ));
    }

    #[test]
    fn test_require_column() -> anyhow::Result<()> {
        let table = parse("a,b\n1,2\n")?;
        assert_eq!(table.require_column("b"), Ok(1));
        assert_eq!(
            table.require_column("Churn"),
            Err(DataQualityError::MissingColumn {
                column: "Churn".to_string()
            })
        );
        Ok(())
    }
}
