//! In-memory columnar data tables.
//!
//! CSV parsing and column normalization happen outside the core; by the
//! time data reaches the compiler it is a named set of equal-length
//! columns, numeric or text. Genomic position columns are text
//! (`"chr1:1234"`), category columns are text, everything else numeric.

use rustc_hash::FxHashMap;
use thiserror::Error;

#[derive(Error, Debug)]
#[error("column `{column}` has {got} rows, table has {want}")]
pub struct ColumnLengthError {
    pub column: String,
    pub got: usize,
    pub want: usize,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Column {
    Numeric(Vec<f64>),
    Text(Vec<String>),
}

impl Column {
    pub fn len(&self) -> usize {
        match self {
            Column::Numeric(v) => v.len(),
            Column::Text(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Named equal-length columns. The first inserted column fixes the row
/// count; later inserts must match it.
#[derive(Clone, Debug, Default)]
pub struct DataTable {
    columns: FxHashMap<String, Column>,
    rows: usize,
}

impl DataTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: &str, column: Column) -> Result<(), ColumnLengthError> {
        if self.columns.is_empty() {
            self.rows = column.len();
        } else if column.len() != self.rows {
            return Err(ColumnLengthError {
                column: name.to_string(),
                got: column.len(),
                want: self.rows,
            });
        }
        self.columns.insert(name.to_string(), column);
        Ok(())
    }

    pub fn insert_numeric(&mut self, name: &str, values: Vec<f64>) -> Result<(), ColumnLengthError> {
        self.insert(name, Column::Numeric(values))
    }

    pub fn insert_text(&mut self, name: &str, values: Vec<String>) -> Result<(), ColumnLengthError> {
        self.insert(name, Column::Text(values))
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.get(name)
    }

    pub fn numeric(&self, name: &str) -> Option<&[f64]> {
        match self.columns.get(name) {
            Some(Column::Numeric(v)) => Some(v),
            _ => None,
        }
    }

    pub fn text(&self, name: &str) -> Option<&[String]> {
        match self.columns.get(name) {
            Some(Column::Text(v)) => Some(v),
            _ => None,
        }
    }

    /// Row count.
    pub fn len(&self) -> usize {
        self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }
}

/// Named tables, looked up by a track's `data` source.
#[derive(Clone, Debug, Default)]
pub struct DataSet {
    tables: FxHashMap<String, DataTable>,
}

impl DataSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: &str, table: DataTable) {
        self.tables.insert(name.to_string(), table);
    }

    pub fn get(&self, name: &str) -> Option<&DataTable> {
        self.tables.get(name)
    }
}

// ===================================================================
// Tests
// ===================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_column_fixes_row_count() {
        let mut t = DataTable::new();
        t.insert_numeric("u", vec![1.0, 2.0, 3.0]).unwrap();
        assert_eq!(t.len(), 3);
        assert!(t.insert_numeric("v", vec![1.0]).is_err());
        assert!(t.insert_text("c", vec!["a".into(), "b".into(), "c".into()]).is_ok());
    }

    #[test]
    fn test_typed_accessors() {
        let mut t = DataTable::new();
        t.insert_numeric("u", vec![1.0]).unwrap();
        t.insert_text("c", vec!["a".into()]).unwrap();
        assert_eq!(t.numeric("u"), Some(&[1.0][..]));
        assert_eq!(t.numeric("c"), None);
        assert!(t.text("c").is_some());
        assert!(t.column("missing").is_none());
    }
}
