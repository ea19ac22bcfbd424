//! Encoded rows held in memory between encoding and serialization.

use std::fmt;

/// One encoded feature value.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Cell {
    /// Label code of a categorical value.
    Code(u32),
    Number(f64),
    /// Blank cell in a numeric column; written as an empty field.
    Missing,
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Code(code) => write!(f, "{code}"),
            Cell::Number(value) => write!(f, "{value}"),
            Cell::Missing => Ok(()),
        }
    }
}

/// Encoded dataset: identifier dropped, target separated from the features.
#[derive(Clone, Debug, PartialEq)]
pub struct EncodedTable {
    pub target_name: String,
    /// Feature names in original column order.
    pub feature_names: Vec<String>,
    pub targets: Vec<u32>,
    /// Row-major feature cells.
    pub features: Vec<Vec<Cell>>,
}

impl EncodedTable {
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Fields per serialized row: target plus features.
    pub fn width(&self) -> usize {
        1 + self.feature_names.len()
    }

    /// Serialized fields of one row, target first.
    pub fn row_fields(&self, row: usize) -> Vec<String> {
        let mut fields = Vec::with_capacity(self.width());
        fields.push(self.targets[row].to_string());
        fields.extend(self.features[row].iter().map(Cell::to_string));
        fields
    }
}
