//! Label encoding for categorical columns
//!
//! Each column is encoded independently. Distinct observed values are sorted
//! in byte order and numbered from 0 without gaps, so the mapping depends only
//! on the set of values, never on the row order.

use serde::Serialize;
use std::collections::HashMap;

/// Fitted mapping from one column's distinct values to dense integer codes.
///
/// For a churn target with values `{"No", "Yes"}` this yields `No -> 0` and
/// `Yes -> 1`; for `{"Female", "Male"}` it yields `Female -> 0` and
/// `Male -> 1`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LabelEncoding {
    column: String,
    /// Distinct values in sorted order; the code of a class is its index.
    classes: Vec<String>,
}

impl LabelEncoding {
    /// Fit an encoding from the observed values of a column.
    pub fn fit<'a, I>(column: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        Self::fit_transform(column, values).0
    }

    /// Fit an encoding and return the code of every input value, in order.
    pub fn fit_transform<'a, I>(column: impl Into<String>, values: I) -> (Self, Vec<u32>)
    where
        I: IntoIterator<Item = &'a str>,
    {
        // First pass assigns first-seen ids; sorting the distinct values then
        // gives the rank that becomes the final code.
        let mut first_seen: HashMap<&str, usize> = HashMap::new();
        let mut distinct: Vec<&str> = Vec::new();
        let provisional: Vec<usize> = values
            .into_iter()
            .map(|value| {
                *first_seen.entry(value).or_insert_with(|| {
                    distinct.push(value);
                    distinct.len() - 1
                })
            })
            .collect();

        let mut order: Vec<usize> = (0..distinct.len()).collect();
        order.sort_by(|&a, &b| distinct[a].cmp(distinct[b]));

        let mut rank = vec![0u32; distinct.len()];
        for (code, &id) in order.iter().enumerate() {
            rank[id] = code as u32;
        }

        let codes = provisional.into_iter().map(|id| rank[id]).collect();
        let classes = order.into_iter().map(|id| distinct[id].to_owned()).collect();

        (
            Self {
                column: column.into(),
                classes,
            },
            codes,
        )
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    /// Distinct values in code order.
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn code(&self, value: &str) -> Option<u32> {
        self.classes
            .binary_search_by(|class| class.as_str().cmp(value))
            .ok()
            .map(|idx| idx as u32)
    }

    pub fn decode(&self, code: u32) -> Option<&str> {
        self.classes.get(code as usize).map(String::as_str)
    }

    /// Encode values with an already fitted mapping; unseen values yield `None`.
    pub fn transform<'a, I>(&self, values: I) -> Option<Vec<u32>>
    where
        I: IntoIterator<Item = &'a str>,
    {
        values.into_iter().map(|value| self.code(value)).collect()
    }
}
