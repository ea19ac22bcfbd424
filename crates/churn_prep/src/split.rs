//! Seeded train / validation / test partitioning
//!
//! Two-stage random split without stratification:
//!
//! 1. shuffle all rows; the first `ceil(n * holdout%)` form the holdout,
//!    the rest are the training set;
//! 2. shuffle the holdout with a fresh generator on the same seed; the first
//!    `ceil(h * test%)` are the test set, the rest validation.
//!
//! With the default 30% / 50% this gives roughly 70 / 15 / 15. Class balance
//! is not preserved across partitions.

use serde::Serialize;
use std::fmt;

use crate::config::SplitRatios;
use crate::deterministic::LcgRng;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PartitionKind {
    Train,
    Validation,
    Test,
}

impl PartitionKind {
    pub const ALL: [PartitionKind; 3] = [
        PartitionKind::Train,
        PartitionKind::Validation,
        PartitionKind::Test,
    ];

    /// Logical name, also the output file stem.
    pub fn name(self) -> &'static str {
        match self {
            PartitionKind::Train => "train",
            PartitionKind::Validation => "validation",
            PartitionKind::Test => "test",
        }
    }

    pub fn file_name(self) -> String {
        format!("{}.csv", self.name())
    }
}

impl fmt::Display for PartitionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Row indices per partition, in split order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Partitions {
    pub train: Vec<usize>,
    pub validation: Vec<usize>,
    pub test: Vec<usize>,
}

impl Partitions {
    pub fn get(&self, kind: PartitionKind) -> &[usize] {
        match kind {
            PartitionKind::Train => &self.train,
            PartitionKind::Validation => &self.validation,
            PartitionKind::Test => &self.test,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (PartitionKind, &[usize])> + '_ {
        PartitionKind::ALL.into_iter().map(move |kind| (kind, self.get(kind)))
    }

    pub fn total(&self) -> usize {
        self.train.len() + self.validation.len() + self.test.len()
    }
}

/// `ceil(n * percent / 100)` in integer arithmetic.
pub fn ceil_share(n: usize, percent: usize) -> usize {
    (n * percent).div_ceil(100)
}

/// Partition `row_count` rows into train / validation / test.
pub fn partition(row_count: usize, ratios: SplitRatios, seed: u64) -> Partitions {
    let shuffled = LcgRng::new(seed).permutation(row_count);
    let holdout_len = ceil_share(row_count, ratios.holdout_percent);
    let (holdout, train) = shuffled.split_at(holdout_len);

    let order = LcgRng::new(seed).permutation(holdout.len());
    let test_len = ceil_share(holdout.len(), ratios.test_percent_of_holdout);
    let (test, validation) = order.split_at(test_len);

    Partitions {
        train: train.to_vec(),
        validation: validation.iter().map(|&i| holdout[i]).collect(),
        test: test.iter().map(|&i| holdout[i]).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_ceil_share() {
        assert_eq!(ceil_share(10, 30), 3);
        assert_eq!(ceil_share(3, 30), 1);
        assert_eq!(ceil_share(1, 50), 1);
        assert_eq!(ceil_share(0, 30), 0);
        assert_eq!(ceil_share(7043, 30), 2113);
    }

    #[test]
    fn test_telco_sized_split() {
        let parts = partition(7043, SplitRatios::default(), 42);
        assert_eq!(parts.train.len(), 4930);
        assert_eq!(parts.test.len(), 1057);
        assert_eq!(parts.validation.len(), 1056);
        assert_eq!(parts.total(), 7043);
    }

    #[test]
    fn test_partitions_are_disjoint_and_complete() {
        let parts = partition(101, SplitRatios::default(), 42);
        let mut seen = HashSet::new();
        for (_, rows) in parts.iter() {
            for &row in rows {
                assert!(seen.insert(row), "row {row} assigned twice");
            }
        }
        assert_eq!(seen.len(), 101);
    }

    #[test]
    fn test_three_rows() {
        let parts = partition(3, SplitRatios::default(), 42);
        assert_eq!(parts.train.len(), 2);
        assert_eq!(parts.validation.len(), 0);
        assert_eq!(parts.test.len(), 1);
    }

    #[test]
    fn test_seed_changes_assignment() {
        let a = partition(200, SplitRatios::default(), 42);
        let b = partition(200, SplitRatios::default(), 42);
        let c = partition(200, SplitRatios::default(), 7);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_partition_names() {
        assert_eq!(PartitionKind::Train.file_name(), "train.csv");
        assert_eq!(PartitionKind::Validation.to_string(), "validation");
        assert_eq!(PartitionKind::Test.name(), "test");
    }
}
