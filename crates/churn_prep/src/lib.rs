//! Churn dataset preparation
//!
//! Turns the raw telco churn export into three header-less CSV partitions
//! (train, validation, test) with the target in column 0, ready for a
//! gradient-boosted tree trainer.
//!
//! The whole stage is a pure, single-threaded transformation: the input is
//! read once, every derived value lives in memory, and the partitions only
//! become visible on disk once all three have been written.

pub mod config;
pub mod deterministic;
pub mod encoding;
pub mod errors;
pub mod impute;
pub mod preparer;
pub mod record;
pub mod split;
pub mod table;
pub mod writer;

pub use config::{ImputationFallback, PrepareConfig, SplitRatios, DEFAULT_SEED};
pub use deterministic::LcgRng;
pub use encoding::LabelEncoding;
pub use errors::{DataQualityError, PrepareError, Result};
pub use impute::Imputation;
pub use preparer::{encode_table, prepare, EncodedDataset, PreparedDataset};
pub use record::{Cell, EncodedTable};
pub use split::{partition, PartitionKind, Partitions};
pub use table::RawTable;
pub use writer::{write_partitions, PartitionPaths};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
