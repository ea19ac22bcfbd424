//! End-to-end dataset preparation
//!
//! load -> coerce numeric column -> drop identifier -> label encode ->
//! split -> write partitions.

use serde::Serialize;
use std::time::Instant;
use tracing::{debug, error, info, warn};

use crate::config::PrepareConfig;
use crate::encoding::LabelEncoding;
use crate::errors::Result;
use crate::impute::{self, parse_numeric, Imputation};
use crate::record::{Cell, EncodedTable};
use crate::split::{self, PartitionKind, Partitions};
use crate::table::RawTable;
use crate::writer::{self, PartitionPaths};

/// In-memory result of encoding a raw table.
#[derive(Clone, Debug, PartialEq)]
pub struct EncodedDataset {
    pub table: EncodedTable,
    pub target_encoding: LabelEncoding,
    /// Encodings of the categorical feature columns, in column order.
    pub feature_encodings: Vec<LabelEncoding>,
    pub imputation: Imputation,
}

/// Summary of a completed `prepare` call.
#[derive(Clone, Debug, Serialize)]
pub struct PreparedDataset {
    pub paths: PartitionPaths,
    pub train_rows: usize,
    pub validation_rows: usize,
    pub test_rows: usize,
    /// Fields per output row, target included.
    pub row_width: usize,
    pub target_encoding: LabelEncoding,
    pub feature_encodings: Vec<LabelEncoding>,
    pub imputation: Imputation,
}

impl PreparedDataset {
    pub fn total_rows(&self) -> usize {
        self.train_rows + self.validation_rows + self.test_rows
    }

    pub fn rows(&self, kind: PartitionKind) -> usize {
        match kind {
            PartitionKind::Train => self.train_rows,
            PartitionKind::Validation => self.validation_rows,
            PartitionKind::Test => self.test_rows,
        }
    }
}

/// Prepare the dataset described by `config` and write its three partitions.
///
/// Nothing is written unless loading, validation and encoding all succeed,
/// and the partition files replace any previous ones only as a complete set.
pub fn prepare(config: &PrepareConfig) -> Result<PreparedDataset> {
    run(config).inspect_err(|err| {
        error!(
            input = %config.input_path.display(),
            error = %err,
            "Data preparation failed"
        );
    })
}

fn run(config: &PrepareConfig) -> Result<PreparedDataset> {
    let started = Instant::now();
    config.validate()?;

    info!(input = %config.input_path.display(), "Loading dataset");
    let raw = RawTable::from_csv_path(&config.input_path)?;
    info!(rows = raw.len(), columns = raw.width(), "Loaded dataset");

    let encoded = encode_table(&raw, config)?;
    let partitions = split::partition(encoded.table.len(), config.split, config.seed);
    info!(
        seed = config.seed,
        train = partitions.train.len(),
        validation = partitions.validation.len(),
        test = partitions.test.len(),
        "Split dataset"
    );

    let paths = writer::write_partitions(&config.output_dir, &encoded.table, &partitions)?;
    info!(
        output_dir = %config.output_dir.display(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Saved processed partitions"
    );

    Ok(summarize(paths, &partitions, encoded))
}

fn summarize(
    paths: PartitionPaths,
    partitions: &Partitions,
    encoded: EncodedDataset,
) -> PreparedDataset {
    PreparedDataset {
        paths,
        train_rows: partitions.train.len(),
        validation_rows: partitions.validation.len(),
        test_rows: partitions.test.len(),
        row_width: encoded.table.width(),
        target_encoding: encoded.target_encoding,
        feature_encodings: encoded.feature_encodings,
        imputation: encoded.imputation,
    }
}

/// Clean and encode a loaded table without touching the filesystem.
pub fn encode_table(raw: &RawTable, config: &PrepareConfig) -> Result<EncodedDataset> {
    let id_idx = raw.require_column(&config.id_column)?;
    let target_idx = raw.require_column(&config.target_column)?;
    let numeric_idx = raw.require_column(&config.numeric_column)?;

    let imputation =
        impute::coerce_and_fill(&config.numeric_column, raw.column(numeric_idx), config.fallback)?;
    if imputation.imputed_count() > 0 {
        warn!(
            column = %config.numeric_column,
            imputed = imputation.imputed_count(),
            fill_value = imputation.fill_value,
            "Filled non-numeric values with column mean"
        );
    }

    let (target_encoding, targets) =
        LabelEncoding::fit_transform(config.target_column.clone(), raw.column(target_idx));
    if target_encoding.len() != 2 {
        warn!(
            column = %config.target_column,
            classes = target_encoding.len(),
            "Target column is not binary"
        );
    }
    debug!(column = %config.target_column, classes = ?target_encoding.classes(), "Encoded target");

    let mut feature_names = Vec::new();
    let mut feature_encodings = Vec::new();
    let mut columns: Vec<Vec<Cell>> = Vec::new();

    for (idx, name) in raw.headers().iter().enumerate() {
        if idx == id_idx || idx == target_idx {
            continue;
        }

        let cells: Vec<Cell> = if idx == numeric_idx {
            imputation.values.iter().copied().map(Cell::Number).collect()
        } else if is_numeric_column(raw.column(idx)) {
            raw.column(idx)
                .map(|value| parse_numeric(value).map_or(Cell::Missing, Cell::Number))
                .collect()
        } else {
            let (encoding, codes) = LabelEncoding::fit_transform(name.clone(), raw.column(idx));
            debug!(column = %name, classes = encoding.len(), "Encoded categorical column");
            feature_encodings.push(encoding);
            codes.into_iter().map(Cell::Code).collect()
        };

        feature_names.push(name.clone());
        columns.push(cells);
    }

    let features = (0..raw.len())
        .map(|row| columns.iter().map(|column| column[row]).collect())
        .collect();

    info!(
        features = feature_names.len(),
        categorical = feature_encodings.len(),
        dropped = %config.id_column,
        "Encoded dataset"
    );

    Ok(EncodedDataset {
        table: EncodedTable {
            target_name: config.target_column.clone(),
            feature_names,
            targets,
            features,
        },
        target_encoding,
        feature_encodings,
        imputation,
    })
}

/// A column is numeric when every non-blank value parses and at least one
/// value is non-blank.
fn is_numeric_column<'a>(values: impl Iterator<Item = &'a str>) -> bool {
    let mut any = false;
    for value in values {
        if value.trim().is_empty() {
            continue;
        }
        if parse_numeric(value).is_none() {
            return false;
        }
        any = true;
    }
    any
}
