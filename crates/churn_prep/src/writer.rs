//! Partition serialization
//!
//! Output rows have no header, the target in column 0 and the features after
//! it in original order. All partitions are staged as temporary files in the
//! output directory and only renamed into place once every one of them has
//! been written and synced. Files from a previous run are kept as `.bak`
//! until the commit succeeds and are put back if it fails.

use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::errors::{PrepareError, Result};
use crate::record::EncodedTable;
use crate::split::{PartitionKind, Partitions};

/// Final locations of the three partition files.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PartitionPaths {
    pub train: PathBuf,
    pub validation: PathBuf,
    pub test: PathBuf,
}

impl PartitionPaths {
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            train: dir.join(PartitionKind::Train.file_name()),
            validation: dir.join(PartitionKind::Validation.file_name()),
            test: dir.join(PartitionKind::Test.file_name()),
        }
    }

    pub fn get(&self, kind: PartitionKind) -> &Path {
        match kind {
            PartitionKind::Train => &self.train,
            PartitionKind::Validation => &self.validation,
            PartitionKind::Test => &self.test,
        }
    }
}

/// Write every partition of `table` into `output_dir`.
pub fn write_partitions(
    output_dir: &Path,
    table: &EncodedTable,
    partitions: &Partitions,
) -> Result<PartitionPaths> {
    fs::create_dir_all(output_dir).map_err(|err| PrepareError::write(output_dir, err))?;
    let paths = PartitionPaths::in_dir(output_dir);

    let mut staged = Vec::with_capacity(PartitionKind::ALL.len());
    for (kind, rows) in partitions.iter() {
        let target = paths.get(kind);
        let temp = stage_partition(output_dir, table, rows)
            .map_err(|err| PrepareError::write(target, err))?;
        debug!(partition = %kind, rows = rows.len(), "Staged partition");
        staged.push((temp, target));
    }

    let backups = set_aside_previous(&paths)?;

    let mut committed: Vec<&Path> = Vec::with_capacity(staged.len());
    for (temp, target) in staged {
        if let Err(err) = temp.persist(target) {
            for path in &committed {
                discard(path);
            }
            restore(&backups);
            return Err(PrepareError::write(target, err.error));
        }
        committed.push(target);
    }

    for (backup, _) in &backups {
        discard(backup);
    }
    Ok(paths)
}

/// Backup name for a previous partition file, e.g. `train.csv.bak`.
fn backup_path(target: &Path) -> PathBuf {
    let mut name = target.as_os_str().to_owned();
    name.push(".bak");
    PathBuf::from(name)
}

/// Move existing partition files out of the way so a failed commit can put
/// them back. Anything that is not a regular file is left where it is.
fn set_aside_previous(paths: &PartitionPaths) -> Result<Vec<(PathBuf, PathBuf)>> {
    let mut backups = Vec::new();
    for kind in PartitionKind::ALL {
        let target = paths.get(kind);
        if !target.is_file() {
            continue;
        }
        let backup = backup_path(target);
        if let Err(err) = fs::rename(target, &backup) {
            restore(&backups);
            return Err(PrepareError::write(target, err));
        }
        backups.push((backup, target.to_path_buf()));
    }
    Ok(backups)
}

fn restore(backups: &[(PathBuf, PathBuf)]) {
    for (backup, target) in backups {
        if let Err(err) = fs::rename(backup, target) {
            warn!(
                path = %target.display(),
                error = %err,
                "Failed to restore previous partition"
            );
        }
    }
}

fn discard(path: &Path) {
    if let Err(err) = fs::remove_file(path) {
        warn!(path = %path.display(), error = %err, "Failed to remove partition file");
    }
}

fn stage_partition(dir: &Path, table: &EncodedTable, rows: &[usize]) -> io::Result<NamedTempFile> {
    let mut temp = NamedTempFile::new_in(dir)?;
    {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(temp.as_file_mut());
        for &row in rows {
            writer.write_record(table.row_fields(row)).map_err(io::Error::other)?;
        }
        writer.flush()?;
    }
    temp.as_file().sync_all()?;
    Ok(temp)
}
