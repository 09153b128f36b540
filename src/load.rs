use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{error, info};

use crate::batch::to_record_batch;
use crate::error::LoadError;
use crate::mapping::{MappingRecord, MappingResolver};
use crate::sheet::read_worksheet;
use crate::stage::{base_name, Stage};
use crate::store::TableStore;

/// Per-record ingestion: stage the remote file into `work_dir`, parse the
/// named worksheet, overwrite the destination table, and delete the staged
/// copy on every exit path.
///
/// Processing is strictly sequential. Staged paths are derived from the
/// source file's base name alone, so two records sharing a base name must
/// never be in flight at once; do not parallelize `load` without
/// namespacing `work_dir` per record first.
pub struct Loader<S, T> {
    stage: S,
    store: T,
    work_dir: PathBuf,
}

impl<S: Stage, T: TableStore> Loader<S, T> {
    pub fn new(stage: S, store: T) -> Self {
        Self {
            stage,
            store,
            work_dir: env::temp_dir(),
        }
    }

    /// Stage files under `dir` instead of the OS temp dir.
    pub fn with_work_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.work_dir = dir.into();
        self
    }

    /// Load one mapping record. The first failed step aborts the load; the
    /// staged local file is removed whether or not a step failed, and a
    /// cleanup failure surfaces only when everything before it succeeded.
    pub fn load(&self, record: &MappingRecord) -> Result<(), LoadError> {
        let file_name = base_name(&record.source_path)
            .map_err(|cause| LoadError::Staging {
                path: record.source_path.clone(),
                cause,
            })?
            .to_string();
        info!(path = %record.source_path, "fetching file from stage");

        let local_path = self.work_dir.join(&file_name);
        let result = self
            .stage
            .fetch(&record.source_path, &self.work_dir)
            .map_err(|cause| LoadError::Staging {
                path: record.source_path.clone(),
                cause,
            })
            .and_then(|()| self.parse_and_write(&local_path, record));
        let cleanup = remove_staged(&local_path);

        match result {
            Ok(()) => {
                if let Err(e) = cleanup {
                    error!(file = %file_name, "cleanup failed: {}", e);
                    return Err(e);
                }
                info!(file = %file_name, table = %record.target_table, "loaded worksheet");
                Ok(())
            }
            Err(e) => {
                // a cleanup failure never masks the load error
                error!(file = %file_name, "load failed: {}", e);
                if let Err(c) = cleanup {
                    error!(file = %file_name, "cleanup also failed: {}", c);
                }
                Err(e)
            }
        }
    }

    fn parse_and_write(&self, local_path: &Path, record: &MappingRecord) -> Result<(), LoadError> {
        let table = read_worksheet(local_path, &record.worksheet_name)?;
        let batch = to_record_batch(&table).map_err(|cause| LoadError::Write {
            table: record.target_table.clone(),
            cause,
        })?;
        self.store
            .overwrite(&record.target_table, &batch)
            .map_err(|cause| LoadError::Write {
                table: record.target_table.clone(),
                cause,
            })
    }
}

fn remove_staged(path: &Path) -> Result<(), LoadError> {
    if !path.exists() {
        return Ok(());
    }
    fs::remove_file(path).map_err(|cause| LoadError::Cleanup {
        path: path.to_path_buf(),
        cause,
    })
}

/// Resolve the mapping sequence once, then load each record in order. The
/// first failure aborts the remaining records; full success returns a plain
/// status string.
pub fn run<R, S, T>(resolver: &mut R, loader: &Loader<S, T>) -> Result<String, LoadError>
where
    R: MappingResolver,
    S: Stage,
    T: TableStore,
{
    let records = resolver.resolve().map_err(|cause| {
        error!("mapping query failed: {}", cause);
        LoadError::Query { cause }
    })?;
    info!(count = records.len(), "files to process");

    for record in &records {
        loader.load(record)?;
    }

    Ok(format!("SUCCESS: loaded {} worksheets", records.len()))
}
