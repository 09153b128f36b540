use std::path::PathBuf;

use thiserror::Error;

/// Everything that can abort an ingestion run. Nothing is recovered locally:
/// each error is logged once where it is detected, then propagated, and the
/// first failure terminates the whole run.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The mapping query itself failed; no file was touched.
    #[error("mapping query failed: {cause}")]
    Query { cause: anyhow::Error },

    /// Fetching the remote file into the transient directory failed.
    #[error("staging `{path}` failed: {cause}")]
    Staging { path: String, cause: anyhow::Error },

    /// The staged workbook could not be opened or read.
    #[error("parsing `{file}` failed: {cause}")]
    Parse { file: String, cause: anyhow::Error },

    /// The workbook has no sheet with the requested name (exact match).
    #[error("worksheet `{sheet}` not found in `{file}`")]
    MissingWorksheet { file: String, sheet: String },

    /// The destination store rejected the overwrite.
    #[error("writing table `{table}` failed: {cause}")]
    Write { table: String, cause: anyhow::Error },

    /// Deleting the staged local copy failed after an otherwise clean load.
    #[error("removing staged file `{path}` failed: {cause}")]
    Cleanup {
        path: PathBuf,
        cause: std::io::Error,
    },
}
