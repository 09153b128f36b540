use std::fs::{self, File};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;
use parquet::basic::{BrotliLevel, Compression};
use parquet::file::properties::WriterProperties;

/// Destination side of the pipeline: a named-table store with full-overwrite
/// write semantics. An overwrite replaces the table's contents and schema
/// with the supplied batch; prior state is discarded unconditionally.
pub trait TableStore {
    fn overwrite(&self, table: &str, batch: &RecordBatch) -> Result<()>;
}

/// Table store backed by one Parquet file per table under a root directory.
/// Overwrites go to a temp path first and are renamed over the old file, so
/// a failed write never clobbers the previous table state.
pub struct ParquetStore {
    root: PathBuf,
}

impl ParquetStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn table_path(&self, table: &str) -> PathBuf {
        self.root.join(format!("{}.parquet", table))
    }

    /// Read a table's full contents back, `None` if it was never written.
    pub fn read(&self, table: &str) -> Result<Option<Vec<RecordBatch>>> {
        let path = self.table_path(table);
        if !path.exists() {
            return Ok(None);
        }
        let file =
            File::open(&path).with_context(|| format!("opening {}", path.display()))?;
        let reader = ParquetRecordBatchReaderBuilder::try_new(file)
            .with_context(|| format!("reading {}", path.display()))?
            .build()?;
        let batches = reader.collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(Some(batches))
    }
}

impl TableStore for ParquetStore {
    fn overwrite(&self, table: &str, batch: &RecordBatch) -> Result<()> {
        fs::create_dir_all(&self.root)
            .with_context(|| format!("creating {}", self.root.display()))?;

        let out_path = self.table_path(table);
        let temp_path = out_path.with_extension("parquet.tmp");

        let props = WriterProperties::builder()
            .set_compression(Compression::BROTLI(BrotliLevel::try_new(5)?))
            .set_dictionary_enabled(true)
            .build();

        let file = File::create(&temp_path)
            .with_context(|| format!("creating {}", temp_path.display()))?;
        let mut writer = ArrowWriter::try_new(file, batch.schema(), Some(props))
            .with_context(|| format!("opening writer for `{}`", table))?;
        writer.write(batch)?;
        writer.close()?;

        fs::rename(&temp_path, &out_path).with_context(|| {
            format!("renaming {} -> {}", temp_path.display(), out_path.display())
        })?;
        Ok(())
    }
}
