use std::path::Path;

use anyhow::anyhow;
use calamine::{open_workbook, Data, Reader, Xlsx, XlsxError};

use crate::error::LoadError;

/// A parsed worksheet: the first row of the sheet as column names, every
/// following row as the body, in original order. Cell typing is whatever the
/// parser inferred; no coercion happens here.
pub struct WorksheetTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Data>>,
}

impl WorksheetTable {
    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }
}

/// Open the staged workbook at `path` and pull out `worksheet_name`.
/// Sheet lookup is an exact, case-sensitive match.
pub fn read_worksheet(path: &Path, worksheet_name: &str) -> Result<WorksheetTable, LoadError> {
    let file = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    let mut workbook: Xlsx<_> = open_workbook(path).map_err(|e: XlsxError| LoadError::Parse {
        file: file.clone(),
        cause: e.into(),
    })?;

    if !workbook.sheet_names().iter().any(|n| n == worksheet_name) {
        return Err(LoadError::MissingWorksheet {
            file,
            sheet: worksheet_name.to_string(),
        });
    }

    let range = workbook
        .worksheet_range(worksheet_name)
        .map_err(|e| LoadError::Parse {
            file: file.clone(),
            cause: e.into(),
        })?;

    let mut rows = range.rows();
    let columns = match rows.next() {
        Some(header) => header.iter().map(|cell| cell.to_string()).collect(),
        None => {
            return Err(LoadError::Parse {
                file,
                cause: anyhow!("worksheet `{}` has no header row", worksheet_name),
            })
        }
    };
    let rows = rows.map(|row| row.to_vec()).collect();

    Ok(WorksheetTable { columns, rows })
}
