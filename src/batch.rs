use std::sync::Arc;

use anyhow::{bail, Context, Result};
use arrow::array::{
    ArrayRef, BooleanBuilder, Float64Builder, Int64Builder, StringBuilder,
    TimestampMicrosecondBuilder,
};
use arrow::datatypes::{DataType, Field, Schema, TimeUnit};
use arrow::record_batch::RecordBatch;
use calamine::Data;

use crate::sheet::WorksheetTable;

/// What a column's cells have in common, folded over the body rows.
#[derive(Clone, Copy, PartialEq)]
enum Kind {
    Int,
    Float,
    Bool,
    DateTime,
    Text,
}

fn classify(cell: &Data) -> Option<Kind> {
    match cell {
        Data::Empty => None,
        Data::Int(_) => Some(Kind::Int),
        Data::Float(_) => Some(Kind::Float),
        Data::Bool(_) => Some(Kind::Bool),
        Data::DateTime(_) => Some(Kind::DateTime),
        _ => Some(Kind::Text),
    }
}

/// Column type from the parsed cells alone: uniform numeric, boolean or
/// datetime columns keep a native type (ints widen to float when mixed),
/// anything else falls back to text. Empty cells never influence the choice.
fn infer_column_type(table: &WorksheetTable, idx: usize) -> DataType {
    let mut kind: Option<Kind> = None;
    for row in &table.rows {
        let Some(cell_kind) = row.get(idx).and_then(classify) else {
            continue;
        };
        kind = Some(match kind {
            None => cell_kind,
            Some(prev) if prev == cell_kind => prev,
            Some(Kind::Int) if cell_kind == Kind::Float => Kind::Float,
            Some(Kind::Float) if cell_kind == Kind::Int => Kind::Float,
            Some(_) => Kind::Text,
        });
        if kind == Some(Kind::Text) {
            break;
        }
    }
    match kind {
        Some(Kind::Int) => DataType::Int64,
        Some(Kind::Float) => DataType::Float64,
        Some(Kind::Bool) => DataType::Boolean,
        Some(Kind::DateTime) => DataType::Timestamp(TimeUnit::Microsecond, None),
        Some(Kind::Text) | None => DataType::Utf8,
    }
}

fn build_column(table: &WorksheetTable, idx: usize, dt: &DataType) -> ArrayRef {
    let cells = table.rows.iter().map(|row| &row[idx]);
    match dt {
        DataType::Int64 => {
            let mut b = Int64Builder::with_capacity(table.num_rows());
            for cell in cells {
                match cell {
                    Data::Int(v) => b.append_value(*v),
                    _ => b.append_null(),
                }
            }
            Arc::new(b.finish())
        }
        DataType::Float64 => {
            let mut b = Float64Builder::with_capacity(table.num_rows());
            for cell in cells {
                match cell {
                    Data::Float(v) => b.append_value(*v),
                    Data::Int(v) => b.append_value(*v as f64),
                    _ => b.append_null(),
                }
            }
            Arc::new(b.finish())
        }
        DataType::Boolean => {
            let mut b = BooleanBuilder::with_capacity(table.num_rows());
            for cell in cells {
                match cell {
                    Data::Bool(v) => b.append_value(*v),
                    _ => b.append_null(),
                }
            }
            Arc::new(b.finish())
        }
        DataType::Timestamp(_, _) => {
            let mut b = TimestampMicrosecondBuilder::with_capacity(table.num_rows());
            for cell in cells {
                let micros = match cell {
                    Data::DateTime(dt) => dt
                        .as_datetime()
                        .map(|naive| naive.and_utc().timestamp_micros()),
                    _ => None,
                };
                b.append_option(micros);
            }
            Arc::new(b.finish())
        }
        _ => {
            let mut b = StringBuilder::new();
            for cell in cells {
                match cell {
                    Data::Empty => b.append_null(),
                    other => b.append_value(other.to_string()),
                }
            }
            Arc::new(b.finish())
        }
    }
}

/// Materialize a freshly inferred `RecordBatch` from a parsed worksheet.
/// Every column is nullable; the schema comes from this data alone.
pub fn to_record_batch(table: &WorksheetTable) -> Result<RecordBatch> {
    let width = table.columns.len();
    for (i, row) in table.rows.iter().enumerate() {
        if row.len() != width {
            bail!("row {} has {} cells, expected {}", i + 1, row.len(), width);
        }
    }

    let mut fields = Vec::with_capacity(width);
    let mut arrays: Vec<ArrayRef> = Vec::with_capacity(width);
    for (idx, name) in table.columns.iter().enumerate() {
        let dt = infer_column_type(table, idx);
        arrays.push(build_column(table, idx, &dt));
        fields.push(Field::new(name, dt, true));
    }

    RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays)
        .context("building record batch from worksheet")
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{Array, Float64Array, Int64Array, StringArray};

    fn table(columns: &[&str], rows: Vec<Vec<Data>>) -> WorksheetTable {
        WorksheetTable {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows,
        }
    }

    #[test]
    fn uniform_columns_keep_native_types() -> Result<()> {
        let t = table(
            &["ID", "NAME"],
            vec![
                vec![Data::Float(1.0), Data::String("Alice".into())],
                vec![Data::Float(2.0), Data::String("Bob".into())],
            ],
        );
        let batch = to_record_batch(&t)?;

        assert_eq!(batch.num_rows(), 2);
        assert_eq!(batch.schema().field(0).name(), "ID");
        assert_eq!(batch.schema().field(0).data_type(), &DataType::Float64);
        assert_eq!(batch.schema().field(1).data_type(), &DataType::Utf8);

        let ids = batch
            .column(0)
            .as_any()
            .downcast_ref::<Float64Array>()
            .unwrap();
        assert_eq!(ids.value(0), 1.0);
        assert_eq!(ids.value(1), 2.0);
        let names = batch
            .column(1)
            .as_any()
            .downcast_ref::<StringArray>()
            .unwrap();
        assert_eq!(names.value(1), "Bob");
        Ok(())
    }

    #[test]
    fn mixed_numeric_widens_to_float() -> Result<()> {
        let t = table(
            &["N"],
            vec![vec![Data::Int(1)], vec![Data::Float(2.5)], vec![Data::Empty]],
        );
        let batch = to_record_batch(&t)?;
        assert_eq!(batch.schema().field(0).data_type(), &DataType::Float64);
        let col = batch
            .column(0)
            .as_any()
            .downcast_ref::<Float64Array>()
            .unwrap();
        assert_eq!(col.value(0), 1.0);
        assert!(col.is_null(2));
        Ok(())
    }

    #[test]
    fn mixed_text_and_numbers_fall_back_to_text() -> Result<()> {
        let t = table(
            &["V"],
            vec![vec![Data::Int(7)], vec![Data::String("seven".into())]],
        );
        let batch = to_record_batch(&t)?;
        assert_eq!(batch.schema().field(0).data_type(), &DataType::Utf8);
        let col = batch
            .column(0)
            .as_any()
            .downcast_ref::<StringArray>()
            .unwrap();
        assert_eq!(col.value(0), "7");
        assert_eq!(col.value(1), "seven");
        Ok(())
    }

    #[test]
    fn all_empty_column_is_nullable_text() -> Result<()> {
        let t = table(&["X"], vec![vec![Data::Empty], vec![Data::Empty]]);
        let batch = to_record_batch(&t)?;
        assert_eq!(batch.schema().field(0).data_type(), &DataType::Utf8);
        assert_eq!(batch.column(0).null_count(), 2);
        Ok(())
    }

    #[test]
    fn all_int_column_stays_int() -> Result<()> {
        let t = table(&["N"], vec![vec![Data::Int(3)], vec![Data::Int(4)]]);
        let batch = to_record_batch(&t)?;
        assert_eq!(batch.schema().field(0).data_type(), &DataType::Int64);
        let col = batch
            .column(0)
            .as_any()
            .downcast_ref::<Int64Array>()
            .unwrap();
        assert_eq!(col.value(1), 4);
        Ok(())
    }

    #[test]
    fn inconsistent_row_width_is_rejected() {
        let t = table(
            &["A", "B"],
            vec![vec![Data::Int(1), Data::Int(2)], vec![Data::Int(3)]],
        );
        assert!(to_record_batch(&t).is_err());
    }

    #[test]
    fn zero_body_rows_still_yield_schema() -> Result<()> {
        let t = table(&["A", "B"], vec![]);
        let batch = to_record_batch(&t)?;
        assert_eq!(batch.num_rows(), 0);
        assert_eq!(batch.num_columns(), 2);
        Ok(())
    }
}
