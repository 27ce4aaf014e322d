// Copyright 2022 CeresDB Project Authors. Licensed under Apache-2.0.

//! Row view of a record batch

use std::collections::BTreeMap;

use arrow::{
    array::{
        Array, ArrayRef, BooleanArray, Float32Array, Float64Array, Int32Array, Int64Array,
        LargeStringArray, StringArray,
    },
    datatypes::DataType,
    record_batch::RecordBatch,
};

use crate::{model::value::Value, Error, Result};

#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    // It is better to iterate in a fixed order.
    values: BTreeMap<String, Value>,
}

impl Row {
    pub fn column(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn column_names(&self) -> Vec<String> {
        self.values.keys().cloned().collect()
    }
}

macro_rules! fill_column {
    ($arrow_column:expr, $arrow_array_type:ty, $rows:expr, $col_idx:expr, |$v:ident| $convert:expr) => {{
        let cast_arrow_column = $arrow_column
            .as_any()
            .downcast_ref::<$arrow_array_type>()
            .ok_or_else(|| Error::ColumnType {
                name: format!("#{}", $col_idx),
                expected: stringify!($arrow_array_type).to_string(),
                actual: $arrow_column.data_type().to_string(),
            })?;
        for (row_idx, row) in $rows.iter_mut().enumerate() {
            // Rows are initialized with `Value::Null`.
            if cast_arrow_column.is_valid(row_idx) {
                let $v = cast_arrow_column.value(row_idx);
                row[$col_idx] = $convert;
            }
        }
    }};
}

#[derive(Clone, Debug)]
pub struct RowBuilder {
    pub col_idx_to_name: Vec<String>,
    pub row_values: Vec<Vec<Value>>,
}

impl RowBuilder {
    pub fn build(self) -> Vec<Row> {
        let names = self.col_idx_to_name;
        self.row_values
            .into_iter()
            .map(|row| {
                let values = row
                    .into_iter()
                    .enumerate()
                    .map(|(col_idx, value)| (names[col_idx].clone(), value))
                    .collect::<BTreeMap<String, Value>>();

                Row { values }
            })
            .collect()
    }

    pub fn with_arrow_record_batch(record_batch: &RecordBatch) -> Result<Self> {
        let col_idx_to_name = record_batch
            .schema()
            .fields()
            .iter()
            .map(|field| field.name().clone())
            .collect::<Vec<_>>();

        let col_count = record_batch.num_columns();
        let row_count = record_batch.num_rows();
        let mut rows = vec![vec![Value::Null; col_count]; row_count];

        for col_idx in 0..col_count {
            Self::fill_column_in_rows(&mut rows, col_idx, record_batch.column(col_idx))?;
        }

        Ok(RowBuilder {
            col_idx_to_name,
            row_values: rows,
        })
    }

    fn fill_column_in_rows(
        rows: &mut [Vec<Value>],
        col_idx: usize,
        arrow_column: &ArrayRef,
    ) -> Result<()> {
        match arrow_column.data_type() {
            DataType::Null => {}
            DataType::Boolean => {
                fill_column!(arrow_column, BooleanArray, rows, col_idx, |v| Value::Boolean(v));
            }
            DataType::Int32 => {
                fill_column!(arrow_column, Int32Array, rows, col_idx, |v| Value::Int64(v as i64));
            }
            DataType::Int64 => {
                fill_column!(arrow_column, Int64Array, rows, col_idx, |v| Value::Int64(v));
            }
            DataType::Float32 => {
                fill_column!(arrow_column, Float32Array, rows, col_idx, |v| Value::Float64(v as f64));
            }
            DataType::Float64 => {
                fill_column!(arrow_column, Float64Array, rows, col_idx, |v| Value::Float64(v));
            }
            DataType::Utf8 => {
                fill_column!(arrow_column, StringArray, rows, col_idx, |v| Value::String(v.to_string()));
            }
            DataType::LargeUtf8 => {
                fill_column!(arrow_column, LargeStringArray, rows, col_idx, |v| Value::String(v.to_string()));
            }
            other => {
                return Err(Error::ColumnType {
                    name: format!("#{col_idx}"),
                    expected: "Boolean, Int, Float or Utf8".to_string(),
                    actual: other.to_string(),
                });
            }
        }
        Ok(())
    }
}
