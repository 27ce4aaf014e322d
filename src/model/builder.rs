// Copyright 2022 CeresDB Project Authors. Licensed under Apache-2.0.

//! [TableBuilder] assembles generated columns into a record batch

use std::sync::Arc;

use arrow::{
    datatypes::{Field, Schema},
    record_batch::{RecordBatch, RecordBatchOptions},
};

use crate::{
    errors::{Error, Result},
    model::column::{Column, ColumnData, Visibility},
};

/// Builder for one generated table.
///
/// Every column must have exactly `num_rows` values and column names must be
/// unique, the order of insertion is the order of the output schema.
#[derive(Debug, Clone)]
pub struct TableBuilder {
    num_rows: usize,
    columns: Vec<Column>,
}

impl TableBuilder {
    pub fn new(num_rows: usize) -> Self {
        Self {
            num_rows,
            columns: Vec::new(),
        }
    }

    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    fn check_len(&self, column: &Column) -> Result<()> {
        if column.data.len() != self.num_rows {
            return Err(Error::ColumnLength {
                name: column.name.clone(),
                expected: self.num_rows,
                actual: column.data.len(),
            });
        }
        Ok(())
    }

    /// Append a new column.
    pub fn push(&mut self, column: Column) -> Result<()> {
        if self.contains(&column.name) {
            return Err(Error::DuplicateColumn(column.name));
        }
        self.check_len(&column)?;
        self.columns.push(column);
        Ok(())
    }

    /// Overwrite the column with the same name, keeping its position, or
    /// append it if there is none.
    pub fn replace(&mut self, column: Column) -> Result<()> {
        self.check_len(&column)?;
        match self.position(&column.name) {
            Some(idx) => self.columns[idx] = column,
            None => self.columns.push(column),
        }
        Ok(())
    }

    pub fn remove(&mut self, name: &str) -> Option<Column> {
        self.position(name).map(|idx| self.columns.remove(idx))
    }

    pub fn get(&self, name: &str) -> Result<&Column> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .ok_or_else(|| Error::ColumnNotFound(name.to_string()))
    }

    /// Numeric copy of a column, integers and booleans are widened.
    pub fn f64(&self, name: &str) -> Result<Vec<f64>> {
        let column = self.get(name)?;
        column.data.to_f64().ok_or_else(|| Error::ColumnType {
            name: name.to_string(),
            expected: "numeric".to_string(),
            actual: column.data.data_type().to_string(),
        })
    }

    pub fn i64(&self, name: &str) -> Result<Vec<i64>> {
        let column = self.get(name)?;
        match &column.data {
            ColumnData::Int64(v) => Ok(v.clone()),
            ColumnData::Boolean(v) => Ok(v.iter().map(|x| *x as i64).collect()),
            other => Err(Error::ColumnType {
                name: name.to_string(),
                expected: "Int64".to_string(),
                actual: other.data_type().to_string(),
            }),
        }
    }

    pub fn strings(&self, name: &str) -> Result<Vec<String>> {
        let column = self.get(name)?;
        match &column.data {
            ColumnData::Utf8(v) => Ok(v.clone()),
            other => Err(Error::ColumnType {
                name: name.to_string(),
                expected: "Utf8".to_string(),
                actual: other.data_type().to_string(),
            }),
        }
    }

    pub fn set_visibility(&mut self, name: &str, visibility: Visibility) -> Result<()> {
        let idx = self
            .position(name)
            .ok_or_else(|| Error::ColumnNotFound(name.to_string()))?;
        self.columns[idx].visibility = visibility;
        Ok(())
    }

    /// Keep only the rows whose flag in `keep` is set.
    pub fn retain_rows(&mut self, keep: &[bool]) -> Result<()> {
        if keep.len() != self.num_rows {
            return Err(Error::ColumnLength {
                name: "row mask".to_string(),
                expected: self.num_rows,
                actual: keep.len(),
            });
        }
        for column in &mut self.columns {
            column.data.retain(keep);
        }
        self.num_rows = keep.iter().filter(|k| **k).count();
        Ok(())
    }

    /// Round all float columns to `decimals` places.
    pub fn round_floats(&mut self, decimals: i32) {
        for column in &mut self.columns {
            column.data.round(decimals);
        }
    }

    /// Build the final batch, dropping the oracle columns unless asked to
    /// keep them.
    pub fn build(self, keep_oracle: bool) -> Result<RecordBatch> {
        let (fields, arrays): (Vec<_>, Vec<_>) = self
            .columns
            .into_iter()
            .filter(|c| keep_oracle || c.visibility == Visibility::Observed)
            .map(|c| {
                let field = Field::new(c.name, c.data.data_type(), false);
                (field, c.data.into_array())
            })
            .unzip();

        let options = RecordBatchOptions::new().with_row_count(Some(self.num_rows));
        let batch =
            RecordBatch::try_new_with_options(Arc::new(Schema::new(fields)), arrays, &options)?;
        Ok(batch)
    }
}

#[cfg(test)]
mod test {
    use super::TableBuilder;
    use crate::{errors::Error, model::column::Column};

    #[test]
    fn test_build_table() {
        let mut builder = TableBuilder::new(3);
        builder
            .push(Column::observed("x", vec![1.0, 2.0, 3.0]))
            .unwrap();
        builder
            .push(Column::oracle("y0", vec![0_i64, 1, 0]))
            .unwrap();
        builder
            .push(Column::observed("t", vec![true, false, true]))
            .unwrap();

        assert_eq!(vec![0.0, 1.0, 0.0], builder.f64("y0").unwrap());
        assert_eq!(vec![1, 0, 1], builder.i64("t").unwrap());

        let hidden = builder.clone().build(false).unwrap();
        assert_eq!(2, hidden.num_columns());
        assert_eq!(3, hidden.num_rows());
        assert!(hidden.schema().field_with_name("y0").is_err());

        let full = builder.build(true).unwrap();
        assert_eq!(3, full.num_columns());
        assert_eq!("y0", full.schema().field(1).name());
    }

    #[test]
    fn test_reject_bad_columns() {
        let mut builder = TableBuilder::new(2);
        builder.push(Column::observed("x", vec![1.0, 2.0])).unwrap();

        let dup = builder.push(Column::observed("x", vec![3.0, 4.0]));
        assert!(matches!(dup, Err(Error::DuplicateColumn(_))));

        let short = builder.push(Column::observed("z", vec![3.0]));
        assert!(matches!(short, Err(Error::ColumnLength { actual: 1, .. })));

        let text = builder.push(Column::observed("s", vec!["a".to_string(), "b".to_string()]));
        assert!(text.is_ok());
        assert!(matches!(builder.f64("s"), Err(Error::ColumnType { .. })));
        assert!(matches!(builder.f64("w"), Err(Error::ColumnNotFound(_))));
    }

    #[test]
    fn test_replace_keeps_position() {
        let mut builder = TableBuilder::new(2);
        builder.push(Column::observed("a", vec![1.0, 2.0])).unwrap();
        builder.push(Column::observed("b", vec![1.0, 2.0])).unwrap();
        builder.replace(Column::observed("a", vec![5_i64, 6])).unwrap();
        assert_eq!(vec!["a", "b"], builder.column_names());
        assert_eq!(vec![5, 6], builder.i64("a").unwrap());
    }

    #[test]
    fn test_retain_rows() {
        let mut builder = TableBuilder::new(3);
        builder.push(Column::observed("a", vec![1_i64, 2, 3])).unwrap();
        builder.retain_rows(&[false, true, true]).unwrap();
        assert_eq!(2, builder.num_rows());
        assert_eq!(vec![2, 3], builder.i64("a").unwrap());
        assert!(builder.retain_rows(&[true]).is_err());
    }

    #[test]
    fn test_empty_table_keeps_row_count() {
        let batch = TableBuilder::new(4).build(false).unwrap();
        assert_eq!(4, batch.num_rows());
        assert_eq!(0, batch.num_columns());
    }
}
