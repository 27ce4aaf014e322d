// Copyright 2022 CeresDB Project Authors. Licensed under Apache-2.0.

//! Display for datasets

use std::fmt::{self, Display};

use crate::model::{dataset::Dataset, row::RowBuilder};

/// Display a [`Dataset`] in csv format, optionally only its first rows.
pub struct CsvFormatter<'a> {
    pub dataset: &'a Dataset,
    pub limit: Option<usize>,
}

impl<'a> CsvFormatter<'a> {
    pub fn new(dataset: &'a Dataset) -> Self {
        Self {
            dataset,
            limit: None,
        }
    }

    /// Only the first `n` rows, like a dataframe `head`.
    pub fn head(dataset: &'a Dataset, n: usize) -> Self {
        Self {
            dataset,
            limit: Some(n),
        }
    }
}

impl Display for CsvFormatter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let batch = self.dataset.record_batch();
        let num_rows = self.limit.unwrap_or(usize::MAX).min(batch.num_rows());
        let batch = batch.slice(0, num_rows);

        let builder = RowBuilder::with_arrow_record_batch(&batch).map_err(|_| fmt::Error)?;
        f.write_str(&builder.col_idx_to_name.join(","))?;
        f.write_str("\n")?;

        for row in &builder.row_values {
            let cells = row.iter().map(|v| v.to_string()).collect::<Vec<_>>();
            f.write_str(&cells.join(","))?;
            f.write_str("\n")?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::CsvFormatter;
    use crate::model::{
        builder::TableBuilder,
        column::Column,
        dataset::{Dataset, Roles},
    };

    #[test]
    fn test_head() {
        let mut builder = TableBuilder::new(3);
        builder.push(Column::observed("y", vec![1.5, 2.0, 3.0])).unwrap();
        builder.push(Column::observed("t", vec![true, false, true])).unwrap();
        let dataset = Dataset::new(builder.build(false).unwrap(), Roles::new("y", "t"));

        let text = CsvFormatter::head(&dataset, 2).to_string();
        assert_eq!("y,t\n1.5,true\n2,false\n", text);

        let all = CsvFormatter::new(&dataset).to_string();
        assert_eq!(4, all.lines().count());
    }
}
