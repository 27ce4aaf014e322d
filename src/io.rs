// Copyright 2022 CeresDB Project Authors. Licensed under Apache-2.0.

//! Flat CSV files in and out

use std::{
    fs::File,
    io::{Seek, SeekFrom},
    path::Path,
    sync::Arc,
};

use arrow::{
    compute::concat_batches,
    csv::{reader::Format, ReaderBuilder, Writer},
    record_batch::RecordBatch,
};
use tracing::info;

use crate::{errors::Result, model::Dataset};

/// Read a whole CSV file with a header row, inferring the column types.
pub fn read_csv(path: impl AsRef<Path>) -> Result<RecordBatch> {
    let path = path.as_ref();
    let mut file = File::open(path)?;

    let format = Format::default().with_header(true);
    let (schema, _) = format.infer_schema(&mut file, None)?;
    file.seek(SeekFrom::Start(0))?;

    let schema = Arc::new(schema);
    let reader = ReaderBuilder::new(schema.clone())
        .with_format(format)
        .build(file)?;
    let batches = reader.collect::<std::result::Result<Vec<_>, _>>()?;
    let batch = concat_batches(&schema, &batches)?;

    info!(path = %path.display(), rows = batch.num_rows(), "Read csv");
    Ok(batch)
}

/// Write a batch with a header row.
pub fn write_csv(path: impl AsRef<Path>, batch: &RecordBatch) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path)?;
    let mut writer = Writer::new(file);
    writer.write(batch)?;

    info!(path = %path.display(), rows = batch.num_rows(), "Wrote csv");
    Ok(())
}

pub fn write_dataset(path: impl AsRef<Path>, dataset: &Dataset) -> Result<()> {
    write_csv(path, dataset.record_batch())
}

#[cfg(test)]
pub(crate) mod test {
    use std::path::PathBuf;

    use super::{read_csv, write_dataset};
    use crate::{dgp::Dgp, dgp::StoreCoupons, options::GenerateOptions};

    /// A fresh path under the system temp dir, unique per test name.
    pub(crate) fn temp_path(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("causal-dgp-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir.join(name)
    }

    #[test]
    fn test_csv_round_trip() {
        let ds = StoreCoupons
            .generate_data(&GenerateOptions::default().size(20))
            .unwrap();
        let path = temp_path("coupons.csv");
        write_dataset(&path, &ds).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("income,dayofweek,coupons,sales\n"));

        let batch = read_csv(&path).unwrap();
        assert_eq!(20, batch.num_rows());
        assert_eq!(4, batch.num_columns());
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_missing_file() {
        assert!(read_csv(temp_path("does-not-exist.csv")).is_err());
    }
}
