// Copyright 2022 CeresDB Project Authors. Licensed under Apache-2.0.

//! [Dataset] is a generated table together with its causal roles

use arrow::{
    array::{
        Array, ArrayRef, BooleanArray, Float32Array, Float64Array, Int32Array, Int64Array,
        StringArray,
    },
    compute::filter_record_batch,
    datatypes::DataType,
    record_batch::RecordBatch,
};
use paste::paste;
use tracing::warn;

use crate::{
    errors::{Error, Result},
    model::row::{Row, RowBuilder},
    stats,
};

/// Oracle column names of the untreated and treated potential outcomes.
pub const Y0: &str = "Y0";
pub const Y1: &str = "Y1";

/// Untreated potential outcome of `outcome` in processes with several
/// outcomes.
pub fn untreated(outcome: &str) -> String {
    format!("{outcome}_c")
}

/// Treated potential outcome of `outcome` in processes with several
/// outcomes.
pub fn treated(outcome: &str) -> String {
    format!("{outcome}_t")
}

/// Individual effect of the treatment on `outcome`.
pub fn effect_on(outcome: &str) -> String {
    format!("effect_on_{outcome}")
}

/// Names of the columns playing a causal role.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Roles {
    /// Outcome.
    pub y: String,
    /// Further outcomes realized from the same assignment.
    pub secondary: Vec<String>,
    /// Treatment.
    pub t: String,
    /// Observed covariates.
    pub x: Vec<String>,
    /// Instrument, if the process has one.
    pub z: Option<String>,
    /// Treatment group indicator of panel designs.
    pub d: Option<String>,
}

impl Roles {
    pub fn new(y: impl Into<String>, t: impl Into<String>) -> Self {
        Self {
            y: y.into(),
            t: t.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn secondary_outcomes<S: Into<String>>(mut self, y: impl IntoIterator<Item = S>) -> Self {
        self.secondary = y.into_iter().map(Into::into).collect();
        self
    }

    /// Every outcome, the main one first.
    pub fn outcomes(&self) -> Vec<&str> {
        std::iter::once(self.y.as_str())
            .chain(self.secondary.iter().map(String::as_str))
            .collect()
    }

    #[must_use]
    pub fn covariates<S: Into<String>>(mut self, x: impl IntoIterator<Item = S>) -> Self {
        self.x = x.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn instrument(mut self, z: impl Into<String>) -> Self {
        self.z = Some(z.into());
        self
    }

    #[must_use]
    pub fn group(mut self, d: impl Into<String>) -> Self {
        self.d = Some(d.into());
        self
    }
}

fn downcast<'a, A: Array + 'static>(name: &str, array: &'a ArrayRef, expected: &str) -> Result<&'a A> {
    array.as_any().downcast_ref::<A>().ok_or_else(|| Error::ColumnType {
        name: name.to_string(),
        expected: expected.to_string(),
        actual: array.data_type().to_string(),
    })
}

fn null_error(name: &str) -> Error {
    Error::InvalidParameter(format!("column {name} contains nulls"))
}

macro_rules! typed_column {
    ($ty:ident, $arrow_array_type:ty) => {
        paste! {
            #[doc = "Values of a non-null `" $ty "` column."]
            pub fn [<$ty _column>](&self, name: &str) -> Result<Vec<$ty>> {
                let array = self.column(name)?;
                let typed = downcast::<$arrow_array_type>(name, array, stringify!($arrow_array_type))?;
                if typed.null_count() > 0 {
                    return Err(null_error(name));
                }
                Ok((0..typed.len()).map(|i| typed.value(i)).collect())
            }
        }
    };
}

#[derive(Debug, Clone)]
pub struct Dataset {
    batch: RecordBatch,
    roles: Roles,
}

impl Dataset {
    pub fn new(batch: RecordBatch, roles: Roles) -> Self {
        Self { batch, roles }
    }

    pub fn record_batch(&self) -> &RecordBatch {
        &self.batch
    }

    pub fn into_record_batch(self) -> RecordBatch {
        self.batch
    }

    pub fn roles(&self) -> &Roles {
        &self.roles
    }

    pub fn num_rows(&self) -> usize {
        self.batch.num_rows()
    }

    pub fn column_names(&self) -> Vec<String> {
        self.batch
            .schema()
            .fields()
            .iter()
            .map(|f| f.name().clone())
            .collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.batch.schema().index_of(name).is_ok()
    }

    pub fn column(&self, name: &str) -> Result<&ArrayRef> {
        self.batch
            .column_by_name(name)
            .ok_or_else(|| Error::ColumnNotFound(name.to_string()))
    }

    /// Numeric column as floats, integer and boolean columns are widened.
    pub fn f64_column(&self, name: &str) -> Result<Vec<f64>> {
        let array = self.column(name)?;
        if array.null_count() > 0 {
            return Err(null_error(name));
        }
        let values = match array.data_type() {
            DataType::Float64 => downcast::<Float64Array>(name, array, "Float64")?
                .values()
                .to_vec(),
            DataType::Float32 => downcast::<Float32Array>(name, array, "Float32")?
                .values()
                .iter()
                .map(|v| *v as f64)
                .collect(),
            DataType::Int64 => downcast::<Int64Array>(name, array, "Int64")?
                .values()
                .iter()
                .map(|v| *v as f64)
                .collect(),
            DataType::Int32 => downcast::<Int32Array>(name, array, "Int32")?
                .values()
                .iter()
                .map(|v| *v as f64)
                .collect(),
            DataType::Boolean => {
                let typed = downcast::<BooleanArray>(name, array, "Boolean")?;
                (0..typed.len())
                    .map(|i| if typed.value(i) { 1.0 } else { 0.0 })
                    .collect()
            }
            other => {
                return Err(Error::ColumnType {
                    name: name.to_string(),
                    expected: "numeric".to_string(),
                    actual: other.to_string(),
                })
            }
        };
        Ok(values)
    }

    typed_column!(i64, Int64Array);

    typed_column!(bool, BooleanArray);

    pub fn str_column(&self, name: &str) -> Result<Vec<String>> {
        let array = self.column(name)?;
        let typed = downcast::<StringArray>(name, array, "Utf8")?;
        if typed.null_count() > 0 {
            return Err(null_error(name));
        }
        Ok((0..typed.len()).map(|i| typed.value(i).to_string()).collect())
    }

    /// The outcome column.
    pub fn outcome(&self) -> Result<Vec<f64>> {
        self.f64_column(&self.roles.y)
    }

    /// The treatment column.
    pub fn treatment(&self) -> Result<Vec<f64>> {
        self.f64_column(&self.roles.t)
    }

    /// Keep only the named columns, in the given order.
    pub fn select(&self, names: &[&str]) -> Result<Dataset> {
        let schema = self.batch.schema();
        let indices = names
            .iter()
            .map(|name| {
                schema
                    .index_of(name)
                    .map_err(|_| Error::ColumnNotFound(name.to_string()))
            })
            .collect::<Result<Vec<_>>>()?;
        let batch = self.batch.project(&indices)?;
        Ok(Dataset::new(batch, self.roles.clone()))
    }

    /// Remove the named columns, unknown names are ignored.
    pub fn drop_columns(&self, names: &[&str]) -> Result<Dataset> {
        let schema = self.batch.schema();
        let indices = schema
            .fields()
            .iter()
            .enumerate()
            .filter(|(_, f)| !names.contains(&f.name().as_str()))
            .map(|(idx, _)| idx)
            .collect::<Vec<_>>();
        let batch = self.batch.project(&indices)?;
        Ok(Dataset::new(batch, self.roles.clone()))
    }

    /// Drop every row holding a null in any column.
    pub fn drop_nulls(&self) -> Result<Dataset> {
        let batch = drop_null_rows(&self.batch)?;
        Ok(Dataset::new(batch, self.roles.clone()))
    }

    pub fn rows(&self) -> Result<Vec<Row>> {
        Ok(RowBuilder::with_arrow_record_batch(&self.batch)?.build())
    }

    /// Average treatment effect computed from the oracle potential outcomes.
    pub fn true_ate(&self) -> Result<f64> {
        self.true_ate_of(Y0, Y1)
    }

    /// Average effect on `outcome` from its `_c` and `_t` potential outcomes.
    pub fn true_effect_on(&self, outcome: &str) -> Result<f64> {
        self.true_ate_of(&untreated(outcome), &treated(outcome))
    }

    pub fn true_ate_of(&self, untreated: &str, treated: &str) -> Result<f64> {
        let y0 = self.f64_column(untreated)?;
        let y1 = self.f64_column(treated)?;
        let effects = y1.iter().zip(&y0).map(|(a, b)| a - b).collect::<Vec<_>>();
        Ok(stats::mean(&effects))
    }
}

pub(crate) fn drop_null_rows(batch: &RecordBatch) -> Result<RecordBatch> {
    let keep = (0..batch.num_rows())
        .map(|row| batch.columns().iter().all(|c| c.is_valid(row)))
        .collect::<Vec<_>>();
    let dropped = keep.iter().filter(|k| !**k).count();
    if dropped == 0 {
        return Ok(batch.clone());
    }
    warn!(dropped, rows = batch.num_rows(), "Dropping rows with missing values");
    Ok(filter_record_batch(batch, &BooleanArray::from(keep))?)
}

#[cfg(test)]
mod test {
    use std::sync::Arc;

    use arrow::{
        array::{BooleanArray, Float64Array, Int64Array},
        datatypes::{DataType, Field, Schema},
        record_batch::RecordBatch,
    };

    use super::{Dataset, Roles};
    use crate::errors::Error;

    fn sample() -> Dataset {
        let schema = Schema::new(vec![
            Field::new("Y", DataType::Float64, true),
            Field::new("T", DataType::Boolean, false),
            Field::new("x", DataType::Int64, false),
            Field::new("Y0", DataType::Float64, false),
            Field::new("Y1", DataType::Float64, false),
        ]);
        let batch = RecordBatch::try_new(
            Arc::new(schema),
            vec![
                Arc::new(Float64Array::from(vec![Some(1.0), None, Some(4.0)])),
                Arc::new(BooleanArray::from(vec![false, true, true])),
                Arc::new(Int64Array::from(vec![7, 8, 9])),
                Arc::new(Float64Array::from(vec![1.0, 2.0, 3.0])),
                Arc::new(Float64Array::from(vec![2.0, 3.0, 4.0])),
            ],
        )
        .unwrap();
        Dataset::new(batch, Roles::new("Y", "T").covariates(["x"]))
    }

    #[test]
    fn test_typed_columns() {
        let ds = sample();
        assert_eq!(vec![0.0, 1.0, 1.0], ds.treatment().unwrap());
        assert_eq!(vec![7, 8, 9], ds.i64_column("x").unwrap());
        assert_eq!(vec![false, true, true], ds.bool_column("T").unwrap());
        assert_eq!(vec![7.0, 8.0, 9.0], ds.f64_column("x").unwrap());
        assert!(matches!(ds.i64_column("Y0"), Err(Error::ColumnType { .. })));
        assert!(matches!(ds.outcome(), Err(Error::InvalidParameter(_))));
        assert!(matches!(ds.column("nope"), Err(Error::ColumnNotFound(_))));
    }

    #[test]
    fn test_projection_and_nulls() {
        let ds = sample();
        let selected = ds.select(&["x", "Y"]).unwrap();
        assert_eq!(vec!["x", "Y"], selected.column_names());

        let dropped = ds.drop_columns(&["Y0", "Y1", "missing"]).unwrap();
        assert_eq!(vec!["Y", "T", "x"], dropped.column_names());

        let complete = ds.drop_nulls().unwrap();
        assert_eq!(2, complete.num_rows());
        assert_eq!(vec![1.0, 4.0], complete.outcome().unwrap());
    }

    #[test]
    fn test_true_ate() {
        let ds = sample();
        assert!((ds.true_ate().unwrap() - 1.0).abs() < 1e-12);
        assert!(matches!(
            ds.true_effect_on("Y"),
            Err(Error::ColumnNotFound(_))
        ));
    }

    #[test]
    fn test_outcome_roles() {
        let roles = Roles::new("churn", "gift").secondary_outcomes(["revenue"]);
        assert_eq!(vec!["churn", "revenue"], roles.outcomes());
        assert_eq!(vec!["Y"], Roles::new("Y", "T").outcomes());
        assert_eq!("revenue_c", super::untreated("revenue"));
        assert_eq!("revenue_t", super::treated("revenue"));
        assert_eq!("effect_on_revenue", super::effect_on("revenue"));
    }
}
