// Copyright 2022 CeresDB Project Authors. Licensed under Apache-2.0.

use std::path::Path;

use arrow::record_batch::RecordBatch;
use tracing::{debug, warn};

use super::{realize_binary, Dgp, SampleContext};
use crate::{
    errors::{Error, Result},
    io,
    model::{dataset::drop_null_rows, ColumnData, Roles, Y0, Y1},
    options::GenerateOptions,
};

const BASELINE: &str = "consumption_0";
const HOUSEHOLD: &str = "hhid";

/// Randomized cash transfer on top of real household survey data.
///
/// Baseline consumption comes from a survey file, the transfer adds 100 to
/// consumption and the outcome is log consumption, so the effect on welfare
/// is larger for poorer households.
#[derive(Debug, Clone)]
pub struct CashTransfer {
    survey: RecordBatch,
    covariates: Vec<String>,
}

impl CashTransfer {
    pub const TRANSFER: f64 = 100.0;

    /// Build from a survey batch holding a `consumption_0` column. Rows with
    /// missing values are dropped.
    pub fn new(survey: RecordBatch) -> Result<Self> {
        if survey.column_by_name(BASELINE).is_none() {
            return Err(Error::ColumnNotFound(BASELINE.to_string()));
        }
        let survey = drop_null_rows(&survey)?;
        let covariates = survey
            .schema()
            .fields()
            .iter()
            .map(|f| f.name().clone())
            .filter(|name| name != HOUSEHOLD && name != BASELINE)
            .collect();
        Ok(Self { survey, covariates })
    }

    pub fn from_csv(path: impl AsRef<Path>) -> Result<Self> {
        Self::new(io::read_csv(path)?)
    }
}

impl Dgp for CashTransfer {
    fn name(&self) -> &str {
        "cash_transfer"
    }

    fn roles(&self) -> Roles {
        Roles::new("welfare", "cash_transfer").covariates(self.covariates.iter().cloned())
    }

    fn default_size(&self) -> usize {
        self.survey.num_rows()
    }

    /// Every survey household is used once, a requested size is ignored.
    fn num_rows(&self, options: &GenerateOptions) -> Result<usize> {
        if let Some(size) = options.size {
            if size != self.survey.num_rows() {
                debug!(
                    size,
                    rows = self.survey.num_rows(),
                    "Ignoring size, the survey fixes the number of households"
                );
            }
        }
        Ok(self.survey.num_rows())
    }

    fn covariates(&self, ctx: &mut SampleContext) -> Result<()> {
        let schema = self.survey.schema();
        for (field, array) in schema.fields().iter().zip(self.survey.columns()) {
            let data = ColumnData::try_from_array(field.name(), array)?;
            if field.name() == BASELINE {
                ctx.push_oracle(BASELINE, data)?;
            } else {
                ctx.push(field.name(), data)?;
            }
        }
        Ok(())
    }

    fn potential_outcomes(&self, ctx: &mut SampleContext) -> Result<()> {
        let c0 = ctx.f64(BASELINE)?;
        let y0 = c0.iter().map(|c| c.ln()).collect::<Vec<_>>();
        let y1 = c0.iter().map(|c| (c + Self::TRANSFER).ln()).collect::<Vec<_>>();
        ctx.push_oracle(Y0, y0)?;
        ctx.push_oracle(Y1, y1)
    }

    fn assign_treatment(&self, ctx: &mut SampleContext) -> Result<()> {
        let t = ctx.bernoulli(0.5)?;
        ctx.push("cash_transfer", t)
    }

    fn realize_outcome(&self, ctx: &mut SampleContext) -> Result<()> {
        let c0 = ctx.f64(BASELINE)?;
        let t = ctx.f64("cash_transfer")?;
        let consumption = c0
            .iter()
            .zip(&t)
            .map(|(c, t)| c + t * Self::TRANSFER)
            .collect::<Vec<_>>();
        ctx.push("consumption", consumption)?;
        realize_binary(ctx, "welfare", "cash_transfer")?;

        // Consumption at or below zero has no finite log. With ground truth
        // kept, both potential outcomes must be finite too.
        let mut keep = ctx
            .f64("welfare")?
            .iter()
            .map(|w| w.is_finite())
            .collect::<Vec<_>>();
        if ctx.oracle() {
            for name in [Y0, Y1] {
                for (keep, y) in keep.iter_mut().zip(ctx.f64(name)?) {
                    *keep &= y.is_finite();
                }
            }
        }
        let dropped = keep.iter().filter(|k| !**k).count();
        if dropped > 0 {
            warn!(dropped, "Dropping households without a defined welfare");
        }
        ctx.table_mut().retain_rows(&keep)
    }
}

#[cfg(test)]
mod test {
    use std::sync::Arc;

    use arrow::{
        array::{Float64Array, Int64Array},
        datatypes::{DataType, Field, Schema},
        record_batch::RecordBatch,
    };

    use super::CashTransfer;
    use crate::{dgp::Dgp, errors::Error, options::GenerateOptions};

    fn survey() -> RecordBatch {
        let schema = Schema::new(vec![
            Field::new("hhid", DataType::Int64, false),
            Field::new("hh_size", DataType::Int64, true),
            Field::new("consumption_0", DataType::Float64, false),
        ]);
        RecordBatch::try_new(
            Arc::new(schema),
            vec![
                Arc::new(Int64Array::from(vec![1, 2, 3, 4, 5, 6])),
                Arc::new(Int64Array::from(vec![Some(3), Some(4), None, Some(2), Some(5), Some(1)])),
                Arc::new(Float64Array::from(vec![100.0, 900.0, 50.0, 400.0, -200.0, 250.0])),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_cash_transfer() {
        let dgp = CashTransfer::new(survey()).unwrap();
        assert_eq!(vec!["hh_size"], dgp.roles().x);

        let ds = dgp
            .generate_data(&GenerateOptions::default().size(1000).oracle(true))
            .unwrap();
        // One household has a missing size and one has no log consumption.
        assert_eq!(4, ds.num_rows());

        let c0 = ds.f64_column("consumption_0").unwrap();
        let c = ds.f64_column("consumption").unwrap();
        let t = ds.treatment().unwrap();
        let w = ds.outcome().unwrap();
        for i in 0..ds.num_rows() {
            assert_eq!(c0[i] + 100.0 * t[i], c[i]);
            assert!((w[i] - c[i].ln()).abs() < 1e-12);
        }

        let hidden = dgp.generate_data(&GenerateOptions::default()).unwrap();
        assert!(!hidden.has_column("consumption_0"));
        assert!(hidden.has_column("hhid"));
    }

    #[test]
    fn test_drops_households_without_finite_welfare() {
        let schema = Schema::new(vec![
            Field::new("hhid", DataType::Int64, false),
            Field::new("consumption_0", DataType::Float64, false),
        ]);
        let survey = RecordBatch::try_new(
            Arc::new(schema),
            vec![
                Arc::new(Int64Array::from(vec![1, 2, 3, 4])),
                Arc::new(Float64Array::from(vec![0.0, -50.0, 300.0, 80.0])),
            ],
        )
        .unwrap();
        let dgp = CashTransfer::new(survey).unwrap();

        for seed in 0..20 {
            let opts = GenerateOptions::default().seed(seed);
            let observed = dgp.generate_data(&opts).unwrap();
            assert!(observed.outcome().unwrap().iter().all(|w| w.is_finite()));

            let full = dgp.generate_data(&opts.oracle(true)).unwrap();
            assert_eq!(vec![3, 4], full.i64_column("hhid").unwrap());
            assert!(full.outcome().unwrap().iter().all(|w| w.is_finite()));
            assert!(full.true_ate().unwrap().is_finite());
        }
    }

    #[test]
    fn test_requires_baseline() {
        let batch = survey().project(&[0, 1]).unwrap();
        assert!(matches!(
            CashTransfer::new(batch),
            Err(Error::ColumnNotFound(_))
        ));
    }
}
