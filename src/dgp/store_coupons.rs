// Copyright 2022 CeresDB Project Authors. Licensed under Apache-2.0.

use super::{Dgp, SampleContext};
use crate::{
    errors::{Error, Result},
    model::{ColumnData, Roles},
    util::round_to,
};

const SALES_BASE: &str = "sales_base";

/// The weekday column is stored as text, read it back as numbers.
fn day_numbers(ctx: &SampleContext) -> Result<Vec<f64>> {
    match &ctx.table().get("dayofweek")?.data {
        ColumnData::Utf8(days) => days
            .iter()
            .map(|d| {
                d.parse::<f64>()
                    .map_err(|e| Error::invalid(format!("dayofweek {d}: {e}")))
            })
            .collect(),
        other => Err(Error::ColumnType {
            name: "dayofweek".to_string(),
            expected: "Utf8".to_string(),
            actual: other.data_type().to_string(),
        }),
    }
}

/// Stores handing out coupons, where richer neighbourhoods get fewer coupons.
#[derive(Debug, Clone, Copy, Default)]
pub struct StoreCoupons;

impl StoreCoupons {
    /// Sales per unit of coupons, before the final scaling by ten.
    pub const EFFECT: f64 = 20.0;
}

impl Dgp for StoreCoupons {
    fn name(&self) -> &str {
        "store_coupons"
    }

    fn roles(&self) -> Roles {
        Roles::new("sales", "coupons").covariates(["income", "dayofweek"])
    }

    fn default_size(&self) -> usize {
        300
    }

    fn covariates(&self, ctx: &mut SampleContext) -> Result<()> {
        let income = ctx
            .normal(50.0, 10.0)?
            .into_iter()
            .map(|v| round_to(v, 3))
            .collect::<Vec<_>>();
        let day = ctx
            .choice(&[1, 2, 3, 4, 5, 6, 7])?
            .into_iter()
            .map(|d| d.to_string())
            .collect::<Vec<_>>();
        ctx.push("income", income)?;
        ctx.push("dayofweek", day)
    }

    fn potential_outcomes(&self, ctx: &mut SampleContext) -> Result<()> {
        let income = ctx.f64("income")?;
        let day = day_numbers(ctx)?;
        let noise = ctx.normal(10.0, 2.0)?;
        let base = (0..noise.len())
            .map(|i| income[i] + day[i] + noise[i])
            .collect::<Vec<_>>();
        ctx.push_oracle(SALES_BASE, base)
    }

    fn assign_treatment(&self, ctx: &mut SampleContext) -> Result<()> {
        let income = ctx.f64("income")?;
        let noise = ctx.normal(0.5, 0.1)?;
        let coupons = income
            .iter()
            .zip(&noise)
            .map(|(inc, e)| round_to(e - inc / 200.0, 3))
            .collect::<Vec<_>>();
        ctx.push("coupons", coupons)
    }

    fn realize_outcome(&self, ctx: &mut SampleContext) -> Result<()> {
        let base = ctx.f64(SALES_BASE)?;
        let coupons = ctx.f64("coupons")?;
        let sales = base
            .iter()
            .zip(&coupons)
            .map(|(b, c)| round_to(10.0 * (b + Self::EFFECT * c), 1))
            .collect::<Vec<_>>();
        ctx.push("sales", sales)
    }
}

#[cfg(test)]
mod test {
    use super::StoreCoupons;
    use crate::{dgp::Dgp, options::GenerateOptions, stats::Ols};

    #[test]
    fn test_store_coupons_data() {
        let ds = StoreCoupons
            .generate_data(&GenerateOptions::default())
            .unwrap();
        assert_eq!(300, ds.num_rows());
        assert_eq!(
            vec!["income", "dayofweek", "coupons", "sales"],
            ds.column_names()
        );

        let days = ds.str_column("dayofweek").unwrap();
        assert!(days
            .iter()
            .all(|d| ["1", "2", "3", "4", "5", "6", "7"].contains(&d.as_str())));

        // Coupons go to poorer stores, so the naive slope understates the
        // effect of 200 sales per coupon unit.
        let coupons = ds.treatment().unwrap();
        let sales = ds.outcome().unwrap();
        let income = ds.f64_column("income").unwrap();
        let first_stage = Ols::fit(&income, &coupons).unwrap();
        assert!(first_stage.slope < 0.0);
        let naive = Ols::fit(&coupons, &sales).unwrap();
        assert!(naive.slope < 200.0, "slope {}", naive.slope);
    }
}
