// Copyright 2022 CeresDB Project Authors. Licensed under Apache-2.0.

use super::{Dgp, SampleContext};
use crate::{errors::Result, model::Roles};

/// Advertising targeted on past sales, where leaving out past sales biases
/// the effect of ads.
///
/// `ads = c * past_sales + N(-3, 1)` and
/// `sales = a * ads + b * past_sales + N(0, 1)`.
#[derive(Debug, Clone, Copy)]
pub struct Pretest {
    pub a: f64,
    pub b: f64,
    pub c: f64,
}

impl Default for Pretest {
    fn default() -> Self {
        Self { a: 1.0, b: 0.3, c: 3.0 }
    }
}

impl Dgp for Pretest {
    fn name(&self) -> &str {
        "pretest"
    }

    fn roles(&self) -> Roles {
        Roles::new("sales", "ads").covariates(["past_sales"])
    }

    fn covariates(&self, ctx: &mut SampleContext) -> Result<()> {
        let past = ctx.normal(5.0, 1.0)?;
        ctx.push("past_sales", past)
    }

    /// Sales without any ads.
    fn potential_outcomes(&self, ctx: &mut SampleContext) -> Result<()> {
        let past = ctx.f64("past_sales")?;
        let noise = ctx.standard_normal();
        let base = past
            .iter()
            .zip(&noise)
            .map(|(p, e)| self.b * p + e)
            .collect::<Vec<_>>();
        ctx.push_oracle("sales_base", base)
    }

    fn assign_treatment(&self, ctx: &mut SampleContext) -> Result<()> {
        let past = ctx.f64("past_sales")?;
        let ads = ctx
            .normal(-3.0, 1.0)?
            .iter()
            .zip(&past)
            .map(|(e, p)| self.c * p + e)
            .collect::<Vec<_>>();
        ctx.push("ads", ads)
    }

    fn realize_outcome(&self, ctx: &mut SampleContext) -> Result<()> {
        let base = ctx.f64("sales_base")?;
        let sales = ctx
            .f64("ads")?
            .iter()
            .zip(&base)
            .map(|(ads, b)| self.a * ads + b)
            .collect::<Vec<_>>();
        ctx.push("sales", sales)
    }
}

#[cfg(test)]
mod test {
    use super::Pretest;
    use crate::{dgp::Dgp, options::GenerateOptions, stats::Ols};

    #[test]
    fn test_omitting_past_sales_biases_ads() {
        let dgp = Pretest::default();
        let ds = dgp
            .generate_data(&GenerateOptions::default().size(20_000))
            .unwrap();
        assert_eq!(20_000, ds.num_rows());

        // The short regression picks up b * c / (c^2 + 1) on top of a.
        let ads = ds.treatment().unwrap();
        let sales = ds.outcome().unwrap();
        let slope = Ols::fit(&ads, &sales).unwrap().slope;
        let expected = dgp.a + dgp.b * dgp.c / (dgp.c * dgp.c + 1.0);
        assert!((slope - expected).abs() < 0.03, "slope {slope}");
        assert!(slope > dgp.a + 0.05);
    }
}
