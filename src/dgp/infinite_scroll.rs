// Copyright 2022 CeresDB Project Authors. Licensed under Apache-2.0.

use super::{suffixed_potential_outcomes, Dgp, SampleContext};
use crate::{
    errors::Result,
    model::{dataset, Roles},
};

/// Infinite scroll on a news feed and its effect on ad revenue.
///
/// The effect is the same for every user. Unless set, it is a heavy tailed
/// draw close to zero, so it is mostly too small to detect.
#[derive(Debug, Clone, Copy, Default)]
pub struct InfiniteScroll {
    pub true_effect: Option<f64>,
}

impl Dgp for InfiniteScroll {
    fn name(&self) -> &str {
        "infinite_scroll"
    }

    fn roles(&self) -> Roles {
        Roles::new("ad_revenue", "infinite_scroll").covariates(["past_revenue"])
    }

    fn default_size(&self) -> usize {
        100
    }

    fn potential_outcome_names(&self, outcome: &str) -> (String, String) {
        suffixed_potential_outcomes(outcome)
    }

    fn covariates(&self, ctx: &mut SampleContext) -> Result<()> {
        let past = ctx.normal(2.0, 1.0)?;
        ctx.push("past_revenue", past)
    }

    fn potential_outcomes(&self, ctx: &mut SampleContext) -> Result<()> {
        let past = ctx.f64("past_revenue")?;
        let revenue_c = ctx.normal_each(&past, 1.0)?;
        let effect = match self.true_effect {
            Some(effect) => effect,
            None => ctx.student_t(1.3)? / 300.0,
        };
        ctx.push_oracle(&dataset::untreated("ad_revenue"), revenue_c)?;
        ctx.push_effect("ad_revenue", vec![effect; past.len()])?;
        ctx.table_mut().round_floats(2);
        Ok(())
    }

    fn assign_treatment(&self, ctx: &mut SampleContext) -> Result<()> {
        let t = ctx.bernoulli(0.5)?;
        ctx.push("infinite_scroll", t)
    }
}

#[cfg(test)]
mod test {
    use super::InfiniteScroll;
    use crate::{dgp::Dgp, options::GenerateOptions};

    #[test]
    fn test_constant_effect() {
        let opts = GenerateOptions::default().size(500).oracle(true);
        let ds = InfiniteScroll::default().generate_data(&opts).unwrap();
        let effect = ds.f64_column("effect_on_ad_revenue").unwrap();
        assert!(effect.iter().all(|e| *e == effect[0]));

        let fixed = InfiniteScroll {
            true_effect: Some(0.5),
        };
        let ds = fixed.generate_data(&opts).unwrap();
        assert!((ds.true_effect_on("ad_revenue").unwrap() - 0.5).abs() < 0.01);
    }
}
