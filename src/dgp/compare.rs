// Copyright 2022 CeresDB Project Authors. Licensed under Apache-2.0.

use super::{Dgp, SampleContext};
use crate::{
    errors::Result,
    model::{Roles, Y0, Y1},
    stats,
    util::{rint, round_to},
};

/// Confounded assignment with heterogeneous effects, to compare estimators
/// on the same data.
///
/// Effects grow with income and fall with age, and so does the propensity
/// to be treated. The average effect is 2.
#[derive(Debug, Clone, Copy, Default)]
pub struct Compare;

impl Compare {
    pub const AVERAGE_EFFECT: f64 = 2.0;
}

fn baseline(male: f64, age: f64, income: f64) -> f64 {
    3.0 * male - age.sqrt() + 2.0 * income.ln()
}

impl Dgp for Compare {
    fn name(&self) -> &str {
        "compare"
    }

    fn roles(&self) -> Roles {
        Roles::new("outcome", "treated").covariates(["male", "age", "income"])
    }

    fn default_size(&self) -> usize {
        10_000
    }

    fn covariates(&self, ctx: &mut SampleContext) -> Result<()> {
        let male = ctx.bernoulli(0.5)?;
        let age = ctx
            .beta(2.0, 2.0)?
            .into_iter()
            .map(|b| rint(18.0 + b * 50.0))
            .collect::<Vec<_>>();
        let income = ctx
            .lognormal(7.5, 0.3)?
            .into_iter()
            .map(rint)
            .collect::<Vec<_>>();
        ctx.push("male", male)?;
        ctx.push("age", age)?;
        ctx.push("income", income)
    }

    fn potential_outcomes(&self, ctx: &mut SampleContext) -> Result<()> {
        let male = ctx.f64("male")?;
        let age = ctx.f64("age")?;
        let income = ctx.f64("income")?;
        let base = (0..male.len())
            .map(|i| baseline(male[i], age[i], income[i]))
            .collect::<Vec<_>>();

        let beta = ctx.normal_each(&base, 1.0)?;
        let shift = Self::AVERAGE_EFFECT - stats::mean(&beta);
        let beta = beta.into_iter().map(|b| b + shift).collect::<Vec<_>>();

        let noise = ctx.normal(0.0, 5.0)?;
        let y0 = (0..base.len())
            .map(|i| round_to(20.0 + base[i] + noise[i], 2))
            .collect::<Vec<_>>();
        let y1 = (0..base.len())
            .map(|i| round_to(20.0 + base[i] + beta[i] + noise[i], 2))
            .collect::<Vec<_>>();
        ctx.push_oracle("beta", beta)?;
        ctx.push_oracle(Y0, y0)?;
        ctx.push_oracle(Y1, y1)
    }

    fn assign_treatment(&self, ctx: &mut SampleContext) -> Result<()> {
        let male = ctx.f64("male")?;
        let age = ctx.f64("age")?;
        let income = ctx.f64("income")?;
        let e = (0..male.len())
            .map(|i| {
                (0.55 - 0.1 * male[i] + age[i].sqrt() / 3.0 - income[i].ln() / 3.6).clamp(0.0, 1.0)
            })
            .collect::<Vec<_>>();
        let treated = ctx.bernoulli_each(&e)?;
        ctx.push_oracle("e", e)?;
        ctx.push("treated", treated)
    }
}
