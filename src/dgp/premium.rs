// Copyright 2022 CeresDB Project Authors. Licensed under Apache-2.0.

use super::{Dgp, SampleContext};
use crate::{
    errors::Result,
    model::{Roles, Y0, Y1},
    util::{indicator, round_to},
};

/// Premium subscription with an effect concentrated on customers between
/// 35 and 45.
#[derive(Debug, Clone, Copy, Default)]
pub struct Premium;

impl Dgp for Premium {
    fn name(&self) -> &str {
        "premium"
    }

    fn roles(&self) -> Roles {
        Roles::new("revenue", "premium").covariates(["age"])
    }

    fn default_size(&self) -> usize {
        300
    }

    fn covariates(&self, ctx: &mut SampleContext) -> Result<()> {
        let age = ctx
            .uniform(18.0, 60.0)?
            .into_iter()
            .map(|a| round_to(a, 2))
            .collect::<Vec<_>>();
        ctx.push("age", age)
    }

    fn potential_outcomes(&self, ctx: &mut SampleContext) -> Result<()> {
        let age = ctx.f64("age")?;
        let noise = ctx.normal(0.0, 0.15)?;
        let base = age
            .iter()
            .map(|a| 10.0 + 0.1 * indicator(30.0 < *a && *a < 50.0))
            .collect::<Vec<_>>();
        let tau = age
            .iter()
            .map(|a| 0.5 + 0.3 * indicator(35.0 < *a && *a < 45.0))
            .collect::<Vec<_>>();
        let y0 = (0..age.len())
            .map(|i| round_to(base[i] + noise[i], 2))
            .collect::<Vec<_>>();
        let y1 = (0..age.len())
            .map(|i| round_to(base[i] + tau[i] + noise[i], 2))
            .collect::<Vec<_>>();
        ctx.push_oracle("tau", tau)?;
        ctx.push_oracle(Y0, y0)?;
        ctx.push_oracle(Y1, y1)
    }

    /// One customer in ten is premium.
    fn assign_treatment(&self, ctx: &mut SampleContext) -> Result<()> {
        let premium = ctx.bernoulli(0.1)?;
        ctx.push("premium", premium)
    }
}
