// Copyright 2022 CeresDB Project Authors. Licensed under Apache-2.0.

use super::{
    aipw::{normal_covariates, PROPENSITY},
    covariate_names, Dgp, SampleContext,
};
use crate::{
    errors::Result,
    model::{Roles, Y0, Y1},
    stats::expit,
};

/// Randomized experiment with an effect that varies smoothly with `x3`.
#[derive(Debug, Clone, Copy)]
pub struct HeterogeneousEffect {
    pub p: usize,
    /// Probability of treatment, the same for every unit.
    pub propensity: f64,
}

impl Default for HeterogeneousEffect {
    fn default() -> Self {
        Self {
            p: 10,
            propensity: 0.3,
        }
    }
}

impl Dgp for HeterogeneousEffect {
    fn name(&self) -> &str {
        "heterogeneous"
    }

    fn roles(&self) -> Roles {
        Roles::new("Y", "T").covariates(covariate_names(self.p))
    }

    fn default_size(&self) -> usize {
        4000
    }

    fn covariates(&self, ctx: &mut SampleContext) -> Result<()> {
        normal_covariates(ctx, self.p)
    }

    fn potential_outcomes(&self, ctx: &mut SampleContext) -> Result<()> {
        let x1 = ctx.f64("x1")?;
        let x2 = ctx.f64("x2")?;
        let tau = ctx.f64("x3")?.into_iter().map(expit).collect::<Vec<_>>();
        let noise = ctx.standard_normal();

        let y0 = (0..noise.len())
            .map(|i| (x1[i] + x2[i]).max(0.0) + noise[i])
            .collect::<Vec<_>>();
        let y1 = y0.iter().zip(&tau).map(|(y, t)| y + t).collect::<Vec<_>>();

        ctx.push_oracle("tau", tau)?;
        ctx.push_oracle(Y0, y0)?;
        ctx.push_oracle(Y1, y1)
    }

    fn assign_treatment(&self, ctx: &mut SampleContext) -> Result<()> {
        let e = vec![self.propensity; ctx.num_rows()];
        let u = ctx.uniform(0.0, 1.0)?;
        let t = u
            .iter()
            .map(|u| i64::from(*u < self.propensity))
            .collect::<Vec<_>>();
        ctx.push_oracle(PROPENSITY, e)?;
        ctx.push("T", t)
    }
}
