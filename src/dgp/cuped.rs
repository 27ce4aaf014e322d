// Copyright 2022 CeresDB Project Authors. Licensed under Apache-2.0.

use super::{suffixed_potential_outcomes, Dgp, SampleContext};
use crate::{
    errors::Result,
    model::{dataset, Roles},
};

/// Ad campaign with revenue measured before and after, the setting of
/// variance reduction with a pre-period outcome.
///
/// `revenue0 = alpha + beta * d + e0` and
/// `revenue1 = revenue0 + gamma + delta * d + e1`. With `beta` at zero the
/// pre-period revenue is not affected by the campaign.
#[derive(Debug, Clone, Copy)]
pub struct Cuped {
    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
    pub delta: f64,
}

impl Default for Cuped {
    fn default() -> Self {
        Self {
            alpha: 5.0,
            beta: 0.0,
            gamma: 3.0,
            delta: 2.0,
        }
    }
}

impl Dgp for Cuped {
    fn name(&self) -> &str {
        "cuped"
    }

    fn roles(&self) -> Roles {
        Roles::new("revenue1", "ad_campaign").secondary_outcomes(["revenue0"])
    }

    fn default_size(&self) -> usize {
        100
    }

    fn potential_outcome_names(&self, outcome: &str) -> (String, String) {
        suffixed_potential_outcomes(outcome)
    }

    fn covariates(&self, ctx: &mut SampleContext) -> Result<()> {
        let ids = (1..=ctx.num_rows() as i64).collect::<Vec<_>>();
        ctx.push("i", ids)
    }

    fn potential_outcomes(&self, ctx: &mut SampleContext) -> Result<()> {
        let n = ctx.num_rows();
        let pre = ctx
            .standard_normal()
            .into_iter()
            .map(|e| self.alpha + e)
            .collect::<Vec<_>>();
        let post = ctx
            .standard_normal()
            .iter()
            .zip(&pre)
            .map(|(e, r)| r + self.gamma + e)
            .collect::<Vec<_>>();

        ctx.push_oracle(&dataset::untreated("revenue0"), pre)?;
        ctx.push_effect("revenue0", vec![self.beta; n])?;
        ctx.push_oracle(&dataset::untreated("revenue1"), post)?;
        ctx.push_effect("revenue1", vec![self.beta + self.delta; n])?;
        ctx.table_mut().round_floats(2);
        Ok(())
    }

    fn assign_treatment(&self, ctx: &mut SampleContext) -> Result<()> {
        let d = ctx.bernoulli(0.5)?;
        ctx.push("ad_campaign", d)
    }
}
