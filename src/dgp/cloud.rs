// Copyright 2022 CeresDB Project Authors. Licensed under Apache-2.0.

use super::{suffixed_potential_outcomes, Dgp, SampleContext};
use crate::{
    errors::Result,
    model::{dataset, Roles},
};

/// New cloud machines that cost more and bring in twice their extra cost
/// as revenue, the return on investment question.
#[derive(Debug, Clone, Copy, Default)]
pub struct CloudMachines;

fn difference(treated: &[f64], untreated: &[f64]) -> Vec<f64> {
    treated.iter().zip(untreated).map(|(t, c)| t - c).collect()
}

fn clamp_at_zero(values: impl IntoIterator<Item = f64>) -> Vec<f64> {
    values.into_iter().map(|v| v.max(0.0)).collect()
}

impl Dgp for CloudMachines {
    fn name(&self) -> &str {
        "cloud"
    }

    fn roles(&self) -> Roles {
        Roles::new("cost", "new_machine").secondary_outcomes(["revenue"])
    }

    fn default_size(&self) -> usize {
        100
    }

    fn potential_outcome_names(&self, outcome: &str) -> (String, String) {
        suffixed_potential_outcomes(outcome)
    }

    fn covariates(&self, _ctx: &mut SampleContext) -> Result<()> {
        Ok(())
    }

    fn potential_outcomes(&self, ctx: &mut SampleContext) -> Result<()> {
        let cost = ctx.exponential(3.0)?;
        let extra = ctx.uniform(0.0, 1.0)?;
        let revenue_mean = cost.iter().map(|c| 10.0 * c - 4.0).collect::<Vec<_>>();
        let revenue = ctx.normal_each(&revenue_mean, 1.0)?;

        let cost_c = clamp_at_zero(cost.iter().copied());
        let cost_t = clamp_at_zero(cost.iter().zip(&extra).map(|(c, e)| c + e));
        let revenue_c = clamp_at_zero(revenue.iter().copied());
        let revenue_t = clamp_at_zero(revenue.iter().zip(&extra).map(|(r, e)| r + 2.0 * e));

        for (outcome, untreated, treated) in [("cost", cost_c, cost_t), ("revenue", revenue_c, revenue_t)] {
            ctx.push_oracle(&dataset::effect_on(outcome), difference(&treated, &untreated))?;
            ctx.push_oracle(&dataset::untreated(outcome), untreated)?;
            ctx.push_oracle(&dataset::treated(outcome), treated)?;
        }
        ctx.table_mut().round_floats(2);
        Ok(())
    }

    fn assign_treatment(&self, ctx: &mut SampleContext) -> Result<()> {
        let t = ctx.bernoulli(0.5)?;
        ctx.push("new_machine", t)
    }
}
