// Copyright 2022 CeresDB Project Authors. Licensed under Apache-2.0.

use super::{suffixed_potential_outcomes, Dgp, SampleContext};
use crate::{
    errors::Result,
    model::{dataset, Roles},
    util::indicator,
};

/// Gift to customers of a subscription service, with churn and revenue as
/// outcomes.
///
/// The gift keeps some recent customers from churning and raises the
/// revenue of older ones. Churned customers bring no revenue, whatever the
/// gift did to it.
#[derive(Debug, Clone, Copy, Default)]
pub struct Gift;

impl Dgp for Gift {
    fn name(&self) -> &str {
        "gift"
    }

    fn roles(&self) -> Roles {
        Roles::new("churn", "gift")
            .secondary_outcomes(["revenue"])
            .covariates(["months", "rev_old", "rev_change"])
    }

    fn default_size(&self) -> usize {
        100
    }

    fn potential_outcome_names(&self, outcome: &str) -> (String, String) {
        suffixed_potential_outcomes(outcome)
    }

    fn covariates(&self, ctx: &mut SampleContext) -> Result<()> {
        let months = ctx.exponential(5.0)?;
        let rev_old = ctx
            .exponential(7.0)?
            .into_iter()
            .map(|r| (r - 2.0).max(0.0))
            .collect::<Vec<_>>();
        let rev_change = ctx.normal(0.0, 2.0)?;
        ctx.push("months", months)?;
        ctx.push("rev_old", rev_old)?;
        ctx.push("rev_change", rev_change)
    }

    fn potential_outcomes(&self, ctx: &mut SampleContext) -> Result<()> {
        let months = ctx.f64("months")?;
        let rev_old = ctx.f64("rev_old")?;
        let rev_change = ctx.f64("rev_change")?;

        // Falling revenue and a small account make churn likely.
        let a = rev_change
            .iter()
            .map(|c| 1.0 - c * indicator(*c < 0.0))
            .collect::<Vec<_>>();
        let b = rev_old.iter().map(|r| 2.0 + r).collect::<Vec<_>>();
        let churn_c = ctx
            .beta_each(&a, &b)?
            .into_iter()
            .map(|u| i64::from(u > 0.4))
            .collect::<Vec<_>>();
        let revenue_c = ctx
            .exponential(7.0)?
            .iter()
            .zip(&rev_old)
            .map(|(r, old)| 0.8 * old + 0.2 * (r - 2.0).max(0.0))
            .collect::<Vec<_>>();

        let retained = ctx.bernoulli(0.3)?;
        let effect_on_churn = (0..churn_c.len())
            .map(|i| -retained[i] * i64::from(months[i] < 7.0) * churn_c[i])
            .collect::<Vec<_>>();
        let churn_t = churn_c
            .iter()
            .zip(&effect_on_churn)
            .map(|(c, e)| c + e)
            .collect::<Vec<_>>();
        let effect_on_revenue = ctx
            .normal(0.9, 0.5)?
            .iter()
            .zip(&months)
            .zip(&revenue_c)
            .map(|((e, m), r)| (e * indicator(*m > 3.0)).max(-r))
            .collect::<Vec<_>>();

        ctx.push_oracle(&dataset::untreated("churn"), churn_c)?;
        ctx.push_oracle(&dataset::effect_on("churn"), effect_on_churn)?;
        ctx.push_oracle(&dataset::treated("churn"), churn_t)?;
        ctx.push_oracle(&dataset::untreated("revenue"), revenue_c)?;
        ctx.push_effect("revenue", effect_on_revenue)?;
        ctx.table_mut().round_floats(2);
        Ok(())
    }

    fn assign_treatment(&self, ctx: &mut SampleContext) -> Result<()> {
        let gift = ctx.bernoulli(0.5)?;
        ctx.push("gift", gift)
    }

    fn post_treatment(&self, ctx: &mut SampleContext) -> Result<()> {
        let churn = ctx.f64("churn")?;
        let revenue = ctx
            .f64("revenue")?
            .iter()
            .zip(&churn)
            .map(|(r, c)| r * (1.0 - c))
            .collect::<Vec<_>>();
        ctx.replace("revenue", revenue)
    }
}
