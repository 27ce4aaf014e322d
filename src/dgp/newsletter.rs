// Copyright 2022 CeresDB Project Authors. Licensed under Apache-2.0.

use super::{Dgp, SampleContext};
use crate::{
    errors::Result,
    model::{Roles, Y0, Y1},
    stats::expit,
};

/// Effect of subscribing to a newsletter on revenue.
///
/// Richer users subscribe less and spend more, income is never observed. A
/// randomized reminder to sign up is a valid instrument.
#[derive(Debug, Clone, Copy, Default)]
pub struct Newsletter;

impl Newsletter {
    pub const EFFECT: f64 = 1.0;
}

impl Dgp for Newsletter {
    fn name(&self) -> &str {
        "newsletter"
    }

    fn roles(&self) -> Roles {
        Roles::new("revenue", "subscribe").instrument("reminder")
    }

    fn covariates(&self, ctx: &mut SampleContext) -> Result<()> {
        let reminder = ctx.bernoulli(0.5)?;
        let income = ctx.exponential(1.0)?;
        ctx.push("reminder", reminder)?;
        ctx.push_oracle("income", income)
    }

    fn potential_outcomes(&self, ctx: &mut SampleContext) -> Result<()> {
        let income = ctx.f64("income")?;
        let noise = ctx.standard_normal();
        let y0 = income
            .iter()
            .zip(&noise)
            .map(|(inc, e)| -1.0 + 2.0 * inc + e)
            .collect::<Vec<_>>();
        let y1 = y0.iter().map(|y| y + Self::EFFECT).collect::<Vec<_>>();

        ctx.push_oracle("tau", vec![Self::EFFECT; y0.len()])?;
        ctx.push_oracle(Y0, y0)?;
        ctx.push_oracle(Y1, y1)
    }

    fn assign_treatment(&self, ctx: &mut SampleContext) -> Result<()> {
        let income = ctx.f64("income")?;
        let reminder = ctx.f64("reminder")?;
        let noise = ctx.standard_normal();
        let subscribe = (0..noise.len())
            .map(|i| i64::from(expit(-income[i] + reminder[i] + noise[i]) > 0.5))
            .collect::<Vec<_>>();
        ctx.push("subscribe", subscribe)
    }
}
