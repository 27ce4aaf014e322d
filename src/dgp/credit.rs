// Copyright 2022 CeresDB Project Authors. Licensed under Apache-2.0.

use super::{Dgp, SampleContext};
use crate::{
    errors::Result,
    model::{Roles, Y0, Y1},
    util::round_to,
};

/// New card transfer interface, the transfer speed is capped by the
/// connection speed.
#[derive(Debug, Clone, Copy, Default)]
pub struct CreditCard;

impl Dgp for CreditCard {
    fn name(&self) -> &str {
        "credit"
    }

    fn roles(&self) -> Roles {
        Roles::new("transfer", "newUI").covariates(["connection"])
    }

    fn default_size(&self) -> usize {
        100
    }

    fn covariates(&self, ctx: &mut SampleContext) -> Result<()> {
        let connection = ctx
            .lognormal(3.0, 1.0)?
            .into_iter()
            .map(|c| round_to(c, 2))
            .collect::<Vec<_>>();
        ctx.push("connection", connection)
    }

    fn potential_outcomes(&self, ctx: &mut SampleContext) -> Result<()> {
        let connection = ctx.f64("connection")?;
        let z = ctx.standard_normal();
        let speed = |shift: f64| {
            z.iter()
                .zip(&connection)
                .map(|(z, c)| round_to((2.8 + shift + z).exp().min(*c), 2))
                .collect::<Vec<_>>()
        };
        let y0 = speed(0.0);
        let y1 = speed(1.0);
        ctx.push_oracle(Y0, y0)?;
        ctx.push_oracle(Y1, y1)
    }

    fn assign_treatment(&self, ctx: &mut SampleContext) -> Result<()> {
        let t = ctx.bernoulli(0.5)?;
        ctx.push("newUI", t)
    }
}
