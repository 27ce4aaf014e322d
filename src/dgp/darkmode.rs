// Copyright 2022 CeresDB Project Authors. Licensed under Apache-2.0.

use super::{Dgp, SampleContext};
use crate::{
    errors::Result,
    model::{Roles, Y0, Y1},
    util::{rint, round_to},
};

/// Dark mode on a blog and the time spent reading.
///
/// Young readers and men pick dark mode more often, and men read less, so
/// comparing readers with and without dark mode is confounded.
#[derive(Debug, Clone, Copy, Default)]
pub struct DarkMode;

impl DarkMode {
    pub const EFFECT: f64 = 2.0;
}

impl Dgp for DarkMode {
    fn name(&self) -> &str {
        "darkmode"
    }

    fn roles(&self) -> Roles {
        Roles::new("read_time", "dark_mode").covariates(["male", "age", "hours"])
    }

    fn default_size(&self) -> usize {
        300
    }

    fn covariates(&self, ctx: &mut SampleContext) -> Result<()> {
        let male = ctx.bernoulli(0.45)?;
        let age = ctx
            .beta(2.0, 2.0)?
            .into_iter()
            .map(|b| rint(18.0 + b * 50.0))
            .collect::<Vec<_>>();
        // Hours read so far, at least one tenth so the log stays finite.
        let hours = ctx
            .lognormal(5.0, 1.3)?
            .into_iter()
            .map(|h| round_to(h, 1).clamp(0.1, 2000.0))
            .collect::<Vec<_>>();
        ctx.push("male", male)?;
        ctx.push("age", age)?;
        ctx.push("hours", hours)
    }

    fn potential_outcomes(&self, ctx: &mut SampleContext) -> Result<()> {
        let male = ctx.f64("male")?;
        let hours = ctx.f64("hours")?;
        let noise = ctx.normal(0.0, 4.0)?;
        let base = (0..noise.len())
            .map(|i| 10.0 - 4.0 * male[i] + 2.0 * hours[i].ln() + noise[i])
            .collect::<Vec<_>>();
        let y0 = base.iter().map(|y| round_to(*y, 1)).collect::<Vec<_>>();
        let y1 = base
            .iter()
            .map(|y| round_to(y + Self::EFFECT, 1))
            .collect::<Vec<_>>();
        ctx.push_oracle(Y0, y0)?;
        ctx.push_oracle(Y1, y1)
    }

    fn assign_treatment(&self, ctx: &mut SampleContext) -> Result<()> {
        let male = ctx.f64("male")?;
        let age = ctx.f64("age")?;
        let e = male
            .iter()
            .zip(&age)
            .map(|(m, a)| (0.8 + 0.3 * m - (a - 18.0).sqrt() / 10.0).clamp(0.0, 1.0))
            .collect::<Vec<_>>();
        let dark_mode = ctx.bernoulli_each(&e)?;
        ctx.push_oracle("e", e)?;
        ctx.push("dark_mode", dark_mode)
    }
}
