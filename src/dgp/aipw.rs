// Copyright 2022 CeresDB Project Authors. Licensed under Apache-2.0.

//! Processes with many normal covariates, of which only the first three
//! matter, and a propensity score that is logistic in `x1`.

use super::{covariate_names, Dgp, SampleContext};
use crate::{
    errors::{Error, Result},
    model::{Roles, Y0, Y1},
    stats::expit,
};

/// Oracle column of the propensity score.
pub const PROPENSITY: &str = "e";

pub(crate) fn normal_covariates(ctx: &mut SampleContext, p: usize) -> Result<()> {
    // x1, x2 and x3 enter the outcome equations.
    if p < 3 {
        return Err(Error::invalid(format!("need at least 3 covariates, got {p}")));
    }
    for name in covariate_names(p) {
        let x = ctx.standard_normal();
        ctx.push(&name, x)?;
    }
    Ok(())
}

/// Treat with probability `expit(x1)`.
pub(crate) fn logistic_assignment(ctx: &mut SampleContext) -> Result<()> {
    let e = ctx.f64("x1")?.into_iter().map(expit).collect::<Vec<_>>();
    let u = ctx.uniform(0.0, 1.0)?;
    let t = u
        .iter()
        .zip(&e)
        .map(|(u, e)| i64::from(u < e))
        .collect::<Vec<_>>();
    ctx.push_oracle(PROPENSITY, e)?;
    ctx.push("T", t)
}

/// `Y(0) = max(x1 + x2, 0)` and `Y(1) = max(x1 + x3, 0) - treated_shift`.
fn kinked_outcomes(ctx: &mut SampleContext, treated_shift: f64) -> Result<()> {
    let x1 = ctx.f64("x1")?;
    let x2 = ctx.f64("x2")?;
    let x3 = ctx.f64("x3")?;
    let y0 = x1
        .iter()
        .zip(&x2)
        .map(|(a, b)| (a + b).max(0.0))
        .collect::<Vec<_>>();
    let y1 = x1
        .iter()
        .zip(&x3)
        .map(|(a, c)| (a + c).max(0.0) - treated_shift)
        .collect::<Vec<_>>();
    ctx.push_oracle(Y0, y0)?;
    ctx.push_oracle(Y1, y1)
}

/// Process used to compare inverse propensity weighting with its augmented
/// version. Treatment lowers the outcome by 0.1 on top of switching the
/// relevant covariate from `x2` to `x3`.
#[derive(Debug, Clone, Copy)]
pub struct Aipw {
    pub p: usize,
}

impl Default for Aipw {
    fn default() -> Self {
        Self { p: 20 }
    }
}

impl Dgp for Aipw {
    fn name(&self) -> &str {
        "aipw"
    }

    fn roles(&self) -> Roles {
        Roles::new("Y", "T").covariates(covariate_names(self.p))
    }

    fn covariates(&self, ctx: &mut SampleContext) -> Result<()> {
        normal_covariates(ctx, self.p)
    }

    fn potential_outcomes(&self, ctx: &mut SampleContext) -> Result<()> {
        kinked_outcomes(ctx, 0.1)
    }

    fn assign_treatment(&self, ctx: &mut SampleContext) -> Result<()> {
        logistic_assignment(ctx)
    }
}

/// Same design as [`Aipw`] with a smaller treatment shift of 0.05.
#[derive(Debug, Clone, Copy)]
pub struct Kinked {
    pub p: usize,
}

impl Default for Kinked {
    fn default() -> Self {
        Self { p: 20 }
    }
}

impl Dgp for Kinked {
    fn name(&self) -> &str {
        "kinked"
    }

    fn roles(&self) -> Roles {
        Roles::new("Y", "T").covariates(covariate_names(self.p))
    }

    fn covariates(&self, ctx: &mut SampleContext) -> Result<()> {
        normal_covariates(ctx, self.p)
    }

    fn potential_outcomes(&self, ctx: &mut SampleContext) -> Result<()> {
        kinked_outcomes(ctx, 0.05)
    }

    fn assign_treatment(&self, ctx: &mut SampleContext) -> Result<()> {
        logistic_assignment(ctx)
    }
}
