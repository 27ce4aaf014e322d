// Copyright 2022 CeresDB Project Authors. Licensed under Apache-2.0.

use super::{Dgp, SampleContext};
use crate::{
    errors::{Error, Result},
    model::{Roles, Y0, Y1},
    util::indicator,
};

/// Daily revenue of markets before and after a TV campaign that only runs in
/// the treated group, for a difference in differences design.
///
/// The table is a balanced panel of `periods` days for every market in both
/// groups. A size of `n` lays out markets `1 .. n`, so `n - 1` per group. In
/// this panel the treatment role names the time column and the group role
/// names the treated indicator, units are treated in the days after the
/// midpoint.
#[derive(Debug, Clone, Copy)]
pub struct TvAdvertising {
    pub periods: usize,
}

impl Default for TvAdvertising {
    fn default() -> Self {
        Self { periods: 20 }
    }
}

impl TvAdvertising {
    /// Effect shared by every day of the treated group, also before the
    /// campaign.
    pub const GROUP_SHIFT: f64 = 1.2;

    /// Row layout: treated group outermost, then day, then market id.
    fn index(&self, row: usize, units: usize) -> (i64, i64, i64) {
        let per_group = self.periods * units;
        let treated = (row / per_group) as i64;
        let rest = row % per_group;
        let day = (rest / units) as i64 + 1;
        let id = (rest % units) as i64 + 1;
        (day, id, treated)
    }

    fn post(&self, day: f64) -> bool {
        day > self.periods as f64 / 2.0
    }
}

impl Dgp for TvAdvertising {
    fn name(&self) -> &str {
        "did"
    }

    fn roles(&self) -> Roles {
        Roles::new("revenue", "day").group("treated")
    }

    fn default_size(&self) -> usize {
        100
    }

    fn num_rows(&self, options: &crate::options::GenerateOptions) -> Result<usize> {
        if self.periods == 0 {
            return Err(Error::invalid("the panel needs at least one period"));
        }
        let units = options
            .size
            .unwrap_or_else(|| self.default_size())
            .saturating_sub(1);
        if units == 0 {
            return Err(Error::invalid("the panel needs a size of at least two"));
        }
        Ok(2 * self.periods * units)
    }

    fn covariates(&self, ctx: &mut SampleContext) -> Result<()> {
        let rows = ctx.num_rows();
        let units = rows / (2 * self.periods);
        let (mut day, mut id, mut treated) = (
            Vec::with_capacity(rows),
            Vec::with_capacity(rows),
            Vec::with_capacity(rows),
        );
        for row in 0..rows {
            let (d, i, t) = self.index(row, units);
            day.push(d);
            id.push(i);
            treated.push(t);
        }

        // Market fixed effects and common daily shocks.
        let alpha = id
            .iter()
            .map(|i| (*i as f64).sqrt() - 3.0 * indicator(*i > 10))
            .collect::<Vec<_>>();
        let noise = ctx.standard_normal();
        let gamma = day
            .iter()
            .zip(&noise)
            .map(|(d, e)| 0.1 * *d as f64 + e)
            .collect::<Vec<_>>();

        ctx.push("day", day)?;
        ctx.push("id", id)?;
        ctx.push("treated", treated)?;
        ctx.push_oracle("alpha_i", alpha)?;
        ctx.push_oracle("gamma_t", gamma)
    }

    fn potential_outcomes(&self, ctx: &mut SampleContext) -> Result<()> {
        let day = ctx.f64("day")?;
        let id = ctx.f64("id")?;
        let treated = ctx.f64("treated")?;
        let alpha = ctx.f64("alpha_i")?;
        let gamma = ctx.f64("gamma_t")?;
        let noise = ctx.standard_normal();

        let n = noise.len();
        let tau = (0..n)
            .map(|i| 0.5 * (1.0 + id[i]).ln() - 0.12 * day[i])
            .collect::<Vec<_>>();
        let y0 = (0..n)
            .map(|i| alpha[i] + gamma[i] + Self::GROUP_SHIFT * treated[i] + noise[i])
            .collect::<Vec<_>>();
        let y1 = y0.iter().zip(&tau).map(|(y, t)| y + t).collect::<Vec<_>>();

        ctx.push_oracle("tau_it", tau)?;
        ctx.push_oracle(Y0, y0)?;
        ctx.push_oracle(Y1, y1)
    }

    fn assign_treatment(&self, ctx: &mut SampleContext) -> Result<()> {
        let post = ctx
            .f64("day")?
            .into_iter()
            .map(|d| self.post(d))
            .collect::<Vec<_>>();
        ctx.push("post", post)
    }

    /// Only the treated group after the midpoint is exposed.
    fn realize_outcome(&self, ctx: &mut SampleContext) -> Result<()> {
        let post = ctx.f64("post")?;
        let treated = ctx.f64("treated")?;
        let y0 = ctx.f64(Y0)?;
        let y1 = ctx.f64(Y1)?;
        let revenue = (0..y0.len())
            .map(|i| {
                if post[i] > 0.5 && treated[i] > 0.5 {
                    y1[i]
                } else {
                    y0[i]
                }
            })
            .collect::<Vec<_>>();
        ctx.push("revenue", revenue)
    }
}
