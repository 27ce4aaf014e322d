// Copyright 2022 CeresDB Project Authors. Licensed under Apache-2.0.

use super::{Dgp, SampleContext};
use crate::{errors::Result, model::Roles, util::round_to};

/// Rows overwritten with outliers, `(row, hours, transactions)`.
const OUTLIERS: [(usize, f64, f64); 3] = [(1, 2.0, 8.0), (2, 7.0, 21.0), (3, 6.7, 18.0)];

/// Hours played in a peer to peer game and the transactions made, with a
/// few outliers.
///
/// Transactions are three per hour plus noise, except on rows 1 to 3.
#[derive(Debug, Clone, Copy, Default)]
pub struct PeerToPeer;

impl Dgp for PeerToPeer {
    fn name(&self) -> &str {
        "p2p"
    }

    fn roles(&self) -> Roles {
        Roles::new("transactions", "hours")
    }

    fn default_size(&self) -> usize {
        50
    }

    fn covariates(&self, _ctx: &mut SampleContext) -> Result<()> {
        Ok(())
    }

    fn potential_outcomes(&self, ctx: &mut SampleContext) -> Result<()> {
        let noise = ctx.normal(0.0, 0.5)?;
        ctx.push_oracle("noise", noise)
    }

    fn assign_treatment(&self, ctx: &mut SampleContext) -> Result<()> {
        let mut hours = ctx
            .normal(1.0, 1.0)?
            .into_iter()
            .map(|h| 2.0 + round_to(h, 1))
            .collect::<Vec<_>>();
        for (row, h, _) in OUTLIERS {
            if let Some(v) = hours.get_mut(row) {
                *v = h;
            }
        }
        ctx.push("hours", hours)
    }

    fn realize_outcome(&self, ctx: &mut SampleContext) -> Result<()> {
        let noise = ctx.f64("noise")?;
        let mut transactions = ctx
            .f64("hours")?
            .iter()
            .zip(&noise)
            .map(|(h, e)| round_to(3.0 * h + e, 2))
            .collect::<Vec<_>>();
        for (row, _, t) in OUTLIERS {
            if let Some(v) = transactions.get_mut(row) {
                *v = t;
            }
        }
        ctx.push("transactions", transactions)
    }
}
