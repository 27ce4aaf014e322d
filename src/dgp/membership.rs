// Copyright 2022 CeresDB Project Authors. Licensed under Apache-2.0.

use super::{Dgp, SampleContext};
use crate::{
    errors::Result,
    model::{Roles, Y0, Y1},
    stats::expit,
    util::round_to,
};

const VISITS: [&str; 4] = [
    "visit_flights",
    "visit_hotels",
    "visit_restaurants",
    "visit_rental",
];

/// Effect of a membership program on later revenue, with an easier sign-up
/// flow randomized as instrument.
///
/// The effect is heterogeneous in browsing behaviour and device, and a hidden
/// income drives both membership and revenue.
#[derive(Debug, Clone, Copy, Default)]
pub struct Membership;

impl Dgp for Membership {
    fn name(&self) -> &str {
        "membership"
    }

    fn roles(&self) -> Roles {
        let x = VISITS
            .iter()
            .copied()
            .chain(["origin_US", "mobile", "revenue_pre"]);
        Roles::new("revenue_post", "became_member")
            .covariates(x)
            .instrument("easier_signup")
    }

    fn default_size(&self) -> usize {
        100_000
    }

    fn covariates(&self, ctx: &mut SampleContext) -> Result<()> {
        for name in VISITS {
            let visits = ctx.randint(0, 28)?;
            ctx.push(name, visits)?;
        }
        let origin = ctx.bernoulli(0.7)?;
        ctx.push("origin_US", origin)?;
        let mobile = ctx.bernoulli(0.3)?;
        ctx.push("mobile", mobile)?;
        let revenue_pre = ctx.exponential(1.0)?;
        ctx.push("revenue_pre", revenue_pre)?;

        let income = ctx.exponential(1.0)?;
        ctx.push_oracle("income", income)?;
        let signup = ctx.bernoulli(0.5)?;
        ctx.push("easier_signup", signup)
    }

    fn potential_outcomes(&self, ctx: &mut SampleContext) -> Result<()> {
        let flights = ctx.f64("visit_flights")?;
        let rental = ctx.f64("visit_rental")?;
        let mobile = ctx.f64("mobile")?;
        let revenue_pre = ctx.f64("revenue_pre")?;
        let income = ctx.f64("income")?;
        let noise = ctx.standard_normal();

        let n = noise.len();
        let tau = (0..n)
            .map(|i| 0.2 + 0.3 * flights[i] - 0.2 * rental[i] + mobile[i])
            .collect::<Vec<_>>();
        let y0 = (0..n)
            .map(|i| 1.0 + revenue_pre[i] + 2.0 * income[i] + noise[i])
            .collect::<Vec<_>>();
        let y1 = y0.iter().zip(&tau).map(|(y, t)| y + t).collect::<Vec<_>>();

        ctx.push_oracle("tau", tau)?;
        ctx.push_oracle(Y0, y0)?;
        ctx.push_oracle(Y1, y1)?;
        ctx.table_mut().round_floats(2);
        Ok(())
    }

    fn assign_treatment(&self, ctx: &mut SampleContext) -> Result<()> {
        let income = ctx.f64("income")?;
        let signup = ctx.f64("easier_signup")?;
        let noise = ctx.standard_normal();
        let e = (0..noise.len())
            .map(|i| expit(-income[i] + signup[i] + noise[i]))
            .collect::<Vec<_>>();
        let member = ctx.bernoulli_each(&e)?;
        ctx.push_oracle("e", e.into_iter().map(|e| round_to(e, 2)).collect::<Vec<_>>())?;
        ctx.push("became_member", member)
    }
}

#[cfg(test)]
mod test {
    use super::Membership;
    use crate::{dgp::Dgp, options::GenerateOptions, stats};

    #[test]
    fn test_membership_data() {
        let ds = Membership
            .generate_data(&GenerateOptions::default().size(5000).oracle(true))
            .unwrap();
        assert_eq!(7, ds.roles().x.len());

        let visits = ds.i64_column("visit_flights").unwrap();
        assert!(visits.iter().all(|v| (0..28).contains(v)));

        // Everything is rounded to cents.
        for v in ds.f64_column("revenue_post").unwrap() {
            assert!(((v * 100.0).round() - v * 100.0).abs() < 1e-6);
        }

        let z = ds.f64_column("easier_signup").unwrap();
        let t = ds.treatment().unwrap();
        assert!(stats::difference_in_means(&t, &z).unwrap() > 0.1);

        let tau = ds.f64_column("tau").unwrap();
        let ate = ds.true_ate().unwrap();
        assert!((ate - stats::mean(&tau)).abs() < 0.01);
    }
}
