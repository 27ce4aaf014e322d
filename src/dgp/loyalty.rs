// Copyright 2022 CeresDB Project Authors. Licensed under Apache-2.0.

use super::{Dgp, SampleContext};
use crate::{
    errors::Result,
    model::{Roles, Y0, Y1},
    util::{indicator, round_to},
};

/// Loyalty card whose effect on spend grows with age.
///
/// Spend is censored at zero, so the card has no visible effect on
/// customers who spend nothing either way.
#[derive(Debug, Clone, Copy, Default)]
pub struct Loyalty;

impl Dgp for Loyalty {
    fn name(&self) -> &str {
        "loyalty"
    }

    fn roles(&self) -> Roles {
        Roles::new("spend", "loyalty").covariates(["age", "gender"])
    }

    fn default_size(&self) -> usize {
        10_000
    }

    fn covariates(&self, ctx: &mut SampleContext) -> Result<()> {
        let age = ctx.randint(18, 55)?;
        let gender = ctx.weighted_choice(&["Male", "Female"], &[0.6, 0.4])?;
        let log_income = age
            .iter()
            .map(|a| 4.0 + (*a as f64).ln())
            .collect::<Vec<_>>();
        let income = ctx.lognormal_each(&log_income, 0.1)?;
        ctx.push("age", age)?;
        ctx.push("gender", gender)?;
        ctx.push_oracle("income", income)
    }

    fn potential_outcomes(&self, ctx: &mut SampleContext) -> Result<()> {
        let age = ctx.f64("age")?;
        let income = ctx.f64("income")?;
        let female = ctx
            .strings("gender")?
            .iter()
            .map(|g| indicator(g == "Female"))
            .collect::<Vec<_>>();
        let spend = |card: f64| {
            (0..age.len())
                .map(|i| {
                    let spend = 50.0 * female[i] + income[i] / 10.0 + card * age[i].sqrt();
                    (round_to(spend, 2) - 220.0).max(0.0)
                })
                .collect::<Vec<_>>()
        };
        let y0 = spend(0.0);
        let y1 = spend(1.0);
        ctx.push_oracle(Y0, y0)?;
        ctx.push_oracle(Y1, y1)
    }

    fn assign_treatment(&self, ctx: &mut SampleContext) -> Result<()> {
        let t = ctx.bernoulli(0.5)?;
        ctx.push("loyalty", t)
    }
}

#[cfg(test)]
mod test {
    use super::Loyalty;
    use crate::{dgp::Dgp, options::GenerateOptions};

    #[test]
    fn test_spend_is_censored() {
        let ds = Loyalty
            .generate_data(&GenerateOptions::default().oracle(true))
            .unwrap();
        let gender = ds.str_column("gender").unwrap();
        let female = gender.iter().filter(|g| *g == "Female").count() as f64;
        assert!((female / ds.num_rows() as f64 - 0.4).abs() < 0.03);
        assert!(ds.i64_column("age").unwrap().iter().all(|a| (18..55).contains(a)));

        let y0 = ds.f64_column("Y0").unwrap();
        let y1 = ds.f64_column("Y1").unwrap();
        assert!(ds.outcome().unwrap().iter().all(|s| *s >= 0.0));
        assert!(y0.iter().zip(&y1).all(|(a, b)| b >= a));
        assert!(y1.iter().any(|y| *y == 0.0));
        assert!(ds.true_ate().unwrap() > 0.0);
    }
}
