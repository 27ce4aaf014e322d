// Copyright 2022 CeresDB Project Authors. Licensed under Apache-2.0.

use super::{suffixed_potential_outcomes, Dgp, SampleContext};
use crate::{
    errors::Result,
    model::{dataset, Roles},
    util::{indicator, round_to},
};

/// Promotional email sent mostly to returning customers.
///
/// Sales trend with age and the effect of the email changes sign with age,
/// young customers buy less after the email and older ones buy more.
#[derive(Debug, Clone, Copy, Default)]
pub struct PromotionalEmail;

fn sales_trend(new: f64, age: f64) -> f64 {
    -1.45 + 100.0 / age - ((age - 60.0).powi(2) / 500.0).max(0.0) + 0.2 * new
}

impl Dgp for PromotionalEmail {
    fn name(&self) -> &str {
        "promotional_email"
    }

    fn roles(&self) -> Roles {
        Roles::new("sales", "mail").covariates(["new", "age", "sales_old"])
    }

    fn default_size(&self) -> usize {
        100
    }

    fn potential_outcome_names(&self, outcome: &str) -> (String, String) {
        suffixed_potential_outcomes(outcome)
    }

    fn covariates(&self, ctx: &mut SampleContext) -> Result<()> {
        let new = ctx.bernoulli(0.4)?;
        let age = ctx
            .uniform(20.0, 60.0)?
            .into_iter()
            .map(|a| round_to(a, 2))
            .collect::<Vec<_>>();
        let trend = new
            .iter()
            .zip(&age)
            .map(|(n, a)| sales_trend(*n as f64, *a))
            .collect::<Vec<_>>();
        let sales_old = ctx
            .normal_each(&trend, 0.01)?
            .into_iter()
            .map(|s| s.max(0.0))
            .collect::<Vec<_>>();
        ctx.push("new", new)?;
        ctx.push("age", age)?;
        ctx.push("sales_old", sales_old)
    }

    fn potential_outcomes(&self, ctx: &mut SampleContext) -> Result<()> {
        let new = ctx.f64("new")?;
        let age = ctx.f64("age")?;
        let trend = new
            .iter()
            .zip(&age)
            .map(|(n, a)| sales_trend(*n, *a))
            .collect::<Vec<_>>();
        let sales_c = ctx
            .normal_each(&trend, 0.05)?
            .into_iter()
            .map(|s| s.max(0.0))
            .collect::<Vec<_>>();
        let effect = age
            .iter()
            .map(|a| -0.05 * indicator(*a < 30.0) + 0.08 * indicator(*a > 45.0))
            .collect::<Vec<_>>();

        ctx.push_oracle(&dataset::untreated("sales"), sales_c)?;
        ctx.push_effect("sales", effect)?;
        ctx.table_mut().round_floats(2);
        Ok(())
    }

    /// Returning customers get the email with probability 0.8, new ones
    /// with 0.2.
    fn assign_treatment(&self, ctx: &mut SampleContext) -> Result<()> {
        let e = ctx
            .f64("new")?
            .into_iter()
            .map(|n| 0.2 + 0.6 * (1.0 - n))
            .collect::<Vec<_>>();
        let mail = ctx.bernoulli_each(&e)?;
        ctx.push_oracle("e", e)?;
        ctx.push("mail", mail)
    }
}

#[cfg(test)]
mod test {
    use super::PromotionalEmail;
    use crate::{dgp::Dgp, options::GenerateOptions, stats};

    #[test]
    fn test_effect_depends_on_age() {
        let ds = PromotionalEmail
            .generate_data(&GenerateOptions::default().size(5000).oracle(true))
            .unwrap();
        let age = ds.f64_column("age").unwrap();
        let effect = ds.f64_column("effect_on_sales").unwrap();
        for (a, e) in age.iter().zip(&effect) {
            let expected = if *a < 30.0 {
                -0.05
            } else if *a > 45.0 {
                0.08
            } else {
                0.0
            };
            assert_eq!(expected, *e, "age {a}");
            assert!((20.0..=60.0).contains(a));
        }
        assert!(ds.f64_column("sales").unwrap().iter().all(|s| *s >= 0.0));

        // New customers are mailed less.
        let new = ds.f64_column("new").unwrap();
        let mail = ds.treatment().unwrap();
        assert!(stats::difference_in_means(&mail, &new).unwrap() < -0.4);
    }
}
