// Copyright 2022 CeresDB Project Authors. Licensed under Apache-2.0.

use super::{Dgp, SampleContext};
use crate::{
    errors::Result,
    model::{Roles, Y0, Y1},
    util::{indicator, rint},
};

/// Revenue of users exposed to an ad campaign.
///
/// Exposure depends on gender and ethnicity, which also shift revenue, so the
/// naive comparison of exposed and unexposed users is confounded.
#[derive(Debug, Clone, Copy, Default)]
pub struct AdExposure;

impl Dgp for AdExposure {
    fn name(&self) -> &str {
        "ad"
    }

    fn roles(&self) -> Roles {
        Roles::new("revenue", "ad_exposure").covariates(["male", "black", "age", "educ"])
    }

    fn covariates(&self, ctx: &mut SampleContext) -> Result<()> {
        let male = ctx.bernoulli(0.5)?;
        let black = ctx.bernoulli(0.5)?;
        let age = ctx
            .normal(45.0, 10.0)?
            .into_iter()
            .map(rint)
            .collect::<Vec<_>>();
        let rates = black.iter().map(|b| 2.0 * *b as f64 + 1.0).collect::<Vec<_>>();
        let educ = ctx.poisson_each(&rates)?;

        ctx.push("male", male)?;
        ctx.push("black", black)?;
        ctx.push("age", age)?;
        ctx.push("educ", educ)
    }

    fn potential_outcomes(&self, ctx: &mut SampleContext) -> Result<()> {
        let male = ctx.f64("male")?;
        let black = ctx.f64("black")?;
        let age = ctx.f64("age")?;
        let educ = ctx.f64("educ")?;
        let noise = ctx.standard_normal();

        let mut y0 = Vec::with_capacity(noise.len());
        let mut y1 = Vec::with_capacity(noise.len());
        for i in 0..noise.len() {
            let log_educ = (1.0 + educ[i]).ln();
            let base = 0.5 * male[i] - 0.5 * black[i] + 0.1 * log_educ
                - 0.2 * indicator(age[i] > 50.0)
                + noise[i];
            let effect = 0.5 + 0.4 * male[i] + 0.1 * log_educ + 0.2 * indicator(age[i] > 40.0);
            y0.push(base);
            y1.push(base + effect);
        }

        ctx.push_oracle(Y0, y0)?;
        ctx.push_oracle(Y1, y1)
    }

    fn assign_treatment(&self, ctx: &mut SampleContext) -> Result<()> {
        let male = ctx.f64("male")?;
        let black = ctx.f64("black")?;
        let u = ctx.uniform(0.0, 2.0)?;
        let exposed = u
            .iter()
            .zip(male.iter().zip(&black))
            .map(|(u, (m, b))| u + 0.3 * m - 0.2 * b > 1.0)
            .collect::<Vec<_>>();
        ctx.push("ad_exposure", exposed)
    }
}

#[cfg(test)]
mod test {
    use super::AdExposure;
    use crate::{dgp::Dgp, options::GenerateOptions, stats};

    #[test]
    fn test_generate_ad_data() {
        let ds = AdExposure
            .generate_data(&GenerateOptions::default().size(4000).oracle(true))
            .unwrap();
        assert_eq!(4000, ds.num_rows());

        let exposed = ds.bool_column("ad_exposure").unwrap();
        let y = ds.outcome().unwrap();
        let y0 = ds.f64_column("Y0").unwrap();
        let y1 = ds.f64_column("Y1").unwrap();
        for i in 0..ds.num_rows() {
            assert_eq!(if exposed[i] { y1[i] } else { y0[i] }, y[i]);
        }

        // Effect is .5 + .4 male + .1 ln(1+educ) + .2 [age > 40], always positive.
        assert!(y1.iter().zip(&y0).all(|(a, b)| a > b));
        let ate = ds.true_ate().unwrap();
        assert!(ate > 0.8 && ate < 1.1, "ate {ate}");

        let age = ds.f64_column("age").unwrap();
        assert!(age.iter().all(|a| a.fract() == 0.0));
        assert!((stats::mean(&age) - 45.0).abs() < 1.0);

        // Men are more likely to be exposed.
        let male = ds.f64_column("male").unwrap();
        let exposed = ds.treatment().unwrap();
        let gap = stats::difference_in_means(&exposed, &male).unwrap();
        assert!(gap > 0.1, "gap {gap}");
    }
}
