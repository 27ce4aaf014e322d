// Copyright 2022 CeresDB Project Authors. Licensed under Apache-2.0.

use super::{Dgp, SampleContext};
use crate::{
    errors::Result,
    model::Roles,
    util::{indicator, rint, round_to},
};

/// Returns to education with ability as an unobserved confounder.
///
/// Every extra year of education adds 100 to the wage, able people both
/// study longer and earn more.
#[derive(Debug, Clone, Copy, Default)]
pub struct EducationWages;

impl EducationWages {
    pub const RETURN: f64 = 100.0;
}

impl Dgp for EducationWages {
    fn name(&self) -> &str {
        "educ_wages"
    }

    fn roles(&self) -> Roles {
        Roles::new("wage", "education").covariates(["age", "gender"])
    }

    fn default_size(&self) -> usize {
        300
    }

    fn covariates(&self, ctx: &mut SampleContext) -> Result<()> {
        let ability = ctx
            .uniform(0.0, 10.0)?
            .into_iter()
            .map(|a| round_to(a, 3))
            .collect::<Vec<_>>();
        let age = ctx.randint(25, 65)?;
        let gender = ctx.choice_str(&["male", "female"])?;
        ctx.push_oracle("ability", ability)?;
        ctx.push("age", age)?;
        ctx.push("gender", gender)
    }

    /// Wage in units of 100 without education, the potential wage with
    /// `s` years of education is `100 * rint(wage_base + s)`.
    fn potential_outcomes(&self, ctx: &mut SampleContext) -> Result<()> {
        let ability = ctx.f64("ability")?;
        let age = ctx.f64("age")?;
        let male = ctx
            .strings("gender")?
            .iter()
            .map(|g| indicator(g == "male"))
            .collect::<Vec<_>>();
        let noise = ctx.normal(0.0, 4.0)?;
        let base = (0..noise.len())
            .map(|i| ability[i] / 2.0 + 8.0 * age[i].ln() + 2.0 * male[i] + noise[i])
            .collect::<Vec<_>>();
        ctx.push_oracle("wage_base", base)
    }

    fn assign_treatment(&self, ctx: &mut SampleContext) -> Result<()> {
        let ability = ctx.f64("ability")?;
        let education = ctx
            .randint(5, 10)?
            .into_iter()
            .zip(&ability)
            .map(|(years, a)| years + (a / 3.0).floor() as i64)
            .collect::<Vec<_>>();
        ctx.push("education", education)
    }

    fn realize_outcome(&self, ctx: &mut SampleContext) -> Result<()> {
        let base = ctx.f64("wage_base")?;
        let wage = ctx
            .f64("education")?
            .iter()
            .zip(&base)
            .map(|(s, b)| Self::RETURN * rint(b + s))
            .collect::<Vec<_>>();
        ctx.push("wage", wage)
    }
}

#[cfg(test)]
mod test {
    use super::EducationWages;
    use crate::{dgp::Dgp, options::GenerateOptions, stats::Ols};

    #[test]
    fn test_ability_biases_returns() {
        let ds = EducationWages
            .generate_data(&GenerateOptions::default().size(5000).oracle(true))
            .unwrap();
        let education = ds.f64_column("education").unwrap();
        assert!(education.iter().all(|s| (5.0..=12.0).contains(s)));
        let wage = ds.outcome().unwrap();
        assert!(wage.iter().all(|w| (w / 100.0).fract() == 0.0));

        let naive = Ols::fit(&education, &wage).unwrap().slope;
        assert!(naive > EducationWages::RETURN + 15.0, "naive {naive}");

        // Holding ability fixed recovers the return.
        let base = ds.f64_column("wage_base").unwrap();
        let net = wage
            .iter()
            .zip(&base)
            .map(|(w, b)| w - EducationWages::RETURN * b)
            .collect::<Vec<_>>();
        let slope = Ols::fit(&education, &net).unwrap().slope;
        assert!((slope - EducationWages::RETURN).abs() < 5.0, "slope {slope}");

        let hidden = EducationWages.generate_data(&GenerateOptions::default()).unwrap();
        assert!(!hidden.has_column("ability"));
        assert_eq!(300, hidden.num_rows());
    }
}
