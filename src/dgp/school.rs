// Copyright 2022 CeresDB Project Authors. Licensed under Apache-2.0.

use super::{Dgp, SampleContext};
use crate::{errors::Result, model::Roles};

const MATH_BASE: &str = "math_base";
const HISTORY_BASE: &str = "history_base";

/// Class size and test scores.
///
/// Good schools have smaller classes and better students, and a hidden
/// ability drives both scores. The history score shares every confounder
/// with the math score, so it works as a negative control.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClassSize;

impl ClassSize {
    /// Score points per additional student in the class.
    pub const EFFECT: f64 = 0.2;
}

impl Dgp for ClassSize {
    fn name(&self) -> &str {
        "school"
    }

    fn roles(&self) -> Roles {
        Roles::new("math_score", "class_size").covariates([
            "math_hours",
            "history_hours",
            "good_school",
            "class_year",
        ])
    }

    fn covariates(&self, ctx: &mut SampleContext) -> Result<()> {
        let math_hours = ctx.randint(2, 5)?;
        let history_hours = ctx.randint(2, 5)?;
        let good_school = ctx.bernoulli(0.5)?;
        let class_year = ctx.randint(1, 5)?;
        let ability = ctx.exponential(1.0)?;
        let history_study = ctx.randint(3, 5)?;

        ctx.push("math_hours", math_hours)?;
        ctx.push("history_hours", history_hours)?;
        ctx.push("good_school", good_school)?;
        ctx.push("class_year", class_year)?;
        ctx.push_oracle("ability", ability)?;
        ctx.push_oracle("history_study", history_study)
    }

    /// Scores without the class size term, which depends on the continuous
    /// treatment and is added once the class size is drawn.
    fn potential_outcomes(&self, ctx: &mut SampleContext) -> Result<()> {
        let math_hours = ctx.f64("math_hours")?;
        let history_study = ctx.f64("history_study")?;
        let good_school = ctx.f64("good_school")?;
        let ability = ctx.f64("ability")?;

        let noise = ctx.standard_normal();
        let math = (0..noise.len())
            .map(|i| 1.0 + ability[i] + math_hours[i] + 5.0 * good_school[i] + noise[i])
            .collect::<Vec<_>>();
        let noise = ctx.standard_normal();
        let history = (0..noise.len())
            .map(|i| 1.0 + ability[i] + history_study[i] + 5.0 * good_school[i] + noise[i])
            .collect::<Vec<_>>();

        ctx.push_oracle(MATH_BASE, math)?;
        ctx.push_oracle(HISTORY_BASE, history)
    }

    fn assign_treatment(&self, ctx: &mut SampleContext) -> Result<()> {
        let class_year = ctx.i64("class_year")?;
        let good_school = ctx.i64("good_school")?;
        let base = ctx.poisson(25.0)?;
        let class_size = (0..base.len())
            .map(|i| base[i] - class_year[i] - 7 * good_school[i])
            .collect::<Vec<_>>();
        ctx.push("class_size", class_size)
    }

    fn realize_outcome(&self, ctx: &mut SampleContext) -> Result<()> {
        let class_size = ctx.f64("class_size")?;
        for (base, score) in [(MATH_BASE, "math_score"), (HISTORY_BASE, "hist_score")] {
            let values = ctx
                .f64(base)?
                .into_iter()
                .zip(&class_size)
                .map(|(b, c)| b + Self::EFFECT * c)
                .collect::<Vec<_>>();
            ctx.push(score, values)?;
        }
        Ok(())
    }
}
