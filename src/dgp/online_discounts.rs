// Copyright 2022 CeresDB Project Authors. Licensed under Apache-2.0.

use super::{suffixed_potential_outcomes, Dgp, SampleContext};
use crate::{
    errors::Result,
    model::{dataset, Roles},
    util::indicator,
};

const DEVICES: [&str; 2] = ["desktop", "mobile"];
const BROWSERS: [&str; 7] = ["chrome", "safari", "firefox", "explorer", "edge", "brave", "other"];
const REGIONS: [&str; 10] = ["0", "1", "2", "3", "4", "5", "6", "7", "8", "9"];

/// Randomized online discount whose effect varies with the time of the
/// visit, the device, the browser and the region.
#[derive(Debug, Clone, Copy, Default)]
pub struct OnlineDiscounts;

impl OnlineDiscounts {
    /// Effect of the discount, never negative and largest in the evening.
    pub fn effect(time: f64, device: &str, browser: &str, region: &str) -> f64 {
        let effect = 7.0 * (-(time - 18.0).powi(2) / 100.0).exp() + 3.0 * indicator(browser == "safari")
            - 2.0 * indicator(device == "desktop")
            + indicator(region == "3")
            - 2.5;
        effect.max(0.0)
    }
}

impl Dgp for OnlineDiscounts {
    fn name(&self) -> &str {
        "online_discounts"
    }

    fn roles(&self) -> Roles {
        Roles::new("spend", "discount").covariates(["time", "device", "browser", "region"])
    }

    fn default_size(&self) -> usize {
        100
    }

    fn potential_outcome_names(&self, outcome: &str) -> (String, String) {
        suffixed_potential_outcomes(outcome)
    }

    fn covariates(&self, ctx: &mut SampleContext) -> Result<()> {
        let time = ctx
            .beta(1.0, 1.0)?
            .into_iter()
            .map(|u| u * 24.0)
            .collect::<Vec<_>>();
        let device = ctx.choice_str(&DEVICES)?;
        let browser = ctx.choice_str(&BROWSERS)?;
        let region = ctx.choice_str(&REGIONS)?;
        ctx.push("time", time)?;
        ctx.push("device", device)?;
        ctx.push("browser", browser)?;
        ctx.push("region", region)
    }

    fn potential_outcomes(&self, ctx: &mut SampleContext) -> Result<()> {
        let spend_c = ctx
            .exponential(10.0)?
            .into_iter()
            .map(|s| s - 5.0)
            .collect::<Vec<_>>();
        let time = ctx.f64("time")?;
        let device = ctx.strings("device")?;
        let browser = ctx.strings("browser")?;
        let region = ctx.strings("region")?;
        let effect = (0..time.len())
            .map(|i| Self::effect(time[i], &device[i], &browser[i], &region[i]))
            .collect::<Vec<_>>();

        ctx.push_oracle(&dataset::untreated("spend"), spend_c)?;
        ctx.push_effect("spend", effect)?;
        ctx.table_mut().round_floats(2);
        Ok(())
    }

    fn assign_treatment(&self, ctx: &mut SampleContext) -> Result<()> {
        let discount = ctx.bernoulli(0.5)?;
        ctx.push("discount", discount)
    }
}
