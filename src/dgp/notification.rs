// Copyright 2022 CeresDB Project Authors. Licensed under Apache-2.0.

use super::{suffixed_potential_outcomes, Dgp, SampleContext};
use crate::{
    errors::Result,
    model::{dataset, Roles},
};

/// Extra spend of a subscriber.
const SUBSCRIBER_SPEND: f64 = 6.0;

/// Notification asking every other user to subscribe to a newsletter.
///
/// Both the subscription and the spend respond to the notification, and
/// subscribers spend more. The notification is an instrument for the
/// subscription, richer users subscribe more on their own.
#[derive(Debug, Clone, Copy, Default)]
pub struct NotificationNewsletter;

impl Dgp for NotificationNewsletter {
    fn name(&self) -> &str {
        "notification_newsletter"
    }

    fn roles(&self) -> Roles {
        Roles::new("subscription", "notification")
            .secondary_outcomes(["spend"])
            .covariates(["spend_old"])
    }

    fn default_size(&self) -> usize {
        100
    }

    fn potential_outcome_names(&self, outcome: &str) -> (String, String) {
        suffixed_potential_outcomes(outcome)
    }

    fn covariates(&self, ctx: &mut SampleContext) -> Result<()> {
        let budget = ctx.exponential(100.0)?;
        let noise = ctx.normal(1.0, 1.0)?;
        let spend = budget
            .iter()
            .zip(&noise)
            .map(|(b, e)| b.sqrt() + e)
            .collect::<Vec<_>>();
        let spend_old = ctx
            .normal_each(&spend, 1.0)?
            .into_iter()
            .map(|s| s.max(0.0))
            .collect::<Vec<_>>();

        ctx.push_oracle("budget", budget)?;
        ctx.push_oracle("spend_base", spend)?;
        ctx.push("spend_old", spend_old)
    }

    fn potential_outcomes(&self, ctx: &mut SampleContext) -> Result<()> {
        let budget = ctx.f64("budget")?;
        let spend = ctx.f64("spend_base")?;
        let u = budget.iter().map(|b| b.ln()).collect::<Vec<_>>();
        let u = ctx.normal_each(&u, 1.0)?;

        let subscribed = |shift: f64| {
            u.iter()
                .map(|u| i64::from(u - 5.0 + shift > 0.0))
                .collect::<Vec<_>>()
        };
        let untreated = subscribed(0.0);
        let treated = subscribed(0.7);
        let spending = |sub: &[i64]| {
            spend
                .iter()
                .zip(sub)
                .map(|(s, sub)| (s + SUBSCRIBER_SPEND * *sub as f64).max(0.0))
                .collect::<Vec<_>>()
        };
        let spend_c = spending(&untreated);
        let spend_t = spending(&treated);
        let effect = treated
            .iter()
            .zip(&untreated)
            .map(|(t, c)| t - c)
            .collect::<Vec<_>>();

        ctx.push_oracle(&dataset::untreated("subscription"), untreated)?;
        ctx.push_oracle(&dataset::effect_on("subscription"), effect)?;
        ctx.push_oracle(&dataset::treated("subscription"), treated)?;
        let effect = spend_t
            .iter()
            .zip(&spend_c)
            .map(|(t, c)| t - c)
            .collect::<Vec<_>>();
        ctx.push_oracle(&dataset::untreated("spend"), spend_c)?;
        ctx.push_effect("spend", effect)?;
        ctx.table_mut().round_floats(2);
        Ok(())
    }

    /// Every other user gets the notification.
    fn assign_treatment(&self, ctx: &mut SampleContext) -> Result<()> {
        let t = (0..ctx.num_rows()).map(|i| (i % 2) as i64).collect::<Vec<_>>();
        ctx.push("notification", t)
    }
}

#[cfg(test)]
mod test {
    use super::NotificationNewsletter;
    use crate::{dgp::Dgp, options::GenerateOptions, stats};

    #[test]
    fn test_notification_moves_subscription() {
        let ds = NotificationNewsletter
            .generate_data(&GenerateOptions::default().size(20_000).oracle(true))
            .unwrap();
        assert_eq!(vec!["subscription", "spend"], ds.roles().outcomes());
        assert_eq!(vec![0, 1, 0, 1], ds.i64_column("notification").unwrap()[..4].to_vec());
        assert!(ds.i64_column("subscription").is_ok());

        let sub_c = ds.f64_column("subscription_c").unwrap();
        let sub_t = ds.f64_column("subscription_t").unwrap();
        let spend_c = ds.f64_column("spend_c").unwrap();
        let spend_t = ds.f64_column("spend_t").unwrap();
        for i in 0..ds.num_rows() {
            assert!(sub_t[i] >= sub_c[i]);
            let extra = spend_t[i] - spend_c[i];
            if sub_t[i] == sub_c[i] {
                assert!(extra.abs() < 1e-6, "row {i}");
            } else {
                assert!((-1e-6..=6.0 + 1e-6).contains(&extra), "row {i}");
            }
        }

        // The notification is a valid instrument for the subscription.
        let z = ds.treatment().unwrap();
        let first_stage =
            stats::difference_in_means(&ds.f64_column("subscription").unwrap(), &z).unwrap();
        let reduced_form = stats::difference_in_means(&ds.f64_column("spend").unwrap(), &z).unwrap();
        assert!(first_stage > 0.1, "first stage {first_stage}");
        let wald = reduced_form / first_stage;
        assert!((wald - 6.0).abs() < 1.5, "wald {wald}");
    }
}
