// Copyright 2022 CeresDB Project Authors. Licensed under Apache-2.0.

use super::{Dgp, SampleContext};
use crate::{
    errors::Result,
    model::{Roles, Y0, Y1},
};

/// Arms of the button experiment, only `button2` has an effect.
pub const GROUPS: [&str; 3] = ["default", "button1", "button2"];

/// Checkout button experiment with three arms, assigned with different
/// shares on mobile and desktop.
///
/// The second button raises mobile revenue by 1 and lowers desktop revenue
/// by 4, so pooled comparisons mix the two.
#[derive(Debug, Clone, Copy, Default)]
pub struct Buttons;

impl Dgp for Buttons {
    fn name(&self) -> &str {
        "buttons"
    }

    fn roles(&self) -> Roles {
        Roles::new("revenue", "group").covariates(["mobile"])
    }

    fn covariates(&self, ctx: &mut SampleContext) -> Result<()> {
        let mobile = ctx.bernoulli(0.5)?;
        ctx.push("mobile", mobile)
    }

    /// `Y0` is the revenue under `default` and `button1`, `Y1` under
    /// `button2`.
    fn potential_outcomes(&self, ctx: &mut SampleContext) -> Result<()> {
        let mobile = ctx.f64("mobile")?;
        let on_mobile = ctx.normal_each(&mobile, 1.0)?;
        let desktop = mobile.iter().map(|m| -4.0 * (1.0 - m)).collect::<Vec<_>>();
        let on_desktop = ctx.normal_each(&desktop, 1.0)?;
        let tau = on_mobile
            .iter()
            .zip(&on_desktop)
            .map(|(a, b)| a + b)
            .collect::<Vec<_>>();
        let y0 = ctx
            .normal(10.0, 1.0)?
            .iter()
            .zip(&mobile)
            .map(|(e, m)| 3.0 * m + e)
            .collect::<Vec<_>>();
        let y1 = y0.iter().zip(&tau).map(|(y, t)| y + t).collect::<Vec<_>>();
        ctx.push_oracle("tau", tau)?;
        ctx.push_oracle(Y0, y0)?;
        ctx.push_oracle(Y1, y1)
    }

    fn assign_treatment(&self, ctx: &mut SampleContext) -> Result<()> {
        let mobile = ctx.i64("mobile")?;
        let on_mobile = ctx.weighted_choice(&GROUPS, &[0.4, 0.2, 0.4])?;
        let on_desktop = ctx.weighted_choice(&GROUPS, &[0.4, 0.4, 0.2])?;
        let group = mobile
            .iter()
            .zip(on_mobile.into_iter().zip(on_desktop))
            .map(|(m, (a, b))| if *m == 1 { a } else { b })
            .collect::<Vec<_>>();
        ctx.push("group", group)
    }

    fn realize_outcome(&self, ctx: &mut SampleContext) -> Result<()> {
        let y0 = ctx.f64(Y0)?;
        let y1 = ctx.f64(Y1)?;
        let revenue = ctx
            .strings("group")?
            .iter()
            .enumerate()
            .map(|(i, g)| if g == GROUPS[2] { y1[i] } else { y0[i] })
            .collect::<Vec<_>>();
        ctx.push("revenue", revenue)
    }
}

#[cfg(test)]
mod test {
    use super::{Buttons, GROUPS};
    use crate::{dgp::Dgp, options::GenerateOptions, stats};

    #[test]
    fn test_effect_differs_by_device() {
        let ds = Buttons
            .generate_data(&GenerateOptions::default().size(20_000).oracle(true))
            .unwrap();
        let mobile = ds.i64_column("mobile").unwrap();
        let group = ds.str_column("group").unwrap();
        let tau = ds.f64_column("tau").unwrap();
        assert!(group.iter().all(|g| GROUPS.contains(&g.as_str())));

        let share = |device: i64, arm: &str| {
            let rows = (0..ds.num_rows()).filter(|i| mobile[*i] == device);
            let (hits, total) = rows.fold((0, 0), |(h, t), i| (h + usize::from(group[i] == arm), t + 1));
            hits as f64 / total as f64
        };
        assert!((share(1, "button2") - 0.4).abs() < 0.03);
        assert!((share(0, "button2") - 0.2).abs() < 0.03);

        let effect = |device: i64| {
            let values = (0..ds.num_rows())
                .filter(|i| mobile[*i] == device)
                .map(|i| tau[i])
                .collect::<Vec<_>>();
            stats::mean(&values)
        };
        assert!((effect(1) - 1.0).abs() < 0.1);
        assert!((effect(0) + 4.0).abs() < 0.1);

        let y0 = ds.f64_column("Y0").unwrap();
        let y1 = ds.f64_column("Y1").unwrap();
        let revenue = ds.outcome().unwrap();
        for i in 0..ds.num_rows() {
            let expected = if group[i] == "button2" { y1[i] } else { y0[i] };
            assert_eq!(expected, revenue[i]);
        }
    }
}
