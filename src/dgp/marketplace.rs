// Copyright 2022 CeresDB Project Authors. Licensed under Apache-2.0.

use super::{Dgp, SampleContext};
use crate::{
    errors::Result,
    model::{Roles, Y0, Y1},
};

/// Sellers on a marketplace that may go online.
///
/// Sales are skewed and the effect of going online peaks at middle age,
/// which makes linear adjustment a poor fit.
#[derive(Debug, Clone, Copy, Default)]
pub struct Marketplace;

/// Expected sales scale, in thousands, for a seller with `products` products
/// and the given `age` and online status.
fn sales_scale(products: f64, age: f64, online: f64) -> f64 {
    let age_profile =
        (1.0 + 0.3 * products + 4.0 * online) * age - 0.5 * (1.0 + 6.0 * online) * age * age;
    products + age_profile.max(0.0)
}

impl Dgp for Marketplace {
    fn name(&self) -> &str {
        "marketplace"
    }

    fn roles(&self) -> Roles {
        Roles::new("sales", "online").covariates(["age", "products"])
    }

    fn default_size(&self) -> usize {
        10_000
    }

    fn covariates(&self, ctx: &mut SampleContext) -> Result<()> {
        let products = ctx
            .poisson(1.0)?
            .into_iter()
            .map(|p| p + 1)
            .collect::<Vec<_>>();
        let scale = products.iter().map(|p| 0.5 * *p as f64).collect::<Vec<_>>();
        let age = ctx.exponential_each(&scale)?;
        ctx.push("age", age)?;
        ctx.push("products", products)
    }

    /// Both potential sales come from the same exponential quantile, so they
    /// only differ by the scale.
    fn potential_outcomes(&self, ctx: &mut SampleContext) -> Result<()> {
        let age = ctx.f64("age")?;
        let products = ctx.f64("products")?;
        let u = ctx.uniform(0.0, 1.0)?;

        let draw = |online: f64| {
            (0..u.len())
                .map(|i| 1000.0 * sales_scale(products[i], age[i], online) * -(1.0 - u[i]).ln())
                .collect::<Vec<_>>()
        };
        let y0 = draw(0.0);
        let y1 = draw(1.0);
        ctx.push_oracle(Y0, y0)?;
        ctx.push_oracle(Y1, y1)
    }

    fn assign_treatment(&self, ctx: &mut SampleContext) -> Result<()> {
        let online = ctx.bernoulli(0.5)?;
        ctx.push("online", online)
    }
}

#[cfg(test)]
mod test {
    use super::{sales_scale, Marketplace};
    use crate::{dgp::Dgp, options::GenerateOptions};

    #[test]
    fn test_sales_scale() {
        assert_eq!(2.0, sales_scale(2.0, 0.0, 1.0));
        // (1 + .3 + 4) * 1 - .5 * 7 = 1.8
        assert!((sales_scale(1.0, 1.0, 1.0) - 2.8).abs() < 1e-12);
        // Old sellers lose the age bonus entirely.
        assert_eq!(1.0, sales_scale(1.0, 10.0, 1.0));
    }

    #[test]
    fn test_coupled_potential_sales() {
        let ds = Marketplace
            .generate_data(&GenerateOptions::default().size(2000).oracle(true))
            .unwrap();
        let products = ds.i64_column("products").unwrap();
        assert!(products.iter().all(|p| *p >= 1));

        let age = ds.f64_column("age").unwrap();
        let y0 = ds.f64_column("Y0").unwrap();
        let y1 = ds.f64_column("Y1").unwrap();
        for i in 0..ds.num_rows() {
            assert!(y0[i] >= 0.0);
            let p = products[i] as f64;
            let ratio = sales_scale(p, age[i], 1.0) / sales_scale(p, age[i], 0.0);
            if y0[i] > 0.0 {
                assert!((y1[i] / y0[i] - ratio).abs() < 1e-9);
            }
        }
    }
}
