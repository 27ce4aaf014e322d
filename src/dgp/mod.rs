// Copyright 2022 CeresDB Project Authors. Licensed under Apache-2.0.

//! Data generating processes with a known causal structure.
//!
//! A process draws a table in four stages, always in this order:
//!
//! 1. baseline covariates (including instruments and hidden types),
//! 2. potential outcomes,
//! 3. treatment assignment,
//! 4. the realized outcome,
//!
//! followed by the variables that only exist after treatment. Stages 1 and 2
//! and the post-treatment variables draw from the data stream seeded with
//! [`GenerateOptions::seed_data`], stages 3 and 4 from the assignment stream
//! seeded with [`GenerateOptions::seed_assignment`]. Redrawing the assignment
//! alone keeps every potential outcome.
//!
//! Ground truth produced along the way (potential outcomes, propensity
//! scores, individual effects) is kept in oracle columns that only survive
//! when the data is generated with [`GenerateOptions::oracle`] set.

mod ad;
mod aipw;
mod buttons;
mod cash_transfer;
mod cloud;
mod compare;
mod context;
mod credit;
mod cuped;
mod darkmode;
mod did;
mod educ_wages;
mod gift;
mod heterogeneous;
mod infinite_scroll;
mod loyalty;
mod marketplace;
mod membership;
mod newsletter;
mod notification;
mod online_discounts;
mod p2p;
mod premium;
mod pretest;
mod promotional_email;
mod school;
mod store_coupons;

use tracing::debug;

pub use self::{
    ad::AdExposure,
    aipw::{Aipw, Kinked},
    buttons::Buttons,
    cash_transfer::CashTransfer,
    cloud::CloudMachines,
    compare::Compare,
    context::{SampleContext, Stream},
    credit::CreditCard,
    cuped::Cuped,
    darkmode::DarkMode,
    did::TvAdvertising,
    educ_wages::EducationWages,
    gift::Gift,
    heterogeneous::HeterogeneousEffect,
    infinite_scroll::InfiniteScroll,
    loyalty::Loyalty,
    marketplace::Marketplace,
    membership::Membership,
    newsletter::Newsletter,
    notification::NotificationNewsletter,
    online_discounts::OnlineDiscounts,
    p2p::PeerToPeer,
    premium::Premium,
    pretest::Pretest,
    promotional_email::PromotionalEmail,
    school::ClassSize,
    store_coupons::StoreCoupons,
};
use crate::{
    errors::{Error, Result},
    model::{dataset, ColumnData, Dataset, Roles, Y0, Y1},
    options::GenerateOptions,
};

pub trait Dgp: Send + Sync {
    /// Short identifier, also the key of [`by_name`].
    fn name(&self) -> &str;

    fn roles(&self) -> Roles;

    /// Number of units drawn when the options do not set a size.
    fn default_size(&self) -> usize {
        1000
    }

    /// Number of table rows for the requested options.
    ///
    /// One row per unit unless the process lays units out over time.
    fn num_rows(&self, options: &GenerateOptions) -> Result<usize> {
        Ok(options.size.unwrap_or_else(|| self.default_size()))
    }

    /// Columns holding the untreated and treated potential outcome of
    /// `outcome`, `Y0` and `Y1` unless the process has several outcomes.
    fn potential_outcome_names(&self, _outcome: &str) -> (String, String) {
        (Y0.to_string(), Y1.to_string())
    }

    /// Stage 1: baseline covariates.
    fn covariates(&self, ctx: &mut SampleContext) -> Result<()>;

    /// Stage 2: outcomes under every treatment level.
    fn potential_outcomes(&self, ctx: &mut SampleContext) -> Result<()>;

    /// Stage 3: who gets treated.
    fn assign_treatment(&self, ctx: &mut SampleContext) -> Result<()>;

    /// Stage 4: the outcomes that are actually observed.
    ///
    /// Defaults to picking, for every outcome, the treated or the untreated
    /// potential outcome according to the binary treatment.
    fn realize_outcome(&self, ctx: &mut SampleContext) -> Result<()> {
        let roles = self.roles();
        for outcome in roles.outcomes() {
            let (untreated, treated) = self.potential_outcome_names(outcome);
            realize_binary_from(ctx, outcome, &roles.t, &untreated, &treated)?;
        }
        Ok(())
    }

    /// Variables that only exist once the outcome is realized. Draws come
    /// from the data stream.
    fn post_treatment(&self, _ctx: &mut SampleContext) -> Result<()> {
        Ok(())
    }

    /// Draw one dataset.
    ///
    /// Implementors customize the stages, not this method.
    fn generate_data(&self, options: &GenerateOptions) -> Result<Dataset> {
        let num_rows = self.num_rows(options)?;
        debug!(
            dgp = self.name(),
            seed_data = options.seed_data,
            seed_assignment = options.seed_assignment,
            rows = num_rows,
            oracle = options.oracle,
            "Generating data"
        );

        let mut ctx = SampleContext::with_options(options, num_rows);
        self.covariates(&mut ctx)?;
        self.potential_outcomes(&mut ctx)?;
        ctx.switch_to(Stream::Assignment);
        self.assign_treatment(&mut ctx)?;
        self.realize_outcome(&mut ctx)?;
        ctx.switch_to(Stream::Data);
        self.post_treatment(&mut ctx)?;

        let batch = ctx.into_table().build(options.oracle)?;
        Ok(Dataset::new(batch, self.roles()))
    }

    /// Draw the covariates and potential outcomes only, nobody is treated.
    ///
    /// The potential outcomes are the point of this table, so ground truth
    /// columns are always kept.
    fn generate_potential_outcomes(&self, options: &GenerateOptions) -> Result<Dataset> {
        let num_rows = self.num_rows(options)?;
        debug!(
            dgp = self.name(),
            seed_data = options.seed_data,
            rows = num_rows,
            "Generating potential outcomes"
        );

        let mut ctx = SampleContext::with_options(options, num_rows);
        self.covariates(&mut ctx)?;
        self.potential_outcomes(&mut ctx)?;

        let batch = ctx.into_table().build(true)?;
        Ok(Dataset::new(batch, self.roles()))
    }
}

/// Write `outcome` as the `Y0`/`Y1` potential outcome matching the binary
/// `treatment`.
pub fn realize_binary(ctx: &mut SampleContext, outcome: &str, treatment: &str) -> Result<()> {
    realize_binary_from(ctx, outcome, treatment, Y0, Y1)
}

/// Write `outcome` as `treated` where the binary `treatment` is set and as
/// `untreated` elsewhere. Integer potential outcomes give an integer outcome.
pub fn realize_binary_from(
    ctx: &mut SampleContext,
    outcome: &str,
    treatment: &str,
    untreated: &str,
    treated: &str,
) -> Result<()> {
    let t = ctx
        .f64(treatment)?
        .into_iter()
        .map(|t| t > 0.5)
        .collect::<Vec<_>>();
    let data = match (&ctx.table().get(untreated)?.data, &ctx.table().get(treated)?.data) {
        (ColumnData::Int64(y0), ColumnData::Int64(y1)) => ColumnData::Int64(pick(&t, y0, y1)),
        _ => ColumnData::Float64(pick(&t, &ctx.f64(untreated)?, &ctx.f64(treated)?)),
    };
    ctx.push(outcome, data)
}

fn pick<T: Copy>(treated: &[bool], y0: &[T], y1: &[T]) -> Vec<T> {
    treated
        .iter()
        .zip(y0.iter().zip(y1))
        .map(|(t, (y0, y1))| if *t { *y1 } else { *y0 })
        .collect()
}

/// `{outcome}_c` and `{outcome}_t`, the potential outcome columns of
/// processes with several outcomes.
pub(crate) fn suffixed_potential_outcomes(outcome: &str) -> (String, String) {
    (dataset::untreated(outcome), dataset::treated(outcome))
}

/// Columns `x1 .. xp` of independent standard normals.
pub(crate) fn covariate_names(p: usize) -> Vec<String> {
    (1..=p).map(|i| format!("x{i}")).collect()
}

/// Processes that can be built without any input data.
pub fn names() -> &'static [&'static str] {
    &[
        "ad",
        "aipw",
        "kinked",
        "heterogeneous",
        "newsletter",
        "membership",
        "did",
        "school",
        "marketplace",
        "store_coupons",
        "notification_newsletter",
        "gift",
        "promotional_email",
        "online_discounts",
        "cloud",
        "infinite_scroll",
        "educ_wages",
        "pretest",
        "buttons",
        "cuped",
        "darkmode",
        "compare",
        "premium",
        "credit",
        "loyalty",
        "p2p",
    ]
}

/// Build a process with its default parameters.
///
/// `cash_transfer` is missing because it is built from a data file, see
/// [`CashTransfer::from_csv`].
pub fn by_name(name: &str) -> Result<Box<dyn Dgp>> {
    let dgp: Box<dyn Dgp> = match name {
        "ad" => Box::new(AdExposure),
        "aipw" => Box::new(Aipw::default()),
        "kinked" => Box::new(Kinked::default()),
        "heterogeneous" => Box::new(HeterogeneousEffect::default()),
        "newsletter" => Box::new(Newsletter),
        "membership" => Box::new(Membership),
        "did" => Box::new(TvAdvertising::default()),
        "school" => Box::new(ClassSize),
        "marketplace" => Box::new(Marketplace),
        "store_coupons" => Box::new(StoreCoupons),
        "notification_newsletter" => Box::new(NotificationNewsletter),
        "gift" => Box::new(Gift),
        "promotional_email" => Box::new(PromotionalEmail),
        "online_discounts" => Box::new(OnlineDiscounts),
        "cloud" => Box::new(CloudMachines),
        "infinite_scroll" => Box::new(InfiniteScroll::default()),
        "educ_wages" => Box::new(EducationWages),
        "pretest" => Box::new(Pretest::default()),
        "buttons" => Box::new(Buttons),
        "cuped" => Box::new(Cuped::default()),
        "darkmode" => Box::new(DarkMode),
        "compare" => Box::new(Compare),
        "premium" => Box::new(Premium),
        "credit" => Box::new(CreditCard),
        "loyalty" => Box::new(Loyalty),
        "p2p" => Box::new(PeerToPeer),
        other => return Err(Error::UnknownDgp(other.to_string())),
    };
    Ok(dgp)
}

#[cfg(test)]
mod test {
    use super::{by_name, names};
    use crate::{errors::Error, options::GenerateOptions};

    /// Processes whose outcomes are picked from two potential outcomes by a
    /// binary treatment.
    const BINARY: [&str; 19] = [
        "ad",
        "aipw",
        "kinked",
        "heterogeneous",
        "newsletter",
        "membership",
        "marketplace",
        "notification_newsletter",
        "gift",
        "promotional_email",
        "online_discounts",
        "cloud",
        "infinite_scroll",
        "cuped",
        "darkmode",
        "compare",
        "premium",
        "credit",
        "loyalty",
    ];

    #[test]
    fn test_registry() {
        for name in names() {
            let dgp = by_name(name).unwrap();
            assert_eq!(*name, dgp.name());
        }
        assert!(matches!(by_name("nope"), Err(Error::UnknownDgp(_))));
        for name in BINARY {
            assert!(names().contains(&name), "{name}");
        }
    }

    #[test]
    fn test_every_process_is_reproducible() {
        for name in names() {
            let dgp = by_name(name).unwrap();
            let opts = GenerateOptions::default().seed(11).size(60).oracle(true);
            let a = dgp.generate_data(&opts).unwrap();
            let b = dgp.generate_data(&opts).unwrap();
            assert_eq!(a.record_batch(), b.record_batch(), "{name}");

            let other = dgp.generate_data(&opts.clone().seed(12)).unwrap();
            assert_ne!(a.record_batch(), other.record_batch(), "{name}");
        }
    }

    #[test]
    fn test_oracle_columns_are_hidden() {
        for name in names() {
            let dgp = by_name(name).unwrap();
            let opts = GenerateOptions::default().size(50);
            let observed = dgp.generate_data(&opts).unwrap();
            let full = dgp.generate_data(&opts.clone().oracle(true)).unwrap();

            assert!(full.record_batch().num_columns() > observed.record_batch().num_columns());
            for column in observed.column_names() {
                assert!(full.has_column(&column), "{name}: {column}");
            }
            let roles = observed.roles();
            for y in roles.outcomes() {
                assert!(observed.has_column(y), "{name}: {y}");
            }
            assert!(observed.has_column(&roles.t), "{name}");
            for x in &roles.x {
                assert!(observed.has_column(x), "{name}: {x}");
            }
        }
    }

    #[test]
    fn test_outcome_is_the_realized_potential_outcome() {
        for name in BINARY {
            let dgp = by_name(name).unwrap();
            let ds = dgp
                .generate_data(&GenerateOptions::default().seed(3).size(300).oracle(true))
                .unwrap();
            let t = ds.treatment().unwrap();
            assert!(t.iter().all(|t| *t == 0.0 || *t == 1.0), "{name}");

            for outcome in ds.roles().outcomes() {
                // Churned customers bring no revenue after the gift.
                if name == "gift" && outcome == "revenue" {
                    continue;
                }
                let (untreated, treated) = dgp.potential_outcome_names(outcome);
                let y = ds.f64_column(outcome).unwrap();
                let y0 = ds.f64_column(&untreated).unwrap();
                let y1 = ds.f64_column(&treated).unwrap();
                for i in 0..ds.num_rows() {
                    let expected = if t[i] == 1.0 { y1[i] } else { y0[i] };
                    assert_eq!(expected, y[i], "{name}: {outcome} row {i}");
                }
            }
        }
    }

    #[test]
    fn test_assignment_seed_keeps_potential_outcomes() {
        for name in names() {
            let dgp = by_name(name).unwrap();
            let opts = GenerateOptions::default()
                .seed_data(21)
                .seed_assignment(22)
                .size(80)
                .oracle(true);
            let table = dgp.generate_potential_outcomes(&opts).unwrap();
            let first = dgp.generate_data(&opts).unwrap();
            let second = dgp
                .generate_data(&opts.clone().seed_assignment(23))
                .unwrap();

            assert!(!table.has_column(&dgp.roles().y), "{name}");
            for column in table.column_names() {
                let expected = table.column(&column).unwrap();
                assert_eq!(expected, first.column(&column).unwrap(), "{name}: {column}");
                assert_eq!(expected, second.column(&column).unwrap(), "{name}: {column}");
            }
        }

        let dgp = by_name("aipw").unwrap();
        let opts = GenerateOptions::default().size(200);
        let a = dgp.generate_data(&opts).unwrap();
        let b = dgp.generate_data(&opts.clone().seed_assignment(99)).unwrap();
        assert_ne!(a.treatment().unwrap(), b.treatment().unwrap());
        assert_eq!(a.f64_column("x1").unwrap(), b.f64_column("x1").unwrap());
    }
}
