// Copyright 2022 CeresDB Project Authors. Licensed under Apache-2.0.

//! Repeated sampling from a process to study the distribution of an
//! estimator.

use std::{sync::Arc, time::Instant};

use arrow::{
    array::{Float64Array, UInt64Array},
    datatypes::{DataType, Field, Schema},
    record_batch::RecordBatch,
};
use rayon::prelude::*;
use tracing::info;

use crate::{
    dgp::Dgp,
    errors::{Error, Result},
    model::Dataset,
    options::{MonteCarloOptions, Redraw},
    stats,
};

/// Estimates of every draw, in seed order.
///
/// `seeds` holds the seed that varies between draws, see
/// [`MonteCarloOptions::draw_seed`].
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationResult {
    pub seeds: Vec<u64>,
    pub estimates: Vec<f64>,
}

impl SimulationResult {
    pub fn len(&self) -> usize {
        self.estimates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.estimates.is_empty()
    }

    pub fn mean(&self) -> f64 {
        stats::mean(&self.estimates)
    }

    pub fn std_dev(&self) -> f64 {
        stats::std_dev(&self.estimates)
    }

    pub fn bias(&self, truth: f64) -> f64 {
        self.mean() - truth
    }

    /// Root mean squared error around `truth`.
    pub fn rmse(&self, truth: f64) -> f64 {
        let squared = self
            .estimates
            .iter()
            .map(|e| (e - truth).powi(2))
            .collect::<Vec<_>>();
        stats::mean(&squared).sqrt()
    }

    /// Two columns, `seed` and `estimate`.
    pub fn to_record_batch(&self) -> Result<RecordBatch> {
        let schema = Schema::new(vec![
            Field::new("seed", DataType::UInt64, false),
            Field::new("estimate", DataType::Float64, false),
        ]);
        let batch = RecordBatch::try_new(
            Arc::new(schema),
            vec![
                Arc::new(UInt64Array::from(self.seeds.clone())),
                Arc::new(Float64Array::from(self.estimates.clone())),
            ],
        )?;
        Ok(batch)
    }
}

/// Draw `options.samples` datasets and evaluate `estimator` on each.
///
/// What gets redrawn follows [`MonteCarloOptions::redraw`]. With
/// [`Redraw::PotentialOutcomes`] the estimator sees tables without
/// treatment, holding every potential outcome.
///
/// Draws run on the rayon thread pool. Each draw only depends on its seed,
/// so the result does not depend on the number of threads. The first
/// failing seed, in seed order, is reported.
pub fn simulate<F>(
    dgp: &dyn Dgp,
    options: &MonteCarloOptions,
    estimator: F,
) -> Result<SimulationResult>
where
    F: Fn(&Dataset) -> anyhow::Result<f64> + Sync,
{
    if options.samples == 0 {
        return Err(Error::invalid("monte carlo needs at least one sample"));
    }

    let begin = Instant::now();
    let outcomes = (0..options.samples)
        .into_par_iter()
        .map(|k| {
            let seed = options.draw_seed(k);
            let generate = options.generate_options(k);
            let data = match options.redraw {
                Redraw::Data | Redraw::Assignment => dgp.generate_data(&generate)?,
                Redraw::PotentialOutcomes => dgp.generate_potential_outcomes(&generate)?,
            };
            let estimate =
                estimator(&data).map_err(|source| Error::Estimator { seed, source })?;
            Ok((seed, estimate))
        })
        .collect::<Vec<Result<(u64, f64)>>>();

    let mut seeds = Vec::with_capacity(outcomes.len());
    let mut estimates = Vec::with_capacity(outcomes.len());
    for outcome in outcomes {
        let (seed, estimate) = outcome?;
        seeds.push(seed);
        estimates.push(estimate);
    }

    let result = SimulationResult { seeds, estimates };
    info!(
        dgp = dgp.name(),
        samples = options.samples,
        redraw = ?options.redraw,
        mean = result.mean(),
        std_dev = result.std_dev(),
        cost_ms = begin.elapsed().as_millis() as u64,
        "Monte carlo finished"
    );
    Ok(result)
}

#[cfg(test)]
mod test {
    use anyhow::anyhow;

    use super::{simulate, SimulationResult};
    use crate::{
        dgp::{Aipw, Dgp, Newsletter},
        errors::Error,
        model::{Y0, Y1},
        options::{MonteCarloOptions, Redraw},
        stats,
    };

    fn naive(ds: &crate::model::Dataset) -> anyhow::Result<f64> {
        let y = ds.outcome()?;
        let t = ds.treatment()?;
        Ok(stats::difference_in_means(&y, &t)?)
    }

    #[test]
    fn test_results_follow_seed_order() {
        let opts = MonteCarloOptions::default()
            .samples(12)
            .size(200)
            .base_seed(40);
        let result = simulate(&Aipw::default(), &opts, naive).unwrap();
        assert_eq!((40..52).collect::<Vec<u64>>(), result.seeds);

        // Every estimate matches a sequential draw with the same seed.
        for (k, estimate) in result.estimates.iter().enumerate() {
            let ds = Aipw::default()
                .generate_data(&opts.generate_options(k))
                .unwrap();
            assert_eq!(*estimate, naive(&ds).unwrap());
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(1)
            .build()
            .unwrap();
        let single = pool.install(|| simulate(&Aipw::default(), &opts, naive).unwrap());
        assert_eq!(result, single);
    }

    #[test]
    fn test_naive_estimator_is_biased() {
        let opts = MonteCarloOptions::default().samples(30).size(2000);
        let result = simulate(&Newsletter, &opts, naive).unwrap();
        assert_eq!(30, result.len());
        assert!(result.bias(Newsletter::EFFECT) < -0.3);
        assert!(result.rmse(Newsletter::EFFECT) >= result.bias(Newsletter::EFFECT).abs());

        let batch = result.to_record_batch().unwrap();
        assert_eq!(30, batch.num_rows());
        assert_eq!("estimate", batch.schema().field(1).name());
    }

    #[test]
    fn test_failures() {
        let zero = MonteCarloOptions::default().samples(0);
        assert!(matches!(
            simulate(&Newsletter, &zero, naive),
            Err(Error::InvalidParameter(_))
        ));

        let opts = MonteCarloOptions::default().samples(5).size(10).base_seed(3);
        let err = simulate(&Newsletter, &opts, |_| Err(anyhow!("boom"))).unwrap_err();
        assert!(matches!(err, Error::Estimator { seed: 3, .. }));
    }

    #[test]
    fn test_seeds_wrap_around() {
        let opts = MonteCarloOptions::default()
            .samples(3)
            .size(50)
            .base_seed(u64::MAX);
        let result = simulate(&Newsletter, &opts, naive).unwrap();
        assert_eq!(vec![u64::MAX, 0, 1], result.seeds);
    }

    #[test]
    fn test_assignment_redraw_keeps_potential_outcomes() {
        let opts = MonteCarloOptions::default()
            .samples(20)
            .size(300)
            .oracle(true)
            .redraw(Redraw::Assignment);

        // The true effect in the sample only depends on potential outcomes.
        let truth = simulate(&Aipw::default(), &opts, |ds| Ok(ds.true_ate()?)).unwrap();
        assert!(truth.estimates.iter().all(|e| *e == truth.estimates[0]));

        let naive = simulate(&Aipw::default(), &opts, naive).unwrap();
        assert!(naive.std_dev() > 0.0);

        let first = Aipw::default().generate_data(&opts.generate_options(0)).unwrap();
        let second = Aipw::default().generate_data(&opts.generate_options(1)).unwrap();
        for column in [Y0, Y1, "x1"] {
            assert_eq!(first.column(column).unwrap(), second.column(column).unwrap());
        }
        assert_ne!(first.treatment().unwrap(), second.treatment().unwrap());
    }

    #[test]
    fn test_potential_outcome_redraw() {
        let opts = MonteCarloOptions::default()
            .samples(10)
            .size(500)
            .redraw(Redraw::PotentialOutcomes);
        let result = simulate(&Newsletter, &opts, |ds| {
            assert!(!ds.has_column("subscribe"));
            Ok(ds.true_ate()?)
        })
        .unwrap();
        assert!(result
            .estimates
            .iter()
            .all(|e| (e - Newsletter::EFFECT).abs() < 1e-9));

        let sample_means = simulate(&Newsletter, &opts, |ds| Ok(stats::mean(&ds.f64_column(Y0)?)))
            .unwrap();
        assert!(sample_means.std_dev() > 0.0);
    }

    #[test]
    fn test_summary_statistics() {
        let result = SimulationResult {
            seeds: vec![1, 2, 3, 4],
            estimates: vec![1.0, 2.0, 3.0, 4.0],
        };
        assert_eq!(2.5, result.mean());
        assert_eq!(0.5, result.bias(2.0));
        assert!((result.rmse(2.5) - 1.25f64.sqrt()).abs() < 1e-12);
        assert!((result.std_dev() - (5.0f64 / 3.0).sqrt()).abs() < 1e-12);
    }
}
