// Copyright 2022 CeresDB Project Authors. Licensed under Apache-2.0.

//! Options for generating data

/// Options for a single call to [`Dgp::generate_data`](crate::dgp::Dgp::generate_data).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateOptions {
    /// Seed of the draws behind covariates, potential outcomes and
    /// post-treatment variables.
    pub seed_data: u64,
    /// Seed of the draws behind treatment assignment and the realized
    /// outcome.
    ///
    /// Changing only this seed keeps the potential outcomes of every unit.
    pub seed_assignment: u64,
    /// Number of units to draw.
    ///
    /// The process picks its own default size if not set.
    pub size: Option<usize>,
    /// Keep the ground truth columns (potential outcomes, propensity
    /// scores, hidden types) in the returned dataset.
    pub oracle: bool,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            seed_data: 0,
            seed_assignment: 1,
            size: None,
            oracle: false,
        }
    }
}

impl GenerateOptions {
    /// Seed both streams at once, the assignment stream with `seed + 1`.
    #[must_use]
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed_data = seed;
        self.seed_assignment = seed.wrapping_add(1);
        self
    }

    #[must_use]
    pub fn seed_data(mut self, seed: u64) -> Self {
        self.seed_data = seed;
        self
    }

    #[must_use]
    pub fn seed_assignment(mut self, seed: u64) -> Self {
        self.seed_assignment = seed;
        self
    }

    #[must_use]
    pub fn size(mut self, size: usize) -> Self {
        self.size = Some(size);
        self
    }

    #[must_use]
    pub fn oracle(mut self, oracle: bool) -> Self {
        self.oracle = oracle;
        self
    }
}

/// What changes from one Monte Carlo draw to the next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Redraw {
    /// New covariates, potential outcomes and assignment in every draw.
    #[default]
    Data,
    /// Same units and potential outcomes, only the assignment is redrawn.
    ///
    /// This is the randomization distribution of an estimator.
    Assignment,
    /// New covariates and potential outcomes, without any assignment. The
    /// estimator sees the potential outcome table.
    PotentialOutcomes,
}

/// Options for the repeated sampling in [`simulate`](crate::sampling::simulate).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonteCarloOptions {
    /// Number of datasets to draw.
    pub samples: usize,
    /// Number of units per dataset, the process default if not set.
    pub size: Option<usize>,
    /// The seed of draw `k` is `base_seed + k`, wrapping around.
    pub base_seed: u64,
    /// Pass the ground truth columns to the estimator.
    pub oracle: bool,
    pub redraw: Redraw,
}

impl Default for MonteCarloOptions {
    fn default() -> Self {
        Self {
            samples: 100,
            size: None,
            base_seed: 0,
            oracle: false,
            redraw: Redraw::Data,
        }
    }
}

impl MonteCarloOptions {
    #[must_use]
    pub fn samples(mut self, samples: usize) -> Self {
        self.samples = samples;
        self
    }

    #[must_use]
    pub fn size(mut self, size: usize) -> Self {
        self.size = Some(size);
        self
    }

    #[must_use]
    pub fn base_seed(mut self, base_seed: u64) -> Self {
        self.base_seed = base_seed;
        self
    }

    #[must_use]
    pub fn oracle(mut self, oracle: bool) -> Self {
        self.oracle = oracle;
        self
    }

    #[must_use]
    pub fn redraw(mut self, redraw: Redraw) -> Self {
        self.redraw = redraw;
        self
    }

    /// Seed that changes with draw `k`.
    pub fn draw_seed(&self, k: usize) -> u64 {
        self.base_seed.wrapping_add(k as u64)
    }

    /// Options of the `k`-th draw.
    ///
    /// When the data is redrawn, the assignment seeds run backwards from
    /// `base_seed + samples`. When only the assignment is redrawn, the data
    /// seed stays at `base_seed` and the assignment seeds start one above it.
    pub fn generate_options(&self, k: usize) -> GenerateOptions {
        let seed = self.draw_seed(k);
        let (seed_data, seed_assignment) = match self.redraw {
            Redraw::Data | Redraw::PotentialOutcomes => (
                seed,
                self.base_seed
                    .wrapping_add(self.samples as u64)
                    .wrapping_sub(k as u64),
            ),
            Redraw::Assignment => (self.base_seed, seed.wrapping_add(1)),
        };
        GenerateOptions {
            seed_data,
            seed_assignment,
            size: self.size,
            oracle: self.oracle,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_sample_seeds() {
        let opts = MonteCarloOptions::default().base_seed(10).size(50).samples(5);
        let third = opts.generate_options(2);
        assert_eq!(12, third.seed_data);
        assert_eq!(13, third.seed_assignment);
        assert_eq!(Some(50), third.size);
        assert!(!third.oracle);

        let fixed = opts.clone().redraw(Redraw::Assignment);
        for k in 0..5 {
            let draw = fixed.generate_options(k);
            assert_eq!(10, draw.seed_data);
            assert_eq!(11 + k as u64, draw.seed_assignment);
        }
    }

    #[test]
    fn test_seeds_wrap_around() {
        let opts = MonteCarloOptions::default().base_seed(u64::MAX).samples(3);
        assert_eq!(u64::MAX, opts.generate_options(0).seed_data);
        assert_eq!(0, opts.generate_options(1).seed_data);
        assert_eq!(1, opts.generate_options(2).seed_data);
        assert_eq!(2, opts.generate_options(0).seed_assignment);

        let opts = opts.redraw(Redraw::Assignment);
        assert_eq!(0, opts.generate_options(0).seed_assignment);
    }

    #[test]
    fn test_seed_sets_both_streams() {
        let opts = GenerateOptions::default().seed(u64::MAX);
        assert_eq!(u64::MAX, opts.seed_data);
        assert_eq!(0, opts.seed_assignment);

        let opts = GenerateOptions::default().seed_data(4).seed_assignment(9);
        assert_eq!((4, 9), (opts.seed_data, opts.seed_assignment));
    }
}
