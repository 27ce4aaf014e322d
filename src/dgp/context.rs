// Copyright 2022 CeresDB Project Authors. Licensed under Apache-2.0.

//! [SampleContext] carries the random state and the partial table through
//! the stages of a data generating process.

use rand::{
    distributions::{Bernoulli, Distribution, Uniform, WeightedIndex},
    rngs::StdRng,
    Rng, SeedableRng,
};
use rand_distr::{Beta, Binomial, Exp, LogNormal, Normal, Poisson, StandardNormal, StudentT};

use crate::{
    errors::{Error, Result},
    model::{builder::TableBuilder, column::Column, column::ColumnData, dataset},
    options::GenerateOptions,
    util::round_to,
};

/// Which random stream the draws come from.
///
/// Covariates, potential outcomes and post-treatment variables use the data
/// stream, treatment assignment and the realized outcome use the assignment
/// stream. Reseeding one stream leaves the draws of the other untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
    Data,
    Assignment,
}

#[derive(Debug)]
pub struct SampleContext {
    data_rng: StdRng,
    assignment_rng: StdRng,
    stream: Stream,
    oracle: bool,
    table: TableBuilder,
}

impl SampleContext {
    /// Context with the data stream seeded with `seed` and the assignment
    /// stream with `seed + 1`.
    pub fn new(seed: u64, num_rows: usize) -> Self {
        Self::with_options(&GenerateOptions::default().seed(seed), num_rows)
    }

    pub fn with_options(options: &GenerateOptions, num_rows: usize) -> Self {
        Self {
            data_rng: StdRng::seed_from_u64(options.seed_data),
            assignment_rng: StdRng::seed_from_u64(options.seed_assignment),
            stream: Stream::Data,
            oracle: options.oracle,
            table: TableBuilder::new(num_rows),
        }
    }

    pub fn num_rows(&self) -> usize {
        self.table.num_rows()
    }

    /// Whether the ground truth columns will be kept.
    pub fn oracle(&self) -> bool {
        self.oracle
    }

    pub fn stream(&self) -> Stream {
        self.stream
    }

    pub fn switch_to(&mut self, stream: Stream) {
        self.stream = stream;
    }

    /// Generator of the current stream.
    pub fn rng(&mut self) -> &mut StdRng {
        match self.stream {
            Stream::Data => &mut self.data_rng,
            Stream::Assignment => &mut self.assignment_rng,
        }
    }

    pub fn table(&self) -> &TableBuilder {
        &self.table
    }

    pub fn table_mut(&mut self) -> &mut TableBuilder {
        &mut self.table
    }

    pub fn into_table(self) -> TableBuilder {
        self.table
    }

    fn draw<T, D: Distribution<T>>(&mut self, dist: D) -> Vec<T> {
        let n = self.num_rows();
        let rng = self.rng();
        (0..n).map(|_| dist.sample(rng)).collect()
    }

    fn check_len(&self, what: &str, len: usize) -> Result<()> {
        if len != self.num_rows() {
            return Err(Error::ColumnLength {
                name: what.to_string(),
                expected: self.num_rows(),
                actual: len,
            });
        }
        Ok(())
    }

    pub fn standard_normal(&mut self) -> Vec<f64> {
        self.draw(StandardNormal)
    }

    pub fn normal(&mut self, mean: f64, std_dev: f64) -> Result<Vec<f64>> {
        let dist = normal_dist(mean, std_dev)?;
        Ok(self.draw(dist))
    }

    /// Normal draws with a mean per row.
    pub fn normal_each(&mut self, mean: &[f64], std_dev: f64) -> Result<Vec<f64>> {
        self.check_len("normal means", mean.len())?;
        let noise = self.normal(0.0, std_dev)?;
        Ok(mean.iter().zip(noise).map(|(m, e)| m + e).collect())
    }

    /// Uniform draws on `[low, high)`.
    pub fn uniform(&mut self, low: f64, high: f64) -> Result<Vec<f64>> {
        if !(low < high) {
            return Err(Error::invalid(format!("uniform: empty range [{low}, {high})")));
        }
        Ok(self.draw(Uniform::new(low, high)))
    }

    /// 0/1 draws with success probability `p`.
    pub fn bernoulli(&mut self, p: f64) -> Result<Vec<i64>> {
        let dist = Bernoulli::new(p).map_err(|e| Error::invalid(format!("bernoulli: {e}")))?;
        Ok(self.draw(dist).into_iter().map(i64::from).collect())
    }

    /// 0/1 draws with a success probability per row.
    pub fn bernoulli_each(&mut self, p: &[f64]) -> Result<Vec<i64>> {
        self.check_len("bernoulli probabilities", p.len())?;
        let rng = self.rng();
        p.iter()
            .map(|p| {
                let dist =
                    Bernoulli::new(*p).map_err(|e| Error::invalid(format!("bernoulli: {e}")))?;
                Ok(i64::from(dist.sample(rng)))
            })
            .collect()
    }

    pub fn binomial(&mut self, trials: u64, p: f64) -> Result<Vec<i64>> {
        let dist =
            Binomial::new(trials, p).map_err(|e| Error::invalid(format!("binomial: {e}")))?;
        Ok(self.draw(dist).into_iter().map(|v| v as i64).collect())
    }

    pub fn poisson(&mut self, lambda: f64) -> Result<Vec<i64>> {
        let dist = Poisson::new(lambda).map_err(|e| Error::invalid(format!("poisson: {e}")))?;
        Ok(self.draw::<f64, _>(dist).into_iter().map(|v| v as i64).collect())
    }

    /// Poisson draws with a rate per row.
    pub fn poisson_each(&mut self, lambda: &[f64]) -> Result<Vec<i64>> {
        self.check_len("poisson rates", lambda.len())?;
        let rng = self.rng();
        lambda
            .iter()
            .map(|l| {
                let dist = Poisson::new(*l).map_err(|e| Error::invalid(format!("poisson: {e}")))?;
                let v: f64 = dist.sample(rng);
                Ok(v as i64)
            })
            .collect()
    }

    /// Exponential draws with mean `scale`.
    pub fn exponential(&mut self, scale: f64) -> Result<Vec<f64>> {
        let dist = exp_with_scale(scale)?;
        Ok(self.draw(dist))
    }

    /// Exponential draws with a mean per row.
    pub fn exponential_each(&mut self, scale: &[f64]) -> Result<Vec<f64>> {
        self.check_len("exponential scales", scale.len())?;
        let rng = self.rng();
        scale
            .iter()
            .map(|s| Ok(exp_with_scale(*s)?.sample(rng)))
            .collect()
    }

    pub fn beta(&mut self, a: f64, b: f64) -> Result<Vec<f64>> {
        let dist = beta_dist(a, b)?;
        Ok(self.draw(dist))
    }

    /// Beta draws with both shapes set per row.
    pub fn beta_each(&mut self, a: &[f64], b: &[f64]) -> Result<Vec<f64>> {
        self.check_len("beta shapes", a.len())?;
        self.check_len("beta shapes", b.len())?;
        let rng = self.rng();
        a.iter()
            .zip(b)
            .map(|(a, b)| Ok(beta_dist(*a, *b)?.sample(rng)))
            .collect()
    }

    /// Draws whose logarithm is normal with mean `mu` and deviation `sigma`.
    pub fn lognormal(&mut self, mu: f64, sigma: f64) -> Result<Vec<f64>> {
        let dist = lognormal_dist(mu, sigma)?;
        Ok(self.draw(dist))
    }

    /// Log-normal draws with a log mean per row.
    pub fn lognormal_each(&mut self, mu: &[f64], sigma: f64) -> Result<Vec<f64>> {
        self.check_len("lognormal means", mu.len())?;
        let rng = self.rng();
        mu.iter()
            .map(|m| Ok(lognormal_dist(*m, sigma)?.sample(rng)))
            .collect()
    }

    /// A single draw from Student's t with `dof` degrees of freedom.
    pub fn student_t(&mut self, dof: f64) -> Result<f64> {
        if !(dof > 0.0 && dof.is_finite()) {
            return Err(Error::invalid(format!("student t: degrees of freedom must be positive, got {dof}")));
        }
        let dist = StudentT::new(dof).map_err(|e| Error::invalid(format!("student t: {e}")))?;
        Ok(dist.sample(self.rng()))
    }

    /// Integers drawn uniformly from `[low, high)`.
    pub fn randint(&mut self, low: i64, high: i64) -> Result<Vec<i64>> {
        if low >= high {
            return Err(Error::invalid(format!("randint: empty range [{low}, {high})")));
        }
        Ok(self.draw(Uniform::new(low, high)))
    }

    /// Values picked uniformly, with replacement, from `options`.
    pub fn choice(&mut self, options: &[i64]) -> Result<Vec<i64>> {
        if options.is_empty() {
            return Err(Error::invalid("choice: no options"));
        }
        let n = self.num_rows();
        let rng = self.rng();
        Ok((0..n).map(|_| options[rng.gen_range(0..options.len())]).collect())
    }

    /// Labels picked uniformly, with replacement, from `options`.
    pub fn choice_str(&mut self, options: &[&str]) -> Result<Vec<String>> {
        self.weighted_choice(options, &vec![1.0; options.len()])
    }

    /// Labels picked with replacement, `options[i]` with a probability
    /// proportional to `weights[i]`.
    pub fn weighted_choice(&mut self, options: &[&str], weights: &[f64]) -> Result<Vec<String>> {
        if options.is_empty() || options.len() != weights.len() {
            return Err(Error::invalid(format!(
                "choice: {} options with {} weights",
                options.len(),
                weights.len()
            )));
        }
        let dist =
            WeightedIndex::new(weights).map_err(|e| Error::invalid(format!("choice: {e}")))?;
        Ok(self
            .draw(dist)
            .into_iter()
            .map(|i| options[i].to_string())
            .collect())
    }

    /// Add a column visible to the analyst.
    pub fn push(&mut self, name: &str, data: impl Into<ColumnData>) -> Result<()> {
        self.table.push(Column::observed(name, data))
    }

    /// Add a ground truth column.
    pub fn push_oracle(&mut self, name: &str, data: impl Into<ColumnData>) -> Result<()> {
        self.table.push(Column::oracle(name, data))
    }

    /// Overwrite an observed column, e.g. a post-treatment adjustment of an
    /// outcome.
    pub fn replace(&mut self, name: &str, data: impl Into<ColumnData>) -> Result<()> {
        self.table.replace(Column::observed(name, data))
    }

    /// Add the effect of the treatment on `outcome` to its untreated
    /// potential outcome `{outcome}_c`, which must already be in the table.
    ///
    /// Pushes `effect_on_{outcome}` and `{outcome}_t` as ground truth, the
    /// treated outcome rounded to cents.
    pub fn push_effect(&mut self, outcome: &str, effect: Vec<f64>) -> Result<()> {
        let untreated = self.f64(&dataset::untreated(outcome))?;
        self.check_len(&dataset::effect_on(outcome), effect.len())?;
        let treated = untreated
            .iter()
            .zip(&effect)
            .map(|(y, e)| round_to(y + e, 2))
            .collect::<Vec<_>>();
        self.push_oracle(&dataset::effect_on(outcome), effect)?;
        self.push_oracle(&dataset::treated(outcome), treated)
    }

    pub fn f64(&self, name: &str) -> Result<Vec<f64>> {
        self.table.f64(name)
    }

    pub fn i64(&self, name: &str) -> Result<Vec<i64>> {
        self.table.i64(name)
    }

    pub fn strings(&self, name: &str) -> Result<Vec<String>> {
        self.table.strings(name)
    }
}

fn normal_dist(mean: f64, std_dev: f64) -> Result<Normal<f64>> {
    if !(std_dev >= 0.0 && std_dev.is_finite()) {
        return Err(Error::invalid(format!(
            "normal: standard deviation must be finite and not negative, got {std_dev}"
        )));
    }
    Normal::new(mean, std_dev).map_err(|e| Error::invalid(format!("normal: {e}")))
}

fn lognormal_dist(mu: f64, sigma: f64) -> Result<LogNormal<f64>> {
    if !(sigma >= 0.0 && sigma.is_finite()) {
        return Err(Error::invalid(format!(
            "lognormal: sigma must be finite and not negative, got {sigma}"
        )));
    }
    LogNormal::new(mu, sigma).map_err(|e| Error::invalid(format!("lognormal: {e}")))
}

fn beta_dist(a: f64, b: f64) -> Result<Beta<f64>> {
    if !(a > 0.0 && b > 0.0 && a.is_finite() && b.is_finite()) {
        return Err(Error::invalid(format!("beta: shapes must be positive, got {a} and {b}")));
    }
    Beta::new(a, b).map_err(|e| Error::invalid(format!("beta: {e}")))
}

fn exp_with_scale(scale: f64) -> Result<Exp<f64>> {
    if !(scale > 0.0 && scale.is_finite()) {
        return Err(Error::invalid(format!("exponential: scale must be positive, got {scale}")));
    }
    Exp::new(1.0 / scale).map_err(|e| Error::invalid(format!("exponential: {e}")))
}
