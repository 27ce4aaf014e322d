// Copyright 2022 CeresDB Project Authors. Licensed under Apache-2.0.

//! Small statistical helpers shared by the processes and the figures

use std::f64::consts::{PI, SQRT_2};

use crate::errors::{Error, Result};

/// Logistic function.
#[inline]
pub fn expit(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

pub fn normal_pdf(x: f64, mu: f64, sigma: f64) -> f64 {
    let z = (x - mu) / sigma;
    (-0.5 * z * z).exp() / (sigma * (2.0 * PI).sqrt())
}

/// Standard normal cumulative distribution function.
pub fn normal_cdf(x: f64) -> f64 {
    0.5 * libm::erfc(-x / SQRT_2)
}

// Coefficients of the rational approximations of the normal quantile.
const A: [f64; 6] = [
    -3.969_683_028_665_376e1,
    2.209_460_984_245_205e2,
    -2.759_285_104_469_687e2,
    1.383_577_518_672_69e2,
    -3.066_479_806_614_716e1,
    2.506_628_277_459_239,
];
const B: [f64; 5] = [
    -5.447_609_879_822_406e1,
    1.615_858_368_580_409e2,
    -1.556_989_798_598_866e2,
    6.680_131_188_771_972e1,
    -1.328_068_155_288_572e1,
];
const C: [f64; 6] = [
    -7.784_894_002_430_293e-3,
    -3.223_964_580_411_365e-1,
    -2.400_758_277_161_838,
    -2.549_732_539_343_734,
    4.374_664_141_464_968,
    2.938_163_982_698_783,
];
const D: [f64; 4] = [
    7.784_695_709_041_462e-3,
    3.224_671_290_700_398e-1,
    2.445_134_137_142_996,
    3.754_408_661_907_416,
];
const P_LOW: f64 = 0.02425;

fn tail_quantile(q: f64) -> f64 {
    (((((C[0] * q + C[1]) * q + C[2]) * q + C[3]) * q + C[4]) * q + C[5])
        / ((((D[0] * q + D[1]) * q + D[2]) * q + D[3]) * q + 1.0)
}

/// Standard normal quantile function.
///
/// Returns infinities at 0 and 1 and NaN outside of `[0, 1]`.
pub fn normal_ppf(p: f64) -> f64 {
    if p.is_nan() || !(0.0..=1.0).contains(&p) {
        return f64::NAN;
    }
    if p == 0.0 {
        return f64::NEG_INFINITY;
    }
    if p == 1.0 {
        return f64::INFINITY;
    }

    let x = if p < P_LOW {
        tail_quantile((-2.0 * p.ln()).sqrt())
    } else if p <= 1.0 - P_LOW {
        let q = p - 0.5;
        let r = q * q;
        (((((A[0] * r + A[1]) * r + A[2]) * r + A[3]) * r + A[4]) * r + A[5]) * q
            / (((((B[0] * r + B[1]) * r + B[2]) * r + B[3]) * r + B[4]) * r + 1.0)
    } else {
        -tail_quantile((-2.0 * (1.0 - p).ln()).sqrt())
    };

    // One Halley step brings the approximation to full double precision.
    let e = normal_cdf(x) - p;
    let u = e * (2.0 * PI).sqrt() * (x * x / 2.0).exp();
    x - u / (1.0 + x * u / 2.0)
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation, NaN with fewer than two values.
pub fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return f64::NAN;
    }
    let m = mean(values);
    let ss = values.iter().map(|v| (v - m).powi(2)).sum::<f64>();
    (ss / (values.len() - 1) as f64).sqrt()
}

/// `num` evenly spaced points over `[start, stop]`.
pub fn linspace(start: f64, stop: f64, num: usize) -> Vec<f64> {
    match num {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (stop - start) / (num - 1) as f64;
            (0..num).map(|i| start + step * i as f64).collect()
        }
    }
}

/// Quantile of already sorted values with linear interpolation.
pub fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

/// Mean outcome of the treated minus mean outcome of the untreated.
pub fn difference_in_means(y: &[f64], t: &[f64]) -> Result<f64> {
    if y.len() != t.len() {
        return Err(Error::invalid(format!(
            "outcome has {} values but treatment has {}",
            y.len(),
            t.len()
        )));
    }
    let (treated, control): (Vec<_>, Vec<_>) = y.iter().zip(t).partition(|(_, t)| **t > 0.5);
    if treated.is_empty() || control.is_empty() {
        return Err(Error::invalid("both treatment groups must be non-empty"));
    }
    let treated = treated.iter().map(|(y, _)| **y).collect::<Vec<_>>();
    let control = control.iter().map(|(y, _)| **y).collect::<Vec<_>>();
    Ok(mean(&treated) - mean(&control))
}

/// Univariate least squares fit `y = intercept + slope * x`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ols {
    pub intercept: f64,
    pub slope: f64,
}

impl Ols {
    pub fn fit(x: &[f64], y: &[f64]) -> Result<Self> {
        if x.len() != y.len() {
            return Err(Error::invalid(format!(
                "x has {} values but y has {}",
                x.len(),
                y.len()
            )));
        }
        if x.len() < 2 {
            return Err(Error::invalid("at least two points are needed to fit a line"));
        }
        let mx = mean(x);
        let my = mean(y);
        let sxy = x.iter().zip(y).map(|(a, b)| (a - mx) * (b - my)).sum::<f64>();
        let sxx = x.iter().map(|a| (a - mx).powi(2)).sum::<f64>();
        if sxx == 0.0 {
            return Err(Error::invalid("x has no variance"));
        }
        let slope = sxy / sxx;
        Ok(Self {
            intercept: my - slope * mx,
            slope,
        })
    }

    #[inline]
    pub fn predict(&self, x: f64) -> f64 {
        self.intercept + self.slope * x
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn close(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() < tol
    }

    #[test]
    fn test_normal_functions() {
        assert!(close(normal_cdf(0.0), 0.5, 1e-15));
        assert!(close(normal_cdf(1.96), 0.975_002_104_851_78, 1e-12));
        assert!(close(normal_pdf(0.0, 0.0, 1.0), 0.398_942_280_401_432_7, 1e-15));
        assert!(close(normal_pdf(3.0, 3.0, 0.1), 3.989_422_804_014_327, 1e-12));

        assert!(close(normal_ppf(0.95), 1.644_853_626_951_472_2, 1e-12));
        assert!(close(normal_ppf(0.5), 0.0, 1e-12));
        assert!(close(normal_ppf(0.001), -3.090_232_306_167_813_5, 1e-10));
        assert!(close(normal_ppf(0.999), 3.090_232_306_167_813_5, 1e-10));
        assert_eq!(f64::INFINITY, normal_ppf(1.0));
        assert!(normal_ppf(1.5).is_nan());

        for p in [0.01, 0.2, 0.7, 0.99] {
            assert!(close(normal_cdf(normal_ppf(p)), p, 1e-12));
        }
    }

    #[test]
    fn test_moments() {
        assert_eq!(2.0, mean(&[1.0, 2.0, 3.0]));
        assert!(mean(&[]).is_nan());
        assert!(close(std_dev(&[1.0, 2.0, 3.0, 4.0]), 1.290_994_448_735_805_6, 1e-12));
        assert_eq!(0.5, expit(0.0));
    }

    #[test]
    fn test_grid_and_quantiles() {
        let grid = linspace(-1.0, 1.0, 5);
        assert_eq!(vec![-1.0, -0.5, 0.0, 0.5, 1.0], grid);
        assert!(linspace(0.0, 1.0, 0).is_empty());

        let sorted = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(1.0, quantile_sorted(&sorted, 0.0));
        assert_eq!(2.5, quantile_sorted(&sorted, 0.5));
        assert_eq!(4.0, quantile_sorted(&sorted, 1.0));
    }

    #[test]
    fn test_estimators() {
        let y = [1.0, 2.0, 5.0, 7.0];
        let t = [0.0, 0.0, 1.0, 1.0];
        assert_eq!(4.5, difference_in_means(&y, &t).unwrap());
        assert!(difference_in_means(&y, &[0.0; 4]).is_err());

        let x = [0.0, 1.0, 2.0, 3.0];
        let y = [1.0, 3.0, 5.0, 7.0];
        let fit = Ols::fit(&x, &y).unwrap();
        assert!(close(fit.intercept, 1.0, 1e-12));
        assert!(close(fit.slope, 2.0, 1e-12));
        assert!(close(fit.predict(10.0), 21.0, 1e-12));
        assert!(Ols::fit(&[1.0, 1.0], &[0.0, 1.0]).is_err());
    }
}
