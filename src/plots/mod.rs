// Copyright 2022 CeresDB Project Authors. Licensed under Apache-2.0.

//! Figures for teaching statistical concepts.
//!
//! Every figure separates the numbers it shows from the drawing, so the
//! numbers can be used without rendering anything. Static figures are SVG,
//! animations are GIF.
//!
//! The bitmap backend behind GIFs cannot render text, so animation frames
//! carry no captions, tick labels or legends.

mod binscatter;
pub mod dag;
mod hypothesis;
mod projection;
mod regression;

use std::fmt::Display;

pub use self::{
    binscatter::{Bin, Binscatter, BinscatterFit},
    dag::Dag,
    hypothesis::HypothesisTest,
    projection::ProjectionAnimation,
    regression::{FrameEstimate, RegressionAnimation},
};
use crate::errors::Error;

const FONT: &str = "sans-serif";

pub(crate) fn plot_error(e: impl Display) -> Error {
    Error::Plot(e.to_string())
}

/// Lowest and highest finite value, widened when they coincide.
pub(crate) fn value_range(values: impl IntoIterator<Item = f64>) -> Option<(f64, f64)> {
    let (lo, hi) = values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
    if lo > hi {
        return None;
    }
    if lo == hi {
        return Some((lo - 0.5, hi + 0.5));
    }
    Some((lo, hi))
}

/// Segments of a dashed line from `from` to `to`: `pieces` dashes with gaps
/// of the same length between them, the first dash starting at `from` and
/// the last ending at `to`.
pub(crate) fn dashes(from: (f64, f64), to: (f64, f64), pieces: usize) -> Vec<[(f64, f64); 2]> {
    let steps = (2 * pieces).saturating_sub(1).max(1) as f64;
    let at = |s: usize| {
        let f = s as f64 / steps;
        (from.0 + (to.0 - from.0) * f, from.1 + (to.1 - from.1) * f)
    };
    (0..pieces).map(|i| [at(2 * i), at(2 * i + 1)]).collect()
}

/// `range` padded by `share` of its width on both sides.
pub(crate) fn padded((lo, hi): (f64, f64), share: f64) -> std::ops::Range<f64> {
    let pad = (hi - lo) * share;
    (lo - pad)..(hi + pad)
}
