// Copyright 2022 CeresDB Project Authors. Licensed under Apache-2.0.

//! Animation of the orthogonal projection of y on x: the fitted line is
//! pulled down to zero, carrying the points with it, until only the
//! residuals are left.

use std::path::Path;

use plotters::{coord::Shift, prelude::*};
use tracing::info;

use super::{dashes, padded, plot_error, value_range};
use crate::{
    config::PlotConfig,
    errors::{Error, Result},
    stats::{linspace, std_dev, Ols},
};

const START: RGBColor = RGBColor(0, 0, 255);
const END: RGBColor = RGBColor(0, 128, 0);
const RESIDUAL_DASHES: usize = 3;

/// Three panels side by side: y on its own, the points with the shrinking
/// fitted line, and the residuals on their own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectionAnimation {
    /// Frames moving the line from the fit to zero.
    pub steps: usize,
    /// Frames showing the fit before the line moves.
    pub lead_frames: usize,
    /// Frames showing the residuals at the end.
    pub hold_frames: usize,
}

impl Default for ProjectionAnimation {
    fn default() -> Self {
        Self {
            steps: 50,
            lead_frames: 20,
            hold_frames: 20,
        }
    }
}

/// Color of step `k` out of `steps`, from blue to green.
fn blend(k: usize, steps: usize) -> RGBColor {
    let t = if steps > 1 {
        k as f64 / (steps - 1) as f64
    } else {
        0.0
    };
    let mix = |a: u8, b: u8| (a as f64 * (1.0 - t) + b as f64 * t).round() as u8;
    RGBColor(mix(START.0, END.0), mix(START.1, END.1), mix(START.2, END.2))
}

impl ProjectionAnimation {
    pub fn num_frames(&self) -> usize {
        self.lead_frames + self.steps + self.hold_frames
    }

    /// Step shown in `frame`, the first step during the lead frames and the
    /// last one during the hold frames.
    pub fn step(&self, frame: usize) -> usize {
        frame
            .saturating_sub(self.lead_frames)
            .min(self.steps.saturating_sub(1))
    }

    /// Intercept and slope of the line at every step, from the fit to zero.
    pub fn lines(&self, fit: &Ols) -> Vec<(f64, f64)> {
        linspace(fit.intercept, 0.0, self.steps)
            .into_iter()
            .zip(linspace(fit.slope, 0.0, self.steps))
            .collect()
    }

    /// Points at step `k`: the residual added to the line of that step.
    pub fn points(&self, x: &[f64], y: &[f64], fit: &Ols, k: usize) -> Vec<(f64, f64)> {
        let (a, b) = self
            .lines(fit)
            .get(k)
            .copied()
            .unwrap_or((fit.intercept, fit.slope));
        x.iter()
            .zip(y)
            .map(|(x, y)| (*x, a + b * x + y - fit.predict(*x)))
            .collect()
    }

    fn validate(&self, x: &[f64], y: &[f64]) -> Result<Ols> {
        if self.steps < 2 {
            return Err(Error::invalid(format!(
                "the projection needs at least 2 steps, got {}",
                self.steps
            )));
        }
        if x.len() != y.len() {
            return Err(Error::invalid(format!(
                "x has {} values but y has {}",
                x.len(),
                y.len()
            )));
        }
        if x.iter().chain(y).any(|v| !v.is_finite()) {
            return Err(Error::invalid("the projection needs finite values"));
        }
        Ols::fit(x, y)
    }

    /// Draw `frame`. Text is left out so any backend works.
    pub fn draw_frame<DB: DrawingBackend>(
        &self,
        root: &DrawingArea<DB, Shift>,
        x: &[f64],
        y: &[f64],
        frame: usize,
        config: &PlotConfig,
    ) -> Result<()> {
        let fit = self.validate(x, y)?;
        self.render(root, x, y, &fit, frame, config)
    }

    fn render<DB: DrawingBackend>(
        &self,
        root: &DrawingArea<DB, Shift>,
        x: &[f64],
        y: &[f64],
        fit: &Ols,
        frame: usize,
        config: &PlotConfig,
    ) -> Result<()> {
        let k = self.step(frame);
        let (a, b) = self.lines(fit)[k];
        let residuals = x
            .iter()
            .zip(y)
            .map(|(x, y)| y - fit.predict(*x))
            .collect::<Vec<_>>();
        let points = self.points(x, y, fit, k);

        let pad = 0.3 * std_dev(y);
        let (lo, hi) = value_range(y.iter().chain(&residuals).copied())
            .ok_or_else(|| Error::invalid("nothing to plot"))?;
        let y_range = (lo - pad)..(hi + pad);
        let x_range = value_range(x.iter().copied()).ok_or_else(|| Error::invalid("nothing to plot"))?;

        root.fill(&WHITE).map_err(plot_error)?;
        let width = root.dim_in_pixel().0 as i32;
        let (left, rest) = root.split_horizontally(width / 7);
        let (middle, right) = rest.split_horizontally(width * 5 / 7);
        let radius = config.line_width + 1;

        let mut chart = ChartBuilder::on(&left)
            .margin(config.margin)
            .build_cartesian_2d(-1.0..1.0, y_range.clone())
            .map_err(plot_error)?;
        chart
            .draw_series(y.iter().map(|y| Circle::new((0.0, *y), radius, config.color(0).filled())))
            .map_err(plot_error)?;

        let mut chart = ChartBuilder::on(&middle)
            .margin(config.margin)
            .build_cartesian_2d(padded(x_range, 0.05), y_range.clone())
            .map_err(plot_error)?;
        chart
            .draw_series(x.iter().zip(&points).flat_map(|(x, (_, p))| {
                dashes((*x, *p), (*x, a + b * x), RESIDUAL_DASHES)
                    .into_iter()
                    .map(|dash| PathElement::new(dash.to_vec(), BLACK.mix(0.5).stroke_width(1)))
            }))
            .map_err(plot_error)?;
        let color = blend(k, self.steps);
        chart
            .draw_series(points.iter().map(|p| Circle::new(*p, radius, color.filled())))
            .map_err(plot_error)?;
        chart
            .draw_series(LineSeries::new(
                [x_range.0, x_range.1].map(|x| (x, a + b * x)),
                RED.stroke_width(config.line_width),
            ))
            .map_err(plot_error)?;

        let mut chart = ChartBuilder::on(&right)
            .margin(config.margin)
            .build_cartesian_2d(-1.0..1.0, y_range)
            .map_err(plot_error)?;
        chart
            .draw_series(residuals.iter().map(|e| Circle::new((0.0, *e), radius, END.filled())))
            .map_err(plot_error)?;
        Ok(())
    }

    /// Write the animation as a GIF. Returns the number of frames.
    pub fn save_gif(
        &self,
        path: impl AsRef<Path>,
        x: &[f64],
        y: &[f64],
        config: &PlotConfig,
    ) -> Result<usize> {
        let path = path.as_ref();
        let fit = self.validate(x, y)?;
        let root = BitMapBackend::gif(path, (config.width, config.height), config.frame_delay_ms())
            .map_err(plot_error)?
            .into_drawing_area();

        let frames = self.num_frames();
        for frame in 0..frames {
            self.render(&root, x, y, &fit, frame, config)?;
            root.present().map_err(plot_error)?;
        }
        info!(path = %path.display(), frames, "Saved projection animation");
        Ok(frames)
    }
}

#[cfg(test)]
mod test {
    use super::{blend, ProjectionAnimation, END, START};
    use crate::{config::PlotConfig, stats::Ols};

    fn data() -> (Vec<f64>, Vec<f64>) {
        let x = (0..30).map(|i| f64::from(i) / 3.0).collect::<Vec<_>>();
        let y = x
            .iter()
            .enumerate()
            .map(|(i, x)| 2.0 + 0.8 * x + if i % 3 == 0 { 0.5 } else { -0.25 })
            .collect();
        (x, y)
    }

    #[test]
    fn test_frames_and_steps() {
        let animation = ProjectionAnimation::default();
        assert_eq!(90, animation.num_frames());
        assert_eq!(0, animation.step(0));
        assert_eq!(0, animation.step(20));
        assert_eq!(10, animation.step(30));
        assert_eq!(49, animation.step(69));
        assert_eq!(49, animation.step(89));

        assert_eq!(START, blend(0, 50));
        assert_eq!(END, blend(49, 50));
    }

    #[test]
    fn test_points_move_from_data_to_residuals() {
        let (x, y) = data();
        let fit = Ols::fit(&x, &y).unwrap();
        let animation = ProjectionAnimation::default();

        let lines = animation.lines(&fit);
        assert_eq!(50, lines.len());
        assert_eq!((fit.intercept, fit.slope), lines[0]);
        assert!(lines[49].0.abs() < 1e-12 && lines[49].1.abs() < 1e-12);

        let first = animation.points(&x, &y, &fit, 0);
        let last = animation.points(&x, &y, &fit, 49);
        for i in 0..x.len() {
            assert!((first[i].1 - y[i]).abs() < 1e-9);
            assert!((last[i].1 - (y[i] - fit.predict(x[i]))).abs() < 1e-9);
        }
    }

    #[test]
    fn test_save_gif() {
        let (x, y) = data();
        let animation = ProjectionAnimation {
            steps: 4,
            lead_frames: 1,
            hold_frames: 1,
        };
        let config = PlotConfig {
            width: 210,
            height: 120,
            margin: 5,
            ..Default::default()
        };
        let path = crate::io::test::temp_path("projection.gif");
        assert_eq!(6, animation.save_gif(&path, &x, &y, &config).unwrap());

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(b"GIF89a", &bytes[..6]);
        std::fs::remove_file(&path).unwrap();

        let short = ProjectionAnimation {
            steps: 1,
            ..Default::default()
        };
        assert!(short.save_gif(&path, &x, &y, &config).is_err());
        assert!(animation.save_gif(&path, &x, &y[..3], &config).is_err());
    }
}
