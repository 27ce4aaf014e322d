// Copyright 2022 CeresDB Project Authors. Licensed under Apache-2.0.

use std::path::Path;

use plotters::{coord::Shift, prelude::*};
use tracing::info;

use super::{padded, plot_error, value_range, FONT};
use crate::{
    config::PlotConfig,
    errors::{Error, Result},
};

/// Least squares fit on the first `n` points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameEstimate {
    pub n: usize,
    pub intercept: f64,
    pub slope: f64,
    /// Standard error of the slope, NaN with fewer than three points.
    pub std_err: f64,
}

/// Animation of a slope estimate as the sample grows one point at a time.
#[derive(Debug, Clone, PartialEq)]
pub struct RegressionAnimation {
    /// Points in the first frame.
    pub start: usize,
    /// Frames repeating the final estimate at the end of the animation.
    pub hold_frames: usize,
    /// Shade one standard error around the estimate.
    pub show_ci: bool,
}

impl Default for RegressionAnimation {
    fn default() -> Self {
        Self {
            start: 10,
            hold_frames: 20,
            show_ci: false,
        }
    }
}

/// Running sums that give the least squares fit of every prefix.
#[derive(Debug, Default)]
struct Moments {
    n: f64,
    sx: f64,
    sy: f64,
    sxx: f64,
    sxy: f64,
    syy: f64,
}

impl Moments {
    fn push(&mut self, x: f64, y: f64) {
        self.n += 1.0;
        self.sx += x;
        self.sy += y;
        self.sxx += x * x;
        self.sxy += x * y;
        self.syy += y * y;
    }

    fn estimate(&self) -> Option<FrameEstimate> {
        let cxx = self.sxx - self.sx * self.sx / self.n;
        if !(cxx > 0.0) {
            return None;
        }
        let cxy = self.sxy - self.sx * self.sy / self.n;
        let cyy = self.syy - self.sy * self.sy / self.n;
        let slope = cxy / cxx;
        let intercept = (self.sy - slope * self.sx) / self.n;
        let std_err = if self.n > 2.0 {
            let ssr = (cyy - slope * cxy).max(0.0);
            (ssr / (self.n - 2.0) / cxx).sqrt()
        } else {
            f64::NAN
        };
        Some(FrameEstimate {
            n: self.n as usize,
            intercept,
            slope,
            std_err,
        })
    }
}

impl RegressionAnimation {
    /// Estimates on the first `start`, `start + 1`, ... `len` points.
    ///
    /// Prefixes where x has no variance yet are skipped.
    pub fn estimates(&self, x: &[f64], y: &[f64]) -> Result<Vec<FrameEstimate>> {
        if x.len() != y.len() {
            return Err(Error::invalid(format!(
                "x has {} values but y has {}",
                x.len(),
                y.len()
            )));
        }
        let start = self.start.max(2);
        if x.len() < start {
            return Err(Error::invalid(format!(
                "the animation starts at {start} points but there are {}",
                x.len()
            )));
        }

        let mut moments = Moments::default();
        let mut estimates = Vec::with_capacity(x.len() - start + 1);
        for (i, (x, y)) in x.iter().zip(y).enumerate() {
            moments.push(*x, *y);
            if i + 1 >= start {
                if let Some(estimate) = moments.estimate() {
                    estimates.push(estimate);
                }
            }
        }
        Ok(estimates)
    }

    /// Draw the path of the estimates up to frame `upto`, on axes that fit
    /// the whole path, with caption and axis labels.
    ///
    /// Needs a backend that renders text, such as SVG.
    pub fn draw_frame<DB: DrawingBackend>(
        &self,
        root: &DrawingArea<DB, Shift>,
        estimates: &[FrameEstimate],
        upto: usize,
        config: &PlotConfig,
    ) -> Result<()> {
        self.render(root, estimates, upto, config, true)
    }

    fn render<DB: DrawingBackend>(
        &self,
        root: &DrawingArea<DB, Shift>,
        estimates: &[FrameEstimate],
        upto: usize,
        config: &PlotConfig,
        labelled: bool,
    ) -> Result<()> {
        let (first, last) = match (estimates.first(), estimates.last()) {
            (Some(first), Some(last)) => (*first, *last),
            _ => return Err(Error::invalid("no estimates to draw")),
        };
        let band = |e: &FrameEstimate| {
            if self.show_ci && e.std_err.is_finite() {
                e.std_err
            } else {
                0.0
            }
        };
        let y_range = value_range(
            estimates
                .iter()
                .flat_map(|e| [e.slope - band(e), e.slope + band(e)]),
        )
        .ok_or_else(|| Error::invalid("no finite estimate to draw"))?;
        let x_range = (first.n as f64 - 1.0)..(last.n as f64 + 1.0);
        let shown = &estimates[..(upto + 1).min(estimates.len())];

        root.fill(&WHITE).map_err(plot_error)?;
        let mut builder = ChartBuilder::on(root);
        builder.margin(config.margin);
        if labelled {
            builder
                .caption("Estimated Treatment Effect", (FONT, config.title_size))
                .x_label_area_size(config.label_size * 2)
                .y_label_area_size(config.label_size * 3);
        }
        let mut chart = builder
            .build_cartesian_2d(x_range.clone(), padded(y_range, 0.1))
            .map_err(plot_error)?;
        if labelled {
            chart
                .configure_mesh()
                .x_desc("n")
                .y_desc("beta")
                .label_style((FONT, config.label_size))
                .draw()
                .map_err(plot_error)?;
        } else {
            // Final estimate as reference, in place of the axes.
            chart
                .draw_series(std::iter::once(PathElement::new(
                    vec![(x_range.start, last.slope), (x_range.end, last.slope)],
                    BLACK.mix(0.3).stroke_width(1),
                )))
                .map_err(plot_error)?;
        }

        let color = config.color(0);
        if self.show_ci {
            let upper = shown.iter().map(|e| (e.n as f64, e.slope + band(e)));
            let lower = shown.iter().rev().map(|e| (e.n as f64, e.slope - band(e)));
            chart
                .draw_series(std::iter::once(Polygon::new(
                    upper.chain(lower).collect::<Vec<_>>(),
                    color.mix(0.2).filled(),
                )))
                .map_err(plot_error)?;
        }
        chart
            .draw_series(LineSeries::new(
                shown.iter().map(|e| (e.n as f64, e.slope)),
                color.stroke_width(config.line_width),
            ))
            .map_err(plot_error)?;
        Ok(())
    }

    /// One labelled frame as an SVG document.
    pub fn frame_svg(&self, x: &[f64], y: &[f64], upto: usize, config: &PlotConfig) -> Result<String> {
        let estimates = self.estimates(x, y)?;
        let mut svg = String::new();
        {
            let root = SVGBackend::with_string(&mut svg, (config.width, config.height))
                .into_drawing_area();
            self.draw_frame(&root, &estimates, upto, config)?;
            root.present().map_err(plot_error)?;
        }
        Ok(svg)
    }

    /// Write the animation as a GIF, one frame per estimate followed by the
    /// hold frames. Returns the number of frames.
    ///
    /// Frames carry no text, a faint line marks the final estimate.
    pub fn save_gif(
        &self,
        path: impl AsRef<Path>,
        x: &[f64],
        y: &[f64],
        config: &PlotConfig,
    ) -> Result<usize> {
        let path = path.as_ref();
        let estimates = self.estimates(x, y)?;
        let root = BitMapBackend::gif(path, (config.width, config.height), config.frame_delay_ms())
            .map_err(plot_error)?
            .into_drawing_area();

        let frames = estimates.len() + self.hold_frames;
        for frame in 0..frames {
            self.render(&root, &estimates, frame, config, false)?;
            root.present().map_err(plot_error)?;
        }
        info!(path = %path.display(), frames, "Saved regression animation");
        Ok(frames)
    }
}

#[cfg(test)]
mod test {
    use super::RegressionAnimation;
    use crate::{config::PlotConfig, stats::Ols};

    fn data() -> (Vec<f64>, Vec<f64>) {
        let x = (0..60).map(|i| ((i * 37) % 60) as f64 / 6.0).collect::<Vec<_>>();
        let y = x
            .iter()
            .enumerate()
            .map(|(i, x)| 1.0 + 0.5 * x + if i % 2 == 0 { 0.3 } else { -0.3 })
            .collect();
        (x, y)
    }

    #[test]
    fn test_estimates_converge_to_full_fit() {
        let (x, y) = data();
        let estimates = RegressionAnimation::default().estimates(&x, &y).unwrap();
        assert_eq!(51, estimates.len());
        assert_eq!(10, estimates[0].n);

        let full = Ols::fit(&x, &y).unwrap();
        let last = estimates.last().unwrap();
        assert_eq!(60, last.n);
        assert!((last.slope - full.slope).abs() < 1e-9);
        assert!((last.intercept - full.intercept).abs() < 1e-9);

        let prefix = Ols::fit(&x[..25], &y[..25]).unwrap();
        assert!((estimates[15].slope - prefix.slope).abs() < 1e-9);
        assert!(estimates.iter().all(|e| e.std_err >= 0.0));
    }

    #[test]
    fn test_invalid_input() {
        let animation = RegressionAnimation::default();
        assert!(animation.estimates(&[1.0, 2.0], &[1.0]).is_err());
        assert!(animation.estimates(&[1.0, 2.0], &[1.0, 2.0]).is_err());

        // No variance in x, no frames.
        let flat = animation.estimates(&[1.0; 12], &[2.0; 12]).unwrap();
        assert!(flat.is_empty());
    }

    #[test]
    fn test_labelled_frame() {
        let (x, y) = data();
        let svg = RegressionAnimation::default()
            .frame_svg(&x, &y, 5, &PlotConfig::default())
            .unwrap();
        assert!(svg.contains("<svg"));
        assert!(svg.contains("Estimated Treatment Effect"));
    }

    #[test]
    fn test_save_gif() {
        let (x, y) = data();
        let animation = RegressionAnimation {
            start: 50,
            hold_frames: 2,
            show_ci: true,
        };
        let config = PlotConfig {
            width: 200,
            height: 120,
            ..Default::default()
        };
        let path = crate::io::test::temp_path("regression.gif");
        let frames = animation.save_gif(&path, &x, &y, &config).unwrap();
        assert_eq!(13, frames);

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(b"GIF89a", &bytes[..6]);
        std::fs::remove_file(&path).unwrap();
    }
}
