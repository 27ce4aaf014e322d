// Copyright 2022 CeresDB Project Authors. Licensed under Apache-2.0.

use std::path::Path;

use plotters::{coord::Shift, prelude::*};
use tracing::debug;

use super::{dashes, plot_error, FONT};
use crate::{
    config::PlotConfig,
    errors::{Error, Result},
    stats::{linspace, normal_cdf, normal_pdf, normal_ppf},
};

const GRID_POINTS: usize = 1000;
const MEAN_DASHES: usize = 8;

/// One sided test of `H0: mu = mu0` against `H1: mu = mu1` from the mean of
/// `n` draws with standard deviation `sigma`.
#[derive(Debug, Clone, PartialEq)]
pub struct HypothesisTest {
    pub mu0: f64,
    pub mu1: f64,
    pub sigma: f64,
    /// Significance level.
    pub alpha: f64,
    pub n: usize,
}

impl Default for HypothesisTest {
    fn default() -> Self {
        Self {
            mu0: 0.0,
            mu1: 3.0,
            sigma: 1.0,
            alpha: 0.05,
            n: 100,
        }
    }
}

impl HypothesisTest {
    pub fn validate(&self) -> Result<()> {
        if !(self.sigma > 0.0) {
            return Err(Error::invalid(format!("sigma must be positive, got {}", self.sigma)));
        }
        if self.n == 0 {
            return Err(Error::invalid("the test needs at least one observation"));
        }
        if !(self.alpha > 0.0 && self.alpha < 1.0) {
            return Err(Error::invalid(format!("alpha must be in (0, 1), got {}", self.alpha)));
        }
        Ok(())
    }

    /// Standard error of the mean.
    pub fn std_err(&self) -> f64 {
        (self.sigma.powi(2) / self.n as f64).sqrt()
    }

    pub fn critical_value(&self) -> f64 {
        self.mu0 + normal_ppf(1.0 - self.alpha) * self.std_err()
    }

    /// Probability of rejecting when `H1` holds.
    pub fn power(&self) -> f64 {
        normal_cdf((self.mu1 - self.critical_value()).abs() / self.std_err())
    }

    /// Probability of a type II error.
    pub fn beta(&self) -> f64 {
        1.0 - self.power()
    }

    /// Points where the densities are evaluated, four standard errors past
    /// both means.
    pub fn grid(&self) -> Vec<f64> {
        let s = self.std_err();
        linspace(self.mu0 - 4.0 * s, self.mu1 + 4.0 * s, GRID_POINTS)
    }

    /// Densities of the sample mean under `H0` and `H1` on [`Self::grid`].
    pub fn densities(&self) -> (Vec<f64>, Vec<f64>) {
        let s = self.std_err();
        self.grid()
            .into_iter()
            .map(|x| (normal_pdf(x, self.mu0, s), normal_pdf(x, self.mu1, s)))
            .unzip()
    }

    /// Dashed vertical lines at both means, up to the peak of their density.
    pub fn mean_markers(&self) -> Vec<[(f64, f64); 2]> {
        let s = self.std_err();
        [self.mu0, self.mu1]
            .into_iter()
            .flat_map(|mu| dashes((mu, 0.0), (mu, normal_pdf(mu, mu, s)), MEAN_DASHES))
            .collect()
    }

    /// Legend entries: both distributions, the significance area, the type
    /// II area and the critical value.
    pub fn labels(&self) -> [String; 5] {
        [
            format!("Distribution under H0: μ={}", self.mu0),
            format!("Distribution under H1: μ={}", self.mu1),
            format!("Significance: α={:.2}", self.alpha),
            format!("β={:.2}", self.beta()),
            format!("Critical Value: {:.2}", self.critical_value()),
        ]
    }

    pub fn draw<DB: DrawingBackend>(
        &self,
        root: &DrawingArea<DB, Shift>,
        config: &PlotConfig,
    ) -> Result<()> {
        self.validate()?;
        let x = self.grid();
        let (h0, h1) = self.densities();
        let cv = self.critical_value();
        let [h0_label, h1_label, alpha_label, beta_label, cv_label] = self.labels();

        let h0_max = h0.iter().copied().fold(0.0, f64::max);
        let h1_max = h1.iter().copied().fold(0.0, f64::max);
        let y_max = h0_max.max(h1_max) * 1.1;
        let s = self.std_err();
        let x_range = (self.mu0 - 4.0 * s)..(self.mu1 + 4.0 * s);

        root.fill(&WHITE).map_err(plot_error)?;
        let mut chart = ChartBuilder::on(root)
            .caption("Hypothesis Testing", (FONT, config.title_size))
            .margin(config.margin)
            .x_label_area_size(config.label_size * 2)
            .y_label_area_size(config.label_size * 3)
            .build_cartesian_2d(x_range, 0.0..y_max)
            .map_err(plot_error)?;
        chart
            .configure_mesh()
            .disable_mesh()
            .label_style((FONT, config.label_size))
            .draw()
            .map_err(plot_error)?;

        let width = config.line_width;
        for (i, (density, label)) in [(&h0, h0_label), (&h1, h1_label)].into_iter().enumerate() {
            let color = config.color(i);
            chart
                .draw_series(LineSeries::new(
                    x.iter().copied().zip(density.iter().copied()),
                    color.stroke_width(width),
                ))
                .map_err(plot_error)?
                .label(label)
                .legend(move |(x, y)| {
                    PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(width))
                });
        }

        // Rejection region under H0 and acceptance region under H1.
        let areas = [
            (&h0, RED, alpha_label, true),
            (&h1, GREEN, beta_label, false),
        ];
        for (density, color, label, above) in areas {
            let points = x
                .iter()
                .zip(density)
                .filter(|(x, _)| if above { **x >= cv } else { **x <= cv })
                .map(|(x, y)| (*x, *y))
                .collect::<Vec<_>>();
            chart
                .draw_series(AreaSeries::new(points, 0.0, color.mix(0.4).filled()))
                .map_err(plot_error)?
                .label(label)
                .legend(move |(x, y)| {
                    Rectangle::new([(x, y - 6), (x + 20, y + 6)], color.mix(0.4).filled())
                });
        }

        chart
            .draw_series(std::iter::once(PathElement::new(
                vec![(cv, 0.0), (cv, y_max)],
                BLACK.stroke_width(width),
            )))
            .map_err(plot_error)?
            .label(cv_label)
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLACK.stroke_width(width)));
        chart
            .draw_series(
                self.mean_markers()
                    .into_iter()
                    .map(|dash| PathElement::new(dash.to_vec(), BLACK.stroke_width(1))),
            )
            .map_err(plot_error)?;

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .label_font((FONT, config.legend_size))
            .background_style(WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()
            .map_err(plot_error)?;
        Ok(())
    }

    /// Render the figure as an SVG document.
    pub fn to_svg(&self, config: &PlotConfig) -> Result<String> {
        let mut svg = String::new();
        {
            let root = SVGBackend::with_string(&mut svg, (config.width, config.height))
                .into_drawing_area();
            self.draw(&root, config)?;
            root.present().map_err(plot_error)?;
        }
        Ok(svg)
    }

    pub fn save_svg(&self, path: impl AsRef<Path>, config: &PlotConfig) -> Result<()> {
        let path = path.as_ref();
        let root = SVGBackend::new(path, (config.width, config.height)).into_drawing_area();
        self.draw(&root, config)?;
        root.present().map_err(plot_error)?;
        debug!(path = %path.display(), "Saved hypothesis test figure");
        Ok(())
    }
}
