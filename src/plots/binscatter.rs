// Copyright 2022 CeresDB Project Authors. Licensed under Apache-2.0.

use std::{collections::BTreeMap, path::Path};

use plotters::{coord::Shift, prelude::*};
use tracing::debug;

use super::{padded, plot_error, value_range, FONT};
use crate::{
    config::PlotConfig,
    errors::{Error, Result},
    model::Dataset,
    stats::{mean, normal_ppf, std_dev, Ols},
};

/// Mean of x and y within one quantile bin of x.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bin {
    pub x: f64,
    pub y: f64,
    pub count: usize,
    /// Confidence interval of the mean of y, when asked for and the bin
    /// holds at least two points.
    pub ci: Option<(f64, f64)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BinscatterFit {
    pub bins: Vec<Bin>,
    /// Line fitted on the raw points, not on the bins.
    pub fit: Ols,
}

/// Binned scatterplot: the conditional mean of y at quantiles of x.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Binscatter {
    pub bins: usize,
    /// Confidence level of the interval around every bin mean, none if not
    /// set.
    pub ci: Option<f64>,
}

impl Default for Binscatter {
    fn default() -> Self {
        Self { bins: 20, ci: None }
    }
}

impl Binscatter {
    pub fn new(bins: usize) -> Self {
        Self { bins, ci: None }
    }

    #[must_use]
    pub fn with_ci(mut self, level: f64) -> Self {
        self.ci = Some(level);
        self
    }

    /// Split the points into bins holding the same number of points, up to
    /// one, in increasing order of x.
    ///
    /// Points with a missing coordinate are ignored. With fewer points than
    /// bins every point is its own bin.
    pub fn compute(&self, x: &[f64], y: &[f64]) -> Result<BinscatterFit> {
        if self.bins == 0 {
            return Err(Error::invalid("binscatter needs at least one bin"));
        }
        if x.len() != y.len() {
            return Err(Error::invalid(format!(
                "x has {} values but y has {}",
                x.len(),
                y.len()
            )));
        }
        // Two sided normal quantile of the level.
        let z = match self.ci {
            Some(level) if level > 0.0 && level < 1.0 => Some(normal_ppf(0.5 + level / 2.0)),
            Some(level) => {
                return Err(Error::invalid(format!(
                    "confidence level must be in (0, 1), got {level}"
                )))
            }
            None => None,
        };

        let mut points = x
            .iter()
            .zip(y)
            .filter(|(x, y)| x.is_finite() && y.is_finite())
            .map(|(x, y)| (*x, *y))
            .collect::<Vec<_>>();
        points.sort_by(|a, b| a.0.total_cmp(&b.0));

        let n = points.len();
        let (xs, ys): (Vec<f64>, Vec<f64>) = points.iter().copied().unzip();
        let fit = Ols::fit(&xs, &ys)?;

        let bins = self.bins.min(n);
        let mut result = Vec::with_capacity(bins);
        for b in 0..bins {
            let lo = b * n / bins;
            let hi = (b + 1) * n / bins;
            if lo == hi {
                continue;
            }
            let y = mean(&ys[lo..hi]);
            let count = hi - lo;
            let ci = z.filter(|_| count > 1).map(|z| {
                let half = z * std_dev(&ys[lo..hi]) / (count as f64).sqrt();
                (y - half, y + half)
            });
            result.push(Bin {
                x: mean(&xs[lo..hi]),
                y,
                count,
                ci,
            });
        }
        Ok(BinscatterFit { bins: result, fit })
    }

    pub fn compute_dataset(&self, dataset: &Dataset, x: &str, y: &str) -> Result<BinscatterFit> {
        self.compute(&dataset.f64_column(x)?, &dataset.f64_column(y)?)
    }

    /// One binscatter per group label, in label order.
    pub fn compute_by(
        &self,
        x: &[f64],
        y: &[f64],
        groups: &[String],
    ) -> Result<Vec<(String, BinscatterFit)>> {
        if groups.len() != x.len() || groups.len() != y.len() {
            return Err(Error::invalid(format!(
                "{} group labels for {} x and {} y values",
                groups.len(),
                x.len(),
                y.len()
            )));
        }
        let mut split = BTreeMap::<&str, (Vec<f64>, Vec<f64>)>::new();
        for ((x, y), group) in x.iter().zip(y).zip(groups) {
            let (xs, ys) = split.entry(group.as_str()).or_default();
            xs.push(*x);
            ys.push(*y);
        }
        debug!(groups = split.len(), "Binscatter by group");
        split
            .into_iter()
            .map(|(group, (xs, ys))| Ok((group.to_string(), self.compute(&xs, &ys)?)))
            .collect()
    }

    /// Binscatter of `y` on `x` for every value of the column `by`. Numeric
    /// group values are labelled by their shortest decimal form.
    pub fn compute_dataset_by(
        &self,
        dataset: &Dataset,
        x: &str,
        y: &str,
        by: &str,
    ) -> Result<Vec<(String, BinscatterFit)>> {
        let groups = match dataset.str_column(by) {
            Ok(groups) => groups,
            Err(Error::ColumnType { .. }) => dataset
                .f64_column(by)?
                .iter()
                .map(|v| v.to_string())
                .collect(),
            Err(e) => return Err(e),
        };
        self.compute_by(&dataset.f64_column(x)?, &dataset.f64_column(y)?, &groups)
    }

    pub fn draw<DB: DrawingBackend>(
        &self,
        root: &DrawingArea<DB, Shift>,
        fit: &BinscatterFit,
        x_name: &str,
        y_name: &str,
        config: &PlotConfig,
    ) -> Result<()> {
        self.render(root, &[(None, fit)], x_name, y_name, config)
    }

    /// Draw one colored series per group, with a legend.
    pub fn draw_by<DB: DrawingBackend>(
        &self,
        root: &DrawingArea<DB, Shift>,
        fits: &[(String, BinscatterFit)],
        x_name: &str,
        y_name: &str,
        config: &PlotConfig,
    ) -> Result<()> {
        let series = fits
            .iter()
            .map(|(group, fit)| (Some(group.as_str()), fit))
            .collect::<Vec<_>>();
        self.render(root, &series, x_name, y_name, config)
    }

    fn render<DB: DrawingBackend>(
        &self,
        root: &DrawingArea<DB, Shift>,
        series: &[(Option<&str>, &BinscatterFit)],
        x_name: &str,
        y_name: &str,
        config: &PlotConfig,
    ) -> Result<()> {
        let bins = || series.iter().flat_map(|(_, fit)| fit.bins.iter());
        let x_range = value_range(bins().map(|b| b.x)).ok_or_else(|| Error::invalid("nothing to plot"))?;
        let lines = series
            .iter()
            .map(|(_, fit)| [x_range.0, x_range.1].map(|x| (x, fit.fit.predict(x))))
            .collect::<Vec<_>>();
        let y_range = value_range(
            bins()
                .flat_map(|b| {
                    let (lo, hi) = b.ci.unwrap_or((b.y, b.y));
                    [b.y, lo, hi]
                })
                .chain(lines.iter().flatten().map(|(_, y)| *y)),
        )
        .ok_or_else(|| Error::invalid("nothing to plot"))?;

        root.fill(&WHITE).map_err(plot_error)?;
        let mut chart = ChartBuilder::on(root)
            .caption(format!("Binned scatterplot of {y_name} on {x_name}"), (FONT, config.title_size))
            .margin(config.margin)
            .x_label_area_size(config.label_size * 2)
            .y_label_area_size(config.label_size * 3)
            .build_cartesian_2d(padded(x_range, 0.05), padded(y_range, 0.05))
            .map_err(plot_error)?;
        chart
            .configure_mesh()
            .x_desc(x_name)
            .y_desc(y_name)
            .label_style((FONT, config.label_size))
            .draw()
            .map_err(plot_error)?;

        let single = series.len() == 1;
        for (i, ((group, fit), line)) in series.iter().zip(lines).enumerate() {
            let dots = config.color(i);
            let radius = config.line_width * 2;
            chart
                .draw_series(fit.bins.iter().filter_map(|b| {
                    b.ci.map(|(lo, hi)| {
                        PathElement::new(vec![(b.x, lo), (b.x, hi)], dots.stroke_width(config.line_width / 2 + 1))
                    })
                }))
                .map_err(plot_error)?;
            let drawn = chart
                .draw_series(
                    fit.bins
                        .iter()
                        .map(|b| Circle::new((b.x, b.y), radius, dots.filled())),
                )
                .map_err(plot_error)?;
            if let Some(group) = group {
                drawn
                    .label(*group)
                    .legend(move |(x, y)| Circle::new((x, y), radius, dots.filled()));
            }
            let line_color = if single { config.color(3) } else { dots };
            chart
                .draw_series(LineSeries::new(line, line_color.stroke_width(config.line_width)))
                .map_err(plot_error)?;
        }

        if series.iter().any(|(group, _)| group.is_some()) {
            chart
                .configure_series_labels()
                .position(SeriesLabelPosition::UpperLeft)
                .label_font((FONT, config.legend_size))
                .background_style(WHITE.mix(0.8))
                .border_style(&BLACK)
                .draw()
                .map_err(plot_error)?;
        }
        Ok(())
    }

    /// Render one fit, or one series per group, as an SVG document.
    pub fn to_svg(
        &self,
        fits: &[(String, BinscatterFit)],
        x_name: &str,
        y_name: &str,
        config: &PlotConfig,
    ) -> Result<String> {
        let mut svg = String::new();
        {
            let root = SVGBackend::with_string(&mut svg, (config.width, config.height))
                .into_drawing_area();
            self.draw_by(&root, fits, x_name, y_name, config)?;
            root.present().map_err(plot_error)?;
        }
        Ok(svg)
    }

    pub fn save_svg(
        &self,
        path: impl AsRef<Path>,
        fit: &BinscatterFit,
        x_name: &str,
        y_name: &str,
        config: &PlotConfig,
    ) -> Result<()> {
        let path = path.as_ref();
        let root = SVGBackend::new(path, (config.width, config.height)).into_drawing_area();
        self.draw(&root, fit, x_name, y_name, config)?;
        root.present().map_err(plot_error)?;
        debug!(path = %path.display(), bins = fit.bins.len(), "Saved binscatter");
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::Binscatter;
    use crate::{
        config::PlotConfig,
        dgp::{Dgp, Marketplace},
        options::GenerateOptions,
    };

    #[test]
    fn test_equal_count_bins() {
        let x = (0..100).rev().map(f64::from).collect::<Vec<_>>();
        let y = x.iter().map(|x| 2.0 * x + 1.0).collect::<Vec<_>>();
        let fit = Binscatter::new(4).compute(&x, &y).unwrap();

        assert_eq!(4, fit.bins.len());
        assert!(fit.bins.iter().all(|b| b.count == 25));
        assert_eq!(12.0, fit.bins[0].x);
        assert_eq!(25.0, fit.bins[0].y);
        assert!(fit.bins.windows(2).all(|w| w[0].x < w[1].x));
        assert!((fit.fit.slope - 2.0).abs() < 1e-12);
        assert!((fit.fit.intercept - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_few_points_and_missing_values() {
        let x = [3.0, f64::NAN, 1.0, 2.0];
        let y = [1.0, 5.0, 2.0, f64::NAN];
        let fit = Binscatter::default().compute(&x, &y).unwrap();
        assert_eq!(2, fit.bins.len());
        assert_eq!(1.0, fit.bins[0].x);

        assert!(Binscatter::new(0).compute(&x, &y).is_err());
        assert!(Binscatter::default().compute(&x, &y[..2]).is_err());
    }

    #[test]
    fn test_confidence_intervals() {
        let x = (0..40).map(f64::from).collect::<Vec<_>>();
        let y = x
            .iter()
            .map(|x| x + if *x as i64 % 2 == 0 { 1.0 } else { -1.0 })
            .collect::<Vec<_>>();
        let fit = Binscatter::new(4).with_ci(0.95).compute(&x, &y).unwrap();
        for bin in &fit.bins {
            let (lo, hi) = bin.ci.unwrap();
            assert!(lo < bin.y && bin.y < hi);
            assert!(((bin.y - lo) - (hi - bin.y)).abs() < 1e-9);
        }
        let wider = Binscatter::new(4).with_ci(0.99).compute(&x, &y).unwrap();
        let width = |b: &super::Bin| b.ci.map(|(lo, hi)| hi - lo).unwrap();
        assert!(width(&wider.bins[0]) > width(&fit.bins[0]));

        // A single point has no interval.
        let single = Binscatter::new(40).with_ci(0.95).compute(&x, &y).unwrap();
        assert!(single.bins.iter().all(|b| b.ci.is_none()));
        assert!(Binscatter::new(4).with_ci(1.5).compute(&x, &y).is_err());
        assert!(Binscatter::default().compute(&x, &y).unwrap().bins[0].ci.is_none());
    }

    #[test]
    fn test_binscatter_by_group() {
        let ds = Marketplace
            .generate_data(&GenerateOptions::default().size(3000))
            .unwrap();
        let binscatter = Binscatter::new(10).with_ci(0.9);
        let fits = binscatter
            .compute_dataset_by(&ds, "age", "sales", "online")
            .unwrap();
        assert_eq!(
            vec!["0", "1"],
            fits.iter().map(|(g, _)| g.as_str()).collect::<Vec<_>>()
        );
        let total = fits
            .iter()
            .flat_map(|(_, fit)| fit.bins.iter())
            .map(|b| b.count)
            .sum::<usize>();
        assert_eq!(3000, total);

        let svg = binscatter
            .to_svg(&fits, "age", "sales", &PlotConfig::default())
            .unwrap();
        assert!(svg.contains("Binned scatterplot of sales on age"));

        let labels = ["a".to_string(), "b".to_string()];
        assert!(binscatter.compute_by(&[1.0, 2.0], &[1.0, 2.0], &labels[..1]).is_err());
    }

    #[test]
    fn test_binscatter_of_dataset() {
        let ds = Marketplace
            .generate_data(&GenerateOptions::default().size(2000))
            .unwrap();
        let binscatter = Binscatter::default();
        let fit = binscatter.compute_dataset(&ds, "age", "sales").unwrap();
        assert_eq!(20, fit.bins.len());
        assert_eq!(2000, fit.bins.iter().map(|b| b.count).sum::<usize>());

        let path = crate::io::test::temp_path("binscatter.svg");
        binscatter
            .save_svg(&path, &fit, "age", "sales", &PlotConfig::default())
            .unwrap();
        let svg = std::fs::read_to_string(&path).unwrap();
        assert!(svg.contains("Binned scatterplot of sales on age"));
        std::fs::remove_file(&path).unwrap();
    }
}
