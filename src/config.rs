// Copyright 2022 CeresDB Project Authors. Licensed under Apache-2.0.

use std::time::Duration;

use plotters::style::RGBColor;

/// Look of the generated figures.
#[derive(Debug, Clone)]
pub struct PlotConfig {
    /// Width of the figure in pixels.
    ///
    /// Default value is 1000.
    pub width: u32,
    /// Height of the figure in pixels.
    ///
    /// Default value is 600.
    pub height: u32,
    /// Font size of the figure title.
    ///
    /// Default value is 36.
    pub title_size: u32,
    /// Font size of the axis labels.
    ///
    /// Default value is 32.
    pub label_size: u32,
    /// Font size of the legend entries.
    ///
    /// Default value is 28.
    pub legend_size: u32,
    /// Stroke width of the plotted lines.
    ///
    /// Default value is 4.
    pub line_width: u32,
    /// Margin around the drawing area, in pixels.
    pub margin: u32,
    /// Colors cycled through by series that do not pick one.
    pub palette: Vec<RGBColor>,
    /// Delay between two frames of an animation.
    ///
    /// Default value is 100ms.
    pub frame_delay: Duration,
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            width: 1000,
            height: 600,
            title_size: 36,
            label_size: 32,
            legend_size: 28,
            line_width: 4,
            margin: 20,
            palette: vec![
                RGBColor(76, 114, 176),
                RGBColor(221, 132, 82),
                RGBColor(85, 168, 104),
                RGBColor(196, 78, 82),
                RGBColor(129, 114, 179),
            ],
            frame_delay: Duration::from_millis(100),
        }
    }
}

impl PlotConfig {
    /// The `i`-th color of the palette, wrapping around.
    pub fn color(&self, i: usize) -> RGBColor {
        if self.palette.is_empty() {
            return RGBColor(0, 0, 0);
        }
        self.palette[i % self.palette.len()]
    }

    pub(crate) fn frame_delay_ms(&self) -> u32 {
        self.frame_delay.as_millis().min(u32::MAX as u128) as u32
    }
}
