// Copyright 2022 CeresDB Project Authors. Licensed under Apache-2.0.

pub mod config;
pub mod datasets;
pub mod dgp;
pub mod errors;
pub mod io;
pub mod model;
pub mod options;
pub mod plots;
pub mod sampling;
pub mod stats;
mod util;

pub use crate::{
    config::PlotConfig,
    dgp::{by_name, Dgp},
    errors::{Error, Result},
    model::{Dataset, Roles},
    options::{GenerateOptions, MonteCarloOptions, Redraw},
    sampling::{simulate, SimulationResult},
};
