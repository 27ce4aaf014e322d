// Copyright 2022 CeresDB Project Authors. Licensed under Apache-2.0.

use arrow::error::ArrowError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// A distribution or option was given a value outside its domain.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("column not found: {0}")]
    ColumnNotFound(String),

    /// The column exists but holds another arrow type.
    #[error("column {name} has type {actual}, expected {expected}")]
    ColumnType {
        name: String,
        expected: String,
        actual: String,
    },

    #[error("column {name} has {actual} rows, expected {expected}")]
    ColumnLength {
        name: String,
        expected: usize,
        actual: usize,
    },

    #[error("duplicate column: {0}")]
    DuplicateColumn(String),

    #[error("unknown data generating process: {0}")]
    UnknownDgp(String),

    #[error("arrow error: {0}")]
    Arrow(#[from] ArrowError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Error from the plotting backend, flattened to its message because the
    /// backend error type is generic over the drawing target.
    #[error("plot error: {0}")]
    Plot(String),

    /// The user supplied estimator failed on one of the simulated samples.
    #[error("estimator failed on seed {seed}: {source}")]
    Estimator {
        seed: u64,
        #[source]
        source: anyhow::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Error::InvalidParameter(msg.into())
    }
}
