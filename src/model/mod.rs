// Copyright 2022 CeresDB Project Authors. Licensed under Apache-2.0.

pub mod builder;
pub mod column;
pub mod dataset;
pub mod display;
pub mod row;
pub mod value;

pub use builder::TableBuilder;
pub use column::{Column, ColumnData, Visibility};
pub use dataset::{Dataset, Roles, Y0, Y1};
pub use row::{Row, RowBuilder};
pub use value::Value;
