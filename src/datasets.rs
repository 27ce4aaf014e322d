// Copyright 2022 CeresDB Project Authors. Licensed under Apache-2.0.

//! Cleaning of the classic empirical tables used next to the simulated
//! data. Every function takes the raw table as read from a local CSV file
//! and returns the table ready for analysis.

use std::sync::Arc;

use arrow::{
    array::{Array, ArrayRef, BooleanArray, Float64Array, Int64Array, StringArray},
    compute::{cast, concat_batches, filter_record_batch},
    datatypes::{DataType, Field, Schema, SchemaRef},
    record_batch::RecordBatch,
};
use tracing::debug;

use crate::{
    errors::{Error, Result},
    model::dataset::drop_null_rows,
};

const STATES: [&str; 39] = [
    "Alabama",
    "Arkansas",
    "California",
    "Colorado",
    "Connecticut",
    "Delaware",
    "Georgia",
    "Idaho",
    "Illinois",
    "Indiana",
    "Iowa",
    "Kansas",
    "Kentucky",
    "Louisiana",
    "Maine",
    "Minnesota",
    "Mississippi",
    "Missouri",
    "Montana",
    "Nebraska",
    "Nevada",
    "New Hampshire",
    "New Mexico",
    "North Carolina",
    "North Dakota",
    "Ohio",
    "Oklahoma",
    "Pennsylvania",
    "Rhode Island",
    "South Carolina",
    "South Dakota",
    "Tennessee",
    "Texas",
    "Utah",
    "Vermont",
    "Virginia",
    "West Virginia",
    "Wisconsin",
    "Wyoming",
];

const CHAINS: [&str; 4] = ["burgerking", "kfc", "roys", "wendys"];

fn column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a ArrayRef> {
    batch
        .column_by_name(name)
        .ok_or_else(|| Error::ColumnNotFound(name.to_string()))
}

fn f64_values(batch: &RecordBatch, name: &str) -> Result<Float64Array> {
    let array = cast(column(batch, name)?, &DataType::Float64)?;
    let values = array
        .as_any()
        .downcast_ref::<Float64Array>()
        .cloned()
        .ok_or_else(|| Error::ColumnType {
            name: name.to_string(),
            expected: "Float64".to_string(),
            actual: array.data_type().to_string(),
        })?;
    Ok(values)
}

fn i64_values(batch: &RecordBatch, name: &str) -> Result<Int64Array> {
    let array = cast(column(batch, name)?, &DataType::Int64)?;
    let values = array
        .as_any()
        .downcast_ref::<Int64Array>()
        .cloned()
        .ok_or_else(|| Error::ColumnType {
            name: name.to_string(),
            expected: "Int64".to_string(),
            actual: array.data_type().to_string(),
        })?;
    Ok(values)
}

/// Rebuild a batch from named columns, keeping their types.
fn assemble(columns: Vec<(String, ArrayRef)>) -> Result<RecordBatch> {
    let fields = columns
        .iter()
        .map(|(name, array)| Field::new(name, array.data_type().clone(), array.null_count() > 0))
        .collect::<Vec<_>>();
    let arrays = columns.into_iter().map(|(_, array)| array).collect();
    Ok(RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays)?)
}

/// Rename columns, names not in `renames` are kept.
fn rename(batch: &RecordBatch, renames: &[(&str, &str)]) -> Result<RecordBatch> {
    let columns = batch
        .schema()
        .fields()
        .iter()
        .zip(batch.columns())
        .map(|(field, array)| {
            let name = renames
                .iter()
                .find(|(from, _)| from == field.name())
                .map(|(_, to)| to.to_string())
                .unwrap_or_else(|| field.name().clone());
            (name, array.clone())
        })
        .collect();
    assemble(columns)
}

fn drop_column(batch: &RecordBatch, name: &str) -> Result<RecordBatch> {
    let schema = batch.schema();
    let idx = schema.index_of(name)?;
    let keep = (0..batch.num_columns()).filter(|i| *i != idx).collect::<Vec<_>>();
    Ok(batch.project(&keep)?)
}

/// Reorder and cast `batch` to the columns of `schema`.
fn conform(batch: &RecordBatch, schema: &SchemaRef) -> Result<RecordBatch> {
    let columns = schema
        .fields()
        .iter()
        .map(|field| cast(column(batch, field.name())?, field.data_type()).map_err(Error::from))
        .collect::<Result<Vec<_>>>()?;
    Ok(RecordBatch::try_new(schema.clone(), columns)?)
}

/// Lalonde (1986) job training data.
///
/// Returns the experimental sample without its `data_id` column, and the
/// observational sample made of the experimental treated units stacked on
/// top of the PSID comparison group.
pub fn prepare_l86(nsw: &RecordBatch, psid: &RecordBatch) -> Result<(RecordBatch, RecordBatch)> {
    let nsw = drop_column(nsw, "data_id")?;
    let psid = rename(psid, &[("trt", "treat"), ("nodeg", "nodegree")])?;

    let treated = i64_values(&nsw, "treat")?
        .iter()
        .map(|t| Some(t == Some(1)))
        .collect::<BooleanArray>();
    let nsw_treated = filter_record_batch(&nsw, &treated)?;

    // Nullable union of both schemas, in the experimental column order.
    let schema = Arc::new(Schema::new(
        nsw.schema()
            .fields()
            .iter()
            .map(|f| f.as_ref().clone().with_nullable(true))
            .collect::<Vec<_>>(),
    ));
    let stacked = concat_batches(
        &schema,
        &[conform(&nsw_treated, &schema)?, conform(&psid, &schema)?],
    )?;

    debug!(
        experimental = nsw.num_rows(),
        observational = stacked.num_rows(),
        "Prepared l86"
    );
    Ok((nsw, stacked))
}

/// Abadie, Diamond and Hainmueller (2010) cigarette sales by state.
///
/// The leading index column is dropped and numeric state ids are replaced by
/// state names.
pub fn prepare_adh10(smoking: &RecordBatch) -> Result<RecordBatch> {
    if smoking.num_columns() == 0 {
        return Err(Error::invalid("smoking table has no columns"));
    }
    let keep = (1..smoking.num_columns()).collect::<Vec<_>>();
    let smoking = rename(&smoking.project(&keep)?, &[("cigsale", "cig_sales")])?;

    let names = i64_values(&smoking, "state")?
        .iter()
        .map(|id| match id {
            Some(id) if (1..=STATES.len() as i64).contains(&id) => {
                Ok(Some(STATES[id as usize - 1]))
            }
            Some(id) => Err(Error::invalid(format!("unknown state id {id}"))),
            None => Ok(None),
        })
        .collect::<Result<Vec<_>>>()?;
    let names: ArrayRef = Arc::new(StringArray::from(names));

    let columns = smoking
        .schema()
        .fields()
        .iter()
        .zip(smoking.columns())
        .map(|(field, array)| {
            let array = if field.name() == "state" {
                names.clone()
            } else {
                array.clone()
            };
            (field.name().clone(), array)
        })
        .collect();
    assemble(columns)
}

/// Lee (2008) close US House elections.
///
/// Keeps complete rows where both the lagged and the current democratic
/// vote share are strictly between 25% and 75%.
pub fn prepare_l08(elections: &RecordBatch) -> Result<RecordBatch> {
    let complete = drop_null_rows(elections)?;
    let lagged = f64_values(&complete, "lagdemvoteshare")?;
    let current = f64_values(&complete, "demvoteshare")?;
    let close = |v: f64| v > 0.25 && v < 0.75;
    let keep = lagged
        .values()
        .iter()
        .zip(current.values().iter())
        .map(|(l, c)| Some(close(*l) && close(*c)))
        .collect::<BooleanArray>();
    let result = filter_record_batch(&complete, &keep)?;
    debug!(
        rows = elections.num_rows(),
        kept = result.num_rows(),
        "Prepared l08"
    );
    Ok(result)
}

/// Card and Krueger (1994) fast food employment in New Jersey and
/// Pennsylvania.
///
/// The wide table of store surveys before and after the minimum wage
/// increase becomes a long table with one row per store and wave. Stores
/// keep the id of their row in the raw table. Waves are stacked, all
/// stores before the increase come first.
pub fn prepare_ck94(raw: &RecordBatch) -> Result<RecordBatch> {
    let ids: Vec<i64> = (0..raw.num_rows() as i64).collect();
    let with_id = {
        let mut columns = vec![(
            "id".to_string(),
            Arc::new(Int64Array::from(ids)) as ArrayRef,
        )];
        columns.extend(
            raw.schema()
                .fields()
                .iter()
                .zip(raw.columns())
                .map(|(f, a)| (f.name().clone(), a.clone())),
        );
        assemble(columns)?
    };
    let stores = drop_null_rows(&with_id)?;
    let n = stores.num_rows();

    let dummies = CHAINS
        .iter()
        .map(|c| i64_values(&stores, &format!("x_{c}")))
        .collect::<Result<Vec<_>>>()?;
    let chain = (0..n)
        .map(|i| {
            CHAINS
                .iter()
                .zip(&dummies)
                .find(|(_, d)| d.value(i) == 1)
                .map(|(c, _)| *c)
                .ok_or_else(|| Error::invalid(format!("store in row {i} has no chain")))
        })
        .collect::<Result<Vec<_>>>()?;
    let chain: ArrayRef = Arc::new(StringArray::from(chain));

    let id = column(&stores, "id")?.clone();
    let new_jersey = column(&stores, "d_nj")?.clone();
    let waves = [
        ("employment", "y_ft_employment"),
        ("hrsopen", "x_hrs_open_weekday"),
        ("wage", "x_st_wage"),
    ];

    let mut long = Vec::with_capacity(2);
    for (after, suffix) in [(0i64, "before"), (1, "after")] {
        let mut columns = vec![
            ("id".to_string(), id.clone()),
            (
                "after".to_string(),
                Arc::new(Int64Array::from(vec![after; n])) as ArrayRef,
            ),
            ("chain".to_string(), chain.clone()),
            ("new_jersey".to_string(), new_jersey.clone()),
        ];
        for (stub, source) in waves {
            let values = f64_values(&stores, &format!("{source}_{suffix}"))?;
            columns.push((stub.to_string(), Arc::new(values) as ArrayRef));
        }
        long.push(assemble(columns)?);
    }

    let schema = long[0].schema();
    let result = concat_batches(&schema, &long)?;
    debug!(stores = n, rows = result.num_rows(), "Prepared ck94");
    Ok(result)
}
