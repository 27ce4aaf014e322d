// Copyright 2022 CeresDB Project Authors. Licensed under Apache-2.0.

//! Typed columns used while a table is being generated

use std::sync::Arc;

use arrow::{
    array::{
        Array, ArrayRef, BooleanArray, Float32Array, Float64Array, Int32Array, Int64Array,
        StringArray,
    },
    datatypes::DataType,
};

use crate::errors::{Error, Result};

/// Whether an analyst gets to see the column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Observed,
    /// Ground truth, only kept when generating with `oracle` set.
    Oracle,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    Float64(Vec<f64>),
    Int64(Vec<i64>),
    Boolean(Vec<bool>),
    Utf8(Vec<String>),
}

impl ColumnData {
    pub fn len(&self) -> usize {
        match self {
            ColumnData::Float64(v) => v.len(),
            ColumnData::Int64(v) => v.len(),
            ColumnData::Boolean(v) => v.len(),
            ColumnData::Utf8(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn data_type(&self) -> DataType {
        match self {
            ColumnData::Float64(_) => DataType::Float64,
            ColumnData::Int64(_) => DataType::Int64,
            ColumnData::Boolean(_) => DataType::Boolean,
            ColumnData::Utf8(_) => DataType::Utf8,
        }
    }

    /// Numeric view of the column, `None` for strings.
    pub fn to_f64(&self) -> Option<Vec<f64>> {
        match self {
            ColumnData::Float64(v) => Some(v.clone()),
            ColumnData::Int64(v) => Some(v.iter().map(|x| *x as f64).collect()),
            ColumnData::Boolean(v) => Some(v.iter().map(|x| if *x { 1.0 } else { 0.0 }).collect()),
            ColumnData::Utf8(_) => None,
        }
    }

    /// Round every float to `decimals` places, other types are untouched.
    pub fn round(&mut self, decimals: i32) {
        if let ColumnData::Float64(v) = self {
            for x in v.iter_mut() {
                *x = crate::util::round_to(*x, decimals);
            }
        }
    }

    /// Keep the values whose flag in `keep` is set.
    pub fn retain(&mut self, keep: &[bool]) {
        fn retain_vec<T>(v: &mut Vec<T>, keep: &[bool]) {
            let mut flags = keep.iter();
            v.retain(|_| flags.next().copied().unwrap_or(false));
        }
        match self {
            ColumnData::Float64(v) => retain_vec(v, keep),
            ColumnData::Int64(v) => retain_vec(v, keep),
            ColumnData::Boolean(v) => retain_vec(v, keep),
            ColumnData::Utf8(v) => retain_vec(v, keep),
        }
    }

    /// Copy a non-null arrow array.
    pub fn try_from_array(name: &str, array: &ArrayRef) -> Result<Self> {
        if array.null_count() > 0 {
            return Err(Error::InvalidParameter(format!("column {name} contains nulls")));
        }
        let any = array.as_any();
        let data = if let Some(a) = any.downcast_ref::<Float64Array>() {
            ColumnData::Float64(a.values().to_vec())
        } else if let Some(a) = any.downcast_ref::<Float32Array>() {
            ColumnData::Float64(a.values().iter().map(|v| *v as f64).collect())
        } else if let Some(a) = any.downcast_ref::<Int64Array>() {
            ColumnData::Int64(a.values().to_vec())
        } else if let Some(a) = any.downcast_ref::<Int32Array>() {
            ColumnData::Int64(a.values().iter().map(|v| *v as i64).collect())
        } else if let Some(a) = any.downcast_ref::<BooleanArray>() {
            ColumnData::Boolean((0..a.len()).map(|i| a.value(i)).collect())
        } else if let Some(a) = any.downcast_ref::<StringArray>() {
            ColumnData::Utf8((0..a.len()).map(|i| a.value(i).to_string()).collect())
        } else {
            return Err(Error::ColumnType {
                name: name.to_string(),
                expected: "Boolean, Int, Float or Utf8".to_string(),
                actual: array.data_type().to_string(),
            });
        };
        Ok(data)
    }

    pub fn into_array(self) -> ArrayRef {
        match self {
            ColumnData::Float64(v) => Arc::new(Float64Array::from(v)),
            ColumnData::Int64(v) => Arc::new(Int64Array::from(v)),
            ColumnData::Boolean(v) => Arc::new(BooleanArray::from(v)),
            ColumnData::Utf8(v) => Arc::new(StringArray::from(v)),
        }
    }
}

impl From<Vec<f64>> for ColumnData {
    fn from(v: Vec<f64>) -> Self {
        ColumnData::Float64(v)
    }
}

impl From<Vec<i64>> for ColumnData {
    fn from(v: Vec<i64>) -> Self {
        ColumnData::Int64(v)
    }
}

impl From<Vec<bool>> for ColumnData {
    fn from(v: Vec<bool>) -> Self {
        ColumnData::Boolean(v)
    }
}

impl From<Vec<String>> for ColumnData {
    fn from(v: Vec<String>) -> Self {
        ColumnData::Utf8(v)
    }
}

/// A named column waiting to be assembled into a table.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub data: ColumnData,
    pub visibility: Visibility,
}

impl Column {
    pub fn observed(name: impl Into<String>, data: impl Into<ColumnData>) -> Self {
        Self {
            name: name.into(),
            data: data.into(),
            visibility: Visibility::Observed,
        }
    }

    pub fn oracle(name: impl Into<String>, data: impl Into<ColumnData>) -> Self {
        Self {
            name: name.into(),
            data: data.into(),
            visibility: Visibility::Oracle,
        }
    }
}

#[cfg(test)]
mod test {
    use std::sync::Arc;

    use arrow::array::{ArrayRef, Float64Array, Int32Array};

    use super::ColumnData;

    #[test]
    fn test_from_array() {
        let ints: ArrayRef = Arc::new(Int32Array::from(vec![1, 2, 3]));
        let data = ColumnData::try_from_array("a", &ints).unwrap();
        assert_eq!(ColumnData::Int64(vec![1, 2, 3]), data);

        let nulls: ArrayRef = Arc::new(Float64Array::from(vec![Some(1.0), None]));
        assert!(ColumnData::try_from_array("b", &nulls).is_err());
    }

    #[test]
    fn test_retain_and_round() {
        let mut data = ColumnData::Float64(vec![1.234, 2.345, 3.456]);
        data.retain(&[true, false, true]);
        data.round(1);
        assert_eq!(ColumnData::Float64(vec![1.2, 3.5]), data);
        assert_eq!(Some(vec![1.2, 3.5]), data.to_f64());
    }
}
