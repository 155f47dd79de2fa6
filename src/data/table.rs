//! Loosely typed in-memory table
//!
//! Each column declares a [`Dtype`], but cells are dynamically typed. Object
//! columns may mix values freely, which is why type inference for this
//! backend has to look at the values themselves.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

use super::{DataSource, InferredType};
use crate::{Result, VlspecError};

/// A single dynamically typed value
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    /// Missing value (null, not-a-time or NA depending on the column)
    Null,
    Bool(bool),
    Int(i64),
    /// Unsigned integers that may not fit an `i64`
    UInt(u64),
    Float(f64),
    Str(String),
    Bytes(Vec<u8>),
    Date(NaiveDate),
    Time(NaiveTime),
    DateTime(NaiveDateTime),
    DateTimeTz(DateTime<FixedOffset>),
    Duration(TimeDelta),
    /// Array-valued cell
    Array(Vec<Cell>),
    /// Mapping-valued cell
    Object(BTreeMap<String, Cell>),
    /// A GeoJSON geometry
    Geometry(Value),
}

impl Cell {
    pub fn is_null(&self) -> bool {
        matches!(self, Cell::Null)
    }
}

impl From<bool> for Cell {
    fn from(v: bool) -> Self {
        Cell::Bool(v)
    }
}

impl From<i64> for Cell {
    fn from(v: i64) -> Self {
        Cell::Int(v)
    }
}

impl From<i32> for Cell {
    fn from(v: i32) -> Self {
        Cell::Int(i64::from(v))
    }
}

impl From<u64> for Cell {
    fn from(v: u64) -> Self {
        Cell::UInt(v)
    }
}

impl From<f64> for Cell {
    fn from(v: f64) -> Self {
        Cell::Float(v)
    }
}

impl From<&str> for Cell {
    fn from(v: &str) -> Self {
        Cell::Str(v.to_string())
    }
}

impl From<String> for Cell {
    fn from(v: String) -> Self {
        Cell::Str(v)
    }
}

impl From<NaiveDate> for Cell {
    fn from(v: NaiveDate) -> Self {
        Cell::Date(v)
    }
}

impl From<NaiveDateTime> for Cell {
    fn from(v: NaiveDateTime) -> Self {
        Cell::DateTime(v)
    }
}

impl From<DateTime<FixedOffset>> for Cell {
    fn from(v: DateTime<FixedOffset>) -> Self {
        Cell::DateTimeTz(v)
    }
}

impl From<TimeDelta> for Cell {
    fn from(v: TimeDelta) -> Self {
        Cell::Duration(v)
    }
}

impl<T: Into<Cell>> From<Option<T>> for Cell {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Cell::Null)
    }
}

/// Declared column dtype
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dtype {
    /// Categorical values; `ordered` marks an explicit category order
    Categorical {
        categories: Vec<String>,
        ordered: bool,
    },
    /// Dedicated string dtype
    String,
    /// Plain boolean without missing values
    Bool,
    /// Boolean allowing missing values
    NullableBool,
    /// Timestamps, naive or timezone-aware
    Datetime,
    /// Elapsed time
    Duration,
    /// GeoJSON geometries
    Geometry,
    /// Fixed-width integer allowing missing values
    NullableInt,
    /// Fixed-width float allowing missing values
    NullableFloat,
    /// Plain fixed-width integer
    Int,
    /// Plain floating point
    Float,
    /// Anything goes
    Object,
}

impl Dtype {
    pub fn categorical(categories: &[&str]) -> Self {
        Dtype::Categorical {
            categories: categories.iter().map(|c| c.to_string()).collect(),
            ordered: false,
        }
    }

    pub fn ordered_categorical(categories: &[&str]) -> Self {
        Dtype::Categorical {
            categories: categories.iter().map(|c| c.to_string()).collect(),
            ordered: true,
        }
    }
}

impl fmt::Display for Dtype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Dtype::Categorical { ordered: true, .. } => "ordered categorical",
            Dtype::Categorical { .. } => "categorical",
            Dtype::String => "string",
            Dtype::Bool => "bool",
            Dtype::NullableBool => "nullable bool",
            Dtype::Datetime => "datetime",
            Dtype::Duration => "duration",
            Dtype::Geometry => "geometry",
            Dtype::NullableInt => "nullable int",
            Dtype::NullableFloat => "nullable float",
            Dtype::Int => "int",
            Dtype::Float => "float",
            Dtype::Object => "object",
        };
        write!(f, "{}", name)
    }
}

/// A named column of cells
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    name: String,
    dtype: Dtype,
    values: Vec<Cell>,
}

impl Column {
    pub fn new(name: impl Into<String>, dtype: Dtype, values: Vec<Cell>) -> Self {
        Self {
            name: name.into(),
            dtype,
            values,
        }
    }

    /// Object column; the dtype carries no information about the values
    pub fn object(name: impl Into<String>, values: Vec<Cell>) -> Self {
        Self::new(name, Dtype::Object, values)
    }

    pub fn ints(name: impl Into<String>, values: &[i64]) -> Self {
        Self::new(name, Dtype::Int, values.iter().map(|v| Cell::Int(*v)).collect())
    }

    pub fn floats(name: impl Into<String>, values: &[f64]) -> Self {
        Self::new(name, Dtype::Float, values.iter().map(|v| Cell::Float(*v)).collect())
    }

    pub fn strings(name: impl Into<String>, values: &[&str]) -> Self {
        Self::new(name, Dtype::String, values.iter().map(|v| Cell::from(*v)).collect())
    }

    pub fn bools(name: impl Into<String>, values: &[bool]) -> Self {
        Self::new(name, Dtype::Bool, values.iter().map(|v| Cell::Bool(*v)).collect())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dtype(&self) -> &Dtype {
        &self.dtype
    }

    pub fn values(&self) -> &[Cell] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// A table of equally long columns
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<Column>,
}

impl Table {
    /// Build a table, checking that all columns have the same length
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        if let Some(first) = columns.first() {
            for column in &columns[1..] {
                if column.len() != first.len() {
                    return Err(VlspecError::DataError(format!(
                        "Column '{}' has {} rows but column '{}' has {}",
                        column.name(),
                        column.len(),
                        first.name(),
                        first.len()
                    )));
                }
            }
        }
        Ok(Self { columns })
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name() == name)
    }

    pub fn height(&self) -> usize {
        self.columns.first().map(Column::len).unwrap_or(0)
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }
}

impl DataSource for Table {
    fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name().to_string()).collect()
    }

    fn num_rows(&self) -> usize {
        self.height()
    }

    fn infer_type(&self, column: &str) -> Result<Option<InferredType>> {
        Ok(self.column(column).map(super::infer::infer_table_column))
    }

    fn to_records(&self) -> Result<Vec<Value>> {
        Ok(super::sanitize::sanitize_table(self)?.to_records())
    }
}
