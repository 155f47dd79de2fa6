//! JSON sanitization for loosely typed tables
//!
//! Every column is rewritten into JSON-native values according to its
//! declared dtype. The input table is never modified.
//!
//! Datetimes become full ISO-8601 strings with a time component. Date-only
//! strings are parsed as UTC by JavaScript while full timestamps are parsed
//! as local time, and Vega-Lite displays local time by default.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};
use serde_json::{Map, Number, Value};
use std::collections::HashSet;

use super::table::{Cell, Column, Dtype, Table};
use crate::{Result, VlspecError};

const DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// A table whose cells are all JSON-native values
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JsonTable {
    columns: Vec<(String, Vec<Value>)>,
}

impl JsonTable {
    pub fn height(&self) -> usize {
        self.columns.first().map(|(_, v)| v.len()).unwrap_or(0)
    }

    /// Row-oriented records, one object per row
    pub fn to_records(&self) -> Vec<Value> {
        (0..self.height())
            .map(|row_idx| {
                let mut row_obj = Map::new();
                for (name, values) in &self.columns {
                    row_obj.insert(name.clone(), values[row_idx].clone());
                }
                Value::Object(row_obj)
            })
            .collect()
    }
}

/// Sanitize a table for JSON serialization
///
/// # Errors
/// Returns `VlspecError::SanitizeError` for duration columns and for empty or
/// duplicate column names.
pub fn sanitize_table(table: &Table) -> Result<JsonTable> {
    let mut seen = HashSet::new();
    for column in table.columns() {
        if column.name().is_empty() {
            return Err(VlspecError::SanitizeError(
                "Dataframe contains invalid column name: ''. Column names must be non-empty strings"
                    .to_string(),
            ));
        }
        if !seen.insert(column.name()) {
            return Err(VlspecError::SanitizeError(format!(
                "Dataframe contains duplicate column name: '{}'",
                column.name()
            )));
        }
    }

    let columns = table
        .columns()
        .iter()
        .map(|column| Ok((column.name().to_string(), sanitize_column(column)?)))
        .collect::<Result<Vec<_>>>()?;

    Ok(JsonTable { columns })
}

/// Rewrite a single column according to its dtype
fn sanitize_column(column: &Column) -> Result<Vec<Value>> {
    let dtype = column.dtype();
    tracing::debug!(column = column.name(), %dtype, "sanitizing column");

    let values: Result<Vec<Value>> = match dtype {
        Dtype::Duration => {
            return Err(VlspecError::SanitizeError(format!(
                "Field \"{}\" has type \"{}\" which is not supported. Please convert to \
                 either a timestamp or a numerical value.",
                column.name(),
                dtype
            )))
        }
        Dtype::Datetime => column.values().iter().map(datetime_cell).collect(),
        Dtype::Geometry => column
            .values()
            .iter()
            .map(|cell| match cell {
                Cell::Geometry(geometry) => Ok(geometry.clone()),
                other => cell_to_json(other),
            })
            .collect(),
        // Categories decode to their values; every other dtype only needs its
        // values boxed as plain JSON with missing markers turned into null.
        Dtype::Categorical { .. }
        | Dtype::String
        | Dtype::Bool
        | Dtype::NullableBool
        | Dtype::NullableInt
        | Dtype::NullableFloat
        | Dtype::Int
        | Dtype::Float
        | Dtype::Object => column.values().iter().map(cell_to_json).collect(),
    };

    values.map_err(|e| match e {
        VlspecError::SanitizeError(msg) => {
            VlspecError::SanitizeError(format!("Field \"{}\" {}", column.name(), msg))
        }
        other => other,
    })
}

/// Datetime column cell: ISO string with time, not-a-time as empty string
fn datetime_cell(cell: &Cell) -> Result<Value> {
    match cell {
        Cell::Null => Ok(Value::String(String::new())),
        Cell::DateTime(dt) => Ok(Value::String(format_naive_datetime(dt))),
        Cell::DateTimeTz(dt) => Ok(Value::String(format_datetime_tz(dt))),
        Cell::Date(date) => Ok(Value::String(format_date_as_datetime(date))),
        other => cell_to_json(other),
    }
}

pub(crate) fn format_naive_datetime(dt: &NaiveDateTime) -> String {
    dt.format(DATETIME_FORMAT).to_string()
}

fn format_datetime_tz(dt: &DateTime<FixedOffset>) -> String {
    dt.format("%Y-%m-%dT%H:%M:%S%.f%:z").to_string()
}

pub(crate) fn format_date_as_datetime(date: &NaiveDate) -> String {
    date.format("%Y-%m-%dT00:00:00").to_string()
}

/// JSON number for a float, with NaN and infinities as null
pub(crate) fn float_to_json(v: f64) -> Value {
    Number::from_f64(v).map(Value::Number).unwrap_or(Value::Null)
}

/// Convert any cell into its plain JSON equivalent
///
/// Arrays and mappings are converted recursively. Durations inside object
/// columns become milliseconds. Bytes must be valid UTF-8.
pub fn cell_to_json(cell: &Cell) -> Result<Value> {
    let value = match cell {
        Cell::Null => Value::Null,
        Cell::Bool(b) => Value::Bool(*b),
        Cell::Int(i) => Value::from(*i),
        Cell::UInt(u) => Value::from(*u),
        Cell::Float(f) => float_to_json(*f),
        Cell::Str(s) => Value::String(s.clone()),
        Cell::Bytes(b) => match std::str::from_utf8(b) {
            Ok(s) => Value::String(s.to_string()),
            Err(e) => {
                return Err(VlspecError::SanitizeError(format!(
                    "holds bytes that are not valid UTF-8 (valid up to byte {})",
                    e.valid_up_to()
                )))
            }
        },
        Cell::Date(date) => Value::String(date.format("%Y-%m-%d").to_string()),
        Cell::Time(time) => Value::String(time.format("%H:%M:%S%.f").to_string()),
        Cell::DateTime(dt) => Value::String(format_naive_datetime(dt)),
        Cell::DateTimeTz(dt) => Value::String(format_datetime_tz(dt)),
        Cell::Duration(delta) => Value::from(delta.num_milliseconds()),
        Cell::Array(items) => {
            Value::Array(items.iter().map(cell_to_json).collect::<Result<Vec<_>>>()?)
        }
        Cell::Object(entries) => Value::Object(
            entries
                .iter()
                .map(|(k, v)| Ok((k.clone(), cell_to_json(v)?)))
                .collect::<Result<Map<String, Value>>>()?,
        ),
        Cell::Geometry(geometry) => geometry.clone(),
    };
    Ok(value)
}
