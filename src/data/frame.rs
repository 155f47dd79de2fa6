//! Polars DataFrame support
//!
//! Polars columns are strongly typed, so inference maps dtypes directly and
//! treats an unmapped dtype as an error. Sanitization rewrites temporal
//! columns into ISO strings column by column, then rows are read out as JSON.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, Utc};
use chrono_tz::Tz;
use polars::prelude::*;
use serde_json::{json, Map, Value};

use super::sanitize::{float_to_json, format_date_as_datetime, format_naive_datetime};
use super::{DataSource, InferredType};
use crate::shorthand::FieldType;
use crate::{Result, VlspecError};

impl DataSource for DataFrame {
    fn column_names(&self) -> Vec<String> {
        self.get_column_names()
            .iter()
            .map(|name| name.to_string())
            .collect()
    }

    fn num_rows(&self) -> usize {
        self.height()
    }

    fn infer_type(&self, column: &str) -> Result<Option<InferredType>> {
        match self.column(column) {
            Ok(col) => infer_frame_column(col).map(Some),
            Err(_) => Ok(None),
        }
    }

    fn to_records(&self) -> Result<Vec<Value>> {
        frame_to_records(&sanitize_frame(self)?)
    }
}

/// Infer the encoding type of a Polars column
///
/// Enum columns are ordinal and carry their full declared category list as
/// the sort order, whether or not every category occurs.
///
/// # Errors
/// Returns `VlspecError::InferenceError` for dtypes with no encoding type
/// (durations, times, nested types, ...).
pub fn infer_frame_column(column: &Column) -> Result<InferredType> {
    let dtype = column.dtype();
    match dtype {
        DataType::Enum(fcats, _) => {
            let categories: Vec<String> = fcats
                .categories()
                .values_iter()
                .map(|category| category.to_string())
                .collect();
            if categories.is_empty() {
                Ok(FieldType::Nominal.into())
            } else {
                Ok(InferredType::ordinal(categories))
            }
        }
        DataType::String | DataType::Categorical(..) | DataType::Boolean => {
            Ok(FieldType::Nominal.into())
        }
        dt if dt.is_numeric() => Ok(FieldType::Quantitative.into()),
        DataType::Datetime(_, _) | DataType::Date => Ok(FieldType::Temporal.into()),
        other => Err(VlspecError::InferenceError(format!(
            "Unexpected dtype for column '{}': {}",
            column.name(),
            other
        ))),
    }
}

// =============================================================================
// Sanitization
// =============================================================================

/// Sanitize a DataFrame for JSON serialization
///
/// Dates and datetimes become ISO strings with a time component, times become
/// `HH:MM:SS` strings; all other columns are kept as-is. Nulls stay null.
///
/// # Errors
/// Returns `VlspecError::SanitizeError` naming the field for duration columns.
pub fn sanitize_frame(df: &DataFrame) -> Result<DataFrame> {
    let mut columns: Vec<Column> = Vec::with_capacity(df.width());

    for column in df.get_columns() {
        let series = column.as_materialized_series();
        let sanitized = match column.dtype() {
            DataType::Date => {
                let ca = series.date().map_err(|e| {
                    VlspecError::DataError(format!("Failed to cast to date: {}", e))
                })?;
                let strings = ca
                    .phys
                    .into_iter()
                    .map(|days| days.map(days_to_date).transpose())
                    .map(|date| date.map(|d| d.map(|d| format_date_as_datetime(&d))))
                    .collect::<Result<Vec<Option<String>>>>()?;
                Series::new(column.name().clone(), strings)
            }
            DataType::Datetime(time_unit, time_zone) => {
                let tz_name = time_zone.as_ref().map(|tz| tz.to_string());
                let ca = series.datetime().map_err(|e| {
                    VlspecError::DataError(format!("Failed to cast to datetime: {}", e))
                })?;
                let strings = ca
                    .phys
                    .into_iter()
                    .map(|ts| {
                        ts.map(|ts| format_timestamp(ts, *time_unit, tz_name.as_deref()))
                            .transpose()
                    })
                    .collect::<Result<Vec<Option<String>>>>()?;
                Series::new(column.name().clone(), strings)
            }
            DataType::Time => {
                let ca = series.time().map_err(|e| {
                    VlspecError::DataError(format!("Failed to cast to time: {}", e))
                })?;
                let strings = ca
                    .phys
                    .into_iter()
                    .map(|nanos| nanos.map(format_time).transpose())
                    .collect::<Result<Vec<Option<String>>>>()?;
                Series::new(column.name().clone(), strings)
            }
            DataType::Duration(_) => {
                return Err(VlspecError::SanitizeError(format!(
                    "Field \"{}\" has type \"{}\" which is not supported. Please convert to \
                     either a timestamp or a numerical value.",
                    column.name(),
                    column.dtype()
                )));
            }
            _ => {
                columns.push(column.clone());
                continue;
            }
        };
        tracing::debug!(column = %column.name(), dtype = %column.dtype(), "formatted temporal column");
        columns.push(sanitized.into());
    }

    DataFrame::new(columns).map_err(|e| {
        VlspecError::DataError(format!("Failed to create sanitized DataFrame: {}", e))
    })
}

fn days_to_date(days: i32) -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(1970, 1, 1)
        .and_then(|epoch| epoch.checked_add_signed(chrono::Duration::days(i64::from(days))))
        .ok_or_else(|| VlspecError::DataError(format!("Date out of range: {} days", days)))
}

/// Format a timestamp as local wall-clock time in its timezone
///
/// Naive timestamps are formatted as they are. Timezone-aware timestamps are
/// converted to the wall-clock time of their zone, which may be an IANA name
/// or a fixed offset such as `+01:00`.
pub fn format_timestamp(value: i64, unit: TimeUnit, time_zone: Option<&str>) -> Result<String> {
    let (secs, nanos) = match unit {
        TimeUnit::Nanoseconds => (value.div_euclid(1_000_000_000), value.rem_euclid(1_000_000_000)),
        TimeUnit::Microseconds => (
            value.div_euclid(1_000_000),
            value.rem_euclid(1_000_000) * 1_000,
        ),
        TimeUnit::Milliseconds => (
            value.div_euclid(1_000),
            value.rem_euclid(1_000) * 1_000_000,
        ),
    };
    let nanos = u32::try_from(nanos)
        .map_err(|_| VlspecError::InternalError(format!("Invalid sub-second part: {}", nanos)))?;
    let utc = DateTime::<Utc>::from_timestamp(secs, nanos)
        .ok_or_else(|| VlspecError::DataError(format!("Timestamp out of range: {}", value)))?;

    let local = match time_zone {
        None => utc.naive_utc(),
        Some(name) => {
            if let Ok(tz) = name.parse::<Tz>() {
                utc.with_timezone(&tz).naive_local()
            } else if let Ok(offset) = name.parse::<FixedOffset>() {
                utc.with_timezone(&offset).naive_local()
            } else {
                return Err(VlspecError::DataError(format!(
                    "Unknown time zone '{}'",
                    name
                )));
            }
        }
    };
    Ok(format_naive_datetime(&local))
}

fn format_time(nanos: i64) -> Result<String> {
    let secs = u32::try_from(nanos.div_euclid(1_000_000_000)).ok();
    let frac = u32::try_from(nanos.rem_euclid(1_000_000_000)).ok();
    secs.zip(frac)
        .and_then(|(secs, frac)| NaiveTime::from_num_seconds_from_midnight_opt(secs, frac))
        .map(|t| t.format("%H:%M:%S%.f").to_string())
        .ok_or_else(|| VlspecError::DataError(format!("Time out of range: {} ns", nanos)))
}

// =============================================================================
// Row conversion
// =============================================================================

/// Convert a (sanitized) DataFrame to row objects
pub fn frame_to_records(df: &DataFrame) -> Result<Vec<Value>> {
    let columns = df
        .get_columns()
        .iter()
        .map(|column| {
            Ok((
                column.name().to_string(),
                series_values(column.as_materialized_series())?,
            ))
        })
        .collect::<Result<Vec<(String, Vec<Value>)>>>()?;

    let values = (0..df.height())
        .map(|row_idx| {
            let mut row_obj = Map::new();
            for (name, values) in &columns {
                row_obj.insert(name.clone(), values[row_idx].clone());
            }
            Value::Object(row_obj)
        })
        .collect();

    Ok(values)
}

/// Convert a whole series to JSON values
pub fn series_values(series: &Series) -> Result<Vec<Value>> {
    use DataType::*;

    let cast_err = |target: &str, e: PolarsError| {
        VlspecError::DataError(format!("Failed to cast to {}: {}", target, e))
    };

    match series.dtype() {
        Int8 | Int16 | Int32 | Int64 | UInt8 | UInt16 | UInt32 => {
            let cast = series.cast(&Int64).map_err(|e| cast_err("i64", e))?;
            let ca = cast.i64().map_err(|e| cast_err("i64", e))?;
            Ok(ca.into_iter().map(|v| v.map(Value::from).unwrap_or(Value::Null)).collect())
        }
        UInt64 => {
            let ca = series.u64().map_err(|e| cast_err("u64", e))?;
            Ok(ca.into_iter().map(|v| v.map(Value::from).unwrap_or(Value::Null)).collect())
        }
        Float32 | Float64 => {
            let cast = series.cast(&Float64).map_err(|e| cast_err("f64", e))?;
            let ca = cast.f64().map_err(|e| cast_err("f64", e))?;
            Ok(ca.into_iter().map(|v| v.map(float_to_json).unwrap_or(Value::Null)).collect())
        }
        Boolean => {
            let ca = series.bool().map_err(|e| cast_err("bool", e))?;
            Ok(ca.into_iter().map(|v| v.map(Value::Bool).unwrap_or(Value::Null)).collect())
        }
        String => {
            let ca = series.str().map_err(|e| cast_err("string", e))?;
            Ok(ca.into_iter().map(|v| v.map(|s| json!(s)).unwrap_or(Value::Null)).collect())
        }
        Categorical(..) | Enum(..) => {
            let cast = series.cast(&String).map_err(|e| cast_err("string", e))?;
            series_values(&cast)
        }
        Null => Ok(vec![Value::Null; series.len()]),
        List(_) => {
            let ca = series.list().map_err(|e| cast_err("list", e))?;
            ca.into_iter()
                .map(|inner| match inner {
                    Some(inner) => Ok(Value::Array(series_values(&inner)?)),
                    None => Ok(Value::Null),
                })
                .collect()
        }
        _ => {
            // Fallback: convert to string
            (0..series.len())
                .map(|idx| {
                    let value = series
                        .get(idx)
                        .map_err(|e| VlspecError::DataError(format!("Failed to read value: {}", e)))?;
                    Ok(if value.is_null() {
                        Value::Null
                    } else {
                        json!(value.to_string())
                    })
                })
                .collect()
        }
    }
}
