//! Data source abstraction for chart data
//!
//! Two tabular backends are supported:
//! - [`Table`] - a loosely typed in-memory table whose columns declare a
//!   [`Dtype`] and hold dynamically typed [`Cell`]s
//! - [`DataFrame`] - a strongly typed Polars frame
//!
//! Both implement [`DataSource`], which provides field type inference and
//! conversion into JSON-safe row values. Inference differs on purpose: the
//! table backend sniffs values and falls back to nominal with a warning,
//! while the Polars backend rejects dtypes it has no mapping for.
//!
//! Inline `{"values": [...]}` objects and geo-interface objects are also
//! accepted by [`to_values`] and [`limit_rows`] through [`Data`].

pub mod frame;
pub mod geo;
pub mod infer;
pub mod sanitize;
pub mod table;

pub use frame::{frame_to_records, sanitize_frame};
pub use geo::sanitize_geo_interface;
pub use infer::{infer_dtype, infer_table_column, InferredKind};
pub use sanitize::{sanitize_table, JsonTable};
pub use table::{Cell, Column, Dtype, Table};

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::shorthand::FieldType;
use crate::{DataFrame, Result, VlspecError};

/// A field type inferred from a column of data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InferredType {
    pub field_type: FieldType,
    /// Category order for explicitly ordered categorical columns
    pub categories: Option<Vec<String>>,
}

impl InferredType {
    pub fn new(field_type: FieldType) -> Self {
        Self {
            field_type,
            categories: None,
        }
    }

    pub fn ordinal(categories: Vec<String>) -> Self {
        Self {
            field_type: FieldType::Ordinal,
            categories: Some(categories),
        }
    }
}

impl From<FieldType> for InferredType {
    fn from(field_type: FieldType) -> Self {
        Self::new(field_type)
    }
}

/// Tabular data that can back a chart
pub trait DataSource {
    /// Column names in order
    fn column_names(&self) -> Vec<String>;

    /// Number of rows
    fn num_rows(&self) -> usize;

    /// Infer the encoding type of a column
    ///
    /// Returns `Ok(None)` when the column does not exist.
    fn infer_type(&self, column: &str) -> Result<Option<InferredType>>;

    /// Sanitize the data and convert it to row objects
    fn to_records(&self) -> Result<Vec<Value>>;

    fn has_column(&self, column: &str) -> bool {
        self.column_names().iter().any(|name| name == column)
    }
}

/// Data accepted for embedding in a specification
#[derive(Debug, Clone, Copy)]
pub enum Data<'a> {
    Table(&'a Table),
    Frame(&'a DataFrame),
    /// An inline data object that must carry a `values` key
    Inline(&'a Value),
    /// An object following the geo interface (GeoJSON)
    Geo(&'a Value),
}

impl<'a> Data<'a> {
    /// The tabular source behind this data, if any
    pub fn source(&self) -> Option<&'a dyn DataSource> {
        match *self {
            Data::Table(table) => Some(table),
            Data::Frame(df) => Some(df),
            Data::Inline(_) | Data::Geo(_) => None,
        }
    }
}

/// Embedding options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataOptions {
    /// Maximum number of rows allowed inline; `None` disables the check
    pub max_rows: Option<usize>,
}

impl Default for DataOptions {
    fn default() -> Self {
        Self {
            max_rows: Some(5000),
        }
    }
}

/// Replace data by an inline data object with JSON-safe values
pub fn to_values(data: &Data<'_>) -> Result<Value> {
    match data {
        Data::Table(table) => Ok(json!({ "values": table.to_records()? })),
        Data::Frame(df) => Ok(json!({ "values": df.to_records()? })),
        Data::Geo(geo) => Ok(json!({ "values": sanitize_geo_interface(geo)? })),
        Data::Inline(value) => {
            if value.get("values").is_none() {
                return Err(VlspecError::DataError(
                    "values expected in data dict, but not present.".to_string(),
                ));
            }
            Ok((*value).clone())
        }
    }
}

/// Fail when the data has more rows than `max_rows`
pub fn limit_rows(data: &Data<'_>, max_rows: Option<usize>) -> Result<()> {
    let Some(max_rows) = max_rows else {
        return Ok(());
    };

    let n = match data {
        Data::Table(table) => DataSource::num_rows(*table),
        Data::Frame(df) => DataSource::num_rows(*df),
        Data::Inline(value) => match value.get("values") {
            Some(Value::Array(values)) => values.len(),
            _ => return Ok(()),
        },
        Data::Geo(geo) => match (geo.get("type"), geo.get("features")) {
            (Some(Value::String(t)), Some(Value::Array(features))) if t == "FeatureCollection" => {
                features.len()
            }
            _ => 1,
        },
    };

    if n > max_rows {
        return Err(VlspecError::MaxRowsError(format!(
            "The number of rows in your dataset ({}) is greater than the maximum allowed ({}).\n\n\
             Aggregate or filter the data before embedding it, or raise `max_rows`.",
            n, max_rows
        )));
    }
    Ok(())
}

/// Check the row limit and convert to an inline data object
pub fn embed(data: &Data<'_>, options: &DataOptions) -> Result<Value> {
    limit_rows(data, options.max_rows)?;
    to_values(data)
}
