//! Field type inference for loosely typed table columns
//!
//! The column's value kind is determined from its declared dtype, or for
//! object columns by inspecting every value (missing values included). The
//! kind then maps onto an encoding type. Kinds without a mapping default to
//! nominal with a warning so chart construction can always proceed.

use std::fmt;

use super::table::{Cell, Column, Dtype};
use super::InferredType;
use crate::shorthand::FieldType;

/// Kind of values held by a column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InferredKind {
    Empty,
    Integer,
    Floating,
    MixedInteger,
    MixedIntegerFloat,
    String,
    Bytes,
    Categorical,
    Boolean,
    Datetime,
    Date,
    Time,
    Timedelta,
    Mixed,
    Geometry,
}

impl InferredKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            InferredKind::Empty => "empty",
            InferredKind::Integer => "integer",
            InferredKind::Floating => "floating",
            InferredKind::MixedInteger => "mixed-integer",
            InferredKind::MixedIntegerFloat => "mixed-integer-float",
            InferredKind::String => "string",
            InferredKind::Bytes => "bytes",
            InferredKind::Categorical => "categorical",
            InferredKind::Boolean => "boolean",
            InferredKind::Datetime => "datetime",
            InferredKind::Date => "date",
            InferredKind::Time => "time",
            InferredKind::Timedelta => "timedelta",
            InferredKind::Mixed => "mixed",
            InferredKind::Geometry => "geometry",
        }
    }

    /// Encoding type for this kind, if it has one
    fn field_type(&self) -> Option<FieldType> {
        use InferredKind::*;
        match self {
            Floating | MixedIntegerFloat | Integer | MixedInteger => Some(FieldType::Quantitative),
            String | Bytes | Categorical | Boolean | Mixed => Some(FieldType::Nominal),
            Datetime | Timedelta | Date | Time => Some(FieldType::Temporal),
            Empty | Geometry => None,
        }
    }
}

impl fmt::Display for InferredKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Kind of a single non-missing value
fn cell_kind(cell: &Cell) -> Option<InferredKind> {
    match cell {
        Cell::Null => None,
        Cell::Bool(_) => Some(InferredKind::Boolean),
        Cell::Int(_) | Cell::UInt(_) => Some(InferredKind::Integer),
        Cell::Float(_) => Some(InferredKind::Floating),
        Cell::Str(_) => Some(InferredKind::String),
        Cell::Bytes(_) => Some(InferredKind::Bytes),
        Cell::Date(_) => Some(InferredKind::Date),
        Cell::Time(_) => Some(InferredKind::Time),
        Cell::DateTime(_) | Cell::DateTimeTz(_) => Some(InferredKind::Datetime),
        Cell::Duration(_) => Some(InferredKind::Timedelta),
        Cell::Array(_) | Cell::Object(_) => Some(InferredKind::Mixed),
        Cell::Geometry(_) => Some(InferredKind::Geometry),
    }
}

/// Determine the kind of values in a sequence of cells
///
/// Missing values are not skipped: they only blend in with floats and
/// datetimes, which have native missing markers.
pub fn sniff_cells(cells: &[Cell]) -> InferredKind {
    if cells.is_empty() {
        return InferredKind::Empty;
    }

    let mut has_null = false;
    let mut has_int = false;
    let mut has_float = false;
    let mut kinds: Vec<InferredKind> = Vec::new();
    for cell in cells {
        match cell_kind(cell) {
            None => has_null = true,
            Some(kind) => {
                has_int |= kind == InferredKind::Integer;
                has_float |= kind == InferredKind::Floating;
                if !kinds.contains(&kind) {
                    kinds.push(kind);
                }
            }
        }
    }

    match kinds.as_slice() {
        [] => InferredKind::Mixed,
        [InferredKind::Floating] => InferredKind::Floating,
        [InferredKind::Datetime] => InferredKind::Datetime,
        [kind] if !has_null => *kind,
        [_, _] if has_int && has_float => InferredKind::MixedIntegerFloat,
        _ if has_int => InferredKind::MixedInteger,
        _ => InferredKind::Mixed,
    }
}

/// Determine the kind of values in a column, using the declared dtype when
/// it is informative
pub fn infer_dtype(column: &Column) -> InferredKind {
    match column.dtype() {
        Dtype::Categorical { .. } => InferredKind::Categorical,
        Dtype::String => InferredKind::String,
        Dtype::Bool | Dtype::NullableBool => InferredKind::Boolean,
        Dtype::Datetime => InferredKind::Datetime,
        Dtype::Duration => InferredKind::Timedelta,
        Dtype::Int | Dtype::NullableInt => InferredKind::Integer,
        Dtype::Float | Dtype::NullableFloat => InferredKind::Floating,
        Dtype::Geometry | Dtype::Object => sniff_cells(column.values()),
    }
}

/// Infer the encoding type of a table column
///
/// Never fails: unknown kinds default to nominal with a warning.
pub fn infer_table_column(column: &Column) -> InferredType {
    if let Dtype::Categorical {
        categories,
        ordered: true,
    } = column.dtype()
    {
        return InferredType::ordinal(categories.clone());
    }

    let kind = infer_dtype(column);
    match kind.field_type() {
        Some(field_type) => InferredType::new(field_type),
        None => {
            tracing::warn!(
                field = column.name(),
                kind = kind.as_str(),
                "I don't know how to infer vegalite type from '{}'. Defaulting to nominal.",
                kind
            );
            InferredType::new(FieldType::Nominal)
        }
    }
}
