/*!
# vlspec - Vega-Lite specification core

Building blocks for authoring Vega-Lite chart specifications from Rust:
the compact encoding shorthand, data-driven field type inference and
JSON-safe data embedding.

## Example

```rust
use vlspec::{parse_shorthand, FieldType, ParseOptions};

let attrs = parse_shorthand("average(price):Q", None, &ParseOptions::default()).unwrap();
assert_eq!(attrs.aggregate.as_deref(), Some("average"));
assert_eq!(attrs.field.as_deref(), Some("price"));
assert_eq!(attrs.field_type, Some(FieldType::Quantitative));
```

## Architecture

An encoding channel built from a shorthand string flows through:
- **Shorthand** → [`shorthand`] matches the string against an ordered list of
  grammar patterns and produces [`EncodingAttrs`]
- **Inference** → when no type was given, the [`DataSource`] backing the chart
  infers one from the column's dtype
- **Channel** → [`encoding`] turns the attributes into encoding JSON

Separately, chart data is embedded through [`data::to_values`], which runs
the sanitizer for the data's backend so every value is strict JSON.

## Core Components

- [`shorthand`] - Vocabulary tables and the shorthand parser
- [`data`] - Data sources, type inference and sanitization
- [`encoding`] - Encoding channel construction and nested updates
- [`validate`] - JSON Schema validation of assembled specifications
*/

pub mod data;
pub mod encoding;
pub mod shorthand;
pub mod validate;

// Re-export key types for convenience
pub use data::{to_values, Cell, Column, Data, DataOptions, DataSource, Dtype, InferredType, Table};
pub use encoding::{channel, update_nested};
pub use shorthand::{parse_shorthand, EncodingAttrs, FieldType, ParseOptions, Shorthand};
pub use validate::{validate_spec, SpecValidator};

// DataFrame abstraction (wraps Polars)
pub use polars::prelude::DataFrame;

/// Main library error type
#[derive(thiserror::Error, Debug)]
pub enum VlspecError {
    #[error("Shorthand error: {0}")]
    ShorthandError(String),

    #[error("Type inference error: {0}")]
    InferenceError(String),

    #[error("Sanitization error: {0}")]
    SanitizeError(String),

    #[error("Data error: {0}")]
    DataError(String),

    #[error("{0}")]
    MaxRowsError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

pub type Result<T> = std::result::Result<T, VlspecError>;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod integration_tests {
    use super::*;
    use crate::data::Column;
    use polars::prelude::*;
    use serde_json::json;

    #[test]
    fn test_end_to_end_channel_and_values_from_frame() {
        let df = df! {
            "category" => &["a", "b", "c"],
            "amount" => &[1.5f64, f64::NAN, 3.0],
        }
        .unwrap();

        let x = channel("category", None, Some(&df), &ParseOptions::default()).unwrap();
        let y = channel("sum(amount)", None, Some(&df), &ParseOptions::default()).unwrap();
        assert_eq!(x, json!({"field": "category", "type": "nominal"}));
        assert_eq!(
            y,
            json!({"aggregate": "sum", "field": "amount", "type": "quantitative"})
        );

        let values = to_values(&Data::Frame(&df)).unwrap();
        let rows = values["values"].as_array().unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1]["amount"], serde_json::Value::Null);

        // The whole document must survive strict JSON encoding
        let spec = json!({
            "mark": "bar",
            "data": values,
            "encoding": {"x": x, "y": y},
        });
        assert!(serde_json::to_string(&spec).is_ok());
    }

    #[test]
    fn test_end_to_end_table_with_ordered_categories() {
        let table = Table::new(vec![Column::new(
            "size",
            Dtype::Categorical {
                categories: vec!["S".to_string(), "M".to_string(), "L".to_string()],
                ordered: true,
            },
            vec![Cell::from("M"), Cell::from("S"), Cell::Null],
        )])
        .unwrap();

        let x = channel("size", None, Some(&table), &ParseOptions::default()).unwrap();
        assert_eq!(
            x,
            json!({"field": "size", "type": "ordinal", "sort": ["S", "M", "L"]})
        );

        let values = to_values(&Data::Table(&table)).unwrap();
        assert_eq!(
            values,
            json!({"values": [{"size": "M"}, {"size": "S"}, {"size": null}]})
        );
    }
}
