//! Encoding shorthand parsing
//!
//! Parses the compact channel syntax used when declaring encodings:
//!
//! - `"col_name"`
//! - `"col_name:O"`
//! - `"average(col_name)"`
//! - `"average(col_name):O"`
//! - `"month(col_name):T"`
//!
//! A literal colon in a field name must be escaped with a backslash
//! (`"column\\:name"`). When the shorthand carries no type and a data source
//! is supplied, the type is inferred from the column.

pub mod grammar;
pub mod vocab;

pub use grammar::{Grammar, PatternKind};
pub use vocab::{FieldType, AGGREGATES, INV_TYPECODE_MAP, TIMEUNITS, TYPECODE_MAP, WINDOW_AGGREGATES};

use serde::{Deserialize, Serialize};

use crate::data::DataSource;
use crate::{Result, VlspecError};

/// Which parts of the shorthand grammar are active
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParseOptions {
    /// Parse `aggregate(field)` forms
    pub parse_aggregates: bool,
    /// Parse `op(field)` window operations, stored under `op`
    pub parse_window_ops: bool,
    /// Parse `timeUnit(field)` forms
    pub parse_timeunits: bool,
    /// Parse `:TYPE` suffixes
    pub parse_types: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            parse_aggregates: true,
            parse_window_ops: false,
            parse_timeunits: true,
            parse_types: true,
        }
    }
}

impl ParseOptions {
    pub fn with_aggregates(mut self, enabled: bool) -> Self {
        self.parse_aggregates = enabled;
        self
    }

    pub fn with_window_ops(mut self, enabled: bool) -> Self {
        self.parse_window_ops = enabled;
        self
    }

    pub fn with_timeunits(mut self, enabled: bool) -> Self {
        self.parse_timeunits = enabled;
        self
    }

    pub fn with_types(mut self, enabled: bool) -> Self {
        self.parse_types = enabled;
        self
    }

    /// Pack the flags into a 4-bit index
    pub(crate) fn bits(&self) -> u8 {
        u8::from(self.parse_aggregates)
            | u8::from(self.parse_window_ops) << 1
            | u8::from(self.parse_timeunits) << 2
            | u8::from(self.parse_types) << 3
    }

    pub(crate) fn from_bits(bits: u8) -> Self {
        Self {
            parse_aggregates: bits & 1 != 0,
            parse_window_ops: bits & 2 != 0,
            parse_timeunits: bits & 4 != 0,
            parse_types: bits & 8 != 0,
        }
    }
}

/// Attributes extracted from a shorthand
///
/// Serializes to the encoding channel keys Vega-Lite expects, omitting
/// absent attributes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncodingAttrs {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aggregate: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub op: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_unit: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub field_type: Option<FieldType>,
    /// Category order recovered from an ordered categorical column
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<Vec<String>>,
}

impl EncodingAttrs {
    /// A bare field reference
    pub fn field(name: impl Into<String>) -> Self {
        Self {
            field: Some(name.into()),
            ..Default::default()
        }
    }

    pub fn with_type(mut self, field_type: FieldType) -> Self {
        self.field_type = Some(field_type);
        self
    }

    pub fn with_aggregate(mut self, aggregate: impl Into<String>) -> Self {
        self.aggregate = Some(aggregate.into());
        self
    }

    pub fn with_time_unit(mut self, time_unit: impl Into<String>) -> Self {
        self.time_unit = Some(time_unit.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// True when the attributes are exactly `{aggregate: "count"}`
    fn is_bare_count(&self) -> bool {
        *self == Self::default().with_aggregate("count")
    }
}

/// Shorthand input: a string to parse or attributes that are already structured
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Shorthand {
    Text(String),
    Attrs(EncodingAttrs),
}

impl From<&str> for Shorthand {
    fn from(s: &str) -> Self {
        Shorthand::Text(s.to_string())
    }
}

impl From<String> for Shorthand {
    fn from(s: String) -> Self {
        Shorthand::Text(s)
    }
}

impl From<EncodingAttrs> for Shorthand {
    fn from(attrs: EncodingAttrs) -> Self {
        Shorthand::Attrs(attrs)
    }
}

/// Parse a shorthand into encoding attributes
///
/// # Arguments
/// * `shorthand` - Shorthand string, or attributes that skip matching
/// * `data` - Optional data used to infer the type when none is given
/// * `options` - Which parts of the grammar are active
///
/// # Errors
/// Returns `VlspecError::ShorthandError` when the resulting field still
/// contains an unescaped colon (almost always a misspelled type suffix), and
/// `VlspecError::InferenceError` when the data's strict inference rejects the
/// column's dtype.
pub fn parse_shorthand(
    shorthand: impl Into<Shorthand>,
    data: Option<&dyn DataSource>,
    options: &ParseOptions,
) -> Result<EncodingAttrs> {
    let mut attrs = match shorthand.into() {
        Shorthand::Attrs(attrs) => attrs,
        Shorthand::Text(text) if text.is_empty() => return Ok(EncodingAttrs::default()),
        Shorthand::Text(text) => match_text(&text, options)?,
    };

    // counts are quantitative by default
    if attrs.is_bare_count() {
        attrs.field_type = Some(FieldType::Quantitative);
    }

    // times are temporal by default
    if attrs.time_unit.is_some() && attrs.field_type.is_none() {
        attrs.field_type = Some(FieldType::Temporal);
    }

    if attrs.field_type.is_none() {
        if let (Some(data), Some(field)) = (data, attrs.field.as_deref()) {
            let unescaped = field.replace('\\', "");
            if let Some(inferred) = data.infer_type(&unescaped)? {
                attrs.field_type = Some(inferred.field_type);
                attrs.sort = inferred.categories;
            }
        }
    }

    if let Some(field) = attrs.field.as_deref() {
        check_unescaped_colon(field)?;
    }

    Ok(attrs)
}

fn match_text(text: &str, options: &ParseOptions) -> Result<EncodingAttrs> {
    let (_, m) = Grammar::for_options(options)
        .match_shorthand(text)
        .ok_or_else(|| {
            VlspecError::InternalError(format!(
                "No shorthand pattern matched '{}'; the bare field pattern should always match",
                text
            ))
        })?;

    let field_type = match m.type_code.as_deref() {
        Some(code) => Some(FieldType::parse(code).ok_or_else(|| {
            VlspecError::InternalError(format!("Matched unknown type code '{}'", code))
        })?),
        None => None,
    };

    Ok(EncodingAttrs {
        aggregate: m.aggregate,
        field: m.field,
        op: m.op,
        time_unit: m.time_unit,
        field_type,
        sort: None,
    })
}

/// Reject a field whose last colon is not escaped with a backslash
fn check_unescaped_colon(field: &str) -> Result<()> {
    let Some(idx) = field.rfind(':') else {
        return Ok(());
    };
    if field[..idx].ends_with('\\') {
        return Ok(());
    }

    let suffix = field.rsplit(':').next().unwrap_or_default();
    let codes: Vec<&str> = TYPECODE_MAP.iter().map(|(_, code)| *code).collect();
    Err(VlspecError::ShorthandError(format!(
        "\"{}\" is not one of the valid encoding data types: {}.\n\
         If you are trying to use a column name that contains a colon, prefix it \
         with a backslash; for example \"column\\:name\" instead of \"column:name\".",
        suffix,
        codes.join(", ")
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Cell, Column, Dtype, Table};
    use polars::prelude::*;

    fn parse(s: &str) -> EncodingAttrs {
        parse_shorthand(s, None, &ParseOptions::default()).unwrap()
    }

    #[test]
    fn test_bare_field() {
        assert_eq!(parse("name"), EncodingAttrs::field("name"));
    }

    #[test]
    fn test_field_with_type_code() {
        assert_eq!(
            parse("name:Q"),
            EncodingAttrs::field("name").with_type(FieldType::Quantitative)
        );
        assert_eq!(
            parse("foo:O"),
            EncodingAttrs::field("foo").with_type(FieldType::Ordinal)
        );
        assert_eq!(
            parse("foo:temporal"),
            EncodingAttrs::field("foo").with_type(FieldType::Temporal)
        );
    }

    #[test]
    fn test_aggregate() {
        assert_eq!(
            parse("average(col)"),
            EncodingAttrs::field("col").with_aggregate("average")
        );
        assert_eq!(
            parse("min(foo):Q"),
            EncodingAttrs::field("foo")
                .with_aggregate("min")
                .with_type(FieldType::Quantitative)
        );
    }

    #[test]
    fn test_time_unit_defaults_to_temporal() {
        assert_eq!(
            parse("month(col)"),
            EncodingAttrs::field("col")
                .with_time_unit("month")
                .with_type(FieldType::Temporal)
        );
        assert_eq!(
            parse("year(col):O"),
            EncodingAttrs::field("col")
                .with_time_unit("year")
                .with_type(FieldType::Ordinal)
        );
    }

    #[test]
    fn test_count_defaults_to_quantitative() {
        assert_eq!(
            parse("count()"),
            EncodingAttrs::default()
                .with_aggregate("count")
                .with_type(FieldType::Quantitative)
        );
        assert_eq!(
            parse("count():N"),
            EncodingAttrs::default()
                .with_aggregate("count")
                .with_type(FieldType::Nominal)
        );
    }

    #[test]
    fn test_count_with_field_is_not_defaulted() {
        assert_eq!(
            parse("count(x)"),
            EncodingAttrs::field("x").with_aggregate("count")
        );
    }

    #[test]
    fn test_empty_shorthand_is_empty() {
        assert!(parse("").is_empty());
    }

    #[test]
    fn test_window_ops() {
        let opts = ParseOptions::default()
            .with_aggregates(false)
            .with_window_ops(true);
        let attrs = parse_shorthand("rank(score)", None, &opts).unwrap();
        assert_eq!(attrs.op.as_deref(), Some("rank"));
        assert_eq!(attrs.field.as_deref(), Some("score"));
        assert_eq!(attrs.aggregate, None);

        // `op: count` is not a bare aggregate count, so no type is defaulted
        let attrs = parse_shorthand("count()", None, &opts).unwrap();
        assert_eq!(attrs.op.as_deref(), Some("count"));
        assert_eq!(attrs.field_type, None);
    }

    #[test]
    fn test_disabled_aggregates_capture_field() {
        let opts = ParseOptions::default().with_aggregates(false);
        let attrs = parse_shorthand("sum(x)", None, &opts).unwrap();
        assert_eq!(attrs, EncodingAttrs::field("sum(x)"));
    }

    #[test]
    fn test_disabled_types_keep_suffix_in_field() {
        let opts = ParseOptions::default().with_types(false);
        let err = parse_shorthand("x:Q", None, &opts).unwrap_err();
        assert!(matches!(err, VlspecError::ShorthandError(_)));
    }

    #[test]
    fn test_escaped_colon_is_allowed() {
        assert_eq!(parse("a\\:b"), EncodingAttrs::field("a\\:b"));
        assert_eq!(
            parse("a\\:b:Q"),
            EncodingAttrs::field("a\\:b").with_type(FieldType::Quantitative)
        );
    }

    #[test]
    fn test_unescaped_colon_is_rejected() {
        let err = parse_shorthand("foo:nominl", None, &ParseOptions::default()).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("\"nominl\" is not one of the valid encoding data types"));
        assert!(msg.contains("O, N, Q, T, G"));
        assert!(msg.contains("backslash"));
    }

    #[test]
    fn test_leading_colon_is_unescaped() {
        // nothing precedes the colon, so a trailing backslash does not escape it
        let err = parse_shorthand(":a\\", None, &ParseOptions::default()).unwrap_err();
        assert!(matches!(err, VlspecError::ShorthandError(_)));
        assert!(parse_shorthand(":a", None, &ParseOptions::default()).is_err());

        assert_eq!(parse("\\:a"), EncodingAttrs::field("\\:a"));
    }

    #[test]
    fn test_structured_attrs_skip_matching() {
        let attrs = EncodingAttrs::field("sum(x)");
        assert_eq!(
            parse_shorthand(attrs.clone(), None, &ParseOptions::default()).unwrap(),
            attrs
        );

        let count = EncodingAttrs::default().with_aggregate("count");
        assert_eq!(
            parse_shorthand(count, None, &ParseOptions::default())
                .unwrap()
                .field_type,
            Some(FieldType::Quantitative)
        );
    }

    #[test]
    fn test_infers_type_from_frame() {
        let df = df! {
            "foo" => &["A", "B", "A", "B"],
            "bar" => &[1i64, 2, 3, 4],
        }
        .unwrap();
        let opts = ParseOptions::default();

        assert_eq!(
            parse_shorthand("foo", Some(&df), &opts).unwrap(),
            EncodingAttrs::field("foo").with_type(FieldType::Nominal)
        );
        assert_eq!(
            parse_shorthand("bar", Some(&df), &opts).unwrap(),
            EncodingAttrs::field("bar").with_type(FieldType::Quantitative)
        );
        assert_eq!(
            parse_shorthand("bar:O", Some(&df), &opts).unwrap(),
            EncodingAttrs::field("bar").with_type(FieldType::Ordinal)
        );
        assert_eq!(
            parse_shorthand("sum(bar)", Some(&df), &opts).unwrap(),
            EncodingAttrs::field("bar")
                .with_aggregate("sum")
                .with_type(FieldType::Quantitative)
        );
        assert_eq!(
            parse_shorthand("count()", Some(&df), &opts).unwrap(),
            EncodingAttrs::default()
                .with_aggregate("count")
                .with_type(FieldType::Quantitative)
        );
    }

    #[test]
    fn test_missing_column_leaves_type_unset() {
        let df = df! { "bar" => &[1i64, 2] }.unwrap();
        let attrs = parse_shorthand("baz", Some(&df), &ParseOptions::default()).unwrap();
        assert_eq!(attrs, EncodingAttrs::field("baz"));
    }

    #[test]
    fn test_inference_uses_unescaped_field_name() {
        let table = Table::new(vec![Column::new(
            "a:b",
            Dtype::Int,
            vec![Cell::Int(1), Cell::Int(2)],
        )])
        .unwrap();
        let attrs = parse_shorthand("a\\:b", Some(&table), &ParseOptions::default()).unwrap();
        assert_eq!(
            attrs,
            EncodingAttrs::field("a\\:b").with_type(FieldType::Quantitative)
        );
    }

    #[test]
    fn test_serializes_to_encoding_keys() {
        let json = serde_json::to_value(parse("month(ts)")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"field": "ts", "timeUnit": "month", "type": "temporal"})
        );
    }

    #[test]
    fn test_options_bits_round_trip() {
        for bits in 0..16u8 {
            assert_eq!(ParseOptions::from_bits(bits).bits(), bits);
        }
    }

    #[test]
    fn test_options_deserialize_with_defaults() {
        let opts: ParseOptions = serde_json::from_str(r#"{"parse_window_ops": true}"#).unwrap();
        assert_eq!(opts, ParseOptions::default().with_window_ops(true));
    }
}
