//! Property-based tests for the shorthand grammar, the sanitizers and
//! nested updates

use proptest::prelude::*;
use serde_json::{json, Value};
use vlspec::data::{sanitize_table, Cell, Column, Dtype, Table};
use vlspec::shorthand::{vocab, AGGREGATES, TIMEUNITS};
use vlspec::{parse_shorthand, update_nested, EncodingAttrs, FieldType, ParseOptions, VlspecError};

fn field_name() -> impl Strategy<Value = String> {
    "[a-zA-Z_][a-zA-Z0-9_ ]{0,12}"
}

fn contains_non_finite(value: &Value) -> bool {
    match value {
        Value::Number(n) => n.as_f64().is_some_and(|f| !f.is_finite()),
        Value::Array(items) => items.iter().any(contains_non_finite),
        Value::Object(map) => map.values().any(contains_non_finite),
        _ => false,
    }
}

fn cell() -> impl Strategy<Value = Cell> {
    let leaf = prop_oneof![
        Just(Cell::Null),
        any::<bool>().prop_map(Cell::Bool),
        any::<i64>().prop_map(Cell::Int),
        any::<u64>().prop_map(Cell::UInt),
        prop_oneof![
            any::<f64>(),
            Just(f64::NAN),
            Just(f64::INFINITY),
            Just(f64::NEG_INFINITY)
        ]
        .prop_map(Cell::Float),
        "[a-z]{0,6}".prop_map(Cell::Str),
    ];
    leaf.prop_recursive(2, 16, 4, |inner| {
        prop::collection::vec(inner, 0..4).prop_map(Cell::Array)
    })
}

proptest! {
    #[test]
    fn prop_typecodes_round_trip(idx in 0usize..5) {
        let (name, code) = vocab::TYPECODE_MAP[idx];
        prop_assert_eq!(vocab::long_form(vocab::typecode(name).unwrap()), Some(name));
        prop_assert_eq!(vocab::typecode(vocab::long_form(code).unwrap()), Some(code));
    }

    #[test]
    fn prop_bare_field_parses_to_itself(field in field_name()) {
        let attrs = parse_shorthand(field.as_str(), None, &ParseOptions::default()).unwrap();
        prop_assert_eq!(attrs, EncodingAttrs::field(field));
    }

    #[test]
    fn prop_type_suffix(field in field_name(), idx in 0usize..5) {
        let t = FieldType::ALL[idx];
        for suffix in [t.code(), t.as_str()] {
            let shorthand = format!("{}:{}", field, suffix);
            let attrs = parse_shorthand(shorthand, None, &ParseOptions::default()).unwrap();
            prop_assert_eq!(attrs, EncodingAttrs::field(field.clone()).with_type(t));
        }
    }

    #[test]
    fn prop_aggregate_of_field(field in field_name(), idx in 0..AGGREGATES.len()) {
        let agg = AGGREGATES[idx];
        let attrs = parse_shorthand(format!("{}({})", agg, field), None, &ParseOptions::default()).unwrap();
        prop_assert_eq!(attrs.aggregate.as_deref(), Some(agg));
        prop_assert_eq!(attrs.field, Some(field));
    }

    #[test]
    fn prop_time_unit_defaults_temporal(field in field_name(), idx in 0..TIMEUNITS.len()) {
        let unit = TIMEUNITS[idx];
        let attrs = parse_shorthand(format!("{}({})", unit, field), None, &ParseOptions::default()).unwrap();
        prop_assert_eq!(attrs.time_unit.as_deref(), Some(unit));
        prop_assert_eq!(attrs.field_type, Some(FieldType::Temporal));
    }

    #[test]
    fn prop_escaped_colon_is_accepted(left in field_name(), right in "[a-z]{1,5}") {
        let escaped = format!("{}\\:{}", left, right);
        let attrs = parse_shorthand(escaped.as_str(), None, &ParseOptions::default()).unwrap();
        prop_assert_eq!(attrs, EncodingAttrs::field(escaped));

        let unescaped = format!("{}:{}x", left, right);
        let err = parse_shorthand(unescaped, None, &ParseOptions::default()).unwrap_err();
        prop_assert!(matches!(err, VlspecError::ShorthandError(_)));
    }

    #[test]
    fn prop_sanitized_table_is_strict_json(cells in prop::collection::vec(cell(), 0..8)) {
        let n = cells.len();
        let table = Table::new(vec![
            Column::object("o", cells.clone()),
            Column::new(
                "f",
                Dtype::Float,
                cells
                    .iter()
                    .map(|c| match c {
                        Cell::Float(f) => Cell::Float(*f),
                        _ => Cell::Float(f64::NAN),
                    })
                    .collect(),
            ),
        ])
        .unwrap();
        let records = sanitize_table(&table).unwrap().to_records();
        prop_assert_eq!(records.len(), n);
        for record in &records {
            prop_assert!(!contains_non_finite(record));
            let text = serde_json::to_string(record).unwrap();
            prop_assert!(serde_json::from_str::<Value>(&text).is_ok());
        }
    }

    #[test]
    fn prop_duration_always_rejected(name in field_name(), secs in any::<i32>()) {
        let table = Table::new(vec![Column::new(
            name.as_str(),
            Dtype::Duration,
            vec![Cell::Duration(chrono::TimeDelta::seconds(i64::from(secs)))],
        )])
        .unwrap();
        let err = sanitize_table(&table).unwrap_err();
        let needle = format!("Field \"{}\"", name);
        prop_assert!(err.to_string().contains(&needle));
    }

    #[test]
    fn prop_update_nested_idempotent(a in 0i64..100, b in 0i64..100, key in "[a-z]{1,4}") {
        let update = json!({"scale": {key.clone(): a}, "title": b});
        let mut once = json!({"field": "x", "scale": {"zero": true}});
        update_nested(&mut once, &update);
        let mut twice = once.clone();
        update_nested(&mut twice, &update);
        prop_assert_eq!(once, twice);
    }
}
