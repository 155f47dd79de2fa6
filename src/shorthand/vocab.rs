//! Vocabulary tables for the encoding shorthand
//!
//! Aggregate, window and time unit names follow Vega-Lite (aggregates and
//! window operations as of 4.6.0, time units as of 4.17.0).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Long-form encoding type name to single letter code
pub const TYPECODE_MAP: &[(&str, &str)] = &[
    ("ordinal", "O"),
    ("nominal", "N"),
    ("quantitative", "Q"),
    ("temporal", "T"),
    ("geojson", "G"),
];

/// Single letter code to long-form encoding type name
pub const INV_TYPECODE_MAP: &[(&str, &str)] = &[
    ("O", "ordinal"),
    ("N", "nominal"),
    ("Q", "quantitative"),
    ("T", "temporal"),
    ("G", "geojson"),
];

pub const AGGREGATES: &[&str] = &[
    "argmax",
    "argmin",
    "average",
    "count",
    "distinct",
    "max",
    "mean",
    "median",
    "min",
    "missing",
    "product",
    "q1",
    "q3",
    "ci0",
    "ci1",
    "stderr",
    "stdev",
    "stdevp",
    "sum",
    "valid",
    "values",
    "variance",
    "variancep",
    "exponential",
    "exponentialb",
];

pub const WINDOW_AGGREGATES: &[&str] = &[
    "row_number",
    "rank",
    "dense_rank",
    "percent_rank",
    "cume_dist",
    "ntile",
    "lag",
    "lead",
    "first_value",
    "last_value",
    "nth_value",
];

pub const TIMEUNITS: &[&str] = &[
    "year",
    "quarter",
    "month",
    "week",
    "day",
    "dayofyear",
    "date",
    "hours",
    "minutes",
    "seconds",
    "milliseconds",
    "yearquarter",
    "yearquartermonth",
    "yearmonth",
    "yearmonthdate",
    "yearmonthdatehours",
    "yearmonthdatehoursminutes",
    "yearmonthdatehoursminutesseconds",
    "yearweek",
    "yearweekday",
    "yearweekdayhours",
    "yearweekdayhoursminutes",
    "yearweekdayhoursminutesseconds",
    "yeardayofyear",
    "quartermonth",
    "monthdate",
    "monthdatehours",
    "monthdatehoursminutes",
    "monthdatehoursminutesseconds",
    "weekday",
    "weeksdayhours",
    "weekdayhours",
    "weekdayhoursminutes",
    "weekdayhoursminutesseconds",
    "dayhours",
    "dayhoursminutes",
    "dayhoursminutesseconds",
    "hoursminutes",
    "hoursminutesseconds",
    "minutesseconds",
    "secondsmilliseconds",
    "utcyear",
    "utcquarter",
    "utcmonth",
    "utcweek",
    "utcday",
    "utcdayofyear",
    "utcdate",
    "utchours",
    "utcminutes",
    "utcseconds",
    "utcmilliseconds",
    "utcyearquarter",
    "utcyearquartermonth",
    "utcyearmonth",
    "utcyearmonthdate",
    "utcyearmonthdatehours",
    "utcyearmonthdatehoursminutes",
    "utcyearmonthdatehoursminutesseconds",
    "utcyearweek",
    "utcyearweekday",
    "utcyearweekdayhours",
    "utcyearweekdayhoursminutes",
    "utcyearweekdayhoursminutesseconds",
    "utcyeardayofyear",
    "utcquartermonth",
    "utcmonthdate",
    "utcmonthdatehours",
    "utcmonthdatehoursminutes",
    "utcmonthdatehoursminutesseconds",
    "utcweekday",
    "utcweeksdayhours",
    "utcweekdayhoursminutes",
    "utcweekdayhoursminutesseconds",
    "utcdayhours",
    "utcdayhoursminutes",
    "utcdayhoursminutesseconds",
    "utchoursminutes",
    "utchoursminutesseconds",
    "utcminutesseconds",
    "utcsecondsmilliseconds",
];

/// Look up the letter code for a long-form type name
pub fn typecode(long_form: &str) -> Option<&'static str> {
    TYPECODE_MAP
        .iter()
        .find(|(name, _)| *name == long_form)
        .map(|(_, code)| *code)
}

/// Look up the long-form type name for a letter code
pub fn long_form(code: &str) -> Option<&'static str> {
    INV_TYPECODE_MAP
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, name)| *name)
}

/// Every spelling accepted as a type suffix: long forms first, then codes
pub fn valid_typecodes() -> impl Iterator<Item = &'static str> {
    TYPECODE_MAP
        .iter()
        .map(|(name, _)| *name)
        .chain(INV_TYPECODE_MAP.iter().map(|(code, _)| *code))
}

/// Vega-Lite encoding data type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Quantitative,
    Nominal,
    Ordinal,
    Temporal,
    Geojson,
}

impl FieldType {
    pub const ALL: [FieldType; 5] = [
        FieldType::Ordinal,
        FieldType::Nominal,
        FieldType::Quantitative,
        FieldType::Temporal,
        FieldType::Geojson,
    ];

    /// Long-form name as it appears in Vega-Lite JSON
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Quantitative => "quantitative",
            FieldType::Nominal => "nominal",
            FieldType::Ordinal => "ordinal",
            FieldType::Temporal => "temporal",
            FieldType::Geojson => "geojson",
        }
    }

    /// Single letter shorthand code
    pub fn code(&self) -> &'static str {
        match self {
            FieldType::Quantitative => "Q",
            FieldType::Nominal => "N",
            FieldType::Ordinal => "O",
            FieldType::Temporal => "T",
            FieldType::Geojson => "G",
        }
    }

    /// Parse either a long-form name or a letter code
    pub fn parse(s: &str) -> Option<Self> {
        let name = long_form(s).unwrap_or(s);
        Self::ALL.into_iter().find(|t| t.as_str() == name)
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
