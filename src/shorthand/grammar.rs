//! Ordered pattern grammar for encoding shorthands
//!
//! A shorthand is matched against a list of anchored patterns, most specific
//! first. The first pattern that matches the whole string wins; there is no
//! backtracking into later alternatives once a pattern has matched. With type
//! parsing enabled every pattern is tried with a `:TYPE` suffix before its
//! bare form, so `sum(x):Q` resolves to an aggregate with a type rather than
//! a field called `sum(x):Q`.

use regex::{Captures, Regex};
use std::sync::OnceLock;

use super::vocab::{valid_typecodes, AGGREGATES, TIMEUNITS, WINDOW_AGGREGATES};
use super::ParseOptions;

/// Which shorthand form a pattern recognises
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternKind {
    /// `count()` read as an aggregate
    AggregateCount,
    /// `aggregate(field)`
    Aggregate,
    /// `count()` read as a window operation
    WindowCount,
    /// `op(field)` over aggregates and window-only operations
    WindowOp,
    /// `timeUnit(field)`
    TimeUnit,
    /// Anything else, captured whole as the field name
    Field,
}

impl PatternKind {
    fn template(&self) -> &'static str {
        match self {
            PatternKind::AggregateCount => r"{agg_count}\(\)",
            PatternKind::Aggregate => r"{aggregate}\({field}\)",
            PatternKind::WindowCount => r"{op_count}\(\)",
            PatternKind::WindowOp => r"{window_op}\({field}\)",
            PatternKind::TimeUnit => r"{timeUnit}\({field}\)",
            PatternKind::Field => r"{field}",
        }
    }
}

/// Named groups extracted by a successful match
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShorthandMatch {
    pub field: Option<String>,
    pub aggregate: Option<String>,
    pub op: Option<String>,
    pub time_unit: Option<String>,
    pub type_code: Option<String>,
}

impl ShorthandMatch {
    fn from_captures(caps: &Captures<'_>) -> Self {
        let group = |name: &str| caps.name(name).map(|m| m.as_str().to_string());
        Self {
            field: group("field"),
            aggregate: group("aggregate"),
            op: group("op"),
            time_unit: group("timeUnit"),
            type_code: group("type"),
        }
    }
}

/// A single compiled whole-string pattern
#[derive(Debug)]
struct Matcher {
    kind: PatternKind,
    typed: bool,
    regex: Regex,
}

/// The ordered pattern list for one combination of parse options
#[derive(Debug)]
pub struct Grammar {
    matchers: Vec<Matcher>,
}

fn alternation<'a>(words: impl IntoIterator<Item = &'a str>) -> String {
    words
        .into_iter()
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join("|")
}

/// Expand the `{unit}` placeholders of a pattern template
fn expand(template: &str) -> String {
    static UNITS: OnceLock<Vec<(&'static str, String)>> = OnceLock::new();
    let units = UNITS.get_or_init(|| {
        vec![
            ("{field}", "(?P<field>.*)".to_string()),
            ("{type}", format!("(?P<type>{})", alternation(valid_typecodes()))),
            ("{agg_count}", "(?P<aggregate>count)".to_string()),
            ("{op_count}", "(?P<op>count)".to_string()),
            (
                "{aggregate}",
                format!("(?P<aggregate>{})", alternation(AGGREGATES.iter().copied())),
            ),
            (
                "{window_op}",
                format!(
                    "(?P<op>{})",
                    alternation(AGGREGATES.iter().chain(WINDOW_AGGREGATES).copied())
                ),
            ),
            (
                "{timeUnit}",
                format!("(?P<timeUnit>{})", alternation(TIMEUNITS.iter().copied())),
            ),
        ]
    });

    units
        .iter()
        .fold(template.to_string(), |acc, (placeholder, group)| {
            acc.replace(placeholder, group)
        })
}

impl Grammar {
    /// Build the pattern list for the given options, most specific first
    pub fn build(options: &ParseOptions) -> Result<Self, regex::Error> {
        let mut kinds = Vec::new();
        if options.parse_aggregates {
            kinds.extend([PatternKind::AggregateCount, PatternKind::Aggregate]);
        }
        if options.parse_window_ops {
            kinds.extend([PatternKind::WindowCount, PatternKind::WindowOp]);
        }
        if options.parse_timeunits {
            kinds.push(PatternKind::TimeUnit);
        }
        kinds.push(PatternKind::Field);

        let variants: &[bool] = if options.parse_types {
            &[true, false]
        } else {
            &[false]
        };

        let mut matchers = Vec::with_capacity(kinds.len() * variants.len());
        for kind in kinds {
            for &typed in variants {
                let body = if typed {
                    format!("{}:{{type}}", kind.template())
                } else {
                    kind.template().to_string()
                };
                let regex = Regex::new(&format!(r"(?s)\A{}\z", expand(&body)))?;
                matchers.push(Matcher { kind, typed, regex });
            }
        }

        Ok(Self { matchers })
    }

    /// Shared grammar for an option set, compiled once per process
    pub fn for_options(options: &ParseOptions) -> &'static Grammar {
        static GRAMMARS: OnceLock<Vec<Grammar>> = OnceLock::new();
        let grammars = GRAMMARS.get_or_init(|| {
            (0..16u8)
                .map(|bits| {
                    Grammar::build(&ParseOptions::from_bits(bits))
                        .expect("Invalid shorthand grammar regex")
                })
                .collect()
        });
        &grammars[usize::from(options.bits())]
    }

    /// Try each pattern in order and return the first whole-string match
    pub fn match_shorthand(&self, shorthand: &str) -> Option<(PatternKind, ShorthandMatch)> {
        self.matchers.iter().find_map(|matcher| {
            matcher.regex.captures(shorthand).map(|caps| {
                tracing::debug!(
                    kind = ?matcher.kind,
                    typed = matcher.typed,
                    shorthand,
                    "shorthand pattern matched"
                );
                (matcher.kind, ShorthandMatch::from_captures(&caps))
            })
        })
    }

    /// Number of candidate patterns
    pub fn len(&self) -> usize {
        self.matchers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matchers.is_empty()
    }
}
