//! Encoding channel construction
//!
//! Builds Vega-Lite encoding channel objects from a shorthand, optional
//! extra channel properties and the chart's data.

use serde_json::{Map, Value};

use crate::data::DataSource;
use crate::shorthand::{parse_shorthand, ParseOptions, Shorthand};
use crate::{Result, VlspecError};

/// Build an encoding channel object
///
/// The shorthand is parsed (inferring the type from `data` when needed) and
/// `properties` are merged on top with [`update_nested`], so explicit
/// properties win over anything derived from the shorthand.
///
/// # Example
///
/// ```
/// use serde_json::json;
/// use vlspec::{channel, ParseOptions};
///
/// let x = channel(
///     "yearmonth(date):O",
///     Some(&json!({"axis": {"title": "Month"}})),
///     None,
///     &ParseOptions::default(),
/// )
/// .unwrap();
/// assert_eq!(
///     x,
///     json!({
///         "field": "date",
///         "timeUnit": "yearmonth",
///         "type": "ordinal",
///         "axis": {"title": "Month"}
///     })
/// );
/// ```
pub fn channel(
    shorthand: impl Into<Shorthand>,
    properties: Option<&Value>,
    data: Option<&dyn DataSource>,
    options: &ParseOptions,
) -> Result<Value> {
    let attrs = parse_shorthand(shorthand, data, options)?;
    let mut encoding = serde_json::to_value(&attrs).map_err(|e| {
        VlspecError::InternalError(format!("Failed to serialize encoding attributes: {}", e))
    })?;

    if let Some(properties) = properties {
        if !properties.is_object() {
            return Err(VlspecError::ValidationError(format!(
                "Channel properties must be an object, got: {}",
                properties
            )));
        }
        update_nested(&mut encoding, properties);
    }

    Ok(encoding)
}

/// Recursively merge `update` into `original`
///
/// Objects are merged key by key; any other value replaces what was there.
/// Applying the same update twice gives the same result as applying it once.
pub fn update_nested(original: &mut Value, update: &Value) {
    if let (Value::Object(orig), Value::Object(upd)) = (&mut *original, update) {
        merge_maps(orig, upd);
        return;
    }
    *original = update.clone();
}

fn merge_maps(original: &mut Map<String, Value>, update: &Map<String, Value>) {
    for (key, value) in update {
        let merge = value.is_object() && original.get(key).is_some_and(Value::is_object);
        if !merge {
            original.insert(key.clone(), value.clone());
        } else if let Some(existing) = original.get_mut(key) {
            update_nested(existing, value);
        }
    }
}
