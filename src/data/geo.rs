//! Geo interface (GeoJSON) sanitization
//!
//! Vega-Lite expects features with their properties at the top level, so
//! each feature's `type` and `geometry` are merged into its properties.

use serde_json::{json, Map, Value};

use crate::{Result, VlspecError};

/// Merge a feature's `type` and `geometry` into its properties
///
/// Existing `type`/`geometry` entries in the properties are overwritten.
fn merge_props_geom(feature: &Value) -> Result<Value> {
    let mut geom = Map::new();
    for key in ["type", "geometry"] {
        let value = feature.get(key).ok_or_else(|| {
            VlspecError::DataError(format!("Geo feature is missing required key '{}'", key))
        })?;
        geom.insert(key.to_string(), value.clone());
    }

    match feature.get("properties") {
        Some(Value::Object(props)) => {
            let mut props = props.clone();
            props.extend(geom);
            Ok(Value::Object(props))
        }
        _ => Ok(Value::Object(geom)),
    }
}

/// Sanitize a geo interface object for embedding
///
/// - FeatureCollection → list of merged features
/// - Feature → merged feature
/// - anything else is treated as a bare geometry and wrapped in a Feature
///
/// The input is never modified.
pub fn sanitize_geo_interface(geo: &Value) -> Result<Value> {
    let geo_type = geo.get("type").and_then(Value::as_str).ok_or_else(|| {
        VlspecError::DataError("Geo interface object must have a string 'type'".to_string())
    })?;

    match geo_type {
        "FeatureCollection" => {
            let features = geo
                .get("features")
                .and_then(Value::as_array)
                .ok_or_else(|| {
                    VlspecError::DataError(
                        "FeatureCollection must have a 'features' array".to_string(),
                    )
                })?;
            features
                .iter()
                .map(merge_props_geom)
                .collect::<Result<Vec<_>>>()
                .map(Value::Array)
        }
        "Feature" => merge_props_geom(geo),
        _ => Ok(json!({"type": "Feature", "geometry": geo.clone()})),
    }
}
