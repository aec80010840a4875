//! Conversions shared by the entity codecs.
//!
//! Each entity module maps its wire message to and from its model; the
//! helpers here cover the representations that differ between the two
//! sides: presence of empty strings, certificate bytes, and the embedded
//! Helm values document.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use declarative::{ReconcileError, Result};
use prost_types::value::Kind;
use prost_types::{ListValue, Struct, Value};
use serde_json::{Map, Number, Value as Json};

/// An empty wire string is an unset model value.
pub fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}

/// Same as [`non_empty`] for fields without wire presence.
pub fn non_empty_str(value: String) -> Option<String> {
    (!value.is_empty()).then_some(value)
}

// ============================================================================
// Certificates
// ============================================================================

/// Base64 model text to wire bytes. Unset or empty text encodes to no bytes.
pub fn encode_cert(field: &str, value: Option<&str>) -> Result<Vec<u8>> {
    match value {
        None | Some("") => Ok(Vec::new()),
        Some(text) => STANDARD.decode(text.trim()).map_err(|e| {
            ReconcileError::codec(
                format!("Error decoding {field}"),
                format!("Failed to decode {field} from base64: {e}"),
            )
        }),
    }
}

/// Wire bytes to base64 model text. No bytes decode to unset.
pub fn decode_cert(bytes: &[u8]) -> Option<String> {
    (!bytes.is_empty()).then(|| STANDARD.encode(bytes))
}

// ============================================================================
// Helm values
// ============================================================================

/// Parse YAML (or JSON) text into a structured document.
///
/// Blank text is unset. Anything but a mapping at the top level is rejected.
pub fn parse_helm_values(text: Option<&str>) -> Result<Option<Struct>> {
    let Some(text) = text.filter(|t| !t.trim().is_empty()) else {
        return Ok(None);
    };

    let invalid = |detail: String| {
        ReconcileError::codec(
            "Error parsing extra_helm_values",
            format!("invalid YAML in extra_helm_values: {detail}"),
        )
    };

    let document: Json = serde_yaml::from_str(text).map_err(|e| invalid(e.to_string()))?;
    match document {
        Json::Object(map) => Ok(Some(json_to_struct(map))),
        Json::Null => Ok(None),
        other => Err(invalid(format!(
            "expected a mapping at the top level, found {}",
            json_kind(&other)
        ))),
    }
}

/// Render a structured document as compact JSON text.
///
/// An empty document renders as unset.
pub fn render_helm_values(document: Option<&Struct>) -> Result<Option<String>> {
    let Some(document) = document.filter(|d| !d.fields.is_empty()) else {
        return Ok(None);
    };
    let json = Json::Object(struct_to_json(document));
    serde_json::to_string(&json).map(Some).map_err(|e| {
        ReconcileError::codec(
            "Error processing cluster data",
            format!("Could not marshal extra_helm_values to JSON: {e}"),
        )
    })
}

/// Keep caller-authored text when it means the same as the rendered value.
///
/// The first candidate that parses to an equal document wins, so YAML
/// formatting and key order chosen by the caller survive a round trip.
pub fn preserve_helm_text(rendered: Option<String>, candidates: &[Option<&str>]) -> Option<String> {
    let rendered_text = rendered.as_deref()?;
    let Ok(Some(rendered_doc)) = parse_helm_values(Some(rendered_text)) else {
        return rendered;
    };

    candidates
        .iter()
        .filter_map(|candidate| *candidate)
        .find(|text| matches!(parse_helm_values(Some(*text)), Ok(Some(doc)) if doc == rendered_doc))
        .map(str::to_string)
        .or(rendered)
}

fn json_kind(value: &Json) -> &'static str {
    match value {
        Json::Null => "null",
        Json::Bool(_) => "a boolean",
        Json::Number(_) => "a number",
        Json::String(_) => "a string",
        Json::Array(_) => "a sequence",
        Json::Object(_) => "a mapping",
    }
}

fn json_to_struct(map: Map<String, Json>) -> Struct {
    Struct {
        fields: map
            .into_iter()
            .map(|(key, value)| (key, json_to_value(value)))
            .collect(),
    }
}

fn json_to_value(value: Json) -> Value {
    let kind = match value {
        Json::Null => Kind::NullValue(0),
        Json::Bool(b) => Kind::BoolValue(b),
        Json::Number(n) => Kind::NumberValue(n.as_f64().unwrap_or_default()),
        Json::String(s) => Kind::StringValue(s),
        Json::Array(items) => Kind::ListValue(ListValue {
            values: items.into_iter().map(json_to_value).collect(),
        }),
        Json::Object(map) => Kind::StructValue(json_to_struct(map)),
    };
    Value { kind: Some(kind) }
}

fn struct_to_json(document: &Struct) -> Map<String, Json> {
    document
        .fields
        .iter()
        .map(|(key, value)| (key.clone(), value_to_json(value)))
        .collect()
}

fn value_to_json(value: &Value) -> Json {
    match &value.kind {
        None | Some(Kind::NullValue(_)) => Json::Null,
        Some(Kind::BoolValue(b)) => Json::Bool(*b),
        Some(Kind::NumberValue(n)) => number_to_json(*n),
        Some(Kind::StringValue(s)) => Json::String(s.clone()),
        Some(Kind::ListValue(list)) => Json::Array(list.values.iter().map(value_to_json).collect()),
        Some(Kind::StructValue(inner)) => Json::Object(struct_to_json(inner)),
    }
}

/// Whole numbers render without a fractional part, matching how they were written.
fn number_to_json(n: f64) -> Json {
    if n.fract() == 0.0 && n.abs() < 9_007_199_254_740_992.0 {
        Json::Number(Number::from(n as i64))
    } else {
        Number::from_f64(n).map_or(Json::Null, Json::Number)
    }
}
