//! CLI input validation functions.
//!
//! These are used by clap's `value_parser` attribute so bad input is rejected
//! at parse time with the same rules the registries enforce.

use crate::config::BackendKind;
use crate::domain::{RelationshipRequest, RelationshipType, MAX_NAME_LENGTH};
use crate::error::ValidationError;
use serde_json::Value;
use std::str::FromStr;

/// Parse any closed domain enumeration (case-insensitive).
pub fn parse_enum<T>(s: &str) -> Result<T, String>
where
    T: FromStr<Err = ValidationError>,
{
    T::from_str(s).map_err(|e| e.to_string())
}

/// Validate a CI name.
pub fn validate_name(s: &str) -> Result<String, String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Err("Name cannot be empty".to_string());
    }
    let len = trimmed.chars().count();
    if len > MAX_NAME_LENGTH {
        return Err(format!(
            "Name cannot exceed {MAX_NAME_LENGTH} characters (got {len})"
        ));
    }
    Ok(trimmed.to_string())
}

/// Validate a relationship weight.
pub fn validate_weight(s: &str) -> Result<f64, String> {
    let weight: f64 = s
        .trim()
        .parse()
        .map_err(|_| format!("'{s}' is not a number"))?;
    crate::domain::RelationshipProperties {
        weight,
        ..Default::default()
    }
    .validate()
    .map_err(|e| e.to_string())?;
    Ok(weight)
}

/// Parse a `TYPE:TARGET` relationship argument for `create --rel`.
///
/// The target is everything after the first colon, so ids may contain colons.
pub fn parse_relationship_arg(s: &str) -> Result<RelationshipRequest, String> {
    let (kind, target) = s
        .split_once(':')
        .ok_or_else(|| format!("Invalid relationship '{s}'. Expected TYPE:TARGET_ID"))?;
    let target = target.trim();
    if target.is_empty() {
        return Err(format!("Relationship '{s}' has no target id"));
    }
    let relationship_type: RelationshipType = parse_enum(kind)?;
    Ok(RelationshipRequest::new(target, relationship_type))
}

/// Parse a `KEY=VALUE` custom attribute.
///
/// The value is read as JSON when it parses (`42`, `true`, `{"a":1}`),
/// otherwise kept as a plain string.
pub fn parse_attribute(s: &str) -> Result<(String, Value), String> {
    let (key, raw) = s
        .split_once('=')
        .ok_or_else(|| format!("Invalid attribute '{s}'. Expected KEY=VALUE"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("Attribute '{s}' has an empty key"));
    }
    let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
    Ok((key.to_string(), value))
}

/// Parse a JSON object given on the command line.
pub fn parse_json_object(s: &str) -> Result<Value, String> {
    let value: Value = serde_json::from_str(s).map_err(|e| format!("Invalid JSON: {e}"))?;
    if value.is_object() {
        Ok(value)
    } else {
        Err("Expected a JSON object".to_string())
    }
}

/// Parse the `init --backend` value.
pub fn parse_backend(s: &str) -> Result<BackendKind, String> {
    match s.trim().to_ascii_lowercase().as_str() {
        "memory" => Ok(BackendKind::Memory),
        "jsonl" => Ok(BackendKind::Jsonl),
        other => Err(format!("Unknown backend '{other}'. Expected memory or jsonl")),
    }
}
