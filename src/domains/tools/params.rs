//! Argument decoding shared by every tool.
//!
//! Each tool declares its arguments as one typed struct. That struct is the
//! only contract: the advertised JSON schema and the help text are generated
//! from it, and the values handlers see are exactly what `serde` decoded,
//! defaults included.

use schemars::JsonSchema;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use std::time::Duration;

use super::error::ToolError;

/// A tool's argument struct.
pub trait ToolParams: DeserializeOwned + Serialize + JsonSchema + Send + Sync + 'static {
    /// Checks that cannot be expressed through the type alone.
    fn validate(&self) -> Result<(), ToolError> {
        Ok(())
    }
}

/// Decode and validate a raw argument payload.
///
/// `null` is treated as an empty object. Anything other than an object is
/// rejected before any field is looked at.
pub fn decode_params<P: ToolParams>(arguments: Value) -> Result<P, ToolError> {
    let arguments = match arguments {
        Value::Null => Value::Object(Default::default()),
        Value::Object(map) => Value::Object(map),
        other => {
            return Err(ToolError::invalid_arguments(format!(
                "expected a JSON object, got {}",
                json_type(&other)
            )));
        }
    };

    let params: P = serde_json::from_value(arguments).map_err(decode_error)?;
    params.validate()?;
    Ok(params)
}

/// Parse a raw JSON string into an argument payload.
///
/// Blank input means "no arguments".
pub fn parse_arguments(raw: &str) -> Result<Value, ToolError> {
    if raw.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(raw).map_err(|e| ToolError::invalid_arguments(e.to_string()))
}

fn decode_error(err: serde_json::Error) -> ToolError {
    let message = err.to_string();
    match missing_field_name(&message) {
        Some(field) => ToolError::missing_field(field),
        None => ToolError::invalid_arguments(message),
    }
}

/// Extract `x` from serde's "missing field `x`" message.
fn missing_field_name(message: &str) -> Option<&str> {
    let rest = message.strip_prefix("missing field `")?;
    rest.split('`').next()
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ============================================================================
// Validation helpers
// ============================================================================

/// Reject an empty required string.
pub fn require_non_empty(field: &str, value: &str) -> Result<(), ToolError> {
    if value.trim().is_empty() {
        return Err(ToolError::missing_field(field));
    }
    Ok(())
}

/// Reject an empty required list.
pub fn require_items<T>(field: &str, values: &[T]) -> Result<(), ToolError> {
    if values.is_empty() {
        return Err(ToolError::missing_field(field));
    }
    Ok(())
}

/// Reject an integer outside `min..=max`.
pub fn ensure_range<T>(field: &str, value: T, min: T, max: T) -> Result<(), ToolError>
where
    T: PartialOrd + std::fmt::Display + Copy,
{
    if value < min || value > max {
        return Err(ToolError::out_of_range(
            field,
            format!("{} is outside the allowed range {}..={}", value, min, max),
        ));
    }
    Ok(())
}

/// Reject a string that is not a valid duration.
pub fn ensure_duration(field: &str, value: &str) -> Result<(), ToolError> {
    parse_duration(value)
        .map(|_| ())
        .map_err(|reason| ToolError::out_of_range(field, reason))
}

/// Parse a Go-style duration such as `90s`, `5m`, `1h30m` or `1.5h`.
pub fn parse_duration(input: &str) -> Result<Duration, String> {
    let input = input.trim();
    if input.is_empty() {
        return Err("empty duration".to_string());
    }
    if input == "0" {
        return Ok(Duration::ZERO);
    }

    let mut total = 0f64;
    let mut rest = input;
    while !rest.is_empty() {
        let number_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .ok_or_else(|| format!("missing unit in duration \"{}\"", input))?;
        if number_len == 0 {
            return Err(format!("invalid duration \"{}\"", input));
        }
        let number: f64 = rest[..number_len]
            .parse()
            .map_err(|_| format!("invalid duration \"{}\"", input))?;
        rest = &rest[number_len..];

        let unit_len = rest
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(rest.len());
        let seconds_per_unit = match &rest[..unit_len] {
            "ns" => 1e-9,
            "us" | "µs" => 1e-6,
            "ms" => 1e-3,
            "s" => 1.0,
            "m" => 60.0,
            "h" => 3600.0,
            unit => return Err(format!("unknown unit \"{}\" in duration \"{}\"", unit, input)),
        };
        rest = &rest[unit_len..];
        total += number * seconds_per_unit;
    }

    Duration::try_from_secs_f64(total)
        .map_err(|_| format!("duration \"{}\" is out of range", input))
}
