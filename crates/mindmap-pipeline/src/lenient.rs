//! Forgiving field deserializers for model-produced JSON.
//!
//! Models emit numbers as strings, floats for integer coordinates, `null`
//! for empty lists and capitalised enum tags. These helpers coerce such
//! values instead of rejecting the whole document.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

fn scalar_text(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        other => Some(other.to_string()),
    }
}

pub fn string<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(scalar_text(Value::deserialize(d)?).unwrap_or_default())
}

pub fn opt_string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Ok(scalar_text(Value::deserialize(d)?).filter(|s| !s.trim().is_empty()))
}

pub fn string_list<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<String>, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::Array(items) => items.into_iter().filter_map(scalar_text).collect(),
        other => scalar_text(other).into_iter().collect(),
    })
}

fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Non-negative depth; negatives clamp to zero.
pub fn level<'de, D: Deserializer<'de>>(d: D) -> Result<u32, D::Error> {
    let value = Value::deserialize(d)?;
    Ok(as_f64(&value)
        .filter(|v| v.is_finite())
        .map(|v| v.round().clamp(0.0, f64::from(u32::MAX)) as u32)
        .unwrap_or(0))
}

pub fn count<'de, D: Deserializer<'de>>(d: D) -> Result<usize, D::Error> {
    let value = Value::deserialize(d)?;
    Ok(as_f64(&value)
        .filter(|v| v.is_finite() && *v >= 0.0)
        .map(|v| v.round() as usize)
        .unwrap_or(0))
}

/// Integer pixel value; floats are rounded.
pub fn integer<'de, D: Deserializer<'de>>(d: D) -> Result<i64, D::Error> {
    let value = Value::deserialize(d)?;
    if let Some(i) = value.as_i64() {
        return Ok(i);
    }
    Ok(as_f64(&value)
        .filter(|v| v.is_finite())
        .map(|v| v.round() as i64)
        .unwrap_or(0))
}

pub fn flag<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::Bool(b) => b,
        Value::String(s) => s.trim().eq_ignore_ascii_case("true"),
        Value::Number(n) => n.as_f64().is_some_and(|v| v != 0.0),
        _ => false,
    })
}

/// Array of records; `null` or a non-array is empty, and entries that fail
/// to decode (an id-less concept, a non-object) are dropped.
pub fn list<'de, D, T>(d: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    Ok(match Value::deserialize(d)? {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect(),
        _ => Vec::new(),
    })
}

/// Any shape mismatch (including `null`) yields `T::default()`.
pub fn or_default<'de, D, T>(d: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    Ok(serde_json::from_value(Value::deserialize(d)?).unwrap_or_default())
}

/// Case- and separator-insensitive enum tag; anything unparseable is `T::default()`.
pub fn tag<'de, D, T>(d: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = match Value::deserialize(d)? {
        Value::String(s) => Value::String(s.trim().to_lowercase().replace(['-', ' '], "_")),
        other => other,
    };
    Ok(serde_json::from_value(value).unwrap_or_default())
}
