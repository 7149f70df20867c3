//! Serde bridge between typed Rust data and [`Value`].
//!
//! Conversion goes through `serde_json::Value`. Binary buffers surface to
//! serde as sequences of numbers, `Undefined` and non-finite numbers as null.
//! Negative zero surfaces as the integer `0`.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Number};

use crate::error::{Result, ValueError};
use crate::value::Value;

/// Largest integer an `f64` holds exactly.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

/// Serialize any `T` into a [`Value`].
pub fn to_value<T: Serialize + ?Sized>(value: &T) -> Result<Value> {
    let json = serde_json::to_value(value).map_err(|e| ValueError::Serialize(e.to_string()))?;
    from_json(json)
}

/// Deserialize a `T` out of a [`Value`].
pub fn from_value<T: DeserializeOwned>(value: Value) -> Result<T> {
    serde_json::from_value(into_json(value)).map_err(|e| ValueError::Deserialize(e.to_string()))
}

fn from_json(json: serde_json::Value) -> Result<Value> {
    Ok(match json {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(b),
        serde_json::Value::Number(n) => {
            Value::Number(n.as_f64().ok_or(ValueError::UnsupportedNumber)?)
        }
        serde_json::Value::String(s) => Value::String(s),
        serde_json::Value::Array(items) => {
            Value::Array(items.into_iter().map(from_json).collect::<Result<_>>()?)
        }
        serde_json::Value::Object(map) => Value::Map(
            map.into_iter()
                .map(|(key, value)| Ok((key, from_json(value)?)))
                .collect::<Result<_>>()?,
        ),
    })
}

fn into_json(value: Value) -> serde_json::Value {
    match value {
        Value::Undefined | Value::Null => serde_json::Value::Null,
        Value::Bool(b) => serde_json::Value::Bool(b),
        Value::Number(n) => number_to_json(n),
        Value::String(s) => serde_json::Value::String(s),
        Value::Array(items) => {
            serde_json::Value::Array(items.into_iter().map(into_json).collect())
        }
        Value::Map(map) => serde_json::Value::Object(
            map.into_iter()
                .map(|(key, value)| (key, into_json(value)))
                .collect::<Map<_, _>>(),
        ),
        Value::Bytes(bytes) => serde_json::Value::Array(
            bytes
                .iter()
                .map(|b| serde_json::Value::Number(Number::from(*b)))
                .collect(),
        ),
        Value::View(view) => {
            serde_json::Value::Array(view.elements().into_iter().map(number_to_json).collect())
        }
    }
}

// Integral floats become JSON integers so they deserialize into integer types.
// -0.0 is integral and loses its sign.
fn number_to_json(n: f64) -> serde_json::Value {
    if n.fract() == 0.0 && n.abs() <= MAX_SAFE_INTEGER {
        return serde_json::Value::Number(Number::from(n as i64));
    }
    Number::from_f64(n).map_or(serde_json::Value::Null, serde_json::Value::Number)
}
