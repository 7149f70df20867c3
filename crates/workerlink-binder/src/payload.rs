use std::collections::BTreeMap;

use serde::Serialize;
use workerlink_value::{to_value, Value, ValueError};

/// Wire key carrying the tag.
pub const TYPE_KEY: &str = "type";
/// Wire key carrying the argument.
pub const ARG_KEY: &str = "arg";

/// A tag plus its argument, sent as `{ type: <tag>, arg: <value> }`.
#[derive(Debug, Clone, PartialEq)]
pub struct TaggedPayload {
    tag: String,
    arg: Value,
}

impl TaggedPayload {
    pub fn new(tag: impl Into<String>, arg: impl Into<Value>) -> Self {
        Self {
            tag: tag.into(),
            arg: arg.into(),
        }
    }

    /// Read a payload off the wire.
    ///
    /// Returns `None` unless `value` is a map with a string `type`. A missing
    /// `arg` reads as [`Value::Undefined`]; other keys are ignored.
    pub fn decode(value: &Value) -> Option<Self> {
        let map = value.as_map()?;
        let tag = map.get(TYPE_KEY)?.as_str()?;
        let arg = map.get(ARG_KEY).cloned().unwrap_or_default();
        Some(Self::new(tag, arg))
    }

    /// Serialize an internally tagged command, e.g. an enum with
    /// `#[serde(tag = "type", content = "arg")]`.
    pub fn from_command<C: Serialize + ?Sized>(command: &C) -> Result<Self, ValueError> {
        let value = to_value(command)?;
        Self::decode(&value).ok_or_else(|| {
            ValueError::Serialize(format!(
                "command serialized to {} without a string '{TYPE_KEY}' field",
                value.type_name()
            ))
        })
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn arg(&self) -> &Value {
        &self.arg
    }

    pub fn into_arg(self) -> Value {
        self.arg
    }

    /// The two-field wire map.
    pub fn into_value(self) -> Value {
        let mut map = BTreeMap::new();
        map.insert(TYPE_KEY.to_string(), Value::String(self.tag));
        map.insert(ARG_KEY.to_string(), self.arg);
        Value::Map(map)
    }
}
