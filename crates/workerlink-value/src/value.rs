use std::collections::BTreeMap;

use bytes::Bytes;

use crate::view::BufferView;

/// A value that can cross a worker channel.
///
/// Maps are keyed by string and ordered by key; insertion order is not
/// preserved.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Array(Vec<Value>),
    Map(BTreeMap<String, Value>),
    /// Raw binary buffer.
    Bytes(Bytes),
    /// Typed view over a binary buffer.
    View(BufferView),
}

impl Value {
    /// Deep copy with the semantics of a structured clone.
    ///
    /// Binary buffers are copied into fresh storage, so the result never
    /// aliases the original.
    pub fn structured_clone(&self) -> Value {
        match self {
            Value::Array(items) => {
                Value::Array(items.iter().map(Value::structured_clone).collect())
            }
            Value::Map(map) => Value::Map(
                map.iter()
                    .map(|(key, value)| (key.clone(), value.structured_clone()))
                    .collect(),
            ),
            Value::Bytes(bytes) => Value::Bytes(Bytes::copy_from_slice(bytes)),
            Value::View(view) => Value::View(view.deep_copy()),
            other => other.clone(),
        }
    }

    /// Short type label for diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Map(_) => "map",
            Value::Bytes(_) => "bytes",
            Value::View(view) => view.kind().name(),
        }
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Look up a key when this value is a map.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_map().and_then(|map| map.get(key))
    }

    /// Build a map value from key/value pairs.
    pub fn map<K, V, I>(entries: I) -> Value
    where
        K: Into<String>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        Value::Map(
            entries
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }
}

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::Null
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Number(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Number(f64::from(v))
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::Number(f64::from(v))
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::Array(v)
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(v: BTreeMap<String, Value>) -> Self {
        Value::Map(v)
    }
}

impl From<Bytes> for Value {
    fn from(v: Bytes) -> Self {
        Value::Bytes(v)
    }
}

impl From<BufferView> for Value {
    fn from(v: BufferView) -> Self {
        Value::View(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::ViewKind;

    #[test]
    fn structured_clone_copies_nested_buffers() {
        let original = Value::map([
            ("raw", Value::Bytes(Bytes::from_static(b"abc"))),
            (
                "list",
                Value::Array(vec![Value::Bytes(Bytes::from(vec![9u8, 8, 7]))]),
            ),
        ]);

        let copy = original.structured_clone();
        assert_eq!(copy, original);

        let raw_ptr = |v: &Value| match v.get("raw") {
            Some(Value::Bytes(b)) => b.as_ptr(),
            other => panic!("expected bytes, got {other:?}"),
        };
        assert_ne!(raw_ptr(&copy), raw_ptr(&original));
    }

    #[test]
    fn map_builder_and_accessors() {
        let value = Value::map([("name", Value::from("Ada")), ("age", Value::from(36))]);
        assert_eq!(value.get("name").and_then(Value::as_str), Some("Ada"));
        assert_eq!(value.get("age").and_then(Value::as_f64), Some(36.0));
        assert!(value.get("missing").is_none());
        assert!(Value::from("x").get("name").is_none());
    }

    #[test]
    fn type_names_cover_views() {
        let view = BufferView::new(ViewKind::Float32, vec![0u8; 8]).expect("two f32s");
        assert_eq!(Value::View(view).type_name(), "Float32Array");
        assert_eq!(Value::Undefined.type_name(), "undefined");
        assert_eq!(Value::from(None::<bool>), Value::Null);
    }
}
