use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use tracing::warn;
use workerlink_value::{from_value, Value};

use crate::error::{BindError, Result};

/// Handler for one inbound tag.
pub type Callback = Arc<dyn Fn(Value) + Send + Sync>;

/// Inbound routing table: tag to handler.
#[derive(Clone, Default)]
pub struct CallbackTable {
    entries: HashMap<String, Callback>,
}

impl CallbackTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn on<F>(mut self, tag: impl Into<String>, handler: F) -> Result<Self>
    where
        F: Fn(Value) + Send + Sync + 'static,
    {
        self.insert(tag, handler)?;
        Ok(self)
    }

    /// Register a handler that receives the argument decoded as `T`.
    ///
    /// Arguments that do not decode are logged and dropped.
    pub fn on_typed<T, F>(self, tag: impl Into<String>, handler: F) -> Result<Self>
    where
        T: DeserializeOwned,
        F: Fn(T) + Send + Sync + 'static,
    {
        let tag = tag.into();
        let label = tag.clone();
        self.on(tag, move |arg: Value| match from_value::<T>(arg) {
            Ok(decoded) => handler(decoded),
            Err(err) => warn!(tag = %label, error = %err, "callback argument did not decode"),
        })
    }

    /// Register `handler` for `tag`. Each tag may be registered once.
    pub fn insert<F>(&mut self, tag: impl Into<String>, handler: F) -> Result<()>
    where
        F: Fn(Value) + Send + Sync + 'static,
    {
        let tag = tag.into();
        if tag.is_empty() {
            return Err(BindError::EmptyTag);
        }
        if self.entries.contains_key(&tag) {
            return Err(BindError::DuplicateTag(tag));
        }
        self.entries.insert(tag, Arc::new(handler));
        Ok(())
    }

    pub fn get(&self, tag: &str) -> Option<Callback> {
        self.entries.get(tag).cloned()
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.entries.contains_key(tag)
    }

    /// Registered tags, sorted.
    pub fn tags(&self) -> Vec<&str> {
        let mut tags: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        tags.sort_unstable();
        tags
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for CallbackTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackTable")
            .field("tags", &self.tags())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use serde::Deserialize;

    use super::*;

    #[test]
    fn rejects_duplicate_and_empty_tags() {
        let table = CallbackTable::new().on("ack", |_| {}).expect("first ack");
        assert!(matches!(
            table.clone().on("ack", |_| {}),
            Err(BindError::DuplicateTag(tag)) if tag == "ack"
        ));
        assert!(matches!(table.on("", |_| {}), Err(BindError::EmptyTag)));
    }

    #[test]
    fn get_returns_registered_handler() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let table = CallbackTable::new()
            .on("ack", move |arg| sink.lock().expect("sink").push(arg))
            .expect("register ack");

        let callback = table.get("ack").expect("ack registered");
        callback(Value::from("hello"));
        assert!(table.get("other").is_none());
        assert_eq!(*seen.lock().expect("seen"), vec![Value::from("hello")]);
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Progress {
        done: u32,
        total: u32,
    }

    #[test]
    fn typed_handler_decodes_and_skips_bad_arguments() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let table = CallbackTable::new()
            .on_typed("progress", move |p: Progress| sink.lock().expect("sink").push(p))
            .expect("register progress");

        let callback = table.get("progress").expect("progress registered");
        callback(Value::map([("done", 1), ("total", 4)]));
        callback(Value::from("not progress"));

        assert_eq!(
            *seen.lock().expect("seen"),
            vec![Progress { done: 1, total: 4 }]
        );
    }

    #[test]
    fn tags_are_sorted() {
        let table = CallbackTable::new()
            .on("b", |_| {})
            .and_then(|t| t.on("a", |_| {}))
            .expect("register");
        assert_eq!(table.tags(), vec!["a", "b"]);
        assert_eq!(format!("{table:?}"), r#"CallbackTable { tags: ["a", "b"] }"#);
    }
}
