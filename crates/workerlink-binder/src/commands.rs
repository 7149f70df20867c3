use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use workerlink_value::{to_value, Value};

use crate::error::{BindError, Result};

/// A compile-time set of commands.
///
/// Implement on a serde enum tagged as `#[serde(tag = "type", content = "arg")]`
/// so every variant serializes to the wire shape. `TAGS` lists the serialized
/// variant names.
pub trait CommandSet: Serialize {
    const TAGS: &'static [&'static str];
}

/// Ordered set of outbound command tags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandTable {
    tags: Vec<String>,
}

impl CommandTable {
    /// Build from tags. Tags must be unique and non-empty.
    pub fn new<I, S>(tags: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut table = Self::default();
        for tag in tags {
            let tag = tag.into();
            if tag.is_empty() {
                return Err(BindError::EmptyTag);
            }
            if table.contains(&tag) {
                return Err(BindError::DuplicateTag(tag));
            }
            table.tags.push(tag);
        }
        Ok(table)
    }

    /// Build from a [`CommandSet`].
    pub fn of<C: CommandSet>() -> Result<Self> {
        Self::new(C::TAGS.iter().copied())
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Tags in declaration order.
    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.tags.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}

/// Where a [`CommandFn`] posts its payloads.
pub(crate) trait Outbound: Send + Sync {
    fn post(&self, tag: &str, arg: Value) -> Result<()>;
}

/// Sender for one command tag.
///
/// Cheap to clone. Calls after the binder is destroyed are silently dropped.
#[derive(Clone)]
pub struct CommandFn {
    tag: Arc<str>,
    outbound: Arc<dyn Outbound>,
}

impl CommandFn {
    pub(crate) fn new(tag: &str, outbound: Arc<dyn Outbound>) -> Self {
        Self {
            tag: Arc::from(tag),
            outbound,
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Post `{ type: tag, arg }`.
    pub fn call(&self, arg: impl Into<Value>) -> Result<()> {
        self.outbound.post(&self.tag, arg.into())
    }

    /// Serialize `arg` and post it.
    pub fn call_with<T: Serialize + ?Sized>(&self, arg: &T) -> Result<()> {
        self.call(to_value(arg)?)
    }
}

impl fmt::Debug for CommandFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandFn").field("tag", &self.tag).finish()
    }
}

/// One [`CommandFn`] per declared tag, in declaration order.
#[derive(Debug, Clone, Default)]
pub struct CommandFns {
    fns: Vec<CommandFn>,
}

impl CommandFns {
    pub(crate) fn new(fns: Vec<CommandFn>) -> Self {
        Self { fns }
    }

    pub fn get(&self, tag: &str) -> Option<&CommandFn> {
        self.fns.iter().find(|f| f.tag() == tag)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CommandFn> {
        self.fns.iter()
    }

    pub fn len(&self) -> usize {
        self.fns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fns.is_empty()
    }
}

impl<'a> IntoIterator for &'a CommandFns {
    type Item = &'a CommandFn;
    type IntoIter = std::slice::Iter<'a, CommandFn>;

    fn into_iter(self) -> Self::IntoIter {
        self.fns.iter()
    }
}
