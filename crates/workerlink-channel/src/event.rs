use std::fmt;
use std::sync::Arc;

use workerlink_value::Value;

/// A message delivered from the worker to the owner.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageEvent {
    data: Value,
}

impl MessageEvent {
    pub fn new(data: Value) -> Self {
        Self { data }
    }

    /// The delivered value.
    pub fn data(&self) -> &Value {
        &self.data
    }

    pub fn into_data(self) -> Value {
        self.data
    }
}

/// Receive callback registered on a [`ChannelHandle`](crate::ChannelHandle).
pub type Listener = Arc<dyn Fn(&MessageEvent) + Send + Sync>;

/// Identifies a registered listener for later removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

impl ListenerId {
    /// Wrap a raw id. Handles allocate these; ids must be unique per handle.
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener-{}", self.0)
    }
}
