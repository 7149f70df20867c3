//! Typed command and callback binding for background-worker message channels.
//!
//! workerlink turns an untyped `postMessage`-style channel into a set of
//! per-tag senders and a tag-routed callback table, tied to an explicit
//! owner lifecycle.
//!
//! # Crate Structure
//!
//! - [`value`]: Structured-clone value model and serde bridge
//! - [`channel`]: Channel handle trait and the thread-backed worker
//! - [`binder`]: The channel binder, command and callback tables
//! - [`logging`]: `tracing-subscriber` setup (behind `logging` feature)

/// Re-export value types.
pub mod value {
    pub use workerlink_value::*;
}

/// Re-export channel types.
pub mod channel {
    pub use workerlink_channel::*;
}

/// Re-export binder types.
pub mod binder {
    pub use workerlink_binder::*;
}

#[cfg(feature = "logging")]
pub mod logging;

pub use workerlink_binder::{
    BindError, BinderConfig, BinderState, CallbackTable, ChannelBinder, CommandFn, CommandFns,
    CommandSet, CommandTable, TaggedPayload, Teardown,
};
pub use workerlink_channel::{ChannelHandle, ThreadWorker, WorkerConfig, WorkerScope};
pub use workerlink_value::Value;
