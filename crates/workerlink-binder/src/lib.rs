//! Typed command dispatch and callback routing over a worker channel.
//!
//! A [`ChannelBinder`] owns one [`ChannelHandle`](workerlink_channel::ChannelHandle)
//! for its lifetime. On first activation it creates the handle and attaches a
//! receive listener that routes inbound `{type, arg}` payloads to the
//! [`CallbackTable`] by tag. For every tag in its [`CommandTable`] it hands out
//! a [`CommandFn`] that wraps an argument with the tag and posts it.
//!
//! Sends are best-effort: before activation and after [`destroy`](ChannelBinder::destroy)
//! they are dropped without error. Inbound payloads with no registered
//! callback are ignored.

pub mod binder;
pub mod callbacks;
pub mod commands;
pub mod config;
pub mod error;
pub mod payload;

pub use binder::{BinderState, ChannelBinder};
pub use callbacks::{Callback, CallbackTable};
pub use commands::{CommandFn, CommandFns, CommandSet, CommandTable};
pub use config::{BinderConfig, Teardown};
pub use error::{BindError, Result};
pub use payload::TaggedPayload;
