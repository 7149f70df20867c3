//! postMessage-style channel handles.
//!
//! A [`ChannelHandle`] is the live endpoint between an owner and its
//! background worker: post a [`Value`](workerlink_value::Value) one way,
//! register listeners for values coming back the other way.
//!
//! [`ThreadWorker`] is the bundled implementation. It runs the worker program
//! on its own OS thread and delivers replies from a second thread.

pub mod error;
pub mod event;
mod listeners;
pub mod traits;
pub mod worker;

pub use error::{ChannelError, Result};
pub use event::{Listener, ListenerId, MessageEvent};
pub use traits::ChannelHandle;
pub use worker::{ThreadWorker, WorkerConfig, WorkerScope};
