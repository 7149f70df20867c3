use std::sync::Arc;

use workerlink_value::Value;

use crate::error::Result;
use crate::event::{Listener, ListenerId};

/// A live bidirectional endpoint to a background worker.
///
/// Sends are fire-and-forget. Values are copied with structured-clone
/// semantics, so nothing posted shares storage with the sender's copy.
/// Delivery in each direction is FIFO.
pub trait ChannelHandle: Send + Sync + 'static {
    /// Post a value to the worker.
    fn post_message(&self, message: Value) -> Result<()>;

    /// Register a receive listener. Listeners run in registration order on
    /// the thread that delivers the event.
    fn add_listener(&self, listener: Listener) -> ListenerId;

    /// Remove a listener. Returns `false` if it was not registered.
    fn remove_listener(&self, id: ListenerId) -> bool;

    /// Stop the worker. Idempotent.
    fn terminate(&self);
}

impl<T: ChannelHandle + ?Sized> ChannelHandle for Arc<T> {
    fn post_message(&self, message: Value) -> Result<()> {
        (**self).post_message(message)
    }

    fn add_listener(&self, listener: Listener) -> ListenerId {
        (**self).add_listener(listener)
    }

    fn remove_listener(&self, id: ListenerId) -> bool {
        (**self).remove_listener(id)
    }

    fn terminate(&self) {
        (**self).terminate()
    }
}
