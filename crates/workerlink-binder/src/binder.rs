use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use tracing::{debug, info, trace};
use workerlink_channel::{ChannelHandle, Listener, ListenerId, MessageEvent};
use workerlink_value::Value;

use crate::callbacks::CallbackTable;
use crate::commands::{CommandFn, CommandFns, CommandSet, CommandTable, Outbound};
use crate::config::{BinderConfig, Teardown};
use crate::error::{BindError, Result};
use crate::payload::TaggedPayload;

type Factory<H> = Box<dyn FnOnce() -> workerlink_channel::Result<H> + Send>;

/// Lifecycle of a [`ChannelBinder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinderState {
    /// No handle yet.
    Uninitialized,
    /// Handle created. The receive listener is attached right after.
    Active,
    /// Torn down. Terminal.
    Destroyed,
}

impl BinderState {
    pub fn as_str(self) -> &'static str {
        match self {
            BinderState::Uninitialized => "uninitialized",
            BinderState::Active => "active",
            BinderState::Destroyed => "destroyed",
        }
    }
}

impl fmt::Display for BinderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

struct Slot<H> {
    state: BinderState,
    factory: Option<Factory<H>>,
    handle: Option<Arc<H>>,
    listener: Option<ListenerId>,
}

/// State shared between the binder and the senders it hands out.
struct Shared<H> {
    slot: Mutex<Slot<H>>,
}

impl<H> Shared<H> {
    fn lock(&self) -> MutexGuard<'_, Slot<H>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<H: ChannelHandle> Outbound for Shared<H> {
    fn post(&self, tag: &str, arg: Value) -> Result<()> {
        let (state, handle) = {
            let slot = self.lock();
            (slot.state, slot.handle.clone())
        };
        let Some(handle) = handle else {
            trace!(tag, %state, "binder not active, send dropped");
            return Ok(());
        };
        handle.post_message(TaggedPayload::new(tag, arg).into_value())?;
        Ok(())
    }
}

/// Binds one worker channel to its owner's lifecycle.
///
/// The handle is created lazily by [`initialize`](Self::initialize) and
/// released by [`destroy`](Self::destroy) or on drop. Every method takes
/// `&self`, so a binder can be shared with its own callbacks.
pub struct ChannelBinder<H: ChannelHandle> {
    shared: Arc<Shared<H>>,
    commands: CommandTable,
    callbacks: Arc<RwLock<CallbackTable>>,
    config: BinderConfig,
}

impl<H: ChannelHandle> ChannelBinder<H> {
    /// Create an uninitialized binder. `factory` runs at most once, on the
    /// first [`initialize`](Self::initialize).
    pub fn new<F>(factory: F, commands: CommandTable, callbacks: CallbackTable) -> Self
    where
        F: FnOnce() -> workerlink_channel::Result<H> + Send + 'static,
    {
        Self::with_config(factory, commands, callbacks, BinderConfig::default())
    }

    /// Create with explicit configuration.
    pub fn with_config<F>(
        factory: F,
        commands: CommandTable,
        callbacks: CallbackTable,
        config: BinderConfig,
    ) -> Self
    where
        F: FnOnce() -> workerlink_channel::Result<H> + Send + 'static,
    {
        Self {
            shared: Arc::new(Shared {
                slot: Mutex::new(Slot {
                    state: BinderState::Uninitialized,
                    factory: Some(Box::new(factory)),
                    handle: None,
                    listener: None,
                }),
            }),
            commands,
            callbacks: Arc::new(RwLock::new(callbacks)),
            config,
        }
    }

    /// Create the handle and attach the receive listener.
    ///
    /// Only the first call does anything. A factory error is returned and
    /// leaves the binder uninitialized with no way to retry.
    pub fn initialize(&self) -> Result<()> {
        let factory = {
            let mut slot = self.shared.lock();
            if slot.state != BinderState::Uninitialized {
                debug!(state = %slot.state, "initialize ignored");
                return Ok(());
            }
            match slot.factory.take() {
                Some(factory) => factory,
                None => {
                    debug!("initialize ignored, factory already used");
                    return Ok(());
                }
            }
        };

        let handle = Arc::new(factory()?);

        // Active before the listener attaches: a handle may deliver queued
        // messages from inside `add_listener`, and their callbacks may send.
        {
            let mut slot = self.shared.lock();
            if slot.state == BinderState::Destroyed {
                drop(slot);
                debug!("destroyed during initialize, releasing new handle");
                self.release(&handle, None);
                return Ok(());
            }
            slot.state = BinderState::Active;
            slot.handle = Some(handle.clone());
        }

        let listener = handle.add_listener(receive_listener(self.callbacks.clone()));

        let mut slot = self.shared.lock();
        if slot.state == BinderState::Destroyed {
            // destroy already released the handle but had no listener to detach.
            drop(slot);
            debug!(listener = %listener, "destroyed while attaching, detaching listener");
            handle.remove_listener(listener);
            return Ok(());
        }
        slot.listener = Some(listener);
        drop(slot);

        info!(
            commands = self.commands.len(),
            callbacks = self.read_callbacks().len(),
            "channel binder active"
        );
        Ok(())
    }

    /// Replace the callback table, then [`initialize`](Self::initialize).
    pub fn activate(&self, callbacks: CallbackTable) -> Result<()> {
        self.set_callbacks(callbacks);
        self.initialize()
    }

    /// Swap the callback table. The attached listener sees the new table on
    /// its next event without being re-registered.
    pub fn set_callbacks(&self, callbacks: CallbackTable) {
        let mut table = self.callbacks.write().unwrap_or_else(PoisonError::into_inner);
        *table = callbacks;
        debug!(callbacks = table.len(), "callback table replaced");
    }

    /// Sender for one declared tag.
    pub fn command(&self, tag: &str) -> Option<CommandFn> {
        self.commands
            .contains(tag)
            .then(|| CommandFn::new(tag, self.outbound()))
    }

    /// One sender per declared tag.
    pub fn commands(&self) -> CommandFns {
        CommandFns::new(
            self.commands
                .tags()
                .map(|tag| CommandFn::new(tag, self.outbound()))
                .collect(),
        )
    }

    /// Post a typed command from a [`CommandSet`].
    pub fn dispatch<C: CommandSet>(&self, command: &C) -> Result<()> {
        let payload = TaggedPayload::from_command(command)?;
        let tag = payload.tag().to_string();
        if !self.commands.contains(&tag) {
            return Err(BindError::UndeclaredCommand(tag));
        }
        self.shared.post(&tag, payload.into_arg())
    }

    /// Detach the listener, drop the handle and apply the teardown policy.
    /// Idempotent.
    pub fn destroy(&self) {
        let (handle, listener) = {
            let mut slot = self.shared.lock();
            if slot.state == BinderState::Destroyed {
                debug!("destroy ignored, already destroyed");
                return;
            }
            slot.state = BinderState::Destroyed;
            slot.factory = None;
            (slot.handle.take(), slot.listener.take())
        };

        if let Some(handle) = handle {
            self.release(&handle, listener);
        }
        info!(teardown = ?self.config.teardown, "channel binder destroyed");
    }

    pub fn state(&self) -> BinderState {
        self.shared.lock().state
    }

    pub fn is_active(&self) -> bool {
        self.state() == BinderState::Active
    }

    pub fn command_table(&self) -> &CommandTable {
        &self.commands
    }

    pub fn config(&self) -> &BinderConfig {
        &self.config
    }

    fn outbound(&self) -> Arc<dyn Outbound> {
        self.shared.clone()
    }

    fn read_callbacks(&self) -> std::sync::RwLockReadGuard<'_, CallbackTable> {
        self.callbacks.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn release(&self, handle: &H, listener: Option<ListenerId>) {
        if let Some(id) = listener {
            handle.remove_listener(id);
        }
        if self.config.teardown == Teardown::Terminate {
            handle.terminate();
        }
    }
}

impl<H: ChannelHandle> Drop for ChannelBinder<H> {
    fn drop(&mut self) {
        self.destroy();
    }
}

impl<H: ChannelHandle> fmt::Debug for ChannelBinder<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChannelBinder")
            .field("state", &self.state())
            .field("commands", &self.commands)
            .field("config", &self.config)
            .finish()
    }
}

fn receive_listener(callbacks: Arc<RwLock<CallbackTable>>) -> Listener {
    Arc::new(move |event: &MessageEvent| {
        let Some(payload) = TaggedPayload::decode(event.data()) else {
            trace!(kind = event.data().type_name(), "untagged message ignored");
            return;
        };
        let callback = callbacks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(payload.tag());
        match callback {
            Some(callback) => callback(payload.into_arg()),
            None => trace!(tag = payload.tag(), "no callback for tag, message ignored"),
        }
    })
}
