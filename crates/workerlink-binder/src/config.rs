/// What [`destroy`](crate::ChannelBinder::destroy) does to the worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Teardown {
    /// Detach the listener and terminate the worker.
    #[default]
    Terminate,
    /// Detach the listener only. The worker keeps running for whoever else
    /// holds the handle.
    Detach,
}

/// Binder behavior config.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BinderConfig {
    pub teardown: Teardown,
}
