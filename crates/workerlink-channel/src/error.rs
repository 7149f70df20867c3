/// Errors that can occur on a worker channel.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    /// The worker thread could not be started.
    #[error("failed to spawn worker: {0}")]
    Spawn(#[source] std::io::Error),

    /// The handle has been terminated by its owner.
    #[error("worker terminated")]
    Terminated,

    /// The worker program has exited and no longer receives messages.
    #[error("worker disconnected")]
    Disconnected,
}

pub type Result<T> = std::result::Result<T, ChannelError>;
