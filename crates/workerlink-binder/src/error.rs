use workerlink_channel::ChannelError;
use workerlink_value::ValueError;

/// Errors that can occur in binder operations.
#[derive(Debug, thiserror::Error)]
pub enum BindError {
    /// The channel failed to spawn or rejected a message.
    #[error("channel error: {0}")]
    Channel(#[from] ChannelError),

    /// An argument could not be converted to or from a value.
    #[error("value error: {0}")]
    Value(#[from] ValueError),

    /// A tag appears twice in a command or callback table.
    #[error("duplicate tag '{0}'")]
    DuplicateTag(String),

    /// Tags must be non-empty.
    #[error("empty tag")]
    EmptyTag,

    /// The command's tag is not in the binder's command table.
    #[error("command '{0}' is not declared in the command table")]
    UndeclaredCommand(String),
}

pub type Result<T> = std::result::Result<T, BindError>;
