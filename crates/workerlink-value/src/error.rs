use crate::view::ViewKind;

/// Errors that can occur while building or converting values.
#[derive(Debug, thiserror::Error)]
pub enum ValueError {
    /// A Rust value could not be turned into a [`Value`](crate::Value).
    #[error("cannot serialize into value: {0}")]
    Serialize(String),

    /// A [`Value`](crate::Value) did not match the requested Rust type.
    #[error("cannot deserialize from value: {0}")]
    Deserialize(String),

    /// A number has no `f64` representation.
    #[error("number is not representable as f64")]
    UnsupportedNumber,

    /// Buffer length is not a whole number of view elements.
    #[error("{len} bytes is not a multiple of the {kind} element width")]
    ViewLength { kind: ViewKind, len: usize },
}

pub type Result<T> = std::result::Result<T, ValueError>;
