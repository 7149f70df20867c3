//! Structured-clone value model for worker message channels.
//!
//! Everything that crosses a worker channel is a [`Value`]: an owned tree of
//! primitives, sequences, string-keyed maps and binary buffers. Owned trees
//! cannot carry functions, live references or cycles, so every `Value`
//! survives a structured-clone copy.
//!
//! Typed Rust data moves in and out through [`to_value`] and [`from_value`].

pub mod convert;
pub mod error;
pub mod value;
pub mod view;

pub use convert::{from_value, to_value};
pub use error::{Result, ValueError};
pub use value::Value;
pub use view::{BufferView, ViewKind};
