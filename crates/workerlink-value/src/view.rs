//! Typed views over binary buffers.

use std::fmt;

use bytes::Bytes;

use crate::error::{Result, ValueError};

/// Element type of a [`BufferView`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewKind {
    Int8,
    Uint8,
    Uint8Clamped,
    Int16,
    Uint16,
    Int32,
    Uint32,
    Float32,
    Float64,
}

impl ViewKind {
    /// Width of one element in bytes.
    pub fn element_size(self) -> usize {
        match self {
            ViewKind::Int8 | ViewKind::Uint8 | ViewKind::Uint8Clamped => 1,
            ViewKind::Int16 | ViewKind::Uint16 => 2,
            ViewKind::Int32 | ViewKind::Uint32 | ViewKind::Float32 => 4,
            ViewKind::Float64 => 8,
        }
    }

    /// Conventional array-type name, e.g. `Float32Array`.
    pub fn name(self) -> &'static str {
        match self {
            ViewKind::Int8 => "Int8Array",
            ViewKind::Uint8 => "Uint8Array",
            ViewKind::Uint8Clamped => "Uint8ClampedArray",
            ViewKind::Int16 => "Int16Array",
            ViewKind::Uint16 => "Uint16Array",
            ViewKind::Int32 => "Int32Array",
            ViewKind::Uint32 => "Uint32Array",
            ViewKind::Float32 => "Float32Array",
            ViewKind::Float64 => "Float64Array",
        }
    }

    fn decode(self, chunk: &[u8]) -> f64 {
        match self {
            ViewKind::Int8 => f64::from(chunk[0] as i8),
            ViewKind::Uint8 | ViewKind::Uint8Clamped => f64::from(chunk[0]),
            ViewKind::Int16 => f64::from(i16::from_le_bytes([chunk[0], chunk[1]])),
            ViewKind::Uint16 => f64::from(u16::from_le_bytes([chunk[0], chunk[1]])),
            ViewKind::Int32 => {
                f64::from(i32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            }
            ViewKind::Uint32 => {
                f64::from(u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            }
            ViewKind::Float32 => {
                f64::from(f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            }
            ViewKind::Float64 => {
                let mut raw = [0u8; 8];
                raw.copy_from_slice(chunk);
                f64::from_le_bytes(raw)
            }
        }
    }
}

impl fmt::Display for ViewKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A typed, little-endian view over an owned byte buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct BufferView {
    kind: ViewKind,
    bytes: Bytes,
}

impl BufferView {
    /// Wrap `bytes` as a view of `kind`.
    ///
    /// Fails when the byte length is not a multiple of the element width.
    pub fn new(kind: ViewKind, bytes: impl Into<Bytes>) -> Result<Self> {
        let bytes = bytes.into();
        if bytes.len() % kind.element_size() != 0 {
            return Err(ValueError::ViewLength {
                kind,
                len: bytes.len(),
            });
        }
        Ok(Self { kind, bytes })
    }

    /// Build a `Float64Array` view from native floats.
    pub fn from_f64s(values: &[f64]) -> Self {
        let bytes: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        Self {
            kind: ViewKind::Float64,
            bytes: Bytes::from(bytes),
        }
    }

    pub fn kind(&self) -> ViewKind {
        self.kind
    }

    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    /// Number of elements in the view.
    pub fn len(&self) -> usize {
        self.bytes.len() / self.kind.element_size()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Decode every element as `f64`.
    pub fn elements(&self) -> Vec<f64> {
        self.bytes
            .chunks_exact(self.kind.element_size())
            .map(|chunk| self.kind.decode(chunk))
            .collect()
    }

    /// Copy into a view with fresh backing storage.
    pub(crate) fn deep_copy(&self) -> Self {
        Self {
            kind: self.kind,
            bytes: Bytes::copy_from_slice(&self.bytes),
        }
    }
}
