//! Field types and values.
//!
//! This module defines the closed type system for stored tuples. [`Type`]
//! enumerates the supported field kinds, each with a fixed on-disk width,
//! and [`Value`] represents a single typed field value with its
//! fixed-width binary codec.
//!
//! Every field encoding is fixed-size so that a whole tuple has a fixed
//! size and pages can derive their slot count from the schema alone.

use std::fmt;

use bytes::{Buf, BufMut};

/// Fixed capacity of the payload region of a stored string, in bytes.
///
/// Strings are stored as a 4-byte length prefix followed by exactly this
/// many payload bytes, so every string field occupies
/// `4 + STRING_CAPACITY` bytes regardless of its logical length.
pub const STRING_CAPACITY: usize = 128;

/// Errors from field serialization/deserialization.
#[derive(Debug)]
pub enum SerializationError {
    /// Buffer too small for the operation.
    BufferTooSmall {
        /// Bytes required.
        required: usize,
        /// Bytes available.
        available: usize,
    },
    /// Invalid data format.
    InvalidFormat(String),
}

impl fmt::Display for SerializationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SerializationError::BufferTooSmall {
                required,
                available,
            } => {
                write!(
                    f,
                    "buffer too small: need {} bytes, have {}",
                    required, available
                )
            }
            SerializationError::InvalidFormat(msg) => {
                write!(f, "invalid format: {}", msg)
            }
        }
    }
}

impl std::error::Error for SerializationError {}

fn ensure_remaining(buf: &impl Buf, required: usize) -> Result<(), SerializationError> {
    if buf.remaining() < required {
        return Err(SerializationError::BufferTooSmall {
            required,
            available: buf.remaining(),
        });
    }
    Ok(())
}

/// Stored field type.
///
/// This is a closed enum: every variant carries a fixed byte width, and
/// the page codec dispatches on it for field encode/decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Type {
    /// 4-byte signed integer.
    Int,
    /// Fixed-capacity string (4-byte length prefix + [`STRING_CAPACITY`] bytes).
    String,
}

impl Type {
    /// Returns the fixed on-disk size of a field of this type, in bytes.
    pub const fn size_in_bytes(self) -> usize {
        match self {
            Type::Int => 4,
            Type::String => 4 + STRING_CAPACITY,
        }
    }

    /// Returns the zero value for this type.
    ///
    /// Used to populate freshly constructed tuples: `0` for Int, the
    /// empty string for String.
    pub fn zero_value(self) -> Value {
        match self {
            Type::Int => Value::Int(0),
            Type::String => Value::String(String::new()),
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Type::Int => "int",
            Type::String => "string",
        };
        write!(f, "{}", name)
    }
}

/// A typed field value.
///
/// All field encodings are little-endian and fixed-width; see
/// [`Type::size_in_bytes`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// 4-byte signed integer.
    Int(i32),
    /// String of up to [`STRING_CAPACITY`] bytes.
    String(String),
}

impl Value {
    /// Returns the type of this value.
    pub fn value_type(&self) -> Type {
        match self {
            Value::Int(_) => Type::Int,
            Value::String(_) => Type::String,
        }
    }

    /// Writes this value's fixed-width encoding to `buf`.
    ///
    /// Int writes 4 bytes. String writes a 4-byte length prefix followed
    /// by the payload and zero padding up to [`STRING_CAPACITY`] bytes.
    ///
    /// # Errors
    ///
    /// Returns `SerializationError::InvalidFormat` if a string exceeds
    /// [`STRING_CAPACITY`] bytes.
    pub fn write(&self, buf: &mut impl BufMut) -> Result<(), SerializationError> {
        match self {
            Value::Int(n) => {
                buf.put_i32_le(*n);
            }
            Value::String(s) => {
                let data = s.as_bytes();
                if data.len() > STRING_CAPACITY {
                    return Err(SerializationError::InvalidFormat(format!(
                        "string of {} bytes exceeds capacity {}",
                        data.len(),
                        STRING_CAPACITY
                    )));
                }
                buf.put_u32_le(data.len() as u32);
                buf.put_slice(data);
                buf.put_bytes(0, STRING_CAPACITY - data.len());
            }
        }
        Ok(())
    }

    /// Reads one fixed-width value of type `ty` from `buf`.
    ///
    /// Always consumes exactly `ty.size_in_bytes()` bytes on success.
    ///
    /// # Errors
    ///
    /// Returns `SerializationError::BufferTooSmall` if the buffer is
    /// exhausted, and `SerializationError::InvalidFormat` for a length
    /// prefix above capacity or non-UTF-8 string payload.
    pub fn read(buf: &mut impl Buf, ty: Type) -> Result<Self, SerializationError> {
        ensure_remaining(buf, ty.size_in_bytes())?;
        match ty {
            Type::Int => Ok(Value::Int(buf.get_i32_le())),
            Type::String => {
                let len = buf.get_u32_le() as usize;
                if len > STRING_CAPACITY {
                    return Err(SerializationError::InvalidFormat(format!(
                        "string length prefix {} exceeds capacity {}",
                        len, STRING_CAPACITY
                    )));
                }
                let mut payload = [0u8; STRING_CAPACITY];
                buf.copy_to_slice(&mut payload);
                let s = std::str::from_utf8(&payload[..len])
                    .map_err(|e| SerializationError::InvalidFormat(e.to_string()))?;
                Ok(Value::String(s.to_string()))
            }
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(n) => write!(f, "{}", n),
            Value::String(s) => write!(f, "{}", s),
        }
    }
}
