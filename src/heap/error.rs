//! Error types for the heap module.

use std::fmt;

use crate::datum::SerializationError;
use crate::storage::{PageId, TableId};

/// Errors from heap page and heap file operations.
///
/// None of these are retried within this crate; retry of transient I/O,
/// if any, belongs to the external cache/transaction layer.
#[derive(Debug)]
pub enum HeapError {
    /// Page decode encountered a truncated or malformed byte stream.
    ///
    /// Fatal for that page; a partial decode never yields a
    /// partially-populated page.
    CorruptPage {
        /// Page that failed to decode.
        page: PageId,
        /// What went wrong.
        reason: String,
    },
    /// Slot index out of range.
    SlotOutOfBounds {
        /// Requested slot.
        slot: u16,
        /// Number of slots on the page.
        slot_count: usize,
    },
    /// Scan protocol violation: advanced before `open` or after `close`.
    ScanNotOpen,
    /// Explicitly unimplemented operation invoked.
    NotSupported(&'static str),
    /// Page fetch for a table the catalog does not know.
    UnknownTable(TableId),
    /// Field encode failed while serializing a page.
    Serialization(SerializationError),
    /// I/O error from the underlying file.
    Io(std::io::Error),
}

impl fmt::Display for HeapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeapError::CorruptPage { page, reason } => {
                write!(
                    f,
                    "corrupt page {}/{}: {}",
                    page.table.as_u32(),
                    page.page_no,
                    reason
                )
            }
            HeapError::SlotOutOfBounds { slot, slot_count } => {
                write!(f, "slot {} out of bounds for {} slots", slot, slot_count)
            }
            HeapError::ScanNotOpen => {
                write!(f, "scan is not open")
            }
            HeapError::NotSupported(op) => {
                write!(f, "operation not supported: {}", op)
            }
            HeapError::UnknownTable(table) => {
                write!(f, "unknown table {}", table.as_u32())
            }
            HeapError::Serialization(err) => {
                write!(f, "serialization error: {}", err)
            }
            HeapError::Io(err) => {
                write!(f, "I/O error: {}", err)
            }
        }
    }
}

impl std::error::Error for HeapError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            HeapError::Serialization(err) => Some(err),
            HeapError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for HeapError {
    fn from(err: std::io::Error) -> Self {
        HeapError::Io(err)
    }
}

impl From<SerializationError> for HeapError {
    fn from(err: SerializationError) -> Self {
        HeapError::Serialization(err)
    }
}
