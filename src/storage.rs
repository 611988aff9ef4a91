//! Storage layer types for page-based files.
//!
//! All persistent data lives in fixed-size pages. This module defines the
//! page size constant and the identifier types shared by the heap file
//! and page codec.

pub mod page;

pub use page::{PageId, TableId, PAGE_SIZE};
