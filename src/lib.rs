//! heapstore: the on-disk and in-memory representation layer of a
//! relational storage engine.
//!
//! The crate defines a fixed-width tuple schema ([`schema::Schema`]), a
//! tuple value container ([`tuple::Tuple`]), a slotted-page binary codec
//! with a presence bitmap ([`heap::HeapPage`]), and a file-backed page
//! sequence with a lazy cross-page tuple cursor ([`heap::HeapFile`]).
//! Buffer pooling, the full catalog, and transaction management are
//! external collaborators, consumed through the boundary traits in
//! [`cache`] and [`catalog`].

pub mod cache;
pub mod catalog;
pub mod datum;
pub mod heap;
pub mod schema;
pub mod storage;
pub mod tuple;
pub mod tx;
