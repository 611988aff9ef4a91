//! Heap storage: slotted pages of fixed-size tuples and the files that
//! hold them.
//!
//! The term "heap" refers to an unordered collection of tuples, as
//! opposed to indexed structures.
//!
//! - [`HeapPage`]: the slotted-page binary codec with a presence bitmap
//! - [`HeapFile`]: a file of pages with a lazy cross-page tuple cursor
//! - [`HeapScan`]: the cursor itself (explicit open/rewind/close protocol)
//! - [`RecordId`]: the (page, slot) location tag carried by stored tuples

mod error;
mod file;
mod page;
mod scan;

pub use error::HeapError;
pub use file::HeapFile;
pub use page::{header_size, slots_per_page, HeapPage, HeapPageIter, RecordId, SlotId};
pub use scan::HeapScan;
