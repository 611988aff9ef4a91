//! Page identifiers and size constants.

/// Page size in bytes, identical for every page in every file.
pub const PAGE_SIZE: usize = 4096;

/// Unique identifier for a table.
///
/// Derived from a stable hash of the canonical path of the table's backing
/// file, so the same file always yields the same id across process runs.
/// The id is never stored in the file itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TableId(pub u32);

impl TableId {
    /// Creates a table id from its raw value.
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Returns the raw id value.
    pub const fn as_u32(&self) -> u32 {
        self.0
    }
}

/// Unique identifier for a page: the owning table plus the page number
/// within that table's file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PageId {
    /// Table owning this page.
    pub table: TableId,
    /// Zero-based page number within the file.
    pub page_no: u32,
}

impl PageId {
    /// Creates a new page identifier.
    pub const fn new(table: TableId, page_no: u32) -> Self {
        Self { table, page_no }
    }

    /// Calculates the byte offset of this page within its file.
    pub const fn byte_offset(&self) -> u64 {
        self.page_no as u64 * PAGE_SIZE as u64
    }
}
