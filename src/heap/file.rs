//! File-backed heap of fixed-size pages.
//!
//! A [`HeapFile`] stores a table's tuples in no particular order, as a
//! plain concatenation of [`PAGE_SIZE`] byte pages:
//!
//! ```text
//! +------------------+------------------+------------------+
//! | Page 0           | Page 1           | Page 2           | ...
//! +------------------+------------------+------------------+
//! ^ offset 0         ^ offset 4096      ^ offset 8192
//! ```
//!
//! The table identity is derived from the file's canonical path, not
//! stored in the file itself, so the same file yields the same id across
//! process runs.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::error::HeapError;
use super::page::HeapPage;
use super::scan::HeapScan;
use crate::cache::PageCache;
use crate::schema::Schema;
use crate::storage::{PageId, TableId, PAGE_SIZE};
use crate::tuple::Tuple;
use crate::tx::TransactionId;

/// A heap file: a sequence of independently decodable pages backing one
/// table.
///
/// The file is assumed append-only in whole-page increments. Reads open
/// the file per call; serializing concurrent access to a page's mutable
/// state is the external cache's job, not this type's.
#[derive(Debug)]
pub struct HeapFile {
    path: PathBuf,
    table: TableId,
    schema: Arc<Schema>,
}

impl HeapFile {
    /// Opens a heap file at `path`, creating it empty if absent.
    ///
    /// The table id is a CRC32 of the canonical path, which is stable
    /// across process runs reading the same file.
    ///
    /// # Errors
    ///
    /// Returns `HeapError::Io` if the file cannot be created or the path
    /// cannot be canonicalized.
    pub fn open(path: impl AsRef<Path>, schema: Arc<Schema>) -> Result<Self, HeapError> {
        let path = path.as_ref();
        OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;
        let canonical = path.canonicalize()?;
        let table = TableId::new(crc32fast::hash(
            canonical.to_string_lossy().as_bytes(),
        ));
        Ok(Self {
            path: canonical,
            table,
            schema,
        })
    }

    /// Returns the identifier of the table backed by this file.
    pub fn table_id(&self) -> TableId {
        self.table
    }

    /// Returns the schema of the stored tuples.
    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// Returns the canonical path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the number of complete pages in the file.
    ///
    /// A file length that is not a multiple of [`PAGE_SIZE`] silently
    /// truncates to the last complete page; a trailing partial page is an
    /// in-flight append, not corruption, at this layer.
    ///
    /// # Errors
    ///
    /// Returns `HeapError::Io` if the file metadata cannot be read.
    pub fn page_count(&self) -> Result<u32, HeapError> {
        let len = std::fs::metadata(&self.path)?.len();
        Ok((len / PAGE_SIZE as u64) as u32)
    }

    /// Reads and decodes page `page_no` from the file.
    ///
    /// # Errors
    ///
    /// Returns `HeapError::Io` if fewer than [`PAGE_SIZE`] bytes are
    /// available at the page's offset, and `HeapError::CorruptPage` if the
    /// bytes do not decode.
    pub fn read_page(&self, page_no: u32) -> Result<HeapPage, HeapError> {
        let id = PageId::new(self.table, page_no);
        let mut file = File::open(&self.path)?;
        file.seek(SeekFrom::Start(id.byte_offset()))?;
        let mut data = vec![0u8; PAGE_SIZE];
        file.read_exact(&mut data)?;
        HeapPage::parse(id, &data, self.schema.clone())
    }

    /// Writes a page back to the file at its offset.
    ///
    /// Contract once implemented: serializes the page via
    /// [`HeapPage::page_data`] and overwrites exactly its page region.
    ///
    /// # Errors
    ///
    /// Currently always returns `HeapError::NotSupported`.
    pub fn write_page(&self, _page: &HeapPage) -> Result<(), HeapError> {
        Err(HeapError::NotSupported("heap file write-back"))
    }

    /// Inserts a tuple into the first page with a free slot, appending a
    /// new page if none has room.
    ///
    /// # Errors
    ///
    /// Currently always returns `HeapError::NotSupported`.
    pub fn insert_tuple(
        &self,
        _tx: TransactionId,
        _tuple: &Tuple,
    ) -> Result<(), HeapError> {
        Err(HeapError::NotSupported("heap file tuple insert"))
    }

    /// Deletes a tuple identified by its record id.
    ///
    /// # Errors
    ///
    /// Currently always returns `HeapError::NotSupported`.
    pub fn delete_tuple(
        &self,
        _tx: TransactionId,
        _tuple: &Tuple,
    ) -> Result<(), HeapError> {
        Err(HeapError::NotSupported("heap file tuple delete"))
    }

    /// Creates a cursor over every occupied tuple in the file, in
    /// ascending page-number then slot order.
    ///
    /// Pages are fetched one at a time through `cache` as the cursor
    /// advances; the cursor must be [`open`](HeapScan::open)ed before use.
    pub fn scan<'a>(&'a self, tx: TransactionId, cache: &'a dyn PageCache) -> HeapScan<'a> {
        HeapScan::new(self, tx, cache)
    }
}
