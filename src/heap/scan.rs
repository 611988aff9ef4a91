//! File-level tuple cursor.
//!
//! [`HeapScan`] walks every page of a heap file in ascending page-number
//! order and yields the occupied tuples of each page in slot order. Pages
//! are fetched on demand through the external [`PageCache`]; the next
//! page is only requested once the current one is exhausted, so a scan
//! never pre-fetches the whole file.
//!
//! The cursor follows an explicit protocol: [`open`](HeapScan::open)
//! before use, [`rewind`](HeapScan::rewind) to restart from page 0, and
//! [`close`](HeapScan::close) to release it. Advancing a cursor that is
//! not open is a programming error and fails with
//! [`HeapError::ScanNotOpen`].

use std::sync::Arc;

use super::error::HeapError;
use super::file::HeapFile;
use super::page::HeapPage;
use crate::cache::PageCache;
use crate::storage::PageId;
use crate::tuple::Tuple;
use crate::tx::{AccessMode, TransactionId};

/// Cursor position within an open scan.
struct ScanState {
    /// Page currently being drained, or `None` once the file is exhausted
    /// (or was empty at open time).
    page: Option<Arc<HeapPage>>,
    /// Number of the page in `page`.
    page_no: u32,
    /// Next slot index to examine on the current page.
    slot: usize,
}

/// A lazy, restartable cursor over all occupied tuples of a heap file.
///
/// Not safe for concurrent use by multiple threads against the same
/// instance; each consumer holds its own cursor.
pub struct HeapScan<'a> {
    file: &'a HeapFile,
    tx: TransactionId,
    cache: &'a dyn PageCache,
    state: Option<ScanState>,
}

impl<'a> HeapScan<'a> {
    pub(super) fn new(file: &'a HeapFile, tx: TransactionId, cache: &'a dyn PageCache) -> Self {
        Self {
            file,
            tx,
            cache,
            state: None,
        }
    }

    /// Opens the cursor at page 0.
    ///
    /// An empty file opens successfully and reports no tuples.
    ///
    /// # Errors
    ///
    /// Propagates cache and I/O failures from fetching the first page.
    pub fn open(&mut self) -> Result<(), HeapError> {
        let page = if self.file.page_count()? > 0 {
            Some(self.fetch(0)?)
        } else {
            None
        };
        self.state = Some(ScanState {
            page,
            page_no: 0,
            slot: 0,
        });
        Ok(())
    }

    /// Returns true if another tuple remains.
    ///
    /// Idempotent and side-effect-free, except that draining the current
    /// page advances the cursor to the next non-empty page.
    ///
    /// # Errors
    ///
    /// Returns `HeapError::ScanNotOpen` if the cursor is not open;
    /// propagates cache failures from advancing to the next page.
    pub fn has_next(&mut self) -> Result<bool, HeapError> {
        let state = self.state.as_mut().ok_or(HeapError::ScanNotOpen)?;
        loop {
            let Some(page) = &state.page else {
                return Ok(false);
            };

            // Skip unused slots on the current page.
            while state.slot < page.slot_count() {
                if page.is_slot_used(state.slot as u16)? {
                    return Ok(true);
                }
                state.slot += 1;
            }

            // Current page drained; move on or report exhaustion. The page
            // count is re-read so pages appended mid-scan are picked up.
            if state.page_no + 1 < self.file.page_count()? {
                state.page_no += 1;
                state.slot = 0;
                let id = PageId::new(self.file.table_id(), state.page_no);
                state.page = Some(self.cache.fetch_page(
                    self.tx,
                    id,
                    AccessMode::ReadOnly,
                )?);
            } else {
                state.page = None;
            }
        }
    }

    /// Returns the next occupied tuple, or `None` once the file is
    /// exhausted.
    ///
    /// Tuples arrive in ascending (page number, slot) order, each tagged
    /// with its record id.
    ///
    /// # Errors
    ///
    /// Returns `HeapError::ScanNotOpen` if the cursor is not open;
    /// propagates cache failures.
    pub fn next(&mut self) -> Result<Option<Tuple>, HeapError> {
        if !self.has_next()? {
            return Ok(None);
        }
        // has_next left the cursor parked on an occupied slot.
        let state = self.state.as_mut().ok_or(HeapError::ScanNotOpen)?;
        let Some(page) = state.page.as_ref() else {
            return Ok(None);
        };
        let tuple = page.tuple(state.slot as u16)?.cloned();
        state.slot += 1;
        Ok(tuple)
    }

    /// Restarts the cursor from page 0.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`open`](Self::open).
    pub fn rewind(&mut self) -> Result<(), HeapError> {
        self.open()
    }

    /// Closes the cursor. Subsequent `has_next`/`next` calls fail with
    /// `HeapError::ScanNotOpen` until it is opened again.
    pub fn close(&mut self) {
        self.state = None;
    }

    fn fetch(&self, page_no: u32) -> Result<Arc<HeapPage>, HeapError> {
        let id = PageId::new(self.file.table_id(), page_no);
        self.cache.fetch_page(self.tx, id, AccessMode::ReadOnly)
    }
}
