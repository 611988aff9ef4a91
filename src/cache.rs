//! Page-cache boundary.
//!
//! The real buffer pool (pinning, eviction, dirty write-back) is an
//! external collaborator; this layer only depends on its fetch contract:
//! a fetch may block and must return the same logical page content for
//! repeated fetches absent an intervening write. [`ReadThroughCache`] is
//! a non-caching implementation of that contract, reading pages straight
//! from the backing heap file; it is sufficient for scans and tests.

use std::sync::Arc;

use crate::catalog::Catalog;
use crate::heap::{HeapError, HeapPage};
use crate::storage::PageId;
use crate::tx::{AccessMode, TransactionId};

/// Page fetch contract consumed by file scans.
pub trait PageCache {
    /// Fetches a page on behalf of a transaction.
    ///
    /// May block (e.g., on lock contention inside the real cache); returns
    /// the decoded page or the failure that prevented materializing it.
    fn fetch_page(
        &self,
        tx: TransactionId,
        page_id: PageId,
        mode: AccessMode,
    ) -> Result<Arc<HeapPage>, HeapError>;
}

/// A cache that reads every fetch straight through to the heap file.
///
/// Resolves the owning file through the catalog and decodes the page
/// fresh on every call; no pinning, no reuse.
pub struct ReadThroughCache<'a> {
    catalog: &'a Catalog,
}

impl<'a> ReadThroughCache<'a> {
    /// Creates a read-through cache over the given catalog.
    pub fn new(catalog: &'a Catalog) -> Self {
        Self { catalog }
    }
}

impl PageCache for ReadThroughCache<'_> {
    fn fetch_page(
        &self,
        _tx: TransactionId,
        page_id: PageId,
        _mode: AccessMode,
    ) -> Result<Arc<HeapPage>, HeapError> {
        let file = self
            .catalog
            .file_for(page_id.table)
            .map_err(|_| HeapError::UnknownTable(page_id.table))?;
        Ok(Arc::new(file.read_page(page_id.page_no)?))
    }
}
