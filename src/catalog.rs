//! Catalog boundary: mapping table identifiers to schemas and files.
//!
//! The full catalog (persistence, DDL, name resolution) lives outside
//! this crate; what this layer consumes is only "schema for table id" and
//! "file for table id", stable for the catalog's lifetime. [`Catalog`] is
//! an in-memory registry satisfying that contract, owned by the process
//! entry point and passed explicitly instead of living in global state.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::heap::HeapFile;
use crate::schema::Schema;
use crate::storage::TableId;

/// Errors from catalog lookups.
#[derive(Debug)]
pub enum CatalogError {
    /// No table registered under the given id.
    TableNotFound(TableId),
}

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogError::TableNotFound(table) => {
                write!(f, "table {} not found in catalog", table.as_u32())
            }
        }
    }
}

impl std::error::Error for CatalogError {}

/// Schema lookup contract consumed by readers of stored pages.
pub trait SchemaSource {
    /// Returns the schema for a table, or `None` if the table is unknown.
    fn schema_for(&self, table: TableId) -> Option<Arc<Schema>>;
}

/// In-memory table registry.
#[derive(Debug, Default)]
pub struct Catalog {
    tables: HashMap<TableId, Arc<HeapFile>>,
}

impl Catalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a heap file, keyed by its table id.
    ///
    /// Re-registering the same table replaces the previous entry.
    pub fn add_table(&mut self, file: Arc<HeapFile>) -> TableId {
        let table = file.table_id();
        self.tables.insert(table, file);
        table
    }

    /// Returns the heap file backing a table.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::TableNotFound` if the table is unknown.
    pub fn file_for(&self, table: TableId) -> Result<Arc<HeapFile>, CatalogError> {
        self.tables
            .get(&table)
            .cloned()
            .ok_or(CatalogError::TableNotFound(table))
    }
}

impl SchemaSource for Catalog {
    fn schema_for(&self, table: TableId) -> Option<Arc<Schema>> {
        self.tables.get(&table).map(|file| file.schema().clone())
    }
}
