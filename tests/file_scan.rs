//! Integration tests for the cross-page tuple cursor.
//!
//! Each test lays out a heap file on disk byte by byte, registers it in
//! a catalog, and drives a scan through a read-through page cache.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use tempfile::tempdir;

use heapstore::cache::ReadThroughCache;
use heapstore::catalog::Catalog;
use heapstore::datum::{Type, Value};
use heapstore::heap::{header_size, HeapError, HeapFile};
use heapstore::schema::Schema;
use heapstore::storage::PAGE_SIZE;
use heapstore::tx::TransactionId;

fn id_name_schema() -> Arc<Schema> {
    Arc::new(
        Schema::with_names(
            vec![Type::Int, Type::String],
            vec![Some("id".to_string()), Some("name".to_string())],
        )
        .unwrap(),
    )
}

/// Builds one page image with the given `(slot, id, name)` tuples.
fn page_image(schema: &Schema, tuples: &[(usize, i32, &str)]) -> Vec<u8> {
    let header_len = header_size((PAGE_SIZE * 8) / (schema.size_in_bytes() * 8 + 1));
    let tuple_size = schema.size_in_bytes();
    let mut data = vec![0u8; PAGE_SIZE];
    for &(slot, n, s) in tuples {
        data[slot / 8] |= 1 << (slot % 8);
        let offset = header_len + slot * tuple_size;
        data[offset..offset + 4].copy_from_slice(&n.to_le_bytes());
        data[offset + 4..offset + 8].copy_from_slice(&(s.len() as u32).to_le_bytes());
        data[offset + 8..offset + 8 + s.len()].copy_from_slice(s.as_bytes());
    }
    data
}

fn write_pages(path: &Path, pages: &[Vec<u8>]) {
    let mut f = OpenOptions::new().write(true).open(path).unwrap();
    for page in pages {
        f.write_all(page).unwrap();
    }
}

#[test]
fn scan_two_pages_in_order() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("people.dat");
    let schema = id_name_schema();
    let file = Arc::new(HeapFile::open(&path, schema.clone()).unwrap());

    // Page 0 holds one tuple, page 1 holds three.
    let pages = vec![
        page_image(&schema, &[(5, 10, "ada")]),
        page_image(&schema, &[(0, 20, "bob"), (1, 30, "cyd"), (29, 40, "dee")]),
    ];
    write_pages(&path, &pages);

    let mut catalog = Catalog::new();
    catalog.add_table(file.clone());
    let cache = ReadThroughCache::new(&catalog);

    let mut scan = file.scan(TransactionId::new(1), &cache);
    scan.open().unwrap();

    let mut seen = Vec::new();
    while let Some(tuple) = scan.next().unwrap() {
        let rid = tuple.record_id().unwrap();
        match (tuple.field(0).unwrap(), tuple.field(1).unwrap()) {
            (Value::Int(n), Value::String(s)) => {
                seen.push((rid.page_id.page_no, rid.slot, *n, s.clone()))
            }
            other => panic!("unexpected fields {:?}", other),
        }
    }
    scan.close();

    assert_eq!(
        seen,
        vec![
            (0, 5, 10, "ada".to_string()),
            (1, 0, 20, "bob".to_string()),
            (1, 1, 30, "cyd".to_string()),
            (1, 29, 40, "dee".to_string()),
        ]
    );
}

#[test]
fn scan_requires_open() {
    let dir = tempdir().unwrap();
    let schema = id_name_schema();
    let file = Arc::new(HeapFile::open(dir.path().join("t.dat"), schema).unwrap());

    let mut catalog = Catalog::new();
    catalog.add_table(file.clone());
    let cache = ReadThroughCache::new(&catalog);

    let mut scan = file.scan(TransactionId::new(1), &cache);
    assert!(matches!(scan.has_next(), Err(HeapError::ScanNotOpen)));
    assert!(matches!(scan.next(), Err(HeapError::ScanNotOpen)));

    // Open, exhaust, close: the closed cursor fails again.
    scan.open().unwrap();
    assert!(scan.next().unwrap().is_none());
    scan.close();
    assert!(matches!(scan.next(), Err(HeapError::ScanNotOpen)));
}

#[test]
fn scan_empty_file_yields_nothing() {
    let dir = tempdir().unwrap();
    let schema = id_name_schema();
    let file = Arc::new(HeapFile::open(dir.path().join("t.dat"), schema).unwrap());

    let mut catalog = Catalog::new();
    catalog.add_table(file.clone());
    let cache = ReadThroughCache::new(&catalog);

    let mut scan = file.scan(TransactionId::new(7), &cache);
    scan.open().unwrap();
    assert!(!scan.has_next().unwrap());
    assert!(scan.next().unwrap().is_none());
    // Exhaustion is sticky.
    assert!(!scan.has_next().unwrap());
}

#[test]
fn scan_skips_wholly_empty_pages() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("sparse.dat");
    let schema = id_name_schema();
    let file = Arc::new(HeapFile::open(&path, schema.clone()).unwrap());

    // Tuples only on pages 0 and 2; page 1 is entirely empty.
    let pages = vec![
        page_image(&schema, &[(0, 1, "a")]),
        page_image(&schema, &[]),
        page_image(&schema, &[(3, 2, "b")]),
    ];
    write_pages(&path, &pages);

    let mut catalog = Catalog::new();
    catalog.add_table(file.clone());
    let cache = ReadThroughCache::new(&catalog);

    let mut scan = file.scan(TransactionId::new(1), &cache);
    scan.open().unwrap();

    let first = scan.next().unwrap().unwrap();
    assert_eq!(first.record_id().unwrap().page_id.page_no, 0);
    let second = scan.next().unwrap().unwrap();
    assert_eq!(second.record_id().unwrap().page_id.page_no, 2);
    assert!(scan.next().unwrap().is_none());
}

#[test]
fn rewind_restarts_from_first_tuple() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("t.dat");
    let schema = id_name_schema();
    let file = Arc::new(HeapFile::open(&path, schema.clone()).unwrap());

    let pages = vec![page_image(&schema, &[(1, 100, "x"), (4, 200, "y")])];
    write_pages(&path, &pages);

    let mut catalog = Catalog::new();
    catalog.add_table(file.clone());
    let cache = ReadThroughCache::new(&catalog);

    let mut scan = file.scan(TransactionId::new(1), &cache);
    scan.open().unwrap();

    let first_pass: Vec<_> = std::iter::from_fn(|| scan.next().unwrap()).collect();
    assert_eq!(first_pass.len(), 2);

    scan.rewind().unwrap();
    let second_pass: Vec<_> = std::iter::from_fn(|| scan.next().unwrap()).collect();
    assert_eq!(first_pass, second_pass);
}

#[test]
fn scan_sees_pages_appended_after_open() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("grow.dat");
    let schema = id_name_schema();
    let file = Arc::new(HeapFile::open(&path, schema.clone()).unwrap());

    write_pages(&path, &[page_image(&schema, &[(0, 1, "a")])]);

    let mut catalog = Catalog::new();
    catalog.add_table(file.clone());
    let cache = ReadThroughCache::new(&catalog);

    let mut scan = file.scan(TransactionId::new(1), &cache);
    scan.open().unwrap();
    assert!(scan.next().unwrap().is_some());

    // Append a second page before the cursor crosses the old end.
    let mut f = OpenOptions::new().append(true).open(&path).unwrap();
    f.write_all(&page_image(&schema, &[(2, 2, "b")])).unwrap();
    drop(f);

    let tuple = scan.next().unwrap().unwrap();
    assert_eq!(tuple.record_id().unwrap().page_id.page_no, 1);
    assert!(scan.next().unwrap().is_none());
}
