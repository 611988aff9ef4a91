//! Slotted heap page with a presence bitmap.
//!
//! A heap page packs a fixed number of fixed-size tuples into a
//! [`PAGE_SIZE`] byte buffer. The layout is self-describing given the
//! table's schema:
//!
//! ```text
//! +--------------------------+ offset 0
//! | Header (H bytes)         |  bit i = slot i occupied
//! +--------------------------+ offset H
//! | Slot 0                   |  schema.size_in_bytes() bytes each:
//! | Slot 1                   |  tuple fields in schema order, or
//! | ...                      |  zero padding if the slot is unused
//! | Slot S-1                 |
//! +--------------------------+
//! | Zero padding             |
//! +--------------------------+ offset PAGE_SIZE
//! ```
//!
//! The slot count is derived once from the page size and the schema's
//! fixed tuple size: `S = (PAGE_SIZE * 8) / (tuple_bytes * 8 + 1)`. The
//! `+ 1` reserves one presence bit per slot; truncating division
//! guarantees header plus slots never exceed the page. The header is
//! `H = ceil(S / 8)` bytes, and slot `i`'s presence bit is bit `i % 8`
//! (least-significant first) of header byte `i / 8`.
//!
//! Pages decode with [`HeapPage::parse`] and encode back bit-for-bit with
//! [`HeapPage::page_data`]; the two are exact inverses for the header and
//! all occupied slots.

use std::fmt;
use std::sync::Arc;

use bytes::{Buf, BufMut, BytesMut};
use parking_lot::Mutex;

use super::error::HeapError;
use crate::datum::Value;
use crate::schema::Schema;
use crate::storage::{PageId, PAGE_SIZE};
use crate::tuple::Tuple;
use crate::tx::TransactionId;

/// Slot index within a page.
pub type SlotId = u16;

/// Location of a tuple: the page holding it plus its slot index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecordId {
    /// Page containing the tuple.
    pub page_id: PageId,
    /// Slot within the page.
    pub slot: SlotId,
}

impl RecordId {
    /// Creates a new record identifier.
    pub const fn new(page_id: PageId, slot: SlotId) -> Self {
        Self { page_id, slot }
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}:{}",
            self.page_id.table.as_u32(),
            self.page_id.page_no,
            self.slot
        )
    }
}

/// Returns the number of tuple slots a page holds under the given schema.
///
/// One presence bit is reserved per slot; the division truncates so the
/// header and slot region always fit in [`PAGE_SIZE`].
pub fn slots_per_page(schema: &Schema) -> usize {
    (PAGE_SIZE * 8) / (schema.size_in_bytes() * 8 + 1)
}

/// Returns the header size in bytes for the given slot count.
pub fn header_size(slot_count: usize) -> usize {
    slot_count.div_ceil(8)
}

/// A decoded heap page: presence bitmap plus an array of optional tuples.
///
/// Constructed from raw bytes with [`parse`](Self::parse) and serialized
/// back with [`page_data`](Self::page_data). Once fetched through the
/// cache a page is treated as a read-only snapshot for the duration of an
/// iteration pass; the before-image is the only field mutated after
/// construction.
pub struct HeapPage {
    id: PageId,
    schema: Arc<Schema>,
    /// Presence bitmap, `header_size(slot_count)` bytes, kept verbatim.
    header: Vec<u8>,
    slots: Vec<Option<Tuple>>,
    /// Transaction that dirtied this page, set only by the external cache.
    dirty: Option<TransactionId>,
    /// Byte-for-byte snapshot for rollback, guarded for concurrent readers.
    before_image: Mutex<Vec<u8>>,
}

impl HeapPage {
    /// Decodes a page from exactly [`PAGE_SIZE`] bytes.
    ///
    /// Reads the header verbatim, then one slot region per slot in order:
    /// unused slots consume `schema.size_in_bytes()` bytes of reserved
    /// padding uninterpreted, used slots decode one field per schema entry
    /// and are tagged with their [`RecordId`]. The input buffer is
    /// retained as the before-image.
    ///
    /// # Errors
    ///
    /// Returns `HeapError::CorruptPage` if the buffer is not exactly
    /// [`PAGE_SIZE`] bytes or a slot decode runs out of bytes or hits
    /// malformed field data. A failed slot aborts the whole page.
    pub fn parse(id: PageId, data: &[u8], schema: Arc<Schema>) -> Result<Self, HeapError> {
        if data.len() != PAGE_SIZE {
            return Err(HeapError::CorruptPage {
                page: id,
                reason: format!("expected {} bytes, got {}", PAGE_SIZE, data.len()),
            });
        }

        let slot_count = slots_per_page(&schema);
        let header_len = header_size(slot_count);
        let tuple_size = schema.size_in_bytes();

        let mut buf = data;
        let header = data[..header_len].to_vec();
        buf.advance(header_len);

        let mut slots = Vec::with_capacity(slot_count);
        for i in 0..slot_count {
            if !bit_set(&header, i) {
                // Reserved zero padding; consumed without interpretation.
                if buf.remaining() < tuple_size {
                    return Err(HeapError::CorruptPage {
                        page: id,
                        reason: format!("page truncated at empty slot {}", i),
                    });
                }
                buf.advance(tuple_size);
                slots.push(None);
                continue;
            }

            let mut values = Vec::with_capacity(schema.field_count());
            for field in schema.fields() {
                let value =
                    Value::read(&mut buf, field.ty).map_err(|err| HeapError::CorruptPage {
                        page: id,
                        reason: format!("slot {}: {}", i, err),
                    })?;
                values.push(value);
            }
            let mut tuple = Tuple::from_values(schema.clone(), values);
            tuple.set_record_id(Some(RecordId::new(id, i as SlotId)));
            slots.push(Some(tuple));
        }

        Ok(Self {
            id,
            schema,
            header,
            slots,
            dirty: None,
            before_image: Mutex::new(data.to_vec()),
        })
    }

    /// Returns an all-zero page image.
    ///
    /// Used to append new, empty pages to a file; parsing it yields a page
    /// with every slot unused.
    pub fn empty_page_data() -> Vec<u8> {
        vec![0; PAGE_SIZE]
    }

    /// Serializes this page to exactly [`PAGE_SIZE`] bytes.
    ///
    /// The exact inverse of [`parse`](Self::parse): header bytes verbatim,
    /// occupied slots as their field encodings in schema order, unused
    /// slots as zero bytes, then zero padding to the page size.
    ///
    /// # Errors
    ///
    /// Returns `HeapError::Serialization` if a field value no longer fits
    /// its fixed width (possible only through unchecked `set_field`).
    ///
    /// # Panics
    ///
    /// Panics if the header and slot region exceed [`PAGE_SIZE`]; the slot
    /// count formula makes that unreachable unless the page size or schema
    /// was misconfigured upstream, which is fatal for the engine.
    pub fn page_data(&self) -> Result<Vec<u8>, HeapError> {
        let used = self.header.len() + self.slots.len() * self.schema.size_in_bytes();
        assert!(
            used <= PAGE_SIZE,
            "header + slot region ({} bytes) exceeds page size {}",
            used,
            PAGE_SIZE
        );

        let mut buf = BytesMut::with_capacity(PAGE_SIZE);
        buf.put_slice(&self.header);
        for slot in &self.slots {
            match slot {
                None => buf.put_bytes(0, self.schema.size_in_bytes()),
                Some(tuple) => {
                    for value in tuple.fields() {
                        value.write(&mut buf)?;
                    }
                }
            }
        }
        buf.put_bytes(0, PAGE_SIZE - buf.len());
        Ok(buf.to_vec())
    }

    /// Returns the page identifier.
    pub fn id(&self) -> PageId {
        self.id
    }

    /// Returns the schema this page was decoded under.
    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// Returns the number of tuple slots on this page.
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Returns true if slot `i` holds a tuple.
    ///
    /// # Errors
    ///
    /// Returns `HeapError::SlotOutOfBounds` if `i` is out of range.
    pub fn is_slot_used(&self, i: SlotId) -> Result<bool, HeapError> {
        if (i as usize) >= self.slots.len() {
            return Err(HeapError::SlotOutOfBounds {
                slot: i,
                slot_count: self.slots.len(),
            });
        }
        Ok(bit_set(&self.header, i as usize))
    }

    /// Returns the tuple in slot `i`, or `None` if the slot is unused.
    ///
    /// # Errors
    ///
    /// Returns `HeapError::SlotOutOfBounds` if `i` is out of range.
    pub fn tuple(&self, i: SlotId) -> Result<Option<&Tuple>, HeapError> {
        self.slots
            .get(i as usize)
            .map(Option::as_ref)
            .ok_or(HeapError::SlotOutOfBounds {
                slot: i,
                slot_count: self.slots.len(),
            })
    }

    /// Returns the number of unused slots on this page.
    pub fn empty_slot_count(&self) -> usize {
        (0..self.slots.len())
            .filter(|&i| !bit_set(&self.header, i))
            .count()
    }

    /// Returns an iterator over the occupied tuples in ascending slot
    /// order, skipping unused slots.
    ///
    /// The iterator is not restartable; construct a new one for a fresh
    /// pass. Exhaustion is detected in O(1) from a running yield count
    /// rather than by re-scanning the tail of the slot array.
    pub fn iter(&self) -> HeapPageIter<'_> {
        HeapPageIter {
            page: self,
            cursor: 0,
            yielded: 0,
            occupied: self.slots.len() - self.empty_slot_count(),
        }
    }

    /// Inserts a tuple into the first empty slot.
    ///
    /// Contract once implemented: fails when the page has no empty slot
    /// (page full) or the tuple's schema does not match the page's; on
    /// success the tuple's record id is updated and the presence bit set.
    ///
    /// # Errors
    ///
    /// Currently always returns `HeapError::NotSupported`.
    pub fn insert_tuple(&mut self, _tuple: &Tuple) -> Result<(), HeapError> {
        Err(HeapError::NotSupported("heap page tuple insert"))
    }

    /// Deletes a tuple from this page.
    ///
    /// Contract once implemented: fails when the tuple is not on this page
    /// or its slot is already empty; on success the presence bit is
    /// cleared.
    ///
    /// # Errors
    ///
    /// Currently always returns `HeapError::NotSupported`.
    pub fn delete_tuple(&mut self, _tuple: &Tuple) -> Result<(), HeapError> {
        Err(HeapError::NotSupported("heap page tuple delete"))
    }

    /// Records which transaction dirtied this page, or clears the flag.
    ///
    /// Called by the external cache only; a page never marks itself dirty.
    pub fn mark_dirty(&mut self, tx: Option<TransactionId>) {
        self.dirty = tx;
    }

    /// Returns the transaction that last dirtied this page, if any.
    pub fn dirty(&self) -> Option<TransactionId> {
        self.dirty
    }

    /// Returns this page as it looked when the snapshot was last captured.
    ///
    /// The snapshot defaults to the bytes the page was parsed from; it is
    /// refreshed by [`capture_before_image`](Self::capture_before_image).
    /// Used by the external recovery/transaction layer for rollback.
    ///
    /// # Errors
    ///
    /// Returns `HeapError::CorruptPage` if the snapshot fails to decode,
    /// which cannot happen for a snapshot this page captured itself.
    pub fn before_image(&self) -> Result<HeapPage, HeapError> {
        let snapshot = self.before_image.lock().clone();
        HeapPage::parse(self.id, &snapshot, self.schema.clone())
    }

    /// Replaces the before-image snapshot with the current page contents.
    ///
    /// The copy-and-publish step runs under the snapshot lock so that
    /// concurrent [`before_image`](Self::before_image) readers never
    /// observe a partially-copied buffer.
    ///
    /// # Errors
    ///
    /// Returns `HeapError::Serialization` if the page fails to serialize.
    pub fn capture_before_image(&self) -> Result<(), HeapError> {
        let data = self.page_data()?;
        *self.before_image.lock() = data;
        Ok(())
    }
}

// Equality covers the decoded content (identity, bitmap, tuples); the
// dirty flag and snapshot are runtime state, not page content.
impl PartialEq for HeapPage {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.header == other.header && self.slots == other.slots
    }
}

impl fmt::Debug for HeapPage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HeapPage")
            .field("id", &self.id)
            .field("slot_count", &self.slots.len())
            .field("empty_slots", &self.empty_slot_count())
            .field("dirty", &self.dirty)
            .finish()
    }
}

fn bit_set(header: &[u8], i: usize) -> bool {
    header[i / 8] & (1 << (i % 8)) != 0
}

/// Iterator over the occupied tuples of a page, in ascending slot order.
pub struct HeapPageIter<'a> {
    page: &'a HeapPage,
    cursor: usize,
    yielded: usize,
    occupied: usize,
}

impl<'a> Iterator for HeapPageIter<'a> {
    type Item = &'a Tuple;

    fn next(&mut self) -> Option<&'a Tuple> {
        // Once every occupied slot has been yielded there is no need to
        // walk the remaining (empty) tail of the slot array.
        if self.yielded == self.occupied {
            return None;
        }
        loop {
            let slot = &self.page.slots[self.cursor];
            self.cursor += 1;
            if let Some(tuple) = slot {
                self.yielded += 1;
                return Some(tuple);
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.occupied - self.yielded;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for HeapPageIter<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datum::{Type, STRING_CAPACITY};
    use crate::storage::TableId;

    fn test_schema() -> Arc<Schema> {
        Arc::new(
            Schema::with_names(
                vec![Type::Int, Type::String],
                vec![Some("id".to_string()), Some("name".to_string())],
            )
            .unwrap(),
        )
    }

    fn page_id() -> PageId {
        PageId::new(TableId::new(7), 0)
    }

    /// Builds a raw page image with the given slots occupied, writing
    /// `(base + slot, "t<slot>")` into each.
    fn build_page_bytes(schema: &Schema, occupied: &[usize], base: i32) -> Vec<u8> {
        let slot_count = slots_per_page(schema);
        let header_len = header_size(slot_count);
        let tuple_size = schema.size_in_bytes();
        let mut data = vec![0u8; PAGE_SIZE];

        for &slot in occupied {
            assert!(slot < slot_count);
            data[slot / 8] |= 1 << (slot % 8);
            let offset = header_len + slot * tuple_size;
            let n = base + slot as i32;
            data[offset..offset + 4].copy_from_slice(&n.to_le_bytes());
            let s = format!("t{}", slot);
            data[offset + 4..offset + 8].copy_from_slice(&(s.len() as u32).to_le_bytes());
            data[offset + 8..offset + 8 + s.len()].copy_from_slice(s.as_bytes());
        }
        data
    }

    #[test]
    fn test_slot_count_formula() {
        let schema = test_schema();
        let tuple_size = 4 + 4 + STRING_CAPACITY;
        assert_eq!(schema.size_in_bytes(), tuple_size);
        assert_eq!(
            slots_per_page(&schema),
            (PAGE_SIZE * 8) / (tuple_size * 8 + 1)
        );
        // 4096-byte pages, 136-byte tuples: 30 slots, 4 header bytes.
        assert_eq!(slots_per_page(&schema), 30);
        assert_eq!(header_size(slots_per_page(&schema)), 4);
    }

    #[test]
    fn test_header_size_rounds_up() {
        assert_eq!(header_size(0), 0);
        assert_eq!(header_size(1), 1);
        assert_eq!(header_size(8), 1);
        assert_eq!(header_size(9), 2);
        assert_eq!(header_size(30), 4);
    }

    #[test]
    fn test_parse_empty_page() {
        let schema = test_schema();
        let page = HeapPage::parse(page_id(), &HeapPage::empty_page_data(), schema.clone())
            .unwrap();
        assert_eq!(page.slot_count(), slots_per_page(&schema));
        assert_eq!(page.empty_slot_count(), page.slot_count());
        assert_eq!(page.iter().count(), 0);
        assert_eq!(page.dirty(), None);
    }

    #[test]
    fn test_parse_occupied_slots() {
        let schema = test_schema();
        let data = build_page_bytes(&schema, &[0, 2, 5], 100);
        let page = HeapPage::parse(page_id(), &data, schema.clone()).unwrap();

        assert!(page.is_slot_used(0).unwrap());
        assert!(!page.is_slot_used(1).unwrap());
        assert!(page.is_slot_used(2).unwrap());
        assert_eq!(page.empty_slot_count(), page.slot_count() - 3);

        let tuple = page.tuple(2).unwrap().unwrap();
        assert_eq!(tuple.field(0).unwrap(), &Value::Int(102));
        assert_eq!(tuple.field(1).unwrap(), &Value::String("t2".into()));
        assert_eq!(tuple.record_id(), Some(RecordId::new(page_id(), 2)));
        assert_eq!(page.tuple(1).unwrap(), None);
    }

    #[test]
    fn test_parse_wrong_size() {
        let schema = test_schema();
        let result = HeapPage::parse(page_id(), &[0u8; 100], schema);
        assert!(matches!(result, Err(HeapError::CorruptPage { .. })));
    }

    #[test]
    fn test_parse_malformed_field() {
        let schema = test_schema();
        let slot_count = slots_per_page(&schema);
        let header_len = header_size(slot_count);
        let mut data = build_page_bytes(&schema, &[0], 1);
        // Corrupt slot 0's string length prefix past the capacity.
        let offset = header_len + 4;
        data[offset..offset + 4].copy_from_slice(&u32::MAX.to_le_bytes());
        let result = HeapPage::parse(page_id(), &data, schema);
        assert!(matches!(result, Err(HeapError::CorruptPage { .. })));
    }

    #[test]
    fn test_roundtrip() {
        let schema = test_schema();
        let data = build_page_bytes(&schema, &[0, 3, 7, 29], 10);
        let page = HeapPage::parse(page_id(), &data, schema.clone()).unwrap();
        let encoded = page.page_data().unwrap();
        assert_eq!(encoded.len(), PAGE_SIZE);
        assert_eq!(encoded, data);

        let reparsed = HeapPage::parse(page_id(), &encoded, schema).unwrap();
        assert_eq!(reparsed, page);
    }

    #[test]
    fn test_encode_zero_fills_empty_slots() {
        let schema = test_schema();
        let slot_count = slots_per_page(&schema);
        let header_len = header_size(slot_count);
        let tuple_size = schema.size_in_bytes();

        // Slot 1 is unused but carries garbage bytes in the source image.
        let mut data = build_page_bytes(&schema, &[0], 1);
        let offset = header_len + tuple_size;
        data[offset..offset + tuple_size].fill(0xAB);

        let page = HeapPage::parse(page_id(), &data, schema).unwrap();
        let encoded = page.page_data().unwrap();
        assert!(encoded[offset..offset + tuple_size].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_is_slot_used_out_of_bounds() {
        let schema = test_schema();
        let page =
            HeapPage::parse(page_id(), &HeapPage::empty_page_data(), schema).unwrap();
        let slot = page.slot_count() as SlotId;
        assert!(matches!(
            page.is_slot_used(slot),
            Err(HeapError::SlotOutOfBounds { .. })
        ));
        assert!(matches!(
            page.tuple(slot),
            Err(HeapError::SlotOutOfBounds { .. })
        ));
    }

    #[test]
    fn test_iter_ascending_and_fresh_pass() {
        let schema = test_schema();
        let data = build_page_bytes(&schema, &[4, 1, 9], 0);
        let page = HeapPage::parse(page_id(), &data, schema).unwrap();

        let slots: Vec<SlotId> = page
            .iter()
            .map(|t| t.record_id().unwrap().slot)
            .collect();
        assert_eq!(slots, vec![1, 4, 9]);

        // A fresh iterator yields the identical sequence.
        let again: Vec<SlotId> = page
            .iter()
            .map(|t| t.record_id().unwrap().slot)
            .collect();
        assert_eq!(again, slots);
    }

    #[test]
    fn test_iter_exact_size() {
        let schema = test_schema();
        let data = build_page_bytes(&schema, &[2, 3], 0);
        let page = HeapPage::parse(page_id(), &data, schema).unwrap();

        let mut iter = page.iter();
        assert_eq!(iter.len(), 2);
        iter.next().unwrap();
        assert_eq!(iter.len(), 1);
        iter.next().unwrap();
        assert_eq!(iter.len(), 0);
        assert!(iter.next().is_none());
    }

    #[test]
    fn test_mutation_stubs() {
        let schema = test_schema();
        let mut page =
            HeapPage::parse(page_id(), &HeapPage::empty_page_data(), schema.clone())
                .unwrap();
        let tuple = Tuple::new(schema);
        assert!(matches!(
            page.insert_tuple(&tuple),
            Err(HeapError::NotSupported(_))
        ));
        assert!(matches!(
            page.delete_tuple(&tuple),
            Err(HeapError::NotSupported(_))
        ));
    }

    #[test]
    fn test_dirty_flag() {
        let schema = test_schema();
        let mut page =
            HeapPage::parse(page_id(), &HeapPage::empty_page_data(), schema).unwrap();
        assert_eq!(page.dirty(), None);
        let tx = TransactionId::new(9);
        page.mark_dirty(Some(tx));
        assert_eq!(page.dirty(), Some(tx));
        page.mark_dirty(None);
        assert_eq!(page.dirty(), None);
    }

    #[test]
    fn test_before_image_is_load_time_snapshot() {
        let schema = test_schema();
        let data = build_page_bytes(&schema, &[0, 1], 50);
        let page = HeapPage::parse(page_id(), &data, schema).unwrap();

        let image = page.before_image().unwrap();
        assert_eq!(image, page);
        assert_eq!(image.page_data().unwrap(), data);
    }

    #[test]
    fn test_capture_before_image_republishes() {
        let schema = test_schema();
        let data = build_page_bytes(&schema, &[0], 5);
        let page = HeapPage::parse(page_id(), &data, schema).unwrap();
        page.capture_before_image().unwrap();
        assert_eq!(page.before_image().unwrap(), page);
    }
}
