//! Tuple value container.
//!
//! A [`Tuple`] holds exactly one [`Value`] per field of its [`Schema`],
//! plus an optional [`RecordId`] recording where the tuple resides on
//! disk. The record id is set only when a tuple is materialized out of a
//! page; freshly constructed and synthetic tuples carry none.
//!
//! The tuple exclusively owns its value array; the schema is shared
//! read-only behind an `Arc`.

use std::fmt;
use std::sync::Arc;

use crate::datum::Value;
use crate::heap::RecordId;
use crate::schema::{Schema, SchemaError};

/// A row of typed field values conforming to a schema.
#[derive(Debug, Clone, PartialEq)]
pub struct Tuple {
    schema: Arc<Schema>,
    values: Vec<Value>,
    record_id: Option<RecordId>,
}

impl Tuple {
    /// Creates a tuple with one zero value per schema field.
    ///
    /// Int fields start at `0`, string fields at the empty string.
    pub fn new(schema: Arc<Schema>) -> Self {
        let values = schema
            .fields()
            .iter()
            .map(|f| f.ty.zero_value())
            .collect();
        Self {
            schema,
            values,
            record_id: None,
        }
    }

    /// Assembles a tuple from already-decoded values.
    ///
    /// Used by the page codec; `values` must have one entry per schema field.
    pub(crate) fn from_values(schema: Arc<Schema>, values: Vec<Value>) -> Self {
        debug_assert_eq!(values.len(), schema.field_count());
        Self {
            schema,
            values,
            record_id: None,
        }
    }

    /// Returns the schema of this tuple.
    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// Returns the value of field `i`.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError::FieldOutOfBounds` if `i` is out of range.
    pub fn field(&self, i: usize) -> Result<&Value, SchemaError> {
        self.values.get(i).ok_or(SchemaError::FieldOutOfBounds {
            index: i,
            field_count: self.values.len(),
        })
    }

    /// Replaces the value of field `i`.
    ///
    /// The value is NOT checked against the schema's declared field type;
    /// type safety here is a caller contract. Readers that trust the
    /// schema will misinterpret a mismatched value.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError::FieldOutOfBounds` if `i` is out of range.
    pub fn set_field(&mut self, i: usize, value: Value) -> Result<(), SchemaError> {
        let slot = self.values.get_mut(i).ok_or(SchemaError::FieldOutOfBounds {
            index: i,
            field_count: self.schema.field_count(),
        })?;
        *slot = value;
        Ok(())
    }

    /// Returns the on-disk location of this tuple, if it has one.
    pub fn record_id(&self) -> Option<RecordId> {
        self.record_id
    }

    /// Sets or clears the on-disk location of this tuple.
    pub fn set_record_id(&mut self, rid: Option<RecordId>) {
        self.record_id = rid;
    }

    /// Returns an iterator over the field values in schema order.
    ///
    /// Each call produces a fresh pass over the current values.
    pub fn fields(&self) -> impl Iterator<Item = &Value> {
        self.values.iter()
    }

    /// Swaps the schema of this tuple without touching its values.
    ///
    /// Used when passing tuples through schema-changing operators; the
    /// caller is responsible for keeping subsequent reads type-safe.
    pub fn reset_schema(&mut self, schema: Arc<Schema>) {
        self.schema = schema;
    }
}

/// Renders the fields in order, tab-separated, with a trailing newline.
///
/// Line-oriented so output can be diffed against expected-row fixtures.
impl fmt::Display for Tuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, value) in self.values.iter().enumerate() {
            if i > 0 {
                write!(f, "\t")?;
            }
            write!(f, "{}", value)?;
        }
        writeln!(f)
    }
}
