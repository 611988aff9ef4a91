//! Tuple schema descriptor.
//!
//! A [`Schema`] is an ordered list of typed, optionally named field
//! declarations describing the shape of a tuple. It is a pure value type:
//! constructed once per table at catalog-load time and shared read-only
//! (typically behind an `Arc`) by every tuple and page of that table.
//!
//! Equality and hashing depend only on the field type sequence; field
//! names are documentation for name lookup and never affect identity.

use std::fmt;
use std::hash::{Hash, Hasher};

use crate::datum::Type;

/// Errors from schema construction and field access.
#[derive(Debug)]
pub enum SchemaError {
    /// A names array was supplied with a different length than the types array.
    FieldCountMismatch {
        /// Number of field types.
        types: usize,
        /// Number of field names.
        names: usize,
    },
    /// Field index out of range.
    FieldOutOfBounds {
        /// Requested index.
        index: usize,
        /// Number of fields in the schema.
        field_count: usize,
    },
    /// No field carries the requested name.
    NameNotFound(String),
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaError::FieldCountMismatch { types, names } => {
                write!(
                    f,
                    "field count mismatch: {} types but {} names",
                    types, names
                )
            }
            SchemaError::FieldOutOfBounds { index, field_count } => {
                write!(
                    f,
                    "field index {} out of bounds for {} fields",
                    index, field_count
                )
            }
            SchemaError::NameNotFound(name) => {
                write!(f, "no field named {:?}", name)
            }
        }
    }
}

impl std::error::Error for SchemaError {}

/// A single field declaration: its type and optional name.
#[derive(Debug, Clone)]
pub struct FieldDesc {
    /// Field type.
    pub ty: Type,
    /// Field name, if any. Anonymous fields never match a name lookup.
    pub name: Option<String>,
}

impl fmt::Display for FieldDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{}({})", name, self.ty),
            None => write!(f, "({})", self.ty),
        }
    }
}

/// Ordered, immutable description of a tuple's fields.
///
/// A schema backing a stored table has at least one field; the derived
/// [`size_in_bytes`](Self::size_in_bytes) is the fixed width of every
/// tuple conforming to it.
#[derive(Debug, Clone)]
pub struct Schema {
    fields: Vec<FieldDesc>,
}

impl Schema {
    /// Creates a schema with the given field types and anonymous fields.
    pub fn new(types: Vec<Type>) -> Self {
        let fields = types
            .into_iter()
            .map(|ty| FieldDesc { ty, name: None })
            .collect();
        Self { fields }
    }

    /// Creates a schema with the given field types and names.
    ///
    /// A `None` entry leaves that field anonymous.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError::FieldCountMismatch` if `types` and `names`
    /// have different lengths.
    pub fn with_names(
        types: Vec<Type>,
        names: Vec<Option<String>>,
    ) -> Result<Self, SchemaError> {
        if types.len() != names.len() {
            return Err(SchemaError::FieldCountMismatch {
                types: types.len(),
                names: names.len(),
            });
        }
        let fields = types
            .into_iter()
            .zip(names)
            .map(|(ty, name)| FieldDesc { ty, name })
            .collect();
        Ok(Self { fields })
    }

    /// Returns the number of fields.
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// Returns the type of field `i`.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError::FieldOutOfBounds` if `i` is out of range.
    pub fn field_type(&self, i: usize) -> Result<Type, SchemaError> {
        self.field(i).map(|f| f.ty)
    }

    /// Returns the name of field `i`, if it has one.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError::FieldOutOfBounds` if `i` is out of range.
    pub fn field_name(&self, i: usize) -> Result<Option<&str>, SchemaError> {
        self.field(i).map(|f| f.name.as_deref())
    }

    fn field(&self, i: usize) -> Result<&FieldDesc, SchemaError> {
        self.fields.get(i).ok_or(SchemaError::FieldOutOfBounds {
            index: i,
            field_count: self.fields.len(),
        })
    }

    /// Returns the index of the first field named `name`.
    ///
    /// Anonymous fields never match.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError::NameNotFound` if no field carries the name.
    pub fn index_of(&self, name: &str) -> Result<usize, SchemaError> {
        self.fields
            .iter()
            .position(|f| f.name.as_deref() == Some(name))
            .ok_or_else(|| SchemaError::NameNotFound(name.to_string()))
    }

    /// Returns the fixed size in bytes of a tuple conforming to this schema.
    pub fn size_in_bytes(&self) -> usize {
        self.fields.iter().map(|f| f.ty.size_in_bytes()).sum()
    }

    /// Returns a view of the field declarations in order.
    pub fn fields(&self) -> &[FieldDesc] {
        &self.fields
    }

    /// Concatenates two schemas: `a`'s fields followed by `b`'s fields.
    ///
    /// Neither input is mutated. Used to build derived schemas for query
    /// results (e.g., join output).
    pub fn merge(a: &Schema, b: &Schema) -> Schema {
        let mut fields = Vec::with_capacity(a.fields.len() + b.fields.len());
        fields.extend(a.fields.iter().cloned());
        fields.extend(b.fields.iter().cloned());
        Schema { fields }
    }
}

// Identity is the type sequence; names are ignored.
impl PartialEq for Schema {
    fn eq(&self, other: &Self) -> bool {
        self.fields.len() == other.fields.len()
            && self
                .fields
                .iter()
                .zip(&other.fields)
                .all(|(a, b)| a.ty == b.ty)
    }
}

impl Eq for Schema {}

impl Hash for Schema {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for field in &self.fields {
            field.ty.hash(state);
        }
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, field) in self.fields.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", field)?;
        }
        Ok(())
    }
}
