//! Column-name extraction for record types.
//!
//! The `columns` load option maps document fields onto table columns. For a
//! record type that implements [`Columns`], the mapping is derived from a
//! static field descriptor once per (type, tag kind) and cached for the rest
//! of the process.
//!
//! Each field carries one tag per encoder:
//! - [`Tag::Default`] - the field name, lowercased
//! - [`Tag::Name`] - an explicit column name
//! - [`Tag::Skip`] - the field is not sent
//!
//! List the fields in declaration order so the derived columns line up with
//! the serialized document.
//!
//! ```
//! use streamload::columns::{extract, Columns, FieldTag, TagKind};
//!
//! #[derive(serde::Serialize)]
//! struct User {
//!     id: u64,
//!     #[serde(rename = "user_name")]
//!     name: String,
//!     #[serde(skip)]
//!     password_hash: String,
//! }
//!
//! impl Columns for User {
//!     const FIELDS: &'static [FieldTag] = &[
//!         FieldTag::new("id"),
//!         FieldTag::new("name").named("user_name"),
//!         FieldTag::new("password_hash").skip(),
//!     ];
//! }
//!
//! let cols = extract::<User>(TagKind::Csv).unwrap();
//! assert_eq!(&cols[..], ["id", "user_name"]);
//! ```

use std::any::{TypeId, type_name};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use thiserror::Error;

/// Which encoder's tags to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagKind {
    Csv,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
    Default,
    Name(&'static str),
    Skip,
}

/// Tags of one record field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldTag {
    pub field: &'static str,
    pub csv: Tag,
    pub json: Tag,
}

impl FieldTag {
    #[must_use]
    pub const fn new(field: &'static str) -> Self {
        Self {
            field,
            csv: Tag::Default,
            json: Tag::Default,
        }
    }

    /// Use `name` as the column for both encoders.
    #[must_use]
    pub const fn named(mut self, name: &'static str) -> Self {
        self.csv = Tag::Name(name);
        self.json = Tag::Name(name);
        self
    }

    #[must_use]
    pub const fn csv(mut self, tag: Tag) -> Self {
        self.csv = tag;
        self
    }

    #[must_use]
    pub const fn json(mut self, tag: Tag) -> Self {
        self.json = tag;
        self
    }

    /// Exclude the field from both encoders.
    #[must_use]
    pub const fn skip(mut self) -> Self {
        self.csv = Tag::Skip;
        self.json = Tag::Skip;
        self
    }

    const fn tag(&self, kind: TagKind) -> Tag {
        match kind {
            TagKind::Csv => self.csv,
            TagKind::Json => self.json,
        }
    }

    fn column(&self, kind: TagKind) -> Option<String> {
        match self.tag(kind) {
            Tag::Skip => None,
            Tag::Name(name) => Some(name.to_string()),
            Tag::Default => Some(self.field.to_lowercase()),
        }
    }
}

/// A record type whose table columns can be derived without an instance.
pub trait Columns: 'static {
    const FIELDS: &'static [FieldTag];
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ColumnError {
    #[error("no columns found in {type_name} for {kind:?} tags")]
    NoColumns {
        type_name: &'static str,
        kind: TagKind,
    },
}

// ============================================================================
// Cache
// ============================================================================

/// Runtime identity of a record type, used as the cache key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
struct TypeTag {
    id: TypeId,
    name: &'static str,
}

impl TypeTag {
    fn of<T: 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
        }
    }
}

type ColumnCache = HashMap<(TypeTag, TagKind), Arc<[String]>>;

static COLUMN_CACHE: RwLock<Option<ColumnCache>> = RwLock::new(None);

fn cached(key: &(TypeTag, TagKind)) -> Option<Arc<[String]>> {
    let lock = COLUMN_CACHE.read().unwrap_or_else(PoisonError::into_inner);
    lock.as_ref().and_then(|cache| cache.get(key).cloned())
}

/// Ordered column names of `T` for `kind`.
///
/// The first call per (type, kind) walks [`Columns::FIELDS`]; later calls return
/// the cached list. Two threads deriving the same key at once both store the
/// same value.
///
/// # Errors
/// Returns [`ColumnError::NoColumns`] if every field is skipped.
pub fn extract<T: Columns>(kind: TagKind) -> Result<Arc<[String]>, ColumnError> {
    let key = (TypeTag::of::<T>(), kind);
    if let Some(columns) = cached(&key) {
        return Ok(columns);
    }

    let columns: Arc<[String]> = T::FIELDS.iter().filter_map(|f| f.column(kind)).collect();
    if columns.is_empty() {
        return Err(ColumnError::NoColumns {
            type_name: key.0.name,
            kind,
        });
    }

    COLUMN_CACHE
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .get_or_insert_with(HashMap::new)
        .insert(key, Arc::clone(&columns));
    Ok(columns)
}

/// The `columns` header value for `T`: names joined with commas.
///
/// # Errors
/// Returns [`ColumnError::NoColumns`] if every field is skipped.
pub fn column_list<T: Columns>(kind: TagKind) -> Result<String, ColumnError> {
    Ok(extract::<T>(kind)?.join(","))
}

/// Whether `T`'s columns for `kind` are already cached.
#[must_use]
pub fn is_cached<T: Columns>(kind: TagKind) -> bool {
    cached(&(TypeTag::of::<T>(), kind)).is_some()
}
