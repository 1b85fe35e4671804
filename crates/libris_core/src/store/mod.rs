//! Record store port and implementations.
//!
//! # Responsibility
//! - Define the whole-collection persistence contract consumed by registries.
//! - Keep file format details out of catalog and membership logic.
//!
//! # Invariants
//! - `load_all` of a collection that was never written yields an empty list.
//! - `replace_all` rewrites the full collection; there is no partial write API.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

use serde::de::DeserializeOwned;
use serde::Serialize;

mod json_file;
mod memory;

pub use json_file::JsonFileStore;
pub use memory::MemoryStore;

pub type StoreResult<T> = Result<T, StoreError>;

/// Named, independently persisted record collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Collection {
    Books,
    Users,
}

impl Collection {
    pub fn name(self) -> &'static str {
        match self {
            Self::Books => "books",
            Self::Users => "users",
        }
    }
}

impl Display for Collection {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Persistence failure raised by a record store.
#[derive(Debug)]
pub enum StoreError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Decode {
        collection: Collection,
        source: serde_json::Error,
    },
    Encode {
        collection: Collection,
        source: serde_json::Error,
    },
    /// Store refused the write (used by the in-memory store's fault injection).
    WriteRejected(Collection),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "i/o error on `{}`: {source}", path.display()),
            Self::Decode { collection, source } => {
                write!(f, "malformed {collection} data: {source}")
            }
            Self::Encode { collection, source } => {
                write!(f, "failed to encode {collection} data: {source}")
            }
            Self::WriteRejected(collection) => write!(f, "write rejected for {collection}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Decode { source, .. } | Self::Encode { source, .. } => Some(source),
            Self::WriteRejected(_) => None,
        }
    }
}

/// Whole-collection persistence port.
///
/// Registries hold their own handle to the store, so implementations are
/// expected to be cheap to clone.
pub trait RecordStore {
    /// Loads every record of `collection` in persisted order.
    fn load_all<T: DeserializeOwned>(&self, collection: Collection) -> StoreResult<Vec<T>>;

    /// Replaces every record of `collection` with `records`.
    fn replace_all<T: Serialize>(&self, collection: Collection, records: &[T]) -> StoreResult<()>;
}
