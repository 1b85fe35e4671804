//! JSON flat-file record store.
//!
//! # Invariants
//! - One file per collection, holding a pretty-printed JSON array.
//! - A missing file reads as an empty collection.
//! - Files are opened and closed within a single call; no locking.
//! - Saves replace the file by rename, so readers see the old or the new
//!   collection, never a partial one.

use super::{Collection, RecordStore, StoreError, StoreResult};
use log::{debug, error, info};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Record store writing `books` and `users` to two JSON files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonFileStore {
    books_path: PathBuf,
    users_path: PathBuf,
}

impl JsonFileStore {
    pub fn new(books_path: impl Into<PathBuf>, users_path: impl Into<PathBuf>) -> Self {
        Self {
            books_path: books_path.into(),
            users_path: users_path.into(),
        }
    }

    /// Store using the default `books.json` / `users.json` names under `dir`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self::new(dir.join("books.json"), dir.join("users.json"))
    }

    pub fn path_for(&self, collection: Collection) -> &Path {
        match collection {
            Collection::Books => &self.books_path,
            Collection::Users => &self.users_path,
        }
    }
}

impl RecordStore for JsonFileStore {
    fn load_all<T: DeserializeOwned>(&self, collection: Collection) -> StoreResult<Vec<T>> {
        let path = self.path_for(collection);
        if !path.exists() {
            info!(
                "event=store_load module=store status=missing collection={} path={}",
                collection,
                path.display()
            );
            return Ok(Vec::new());
        }

        let raw = std::fs::read_to_string(path).map_err(|source| {
            error!(
                "event=store_load module=store status=error collection={} error_code=read_failed error={}",
                collection, source
            );
            StoreError::Io {
                path: path.to_path_buf(),
                source,
            }
        })?;

        let records: Vec<T> = serde_json::from_str(&raw).map_err(|source| {
            error!(
                "event=store_load module=store status=error collection={} error_code=decode_failed error={}",
                collection, source
            );
            StoreError::Decode { collection, source }
        })?;

        debug!(
            "event=store_load module=store status=ok collection={} count={}",
            collection,
            records.len()
        );
        Ok(records)
    }

    fn replace_all<T: Serialize>(&self, collection: Collection, records: &[T]) -> StoreResult<()> {
        let path = self.path_for(collection);
        let encoded = serde_json::to_string_pretty(records)
            .map_err(|source| StoreError::Encode { collection, source })?;

        let io_error = |source: std::io::Error| StoreError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(io_error)?;
        }
        if let Err(source) = write_replacing(path, encoded.as_bytes()) {
            error!(
                "event=store_save module=store status=error collection={} error_code=write_failed error={}",
                collection, source
            );
            return Err(io_error(source));
        }

        debug!(
            "event=store_save module=store status=ok collection={} count={}",
            collection,
            records.len()
        );
        Ok(())
    }
}

/// Writes `bytes` to a sibling temporary file and renames it over `path`,
/// so a failed write never leaves a truncated collection file behind.
fn write_replacing(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut staged = tempfile::NamedTempFile::new_in(dir)?;
    staged.write_all(bytes)?;
    staged.as_file().sync_all()?;
    staged.persist(path).map_err(|err| err.error)?;
    Ok(())
}
