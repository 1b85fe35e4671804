//! Runtime configuration for a library instance.
//!
//! # Invariants
//! - Configuration is explicit; no environment variables are consulted.
//! - Relative paths resolve against the process working directory.

use crate::logging::default_log_level;
use crate::store::JsonFileStore;
use std::path::{Path, PathBuf};

pub const DEFAULT_BOOKS_FILE: &str = "books.json";
pub const DEFAULT_USERS_FILE: &str = "users.json";
const DEFAULT_LOG_DIR_NAME: &str = "logs";

/// Data file and logging locations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryConfig {
    /// Directory holding the collection files.
    pub data_dir: PathBuf,
    pub books_file: String,
    pub users_file: String,
    /// One of `trace|debug|info|warn|error`.
    pub log_level: String,
    /// Defaults to `<data_dir>/logs` when unset.
    pub log_dir: Option<PathBuf>,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self::in_dir(".")
    }
}

impl LibraryConfig {
    pub fn in_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            books_file: DEFAULT_BOOKS_FILE.to_string(),
            users_file: DEFAULT_USERS_FILE.to_string(),
            log_level: default_log_level().to_string(),
            log_dir: None,
        }
    }

    pub fn with_books_file(mut self, name: impl Into<String>) -> Self {
        self.books_file = name.into();
        self
    }

    pub fn with_users_file(mut self, name: impl Into<String>) -> Self {
        self.users_file = name.into();
        self
    }

    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    pub fn with_log_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.log_dir = Some(dir.into());
        self
    }

    pub fn books_path(&self) -> PathBuf {
        self.data_dir.join(&self.books_file)
    }

    pub fn users_path(&self) -> PathBuf {
        self.data_dir.join(&self.users_file)
    }

    /// Absolute log directory, as required by `init_logging`.
    pub fn resolved_log_dir(&self) -> PathBuf {
        let dir = self
            .log_dir
            .clone()
            .unwrap_or_else(|| self.data_dir.join(DEFAULT_LOG_DIR_NAME));
        absolutize(&dir)
    }

    pub fn store(&self) -> JsonFileStore {
        JsonFileStore::new(self.books_path(), self.users_path())
    }
}

fn absolutize(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    match std::env::current_dir() {
        Ok(cwd) => cwd.join(path),
        Err(_) => path.to_path_buf(),
    }
}
