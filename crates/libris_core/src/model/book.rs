//! Book record and availability transitions.
//!
//! # Invariants
//! - `isbn` is trimmed on construction and on decode.
//! - `checked_out` only changes through `check_out` / `check_in`.

use crate::model::state::StateError;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt::{Display, Formatter};

/// Availability of one book as seen by circulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Availability {
    Available,
    CheckedOut,
}

impl Display for Availability {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Available => f.write_str("Available"),
            Self::CheckedOut => f.write_str("Checked Out"),
        }
    }
}

/// Catalog record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub title: String,
    pub author: String,
    /// Catalog key. Compared after trimming.
    #[serde(deserialize_with = "deserialize_trimmed")]
    pub isbn: String,
    /// Serialized as `is_checked_out` to keep existing data files readable.
    #[serde(rename = "is_checked_out", default)]
    pub checked_out: bool,
}

impl Book {
    /// Creates an available book. `isbn` is trimmed.
    pub fn new(
        title: impl Into<String>,
        author: impl Into<String>,
        isbn: impl AsRef<str>,
    ) -> Self {
        Self {
            title: title.into(),
            author: author.into(),
            isbn: normalize_isbn(isbn.as_ref()),
            checked_out: false,
        }
    }

    pub fn availability(&self) -> Availability {
        if self.checked_out {
            Availability::CheckedOut
        } else {
            Availability::Available
        }
    }

    /// Flips `Available -> CheckedOut`.
    ///
    /// # Errors
    /// - `StateError::AlreadyCheckedOut` when the flag is already set.
    pub fn check_out(&mut self) -> Result<(), StateError> {
        if self.checked_out {
            return Err(StateError::AlreadyCheckedOut {
                isbn: self.isbn.clone(),
            });
        }
        self.checked_out = true;
        Ok(())
    }

    /// Flips `CheckedOut -> Available`.
    ///
    /// # Errors
    /// - `StateError::NotCheckedOut` when the flag is not set.
    pub fn check_in(&mut self) -> Result<(), StateError> {
        if !self.checked_out {
            return Err(StateError::NotCheckedOut {
                isbn: self.isbn.clone(),
            });
        }
        self.checked_out = false;
        Ok(())
    }

    /// Returns whether `isbn` names this book after trimming.
    pub fn matches(&self, isbn: &str) -> bool {
        self.isbn == isbn.trim()
    }
}

impl Display for Book {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Book: {} by {} (ISBN: {}) - {}",
            self.title,
            self.author,
            self.isbn,
            self.availability()
        )
    }
}

/// Partial book edit. Blank fields are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookUpdate {
    pub title: Option<String>,
    pub author: Option<String>,
    pub isbn: Option<String>,
}

impl BookUpdate {
    /// Builds an update from raw prompt answers, where an empty answer means
    /// "keep the current value".
    pub fn from_answers(title: &str, author: &str, isbn: &str) -> Self {
        Self {
            title: non_blank(title),
            author: non_blank(author),
            isbn: non_blank(isbn),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.author.is_none() && self.isbn.is_none()
    }

    /// Trimmed new isbn requested by this update, if it differs from
    /// `current`.
    pub(crate) fn new_key(&self, current: &str) -> Option<String> {
        self.isbn
            .as_deref()
            .and_then(non_blank)
            .map(|isbn| normalize_isbn(&isbn))
            .filter(|isbn| isbn != current)
    }

    /// Applies the non-blank fields to `book`. Returns the previous isbn when
    /// the key changed.
    pub(crate) fn apply_to(&self, book: &mut Book) -> Option<String> {
        if let Some(title) = self.title.as_deref().and_then(non_blank) {
            book.title = title;
        }
        if let Some(author) = self.author.as_deref().and_then(non_blank) {
            book.author = author;
        }
        let new_isbn = self.new_key(&book.isbn)?;
        Some(std::mem::replace(&mut book.isbn, new_isbn))
    }
}

pub(crate) fn normalize_isbn(isbn: &str) -> String {
    isbn.trim().to_string()
}

pub(crate) fn non_blank(value: &str) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

fn deserialize_trimmed<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    Ok(normalize_isbn(&raw))
}
