//! Book registry.
//!
//! # Invariants
//! - Lookups compare trimmed isbns and return the first match.
//! - `add` does not check isbn uniqueness; duplicates resolve to the first
//!   inserted record on lookup.
//! - Updates happen in place, so insertion order survives edits and
//!   checkout flag flips.
//! - A checked-out book keeps its isbn and stays in the catalog until it is
//!   returned; the borrower's held set refers to it by that key.

use super::{RegistryError, RegistryResult};
use crate::model::book::{Book, BookUpdate};
use crate::model::state::StateError;
use crate::store::{Collection, RecordStore, StoreResult};
use log::{info, warn};

/// Ordered in-memory book collection backed by a record store.
#[derive(Debug)]
pub struct Catalog<S: RecordStore> {
    store: S,
    books: Vec<Book>,
    load_warning: Option<String>,
}

impl<S: RecordStore> Catalog<S> {
    /// Loads the catalog, falling back to an empty collection when the
    /// stored data cannot be read.
    pub fn open(store: S) -> Self {
        match store.load_all::<Book>(Collection::Books) {
            Ok(books) => {
                info!(
                    "event=registry_open module=catalog status=ok count={}",
                    books.len()
                );
                Self {
                    store,
                    books,
                    load_warning: None,
                }
            }
            Err(err) => {
                warn!(
                    "event=registry_open module=catalog status=degraded error={}",
                    err
                );
                Self {
                    store,
                    books: Vec::new(),
                    load_warning: Some(format!(
                        "Could not load books ({err}). Starting with an empty catalog."
                    )),
                }
            }
        }
    }

    /// Loads the catalog and fails instead of degrading.
    pub fn try_open(store: S) -> RegistryResult<Self> {
        let books = store.load_all::<Book>(Collection::Books)?;
        Ok(Self {
            store,
            books,
            load_warning: None,
        })
    }

    /// Diagnostic recorded when `open` fell back to an empty catalog.
    pub fn load_warning(&self) -> Option<&str> {
        self.load_warning.as_deref()
    }

    pub fn list(&self) -> &[Book] {
        &self.books
    }

    pub fn len(&self) -> usize {
        self.books.len()
    }

    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }

    pub fn find_by_isbn(&self, isbn: &str) -> Option<&Book> {
        self.books.iter().find(|book| book.matches(isbn))
    }

    /// Appends `book` and rewrites the collection.
    pub fn add(&mut self, book: Book) -> RegistryResult<()> {
        self.books.push(book);
        if let Err(err) = self.persist() {
            self.books.pop();
            return Err(err.into());
        }
        info!(
            "event=book_add module=catalog status=ok count={}",
            self.books.len()
        );
        Ok(())
    }

    /// Removes the first book matching `isbn` and returns it.
    ///
    /// # Errors
    /// - `InvalidState(OnLoan)` while the book is checked out.
    pub fn remove(&mut self, isbn: &str) -> RegistryResult<Book> {
        let index = self.require_index(isbn)?;
        self.ensure_not_on_loan(index)?;
        let removed = self.books.remove(index);
        if let Err(err) = self.persist() {
            self.books.insert(index, removed);
            return Err(err.into());
        }
        info!(
            "event=book_remove module=catalog status=ok isbn={}",
            removed.isbn
        );
        Ok(removed)
    }

    /// Applies the non-blank fields of `update` and returns the edited book.
    ///
    /// # Errors
    /// - `InvalidState(OnLoan)` when the isbn would change while the book is
    ///   checked out. Title and author edits are always allowed.
    pub fn update(&mut self, isbn: &str, update: &BookUpdate) -> RegistryResult<Book> {
        let index = self.require_index(isbn)?;
        if update.new_key(&self.books[index].isbn).is_some() {
            self.ensure_not_on_loan(index)?;
        }
        let previous = self.books[index].clone();
        let renamed_from = update.apply_to(&mut self.books[index]);
        if let Err(err) = self.persist() {
            self.books[index] = previous;
            return Err(err.into());
        }

        let updated = self.books[index].clone();
        match renamed_from {
            Some(old_isbn) => info!(
                "event=book_update module=catalog status=ok old_isbn={} isbn={}",
                old_isbn, updated.isbn
            ),
            None => info!(
                "event=book_update module=catalog status=ok isbn={}",
                updated.isbn
            ),
        }
        Ok(updated)
    }

    /// Sets the checkout flag in memory only. Circulation persists afterwards.
    pub(crate) fn mark_checked_out(&mut self, isbn: &str) -> RegistryResult<()> {
        self.require_mut(isbn)?.check_out()?;
        Ok(())
    }

    /// Clears the checkout flag in memory only.
    pub(crate) fn mark_available(&mut self, isbn: &str) -> RegistryResult<()> {
        self.require_mut(isbn)?.check_in()?;
        Ok(())
    }

    /// Rewrites the full book collection.
    pub(crate) fn persist(&self) -> StoreResult<()> {
        self.store.replace_all(Collection::Books, &self.books)
    }

    fn ensure_not_on_loan(&self, index: usize) -> RegistryResult<()> {
        let book = &self.books[index];
        if book.checked_out {
            warn!(
                "event=book_guard module=catalog status=rejected reason=on_loan isbn={}",
                book.isbn
            );
            return Err(StateError::OnLoan {
                isbn: book.isbn.clone(),
            }
            .into());
        }
        Ok(())
    }

    fn require_index(&self, isbn: &str) -> RegistryResult<usize> {
        self.books
            .iter()
            .position(|book| book.matches(isbn))
            .ok_or_else(|| RegistryError::BookNotFound(isbn.trim().to_string()))
    }

    fn require_mut(&mut self, isbn: &str) -> RegistryResult<&mut Book> {
        self.books
            .iter_mut()
            .find(|book| book.matches(isbn))
            .ok_or_else(|| RegistryError::BookNotFound(isbn.trim().to_string()))
    }
}
