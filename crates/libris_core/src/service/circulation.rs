//! Checkout/return coordinator.
//!
//! # Responsibility
//! - Keep a book's checkout flag and its borrower's held set in step.
//! - Persist the book side, then the user side, after both in-memory
//!   transitions succeeded.
//!
//! # Invariants
//! - Phase 1 flips the book flag; phase 2 updates the user. A phase-2 failure
//!   always runs the inverse of phase 1 before returning.
//! - A failed books write undoes both phases in memory; nothing on disk
//!   changed.
//! - A failed users write after a successful books write is reported as
//!   `PartiallyPersisted`. Memory keeps the committed state, matching the
//!   books file; the users file is stale until the next successful write.
//!   There is no transaction spanning both collections.

use crate::model::state::StateError;
use crate::model::user::User;
use crate::registry::catalog::Catalog;
use crate::registry::membership::Membership;
use crate::registry::{RegistryError, RegistryResult};
use crate::service::report::{Classify, ErrorKind};
use crate::store::{Collection, RecordStore, StoreError};
use log::{error, info};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Circulation transition kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    CheckOut,
    Return,
}

impl Action {
    fn as_str(self) -> &'static str {
        match self {
            Self::CheckOut => "check_out",
            Self::Return => "return",
        }
    }
}

impl Display for Action {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Successful checkout or return.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoanReceipt {
    pub action: Action,
    pub isbn: String,
    pub title: String,
    pub user_id: String,
    pub user_name: String,
}

impl Display for LoanReceipt {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let verb = match self.action {
            Action::CheckOut => "checked out by",
            Action::Return => "returned by",
        };
        write!(
            f,
            "Book '{}' (ISBN: {}) {} {} (ID: {}).",
            self.title, self.isbn, verb, self.user_name, self.user_id
        )
    }
}

/// Errors from circulation operations.
#[derive(Debug)]
pub enum CirculationError {
    UserNotFound(String),
    BookNotFound(String),
    /// Transition rejected; memory was left as before the call.
    InvalidState(StateError),
    /// A write failed before anything reached disk; memory was rolled back.
    Persistence {
        action: Action,
        collection: Collection,
        source: StoreError,
    },
    /// Books were written but users were not. The two files disagree about
    /// who holds `isbn`.
    PartiallyPersisted {
        action: Action,
        user_id: String,
        isbn: String,
        source: StoreError,
    },
    /// Registry failure outside the checkout contract.
    Registry(RegistryError),
}

impl Display for CirculationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UserNotFound(user_id) => write!(f, "User with ID {user_id} not found."),
            Self::BookNotFound(isbn) => write!(f, "Book with ISBN {isbn} not found."),
            Self::InvalidState(err) => write!(f, "{err}."),
            Self::Persistence {
                action,
                collection,
                source,
            } => write!(
                f,
                "{action} not saved: could not write {collection} ({source}); no changes were kept."
            ),
            Self::PartiallyPersisted {
                action,
                user_id,
                isbn,
                source,
            } => write!(
                f,
                "{action} of {isbn} for {user_id} saved to books but not to users ({source}); \
                 stored records disagree until the next successful save."
            ),
            Self::Registry(err) => write!(f, "{err}"),
        }
    }
}

impl Error for CirculationError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidState(err) => Some(err),
            Self::Persistence { source, .. } | Self::PartiallyPersisted { source, .. } => {
                Some(source)
            }
            Self::Registry(err) => Some(err),
            Self::UserNotFound(_) | Self::BookNotFound(_) => None,
        }
    }
}

impl Classify for CirculationError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::UserNotFound(_) | Self::BookNotFound(_) => ErrorKind::NotFound,
            Self::InvalidState(_) => ErrorKind::InvalidState,
            Self::Persistence { .. } | Self::PartiallyPersisted { .. } => {
                ErrorKind::PersistenceFailure
            }
            Self::Registry(err) => err.kind(),
        }
    }
}

impl From<RegistryError> for CirculationError {
    fn from(value: RegistryError) -> Self {
        match value {
            RegistryError::UserNotFound(user_id) => Self::UserNotFound(user_id),
            RegistryError::BookNotFound(isbn) => Self::BookNotFound(isbn),
            RegistryError::InvalidState(err) => Self::InvalidState(err),
            other => Self::Registry(other),
        }
    }
}

/// Coordinator borrowing both registries for the duration of one or more
/// circulation calls.
pub struct Circulation<'a, S: RecordStore> {
    catalog: &'a mut Catalog<S>,
    membership: &'a mut Membership<S>,
}

impl<'a, S: RecordStore> Circulation<'a, S> {
    pub fn new(catalog: &'a mut Catalog<S>, membership: &'a mut Membership<S>) -> Self {
        Self {
            catalog,
            membership,
        }
    }

    /// Checks `isbn` out to `user_id`.
    ///
    /// # Errors
    /// - `UserNotFound` / `BookNotFound` on lookup misses.
    /// - `InvalidState` when the book is already out or the user already
    ///   holds it; state is unchanged.
    /// - `Persistence` / `PartiallyPersisted` on write failures.
    pub fn check_out(
        &mut self,
        user_id: &str,
        isbn: &str,
    ) -> Result<LoanReceipt, CirculationError> {
        let (receipt, holder) = self.resolve(Action::CheckOut, user_id, isbn)?;

        self.catalog.mark_checked_out(&receipt.isbn)?;
        if let Err(err) = self.membership.record_borrow(user_id, &receipt.isbn) {
            log_undo(Action::CheckOut, self.catalog.mark_available(&receipt.isbn));
            return Err(self.rejected(&receipt, err));
        }

        self.commit(&receipt, holder)?;
        Ok(receipt)
    }

    /// Returns `isbn` from `user_id`.
    ///
    /// # Errors
    /// - `UserNotFound` / `BookNotFound` on lookup misses.
    /// - `InvalidState` when the book is not out or the user does not hold
    ///   it; the book flag is restored to its pre-call value.
    /// - `Persistence` / `PartiallyPersisted` on write failures.
    pub fn return_book(
        &mut self,
        user_id: &str,
        isbn: &str,
    ) -> Result<LoanReceipt, CirculationError> {
        let (receipt, holder) = self.resolve(Action::Return, user_id, isbn)?;

        self.catalog.mark_available(&receipt.isbn)?;
        if let Err(err) = self.membership.record_return(user_id, &receipt.isbn) {
            log_undo(Action::Return, self.catalog.mark_checked_out(&receipt.isbn));
            return Err(self.rejected(&receipt, err));
        }

        self.commit(&receipt, holder)?;
        Ok(receipt)
    }

    /// Looks up both records and snapshots the user before any change.
    fn resolve(
        &self,
        action: Action,
        user_id: &str,
        isbn: &str,
    ) -> Result<(LoanReceipt, User), CirculationError> {
        let user = self
            .membership
            .find_by_id(user_id)
            .ok_or_else(|| CirculationError::UserNotFound(user_id.to_string()))?;
        let book = self
            .catalog
            .find_by_isbn(isbn)
            .ok_or_else(|| CirculationError::BookNotFound(isbn.trim().to_string()))?;

        let receipt = LoanReceipt {
            action,
            isbn: book.isbn.clone(),
            title: book.title.clone(),
            user_id: user.user_id.clone(),
            user_name: user.name.clone(),
        };
        Ok((receipt, user.clone()))
    }

    fn rejected(&self, receipt: &LoanReceipt, err: RegistryError) -> CirculationError {
        info!(
            "event=circulation module=circulation status=rejected action={} user_id={} isbn={} error={}",
            receipt.action, receipt.user_id, receipt.isbn, err
        );
        err.into()
    }

    fn commit(&mut self, receipt: &LoanReceipt, holder: User) -> Result<(), CirculationError> {
        let action = receipt.action;
        if let Err(source) = self.catalog.persist() {
            self.revert(receipt, holder);
            error!(
                "event=circulation module=circulation status=error action={} collection=books user_id={} isbn={} error={}",
                action, receipt.user_id, receipt.isbn, source
            );
            return Err(CirculationError::Persistence {
                action,
                collection: Collection::Books,
                source,
            });
        }

        if let Err(source) = self.membership.persist() {
            error!(
                "event=circulation module=circulation status=partial action={} collection=users user_id={} isbn={} error={}",
                action, receipt.user_id, receipt.isbn, source
            );
            return Err(CirculationError::PartiallyPersisted {
                action,
                user_id: receipt.user_id.clone(),
                isbn: receipt.isbn.clone(),
                source,
            });
        }

        info!(
            "event=circulation module=circulation status=ok action={} user_id={} isbn={}",
            action, receipt.user_id, receipt.isbn
        );
        Ok(())
    }

    /// Undoes both in-memory phases of a transition that could not be saved.
    /// The user record is restored from its pre-call snapshot so held-set
    /// order matches the unchanged users file.
    fn revert(&mut self, receipt: &LoanReceipt, holder: User) {
        log_undo(receipt.action, self.membership.restore(holder));
        let book_side = match receipt.action {
            Action::CheckOut => self.catalog.mark_available(&receipt.isbn),
            Action::Return => self.catalog.mark_checked_out(&receipt.isbn),
        };
        log_undo(receipt.action, book_side);
    }
}

fn log_undo(action: Action, result: RegistryResult<()>) {
    if let Err(err) = result {
        error!(
            "event=circulation_undo module=circulation status=error action={} error={}",
            action, err
        );
    }
}
