//! In-memory registries mirroring the persisted collections.
//!
//! # Responsibility
//! - Own the ordered `Book` and `User` collections loaded from the store.
//! - Rewrite the whole collection through the store after each mutation.
//!
//! # Invariants
//! - Read accessors hand out shared views only; every mutation is a named
//!   registry operation.
//! - A mutation whose write fails is undone in memory before returning.
//! - Load failures degrade to an empty collection and are kept as a warning.

use crate::model::state::StateError;
use crate::service::report::{Classify, ErrorKind};
use crate::store::StoreError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod catalog;
pub mod membership;

pub type RegistryResult<T> = Result<T, RegistryError>;

/// Failure of one catalog or membership operation.
#[derive(Debug)]
pub enum RegistryError {
    BookNotFound(String),
    UserNotFound(String),
    UserAlreadyExists(String),
    InvalidState(StateError),
    Store(StoreError),
}

impl Classify for RegistryError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::BookNotFound(_) | Self::UserNotFound(_) => ErrorKind::NotFound,
            Self::UserAlreadyExists(_) => ErrorKind::AlreadyExists,
            Self::InvalidState(_) => ErrorKind::InvalidState,
            Self::Store(_) => ErrorKind::PersistenceFailure,
        }
    }
}

impl Display for RegistryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BookNotFound(isbn) => write!(f, "Book with ISBN {isbn} not found."),
            Self::UserNotFound(user_id) => write!(f, "User with ID {user_id} not found."),
            Self::UserAlreadyExists(user_id) => {
                write!(f, "User with ID {user_id} already exists.")
            }
            Self::InvalidState(err) => write!(f, "{err}"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for RegistryError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidState(err) => Some(err),
            Self::Store(err) => Some(err),
            _ => None,
        }
    }
}

impl From<StoreError> for RegistryError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

impl From<StateError> for RegistryError {
    fn from(value: StateError) -> Self {
        Self::InvalidState(value)
    }
}
