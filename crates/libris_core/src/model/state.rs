//! Circulation state errors shared by book and user transitions.

use std::error::Error;
use std::fmt::{Display, Formatter};

/// A transition was requested from a state that does not allow it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateError {
    /// Book is already flagged as checked out.
    AlreadyCheckedOut { isbn: String },
    /// Book is not flagged as checked out.
    NotCheckedOut { isbn: String },
    /// User already holds this isbn.
    AlreadyBorrowed { user_id: String, isbn: String },
    /// User does not hold this isbn.
    NotBorrowed { user_id: String, isbn: String },
    /// Book is on loan, so it cannot be removed or re-keyed.
    OnLoan { isbn: String },
    /// User still holds books, so the record cannot be removed.
    HoldsBooks { user_id: String, held: usize },
}

impl Display for StateError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AlreadyCheckedOut { isbn } => {
                write!(f, "book {isbn} is already checked out")
            }
            Self::NotCheckedOut { isbn } => write!(f, "book {isbn} is not checked out"),
            Self::AlreadyBorrowed { user_id, isbn } => {
                write!(f, "user {user_id} already holds book {isbn}")
            }
            Self::NotBorrowed { user_id, isbn } => {
                write!(f, "user {user_id} does not hold book {isbn}")
            }
            Self::OnLoan { isbn } => {
                write!(f, "book {isbn} is checked out and must be returned first")
            }
            Self::HoldsBooks { user_id, held } => {
                write!(f, "user {user_id} still holds {held} book(s) and must return them first")
            }
        }
    }
}

impl Error for StateError {}
