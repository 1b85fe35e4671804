//! Cross-collection consistency audit.
//!
//! Reports every place where the book flags and the users' held sets
//! disagree. The audit never repairs anything; it exists so a stale users
//! file after a partial save is visible instead of silent.

use crate::model::book::Book;
use crate::model::user::User;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{Display, Formatter};

/// One violation of "flagged iff held by exactly one user".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Discrepancy {
    /// Book is flagged checked out but no user holds it.
    FlaggedWithoutHolder { isbn: String },
    /// More than one user holds the same isbn.
    HeldByMany { isbn: String, user_ids: Vec<String> },
    /// A user holds a book that is flagged available.
    HeldButAvailable { isbn: String, user_id: String },
    /// A user holds an isbn the catalog does not know.
    UnknownBook { isbn: String, user_id: String },
    /// The same isbn appears twice in one user's held set.
    DuplicateHold { isbn: String, user_id: String },
}

impl Display for Discrepancy {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FlaggedWithoutHolder { isbn } => {
                write!(f, "book {isbn} is checked out but no user holds it")
            }
            Self::HeldByMany { isbn, user_ids } => write!(
                f,
                "book {isbn} is held by several users: {}",
                user_ids.join(", ")
            ),
            Self::HeldButAvailable { isbn, user_id } => {
                write!(f, "user {user_id} holds book {isbn}, which is marked available")
            }
            Self::UnknownBook { isbn, user_id } => {
                write!(f, "user {user_id} holds unknown book {isbn}")
            }
            Self::DuplicateHold { isbn, user_id } => {
                write!(f, "user {user_id} lists book {isbn} more than once")
            }
        }
    }
}

/// Audit outcome in catalog order, followed by unknown isbns in key order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConsistencyReport {
    pub discrepancies: Vec<Discrepancy>,
}

impl ConsistencyReport {
    pub fn is_consistent(&self) -> bool {
        self.discrepancies.is_empty()
    }
}

/// Checks the book/holder relationship across both collections.
///
/// For duplicate isbns in the catalog only the first record is considered,
/// matching lookup semantics.
pub fn check_consistency(books: &[Book], users: &[User]) -> ConsistencyReport {
    let mut discrepancies = Vec::new();
    let mut holders: BTreeMap<&str, Vec<&str>> = BTreeMap::new();

    for user in users {
        let mut seen = BTreeSet::new();
        for isbn in &user.borrowed_isbns {
            if !seen.insert(isbn.as_str()) {
                discrepancies.push(Discrepancy::DuplicateHold {
                    isbn: isbn.clone(),
                    user_id: user.user_id.clone(),
                });
                continue;
            }
            holders
                .entry(isbn.as_str())
                .or_default()
                .push(user.user_id.as_str());
        }
    }

    let mut known = BTreeSet::new();
    for book in books {
        if !known.insert(book.isbn.as_str()) {
            continue;
        }
        match holders.get(book.isbn.as_str()) {
            None if book.checked_out => discrepancies.push(Discrepancy::FlaggedWithoutHolder {
                isbn: book.isbn.clone(),
            }),
            None => {}
            Some(user_ids) if user_ids.len() > 1 => {
                discrepancies.push(Discrepancy::HeldByMany {
                    isbn: book.isbn.clone(),
                    user_ids: user_ids.iter().map(|id| id.to_string()).collect(),
                });
            }
            Some(user_ids) if !book.checked_out => {
                for user_id in user_ids {
                    discrepancies.push(Discrepancy::HeldButAvailable {
                        isbn: book.isbn.clone(),
                        user_id: user_id.to_string(),
                    });
                }
            }
            Some(_) => {}
        }
    }

    for (isbn, user_ids) in &holders {
        if known.contains(isbn) {
            continue;
        }
        for user_id in user_ids {
            discrepancies.push(Discrepancy::UnknownBook {
                isbn: isbn.to_string(),
                user_id: user_id.to_string(),
            });
        }
    }

    ConsistencyReport { discrepancies }
}
