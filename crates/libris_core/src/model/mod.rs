//! Domain model for catalog and membership records.
//!
//! # Responsibility
//! - Define the canonical `Book` and `User` records persisted by the store.
//! - Own the single-record state transitions used by circulation.
//!
//! # Invariants
//! - `Book::isbn` is always stored trimmed.
//! - `User::borrowed_isbns` never gains a duplicate through model helpers.

pub mod book;
pub mod state;
pub mod user;
