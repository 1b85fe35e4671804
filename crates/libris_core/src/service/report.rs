//! Boundary-facing outcome envelope.
//!
//! # Responsibility
//! - Collapse core results into `ok + kind + message` for presentation.
//! - Keep console wording out of registries and circulation.

use crate::store::StoreError;
use std::fmt::{Display, Formatter};

/// Coarse failure category shared by every core error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Book or user lookup miss.
    NotFound,
    /// Duplicate user id.
    AlreadyExists,
    /// Double checkout, double check-in, double borrow, or return of a book
    /// the user does not hold.
    InvalidState,
    /// Record store read/write/decode failure.
    PersistenceFailure,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::AlreadyExists => "already_exists",
            Self::InvalidState => "invalid_state",
            Self::PersistenceFailure => "persistence_failure",
        }
    }
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that can be mapped onto an `ErrorKind`.
pub trait Classify: Display {
    fn kind(&self) -> ErrorKind;
}

impl Classify for StoreError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::PersistenceFailure
    }
}

/// Result envelope consumed by the CLI and tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionReport {
    /// Whether the operation succeeded.
    pub ok: bool,
    /// Failure category; `None` on success.
    pub kind: Option<ErrorKind>,
    /// Human-readable outcome line.
    pub message: String,
}

impl ActionReport {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            ok: true,
            kind: None,
            message: message.into(),
        }
    }

    pub fn failure(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            ok: false,
            kind: Some(kind),
            message: message.into(),
        }
    }

    /// Builds a failure report whose message is the error's display text.
    pub fn from_error(err: &(impl Classify + ?Sized)) -> Self {
        Self::failure(err.kind(), err.to_string())
    }

    /// Maps a core result, rendering the success message from the value.
    pub fn from_result<T, E: Classify>(
        result: &Result<T, E>,
        on_success: impl FnOnce(&T) -> String,
    ) -> Self {
        match result {
            Ok(value) => Self::success(on_success(value)),
            Err(err) => Self::from_error(err),
        }
    }
}

impl Display for ActionReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::{ActionReport, ErrorKind};
    use crate::registry::RegistryError;

    #[test]
    fn from_result_maps_error_kind_and_message() {
        let result: Result<(), RegistryError> =
            Err(RegistryError::UserAlreadyExists("U1001".to_string()));
        let report = ActionReport::from_result(&result, |_| unreachable!());
        assert!(!report.ok);
        assert_eq!(report.kind, Some(ErrorKind::AlreadyExists));
        assert_eq!(report.message, "User with ID U1001 already exists.");
    }

    #[test]
    fn from_result_renders_success_message() {
        let result: Result<&str, RegistryError> = Ok("1984");
        let report = ActionReport::from_result(&result, |title| format!("Book '{title}' added."));
        assert!(report.ok);
        assert_eq!(report.kind, None);
        assert_eq!(report.to_string(), "Book '1984' added.");
    }
}
