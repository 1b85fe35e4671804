//! Library member record.

use crate::model::book::{non_blank, normalize_isbn};
use crate::model::state::StateError;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Membership record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub name: String,
    /// Membership key.
    pub user_id: String,
    /// Held isbns in borrow order. Serialized as `borrowed_books`.
    #[serde(rename = "borrowed_books", default)]
    pub borrowed_isbns: Vec<String>,
}

impl User {
    pub fn new(name: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            user_id: user_id.into(),
            borrowed_isbns: Vec::new(),
        }
    }

    pub fn holds(&self, isbn: &str) -> bool {
        let isbn = isbn.trim();
        self.borrowed_isbns.iter().any(|held| held == isbn)
    }

    /// Records `isbn` as held by this user.
    ///
    /// # Errors
    /// - `StateError::AlreadyBorrowed` when the isbn is already held.
    pub fn borrow(&mut self, isbn: &str) -> Result<(), StateError> {
        if self.holds(isbn) {
            return Err(StateError::AlreadyBorrowed {
                user_id: self.user_id.clone(),
                isbn: normalize_isbn(isbn),
            });
        }
        self.borrowed_isbns.push(normalize_isbn(isbn));
        Ok(())
    }

    /// Drops `isbn` from the held set.
    ///
    /// # Errors
    /// - `StateError::NotBorrowed` when the isbn is not held.
    pub fn give_back(&mut self, isbn: &str) -> Result<(), StateError> {
        let isbn = isbn.trim();
        match self.borrowed_isbns.iter().position(|held| held == isbn) {
            Some(index) => {
                self.borrowed_isbns.remove(index);
                Ok(())
            }
            None => Err(StateError::NotBorrowed {
                user_id: self.user_id.clone(),
                isbn: isbn.to_string(),
            }),
        }
    }
}

impl Display for User {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "User: {} (ID: {}) - Borrowed Books: ", self.name, self.user_id)?;
        if self.borrowed_isbns.is_empty() {
            f.write_str("No books borrowed")
        } else {
            f.write_str(&self.borrowed_isbns.join(", "))
        }
    }
}

/// Partial user edit. Blank fields are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserUpdate {
    pub name: Option<String>,
    pub user_id: Option<String>,
}

impl UserUpdate {
    pub fn from_answers(name: &str, user_id: &str) -> Self {
        Self {
            name: non_blank(name),
            user_id: non_blank(user_id),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.user_id.is_none()
    }

    /// New key requested by this update, if it differs from `current`.
    pub(crate) fn new_key(&self, current: &str) -> Option<&str> {
        self.user_id
            .as_deref()
            .filter(|id| !id.trim().is_empty() && *id != current)
    }

    pub(crate) fn apply_to(&self, user: &mut User) {
        if let Some(name) = self.name.as_deref().and_then(non_blank) {
            user.name = name;
        }
        if let Some(user_id) = self.user_id.as_deref().and_then(non_blank) {
            user.user_id = user_id;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{User, UserUpdate};
    use crate::model::state::StateError;

    #[test]
    fn borrow_rejects_duplicates_and_give_back_rejects_missing() {
        let mut user = User::new("Alice Smith", "U1001");
        user.borrow(" 978-0451524935").unwrap();
        assert_eq!(user.borrowed_isbns, vec!["978-0451524935".to_string()]);

        let err = user.borrow("978-0451524935").unwrap_err();
        assert!(matches!(err, StateError::AlreadyBorrowed { .. }));
        assert_eq!(user.borrowed_isbns.len(), 1);

        user.give_back("978-0451524935").unwrap();
        assert!(user.borrowed_isbns.is_empty());
        assert_eq!(
            user.give_back("978-0451524935").unwrap_err(),
            StateError::NotBorrowed {
                user_id: "U1001".to_string(),
                isbn: "978-0451524935".to_string()
            }
        );
    }

    #[test]
    fn display_lists_held_isbns() {
        let mut user = User::new("Alice", "12345");
        assert_eq!(
            user.to_string(),
            "User: Alice (ID: 12345) - Borrowed Books: No books borrowed"
        );
        user.borrow("111").unwrap();
        user.borrow("222").unwrap();
        assert_eq!(
            user.to_string(),
            "User: Alice (ID: 12345) - Borrowed Books: 111, 222"
        );
    }

    #[test]
    fn update_ignores_blank_answers() {
        let mut user = User::new("Alice", "U1");
        let update = UserUpdate::from_answers("   ", "U2");
        assert_eq!(update.new_key("U1"), Some("U2"));
        update.apply_to(&mut user);
        assert_eq!(user.name, "Alice");
        assert_eq!(user.user_id, "U2");
        assert!(UserUpdate::from_answers("", "").is_empty());
    }

    #[test]
    fn missing_borrowed_books_defaults_to_empty() {
        let user: User = serde_json::from_str(r#"{"name":"Bob","user_id":"U7"}"#).unwrap();
        assert!(user.borrowed_isbns.is_empty());
        let json = serde_json::to_value(&user).unwrap();
        assert!(json["borrowed_books"].as_array().unwrap().is_empty());
    }
}
