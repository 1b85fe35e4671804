//! User registry.
//!
//! # Invariants
//! - `user_id` is unique: both `add` and key-changing `update` reject
//!   collisions.
//! - A user who still holds books cannot be removed.
//! - Borrow bookkeeping (`record_borrow` / `record_return`) is only reachable
//!   from circulation and never persists by itself.

use super::{RegistryError, RegistryResult};
use crate::model::state::StateError;
use crate::model::user::{User, UserUpdate};
use crate::store::{Collection, RecordStore, StoreResult};
use log::{info, warn};

/// Ordered in-memory user collection backed by a record store.
#[derive(Debug)]
pub struct Membership<S: RecordStore> {
    store: S,
    users: Vec<User>,
    load_warning: Option<String>,
}

impl<S: RecordStore> Membership<S> {
    /// Loads membership, falling back to an empty collection when the stored
    /// data cannot be read.
    pub fn open(store: S) -> Self {
        match store.load_all::<User>(Collection::Users) {
            Ok(users) => {
                info!(
                    "event=registry_open module=membership status=ok count={}",
                    users.len()
                );
                Self {
                    store,
                    users,
                    load_warning: None,
                }
            }
            Err(err) => {
                warn!(
                    "event=registry_open module=membership status=degraded error={}",
                    err
                );
                Self {
                    store,
                    users: Vec::new(),
                    load_warning: Some(format!(
                        "Could not load users ({err}). Starting with no users."
                    )),
                }
            }
        }
    }

    pub fn try_open(store: S) -> RegistryResult<Self> {
        let users = store.load_all::<User>(Collection::Users)?;
        Ok(Self {
            store,
            users,
            load_warning: None,
        })
    }

    pub fn load_warning(&self) -> Option<&str> {
        self.load_warning.as_deref()
    }

    pub fn list(&self) -> &[User] {
        &self.users
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    pub fn find_by_id(&self, user_id: &str) -> Option<&User> {
        self.users.iter().find(|user| user.user_id == user_id)
    }

    /// Appends `user` unless its id is already registered.
    pub fn add(&mut self, user: User) -> RegistryResult<()> {
        if self.find_by_id(&user.user_id).is_some() {
            return Err(RegistryError::UserAlreadyExists(user.user_id));
        }
        self.users.push(user);
        if let Err(err) = self.persist() {
            self.users.pop();
            return Err(err.into());
        }
        info!(
            "event=user_add module=membership status=ok count={}",
            self.users.len()
        );
        Ok(())
    }

    /// Removes the user with `user_id` and returns the record.
    ///
    /// # Errors
    /// - `InvalidState(HoldsBooks)` while the user holds any book.
    pub fn remove(&mut self, user_id: &str) -> RegistryResult<User> {
        let index = self.require_index(user_id)?;
        let held = self.users[index].borrowed_isbns.len();
        if held > 0 {
            warn!(
                "event=user_guard module=membership status=rejected reason=holds_books user_id={} held={}",
                user_id, held
            );
            return Err(StateError::HoldsBooks {
                user_id: user_id.to_string(),
                held,
            }
            .into());
        }
        let removed = self.users.remove(index);
        if let Err(err) = self.persist() {
            self.users.insert(index, removed);
            return Err(err.into());
        }
        info!(
            "event=user_remove module=membership status=ok user_id={}",
            removed.user_id
        );
        Ok(removed)
    }

    /// Applies the non-blank fields of `update` and returns the edited user.
    pub fn update(&mut self, user_id: &str, update: &UserUpdate) -> RegistryResult<User> {
        let index = self.require_index(user_id)?;
        if let Some(new_id) = update.new_key(user_id) {
            if self.find_by_id(new_id).is_some() {
                return Err(RegistryError::UserAlreadyExists(new_id.to_string()));
            }
        }

        let previous = self.users[index].clone();
        update.apply_to(&mut self.users[index]);
        if let Err(err) = self.persist() {
            self.users[index] = previous;
            return Err(err.into());
        }

        let updated = self.users[index].clone();
        info!(
            "event=user_update module=membership status=ok user_id={}",
            updated.user_id
        );
        Ok(updated)
    }

    /// Adds `isbn` to the user's held set in memory only.
    pub(crate) fn record_borrow(&mut self, user_id: &str, isbn: &str) -> RegistryResult<()> {
        self.require_mut(user_id)?.borrow(isbn)?;
        Ok(())
    }

    /// Removes `isbn` from the user's held set in memory only.
    pub(crate) fn record_return(&mut self, user_id: &str, isbn: &str) -> RegistryResult<()> {
        self.require_mut(user_id)?.give_back(isbn)?;
        Ok(())
    }

    /// Puts `snapshot` back in place of the record with the same id, in
    /// memory only.
    pub(crate) fn restore(&mut self, snapshot: User) -> RegistryResult<()> {
        let slot = self.require_mut(&snapshot.user_id.clone())?;
        *slot = snapshot;
        Ok(())
    }

    pub(crate) fn persist(&self) -> StoreResult<()> {
        self.store.replace_all(Collection::Users, &self.users)
    }

    fn require_index(&self, user_id: &str) -> RegistryResult<usize> {
        self.users
            .iter()
            .position(|user| user.user_id == user_id)
            .ok_or_else(|| RegistryError::UserNotFound(user_id.to_string()))
    }

    fn require_mut(&mut self, user_id: &str) -> RegistryResult<&mut User> {
        self.users
            .iter_mut()
            .find(|user| user.user_id == user_id)
            .ok_or_else(|| RegistryError::UserNotFound(user_id.to_string()))
    }
}
