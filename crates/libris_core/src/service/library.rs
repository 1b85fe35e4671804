//! Library facade owning both registries over one record store.

use crate::config::LibraryConfig;
use crate::model::book::{Book, BookUpdate};
use crate::model::user::{User, UserUpdate};
use crate::registry::catalog::Catalog;
use crate::registry::membership::Membership;
use crate::registry::RegistryResult;
use crate::service::audit::{check_consistency, ConsistencyReport};
use crate::service::circulation::{Circulation, CirculationError, LoanReceipt};
use crate::store::{JsonFileStore, RecordStore};
use log::{info, warn};

/// Catalog, membership, and circulation behind one handle.
#[derive(Debug)]
pub struct Library<S: RecordStore> {
    catalog: Catalog<S>,
    membership: Membership<S>,
}

impl Library<JsonFileStore> {
    /// Opens the JSON-file library described by `config`.
    pub fn open(config: &LibraryConfig) -> Self {
        info!(
            "event=library_open module=library status=start data_dir={}",
            config.data_dir.display()
        );
        Self::with_store(config.store())
    }
}

impl<S: RecordStore + Clone> Library<S> {
    /// Loads both collections from `store`. Load failures degrade to empty
    /// collections; see `load_warnings`.
    pub fn with_store(store: S) -> Self {
        let library = Self {
            catalog: Catalog::open(store.clone()),
            membership: Membership::open(store),
        };

        let report = library.consistency();
        if !report.is_consistent() {
            warn!(
                "event=library_open module=library status=inconsistent discrepancies={}",
                report.discrepancies.len()
            );
        }
        library
    }
}

impl<S: RecordStore> Library<S> {
    pub fn catalog(&self) -> &Catalog<S> {
        &self.catalog
    }

    pub fn membership(&self) -> &Membership<S> {
        &self.membership
    }

    /// Diagnostics from collections that could not be loaded.
    pub fn load_warnings(&self) -> Vec<&str> {
        [self.catalog.load_warning(), self.membership.load_warning()]
            .into_iter()
            .flatten()
            .collect()
    }

    pub fn add_book(&mut self, book: Book) -> RegistryResult<()> {
        self.catalog.add(book)
    }

    pub fn update_book(&mut self, isbn: &str, update: &BookUpdate) -> RegistryResult<Book> {
        self.catalog.update(isbn, update)
    }

    pub fn remove_book(&mut self, isbn: &str) -> RegistryResult<Book> {
        self.catalog.remove(isbn)
    }

    pub fn add_user(&mut self, user: User) -> RegistryResult<()> {
        self.membership.add(user)
    }

    pub fn update_user(&mut self, user_id: &str, update: &UserUpdate) -> RegistryResult<User> {
        self.membership.update(user_id, update)
    }

    pub fn remove_user(&mut self, user_id: &str) -> RegistryResult<User> {
        self.membership.remove(user_id)
    }

    /// Borrows both registries for a sequence of circulation calls.
    pub fn circulation(&mut self) -> Circulation<'_, S> {
        Circulation::new(&mut self.catalog, &mut self.membership)
    }

    pub fn check_out(&mut self, user_id: &str, isbn: &str) -> Result<LoanReceipt, CirculationError> {
        self.circulation().check_out(user_id, isbn)
    }

    pub fn return_book(
        &mut self,
        user_id: &str,
        isbn: &str,
    ) -> Result<LoanReceipt, CirculationError> {
        self.circulation().return_book(user_id, isbn)
    }

    pub fn consistency(&self) -> ConsistencyReport {
        check_consistency(self.catalog.list(), self.membership.list())
    }
}
