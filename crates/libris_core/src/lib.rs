//! Core domain logic for the Libris catalog manager.
//! This crate is the single source of truth for circulation invariants.

pub mod config;
pub mod logging;
pub mod model;
pub mod registry;
pub mod service;
pub mod store;

pub use config::LibraryConfig;
pub use logging::{default_log_level, init_from_config, init_logging, logging_status};
pub use model::book::{Availability, Book, BookUpdate};
pub use model::state::StateError;
pub use model::user::{User, UserUpdate};
pub use registry::catalog::Catalog;
pub use registry::membership::Membership;
pub use registry::{RegistryError, RegistryResult};
pub use service::audit::{check_consistency, ConsistencyReport, Discrepancy};
pub use service::circulation::{Action, Circulation, CirculationError, LoanReceipt};
pub use service::library::Library;
pub use service::report::{ActionReport, Classify, ErrorKind};
pub use store::{Collection, JsonFileStore, MemoryStore, RecordStore, StoreError, StoreResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
