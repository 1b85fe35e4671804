//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate checkout/return across the catalog and membership.
//! - Expose a single `Library` entry point to boundary layers.
//! - Translate core errors into presentation-neutral `ActionReport`s.

pub mod audit;
pub mod circulation;
pub mod library;
pub mod report;
