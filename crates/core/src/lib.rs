//! Formue Core - Domain entities and repository traits.
//!
//! This crate contains the database-agnostic domain model for the net worth
//! tracker. Repository traits defined here are implemented by the
//! `storage-sqlite` crate; the broker synchronization subsystem in
//! `broker-sync` only depends on the traits.

pub mod accounts;
pub mod connections;
pub mod errors;
pub mod holdings;
pub mod mappings;
pub mod sync_history;
pub mod transactions;

// Re-export error types
pub use errors::Error;
pub use errors::Result;
