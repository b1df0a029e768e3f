//! SQLite storage implementation for the net worth tracker.
//!
//! This crate provides all database-related functionality using Diesel with
//! SQLite. It implements the repository traits defined in `formue-core` and
//! contains:
//! - Database connection pooling and management
//! - Embedded Diesel migrations
//! - Repository implementations for all domain entities
//! - Database-specific model types (with Diesel derives)
//!
//! This is the only crate where Diesel dependencies exist; `core` and
//! `broker-sync` are database-agnostic and work with traits. All writes are
//! funneled through a single writer actor, so the sync path can rely on
//! serialized writes.

pub mod db;
pub mod errors;
pub mod schema;
pub mod utils;

// Repository implementations
pub mod accounts;
pub mod connections;
pub mod holdings;
pub mod mappings;
pub mod sync_history;
pub mod transactions;

// Re-export database utilities
pub use db::{create_pool, get_connection, init, run_migrations, DbConnection, DbPool, WriteHandle};

// Re-export storage errors
pub use errors::StorageError;

// Re-export from formue-core for convenience
pub use formue_core::errors::{DatabaseError, Error, Result};
