//! Versioned schema migrations over a [`tokenauth_sql::SQLStore`].
//!
//! A [`Registry`] is an immutable, declaration-ordered list of migrations;
//! the [`MigrationManager`] applies pending ones forward, rolls executed
//! ones back, and keeps the ledger table as the single source of truth for
//! what has run. Migrations must never run concurrently against one store —
//! ordering is a correctness requirement, not an optimization.

pub mod builtin;
pub mod error;
pub mod manager;
pub mod registry;

pub use builtin::builtin_registry;
pub use error::MigrationError;
pub use manager::{LedgerEntry, MigrationManager, MigrationStatus};
pub use registry::{Migration, MigrationFn, MigrationInfo, Registry};
