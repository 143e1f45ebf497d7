//! Minimal SQL store abstraction backed by embedded SQLite.
//!
//! Consumers depend on the [`SQLStore`] trait only; the concrete backend is
//! injected at startup. Identifier positions (table/column names) are filled
//! exclusively through [`Ident`], which enforces a configuration-time
//! allow-list — request data never reaches an identifier slot.

pub mod error;
pub mod ident;
pub mod sqlite;
pub mod traits;

pub use error::SQLError;
pub use ident::Ident;
pub use sqlite::SqliteStore;
pub use traits::{Row, SQLStore, Value};
