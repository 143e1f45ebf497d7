use thiserror::Error;

use tokenauth_sql::SQLError;

/// Migration failures. All terminal: nothing here is retried internally,
/// and partial progress stays observable through the ledger afterwards.
#[derive(Error, Debug)]
pub enum MigrationError {
    /// A migration step failed; names the offending migration.
    #[error("migration {name} (v{version}) failed: {source}")]
    Step {
        version: i64,
        name: String,
        source: SQLError,
    },

    /// The ledger itself (or the surrounding transaction) could not be
    /// read or written.
    #[error("ledger error: {0}")]
    Ledger(#[from] SQLError),

    /// The registry violates its ordering invariant.
    #[error("invalid registry: {0}")]
    Registry(String),
}
