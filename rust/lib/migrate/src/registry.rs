use serde::Serialize;

use tokenauth_core::AuthOptions;
use tokenauth_sql::{SQLError, SQLStore};

use crate::error::MigrationError;

/// A forward or backward schema-change step.
pub type MigrationFn = fn(&dyn SQLStore, &AuthOptions) -> Result<(), SQLError>;

/// A versioned, named pair of forward/backward schema changes.
#[derive(Clone)]
pub struct Migration {
    pub version: i64,
    pub name: &'static str,
    pub up: MigrationFn,
    pub down: MigrationFn,
}

impl std::fmt::Debug for Migration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Migration")
            .field("version", &self.version)
            .field("name", &self.name)
            .finish()
    }
}

/// Lightweight view of a migration, for status output.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct MigrationInfo {
    pub version: i64,
    pub name: &'static str,
}

/// An immutable, declaration-ordered list of migrations.
///
/// Declaration order IS execution order; versions are never re-sorted.
/// Construction rejects lists whose versions are not strictly increasing,
/// so the two orders can never silently diverge.
pub struct Registry {
    migrations: Vec<Migration>,
}

impl Registry {
    pub fn new(migrations: Vec<Migration>) -> Result<Self, MigrationError> {
        for pair in migrations.windows(2) {
            if pair[1].version <= pair[0].version {
                return Err(MigrationError::Registry(format!(
                    "version {} ({}) does not increase over version {} ({})",
                    pair[1].version, pair[1].name, pair[0].version, pair[0].name
                )));
            }
        }
        Ok(Self { migrations })
    }

    /// Migrations in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &Migration> {
        self.migrations.iter()
    }

    /// Resolve a migration by version.
    pub fn find(&self, version: i64) -> Option<&Migration> {
        self.migrations.iter().find(|m| m.version == version)
    }

    pub fn len(&self) -> usize {
        self.migrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.migrations.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop(_: &dyn SQLStore, _: &AuthOptions) -> Result<(), SQLError> {
        Ok(())
    }

    fn mig(version: i64, name: &'static str) -> Migration {
        Migration { version, name, up: noop, down: noop }
    }

    #[test]
    fn accepts_strictly_increasing_versions() {
        let r = Registry::new(vec![mig(1, "a"), mig(2, "b"), mig(5, "c")]).unwrap();
        assert_eq!(r.len(), 3);
        assert_eq!(r.find(5).unwrap().name, "c");
        assert!(r.find(3).is_none());
    }

    #[test]
    fn rejects_duplicate_or_decreasing_versions() {
        assert!(Registry::new(vec![mig(1, "a"), mig(1, "b")]).is_err());
        assert!(Registry::new(vec![mig(2, "a"), mig(1, "b")]).is_err());
    }

    #[test]
    fn empty_registry_is_fine() {
        assert!(Registry::new(Vec::new()).unwrap().is_empty());
    }
}
