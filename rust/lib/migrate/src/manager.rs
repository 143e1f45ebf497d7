use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use tokenauth_core::AuthOptions;
use tokenauth_sql::{SQLError, SQLStore, Value};

use crate::error::MigrationError;
use crate::registry::{Migration, MigrationInfo, Registry};

/// Name of the ledger table recording executed migrations.
pub const LEDGER_TABLE: &str = "migrations";

/// A persisted record of one executed migration.
#[derive(Debug, Clone, Serialize)]
pub struct LedgerEntry {
    pub id: i64,
    pub version: i64,
    pub name: String,
    pub executed_at: String,
}

/// Snapshot of what has run and what is still pending.
#[derive(Debug, Clone, Serialize)]
pub struct MigrationStatus {
    pub executed: Vec<LedgerEntry>,
    pub pending: Vec<MigrationInfo>,
}

/// Applies pending migrations, records and removes ledger entries, and
/// rolls executed migrations back.
///
/// The store handle is injected at construction; there is no process-wide
/// state, and the caller owns the store's lifecycle.
pub struct MigrationManager {
    sql: Arc<dyn SQLStore>,
    registry: Registry,
    options: AuthOptions,
}

impl MigrationManager {
    pub fn new(sql: Arc<dyn SQLStore>, registry: Registry, options: AuthOptions) -> Self {
        Self { sql, registry, options }
    }

    /// Executed ledger entries, ordered by version ascending.
    ///
    /// Fails soft: if the ledger cannot be read (most commonly because the
    /// ledger table does not exist yet), that IS the not-yet-migrated
    /// state, and the result is an empty list.
    pub fn executed(&self) -> Vec<LedgerEntry> {
        let sql = format!(
            "SELECT id, version, name, executed_at FROM {LEDGER_TABLE} ORDER BY version ASC"
        );
        match self.sql.query(&sql, &[]) {
            Ok(rows) => rows
                .iter()
                .filter_map(|row| {
                    Some(LedgerEntry {
                        id: row.get_i64("id")?,
                        version: row.get_i64("version")?,
                        name: row.get_str("name")?.to_string(),
                        executed_at: row.get_str("executed_at").unwrap_or_default().to_string(),
                    })
                })
                .collect(),
            Err(e) => {
                debug!(error = %e, "ledger not readable; treating as empty");
                Vec::new()
            }
        }
    }

    /// Apply all pending migrations, strictly sequentially, in declaration
    /// order. Returns the number applied.
    ///
    /// The ledger entry for each step is written only after its `up`
    /// succeeds, inside the same transaction where the store supports one.
    /// The first failure aborts the run; migrations applied earlier in the
    /// run stay recorded. Calling this again after a full success is a
    /// no-op.
    pub fn migrate(&self) -> Result<usize, MigrationError> {
        let executed: HashSet<i64> = self.executed().iter().map(|e| e.version).collect();
        let pending: Vec<&Migration> = self
            .registry
            .iter()
            .filter(|m| !executed.contains(&m.version))
            .collect();

        if pending.is_empty() {
            debug!("no pending migrations");
            return Ok(0);
        }

        let atomic = self.sql.supports_transactions();
        if !atomic {
            warn!("store does not support transactions; migrating without atomicity guarantees");
        }

        info!(count = pending.len(), "running migrations");
        let mut applied = 0;
        for migration in pending {
            info!(version = migration.version, name = migration.name, "applying migration");
            self.run_step(migration, atomic, Direction::Up)?;
            applied += 1;
        }
        Ok(applied)
    }

    /// Roll back the `steps` most recently executed migrations, newest
    /// first. Returns the number actually rolled back.
    ///
    /// A ledger entry whose version has no matching registry definition is
    /// skipped with a warning and left in the ledger — it is the only
    /// record that the step ever ran. A failing `down` aborts the
    /// remaining steps.
    pub fn rollback(&self, steps: usize) -> Result<usize, MigrationError> {
        let mut entries = self.executed();
        entries.sort_by(|a, b| b.version.cmp(&a.version));

        let targets: Vec<LedgerEntry> = entries.into_iter().take(steps).collect();
        if targets.is_empty() {
            debug!("no migrations to roll back");
            return Ok(0);
        }

        let atomic = self.sql.supports_transactions();
        if !atomic {
            warn!("store does not support transactions; rolling back without atomicity guarantees");
        }

        let mut reverted = 0;
        for entry in targets {
            let Some(migration) = self.registry.find(entry.version) else {
                warn!(
                    version = entry.version,
                    name = %entry.name,
                    "ledger entry has no matching migration definition; skipping"
                );
                continue;
            };
            info!(version = migration.version, name = migration.name, "rolling back migration");
            self.run_step(migration, atomic, Direction::Down)?;
            reverted += 1;
        }
        Ok(reverted)
    }

    /// Executed and pending sets, computed by the same rule as
    /// [`MigrationManager::migrate`], without mutating anything.
    pub fn status(&self) -> MigrationStatus {
        let executed = self.executed();
        let versions: HashSet<i64> = executed.iter().map(|e| e.version).collect();
        let pending = self
            .registry
            .iter()
            .filter(|m| !versions.contains(&m.version))
            .map(|m| MigrationInfo { version: m.version, name: m.name })
            .collect();
        MigrationStatus { executed, pending }
    }

    /// Run one step and its ledger bookkeeping, transactionally when the
    /// store supports it, so the store lands on exactly "before" or
    /// "after" the step.
    fn run_step(
        &self,
        migration: &Migration,
        atomic: bool,
        direction: Direction,
    ) -> Result<(), MigrationError> {
        if atomic {
            self.sql.begin()?;
        }

        let result = match direction {
            Direction::Up => (migration.up)(self.sql.as_ref(), &self.options)
                .and_then(|()| self.record(migration)),
            Direction::Down => (migration.down)(self.sql.as_ref(), &self.options)
                .and_then(|()| self.erase(migration.version)),
        };

        match result {
            Ok(()) => {
                if atomic {
                    self.sql.commit()?;
                }
                Ok(())
            }
            Err(source) => {
                if atomic {
                    if let Err(rb) = self.sql.rollback() {
                        warn!(error = %rb, "transaction rollback failed after migration error");
                    }
                }
                Err(MigrationError::Step {
                    version: migration.version,
                    name: migration.name.to_string(),
                    source,
                })
            }
        }
    }

    fn record(&self, migration: &Migration) -> Result<(), SQLError> {
        let sql = format!(
            "INSERT INTO {LEDGER_TABLE} (version, name, executed_at) \
             VALUES (?1, ?2, CURRENT_TIMESTAMP)"
        );
        self.sql.exec(
            &sql,
            &[Value::Integer(migration.version), Value::Text(migration.name.to_string())],
        )?;
        Ok(())
    }

    fn erase(&self, version: i64) -> Result<(), SQLError> {
        let sql = format!("DELETE FROM {LEDGER_TABLE} WHERE version = ?1");
        match self.sql.exec(&sql, &[Value::Integer(version)]) {
            Ok(_) => Ok(()),
            Err(e) => {
                // The step just rolled back may have dropped the ledger
                // table itself; a vanished ledger needs no bookkeeping.
                if self.ledger_readable() {
                    Err(e)
                } else {
                    debug!(version, "ledger gone after rollback step; nothing to erase");
                    Ok(())
                }
            }
        }
    }

    fn ledger_readable(&self) -> bool {
        let sql = format!("SELECT 1 FROM {LEDGER_TABLE} LIMIT 1");
        self.sql.query(&sql, &[]).is_ok()
    }
}

#[derive(Clone, Copy)]
enum Direction {
    Up,
    Down,
}
