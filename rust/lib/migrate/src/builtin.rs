//! The built-in migration set for the token-authentication schema.
//!
//! Four steps: the ledger itself, the access-token table, the additive
//! principal-table fix, and the password-reset-token table. Configured
//! table/column names pass through [`Ident`] before reaching identifier
//! position; request data never gets near these statements.

use tracing::warn;

use tokenauth_core::AuthOptions;
use tokenauth_sql::{Ident, SQLError, SQLStore, Value};

use crate::manager::LEDGER_TABLE;
use crate::registry::{Migration, Registry};

/// The default registry, in declaration (= execution) order.
pub fn builtin_registry() -> Registry {
    Registry::new(vec![
        Migration {
            version: 1,
            name: "create_ledger",
            up: create_ledger_up,
            down: create_ledger_down,
        },
        Migration {
            version: 2,
            name: "create_token_table",
            up: create_token_table_up,
            down: create_token_table_down,
        },
        Migration {
            version: 3,
            name: "add_principal_columns",
            up: add_principal_columns_up,
            down: add_principal_columns_down,
        },
        Migration {
            version: 4,
            name: "create_reset_tokens",
            up: create_reset_tokens_up,
            down: create_reset_tokens_down,
        },
    ])
    .expect("built-in migration versions are strictly increasing")
}

fn create_ledger_up(sql: &dyn SQLStore, _: &AuthOptions) -> Result<(), SQLError> {
    sql.exec(
        &format!(
            "CREATE TABLE IF NOT EXISTS {LEDGER_TABLE} (\
                id INTEGER PRIMARY KEY AUTOINCREMENT, \
                version INTEGER NOT NULL, \
                name TEXT NOT NULL, \
                executed_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP)"
        ),
        &[],
    )?;
    Ok(())
}

fn create_ledger_down(sql: &dyn SQLStore, _: &AuthOptions) -> Result<(), SQLError> {
    sql.exec(&format!("DROP TABLE IF EXISTS {LEDGER_TABLE}"), &[])?;
    Ok(())
}

fn create_token_table_up(sql: &dyn SQLStore, options: &AuthOptions) -> Result<(), SQLError> {
    let table = Ident::new(&options.token_table)?;
    let field = Ident::new(&options.token_field)?;

    sql.exec(
        &format!(
            "CREATE TABLE IF NOT EXISTS {table} (\
                id INTEGER PRIMARY KEY AUTOINCREMENT, \
                tokenable_type TEXT NOT NULL, \
                tokenable_id INTEGER NOT NULL, \
                name TEXT NOT NULL, \
                {field} TEXT UNIQUE NOT NULL, \
                abilities TEXT, \
                last_used_at TIMESTAMP, \
                expires_at TIMESTAMP, \
                created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP, \
                updated_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP)"
        ),
        &[],
    )?;

    sql.exec(
        &format!(
            "CREATE INDEX IF NOT EXISTS idx_{table}_tokenable \
             ON {table}(tokenable_type, tokenable_id)"
        ),
        &[],
    )?;
    sql.exec(
        &format!("CREATE INDEX IF NOT EXISTS idx_{table}_{field} ON {table}({field})"),
        &[],
    )?;
    sql.exec(
        &format!("CREATE INDEX IF NOT EXISTS idx_{table}_expires ON {table}(expires_at)"),
        &[],
    )?;
    Ok(())
}

fn create_token_table_down(sql: &dyn SQLStore, options: &AuthOptions) -> Result<(), SQLError> {
    let table = Ident::new(&options.token_table)?;
    sql.exec(&format!("DROP TABLE IF EXISTS {table}"), &[])?;
    Ok(())
}

/// One-time additive fix for the principal table: create it when absent,
/// otherwise add the columns this module relies on. Deliberately NOT a
/// standing reconciler — it runs once and is recorded in the ledger like
/// any other migration.
fn add_principal_columns_up(sql: &dyn SQLStore, options: &AuthOptions) -> Result<(), SQLError> {
    let table = Ident::new(&options.auth_table)?;

    let existing = sql.query(
        "SELECT name FROM sqlite_master WHERE type='table' AND name=?1",
        &[Value::Text(table.as_str().to_string())],
    )?;

    if existing.is_empty() {
        sql.exec(
            &format!(
                "CREATE TABLE {table} (\
                    id INTEGER PRIMARY KEY AUTOINCREMENT, \
                    name TEXT NOT NULL, \
                    email TEXT UNIQUE NOT NULL, \
                    password TEXT NOT NULL, \
                    email_verified_at TIMESTAMP, \
                    created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP, \
                    updated_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP)"
            ),
            &[],
        )?;
    } else {
        let columns = sql.query(&format!("PRAGMA table_info({table})"), &[])?;
        let present: Vec<&str> = columns.iter().filter_map(|row| row.get_str("name")).collect();

        let wanted: &[(&str, &str)] = &[
            ("created_at", "TIMESTAMP DEFAULT CURRENT_TIMESTAMP"),
            ("updated_at", "TIMESTAMP DEFAULT CURRENT_TIMESTAMP"),
            ("email_verified_at", "TIMESTAMP"),
            ("password", "TEXT"),
        ];
        for (column, definition) in wanted {
            if !present.contains(column) {
                sql.exec(
                    &format!("ALTER TABLE {table} ADD COLUMN {column} {definition}"),
                    &[],
                )?;
            }
        }
    }

    sql.exec(
        &format!("CREATE INDEX IF NOT EXISTS idx_{table}_email ON {table}(email)"),
        &[],
    )?;
    Ok(())
}

fn add_principal_columns_down(_: &dyn SQLStore, options: &AuthOptions) -> Result<(), SQLError> {
    // Dropping columns from a live principal table loses data; this down
    // is a recorded no-op.
    warn!(
        table = %options.auth_table,
        "down migration for add_principal_columns is not implemented for safety"
    );
    Ok(())
}

fn create_reset_tokens_up(sql: &dyn SQLStore, _: &AuthOptions) -> Result<(), SQLError> {
    sql.exec(
        "CREATE TABLE IF NOT EXISTS password_reset_tokens (\
            id INTEGER PRIMARY KEY AUTOINCREMENT, \
            email TEXT NOT NULL, \
            token TEXT UNIQUE NOT NULL, \
            created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP)",
        &[],
    )?;
    sql.exec(
        "CREATE INDEX IF NOT EXISTS idx_password_reset_tokens_email \
         ON password_reset_tokens(email)",
        &[],
    )?;
    sql.exec(
        "CREATE INDEX IF NOT EXISTS idx_password_reset_tokens_token \
         ON password_reset_tokens(token)",
        &[],
    )?;
    Ok(())
}

fn create_reset_tokens_down(sql: &dyn SQLStore, _: &AuthOptions) -> Result<(), SQLError> {
    sql.exec("DROP TABLE IF EXISTS password_reset_tokens", &[])?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::manager::MigrationManager;
    use tokenauth_sql::SqliteStore;

    fn manager() -> (Arc<dyn SQLStore>, MigrationManager) {
        let sql: Arc<dyn SQLStore> = Arc::new(SqliteStore::open_in_memory().unwrap());
        let m = MigrationManager::new(sql.clone(), builtin_registry(), AuthOptions::default());
        (sql, m)
    }

    fn table_exists(sql: &dyn SQLStore, name: &str) -> bool {
        !sql.query(
            "SELECT name FROM sqlite_master WHERE type='table' AND name=?1",
            &[Value::Text(name.to_string())],
        )
        .unwrap()
        .is_empty()
    }

    #[test]
    fn full_scenario_migrate_rollback_remigrate() {
        let (sql, m) = manager();

        assert_eq!(m.migrate().unwrap(), 4);
        let status = m.status();
        assert_eq!(status.executed.len(), 4);
        assert!(status.pending.is_empty());

        // Rolling one step back removes only the newest migration; token
        // and principal tables stay, and the ledger is still present.
        assert_eq!(m.rollback(1).unwrap(), 1);
        let status = m.status();
        assert_eq!(status.executed.len(), 3);
        assert_eq!(status.pending.len(), 1);
        assert_eq!(status.pending[0].name, "create_reset_tokens");
        assert!(!table_exists(sql.as_ref(), "password_reset_tokens"));
        assert!(table_exists(sql.as_ref(), "personal_access_tokens"));
        assert!(table_exists(sql.as_ref(), "users"));
        assert!(table_exists(sql.as_ref(), "migrations"));

        // Reapplying restores all four.
        assert_eq!(m.migrate().unwrap(), 1);
        assert_eq!(m.status().executed.len(), 4);
        assert!(table_exists(sql.as_ref(), "password_reset_tokens"));
    }

    #[test]
    fn builtin_creates_expected_tables() {
        let (sql, m) = manager();
        m.migrate().unwrap();

        for table in ["migrations", "personal_access_tokens", "users", "password_reset_tokens"] {
            assert!(table_exists(sql.as_ref(), table), "missing table {table}");
        }
    }

    #[test]
    fn additive_fix_extends_preexisting_principal_table() {
        let sql: Arc<dyn SQLStore> = Arc::new(SqliteStore::open_in_memory().unwrap());
        // A legacy installation: users table exists without the module's
        // columns.
        sql.exec("CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT, email TEXT)", &[])
            .unwrap();

        let m = MigrationManager::new(sql.clone(), builtin_registry(), AuthOptions::default());
        m.migrate().unwrap();

        let columns = sql.query("PRAGMA table_info(users)", &[]).unwrap();
        let names: Vec<&str> = columns.iter().filter_map(|r| r.get_str("name")).collect();
        for expected in ["password", "created_at", "updated_at", "email_verified_at"] {
            assert!(names.contains(&expected), "missing column {expected}");
        }

        // Legacy data survives the fix.
        sql.exec("INSERT INTO users (name, email, password) VALUES ('A', 'a@x', 'h')", &[])
            .unwrap();
        assert!(table_exists(sql.as_ref(), "personal_access_tokens"));
    }

    #[test]
    fn custom_table_names_flow_through() {
        let sql: Arc<dyn SQLStore> = Arc::new(SqliteStore::open_in_memory().unwrap());
        let options = AuthOptions {
            auth_table: "accounts".to_string(),
            token_table: "api_tokens".to_string(),
            token_field: "secret".to_string(),
            ..AuthOptions::default()
        };
        let m = MigrationManager::new(sql.clone(), builtin_registry(), options);
        m.migrate().unwrap();

        assert!(table_exists(sql.as_ref(), "accounts"));
        assert!(table_exists(sql.as_ref(), "api_tokens"));
        let columns = sql.query("PRAGMA table_info(api_tokens)", &[]).unwrap();
        assert!(columns.iter().any(|r| r.get_str("name") == Some("secret")));
    }

    #[test]
    fn hostile_table_name_fails_validation() {
        let sql: Arc<dyn SQLStore> = Arc::new(SqliteStore::open_in_memory().unwrap());
        let options = AuthOptions {
            token_table: "tokens; DROP TABLE users".to_string(),
            ..AuthOptions::default()
        };
        let m = MigrationManager::new(sql, builtin_registry(), options);
        let err = m.migrate().unwrap_err();
        assert!(matches!(err, crate::MigrationError::Step { version: 2, .. }));
    }
}
