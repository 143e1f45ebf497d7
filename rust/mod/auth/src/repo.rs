//! Typed repositories over the configured tables.
//!
//! Table and column names are supplied once, at configuration time, and
//! go through [`Ident`] validation before they can appear in identifier
//! position. Request-supplied data is only ever bound as a parameter.

use std::sync::Arc;

use serde::Serialize;

use tokenauth_core::AuthOptions;
use tokenauth_sql::{Ident, Row, SQLError, SQLStore, Value};

/// Columns never exposed on a principal view.
const SECRET_COLUMNS: &[&str] = &["password"];

/// A password-stripped view of a principal row.
#[derive(Debug, Clone, Serialize)]
pub struct Principal {
    pub id: i64,
    #[serde(flatten)]
    pub fields: serde_json::Map<String, serde_json::Value>,
}

impl Principal {
    /// Build the view from a raw row, dropping secret columns.
    pub fn from_row(row: &Row) -> Option<Self> {
        let id = row.get_i64("id")?;
        let mut fields = serde_json::Map::new();
        for (name, value) in &row.columns {
            if SECRET_COLUMNS.contains(&name.as_str()) {
                continue;
            }
            fields.insert(name.clone(), value_to_json(value));
        }
        Some(Self { id, fields })
    }
}

fn value_to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Null => serde_json::Value::Null,
        Value::Integer(i) => serde_json::Value::from(*i),
        Value::Real(f) => serde_json::Value::from(*f),
        Value::Text(s) => serde_json::Value::from(s.clone()),
        // Binary columns have no JSON view.
        Value::Blob(_) => serde_json::Value::Null,
    }
}

// ── Principals ──────────────────────────────────────────────────────

/// Accessor for the configured principal table.
pub struct PrincipalRepository {
    sql: Arc<dyn SQLStore>,
    table: Ident,
}

impl PrincipalRepository {
    pub fn new(sql: Arc<dyn SQLStore>, options: &AuthOptions) -> Result<Self, SQLError> {
        Ok(Self { sql, table: Ident::new(&options.auth_table)? })
    }

    /// Password-stripped principal by id.
    pub fn find_by_id(&self, id: i64) -> Result<Option<Principal>, SQLError> {
        let sql = format!("SELECT * FROM {} WHERE id = ?1 LIMIT 1", self.table);
        let row = self.sql.query_one(&sql, &[Value::Integer(id)])?;
        Ok(row.as_ref().and_then(Principal::from_row))
    }

    /// Raw row by email, secret columns included — login needs the stored
    /// hash. Never leaves this crate.
    pub(crate) fn find_by_email(&self, email: &str) -> Result<Option<Row>, SQLError> {
        let sql = format!("SELECT * FROM {} WHERE email = ?1 LIMIT 1", self.table);
        self.sql.query_one(&sql, &[Value::Text(email.to_string())])
    }

    /// Insert a principal; used by seeding and tests.
    pub fn create(&self, name: &str, email: &str, password_hash: &str) -> Result<i64, SQLError> {
        let sql = format!(
            "INSERT INTO {} (name, email, password, created_at, updated_at) \
             VALUES (?1, ?2, ?3, CURRENT_TIMESTAMP, CURRENT_TIMESTAMP)",
            self.table
        );
        self.sql.insert(
            &sql,
            &[
                Value::Text(name.to_string()),
                Value::Text(email.to_string()),
                Value::Text(password_hash.to_string()),
            ],
        )
    }
}

// ── Access tokens ───────────────────────────────────────────────────

/// One row of the configured token table.
#[derive(Debug, Clone)]
pub struct TokenRecord {
    pub id: i64,
    pub tokenable_type: String,
    pub tokenable_id: i64,
    pub name: String,
    pub token: String,
    pub abilities: Option<String>,
    pub last_used_at: Option<String>,
    pub expires_at: Option<String>,
}

impl TokenRecord {
    fn from_row(row: &Row, token_field: &str) -> Option<Self> {
        Some(Self {
            id: row.get_i64("id")?,
            tokenable_type: row.get_str("tokenable_type").unwrap_or_default().to_string(),
            tokenable_id: row.get_i64("tokenable_id")?,
            name: row.get_str("name").unwrap_or_default().to_string(),
            token: row.get_str(token_field)?.to_string(),
            abilities: row.get_str("abilities").map(str::to_string),
            last_used_at: row.get_str("last_used_at").map(str::to_string),
            expires_at: row.get_str("expires_at").map(str::to_string),
        })
    }
}

/// Accessor for the configured token table/column.
pub struct TokenRepository {
    sql: Arc<dyn SQLStore>,
    table: Ident,
    field: Ident,
}

impl TokenRepository {
    pub fn new(sql: Arc<dyn SQLStore>, options: &AuthOptions) -> Result<Self, SQLError> {
        Ok(Self {
            sql,
            table: Ident::new(&options.token_table)?,
            field: Ident::new(&options.token_field)?,
        })
    }

    /// Exact-match token lookup.
    pub fn find_by_token(&self, token: &str) -> Result<Option<TokenRecord>, SQLError> {
        let sql = format!(
            "SELECT * FROM {} WHERE {} = ?1 LIMIT 1",
            self.table, self.field
        );
        let row = self.sql.query_one(&sql, &[Value::Text(token.to_string())])?;
        Ok(row.and_then(|r| TokenRecord::from_row(&r, self.field.as_str())))
    }

    /// Persist a newly issued token; returns its row id.
    pub fn create(
        &self,
        tokenable_type: &str,
        tokenable_id: i64,
        name: &str,
        token: &str,
        expires_at: Option<&str>,
    ) -> Result<i64, SQLError> {
        let sql = format!(
            "INSERT INTO {} (tokenable_type, tokenable_id, name, {}, expires_at) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
            self.table, self.field
        );
        self.sql.insert(
            &sql,
            &[
                Value::Text(tokenable_type.to_string()),
                Value::Integer(tokenable_id),
                Value::Text(name.to_string()),
                Value::Text(token.to_string()),
                expires_at.map_or(Value::Null, |e| Value::Text(e.to_string())),
            ],
        )
    }

    /// Record that the token was just used. Best-effort by contract: the
    /// caller treats failure as non-fatal.
    pub fn touch_last_used(&self, id: i64) -> Result<(), SQLError> {
        let sql = format!(
            "UPDATE {} SET last_used_at = CURRENT_TIMESTAMP, updated_at = CURRENT_TIMESTAMP \
             WHERE id = ?1",
            self.table
        );
        self.sql.exec(&sql, &[Value::Integer(id)])?;
        Ok(())
    }

    /// Delete tokens whose expiry has passed; returns the number removed.
    /// An expiry sweep is an operator action, never part of the request
    /// path.
    pub fn delete_expired(&self) -> Result<u64, SQLError> {
        let sql = format!(
            "DELETE FROM {} WHERE expires_at IS NOT NULL AND expires_at < CURRENT_TIMESTAMP",
            self.table
        );
        self.sql.exec(&sql, &[])
    }
}

// ── Password reset tokens ───────────────────────────────────────────

/// Accessor for the password-reset-token table (fixed name, created by
/// the built-in migrations).
pub struct ResetTokenRepository {
    sql: Arc<dyn SQLStore>,
}

const RESET_TABLE: &str = "password_reset_tokens";

impl ResetTokenRepository {
    pub fn new(sql: Arc<dyn SQLStore>) -> Self {
        Self { sql }
    }

    /// Store a reset token, replacing any earlier one for the same email.
    pub fn create(&self, email: &str, token: &str) -> Result<i64, SQLError> {
        self.sql.exec(
            &format!("DELETE FROM {RESET_TABLE} WHERE email = ?1"),
            &[Value::Text(email.to_string())],
        )?;
        self.sql.insert(
            &format!(
                "INSERT INTO {RESET_TABLE} (email, token, created_at) \
                 VALUES (?1, ?2, CURRENT_TIMESTAMP)"
            ),
            &[Value::Text(email.to_string()), Value::Text(token.to_string())],
        )
    }

    /// Email owning a reset token, if the token is known.
    pub fn find_email(&self, token: &str) -> Result<Option<String>, SQLError> {
        let row = self.sql.query_one(
            &format!("SELECT email FROM {RESET_TABLE} WHERE token = ?1 LIMIT 1"),
            &[Value::Text(token.to_string())],
        )?;
        Ok(row.and_then(|r| r.get_str("email").map(str::to_string)))
    }

    /// Consume a reset token.
    pub fn delete(&self, token: &str) -> Result<bool, SQLError> {
        let affected = self.sql.exec(
            &format!("DELETE FROM {RESET_TABLE} WHERE token = ?1"),
            &[Value::Text(token.to_string())],
        )?;
        Ok(affected > 0)
    }

    /// Drop reset tokens older than `hours`.
    pub fn delete_older_than(&self, hours: i64) -> Result<u64, SQLError> {
        self.sql.exec(
            &format!(
                "DELETE FROM {RESET_TABLE} \
                 WHERE created_at < datetime('now', '-' || ?1 || ' hours')"
            ),
            &[Value::Integer(hours)],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokenauth_migrate::{MigrationManager, builtin_registry};
    use tokenauth_sql::SqliteStore;

    fn store() -> Arc<dyn SQLStore> {
        let sql: Arc<dyn SQLStore> = Arc::new(SqliteStore::open_in_memory().unwrap());
        MigrationManager::new(sql.clone(), builtin_registry(), AuthOptions::default())
            .migrate()
            .unwrap();
        sql
    }

    #[test]
    fn principal_view_strips_password() {
        let sql = store();
        let opts = AuthOptions::default();
        let principals = PrincipalRepository::new(sql, &opts).unwrap();

        let id = principals.create("Gauranga", "g@example.com", "argon-hash").unwrap();
        let p = principals.find_by_id(id).unwrap().unwrap();

        assert_eq!(p.id, id);
        assert_eq!(p.fields.get("name"), Some(&serde_json::Value::from("Gauranga")));
        assert_eq!(p.fields.get("email"), Some(&serde_json::Value::from("g@example.com")));
        assert!(!p.fields.contains_key("password"));

        let json = serde_json::to_value(&p).unwrap();
        assert!(json.get("password").is_none());
    }

    #[test]
    fn token_roundtrip_and_touch() {
        let sql = store();
        let opts = AuthOptions::default();
        let tokens = TokenRepository::new(sql, &opts).unwrap();

        let id = tokens.create("user", 1, "api-token", "tok_abc", None).unwrap();
        let rec = tokens.find_by_token("tok_abc").unwrap().unwrap();
        assert_eq!(rec.id, id);
        assert_eq!(rec.tokenable_id, 1);
        assert!(rec.last_used_at.is_none());
        assert!(rec.expires_at.is_none());

        tokens.touch_last_used(id).unwrap();
        let rec = tokens.find_by_token("tok_abc").unwrap().unwrap();
        assert!(rec.last_used_at.is_some());

        assert!(tokens.find_by_token("tok_other").unwrap().is_none());
    }

    #[test]
    fn expired_sweep_removes_only_expired_rows() {
        let sql = store();
        let opts = AuthOptions::default();
        let tokens = TokenRepository::new(sql, &opts).unwrap();

        tokens.create("user", 1, "old", "tok_old", Some("2001-01-01 00:00:00")).unwrap();
        tokens.create("user", 1, "eternal", "tok_eternal", None).unwrap();
        tokens.create("user", 1, "fresh", "tok_fresh", Some("2999-01-01 00:00:00")).unwrap();

        assert_eq!(tokens.delete_expired().unwrap(), 1);
        assert!(tokens.find_by_token("tok_old").unwrap().is_none());
        assert!(tokens.find_by_token("tok_eternal").unwrap().is_some());
        assert!(tokens.find_by_token("tok_fresh").unwrap().is_some());
    }

    #[test]
    fn reset_tokens_replace_per_email() {
        let sql = store();
        let resets = ResetTokenRepository::new(sql);

        resets.create("a@x", "first").unwrap();
        resets.create("a@x", "second").unwrap();

        assert!(resets.find_email("first").unwrap().is_none());
        assert_eq!(resets.find_email("second").unwrap().as_deref(), Some("a@x"));

        assert!(resets.delete("second").unwrap());
        assert!(!resets.delete("second").unwrap());
    }

    #[test]
    fn custom_token_column_is_honoured() {
        let sql: Arc<dyn SQLStore> = Arc::new(SqliteStore::open_in_memory().unwrap());
        let opts = AuthOptions {
            token_table: "api_tokens".to_string(),
            token_field: "secret".to_string(),
            ..AuthOptions::default()
        };
        MigrationManager::new(sql.clone(), builtin_registry(), opts.clone())
            .migrate()
            .unwrap();

        let tokens = TokenRepository::new(sql, &opts).unwrap();
        tokens.create("user", 9, "k", "tok_custom", None).unwrap();
        let rec = tokens.find_by_token("tok_custom").unwrap().unwrap();
        assert_eq!(rec.tokenable_id, 9);
        assert_eq!(rec.token, "tok_custom");
    }
}
