use std::path::Path;
use std::sync::Mutex;

use rusqlite::Connection;

use crate::error::SQLError;
use crate::traits::{Row, SQLStore, Value};

/// SqliteStore implements [`SQLStore`] over rusqlite (bundled SQLite).
///
/// The connection sits behind a mutex, so statements from concurrent
/// callers serialize; a `begin`..`commit` span therefore assumes a single
/// logical caller, which is how the migration engine drives it.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open or create a SQLite database at the given path.
    pub fn open(path: &Path) -> Result<Self, SQLError> {
        let conn =
            Connection::open(path).map_err(|e| SQLError::Connection(e.to_string()))?;

        // WAL keeps concurrent readers cheap.
        conn.execute_batch("PRAGMA journal_mode=WAL;")
            .map_err(|e| SQLError::Connection(e.to_string()))?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// In-memory database, used by tests.
    pub fn open_in_memory() -> Result<Self, SQLError> {
        let conn =
            Connection::open_in_memory().map_err(|e| SQLError::Connection(e.to_string()))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, SQLError> {
        self.conn
            .lock()
            .map_err(|e| SQLError::Connection(e.to_string()))
    }
}

/// Adapt our [`Value`] parameters to rusqlite's ToSql.
fn bind_params(params: &[Value]) -> Vec<Box<dyn rusqlite::types::ToSql + '_>> {
    params
        .iter()
        .map(|v| -> Box<dyn rusqlite::types::ToSql + '_> {
            match v {
                Value::Null => Box::new(rusqlite::types::Null),
                Value::Integer(i) => Box::new(*i),
                Value::Real(f) => Box::new(*f),
                Value::Text(s) => Box::new(s.as_str()),
                Value::Blob(b) => Box::new(b.as_slice()),
            }
        })
        .collect()
}

impl SQLStore for SqliteStore {
    fn query(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>, SQLError> {
        let conn = self.lock()?;

        let bound = bind_params(params);
        let param_refs: Vec<&dyn rusqlite::types::ToSql> =
            bound.iter().map(|b| b.as_ref()).collect();

        let mut stmt = conn
            .prepare(sql)
            .map_err(|e| SQLError::Query(e.to_string()))?;

        let column_names: Vec<String> = stmt
            .column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();

        let mapped = stmt
            .query_map(param_refs.as_slice(), |row| {
                let columns = column_names
                    .iter()
                    .enumerate()
                    .map(|(i, name)| (name.clone(), row_value_at(row, i)))
                    .collect();
                Ok(Row { columns })
            })
            .map_err(|e| SQLError::Query(e.to_string()))?;

        let mut result = Vec::new();
        for row in mapped {
            result.push(row.map_err(|e| SQLError::Query(e.to_string()))?);
        }
        Ok(result)
    }

    fn exec(&self, sql: &str, params: &[Value]) -> Result<u64, SQLError> {
        let conn = self.lock()?;

        let bound = bind_params(params);
        let param_refs: Vec<&dyn rusqlite::types::ToSql> =
            bound.iter().map(|b| b.as_ref()).collect();

        let affected = conn
            .execute(sql, param_refs.as_slice())
            .map_err(|e| SQLError::Execution(e.to_string()))?;

        Ok(affected as u64)
    }

    fn insert(&self, sql: &str, params: &[Value]) -> Result<i64, SQLError> {
        // Single lock span so the rowid belongs to this statement.
        let conn = self.lock()?;

        let bound = bind_params(params);
        let param_refs: Vec<&dyn rusqlite::types::ToSql> =
            bound.iter().map(|b| b.as_ref()).collect();

        conn.execute(sql, param_refs.as_slice())
            .map_err(|e| SQLError::Execution(e.to_string()))?;

        Ok(conn.last_insert_rowid())
    }

    fn supports_transactions(&self) -> bool {
        true
    }

    fn begin(&self) -> Result<(), SQLError> {
        self.lock()?
            .execute_batch("BEGIN IMMEDIATE")
            .map_err(|e| SQLError::Execution(e.to_string()))
    }

    fn commit(&self) -> Result<(), SQLError> {
        self.lock()?
            .execute_batch("COMMIT")
            .map_err(|e| SQLError::Execution(e.to_string()))
    }

    fn rollback(&self) -> Result<(), SQLError> {
        self.lock()?
            .execute_batch("ROLLBACK")
            .map_err(|e| SQLError::Execution(e.to_string()))
    }
}

/// Extract a [`Value`] from a rusqlite row at a column index.
fn row_value_at(row: &rusqlite::Row, idx: usize) -> Value {
    match row.get_ref(idx) {
        Ok(rusqlite::types::ValueRef::Null) | Err(_) => Value::Null,
        Ok(rusqlite::types::ValueRef::Integer(i)) => Value::Integer(i),
        Ok(rusqlite::types::ValueRef::Real(f)) => Value::Real(f),
        Ok(rusqlite::types::ValueRef::Text(t)) => {
            Value::Text(String::from_utf8_lossy(t).into_owned())
        }
        Ok(rusqlite::types::ValueRef::Blob(b)) => Value::Blob(b.to_vec()),
    }
}
