use crate::error::SQLError;

/// A dynamically-typed SQL parameter or result value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

/// A result row: column name paired with its value, in select order.
#[derive(Debug, Clone)]
pub struct Row {
    pub columns: Vec<(String, Value)>,
}

impl Row {
    /// Look up a column value by name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.columns.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Text column by name, `None` if absent or not text.
    pub fn get_str(&self, name: &str) -> Option<&str> {
        match self.get(name) {
            Some(Value::Text(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Integer column by name.
    pub fn get_i64(&self, name: &str) -> Option<i64> {
        match self.get(name) {
            Some(Value::Integer(i)) => Some(*i),
            _ => None,
        }
    }

    /// Real column by name.
    pub fn get_f64(&self, name: &str) -> Option<f64> {
        match self.get(name) {
            Some(Value::Real(f)) => Some(*f),
            _ => None,
        }
    }
}

/// SQLStore is the minimal store contract: execute a parameterized
/// statement, fetch rows. Values are always bound, never interpolated.
///
/// Transaction hooks default to no-ops so that backends without
/// transactional scoping still satisfy the trait; callers that need
/// atomicity must consult [`SQLStore::supports_transactions`] first and
/// degrade explicitly when it reports `false`.
pub trait SQLStore: Send + Sync {
    /// Execute a query and return all rows.
    fn query(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>, SQLError>;

    /// Execute a statement (INSERT/UPDATE/DELETE/DDL); returns affected rows.
    fn exec(&self, sql: &str, params: &[Value]) -> Result<u64, SQLError>;

    /// Execute an INSERT and return the generated row id.
    fn insert(&self, sql: &str, params: &[Value]) -> Result<i64, SQLError>;

    /// Whether `begin`/`commit`/`rollback` provide real atomicity.
    fn supports_transactions(&self) -> bool {
        false
    }

    /// Open a scoped unit of work. No-op unless the backend supports it.
    fn begin(&self) -> Result<(), SQLError> {
        Ok(())
    }

    /// Commit the current unit of work.
    fn commit(&self) -> Result<(), SQLError> {
        Ok(())
    }

    /// Abandon the current unit of work.
    fn rollback(&self) -> Result<(), SQLError> {
        Ok(())
    }

    /// Convenience: first row of a query, if any.
    fn query_one(&self, sql: &str, params: &[Value]) -> Result<Option<Row>, SQLError> {
        Ok(self.query(sql, params)?.into_iter().next())
    }
}
