//! SQL identifier validation.
//!
//! There is no parameter binding for identifiers, so table and column names
//! configured at startup are validated once against a strict character
//! allow-list before they may ever appear in a statement.

use std::fmt;

use crate::error::SQLError;

const MAX_IDENT_LEN: usize = 64;

/// A validated SQL identifier (table or column name).
///
/// Invariant: the wrapped string is non-empty, at most 64 bytes, starts
/// with an ASCII letter or underscore, and contains only ASCII
/// alphanumerics and underscores. Safe to splice into identifier position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ident(String);

impl Ident {
    /// Validate a configured name. Fails with [`SQLError::Identifier`] on
    /// anything outside the allow-list.
    pub fn new(name: &str) -> Result<Self, SQLError> {
        if name.is_empty() || name.len() > MAX_IDENT_LEN {
            return Err(SQLError::Identifier(name.to_string()));
        }
        let mut chars = name.chars();
        let first = chars.next().unwrap_or('0');
        if !(first.is_ascii_alphabetic() || first == '_') {
            return Err(SQLError::Identifier(name.to_string()));
        }
        if !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(SQLError::Identifier(name.to_string()));
        }
        Ok(Self(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_ordinary_names() {
        assert!(Ident::new("users").is_ok());
        assert!(Ident::new("personal_access_tokens").is_ok());
        assert!(Ident::new("_private").is_ok());
        assert!(Ident::new("t2").is_ok());
    }

    #[test]
    fn rejects_injection_shapes() {
        assert!(Ident::new("").is_err());
        assert!(Ident::new("users; DROP TABLE users").is_err());
        assert!(Ident::new("users--").is_err());
        assert!(Ident::new("\"users\"").is_err());
        assert!(Ident::new("user name").is_err());
        assert!(Ident::new("1users").is_err());
        assert!(Ident::new(&"a".repeat(65)).is_err());
    }

    #[test]
    fn displays_bare() {
        let id = Ident::new("tokens").unwrap();
        assert_eq!(format!("SELECT * FROM {id}"), "SELECT * FROM tokens");
    }
}
