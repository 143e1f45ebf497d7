//! Token issuance — the login flow.
//!
//! Verifies an email+password pair against the principal table (argon2
//! PHC hashes), then mints an opaque random token and persists it with
//! the configured expiry. Validation never looks at passwords; issuance
//! is the only place they are read.

use std::sync::Arc;

use argon2::Argon2;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use chrono::{Duration, Utc};
use serde::Serialize;

use tokenauth_core::{AuthOptions, format_sqlite};
use tokenauth_sql::{SQLError, SQLStore};

use crate::error::AuthError;
use crate::repo::{Principal, PrincipalRepository, TokenRepository};

/// Tokenable type stored alongside issued tokens.
const TOKENABLE_USER: &str = "user";
/// Default display name for issued tokens.
const TOKEN_NAME: &str = "api-token";

/// Result of a successful login.
#[derive(Debug, Serialize)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: Option<String>,
    pub principal: Principal,
}

/// Issues access tokens for principals.
pub struct TokenIssuer {
    principals: PrincipalRepository,
    tokens: TokenRepository,
    token_expiration: i64,
}

impl TokenIssuer {
    pub fn new(sql: Arc<dyn SQLStore>, options: &AuthOptions) -> Result<Self, SQLError> {
        Ok(Self {
            principals: PrincipalRepository::new(sql.clone(), options)?,
            tokens: TokenRepository::new(sql, options)?,
            token_expiration: options.token_expiration,
        })
    }

    /// Verify credentials and mint a token.
    ///
    /// Unknown email and wrong password fail identically, as
    /// [`AuthError::InvalidCredential`].
    pub fn login(&self, email: &str, password: &str) -> Result<IssuedToken, AuthError> {
        let row = self
            .principals
            .find_by_email(email)
            .map_err(|e| AuthError::StoreUnavailable(e.to_string()))?
            .ok_or(AuthError::InvalidCredential)?;

        let stored_hash = row.get_str("password").unwrap_or_default();
        if !verify_password(password, stored_hash) {
            return Err(AuthError::InvalidCredential);
        }

        let principal = Principal::from_row(&row).ok_or(AuthError::InvalidCredential)?;

        let token = generate_token()?;
        let expires_at = if self.token_expiration > 0 {
            Some(format_sqlite(Utc::now() + Duration::seconds(self.token_expiration)))
        } else {
            None
        };

        self.tokens
            .create(
                TOKENABLE_USER,
                principal.id,
                TOKEN_NAME,
                &token,
                expires_at.as_deref(),
            )
            .map_err(|e| AuthError::StoreUnavailable(e.to_string()))?;

        Ok(IssuedToken { token, expires_at, principal })
    }
}

/// Verify a password against a stored argon2 PHC string. Malformed hashes
/// verify as false.
pub fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok(),
        Err(_) => false,
    }
}

/// Hash a password into an argon2 PHC string; used by seeding flows.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AuthError::Internal(format!("password hashing failed: {e}")))
}

/// 32 random bytes, hex-encoded.
fn generate_token() -> Result<String, AuthError> {
    let mut bytes = [0u8; 32];
    getrandom::getrandom(&mut bytes)
        .map_err(|e| AuthError::Internal(format!("entropy unavailable: {e}")))?;
    Ok(bytes.iter().map(|b| format!("{b:02x}")).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokenauth_migrate::{MigrationManager, builtin_registry};
    use tokenauth_sql::SqliteStore;

    use crate::validate::TokenValidator;

    fn fixture() -> (Arc<dyn SQLStore>, AuthOptions, TokenIssuer) {
        let sql: Arc<dyn SQLStore> = Arc::new(SqliteStore::open_in_memory().unwrap());
        let opts = AuthOptions::default();
        MigrationManager::new(sql.clone(), builtin_registry(), opts.clone())
            .migrate()
            .unwrap();

        let principals = PrincipalRepository::new(sql.clone(), &opts).unwrap();
        let hash = hash_password("s3cret").unwrap();
        principals.create("Gauranga", "g@example.com", &hash).unwrap();

        let issuer = TokenIssuer::new(sql.clone(), &opts).unwrap();
        (sql, opts, issuer)
    }

    #[test]
    fn login_issues_a_validating_token() {
        let (sql, opts, issuer) = fixture();

        let issued = issuer.login("g@example.com", "s3cret").unwrap();
        assert_eq!(issued.token.len(), 64);
        assert!(issued.expires_at.is_some());
        assert!(!issued.principal.fields.contains_key("password"));

        let validator = TokenValidator::new(sql, &opts).unwrap();
        let principal = validator.validate(&issued.token).unwrap();
        assert_eq!(principal.id, issued.principal.id);
    }

    #[test]
    fn wrong_password_and_unknown_email_fail_alike() {
        let (_, _, issuer) = fixture();

        let a = issuer.login("g@example.com", "wrong").unwrap_err();
        let b = issuer.login("nobody@example.com", "s3cret").unwrap_err();
        assert!(matches!(a, AuthError::InvalidCredential));
        assert!(matches!(b, AuthError::InvalidCredential));
    }

    #[test]
    fn tokens_are_unique_per_login() {
        let (_, _, issuer) = fixture();
        let t1 = issuer.login("g@example.com", "s3cret").unwrap();
        let t2 = issuer.login("g@example.com", "s3cret").unwrap();
        assert_ne!(t1.token, t2.token);
    }

    #[test]
    fn zero_expiration_issues_eternal_tokens() {
        let sql: Arc<dyn SQLStore> = Arc::new(SqliteStore::open_in_memory().unwrap());
        let opts = AuthOptions { token_expiration: 0, ..AuthOptions::default() };
        MigrationManager::new(sql.clone(), builtin_registry(), opts.clone())
            .migrate()
            .unwrap();
        let principals = PrincipalRepository::new(sql.clone(), &opts).unwrap();
        let hash = hash_password("pw").unwrap();
        principals.create("A", "a@x", &hash).unwrap();

        let issuer = TokenIssuer::new(sql, &opts).unwrap();
        let issued = issuer.login("a@x", "pw").unwrap();
        assert!(issued.expires_at.is_none());
    }

    #[test]
    fn password_verify_rejects_garbage_hashes() {
        assert!(!verify_password("pw", "not-a-phc-string"));
        let hash = hash_password("pw").unwrap();
        assert!(verify_password("pw", &hash));
        assert!(!verify_password("other", &hash));
    }
}
