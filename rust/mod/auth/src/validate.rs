//! Store-backed token validation.

use std::sync::Arc;

use chrono::Utc;
use tracing::warn;

use tokenauth_core::{AuthOptions, parse_timestamp};
use tokenauth_sql::{SQLError, SQLStore};

use crate::error::AuthError;
use crate::repo::{Principal, PrincipalRepository, TokenRepository};

/// Validates raw tokens: lookup, expiry, principal resolution.
///
/// Checks run in a fixed order — unknown token, then expiry, then owner —
/// and every store failure fails closed as [`AuthError::StoreUnavailable`].
pub struct TokenValidator {
    tokens: TokenRepository,
    principals: PrincipalRepository,
}

impl TokenValidator {
    pub fn new(sql: Arc<dyn SQLStore>, options: &AuthOptions) -> Result<Self, SQLError> {
        Ok(Self {
            tokens: TokenRepository::new(sql.clone(), options)?,
            principals: PrincipalRepository::new(sql, options)?,
        })
    }

    /// Resolve a raw token to its owning principal.
    pub fn validate(&self, raw: &str) -> Result<Principal, AuthError> {
        let record = self
            .tokens
            .find_by_token(raw)
            .map_err(store_unavailable)?
            .ok_or(AuthError::InvalidCredential)?;

        if let Some(stored) = record.expires_at.as_deref() {
            match parse_timestamp(stored) {
                Some(expiry) if expiry < Utc::now() => {
                    return Err(AuthError::ExpiredCredential);
                }
                Some(_) => {}
                None => {
                    // Unreadable expiry: fail closed rather than treat the
                    // token as eternal.
                    warn!(token_id = record.id, expires_at = stored, "unparseable token expiry");
                    return Err(AuthError::InvalidCredential);
                }
            }
        }

        let principal = self
            .principals
            .find_by_id(record.tokenable_id)
            .map_err(store_unavailable)?
            .ok_or(AuthError::InvalidCredential)?;

        // Usage bookkeeping only; a failure here never rejects the request.
        if let Err(e) = self.tokens.touch_last_used(record.id) {
            warn!(token_id = record.id, error = %e, "failed to record token use");
        }

        Ok(principal)
    }
}

fn store_unavailable(e: SQLError) -> AuthError {
    AuthError::StoreUnavailable(e.to_string())
}
