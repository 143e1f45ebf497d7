//! The per-request authentication decision.

use std::sync::Arc;

use axum::http::HeaderMap;

use tokenauth_core::AuthOptions;
use tokenauth_sql::{SQLError, SQLStore};

use crate::error::AuthError;
use crate::extract::extract_token;
use crate::repo::Principal;
use crate::routes::{RouteRule, is_exempt, parse_rules, strip_query};
use crate::validate::TokenValidator;

/// Terminal "proceed" outcomes of the gate.
#[derive(Debug)]
pub enum AuthDecision {
    /// The request bypasses authentication (outside the protected prefix,
    /// or matched an exemption rule).
    Exempt,
    /// A valid credential resolved to this principal.
    Authenticated(Principal),
}

/// Orchestrates exemption matching, credential extraction, and token
/// validation into one decision per request.
///
/// Stateless across requests and safe to share behind an `Arc`; the store
/// handle is injected at construction and owned by the caller. The check
/// order is fixed — exemption first, so exempt routes cost zero store I/O.
pub struct AuthGate {
    options: AuthOptions,
    rules: Vec<RouteRule>,
    validator: TokenValidator,
}

impl AuthGate {
    pub fn new(sql: Arc<dyn SQLStore>, options: AuthOptions) -> Result<Self, SQLError> {
        let rules = parse_rules(&options.no_auth_routes);
        let validator = TokenValidator::new(sql, &options)?;
        Ok(Self { options, rules, validator })
    }

    /// Decide one request.
    pub fn check(
        &self,
        method: &str,
        path: &str,
        headers: &HeaderMap,
    ) -> Result<AuthDecision, AuthError> {
        let bare = strip_query(path);

        if !bare.starts_with(&self.options.protected_prefix) {
            return Ok(AuthDecision::Exempt);
        }
        if is_exempt(&self.rules, method, bare) {
            return Ok(AuthDecision::Exempt);
        }

        let token = extract_token(headers, &self.options).ok_or(AuthError::MissingCredential)?;
        self.validator.validate(&token).map(AuthDecision::Authenticated)
    }

    pub fn options(&self) -> &AuthOptions {
        &self.options
    }
}
