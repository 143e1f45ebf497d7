//! Outgoing-request helpers for clients of a gated API.
//!
//! Pure functions, registered once with whatever HTTP client the caller
//! uses — no global mutable patching. `needs_credentials` mirrors the
//! gate's own exemption logic so a client can skip attaching a token
//! exactly where the server would not require one.

use axum::http::{HeaderMap, HeaderName, HeaderValue};

use tokenauth_core::AuthOptions;

use crate::error::AuthError;
use crate::routes::{RouteRule, is_exempt, strip_query};

/// Whether a request to `method` + `path` will have to present a
/// credential. Rules are the parsed form of `options.no_auth_routes`.
pub fn needs_credentials(
    options: &AuthOptions,
    rules: &[RouteRule],
    method: &str,
    path: &str,
) -> bool {
    let bare = strip_query(path);
    bare.starts_with(&options.protected_prefix) && !is_exempt(rules, method, bare)
}

/// Attach the stored token to an outgoing request's headers, using the
/// same header name and scheme prefix the server expects.
pub fn attach_credentials(
    headers: &mut HeaderMap,
    options: &AuthOptions,
    token: &str,
) -> Result<(), AuthError> {
    let name = HeaderName::from_bytes(options.token_header.as_bytes())
        .map_err(|e| AuthError::Internal(format!("bad token header name: {e}")))?;
    let value = if options.prefix.is_empty() {
        token.to_string()
    } else {
        format!("{} {}", options.prefix, token)
    };
    let value = HeaderValue::from_str(&value)
        .map_err(|e| AuthError::Internal(format!("bad token header value: {e}")))?;
    headers.insert(name, value);
    Ok(())
}
