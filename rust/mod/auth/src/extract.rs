//! Credential extraction from request headers.
//!
//! Two strategies, tried in order: the standard `Authorization` header
//! with the configured scheme prefix (only when a prefix is configured),
//! then the configured custom header. Which strategy applies is decided
//! by configuration, not negotiated per request.

use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;

use tokenauth_core::AuthOptions;

/// Pull the raw token out of the request headers, if any.
pub fn extract_token(headers: &HeaderMap, options: &AuthOptions) -> Option<String> {
    if !options.prefix.is_empty() {
        if let Some(token) = bearer_token(headers, &options.prefix) {
            return Some(token);
        }
    }
    custom_header_token(headers, &options.token_header, &options.prefix)
}

/// `Authorization: <prefix> <token>` — the prefix matches
/// case-insensitively and must be followed by a separating space.
fn bearer_token(headers: &HeaderMap, prefix: &str) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?.trim();
    let token = strip_scheme(value, prefix)?;
    non_empty(token)
}

/// Configured custom header; the scheme prefix is stripped when present,
/// otherwise the trimmed value is the token.
fn custom_header_token(headers: &HeaderMap, name: &str, prefix: &str) -> Option<String> {
    let value = headers.get(name)?.to_str().ok()?.trim();
    let token = if prefix.is_empty() {
        value
    } else {
        strip_scheme(value, prefix).unwrap_or(value)
    };
    non_empty(token.trim())
}

/// Case-insensitive `"<scheme> "` strip; `None` when the value does not
/// carry the scheme.
fn strip_scheme<'a>(value: &'a str, scheme: &str) -> Option<&'a str> {
    if value.len() <= scheme.len() {
        return None;
    }
    let (head, rest) = value.split_at(scheme.len());
    if head.eq_ignore_ascii_case(scheme) && rest.starts_with(' ') {
        Some(rest.trim_start())
    } else {
        None
    }
}

fn non_empty(token: &str) -> Option<String> {
    if token.is_empty() { None } else { Some(token.to_string()) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(&str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(
                axum::http::HeaderName::from_bytes(name.as_bytes()).unwrap(),
                HeaderValue::from_str(value).unwrap(),
            );
        }
        map
    }

    fn bearer_options() -> AuthOptions {
        AuthOptions {
            token_header: "Authorization".to_string(),
            prefix: "Bearer".to_string(),
            ..AuthOptions::default()
        }
    }

    #[test]
    fn custom_header_plain_token() {
        let opts = AuthOptions::default(); // header "Token", no prefix
        let h = headers(&[("token", "abc123")]);
        assert_eq!(extract_token(&h, &opts), Some("abc123".to_string()));
    }

    #[test]
    fn custom_header_trims_whitespace() {
        let opts = AuthOptions::default();
        let h = headers(&[("token", "  abc123  ")]);
        assert_eq!(extract_token(&h, &opts), Some("abc123".to_string()));
    }

    #[test]
    fn bearer_scheme_case_insensitive() {
        let opts = bearer_options();
        for value in ["Bearer abc123", "bearer abc123", "BEARER abc123"] {
            let h = headers(&[("authorization", value)]);
            assert_eq!(extract_token(&h, &opts), Some("abc123".to_string()), "value {value:?}");
        }
    }

    #[test]
    fn bearer_requires_separating_space() {
        let opts = bearer_options();
        let h = headers(&[("authorization", "Bearerabc123")]);
        assert_eq!(extract_token(&h, &opts), None);
    }

    #[test]
    fn bearer_with_empty_remainder_is_missing() {
        let opts = bearer_options();
        let h = headers(&[("authorization", "Bearer ")]);
        assert_eq!(extract_token(&h, &opts), None);
    }

    #[test]
    fn custom_header_with_prefix_strips_it() {
        let opts = AuthOptions {
            token_header: "X-Api-Key".to_string(),
            prefix: "Key".to_string(),
            ..AuthOptions::default()
        };
        let h = headers(&[("x-api-key", "Key abc123")]);
        assert_eq!(extract_token(&h, &opts), Some("abc123".to_string()));

        // A value without the scheme still yields its trimmed self.
        let h = headers(&[("x-api-key", "abc123")]);
        assert_eq!(extract_token(&h, &opts), Some("abc123".to_string()));
    }

    #[test]
    fn absent_headers_yield_none() {
        let h = HeaderMap::new();
        assert_eq!(extract_token(&h, &AuthOptions::default()), None);
        assert_eq!(extract_token(&h, &bearer_options()), None);
    }
}
