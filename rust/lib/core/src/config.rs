use serde::Deserialize;

/// Module configuration, supplied once at startup.
///
/// Table and column names here are trusted, configuration-time strings;
/// everything that splices them into SQL validates them through
/// `tokenauth_sql::Ident` first. Route specs are parsed into rules once
/// when the gate is built.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuthOptions {
    /// Principal table name.
    pub auth_table: String,

    /// Access-token table name.
    pub token_table: String,

    /// Column of `token_table` holding the raw token.
    pub token_field: String,

    /// Custom header carrying the credential (extraction strategy 2).
    pub token_header: String,

    /// Scheme prefix to strip from header values, e.g. "Bearer".
    /// When non-empty the standard `Authorization` header is tried first.
    pub prefix: String,

    /// Ordered route exemptions, `"METHOD:/path"` or `"/path"` (any method).
    /// Patterns support a trailing `*` wildcard and `[param]` segments.
    pub no_auth_routes: Vec<String>,

    /// Issued-token lifetime in seconds; `0` issues tokens without expiry.
    /// Read only by the issuance flow — validation trusts the stored expiry.
    pub token_expiration: i64,

    /// Path prefix subject to the gate; anything outside passes through.
    pub protected_prefix: String,
}

impl Default for AuthOptions {
    fn default() -> Self {
        Self {
            auth_table: "users".to_string(),
            token_table: "personal_access_tokens".to_string(),
            token_field: "token".to_string(),
            token_header: "Token".to_string(),
            prefix: String::new(),
            no_auth_routes: Vec::new(),
            token_expiration: 60 * 60 * 24 * 365, // 1 year
            protected_prefix: "/api/".to_string(),
        }
    }
}
