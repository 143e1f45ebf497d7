use thiserror::Error;

use tokenauth_core::ServiceError;

/// Authentication failure kinds.
///
/// The `Display` strings stay distinguishable for logs and tests; the
/// HTTP mapping collapses the three credential kinds into one generic
/// "Unauthorized" so responses do not leak which check failed. All kinds
/// are terminal — nothing is retried here.
#[derive(Debug, Error)]
pub enum AuthError {
    /// No credential could be extracted from the request.
    #[error("missing authentication header")]
    MissingCredential,

    /// The credential matched no token, or its owner is gone.
    #[error("authentication error")]
    InvalidCredential,

    /// The token exists but its expiry is in the past.
    #[error("token expired")]
    ExpiredCredential,

    /// The token store could not be reached. Fails closed: the request is
    /// rejected, as a 500 rather than a 401.
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    /// Non-store internal failure (e.g. entropy source) during issuance.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<AuthError> for ServiceError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::MissingCredential
            | AuthError::InvalidCredential
            | AuthError::ExpiredCredential => ServiceError::Unauthorized("Unauthorized".into()),
            AuthError::StoreUnavailable(m) => ServiceError::Storage(m),
            AuthError::Internal(m) => ServiceError::Internal(m),
        }
    }
}
