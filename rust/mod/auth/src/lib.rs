//! Token authentication module.
//!
//! The per-request decision is a small state machine owned by
//! [`gate::AuthGate`]: route exemption first (no store access), then
//! credential extraction, then store-backed token validation. The axum
//! [`middleware`] is the only HTTP-aware layer; everything below it
//! returns error kinds, never status codes.
//!
//! # Usage
//!
//! ```ignore
//! use tokenauth_auth::AuthGate;
//!
//! let gate = Arc::new(AuthGate::new(sql, options)?);
//! let app = router.layer(middleware::from_fn_with_state(
//!     gate,
//!     tokenauth_auth::middleware::auth_middleware,
//! ));
//! ```

pub mod client;
pub mod error;
pub mod extract;
pub mod gate;
pub mod issue;
pub mod middleware;
pub mod repo;
pub mod routes;
pub mod validate;

pub use error::AuthError;
pub use gate::{AuthDecision, AuthGate};
pub use issue::{IssuedToken, TokenIssuer};
pub use repo::{Principal, PrincipalRepository, ResetTokenRepository, TokenRepository};
pub use routes::RouteRule;
pub use validate::TokenValidator;
