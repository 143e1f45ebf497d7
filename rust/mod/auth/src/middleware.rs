//! Axum middleware — the HTTP mapping layer over [`AuthGate`].
//!
//! Error kinds become status codes here and nowhere else. On success the
//! authenticated [`Principal`] is stored as a request extension for
//! downstream handlers.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tracing::debug;

use tokenauth_core::ServiceError;

use crate::gate::{AuthDecision, AuthGate};

/// Gate every request through the auth decision.
pub async fn auth_middleware(
    State(gate): State<Arc<AuthGate>>,
    mut req: Request,
    next: Next,
) -> Response {
    let method = req.method().as_str().to_string();
    let path = req.uri().path().to_string();

    match gate.check(&method, &path, req.headers()) {
        Ok(AuthDecision::Exempt) => next.run(req).await,
        Ok(AuthDecision::Authenticated(principal)) => {
            req.extensions_mut().insert(principal);
            next.run(req).await
        }
        Err(e) => {
            debug!(%method, %path, error = %e, "request rejected");
            let se: ServiceError = e.into();
            se.into_response()
        }
    }
}
