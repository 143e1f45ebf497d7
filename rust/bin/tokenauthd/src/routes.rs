//! Route registration — login, identity, and system endpoints.

use std::sync::Arc;

use axum::extract::State;
use axum::middleware;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use serde::Deserialize;

use tokenauth_auth::middleware::auth_middleware;
use tokenauth_auth::{AuthGate, Principal, TokenIssuer};
use tokenauth_core::ServiceError;

/// Application shared state.
#[derive(Clone)]
pub struct AppState {
    pub gate: Arc<AuthGate>,
    pub issuer: Arc<TokenIssuer>,
}

/// Build the complete router with the auth gate applied.
pub fn build_router(state: AppState) -> Router {
    let gate = state.gate.clone();

    Router::new()
        .route("/health", get(health))
        .route("/api/auth/login", post(login_handler))
        .route("/api/auth/me", get(whoami))
        .with_state(state)
        .layer(middleware::from_fn_with_state(gate, auth_middleware))
}

/// Login request body.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Handle POST /api/auth/login.
///
/// Password verification is CPU-bound, so it runs off the async runtime.
async fn login_handler(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Response {
    let issuer = state.issuer.clone();
    let result = tokio::task::spawn_blocking(move || issuer.login(&body.email, &body.password))
        .await
        .unwrap_or_else(|e| {
            Err(tokenauth_auth::AuthError::Internal(format!("login task failed: {e}")))
        });

    match result {
        Ok(issued) => Json(issued).into_response(),
        Err(e) => {
            let se: ServiceError = e.into();
            se.into_response()
        }
    }
}

/// Handle GET /api/auth/me — the authenticated principal, as placed in the
/// request extensions by the gate.
async fn whoami(Extension(principal): Extension<Principal>) -> Json<Principal> {
    Json(principal)
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
