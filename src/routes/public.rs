use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Endpoints reachable without a bearer token: the greeting, the liveness probe, and the
/// two entry points into the identity flow (registration and login).
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /
        .route("/", get(handlers::home))
        // GET /health
        // Unauthenticated liveness probe for load balancers.
        .route("/health", get(|| async { "ok" }))
        // POST /users/
        // Registration. Hashes the password before it reaches the store.
        .route("/users/", post(handlers::register_user))
        // POST /login/
        // Form-encoded username/password in, bearer token out.
        .route("/login/", post(handlers::login))
}
