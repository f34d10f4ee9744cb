use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{delete, get, post},
};

/// Authenticated Router Module
///
/// Every route here sits behind the identity guard installed in `create_router`, so each
/// handler receives an already-resolved `AuthUser`.
///
/// Ordering: the static `/posts/all/` is registered before the parameterized
/// `/posts/{id}/`. `api_tests` checks that `/posts/all/` is never captured as an id.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // GET /posts/all/
        // Every post owned by the caller.
        .route("/posts/all/", get(handlers::get_my_posts))
        // POST /posts/
        .route("/posts/", post(handlers::create_post))
        // GET/PUT /posts/{id}/
        // Read is filtered by owner; update enforces the ownership check.
        .route(
            "/posts/{id}/",
            get(handlers::get_post).put(handlers::update_post),
        )
        // DELETE /posts/{id}
        .route("/posts/{id}", delete(handlers::delete_post))
        // POST /votes/
        // dir = 1 adds the caller's vote, dir = 0 retracts it.
        .route("/votes/", post(handlers::vote))
}
