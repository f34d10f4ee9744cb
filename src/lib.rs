use axum::{
    Router,
    extract::{FromRef, Request},
    http::HeaderName,
    middleware::{self, Next},
    response::Response,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod ownership;
pub mod password;
pub mod repository;
pub mod token;

// Routing segregated by access level (Public, Authenticated).
pub mod routes;
use auth::AuthUser;
use routes::{authenticated, public};

// --- Public Re-exports ---

pub use config::AppConfig;
pub use error::AppError;
pub use repository::{MemoryRepository, PostgresRepository, RepositoryState};
pub use token::TokenService;

/// ApiDoc
///
/// OpenAPI document aggregated from the `#[utoipa::path]` handlers and `ToSchema` models,
/// served at `/api-docs/openapi.json` behind the Swagger UI.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::home, handlers::register_user, handlers::login,
        handlers::get_my_posts, handlers::get_post, handlers::create_post,
        handlers::update_post, handlers::delete_post, handlers::vote
    ),
    components(
        schemas(
            models::Post, models::Vote, models::RegisterUserRequest, models::LoginForm,
            models::CreatePostRequest, models::UpdatePostRequest, models::VoteRequest,
            models::UserResponse, models::TokenResponse, models::MessageResponse,
            models::ErrorResponse,
        )
    ),
    tags(
        (name = "vote-board", description = "Posts and votes behind bearer-token auth")
    )
)]
struct ApiDoc;

/// AppState
///
/// The single shared container for everything a request needs. Cheap to clone: the
/// repository is behind an `Arc` and the token service only holds keys.
#[derive(Clone)]
pub struct AppState {
    /// Credential store and resource storage.
    pub repo: RepositoryState,
    /// Bearer token issuance and verification, keyed by the configured secret.
    pub tokens: TokenService,
    /// The loaded, immutable configuration.
    pub config: AppConfig,
}

impl AppState {
    /// Builds the state with a token service derived from `config`.
    pub fn new(config: AppConfig, repo: RepositoryState) -> Self {
        Self {
            repo,
            tokens: TokenService::from_config(&config),
            config,
        }
    }
}

// --- Axum FromRef Extractor Implementations ---

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for TokenService {
    fn from_ref(app_state: &AppState) -> TokenService {
        app_state.tokens.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// auth_middleware
///
/// The identity guard for the authenticated route group. Extracting `AuthUser` runs the
/// full resolution; a failure rejects the request with 401 before any handler runs. On
/// success the identity is stored in the request extensions for the handler to pick up.
async fn auth_middleware(auth_user: AuthUser, mut request: Request, next: Next) -> Response {
    request.extensions_mut().insert(auth_user);
    next.run(request).await
}

/// create_router
///
/// Assembles the routing structure, installs the identity guard on the protected group,
/// and wraps everything in the request-id, tracing and CORS layers.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let x_request_id = HeaderName::from_static("x-request-id");

    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public::public_routes())
        // `route_layer` so unmatched paths still 404 instead of 401.
        .merge(
            authenticated::authenticated_routes().route_layer(middleware::from_fn_with_state(
                state.clone(),
                auth_middleware,
            )),
        )
        .with_state(state);

    base_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

/// trace_span_logger
///
/// Opens the per-request span carrying method, path and the `x-request-id`, so every log
/// line of one request correlates. The query string and headers are left out: they may
/// carry credentials.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        path = %request.uri().path(),
        req_id = %request_id,
    )
}
