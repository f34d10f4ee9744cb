use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use vote_board::{
    AppState,
    config::{AppConfig, Env},
    create_router,
    repository::{MemoryRepository, PostgresRepository, RepositoryState},
};

/// main
///
/// Entry point: configuration, logging, storage, then the HTTP server.
#[tokio::main]
async fn main() {
    // 1. Configuration (fail-fast)
    dotenv::dotenv().ok();
    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("FATAL: invalid configuration: {e}");
            std::process::exit(1);
        }
    };

    // 2. Logging. RUST_LOG wins over the defaults.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "vote_board=debug,tower_http=info".into());

    match config.env {
        Env::Local => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        Env::Production => {
            // JSON lines for log aggregation.
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
    }

    tracing::info!(
        env = ?config.env,
        algorithm = ?config.jwt_algorithm,
        token_ttl_minutes = config.token_ttl_minutes,
        "application starting"
    );

    // 3. Storage
    let repo: RepositoryState = if config.uses_memory_store() {
        tracing::warn!("DATABASE_URL=memory: using the in-process store, data is not persisted");
        Arc::new(MemoryRepository::new())
    } else {
        let pool = PgPoolOptions::new()
            .max_connections(config.db_max_connections)
            .connect(&config.db_url)
            .await
            .expect("FATAL: Failed to connect to Postgres. Check DATABASE_URL.");

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .expect("FATAL: Failed to apply database migrations.");

        Arc::new(PostgresRepository::new(pool))
    };

    // 4. State, router, server
    let bind_addr = config.bind_addr.clone();
    let app = create_router(AppState::new(config, repo));

    let listener = TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|e| panic!("FATAL: cannot bind {bind_addr}: {e}"));

    tracing::info!("Listening on {}", bind_addr);
    tracing::info!("API documentation available at /swagger-ui");

    axum::serve(listener, app).await.expect("HTTP server terminated unexpectedly");
}
