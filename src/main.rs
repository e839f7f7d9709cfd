use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use users_service::{
    AppState, StartupError,
    config::{AppConfig, Env},
    create_router, db,
    repository::{RepositoryState, SqliteRepository},
    server,
};

/// main
///
/// Entry point: configuration, logging, store, router, then the HTTP server until a
/// shutdown signal. The store is closed only after the server has drained.
#[tokio::main]
async fn main() -> Result<(), StartupError> {
    // 1. Configuration (fail-fast on unparseable values)
    dotenv::dotenv().ok();
    let config = AppConfig::load()?;

    // 2. Logging, RUST_LOG first, otherwise crate-level debug
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "users_service=debug,tower_http=info,axum=trace".into());

    match config.env {
        Env::Local => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        Env::Production => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
    }

    tracing::info!("Application starting in {:?} mode", config.env);

    // 3. Store
    let pool = db::connect(&config.database_path).await?;
    tracing::info!(path = %config.database_path.display(), "SQLite store opened");

    // LOCAL-ONLY: bring the schema up to date. Production schema is operator-managed.
    if config.env == Env::Local {
        db::MIGRATOR.run(&pool).await?;
        tracing::info!("Migrations applied");
    }

    // Prepares every statement; closes the pool itself on failure.
    let repo = Arc::new(SqliteRepository::new(pool).await?) as RepositoryState;

    // 4. Router and server
    let app_state = AppState {
        repo: repo.clone(),
        config: config.clone(),
    };
    let app = create_router(app_state);

    let addr = config.listen_addr();
    let listener = TcpListener::bind(addr).await?;

    tracing::info!("Listening on {}", addr);
    tracing::info!("API Documentation (Swagger UI) available at: http://{}/swagger-ui", addr);

    let served = server::serve(
        listener,
        app,
        server::shutdown_signal(),
        config.shutdown_timeout,
    )
    .await;

    // 5. Release the store after the last request is gone
    repo.close().await;
    tracing::info!("Store closed, shutdown complete");

    served.map_err(StartupError::from)
}
