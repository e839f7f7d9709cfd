use axum::{
    Router,
    extract::FromRef,
    http::HeaderName,
    response::{IntoResponse, Response},
};
use std::any::Any;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    catch_panic::CatchPanicLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

pub mod bind;
pub mod config;
pub mod date;
pub mod db;
pub mod error;
pub mod handlers;
pub mod models;
pub mod repository;
pub mod server;

pub mod routes;
use routes::{public, users};

// --- Public Re-exports ---

pub use config::AppConfig;
pub use error::{ApiError, StartupError};
pub use repository::{RepositoryState, SqliteRepository, UserRepository};

/// Prefix under which every route is mounted a second time.
pub const VERSION_PREFIX: &str = "/v1.0";

/// ApiDoc
///
/// Aggregates every `#[utoipa::path]` handler and `ToSchema` model into the OpenAPI
/// document served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::ping, handlers::create_user, handlers::get_user, handlers::update_user,
        handlers::delete_user, handlers::list_users, handlers::list_users_with_age,
        handlers::get_age_stats
    ),
    components(
        schemas(
            models::User, models::NewUser, models::UserId, models::UserWithAge, models::AgeStats,
            models::StatusEnvelope, models::IdUserEnvelope, models::UserEnvelope,
            models::UsersEnvelope, models::UsersWithAgeEnvelope, models::AgeStatsEnvelope,
            models::MessageEnvelope, models::ErrorEnvelope,
        )
    ),
    tags(
        (name = "users-service", description = "User CRUD and age statistics API")
    )
)]
pub struct ApiDoc;

/// AppState
///
/// Shared by every request. Cloning is cheap: the repository sits behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub repo: RepositoryState,
    pub config: AppConfig,
}

// --- Axum FromRef Extractor Implementations ---

// Let handlers and middleware pull a single component out of `AppState`.

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// create_router
///
/// Mounts the API at the root and again under `/v1.0`, adds the documentation
/// routes, then wraps everything in the request-id, tracing and panic layers.
pub fn create_router(state: AppState) -> Router {
    let x_request_id = HeaderName::from_static("x-request-id");

    let api = Router::new()
        .merge(public::public_routes())
        .merge(users::user_routes());

    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(api.clone())
        .nest(VERSION_PREFIX, api)
        .with_state(state);

    // Outermost first: the request id exists before the span opens, and panics are
    // caught inside the span so they are logged against the request.
    base_router.layer(
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
            .layer(PropagateRequestIdLayer::new(x_request_id))
            .layer(CatchPanicLayer::custom(panic_response)),
    )
}

/// trace_span_logger
///
/// Opens the `http_request` span for a request, tagged with the `x-request-id`
/// set by `SetRequestIdLayer` so every log line of one request can be correlated.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}

/// panic_response
///
/// Turns a handler panic into the standard 500 error body. The panic payload is
/// logged, never returned.
fn panic_response(payload: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else {
        "unknown panic payload"
    };

    tracing::error!(panic = %detail, "Handler panicked");
    ApiError::Panic.into_response()
}
