use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Public Router Module
///
/// Endpoints that never touch the repository.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /ping
        // Used by monitoring and load balancer checks. Always {"status":"ok"}.
        .route("/ping", get(handlers::ping))
}
