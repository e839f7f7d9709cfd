use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Users Router Module
///
/// Single-user operations share the `/user` path and are told apart by method.
/// The target id always travels in the body.
pub fn user_routes() -> Router<AppState> {
    Router::new()
        // POST /user   create, answers with the new id
        // GET /user    read by {"id": ..}
        // PUT /user    full overwrite, answers with the re-read row
        // DELETE /user delete by {"id": ..}
        .route(
            "/user",
            get(handlers::get_user)
                .post(handlers::create_user)
                .put(handlers::update_user)
                .delete(handlers::delete_user),
        )
        .route("/users", get(handlers::list_users))
        .route("/users_with_age", get(handlers::list_users_with_age))
        .route("/age_stats", get(handlers::get_age_stats))
}
