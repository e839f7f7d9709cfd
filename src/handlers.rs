use crate::{
    AppState,
    bind::Bind,
    error::{ApiError, GENERIC_FAILURE},
    models::{
        AgeStatsEnvelope, ErrorEnvelope, IdUserEnvelope, MessageEnvelope, NewUser,
        StatusEnvelope, User, UserEnvelope, UserId, UsersEnvelope, UsersWithAgeEnvelope,
    },
    repository::RepositoryError,
};
use axum::{Json, extract::State};

const INSERT_FAILURE: &str = "Failed to insert user";
const UPDATE_FAILURE: &str = "Failed to update user";
const DELETED_MESSAGE: &str = "User deleted successfully.";

// --- Error Mapping ---

/// Logs a repository failure with its operation context and turns it into the
/// client-facing error. The source error is never part of the response body.
fn repository_failure(
    operation: &'static str,
    user_id: Option<i64>,
    message: &'static str,
    error: RepositoryError,
) -> ApiError {
    match &error {
        RepositoryError::NotFound => {
            tracing::warn!(operation, user_id, error = %error, "User not found")
        }
        _ => tracing::error!(operation, user_id, error = %error, "Repository call failed"),
    }
    ApiError::repository(message, error)
}

// --- Handlers ---

/// ping
///
/// Liveness check. Touches nothing but the router.
#[utoipa::path(
    get,
    path = "/ping",
    responses((status = 200, description = "Service is up", body = StatusEnvelope))
)]
pub async fn ping() -> Json<StatusEnvelope> {
    Json(StatusEnvelope::ok())
}

/// create_user
///
/// Inserts a new user and answers with the assigned id only.
/// A duplicate email violates the unique constraint and surfaces as a 500.
#[utoipa::path(
    post,
    path = "/user",
    request_body = NewUser,
    responses(
        (status = 200, description = "User created", body = IdUserEnvelope),
        (status = 400, description = "Malformed body or missing field", body = ErrorEnvelope),
        (status = 500, description = "Insert failed", body = ErrorEnvelope)
    )
)]
pub async fn create_user(
    State(state): State<AppState>,
    Bind(new_user): Bind<NewUser>,
) -> Result<Json<IdUserEnvelope>, ApiError> {
    let id = state
        .repo
        .create_user(&new_user)
        .await
        .map_err(|e| repository_failure("create_user", None, INSERT_FAILURE, e))?;

    tracing::info!(user_id = id, "User created");
    Ok(Json(IdUserEnvelope {
        user: UserId { id },
    }))
}

/// get_user
///
/// Reads one user by id. The id travels in the request body, not the path.
#[utoipa::path(
    get,
    path = "/user",
    request_body = UserId,
    responses(
        (status = 200, description = "User found", body = UserEnvelope),
        (status = 400, description = "Malformed body or missing id", body = ErrorEnvelope),
        (status = 500, description = "Lookup failed, including unknown ids", body = ErrorEnvelope)
    )
)]
pub async fn get_user(
    State(state): State<AppState>,
    Bind(UserId { id }): Bind<UserId>,
) -> Result<Json<UserEnvelope>, ApiError> {
    let user = state
        .repo
        .get_user(id)
        .await
        .map_err(|e| repository_failure("get_user", Some(id), GENERIC_FAILURE, e))?;
    Ok(Json(UserEnvelope { user }))
}

/// update_user
///
/// Overwrites every field of an existing user, then re-reads the row so the response
/// reflects what the store actually holds. When the write matches no row the re-read
/// is skipped and the request fails with NotFound.
#[utoipa::path(
    put,
    path = "/user",
    request_body = User,
    responses(
        (status = 200, description = "User updated", body = UserEnvelope),
        (status = 400, description = "Malformed body or missing field", body = ErrorEnvelope),
        (status = 500, description = "Update failed", body = ErrorEnvelope)
    )
)]
pub async fn update_user(
    State(state): State<AppState>,
    Bind(user): Bind<User>,
) -> Result<Json<UserEnvelope>, ApiError> {
    let affected = state
        .repo
        .update_user(&user)
        .await
        .map_err(|e| repository_failure("update_user", Some(user.id), UPDATE_FAILURE, e))?;

    if affected == 0 {
        return Err(repository_failure(
            "update_user",
            Some(user.id),
            GENERIC_FAILURE,
            RepositoryError::NotFound,
        ));
    }

    let user = state
        .repo
        .get_user(user.id)
        .await
        .map_err(|e| repository_failure("get_user", Some(user.id), GENERIC_FAILURE, e))?;
    Ok(Json(UserEnvelope { user }))
}

/// delete_user
///
/// Deleting an id that does not exist still answers 200.
#[utoipa::path(
    delete,
    path = "/user",
    request_body = UserId,
    responses(
        (status = 200, description = "User deleted", body = MessageEnvelope),
        (status = 400, description = "Malformed body or missing id", body = ErrorEnvelope),
        (status = 500, description = "Delete failed", body = ErrorEnvelope)
    )
)]
pub async fn delete_user(
    State(state): State<AppState>,
    Bind(UserId { id }): Bind<UserId>,
) -> Result<Json<MessageEnvelope>, ApiError> {
    let affected = state
        .repo
        .delete_user(id)
        .await
        .map_err(|e| repository_failure("delete_user", Some(id), GENERIC_FAILURE, e))?;

    if affected == 0 {
        tracing::info!(user_id = id, "Delete matched no user");
    }

    Ok(Json(MessageEnvelope {
        message: DELETED_MESSAGE.to_string(),
    }))
}

/// list_users
#[utoipa::path(
    get,
    path = "/users",
    responses(
        (status = 200, description = "All users", body = UsersEnvelope),
        (status = 500, description = "Listing failed", body = ErrorEnvelope)
    )
)]
pub async fn list_users(State(state): State<AppState>) -> Result<Json<UsersEnvelope>, ApiError> {
    let users = state
        .repo
        .list_users()
        .await
        .map_err(|e| repository_failure("list_users", None, GENERIC_FAILURE, e))?;
    Ok(Json(UsersEnvelope { users }))
}

/// list_users_with_age
///
/// Same as `list_users`, each entry carrying its whole-year age as of now.
#[utoipa::path(
    get,
    path = "/users_with_age",
    responses(
        (status = 200, description = "All users with their age", body = UsersWithAgeEnvelope),
        (status = 500, description = "Listing failed", body = ErrorEnvelope)
    )
)]
pub async fn list_users_with_age(
    State(state): State<AppState>,
) -> Result<Json<UsersWithAgeEnvelope>, ApiError> {
    let users = state
        .repo
        .list_users_with_age()
        .await
        .map_err(|e| repository_failure("list_users_with_age", None, GENERIC_FAILURE, e))?;
    Ok(Json(UsersWithAgeEnvelope { users }))
}

/// get_age_stats
#[utoipa::path(
    get,
    path = "/age_stats",
    responses(
        (status = 200, description = "User count per age bucket", body = AgeStatsEnvelope),
        (status = 500, description = "Aggregation failed", body = ErrorEnvelope)
    )
)]
pub async fn get_age_stats(
    State(state): State<AppState>,
) -> Result<Json<AgeStatsEnvelope>, ApiError> {
    let age_stats = state
        .repo
        .age_stats()
        .await
        .map_err(|e| repository_failure("age_stats", None, GENERIC_FAILURE, e))?;
    Ok(Json(AgeStatsEnvelope { age_stats }))
}
