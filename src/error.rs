use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::{config::ConfigError, models::ErrorEnvelope, repository::RepositoryError};

/// Client-facing text for 500s that are not create/update failures.
pub const GENERIC_FAILURE: &str = "something went wrong";

/// BindError
///
/// The request body could not be turned into the handler's input type.
/// The message is echoed to the client as-is.
#[derive(Debug, Error)]
pub enum BindError {
    #[error("{0}")]
    Malformed(String),

    #[error("field `{0}` is required")]
    Missing(&'static str),
}

/// ApiError
///
/// Everything a handler can fail with. Bind errors become 400 and carry their text;
/// repository errors become 500 with a fixed message so store internals never reach the client.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Bind(#[from] BindError),

    #[error("{message}")]
    Repository {
        message: &'static str,
        #[source]
        source: RepositoryError,
    },

    #[error("something went wrong")]
    Panic,
}

impl ApiError {
    pub fn repository(message: &'static str, source: RepositoryError) -> Self {
        Self::Repository { message, source }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Bind(_) => StatusCode::BAD_REQUEST,
            Self::Repository { .. } | Self::Panic => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorEnvelope {
            error: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}

/// StartupError
///
/// Anything that stops the process before the server is listening.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to open the store: {0}")]
    Store(#[from] sqlx::Error),

    #[error("failed to apply migrations: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
