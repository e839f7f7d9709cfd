use axum::{
    Form,
    body::Bytes,
    extract::{FromRequest, Request},
    http::{HeaderMap, header},
};
use serde::de::DeserializeOwned;

use crate::error::{ApiError, BindError};

/// Validate
///
/// Required-field checks run after a payload has been decoded. Only presence is checked:
/// strings must be non-empty (whitespace counts as present), ids non-zero, dates non-zero.
/// No format validation.
pub trait Validate {
    fn validate(&self) -> Result<(), BindError>;
}

pub fn require_text(field: &'static str, value: &str) -> Result<(), BindError> {
    if value.is_empty() {
        return Err(BindError::Missing(field));
    }
    Ok(())
}

pub fn require_id(id: i64) -> Result<(), BindError> {
    if id == 0 {
        return Err(BindError::Missing("id"));
    }
    Ok(())
}

/// Bind Extractor
///
/// Decodes the request body into `T` and runs `T::validate`.
///
/// Form-encoded requests (`application/x-www-form-urlencoded`) go through axum's `Form`,
/// which reads the query string for GET. Every other request body is parsed as JSON whether
/// or not a JSON content type was sent, matching clients that post bare bodies.
///
/// Rejection: `ApiError::Bind` (400), so the handler and the repository are never reached.
pub struct Bind<T>(pub T);

impl<T, S> FromRequest<S> for Bind<T>
where
    T: DeserializeOwned + Validate + Send,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let decoded = if is_form(req.headers()) {
            Form::<T>::from_request(req, state)
                .await
                .map(|Form(value)| value)
                .map_err(|rejection| BindError::Malformed(rejection.body_text()))
        } else {
            match Bytes::from_request(req, state).await {
                Ok(body) => serde_json::from_slice::<T>(&body)
                    .map_err(|e| BindError::Malformed(e.to_string())),
                Err(rejection) => Err(BindError::Malformed(rejection.body_text())),
            }
        };

        let value = decoded.and_then(|value| value.validate().map(|()| value));
        match value {
            Ok(value) => Ok(Bind(value)),
            Err(e) => {
                tracing::warn!(error = %e, "Error binding request body");
                Err(ApiError::Bind(e))
            }
        }
    }
}

fn is_form(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("application/x-www-form-urlencoded"))
}
