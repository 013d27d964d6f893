//! Request extractors that reject with [`AppError`]

use axum::{
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json,
};
use serde_json::json;

use crate::error::{AppError, INVALID_BODY_MESSAGE};

/// `Json<T>` whose rejections use the standard error envelope
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(Self(value))
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            // Well-formed JSON that does not fit the target type
            JsonRejection::JsonDataError(err) => AppError::validation(
                vec![json!({ "field": "body", "error": err.body_text() })],
                INVALID_BODY_MESSAGE,
            ),
            other => AppError::bad_request(format!("Bad Request: {}", other.body_text())),
        }
    }
}
