use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use secuweb_core::ErrorBody;
use thiserror::Error;

/// Errors surfaced by the HTTP handlers. Messages are static; the cause is
/// logged by the handler before the error is returned.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Content and username are required")]
    MissingFields,

    #[error("Malformed payload")]
    MalformedPayload,

    #[error("Failed to fetch messages")]
    FetchFailed,

    #[error("Failed to create message")]
    CreateFailed,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::MissingFields | AppError::MalformedPayload => StatusCode::BAD_REQUEST,
            AppError::FetchFailed | AppError::CreateFailed => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, Json(ErrorBody::new(self.to_string()))).into_response()
    }
}
