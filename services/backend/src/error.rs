use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use tracing::error;

/// Errors surfaced by the song API and its collaborators.
#[derive(Error, Debug)]
pub enum Error {
    #[error("This action is unauthorized.")]
    Forbidden,

    #[error("Unauthenticated: {0}")]
    Unauthorized(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Request failed the input rules (unknown ids, bad sort column, ...)
    #[error("{0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn status(&self) -> StatusCode {
        match self {
            Error::Forbidden => StatusCode::FORBIDDEN,
            Error::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Error::Database(_) | Error::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            Error::Database(_) | Error::Internal(_) => {
                error!("Request failed: {}", self);
                "Internal server error".to_string()
            }
            _ => self.to_string(),
        };

        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}
