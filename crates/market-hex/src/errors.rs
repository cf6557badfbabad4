use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use market_types::domain::fields::FieldError;
use market_types::ports::RepoError;
use serde::Serialize;
use thiserror::Error;

pub const JSON_UTF8: &str = "application/json; charset=utf-8";

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid field: {0}")]
    Validation(#[from] FieldError),

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("Internal error")]
    Internal(#[from] anyhow::Error),
}

impl From<RepoError> for AppError {
    fn from(e: RepoError) -> Self {
        match e {
            RepoError::Constraint(m) => AppError::ConstraintViolation(m),
            RepoError::DbError(_) => AppError::Internal(anyhow::anyhow!(e.to_string())),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (code, msg) = match &self {
            AppError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
            AppError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
            AppError::Validation(e) => (StatusCode::UNPROCESSABLE_ENTITY, e.to_string()),
            AppError::ConstraintViolation(m) => (StatusCode::CONFLICT, m.clone()),
            AppError::Internal(e) => {
                tracing::error!(error = %e, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal error".into())
            }
        };

        let body = serde_json::to_string(&ErrorBody { error: msg })
            .unwrap_or_else(|_| "{\"error\":\"internal serialization\"}".into());
        (code, [(header::CONTENT_TYPE, JSON_UTF8)], body).into_response()
    }
}
