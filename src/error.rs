use axum::{
    Json,
    extract::multipart::MultipartRejection,
    extract::rejection::{JsonRejection, QueryRejection},
    http::{HeaderValue, StatusCode, header::RETRY_AFTER},
    response::IntoResponse,
};
use serde::Serialize;
use sqlx::Error as SqlxError;
use std::time::Duration;
use thiserror::Error as ThisError;
use tracing::error;

#[derive(Debug, ThisError)]
pub enum KomikError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Unauthorized(&'static str),

    #[error("Insufficient role for this operation")]
    Forbidden,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    Conflict(String),

    #[error("Too many requests")]
    RateLimited { retry_after: Duration },

    #[error("Database error: {0}")]
    Database(SqlxError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Password hash error: {0}")]
    PasswordHash(String),

    #[error("Token signing error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl KomikError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }
}

impl From<SqlxError> for KomikError {
    fn from(e: SqlxError) -> Self {
        if let Some(db_err) = e.as_database_error() {
            if db_err.is_unique_violation() {
                return KomikError::Conflict("Resource already exists".to_string());
            }
            if db_err.is_foreign_key_violation() {
                return KomikError::Validation("Referenced resource does not exist".to_string());
            }
        }
        KomikError::Database(e)
    }
}

impl From<JsonRejection> for KomikError {
    fn from(rejection: JsonRejection) -> Self {
        KomikError::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for KomikError {
    fn from(rejection: QueryRejection) -> Self {
        KomikError::Validation(rejection.body_text())
    }
}

impl From<MultipartRejection> for KomikError {
    fn from(rejection: MultipartRejection) -> Self {
        KomikError::Validation(rejection.body_text())
    }
}

impl From<argon2::password_hash::Error> for KomikError {
    fn from(e: argon2::password_hash::Error) -> Self {
        KomikError::PasswordHash(e.to_string())
    }
}

impl IntoResponse for KomikError {
    fn into_response(self) -> axum::response::Response {
        let (status, code, message) = match &self {
            KomikError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
            }
            KomikError::Unauthorized(msg) => {
                (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.to_string())
            }
            KomikError::Forbidden => (StatusCode::FORBIDDEN, "FORBIDDEN", self.to_string()),
            KomikError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND", self.to_string()),
            KomikError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
            KomikError::RateLimited { .. } => (
                StatusCode::TOO_MANY_REQUESTS,
                "RATE_LIMITED",
                self.to_string(),
            ),
            KomikError::Database(_)
            | KomikError::Io(_)
            | KomikError::Json(_)
            | KomikError::PasswordHash(_)
            | KomikError::Jwt(_)
            | KomikError::Task(_) => {
                error!(error = %self, "request failed with internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred.".to_string(),
                )
            }
        };

        let body = ApiErrorResponse {
            error: ApiErrorBody {
                code: code.to_string(),
                message,
            },
        };
        let mut resp = (status, Json(body)).into_response();
        if let KomikError::RateLimited { retry_after } = self {
            let secs = retry_after.as_secs().max(1);
            if let Ok(v) = HeaderValue::from_str(&secs.to_string()) {
                resp.headers_mut().insert(RETRY_AFTER, v);
            }
        }
        resp
    }
}

/// Standardized API error response body
#[derive(Serialize)]
pub struct ApiErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Serialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorBody,
}
