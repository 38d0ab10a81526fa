use axum::{
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde_json::json;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Illegal transition: {0}")]
    Transition(String),

    #[error("Sequence conflict: {0}")]
    SequenceConflict(String),

    #[error("Round locked: {0}")]
    RoundLocked(String),

    #[error("Interview locked: {0}")]
    InterviewLocked(String),

    #[error("Incomplete rounds: {0}")]
    IncompleteRounds(String),

    #[error("Version conflict: {0}")]
    VersionConflict(String),

    #[error("Database error: {0}")]
    Database(sqlx::Error),

    #[error("Payload validation error: {0}")]
    Payload(#[from] validator::ValidationErrors),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),

    #[error("HTTP error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Machine-readable tag naming the failed precondition class. Business
    /// rule violations are surfaced verbatim and are never retried by the
    /// server; only `version_conflict` is worth a caller-side retry after a
    /// re-read.
    pub fn code(&self) -> &'static str {
        match self {
            Error::Config(_) => "config",
            Error::Validation(_) | Error::Payload(_) => "validation",
            Error::Unauthenticated(_) => "unauthenticated",
            Error::Forbidden(_) => "forbidden",
            Error::NotFound(_) => "not_found",
            Error::Transition(_) => "transition",
            Error::SequenceConflict(_) => "sequence_conflict",
            Error::RoundLocked(_) => "round_locked",
            Error::InterviewLocked(_) => "interview_locked",
            Error::IncompleteRounds(_) => "incomplete_rounds",
            Error::VersionConflict(_) => "version_conflict",
            Error::Database(_) => "database",
            Error::Json(_) => "json",
            Error::Reqwest(_) => "upstream",
            Error::Anyhow(_) | Error::Internal(_) | Error::Io(_) => "internal",
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> axum::response::Response {
        let code = self.code();
        let (status, error_message) = match self {
            Error::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            Error::Payload(err) => (StatusCode::BAD_REQUEST, err.to_string()),
            Error::Unauthenticated(msg) => (StatusCode::UNAUTHORIZED, msg),
            Error::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            Error::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            Error::Transition(msg) => (StatusCode::CONFLICT, msg),
            Error::SequenceConflict(msg) => (StatusCode::CONFLICT, msg),
            Error::RoundLocked(msg) => (StatusCode::CONFLICT, msg),
            Error::InterviewLocked(msg) => (StatusCode::CONFLICT, msg),
            Error::IncompleteRounds(msg) => (StatusCode::CONFLICT, msg),
            Error::VersionConflict(msg) => (StatusCode::CONFLICT, msg),
            Error::Json(err) => (StatusCode::BAD_REQUEST, err.to_string()),
            Error::Database(err) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
            Error::Reqwest(err) => (
                StatusCode::BAD_GATEWAY,
                format!("External service error: {}", err),
            ),
            Error::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            Error::Io(err) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
            Error::Anyhow(err) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
            Error::Config(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(json!({ "error": error_message, "code": code }));
        (status, body).into_response()
    }
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => Error::NotFound("Resource not found".to_string()),
            other => Error::Database(other),
        }
    }
}
