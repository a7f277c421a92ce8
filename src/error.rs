use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Category of an auction failure, for callers that branch on kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    State,
    Conflict,
    Permission,
    NotFound,
    Storage,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::State => "state",
            ErrorKind::Conflict => "conflict",
            ErrorKind::Permission => "permission",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Storage => "storage",
        }
    }
}

/// Domain error returned by every auction operation.
#[derive(Debug, Error)]
pub enum AuctionError {
    /// Malformed or policy-violating input.
    #[error("{0}")]
    Validation(String),
    /// Operation attempted in the wrong lifecycle state.
    #[error("{0}")]
    State(String),
    /// Uniqueness violation.
    #[error("{0}")]
    Conflict(String),
    /// Actor lacks the right to perform the action.
    #[error("{0}")]
    Permission(String),
    #[error("{0} not found")]
    NotFound(String),
    #[error(transparent)]
    Storage(#[from] sqlx::Error),
}

impl AuctionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuctionError::Validation(_) => ErrorKind::Validation,
            AuctionError::State(_) => ErrorKind::State,
            AuctionError::Conflict(_) => ErrorKind::Conflict,
            AuctionError::Permission(_) => ErrorKind::Permission,
            AuctionError::NotFound(_) => ErrorKind::NotFound,
            AuctionError::Storage(_) => ErrorKind::Storage,
        }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        AuctionError::Validation(msg.into())
    }

    pub fn state(msg: impl Into<String>) -> Self {
        AuctionError::State(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        AuctionError::Conflict(msg.into())
    }

    pub fn permission(msg: impl Into<String>) -> Self {
        AuctionError::Permission(msg.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        AuctionError::NotFound(what.into())
    }

    /// Map a unique-constraint violation to `Conflict`, passing other errors through.
    pub fn from_unique(err: sqlx::Error, msg: impl Into<String>) -> Self {
        let is_unique = err
            .as_database_error()
            .map(|db| db.is_unique_violation())
            .unwrap_or(false);
        if is_unique {
            AuctionError::Conflict(msg.into())
        } else {
            AuctionError::Storage(err)
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Internal server error: {0}")]
    Internal(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error(transparent)]
    Auction(#[from] AuctionError),
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, kind, error_message) = match self {
            AppError::Config(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "config", msg),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "internal", msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg),
            AppError::Auction(err) => {
                let kind = err.kind();
                let status = match kind {
                    ErrorKind::Validation => StatusCode::UNPROCESSABLE_ENTITY,
                    ErrorKind::State | ErrorKind::Conflict => StatusCode::CONFLICT,
                    ErrorKind::Permission => StatusCode::FORBIDDEN,
                    ErrorKind::NotFound => StatusCode::NOT_FOUND,
                    ErrorKind::Storage => StatusCode::INTERNAL_SERVER_ERROR,
                };
                if kind == ErrorKind::Storage {
                    tracing::error!(error = %err, "storage failure while handling request");
                }
                (status, kind.as_str(), err.to_string())
            }
        };

        let body = Json(json!({
            "error": error_message,
            "kind": kind,
        }));

        (status, body).into_response()
    }
}
