//! Common error types for the text-to-image gateway

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use crate::validation::ValidationErrors;

/// Application-wide error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("{0}")]
    Validation(ValidationErrors),

    #[error("Model with ID {0} not found")]
    UnknownModel(String),

    #[error("Model with ID {0} already registered")]
    DuplicateModel(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("External API error: {0}")]
    ExternalApi(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error taxonomy exposed to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    InvalidRequest,
    Unauthorized,
    InternalServerError,
    ExternalApiError,
    Timeout,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidRequest => "INVALID_REQUEST",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::InternalServerError => "INTERNAL_SERVER_ERROR",
            Self::ExternalApiError => "EXTERNAL_API_ERROR",
            Self::Timeout => "TIMEOUT",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidRequest => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::InternalServerError => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ExternalApiError => StatusCode::BAD_GATEWAY,
            Self::Timeout => StatusCode::GATEWAY_TIMEOUT,
        }
    }
}

impl AppError {
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::InvalidRequest(_)
            | AppError::Validation(_)
            | AppError::UnknownModel(_)
            | AppError::DuplicateModel(_) => ErrorCode::InvalidRequest,
            AppError::Unauthorized(_) => ErrorCode::Unauthorized,
            AppError::ExternalApi(_) | AppError::HttpClient(_) => ErrorCode::ExternalApiError,
            AppError::Timeout(_) => ErrorCode::Timeout,
            AppError::Config(_) | AppError::Io(_) | AppError::Json(_) | AppError::Internal(_) => {
                ErrorCode::InternalServerError
            }
        }
    }

    pub fn status_code(&self) -> StatusCode {
        self.code().status()
    }

    /// Message safe to hand to a caller. Local failures never expose their cause.
    pub fn public_message(&self) -> String {
        match self.code() {
            ErrorCode::InternalServerError => "Internal server error".to_string(),
            _ => self.to_string(),
        }
    }
}

/// Uniform error envelope returned by every endpoint
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub status: &'static str,
    pub message: String,
    pub code: &'static str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let code = self.code();
        if code == ErrorCode::InternalServerError {
            error!(error = %self, "Request failed with internal error");
        }

        let details = match &self {
            AppError::Validation(errors) => errors.iter().map(|e| e.to_string()).collect(),
            _ => Vec::new(),
        };

        let body = Json(ErrorResponse {
            status: "error",
            message: self.public_message(),
            code: code.as_str(),
            details,
        });

        (code.status(), body).into_response()
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, AppError>;
