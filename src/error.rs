//! Error types for the SACCO backend

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::config::ConfigError;
use crate::contract::ContractError;

/// Result type used throughout the crate
pub type Result<T> = std::result::Result<T, SaccoError>;

#[derive(Debug, Error)]
pub enum SaccoError {
    /// Malformed or missing request data
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    /// The request collides with existing state (duplicate wallet, second vote, ...)
    #[error("{0}")]
    Conflict(String),

    /// The entity is not in a state that allows the operation
    #[error("{0}")]
    InvalidState(String),

    #[error("Contract call failed: {0}")]
    Contract(#[from] ContractError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl SaccoError {
    pub fn validation<S: Into<String>>(msg: S) -> Self {
        SaccoError::Validation(msg.into())
    }

    pub fn unauthorized<S: Into<String>>(msg: S) -> Self {
        SaccoError::Unauthorized(msg.into())
    }

    pub fn forbidden<S: Into<String>>(msg: S) -> Self {
        SaccoError::Forbidden(msg.into())
    }

    pub fn not_found<S: Into<String>>(msg: S) -> Self {
        SaccoError::NotFound(msg.into())
    }

    pub fn conflict<S: Into<String>>(msg: S) -> Self {
        SaccoError::Conflict(msg.into())
    }

    pub fn invalid_state<S: Into<String>>(msg: S) -> Self {
        SaccoError::InvalidState(msg.into())
    }

    pub fn internal<S: Into<String>>(msg: S) -> Self {
        SaccoError::Internal(msg.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) | Self::InvalidState(_) => StatusCode::CONFLICT,
            Self::Contract(_) => StatusCode::BAD_GATEWAY,
            Self::Database(_) | Self::Migration(_) | Self::Config(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for SaccoError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, "request failed");
            "Internal server error".to_string()
        } else {
            tracing::debug!(error = %self, %status, "request rejected");
            self.to_string()
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
