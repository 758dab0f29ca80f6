use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::refine::Stage;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
///
/// The first four variants are the pipeline taxonomy. Their messages are shown
/// to the user verbatim; nothing is retried or degraded at this level.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Unreadable document: {0}")]
    UnreadableDocument(String),

    #[error("{stage} stage unavailable: {message}")]
    TransformUnavailable { stage: Stage, message: String },

    #[error("Render error: {0}")]
    Render(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid state transition: {0}")]
    InvalidTransition(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Stable machine-readable code, also used by the UI to pick a banner.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::UnreadableDocument(_) => "UNREADABLE_DOCUMENT",
            AppError::TransformUnavailable { .. } => "TRANSFORM_UNAVAILABLE",
            AppError::Render(_) => "RENDER_ERROR",
            AppError::Configuration(_) => "CONFIGURATION_ERROR",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::InvalidTransition(_) => "INVALID_TRANSITION",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            AppError::UnreadableDocument(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::TransformUnavailable { .. } => StatusCode::BAD_GATEWAY,
            AppError::Render(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Configuration(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::InvalidTransition(_) => StatusCode::CONFLICT,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let message = match &self {
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                "An internal server error occurred".to_string()
            }
            AppError::TransformUnavailable { stage, message } => {
                tracing::error!(stage = %stage, "Transform unavailable: {message}");
                self.to_string()
            }
            AppError::Render(msg) => {
                tracing::error!("Render error: {msg}");
                self.to_string()
            }
            AppError::Configuration(msg) => {
                tracing::error!("Configuration error: {msg}");
                self.to_string()
            }
            _ => self.to_string(),
        };

        let body = Json(json!({
            "error": {
                "code": self.code(),
                "message": message
            }
        }));

        (self.status(), body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transform_unavailable_names_the_stage() {
        let err = AppError::TransformUnavailable {
            stage: Stage::Tone,
            message: "HTTP error: timed out".to_string(),
        };
        assert_eq!(err.to_string(), "Tone stage unavailable: HTTP error: timed out");
        assert_eq!(err.code(), "TRANSFORM_UNAVAILABLE");
    }

    #[test]
    fn test_pipeline_errors_map_to_distinct_statuses() {
        assert_eq!(
            AppError::UnreadableDocument("x".into()).status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            AppError::Configuration("x".into()).status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            AppError::InvalidTransition("x".into()).status(),
            StatusCode::CONFLICT
        );
    }
}
