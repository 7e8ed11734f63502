//! API error types

use crate::services::studio::StudioError;
use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use validator::ValidationErrors;

/// Message returned when the provider rejects the submitted image format
pub const UNSUPPORTED_IMAGE_FORMAT: &str = "Unsupported image format. Please ensure your image is in PNG or JPEG format. AVIF and WebP formats are not supported by the AI service.";

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{message}")]
    UnsupportedImageFormat {
        message: String,
        details: Option<String>,
    },

    #[error("{message}")]
    Operation {
        message: String,
        details: Option<String>,
    },

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    /// 500 with the underlying failure in `details`
    pub fn operation(message: impl Into<String>, details: impl ToString) -> Self {
        Self::Operation {
            message: message.into(),
            details: Some(details.to_string()),
        }
    }

    /// 400 for an image the provider cannot read
    pub fn unsupported_image(message: impl Into<String>, details: Option<String>) -> Self {
        Self::UnsupportedImageFormat {
            message: message.into(),
            details,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) | Self::UnsupportedImageFormat { .. } => StatusCode::BAD_REQUEST,
            Self::Operation { .. } | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Map a studio failure, reporting image format problems as 400
    pub fn from_studio_error(err: StudioError, message: &str) -> Self {
        if err.is_image_format_error() {
            Self::unsupported_image(UNSUPPORTED_IMAGE_FORMAT, Some(err.to_string()))
        } else {
            Self::operation(message, err)
        }
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        let message = errors
            .field_errors()
            .into_iter()
            .min_by(|a, b| a.0.cmp(&b.0))
            .and_then(|(_, errors)| errors.first())
            .and_then(|e| e.message.as_ref())
            .map(|m| m.to_string())
            .unwrap_or_else(|| errors.to_string());
        Self::BadRequest(message)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (error, details) = match self {
            ApiError::BadRequest(message) => (message, None),
            ApiError::UnsupportedImageFormat { message, details }
            | ApiError::Operation { message, details } => (message, details),
            ApiError::Internal(err) => ("Internal server error".to_string(), Some(err.to_string())),
        };

        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %error, details = ?details, "Request failed");
        }

        (status, Json(ErrorResponse { error, details })).into_response()
    }
}

/// JSON error body
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}
