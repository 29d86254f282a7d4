//! API error types.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use prodreel_kling::KlingError;
use prodreel_media::MediaError;
use prodreel_shopify::{ShopifyError, UserError};

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Payment required: {0}")]
    PaymentRequired(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Database error: {0}")]
    Db(#[from] sqlx::Error),

    #[error("Shopify error: {0}")]
    Shopify(#[from] ShopifyError),

    #[error("Generation error: {0}")]
    Kling(#[from] KlingError),

    #[error("Media error: {0}")]
    Media(#[from] MediaError),
}

impl ApiError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn payment_required(msg: impl Into<String>) -> Self {
        Self::PaymentRequired(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::PaymentRequired(_) => StatusCode::PAYMENT_REQUIRED,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) | ApiError::Db(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Shopify(err) => match err {
                // Pass the admin API's own status through when it refused us outright.
                ShopifyError::Transport { status, .. } => {
                    StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
                }
                ShopifyError::Validation { .. } => StatusCode::BAD_REQUEST,
                ShopifyError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
                ShopifyError::GraphQl { .. }
                | ShopifyError::Upload { .. }
                | ShopifyError::Processing { .. }
                | ShopifyError::Decode(_)
                | ShopifyError::Network(_) => StatusCode::BAD_GATEWAY,
                ShopifyError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Kling(err) => match err {
                KlingError::Api { status, .. } => {
                    StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
                }
                KlingError::Network(_) => StatusCode::BAD_GATEWAY,
                KlingError::Token(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Media(err) => match err {
                MediaError::Download { .. } | MediaError::EmptyDownload | MediaError::Network(_) => {
                    StatusCode::BAD_GATEWAY
                }
                MediaError::FfmpegNotFound | MediaError::FfmpegFailed { .. } | MediaError::Io(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
        }
    }

    fn request_id(&self) -> Option<String> {
        match self {
            ApiError::Shopify(err) => err.request_id().map(|s| s.to_string()),
            _ => None,
        }
    }

    fn user_errors(&self) -> Option<Vec<UserError>> {
        match self {
            ApiError::Shopify(ShopifyError::Validation { user_errors, .. }) => {
                Some(user_errors.clone())
            }
            _ => None,
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    request_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    user_errors: Option<Vec<UserError>>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Don't expose internal error details in production
        let detail = match &self {
            ApiError::Internal(_) | ApiError::Db(_) => {
                if std::env::var("ENVIRONMENT").unwrap_or_default() == "production" {
                    "An internal error occurred".to_string()
                } else {
                    self.to_string()
                }
            }
            _ => self.to_string(),
        };

        let body = ErrorResponse {
            detail,
            request_id: self.request_id(),
            user_errors: self.user_errors(),
        };

        (status, Json(body)).into_response()
    }
}
