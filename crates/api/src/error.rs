//! API error types and handling

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use plangate_billing::{ActionStatus, BillingError, GenerateSessionError};

/// Application error type
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    // Authentication errors
    #[error("Authentication required")]
    Unauthorized,
    #[error("Cross-origin request rejected")]
    Forbidden,

    // Validation errors
    #[error("Invalid request: {0}")]
    BadRequest(String),

    // Resource errors
    #[error("Resource not found")]
    NotFound,

    // Billing errors
    #[error("Failed to generate user stripe session")]
    StripeSession,

    // Internal errors
    #[error("Database error: {0}")]
    Database(String),
    #[error("Internal server error")]
    Internal,
    #[error("Service unavailable")]
    ServiceUnavailable,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", self.to_string()),
            ApiError::Forbidden => (StatusCode::FORBIDDEN, "FORBIDDEN", self.to_string()),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            ApiError::NotFound => (StatusCode::NOT_FOUND, "NOT_FOUND", self.to_string()),
            ApiError::StripeSession => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "STRIPE_SESSION_FAILED",
                self.to_string(),
            ),
            ApiError::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "DATABASE_ERROR", "Database error".to_string()),
            ApiError::Internal => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", self.to_string()),
            ApiError::ServiceUnavailable => (StatusCode::SERVICE_UNAVAILABLE, "SERVICE_UNAVAILABLE", self.to_string()),
        };

        let mut body = json!({
            "error": {
                "code": code,
                "message": message,
            }
        });

        // Action callers read the action result shape: { status, stripeUrl? }
        if matches!(self, ApiError::StripeSession) {
            body["status"] = json!(ActionStatus::Error);
        }

        (status, Json(body)).into_response()
    }
}

impl From<GenerateSessionError> for ApiError {
    fn from(_: GenerateSessionError) -> Self {
        // Cause already logged by the dispatcher
        ApiError::StripeSession
    }
}

impl From<BillingError> for ApiError {
    fn from(err: BillingError) -> Self {
        tracing::error!(error = %err, "Billing error");
        match err {
            BillingError::Unauthorized(_) => ApiError::Unauthorized,
            BillingError::NotFound(_) | BillingError::SubscriptionNotFound(_) => ApiError::NotFound,
            BillingError::InvalidInput(msg) => ApiError::BadRequest(msg),
            BillingError::Database(msg) => ApiError::Database(msg),
            _ => ApiError::Internal,
        }
    }
}

/// Result type alias for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
