//! Unified error handling for admin.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use sage_kitchen_core::GatewayError;
use sage_kitchen_core::catalog::ProductError;
use sage_kitchen_core::types::{EmailError, PriceError, UnknownVariant};
use sage_kitchen_core::upload::UploadError;

/// Application-level error type for the admin API.
#[derive(Debug, Error)]
pub enum AppError {
    /// A gateway call failed.
    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    /// Session store failed.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Product form was invalid.
    #[error(transparent)]
    Product(#[from] ProductError),

    /// Image upload was rejected.
    #[error(transparent)]
    Upload(#[from] UploadError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User lacks permission.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl From<EmailError> for AppError {
    fn from(err: EmailError) -> Self {
        Self::BadRequest(err.to_string())
    }
}

impl From<PriceError> for AppError {
    fn from(err: PriceError) -> Self {
        Self::BadRequest(err.to_string())
    }
}

impl From<UnknownVariant> for AppError {
    fn from(err: UnknownVariant) -> Self {
        Self::BadRequest(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::Gateway(GatewayError::NotFound(_)) | Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Gateway(GatewayError::Conflict(_)) => StatusCode::CONFLICT,
            Self::Gateway(GatewayError::InvalidCredentials) => StatusCode::UNAUTHORIZED,
            Self::Gateway(GatewayError::Backend(_)) => StatusCode::BAD_GATEWAY,
            Self::Gateway(GatewayError::DataCorruption(_)) | Self::Session(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Product(_) | Self::Upload(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        };

        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Admin request error"
            );
        }

        // Don't expose internal error details to clients
        let message = match &self {
            Self::Gateway(GatewayError::NotFound(what)) => format!("{what} not found"),
            Self::Gateway(GatewayError::Conflict(msg)) | Self::BadRequest(msg) => msg.clone(),
            Self::Gateway(GatewayError::InvalidCredentials) => {
                "Invalid email or password".to_string()
            }
            Self::NotFound(what) => format!("{what} not found"),
            Self::Forbidden(msg) => msg.clone(),
            Self::Product(err) => err.to_string(),
            Self::Upload(err) => err.to_string(),
            _ => "Internal server error".to_string(),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context for the signed-in admin.
pub fn set_sentry_user(admin_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(admin_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("order".to_string());
        assert_eq!(err.to_string(), "Not found: order");

        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            get_status(AppError::NotFound("test".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Forbidden("test".to_string())),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            get_status(ProductError::MissingField("images").into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(GatewayError::NotFound("order").into()),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(GatewayError::backend("timeout").into()),
            StatusCode::BAD_GATEWAY
        );
    }
}
