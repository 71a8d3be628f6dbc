/*
 * Responsibility
 * - Application-wide AppError
 * - IntoResponse (HTTP status / JSON error body)
 * - Only the sign-in verdict and the fail-closed user check cross into HTTP;
 *   persistence and projection faults are absorbed before they get here
 */
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::services::auth::identity_assertion::IdentityAssertionError;
use crate::services::auth::session_token::SessionTokenError;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("unauthorized")]
    Unauthorized,
    #[error("access denied: {reason}")]
    AccessDenied { reason: &'static str },
    #[error("internal server error")]
    Internal,
}

impl AppError {
    pub fn access_denied(reason: &'static str) -> Self {
        Self::AccessDenied { reason }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            AppError::AccessDenied { .. } => (StatusCode::FORBIDDEN, "ACCESS_DENIED"),
            AppError::Internal => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_SERVER_ERROR"),
        };

        let body = ErrorResponse {
            error: ErrorBody {
                code,
                message: self.to_string(),
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<SessionTokenError> for AppError {
    fn from(_: SessionTokenError) -> Self {
        AppError::Internal
    }
}

impl From<IdentityAssertionError> for AppError {
    fn from(_: IdentityAssertionError) -> Self {
        AppError::Unauthorized
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            AppError::Unauthorized.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::access_denied("domain_not_allowed")
                .into_response()
                .status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::Internal.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_access_denied_display() {
        assert_eq!(
            AppError::access_denied("missing_email").to_string(),
            "access denied: missing_email"
        );
    }
}
