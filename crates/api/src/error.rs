//! Error to HTTP response mapping.
//!
//! Every handler failure becomes `{ "error": "<CODE>", "message": "<text>" }`
//! with the status code of the originating error. Server-side failures are
//! logged and answered with a generic message.

use axum::{
    Json,
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sea_orm::DbErr;
use serde_json::json;
use tracing::error;

use firecert_core::application::ApplicationError;
use firecert_core::auth::{AccessDenied, PasswordError};
use firecert_core::establishment::EstablishmentError;
use firecert_core::inspection::InspectionError;
use firecert_db::ProfileError;
use firecert_shared::{AppError, JwtError};

const INTERNAL_MESSAGE: &str = "An internal error occurred";

/// An error ready to be rendered as a JSON response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl ApiError {
    /// Build an error from a status code, stable code, and message.
    #[must_use]
    pub fn new(status: u16, code: &'static str, message: impl Into<String>) -> Self {
        let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let message = message.into();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!(code, error = %message, "Request failed");
            return Self {
                status,
                code,
                message: INTERNAL_MESSAGE.to_string(),
            };
        }
        Self {
            status,
            code,
            message,
        }
    }

    /// 400 with `VALIDATION_ERROR`.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(400, "VALIDATION_ERROR", message)
    }

    /// 401 with the given code.
    #[must_use]
    pub fn unauthorized(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(401, code, message)
    }

    /// 404 with `NOT_FOUND`.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(404, "NOT_FOUND", message)
    }

    /// HTTP status of the response.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Stable error code of the response.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.code
    }

    /// Message returned to the client.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(json!({
                "error": self.code,
                "message": self.message
            })),
        )
            .into_response()
    }
}

/// Result type for handlers.
pub type ApiResult<T> = Result<T, ApiError>;

impl From<AppError> for ApiError {
    fn from(e: AppError) -> Self {
        Self::new(e.status_code(), e.error_code(), e.to_string())
    }
}

impl From<EstablishmentError> for ApiError {
    fn from(e: EstablishmentError) -> Self {
        Self::new(e.status_code(), e.error_code(), e.to_string())
    }
}

impl From<ApplicationError> for ApiError {
    fn from(e: ApplicationError) -> Self {
        Self::new(e.status_code(), e.error_code(), e.to_string())
    }
}

impl From<InspectionError> for ApiError {
    fn from(e: InspectionError) -> Self {
        Self::new(e.status_code(), e.error_code(), e.to_string())
    }
}

impl From<AccessDenied> for ApiError {
    fn from(e: AccessDenied) -> Self {
        Self::new(403, "FORBIDDEN", e.0)
    }
}

impl From<DbErr> for ApiError {
    fn from(e: DbErr) -> Self {
        Self::new(500, "DATABASE_ERROR", e.to_string())
    }
}

impl From<ProfileError> for ApiError {
    fn from(e: ProfileError) -> Self {
        match e {
            ProfileError::DuplicateEmail(_) => Self::new(
                409,
                "EMAIL_EXISTS",
                "An account with this email already exists",
            ),
            ProfileError::Database(e) => e.into(),
        }
    }
}

impl From<PasswordError> for ApiError {
    fn from(e: PasswordError) -> Self {
        match e {
            PasswordError::TooShort => Self::validation(e.to_string()),
            _ => Self::new(500, "INTERNAL_ERROR", e.to_string()),
        }
    }
}

impl From<JwtError> for ApiError {
    fn from(e: JwtError) -> Self {
        match e {
            JwtError::Expired => Self::unauthorized("TOKEN_EXPIRED", "Token has expired"),
            JwtError::EncodingError(_) => Self::new(500, "INTERNAL_ERROR", e.to_string()),
            JwtError::DecodingError(_) | JwtError::WrongKind { .. } => {
                Self::unauthorized("INVALID_TOKEN", "Invalid or malformed token")
            }
        }
    }
}

impl From<MultipartError> for ApiError {
    fn from(e: MultipartError) -> Self {
        Self::new(e.status().as_u16(), "INVALID_MULTIPART", e.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use firecert_core::workflow::WorkflowError;
    use uuid::Uuid;

    #[test]
    fn test_domain_errors_keep_status_and_code() {
        let err: ApiError = EstablishmentError::NotFound(Uuid::nil()).into();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.code(), "ESTABLISHMENT_NOT_FOUND");

        let err: ApiError = ApplicationError::Workflow(WorkflowError::ConcurrentModification).into();
        assert_eq!(err.status(), StatusCode::CONFLICT);
        assert_eq!(err.code(), "CONCURRENT_MODIFICATION");
    }

    #[test]
    fn test_internal_errors_hide_details() {
        let err: ApiError = InspectionError::repository("connection reset by peer").into();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message(), INTERNAL_MESSAGE);
    }

    #[test]
    fn test_expired_token_is_unauthorized() {
        let err: ApiError = JwtError::Expired.into();
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(err.code(), "TOKEN_EXPIRED");
    }
}
