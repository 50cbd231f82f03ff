// HTTP API Error Types
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

/// HTTP API error with appropriate status codes and client-friendly messages
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    Validation(String),

    // 400 Bad Request with a CONFLICT code; the public API reports
    // duplicate applications, duplicate candidates, and repeat votes as 400
    Conflict(String),

    // 401 Unauthorized
    Unauthorized(String),

    // 403 Forbidden
    Forbidden(String),

    // 404 Not Found
    NotFound(String),

    // 500 Internal Server Error
    InternalServerError(String),

    // 503 Service Unavailable
    ServiceUnavailable(String),
}

impl ApiError {
    /// Get HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::Validation(_) => 400,
            ApiError::Conflict(_) => 400,
            ApiError::Unauthorized(_) => 401,
            ApiError::Forbidden(_) => 403,
            ApiError::NotFound(_) => 404,
            ApiError::InternalServerError(_) => 500,
            ApiError::ServiceUnavailable(_) => 503,
        }
    }

    /// Get client-safe error message
    pub fn message(&self) -> &str {
        match self {
            ApiError::Validation(msg)
            | ApiError::Conflict(msg)
            | ApiError::Unauthorized(msg)
            | ApiError::Forbidden(msg)
            | ApiError::NotFound(msg)
            | ApiError::InternalServerError(msg)
            | ApiError::ServiceUnavailable(msg) => msg,
        }
    }

    /// Get error code for client handling
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "VALIDATION_ERROR",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::Forbidden(_) => "FORBIDDEN",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::InternalServerError(_) => "INTERNAL_SERVER_ERROR",
            ApiError::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
        }
    }

    /// Convert to JSON response body
    pub fn to_json(&self) -> Value {
        json!({
            "error": true,
            "message": self.message(),
            "code": self.error_code(),
        })
    }
}

// Static constructor methods
impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        ApiError::Conflict(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        ApiError::InternalServerError(message.into())
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        ApiError::ServiceUnavailable(message.into())
    }
}

// Convert domain error types to ApiError
impl From<crate::auth::TokenError> for ApiError {
    fn from(err: crate::auth::TokenError) -> Self {
        match err {
            crate::auth::TokenError::Invalid => {
                ApiError::forbidden("Forbidden: Invalid or expired token")
            }
            other => {
                tracing::error!("token error: {}", other);
                ApiError::internal_server_error("An error occurred while processing your request")
            }
        }
    }
}

impl From<crate::services::user_service::UserError> for ApiError {
    fn from(err: crate::services::user_service::UserError) -> Self {
        use crate::services::user_service::UserError::*;
        let message = err.to_string();
        match err {
            NotFound => ApiError::not_found(message),
            EmailTaken => ApiError::conflict(message),
            InvalidCredentials | MissingCredentials | UnknownRole | RoleNotAssignable => {
                ApiError::validation(message)
            }
            AccountLocked => ApiError::forbidden(message),
            Token(inner) => inner.into(),
        }
    }
}

impl From<crate::services::enrollment_service::EnrollmentError> for ApiError {
    fn from(err: crate::services::enrollment_service::EnrollmentError) -> Self {
        use crate::services::enrollment_service::EnrollmentError::*;
        let message = err.to_string();
        match err {
            NotFound | UserNotFound | SectionNotFound => ApiError::not_found(message),
            DuplicateApplication
            | AlreadyRejected
            | NotPending
            | DuplicateSection
            | CapacityExceeded(_) => ApiError::conflict(message),
            InvalidLrn | InvalidLevel | MissingField(_) => ApiError::validation(message),
        }
    }
}

impl From<crate::services::academics_service::AcademicsError> for ApiError {
    fn from(err: crate::services::academics_service::AcademicsError) -> Self {
        ApiError::not_found(err.to_string())
    }
}

impl From<crate::services::election_service::ElectionError> for ApiError {
    fn from(err: crate::services::election_service::ElectionError) -> Self {
        use crate::services::election_service::ElectionError::*;
        let message = err.to_string();
        match err {
            ElectionNotFound | CandidateNotFound => ApiError::not_found(message),
            InvalidDateRange | MissingFields | NotActive => ApiError::validation(message),
            DuplicateCandidate | AlreadyVoted => ApiError::conflict(message),
        }
    }
}

// Standard error trait implementations
impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.to_json())).into_response()
    }
}
