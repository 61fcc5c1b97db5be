/// Unified error types for Canvas Hub
use axum::{
    extract::rejection::{BytesRejection, JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for the admin service
#[derive(Error, Debug)]
pub enum HubError {
    /// Authentication errors
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Authorization errors
    #[error("Not authorized: {0}")]
    Authorization(String),

    /// Validation errors (bad payloads, missing reasons, unknown filter values)
    #[error("Validation error: {0}")]
    Validation(String),

    /// A transition action was invoked from a status it does not accept
    #[error("Cannot {action} {entity} {id} while it is {status}")]
    InvalidTransition {
        entity: &'static str,
        id: String,
        action: String,
        status: &'static str,
    },

    /// The action name is not part of the entity's transition table
    #[error("Unknown action '{action}' for {entity}")]
    UnknownAction { entity: &'static str, action: String },

    /// Not found errors
    #[error("Not found: {0}")]
    NotFound(String),

    /// Conflict errors (e.g., duplicate record id)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Rate limiting errors
    #[error("Rate limit exceeded")]
    RateLimitExceeded { retry_after: std::time::Duration },

    /// Failures talking to an external collaborator (AI service, analytics)
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// Internal server errors
    #[error("Internal error: {0}")]
    Internal(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<validator::ValidationErrors> for HubError {
    fn from(errors: validator::ValidationErrors) -> Self {
        HubError::Validation(errors.to_string())
    }
}

impl From<JsonRejection> for HubError {
    fn from(rejection: JsonRejection) -> Self {
        HubError::Validation(rejection.body_text())
    }
}

impl From<BytesRejection> for HubError {
    fn from(rejection: BytesRejection) -> Self {
        HubError::Validation(rejection.body_text())
    }
}

impl From<reqwest::Error> for HubError {
    fn from(error: reqwest::Error) -> Self {
        HubError::Upstream(error.to_string())
    }
}

/// JSON error body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl HubError {
    /// HTTP status and machine-readable code for this error
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            HubError::Authentication(_) => (StatusCode::UNAUTHORIZED, "AuthenticationRequired"),
            HubError::Authorization(_) => (StatusCode::FORBIDDEN, "Forbidden"),
            HubError::Validation(_) => (StatusCode::BAD_REQUEST, "InvalidRequest"),
            HubError::InvalidTransition { .. } => (StatusCode::CONFLICT, "InvalidTransition"),
            HubError::UnknownAction { .. } => (StatusCode::BAD_REQUEST, "UnknownAction"),
            HubError::NotFound(_) => (StatusCode::NOT_FOUND, "NotFound"),
            HubError::Conflict(_) => (StatusCode::CONFLICT, "Conflict"),
            HubError::RateLimitExceeded { .. } => {
                (StatusCode::TOO_MANY_REQUESTS, "RateLimitExceeded")
            }
            HubError::Upstream(_) => (StatusCode::BAD_GATEWAY, "UpstreamUnavailable"),
            HubError::Internal(_) | HubError::Io(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "InternalServerError")
            }
        }
    }
}

/// Convert HubError to HTTP response
impl IntoResponse for HubError {
    fn into_response(self) -> Response {
        let (status, error_code) = self.status_and_code();

        let message = match &self {
            HubError::Internal(_) | HubError::Io(_) => {
                tracing::error!(error = %self, "request failed");
                "Internal server error".to_string() // Don't leak details
            }
            // Collaborator failures surface as a generic message
            HubError::Upstream(_) => {
                tracing::warn!(error = %self, "upstream call failed");
                "The service is temporarily unavailable, please try again".to_string()
            }
            _ => self.to_string(),
        };

        let body = Json(ErrorResponse {
            error: error_code.to_string(),
            message,
        });

        (status, body).into_response()
    }
}

/// Result type alias for admin service operations
pub type HubResult<T> = Result<T, HubError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transition_error_maps_to_conflict() {
        let err = HubError::InvalidTransition {
            entity: "subscription",
            id: "sub_001".to_string(),
            action: "resume".to_string(),
            status: "active",
        };
        assert_eq!(err.status_and_code().0, StatusCode::CONFLICT);
        assert_eq!(
            err.to_string(),
            "Cannot resume subscription sub_001 while it is active"
        );
    }

    #[test]
    fn test_internal_error_hides_details() {
        let response = HubError::Internal("lock poisoned".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
