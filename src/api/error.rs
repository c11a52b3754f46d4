use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use super::boundary::Failure;
use crate::{auth::AuthError, jobs::store::StoreError};

/// Error returned by request handlers.
///
/// Rendered as a structured JSON body; the exception boundary adds the
/// correlation id and logs the detail server-side.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Unauthorized(#[from] AuthError),
    #[error("{0} not found")]
    NotFound(String),
    #[error("service unavailable: {0}")]
    Unavailable(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn failure(&self) -> Failure {
        match self {
            Self::Unauthorized(e) => Failure {
                status: StatusCode::UNAUTHORIZED,
                category: "authentication",
                kind: e.kind(),
                message: e.to_string(),
                detail: e.to_string(),
            },
            Self::NotFound(_) => Failure {
                status: StatusCode::NOT_FOUND,
                category: "not_found",
                kind: "not_found",
                message: self.to_string(),
                detail: self.to_string(),
            },
            Self::Unavailable(detail) => Failure {
                status: StatusCode::SERVICE_UNAVAILABLE,
                category: "unavailable",
                kind: "service_unavailable",
                message: "service temporarily unavailable".to_string(),
                detail: detail.clone(),
            },
            // Internal details stay in the logs
            Self::Internal(detail) => Failure {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                category: "internal",
                kind: "internal_error",
                message: "an internal error occurred".to_string(),
                detail: detail.clone(),
            },
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        Self::Internal(e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let failure = self.failure();
        let mut response = failure.render(None);
        response.extensions_mut().insert(failure);
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unauthorized_names_auth_kind() {
        let failure = ApiError::from(AuthError::Expired).failure();

        assert_eq!(failure.status, StatusCode::UNAUTHORIZED);
        assert_eq!(failure.category, "authentication");
        assert_eq!(failure.kind, "expired");
    }

    #[test]
    fn test_internal_hides_detail_from_message() {
        let failure = ApiError::Internal("connection refused on 10.0.0.5".to_string()).failure();

        assert_eq!(failure.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!failure.message.contains("10.0.0.5"));
        assert!(failure.detail.contains("10.0.0.5"));
    }

    #[test]
    fn test_response_carries_failure_extension() {
        let response = ApiError::NotFound("job 'cleanup'".to_string()).into_response();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let failure = response.extensions().get::<Failure>().unwrap();
        assert_eq!(failure.message, "job 'cleanup' not found");
    }
}
