//! Outermost request wrapper.
//!
//! Every request gets a correlation id. Failures raised inside, whether an
//! [`ApiError`](super::ApiError) or a panic, become a structured JSON error
//! naming that id, and the full failure is logged under the same id.

use std::{fmt, future::Future, panic::AssertUnwindSafe};

use axum::{
    extract::Request,
    http::{header::WWW_AUTHENTICATE, HeaderName, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use futures_util::FutureExt as _;
use serde::Serialize;
use tracing::{error, warn};
use uuid::Uuid;

use crate::jobs::job_result::panic_message;

pub const CORRELATION_ID_HEADER: HeaderName = HeaderName::from_static("x-correlation-id");

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CorrelationId(Uuid);

impl CorrelationId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for CorrelationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A request that ended in an error.
#[derive(Debug, Clone)]
pub struct Failure {
    pub status: StatusCode,
    pub category: &'static str,
    pub kind: &'static str,
    /// Safe to show the caller.
    pub message: String,
    /// Logged only.
    pub detail: String,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: ErrorDetail<'a>,
}

#[derive(Serialize)]
struct ErrorDetail<'a> {
    category: &'a str,
    kind: &'a str,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    correlation_id: Option<String>,
}

impl Failure {
    fn panic(detail: String) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            category: "internal",
            kind: "unhandled",
            message: "an internal error occurred".to_string(),
            detail,
        }
    }

    pub fn render(&self, correlation_id: Option<CorrelationId>) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                category: self.category,
                kind: self.kind,
                message: &self.message,
                correlation_id: correlation_id.map(|id| id.to_string()),
            },
        };

        let mut response = (self.status, Json(body)).into_response();
        if self.status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}

/// Runs `handler` and turns an error response or a panic into a [`Failure`].
pub async fn guard<F>(handler: F) -> Result<Response, Failure>
where
    F: Future<Output = Response>,
{
    match AssertUnwindSafe(handler).catch_unwind().await {
        Ok(response) => match response.extensions().get::<Failure>() {
            Some(failure) => Err(failure.clone()),
            None => Ok(response),
        },
        Err(payload) => Err(Failure::panic(panic_message(payload.as_ref()))),
    }
}

pub async fn exception_boundary(mut request: Request, next: Next) -> Response {
    let correlation_id = CorrelationId::new();
    request.extensions_mut().insert(correlation_id);

    let method = request.method().clone();
    let path = request.uri().path().to_owned();

    let mut response = match guard(next.run(request)).await {
        Ok(response) => response,
        Err(failure) => {
            if failure.status.is_server_error() {
                error!(
                    %correlation_id,
                    "💥 {} {} failed with {} {}: {}",
                    method, path, failure.status, failure.kind, failure.detail
                );
            } else {
                warn!(
                    %correlation_id,
                    "🚫 {} {} rejected with {} {}: {}",
                    method, path, failure.status, failure.kind, failure.detail
                );
            }
            failure.render(Some(correlation_id))
        }
    };

    if let Ok(value) = HeaderValue::from_str(&correlation_id.to_string()) {
        response.headers_mut().insert(CORRELATION_ID_HEADER, value);
    }
    response
}
