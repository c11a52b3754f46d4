pub mod boundary;
pub mod error;
pub mod health_checks;
pub mod jobs;
pub mod session;

use axum::{routing::get, Router};

pub use boundary::{exception_boundary, CorrelationId, Failure, CORRELATION_ID_HEADER};
pub use error::ApiError;

use crate::app::App;

/// Routes mounted under `/api`. All of them require a bearer token.
pub fn routes() -> Router<App> {
    Router::new()
        .route("/session", get(session::show))
        .route("/jobs", get(jobs::index))
        .route("/jobs/{job_id}", get(jobs::show))
}

pub async fn not_found() -> ApiError {
    ApiError::NotFound("route".to_string())
}

#[cfg(test)]
mod tests {
    use chrono::TimeDelta;
    use serde_json::Value;

    use crate::{
        auth::{TokenCredentials, TokenValidator},
        jobs::{handler_fn, JobDefinition},
        schedule::RecurrenceRule,
        tests::{
            assertions::{assert_not_found, assert_unauthorized},
            setup_test,
        },
    };

    #[tokio::test]
    async fn test_liveness_needs_no_token() {
        let test = setup_test().await;

        test.server.get("/liveness").await.assert_status_ok();
        test.server.get("/readiness").await.assert_status_ok();
    }

    #[tokio::test]
    async fn test_missing_token_is_unauthorized() {
        let test = setup_test().await;

        let response = test.server.get("/api/session").await;

        assert_unauthorized(&response, "malformed");
        assert_eq!(response.header("www-authenticate"), "Bearer");
    }

    #[tokio::test]
    async fn test_session_returns_claims() {
        let test = setup_test().await;

        let response = test
            .server
            .get("/api/session")
            .authorization_bearer(test.token_for("operator"))
            .await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["sub"], "operator");
        assert_eq!(body["iss"], test.config.auth.issuer);
    }

    #[tokio::test]
    async fn test_rejection_never_echoes_token() {
        let test = setup_test().await;
        let credentials = test.app.validator.credentials();
        let forger = TokenValidator::new(
            TokenCredentials::new(
                credentials.issuer(),
                credentials.audience(),
                "not-the-configured-secret",
                credentials.clock_skew(),
            )
            .unwrap(),
        );
        let token = forger.issue("operator", TimeDelta::minutes(5)).unwrap();

        let response = test
            .server
            .get("/api/session")
            .authorization_bearer(&token)
            .await;

        assert_unauthorized(&response, "invalid_signature");
        assert!(!response.text().contains(&token));
    }

    #[tokio::test]
    async fn test_job_status_lookup() {
        let test = setup_test().await;
        test.registry
            .upsert(
                "cleanup",
                RecurrenceRule::daily(12, 8).unwrap(),
                handler_fn(|| async { Ok(()) }),
            )
            .await
            .unwrap();
        let token = test.token_for("operator");

        let found = test
            .server
            .get("/api/jobs/cleanup")
            .authorization_bearer(&token)
            .await;
        found.assert_status_ok();
        let definition: JobDefinition = found.json();
        assert_eq!(definition.job_id, "cleanup");
        assert_eq!(definition.rule, RecurrenceRule::daily(12, 8).unwrap());

        let all: Vec<JobDefinition> = test
            .server
            .get("/api/jobs")
            .authorization_bearer(&token)
            .await
            .json();
        assert_eq!(all.len(), 1);

        let missing = test
            .server
            .get("/api/jobs/missing")
            .authorization_bearer(&token)
            .await;
        assert_not_found(&missing);
    }

    #[tokio::test]
    async fn test_unknown_route_is_structured() {
        let test = setup_test().await;

        let response = test.server.get("/nowhere").await;

        assert_not_found(&response);
        let body: Value = response.json();
        assert_eq!(body["error"]["category"], "not_found");
    }
}
