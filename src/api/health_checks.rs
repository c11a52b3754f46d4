use axum::{extract::State, http::StatusCode};
use tracing::warn;

use super::ApiError;
use crate::jobs::JobRegistry;

pub async fn ok() -> StatusCode {
    StatusCode::OK
}

/// Ready once the job store answers.
pub async fn readiness(State(registry): State<JobRegistry>) -> Result<StatusCode, ApiError> {
    registry.list().await.map_err(|e| {
        warn!("🩺 Readiness check failed: {}", e);
        ApiError::Unavailable(e.to_string())
    })?;

    Ok(StatusCode::OK)
}
