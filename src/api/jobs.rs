use axum::{
    extract::{Path, State},
    Json,
};

use super::ApiError;
use crate::{
    auth::Authenticated,
    jobs::{JobDefinition, JobRegistry},
};

pub async fn index(
    _caller: Authenticated,
    State(registry): State<JobRegistry>,
) -> Result<Json<Vec<JobDefinition>>, ApiError> {
    Ok(Json(registry.list().await?))
}

pub async fn show(
    _caller: Authenticated,
    State(registry): State<JobRegistry>,
    Path(job_id): Path<String>,
) -> Result<Json<JobDefinition>, ApiError> {
    registry
        .status(&job_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("job '{job_id}'")))
}
