//! Persistence of recurring-job state.

mod database;
mod memory;

pub use database::DatabaseStore;
pub use memory::InMemoryStore;

use async_trait::async_trait;
use sea_orm::DbErr;
use thiserror::Error;

use super::JobDefinition;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] DbErr),
    #[error("invalid stored job '{job_id}': {reason}")]
    InvalidRecord { job_id: String, reason: String },
}

/// Backend holding one [`JobDefinition`] per job id.
///
/// Reads return whole records and `save` replaces a whole record in one
/// step, so a reader never sees a definition half-way through an update.
#[async_trait]
pub trait JobStore: Send + Sync {
    async fn get(&self, job_id: &str) -> Result<Option<JobDefinition>, StoreError>;

    /// All definitions ordered by job id.
    async fn list(&self) -> Result<Vec<JobDefinition>, StoreError>;

    /// Inserts or replaces the definition stored under its job id.
    async fn save(&self, definition: &JobDefinition) -> Result<(), StoreError>;

    /// Returns whether a definition was removed.
    async fn delete(&self, job_id: &str) -> Result<bool, StoreError>;
}
