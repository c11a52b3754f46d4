use async_trait::async_trait;
use chrono::{Utc, Weekday};
use sea_orm::{
    sea_query::OnConflict, ActiveValue::Set, DatabaseConnection, EntityTrait, QueryOrder as _,
};

use super::{JobStore, StoreError};
use crate::{
    database::models::scheduled_job::{self, Entity as ScheduledJobEntity},
    jobs::JobDefinition,
    schedule::RecurrenceRule,
};

/// Store backed by the `scheduled_job` table.
#[derive(Clone, Debug)]
pub struct DatabaseStore {
    db: DatabaseConnection,
}

impl DatabaseStore {
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl JobStore for DatabaseStore {
    async fn get(&self, job_id: &str) -> Result<Option<JobDefinition>, StoreError> {
        ScheduledJobEntity::find_by_id(job_id.to_string())
            .one(&self.db)
            .await?
            .map(JobDefinition::try_from)
            .transpose()
    }

    async fn list(&self) -> Result<Vec<JobDefinition>, StoreError> {
        ScheduledJobEntity::find()
            .order_by_asc(scheduled_job::Column::JobId)
            .all(&self.db)
            .await?
            .into_iter()
            .map(JobDefinition::try_from)
            .collect()
    }

    async fn save(&self, definition: &JobDefinition) -> Result<(), StoreError> {
        let model = active_model(definition)?;

        // Single-statement upsert keyed on job_id keeps one row per job
        ScheduledJobEntity::insert(model)
            .on_conflict(
                OnConflict::column(scheduled_job::Column::JobId)
                    .update_columns([
                        scheduled_job::Column::UtcHour,
                        scheduled_job::Column::UtcMinute,
                        scheduled_job::Column::DayOfWeek,
                        scheduled_job::Column::NextRunAt,
                        scheduled_job::Column::LastRunAt,
                        scheduled_job::Column::LastStatus,
                        scheduled_job::Column::RetryCount,
                        scheduled_job::Column::UpdatedAt,
                    ])
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await?;

        Ok(())
    }

    async fn delete(&self, job_id: &str) -> Result<bool, StoreError> {
        let result = ScheduledJobEntity::delete_by_id(job_id.to_string())
            .exec(&self.db)
            .await?;

        Ok(result.rows_affected > 0)
    }
}

fn invalid(job_id: &str, reason: impl ToString) -> StoreError {
    StoreError::InvalidRecord {
        job_id: job_id.to_string(),
        reason: reason.to_string(),
    }
}

fn active_model(definition: &JobDefinition) -> Result<scheduled_job::ActiveModel, StoreError> {
    let job_id = definition.job_id.as_str();
    let rule = definition.rule;

    let day_of_week = rule
        .day_of_week()
        .map(|day| i16::try_from(day.num_days_from_monday()))
        .transpose()
        .map_err(|e| invalid(job_id, e))?;

    Ok(scheduled_job::ActiveModel {
        job_id: Set(definition.job_id.clone()),
        utc_hour: Set(i16::try_from(rule.hour()).map_err(|e| invalid(job_id, e))?),
        utc_minute: Set(i16::try_from(rule.minute()).map_err(|e| invalid(job_id, e))?),
        day_of_week: Set(day_of_week),
        next_run_at: Set(definition.next_run_at.naive_utc()),
        last_run_at: Set(definition.last_run_at.map(|at| at.naive_utc())),
        last_status: Set(definition.last_status),
        retry_count: Set(i32::try_from(definition.retry_count).map_err(|e| invalid(job_id, e))?),
        updated_at: Set(Utc::now().naive_utc()),
    })
}

impl TryFrom<scheduled_job::Model> for JobDefinition {
    type Error = StoreError;

    fn try_from(model: scheduled_job::Model) -> Result<Self, Self::Error> {
        let job_id = model.job_id.as_str();

        let hour = u32::try_from(model.utc_hour).map_err(|e| invalid(job_id, e))?;
        let minute = u32::try_from(model.utc_minute).map_err(|e| invalid(job_id, e))?;

        let rule = match model.day_of_week {
            None => RecurrenceRule::daily(hour, minute),
            Some(day) => {
                let day = u8::try_from(day)
                    .ok()
                    .and_then(|day| Weekday::try_from(day).ok())
                    .ok_or_else(|| invalid(job_id, format!("day of week {day} out of range")))?;
                RecurrenceRule::weekly(day, hour, minute)
            }
        }
        .map_err(|e| invalid(job_id, e))?;

        let retry_count = u32::try_from(model.retry_count).map_err(|e| invalid(job_id, e))?;

        Ok(Self {
            rule,
            next_run_at: model.next_run_at.and_utc(),
            last_run_at: model.last_run_at.map(|at| at.and_utc()),
            last_status: model.last_status,
            retry_count,
            job_id: model.job_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{DateTime, TimeZone};

    use super::*;
    use crate::{
        config::DatabaseConfig,
        database::setup_database,
        jobs::{handler_fn, job_definition::JobStatus, JobRegistry},
        schedule::Occurrence,
    };

    async fn store() -> DatabaseStore {
        let db = setup_database(&DatabaseConfig {
            url: "sqlite::memory:".to_string(),
            pool_size: 1,
        })
        .await
        .expect("Failed to set up sqlite database");

        DatabaseStore::new(db)
    }

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, day, hour, 8, 0).unwrap()
    }

    fn definition(job_id: &str, rule: RecurrenceRule, next_run_at: DateTime<Utc>) -> JobDefinition {
        JobDefinition::new(
            job_id,
            Occurrence {
                rule,
                at: next_run_at,
            },
        )
    }

    #[tokio::test]
    async fn test_round_trips_a_definition() {
        let store = store().await;
        let mut saved = definition("cleanup", RecurrenceRule::daily(12, 8).unwrap(), at(15, 12));
        saved.last_run_at = Some(at(14, 12));
        saved.last_status = JobStatus::Succeeded;
        saved.retry_count = 2;

        store.save(&saved).await.unwrap();

        assert_eq!(store.get("cleanup").await.unwrap(), Some(saved));
    }

    #[tokio::test]
    async fn test_weekly_rule_persists_day() {
        let store = store().await;
        let rule = RecurrenceRule::weekly(Weekday::Sun, 3, 0).unwrap();

        store.save(&definition("weekly", rule, at(18, 3))).await.unwrap();

        let loaded = store.get("weekly").await.unwrap().unwrap();
        assert_eq!(loaded.rule.day_of_week(), Some(Weekday::Sun));
    }

    #[tokio::test]
    async fn test_save_twice_keeps_one_row_with_latest_rule() {
        let store = store().await;
        let rule_a = RecurrenceRule::daily(12, 8).unwrap();
        let rule_b = RecurrenceRule::daily(13, 8).unwrap();

        store.save(&definition("cleanup", rule_a, at(15, 12))).await.unwrap();
        store.save(&definition("cleanup", rule_b, at(15, 13))).await.unwrap();

        let all = store.list().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].rule, rule_b);
        assert_eq!(all[0].next_run_at, at(15, 13));
    }

    #[tokio::test]
    async fn test_registry_upsert_keeps_one_row() {
        let registry = JobRegistry::new(Arc::new(store().await));
        let rule_b = RecurrenceRule::daily(13, 8).unwrap();

        registry
            .upsert("cleanup", RecurrenceRule::daily(12, 8).unwrap(), handler_fn(|| async { Ok(()) }))
            .await
            .unwrap();
        registry
            .upsert("cleanup", rule_b, handler_fn(|| async { Ok(()) }))
            .await
            .unwrap();

        let all = registry.list().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].rule, rule_b);
    }

    #[tokio::test]
    async fn test_delete() {
        let store = store().await;
        store
            .save(&definition("cleanup", RecurrenceRule::daily(12, 8).unwrap(), at(15, 12)))
            .await
            .unwrap();

        assert!(store.delete("cleanup").await.unwrap());
        assert!(!store.delete("cleanup").await.unwrap());
        assert!(store.list().await.unwrap().is_empty());
    }
}
