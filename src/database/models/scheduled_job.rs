//! `SeaORM` Entity for persisted recurring-job state

use crate::database::models::job_status::JobStatus;
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "scheduled_job")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub job_id: String,
    pub utc_hour: i16,
    pub utc_minute: i16,
    /// 0 = Monday .. 6 = Sunday, `None` for daily jobs
    pub day_of_week: Option<i16>,
    pub next_run_at: DateTime,
    pub last_run_at: Option<DateTime>,
    pub last_status: JobStatus,
    pub retry_count: i32,
    pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
