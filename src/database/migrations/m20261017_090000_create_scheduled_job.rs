use sea_orm_migration::{
    prelude::*,
    schema::{integer, small_integer, small_integer_null, string, string_len, timestamp, timestamp_null},
};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Status is stored as text so the table works on both Postgres and SQLite
        manager
            .create_table(
                Table::create()
                    .table(ScheduledJob::Table)
                    .if_not_exists()
                    .col(string(ScheduledJob::JobId).primary_key())
                    .col(small_integer(ScheduledJob::UtcHour))
                    .col(small_integer(ScheduledJob::UtcMinute))
                    .col(small_integer_null(ScheduledJob::DayOfWeek))
                    .col(timestamp(ScheduledJob::NextRunAt))
                    .col(timestamp_null(ScheduledJob::LastRunAt))
                    .col(string_len(ScheduledJob::LastStatus, 16).default("pending"))
                    .col(integer(ScheduledJob::RetryCount).default(0))
                    .col(timestamp(ScheduledJob::UpdatedAt).default(Expr::current_timestamp()))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-scheduled_job-next_run_at")
                    .table(ScheduledJob::Table)
                    .col(ScheduledJob::NextRunAt)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ScheduledJob::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum ScheduledJob {
    Table,
    JobId,
    UtcHour,
    UtcMinute,
    DayOfWeek,
    NextRunAt,
    LastRunAt,
    LastStatus,
    RetryCount,
    UpdatedAt,
}
