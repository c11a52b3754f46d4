use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Outcome of the most recent regular run of a recurring job.
///
/// A job starts out `Pending` and only changes status once a firing has
/// finished: `Succeeded` after a successful run, `Failed` once the retry
/// budget for an occurrence is spent. Intermediate retries leave the status
/// untouched and are visible through the retry count instead.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    EnumString,
    Display,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum JobStatus {
    /// Registered but not run yet.
    #[sea_orm(string_value = "pending")]
    #[default]
    Pending,

    #[sea_orm(string_value = "succeeded")]
    Succeeded,

    /// The last occurrence exhausted its retries.
    #[sea_orm(string_value = "failed")]
    Failed,
}
