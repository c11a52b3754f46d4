use std::sync::Arc;

use crate::{
    boot::BootError,
    cli::JobsAction,
    config::Config,
    database::setup_database,
    jobs::{store::DatabaseStore, JobDefinition, JobRegistry},
};

pub async fn handle_jobs_command(config: &Config, action: JobsAction) -> Result<(), BootError> {
    let db = setup_database(&config.database).await?;
    let registry = JobRegistry::new(Arc::new(DatabaseStore::new(db)));

    match action {
        JobsAction::List => {
            let definitions = registry.list().await?;
            if definitions.is_empty() {
                println!("📭 No scheduled jobs stored");
                return Ok(());
            }

            println!("📅 Scheduled jobs:");
            for definition in &definitions {
                println!("{}", describe(definition));
            }
        }
        JobsAction::Unregister { job_id } => {
            if registry.unregister(&job_id).await? {
                println!("🗑️ Removed job '{job_id}'");
            } else {
                println!("❌ No stored job '{job_id}'");
            }
        }
    }

    Ok(())
}

fn describe(definition: &JobDefinition) -> String {
    let last_run = definition
        .last_run_at
        .map_or_else(|| "never".to_string(), |at| at.to_rfc3339());

    format!(
        "  {} | cron '{}' | next {} | last {} ({}) | retries {}",
        definition.job_id,
        definition.rule,
        definition.next_run_at.to_rfc3339(),
        last_run,
        definition.last_status,
        definition.retry_count
    )
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::schedule::{Occurrence, RecurrenceRule};

    #[test]
    fn test_describe_new_definition() {
        let definition = JobDefinition::new(
            "cleanup",
            Occurrence {
                rule: RecurrenceRule::daily(12, 8).unwrap(),
                at: Utc.with_ymd_and_hms(2026, 10, 18, 12, 8, 0).unwrap(),
            },
        );

        let line = describe(&definition);

        assert!(line.contains("cleanup"));
        assert!(line.contains("2026-10-18T12:08:00+00:00"));
        assert!(line.contains("last never (pending)"));
    }
}
