use tracing::info;
use vigil::{
    app_info::AppInfo,
    boot::{boot, BootConfig},
    jobs::{Job, JobError, JobHandlers},
};

/// Daily topic cleanup. The deletion itself lives in the topic service; this
/// job only marks the run.
struct DeleteTopicsDaily;

impl Job for DeleteTopicsDaily {
    fn name() -> &'static str {
        "delete-topics-daily"
    }

    async fn execute(&self) -> Result<(), JobError> {
        info!("🧹 Deleting expired topics");
        Ok(())
    }
}

fn boot_config() -> BootConfig {
    let job_handlers = JobHandlers::new().register(DeleteTopicsDaily);

    BootConfig::new(AppInfo::vigil(), job_handlers)
}

#[tokio::main]
async fn main() {
    boot(boot_config()).await;
}
