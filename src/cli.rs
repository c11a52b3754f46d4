use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = env!("CARGO_PKG_NAME"))]
#[command(about = env!("CARGO_PKG_DESCRIPTION"))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the web server and the job scheduler (default)
    Serve,
    /// Database migration commands
    Migrate {
        #[command(subcommand)]
        action: MigrateAction,
    },
    /// Inspect and manage scheduled jobs
    Jobs {
        #[command(subcommand)]
        action: JobsAction,
    },
    /// Generate a JWT signing secret for configuration
    GenerateJwtSecret,
    /// Sign a bearer token with the configured credentials
    IssueToken {
        /// Subject (`sub` claim) of the token
        subject: String,
        /// Lifetime in minutes (default: `auth.token_lifetime_minutes`)
        #[arg(short, long)]
        minutes: Option<i64>,
    },
    /// Show version information
    Version,
}

#[derive(Subcommand)]
pub enum JobsAction {
    /// List stored job definitions
    List,
    /// Remove a stored job definition
    Unregister {
        /// Id of the job to remove
        job_id: String,
    },
}

#[derive(Subcommand)]
pub enum MigrateAction {
    /// Run migrations up
    Up {
        /// Number of migrations to run (default: all)
        #[arg(short, long)]
        steps: Option<u32>,
    },
    /// Run migrations down
    Down {
        /// Number of migrations to rollback (default: 1)
        #[arg(short, long, default_value = "1")]
        steps: u32,
    },
    /// Show migration status
    Status,
    /// Reset database (down all, then up all)
    Reset,
    /// Reapply recent migrations (down then up)
    Reapply {
        /// Number of migrations to reapply (default: 1)
        #[arg(short, long, default_value = "1")]
        steps: u32,
    },
}
