use std::{env, process, str::FromStr as _};

use clap::Parser as _;
use config_rs::{Config as ConfigRs, ConfigError};
use sea_orm::DbErr;
use thiserror::Error;
use tracing::{debug, error, trace};

use crate::{
    app_info::AppInfo,
    auth::CredentialsError,
    cli::{Cli, Commands},
    commands::{generate_secret, issue_token, jobs, migrate, serve, version},
    config::Config,
    environment::Environment,
    jobs::{job_supervisor::SupervisorError, store::StoreError, JobHandlers},
    setup_tracing::setup_tracing_for_command,
};

const ENVIRONMENT_VARIABLE: &str = "APP_ENVIRONMENT";

/// Anything that stops the process from starting or a command from finishing.
#[derive(Debug, Error)]
pub enum BootError {
    #[error("failed to load configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("invalid auth configuration: {0}")]
    Credentials(#[from] CredentialsError),
    #[error("database error: {0}")]
    Database(#[from] DbErr),
    #[error(transparent)]
    Jobs(#[from] SupervisorError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("failed to sign token: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),
    #[error("server error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    InvalidArgument(String),
}

/// What the binary contributes: its metadata and the job handlers it provides.
pub struct BootConfig {
    pub app_info: AppInfo,
    pub job_handlers: JobHandlers,
}

impl BootConfig {
    #[must_use]
    pub const fn new(app_info: AppInfo, job_handlers: JobHandlers) -> Self {
        Self {
            app_info,
            job_handlers,
        }
    }
}

/// Parses the command line, loads configuration and runs the command.
/// Exits the process with status 1 on any error.
pub async fn boot(config: BootConfig) {
    let cli = Cli::parse();

    if matches!(cli.command, Some(Commands::Version)) {
        version::print_version_info(config.app_info);
        return;
    }

    let environment = set_environment();

    let app_config = match read_config(&environment) {
        Ok(app_config) => app_config,
        Err(e) => {
            eprintln!("❌ Failed to load config/{environment}: {e}");
            process::exit(1);
        }
    };

    setup_tracing_for_command(&cli.command, &app_config.tracing.log_level);

    debug!("Environment set to: {:?}", environment);
    trace!("Configuration loaded: {:?}", app_config);

    if let Err(e) = handle_command(environment, app_config, cli, config).await {
        error!("❌ {}", e);
        eprintln!("❌ {e}");
        process::exit(1);
    }
}

#[must_use]
pub fn set_environment() -> Environment {
    env::var(ENVIRONMENT_VARIABLE)
        .ok()
        .and_then(|s| Environment::from_str(&s).ok())
        .unwrap_or_default()
}

/// Reads `config/{environment}.yaml`, then applies `APP_`-prefixed
/// environment overrides (`APP_AUTH__SECRET` sets `auth.secret`).
pub fn read_config(environment: &Environment) -> Result<Config, ConfigError> {
    let config_file_name = format!("config/{environment}");

    trace!("Reading configuration from: {}", config_file_name);

    ConfigRs::builder()
        .add_source(config_rs::File::with_name(&config_file_name))
        .add_source(
            config_rs::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?
        .try_deserialize()
}

pub async fn handle_command(
    environment: Environment,
    config: Config,
    cli: Cli,
    boot_config: BootConfig,
) -> Result<(), BootError> {
    match cli.command {
        Some(Commands::Migrate { action }) => {
            migrate::handle_migrate_command(&config, action).await?;
        }
        Some(Commands::Jobs { action }) => {
            jobs::handle_jobs_command(&config, action).await?;
        }
        Some(Commands::GenerateJwtSecret) => {
            generate_secret::handle_generate_secret_command();
        }
        Some(Commands::IssueToken { subject, minutes }) => {
            issue_token::handle_issue_token_command(&config, &subject, minutes)?;
        }
        Some(Commands::Version) => {
            version::print_version_info(boot_config.app_info);
        }
        Some(Commands::Serve) | None => {
            serve::handle_serve_command(environment, config, boot_config.job_handlers).await?;
        }
    }

    Ok(())
}
