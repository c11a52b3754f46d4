use axum::extract::FromRef;

use crate::{
    auth::{CredentialsError, TokenCredentials, TokenValidator},
    config::Config,
    environment::Environment,
    jobs::JobRegistry,
};

/// State shared by every request handler. Read-only apart from the registry,
/// whose store serialises its own writes.
#[derive(Clone, Debug)]
pub struct App {
    pub config: Config,
    pub environment: Environment,
    pub validator: TokenValidator,
    pub jobs: JobRegistry,
}

impl App {
    pub fn new(
        config: Config,
        environment: Environment,
        jobs: JobRegistry,
    ) -> Result<Self, CredentialsError> {
        let validator = TokenValidator::new(TokenCredentials::from_config(&config.auth)?);

        Ok(Self {
            config,
            environment,
            validator,
            jobs,
        })
    }
}

impl FromRef<App> for TokenValidator {
    fn from_ref(app: &App) -> Self {
        app.validator.clone()
    }
}

impl FromRef<App> for JobRegistry {
    fn from_ref(app: &App) -> Self {
        app.jobs.clone()
    }
}
