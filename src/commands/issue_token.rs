use chrono::TimeDelta;

use crate::{
    auth::{TokenCredentials, TokenValidator},
    boot::BootError,
    config::Config,
};

/// Prints a bearer token for `subject` signed with the configured credentials.
pub fn handle_issue_token_command(
    config: &Config,
    subject: &str,
    minutes: Option<i64>,
) -> Result<(), BootError> {
    let validator = TokenValidator::new(TokenCredentials::from_config(&config.auth)?);
    let lifetime = token_lifetime(minutes.unwrap_or(config.auth.token_lifetime_minutes))?;

    let token = validator.issue(subject, lifetime)?;

    println!("{token}");
    Ok(())
}

fn token_lifetime(minutes: i64) -> Result<TimeDelta, BootError> {
    TimeDelta::try_minutes(minutes)
        .filter(|lifetime| *lifetime > TimeDelta::zero() && *lifetime <= TimeDelta::days(3650))
        .ok_or_else(|| BootError::InvalidArgument(format!("invalid token lifetime: {minutes} minutes")))
}
