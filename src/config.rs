use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::schedule::LocalSchedulePolicy;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub tracing: TracingConfig,
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub cors: CorsConfig,
    #[serde(default)]
    pub jobs: JobsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TracingConfig {
    pub log_level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub pool_size: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
}

/// Settings for validating and issuing bearer tokens.
#[derive(Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub issuer: String,
    pub audience: String,
    pub secret: String,
    /// Tolerance applied to the expiry check (default: 300 = 5 minutes)
    #[serde(default = "default_clock_skew")]
    pub clock_skew_seconds: i64,
    /// Lifetime of tokens minted by `issue-token` (default: 60)
    #[serde(default = "default_token_lifetime")]
    pub token_lifetime_minutes: i64,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("secret", &"<redacted>")
            .field("clock_skew_seconds", &self.clock_skew_seconds)
            .field("token_lifetime_minutes", &self.token_lifetime_minutes)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CorsConfig {
    /// Origins allowed to call the API. Empty disables cross-origin access.
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobsConfig {
    /// Seconds between scheduler polls (default: 30)
    #[serde(default = "default_poll_interval")]
    pub poll_interval_seconds: u64,
    /// Attempts per occurrence, including the first (default: 3)
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Delay in seconds before a failed run is retried (default: 60)
    #[serde(default = "default_retry_delay")]
    pub retry_delay_seconds: u64,
    /// Job execution timeout in seconds (default: 300)
    #[serde(default = "default_job_timeout")]
    pub job_timeout_seconds: u64,
    /// How long shutdown waits for running jobs. Unset waits indefinitely.
    #[serde(default)]
    pub shutdown_timeout_seconds: Option<u64>,
    /// Local wall-clock schedule per job id.
    #[serde(default)]
    pub schedules: HashMap<String, LocalSchedulePolicy>,
}

impl Default for JobsConfig {
    fn default() -> Self {
        Self {
            poll_interval_seconds: default_poll_interval(),
            max_retries: default_max_retries(),
            retry_delay_seconds: default_retry_delay(),
            job_timeout_seconds: default_job_timeout(),
            shutdown_timeout_seconds: None,
            schedules: HashMap::new(),
        }
    }
}

const fn default_clock_skew() -> i64 {
    300
}

const fn default_token_lifetime() -> i64 {
    60
}

const fn default_poll_interval() -> u64 {
    30
}

const fn default_max_retries() -> u32 {
    3
}

const fn default_retry_delay() -> u64 {
    60
}

const fn default_job_timeout() -> u64 {
    300 // 5 minutes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jobs_section_defaults() {
        let jobs: JobsConfig = serde_json::from_str(
            r#"{"schedules": {"cleanup": {"hour": 15, "minute": 8, "timezone": "Europe/Istanbul"}}}"#,
        )
        .unwrap();

        assert_eq!(jobs.poll_interval_seconds, 30);
        assert_eq!(jobs.max_retries, 3);
        assert_eq!(jobs.shutdown_timeout_seconds, None);
        assert_eq!(jobs.schedules["cleanup"].timezone, "Europe/Istanbul");
    }

    #[test]
    fn test_auth_debug_hides_secret() {
        let auth = AuthConfig {
            issuer: "vigil".to_string(),
            audience: "vigil-clients".to_string(),
            secret: "hunter2hunter2".to_string(),
            clock_skew_seconds: 300,
            token_lifetime_minutes: 60,
        };

        let debug = format!("{auth:?}");
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("vigil-clients"));
    }
}
