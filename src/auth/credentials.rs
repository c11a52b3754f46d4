use std::fmt;

use chrono::TimeDelta;
use thiserror::Error;

use crate::config::AuthConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CredentialsError {
    #[error("signing key must not be empty")]
    EmptySigningKey,
    #[error("issuer must not be empty")]
    EmptyIssuer,
    #[error("audience must not be empty")]
    EmptyAudience,
    #[error("clock skew must not be negative")]
    NegativeClockSkew,
}

/// Parameters tokens are checked against. Immutable once built.
#[derive(Clone)]
pub struct TokenCredentials {
    issuer: String,
    audience: String,
    signing_key: Vec<u8>,
    clock_skew: TimeDelta,
}

impl TokenCredentials {
    pub fn new(
        issuer: impl Into<String>,
        audience: impl Into<String>,
        signing_key: impl Into<Vec<u8>>,
        clock_skew: TimeDelta,
    ) -> Result<Self, CredentialsError> {
        let credentials = Self {
            issuer: issuer.into(),
            audience: audience.into(),
            signing_key: signing_key.into(),
            clock_skew,
        };

        if credentials.signing_key.is_empty() {
            return Err(CredentialsError::EmptySigningKey);
        }
        if credentials.issuer.is_empty() {
            return Err(CredentialsError::EmptyIssuer);
        }
        if credentials.audience.is_empty() {
            return Err(CredentialsError::EmptyAudience);
        }
        if credentials.clock_skew < TimeDelta::zero() {
            return Err(CredentialsError::NegativeClockSkew);
        }

        Ok(credentials)
    }

    pub fn from_config(config: &AuthConfig) -> Result<Self, CredentialsError> {
        let clock_skew = TimeDelta::try_seconds(config.clock_skew_seconds)
            .ok_or(CredentialsError::NegativeClockSkew)?;

        Self::new(
            config.issuer.clone(),
            config.audience.clone(),
            config.secret.as_bytes(),
            clock_skew,
        )
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    pub fn audience(&self) -> &str {
        &self.audience
    }

    pub(crate) fn signing_key(&self) -> &[u8] {
        &self.signing_key
    }

    pub const fn clock_skew(&self) -> TimeDelta {
        self.clock_skew
    }
}

impl fmt::Debug for TokenCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenCredentials")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("signing_key", &"<redacted>")
            .field("clock_skew", &self.clock_skew)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_empty_signing_key() {
        let result = TokenCredentials::new("vigil", "clients", Vec::new(), TimeDelta::zero());
        assert_eq!(result.unwrap_err(), CredentialsError::EmptySigningKey);
    }

    #[test]
    fn test_rejects_empty_issuer_and_audience() {
        let no_issuer = TokenCredentials::new("", "clients", "key", TimeDelta::zero());
        let no_audience = TokenCredentials::new("vigil", "", "key", TimeDelta::zero());

        assert_eq!(no_issuer.unwrap_err(), CredentialsError::EmptyIssuer);
        assert_eq!(no_audience.unwrap_err(), CredentialsError::EmptyAudience);
    }

    #[test]
    fn test_rejects_negative_skew() {
        let result = TokenCredentials::new("vigil", "clients", "key", TimeDelta::seconds(-1));
        assert_eq!(result.unwrap_err(), CredentialsError::NegativeClockSkew);
    }

    #[test]
    fn test_debug_redacts_signing_key() {
        let credentials =
            TokenCredentials::new("vigil", "clients", "super-secret", TimeDelta::minutes(5))
                .unwrap();

        let debug = format!("{credentials:?}");
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("<redacted>"));
    }
}
