use std::{fmt, sync::Arc};

use chrono::{DateTime, TimeDelta, Utc};
use jsonwebtoken::{
    decode, decode_header, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header,
    Validation,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{AuthError, TokenCredentials};

const ALGORITHM: Algorithm = Algorithm::HS256;

/// `aud` may be a single string or an array of strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Audience {
    One(String),
    Many(Vec<String>),
}

impl Audience {
    pub fn contains(&self, audience: &str) -> bool {
        match self {
            Self::One(value) => value == audience,
            Self::Many(values) => values.iter().any(|value| value == audience),
        }
    }
}

/// Claims of a token that passed every check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenClaims {
    pub sub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<Audience>,
    /// Expiry as unix seconds.
    pub exp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
    /// Every other claim in the token.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

struct Inner {
    credentials: TokenCredentials,
    decoding_key: DecodingKey,
    encoding_key: EncodingKey,
    validation: Validation,
}

/// Verifies bearer tokens against one set of credentials.
///
/// Checks run in a fixed order and stop at the first failure: structure,
/// signature, issuer, audience, expiry. Cheap to clone.
#[derive(Clone)]
pub struct TokenValidator {
    inner: Arc<Inner>,
}

impl TokenValidator {
    pub fn new(credentials: TokenCredentials) -> Self {
        let mut validation = Validation::new(ALGORITHM);
        // Only the signature is checked by the library; claims are checked below in order
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();
        validation.leeway = 0;

        Self {
            inner: Arc::new(Inner {
                decoding_key: DecodingKey::from_secret(credentials.signing_key()),
                encoding_key: EncodingKey::from_secret(credentials.signing_key()),
                credentials,
                validation,
            }),
        }
    }

    pub fn credentials(&self) -> &TokenCredentials {
        &self.inner.credentials
    }

    pub fn validate(&self, token: &str) -> Result<TokenClaims, AuthError> {
        self.validate_at(token, Utc::now())
    }

    pub fn validate_at(&self, token: &str, now: DateTime<Utc>) -> Result<TokenClaims, AuthError> {
        let credentials = &self.inner.credentials;

        if token.split('.').count() != 3 {
            return Err(AuthError::Malformed);
        }
        decode_header(token).map_err(|_| AuthError::Malformed)?;

        let claims = decode::<TokenClaims>(token, &self.inner.decoding_key, &self.inner.validation)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature
                | ErrorKind::InvalidAlgorithm
                | ErrorKind::InvalidAlgorithmName
                | ErrorKind::InvalidKeyFormat => AuthError::InvalidSignature,
                _ => AuthError::Malformed,
            })?
            .claims;

        if claims.iss.as_deref() != Some(credentials.issuer()) {
            return Err(AuthError::IssuerMismatch);
        }

        if !claims
            .aud
            .as_ref()
            .is_some_and(|aud| aud.contains(credentials.audience()))
        {
            return Err(AuthError::AudienceMismatch);
        }

        let earliest_valid_expiry = (now - credentials.clock_skew()).timestamp();
        if claims.exp < earliest_valid_expiry {
            return Err(AuthError::Expired);
        }

        Ok(claims)
    }

    /// Signs a token for `subject` that expires after `lifetime`.
    pub fn issue(
        &self,
        subject: &str,
        lifetime: TimeDelta,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        self.issue_at(subject, lifetime, Utc::now())
    }

    pub fn issue_at(
        &self,
        subject: &str,
        lifetime: TimeDelta,
        now: DateTime<Utc>,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        let credentials = &self.inner.credentials;
        let claims = TokenClaims {
            sub: subject.to_string(),
            iss: Some(credentials.issuer().to_string()),
            aud: Some(Audience::One(credentials.audience().to_string())),
            exp: (now + lifetime).timestamp(),
            iat: Some(now.timestamp()),
            extra: Map::new(),
        };

        encode(&Header::new(ALGORITHM), &claims, &self.inner.encoding_key)
    }
}

impl fmt::Debug for TokenValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenValidator")
            .field("credentials", &self.inner.credentials)
            .finish_non_exhaustive()
    }
}
