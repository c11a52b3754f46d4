use strum::IntoStaticStr;
use thiserror::Error;

/// Why a bearer token was rejected.
///
/// Messages describe the failed check only and never include the token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum AuthError {
    #[error("missing or malformed bearer token")]
    Malformed,
    #[error("token signature is invalid")]
    InvalidSignature,
    #[error("token issuer does not match")]
    IssuerMismatch,
    #[error("token audience does not match")]
    AudienceMismatch,
    #[error("token has expired")]
    Expired,
}

impl AuthError {
    /// Stable identifier used in error bodies and logs.
    pub fn kind(self) -> &'static str {
        self.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_is_snake_case() {
        assert_eq!(AuthError::Malformed.kind(), "malformed");
        assert_eq!(AuthError::InvalidSignature.kind(), "invalid_signature");
        assert_eq!(AuthError::AudienceMismatch.kind(), "audience_mismatch");
    }
}
