use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};

use super::{AuthError, TokenClaims, TokenValidator};
use crate::api::ApiError;

/// Extracts the token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or(AuthError::Malformed)?;

    let (scheme, token) = value.split_once(' ').ok_or(AuthError::Malformed)?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AuthError::Malformed);
    }

    let token = token.trim();
    if token.is_empty() {
        return Err(AuthError::Malformed);
    }
    Ok(token)
}

pub fn authenticate(headers: &HeaderMap, validator: &TokenValidator) -> Result<TokenClaims, AuthError> {
    validator.validate(bearer_token(headers)?)
}

/// Claims of the authenticated caller.
///
/// Use this in handlers that require authentication. Rejects with 401 when
/// the token is missing or fails validation.
///
/// ```rust,ignore
/// pub async fn show(Authenticated(claims): Authenticated) -> Json<TokenClaims> {
///     Json(claims)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Authenticated(pub TokenClaims);

impl<S> FromRequestParts<S> for Authenticated
where
    S: Send + Sync,
    TokenValidator: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let validator = TokenValidator::from_ref(state);

        authenticate(&parts.headers, &validator)
            .map(Self)
            .map_err(ApiError::Unauthorized)
    }
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    fn headers(authorization: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(authorization).unwrap());
        headers
    }

    #[test]
    fn test_extracts_bearer_token() {
        assert_eq!(bearer_token(&headers("Bearer abc.def.ghi")), Ok("abc.def.ghi"));
        assert_eq!(bearer_token(&headers("bearer abc.def.ghi")), Ok("abc.def.ghi"));
    }

    #[test]
    fn test_missing_or_other_scheme_is_malformed() {
        assert_eq!(bearer_token(&HeaderMap::new()), Err(AuthError::Malformed));
        assert_eq!(bearer_token(&headers("Basic dXNlcjpwYXNz")), Err(AuthError::Malformed));
        assert_eq!(bearer_token(&headers("Bearer")), Err(AuthError::Malformed));
        assert_eq!(bearer_token(&headers("Bearer   ")), Err(AuthError::Malformed));
    }
}
