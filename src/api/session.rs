use axum::Json;

use crate::auth::{Authenticated, TokenClaims};

/// Claims of the calling token.
pub async fn show(Authenticated(claims): Authenticated) -> Json<TokenClaims> {
    Json(claims)
}
