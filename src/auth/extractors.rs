use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};
use tracing::warn;

use super::jwt::JwtKeys;
use crate::error::AppError;

/// Validates a raw bearer credential as an access token.
/// Every failure is reported as [`AppError::Unauthorized`].
pub fn authorize(keys: &JwtKeys, token: &str) -> Result<i64, AppError> {
    keys.verify_access(token).map_err(|e| {
        warn!(error = %e, "access token rejected");
        AppError::Unauthorized
    })
}

/// Extracts and validates the access token, returning the user ID.
pub struct AuthUser(pub i64);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or_else(|| {
                warn!("missing Authorization header");
                AppError::Unauthorized
            })?;

        let token = bearer_token(header).ok_or_else(|| {
            warn!("invalid auth scheme");
            AppError::Unauthorized
        })?;

        let keys = JwtKeys::from_ref(state);
        authorize(&keys, token).map(AuthUser)
    }
}

/// `Bearer <token>`, scheme matched case-insensitively.
fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}
