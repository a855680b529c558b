use std::collections::HashSet;

use axum::extract::FromRef;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use time::{Duration, OffsetDateTime};
use tracing::debug;

use super::claims::{Claims, TokenKind};
use super::dto::TokenPair;
use crate::{config::JwtConfig, state::AppState};

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("token expired")]
    Expired,
    #[error("invalid token: {0}")]
    Invalid(String),
    #[error("failed to sign token: {0}")]
    Signing(String),
}

/// Signing and verification keys plus the lifetime of each token kind.
///
/// Built once from [`JwtConfig`] at startup and never mutated afterwards.
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        state.keys.clone()
    }
}

impl JwtKeys {
    pub fn new(cfg: &JwtConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            access_ttl: Duration::minutes(cfg.access_ttl_minutes),
            refresh_ttl: Duration::minutes(cfg.refresh_ttl_minutes),
        }
    }

    pub fn lifetime(&self, kind: TokenKind) -> Duration {
        match kind {
            TokenKind::Access => self.access_ttl,
            TokenKind::Refresh => self.refresh_ttl,
        }
    }

    /// Signs `{sub, iat: now, exp: now + lifetime(kind), kind}` with HS256.
    ///
    /// `exp` is rounded up to the next whole second, so a token is never
    /// rejected before its full lifetime has elapsed.
    pub fn sign(
        &self,
        user_id: i64,
        kind: TokenKind,
        now: OffsetDateTime,
    ) -> Result<String, TokenError> {
        let exp = now
            .checked_add(self.lifetime(kind))
            .ok_or_else(|| TokenError::Signing("token expiry is out of range".into()))?;
        let claims = Claims {
            sub: user_id,
            iat: now.unix_timestamp(),
            exp: ceil_seconds(exp),
            kind,
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))?;
        debug!(user_id, kind = ?kind, "jwt signed");
        Ok(token)
    }

    /// Checks signature, structure, kind and expiry, returning the user id.
    ///
    /// Expiry is compared against `now` with no leeway; a token whose `exp`
    /// is at or before `now` is expired. The library's own clock is not used.
    pub fn verify(
        &self,
        token: &str,
        expected: TokenKind,
        now: OffsetDateTime,
    ) -> Result<i64, TokenError> {
        let data = decode::<Claims>(token, &self.decoding, &validation())
            .map_err(|e| TokenError::Invalid(e.to_string()))?;
        let claims = data.claims;

        if claims.kind != expected {
            return Err(TokenError::Invalid(format!(
                "expected {expected:?} token, got {:?}",
                claims.kind
            )));
        }
        if i128::from(claims.exp) * NANOS_PER_SECOND <= now.unix_timestamp_nanos() {
            return Err(TokenError::Expired);
        }

        debug!(user_id = claims.sub, kind = ?claims.kind, "jwt verified");
        Ok(claims.sub)
    }

    pub fn sign_access(&self, user_id: i64) -> Result<String, TokenError> {
        self.sign(user_id, TokenKind::Access, OffsetDateTime::now_utc())
    }

    pub fn sign_refresh(&self, user_id: i64) -> Result<String, TokenError> {
        self.sign(user_id, TokenKind::Refresh, OffsetDateTime::now_utc())
    }

    pub fn verify_access(&self, token: &str) -> Result<i64, TokenError> {
        self.verify(token, TokenKind::Access, OffsetDateTime::now_utc())
    }

    pub fn verify_refresh(&self, token: &str) -> Result<i64, TokenError> {
        self.verify(token, TokenKind::Refresh, OffsetDateTime::now_utc())
    }

    /// Mints one access and one refresh token sharing the same `now`.
    pub fn issue_pair(&self, user_id: i64) -> Result<TokenPair, TokenError> {
        let now = OffsetDateTime::now_utc();
        Ok(TokenPair {
            access_token: self.sign(user_id, TokenKind::Access, now)?,
            refresh_token: self.sign(user_id, TokenKind::Refresh, now)?,
        })
    }
}

const NANOS_PER_SECOND: i128 = 1_000_000_000;

fn ceil_seconds(t: OffsetDateTime) -> i64 {
    if t.nanosecond() > 0 {
        t.unix_timestamp() + 1
    } else {
        t.unix_timestamp()
    }
}

fn validation() -> Validation {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;
    validation.validate_exp = false;
    validation.validate_nbf = false;
    validation.validate_aud = false;
    validation.required_spec_claims = HashSet::from(["exp".to_string()]);
    validation
}
