use std::sync::Arc;

use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::{
    dto::TokenPair,
    jwt::JwtKeys,
    password::{CredentialHasher, PasswordError},
};
use crate::error::{AppError, AppResult};
use crate::users::{
    repo_types::NewUser,
    store::{StoreError, UserStore},
};

/// Registration, login and token refresh.
///
/// Every operation runs inside a single store transaction; the token pair is
/// minted before commit so a failure anywhere leaves no user row behind.
#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn UserStore>,
    hasher: Arc<dyn CredentialHasher>,
    keys: JwtKeys,
    /// Verified against when the email is unknown, so both login failures cost one hash.
    dummy_hash: Arc<str>,
}

impl AuthService {
    pub fn new(
        store: Arc<dyn UserStore>,
        hasher: Arc<dyn CredentialHasher>,
        keys: JwtKeys,
    ) -> Result<Self, PasswordError> {
        let dummy_hash = hasher.hash(&Uuid::new_v4().to_string())?.into();
        Ok(Self {
            store,
            hasher,
            keys,
            dummy_hash,
        })
    }

    #[instrument(skip(self, password))]
    pub async fn register(&self, email: &str, password: &str) -> AppResult<TokenPair> {
        let password_hash = self.hasher.hash(password)?;
        // Real usernames are chosen later through the profile update.
        let username = Uuid::new_v4().to_string();

        let mut tx = self.store.begin().await?;
        let user = match tx
            .insert(NewUser {
                email: email.to_string(),
                username,
                password_hash,
            })
            .await
        {
            Ok(user) => user,
            Err(StoreError::Uniqueness(constraint)) => {
                warn!(%constraint, "registration conflict");
                return Err(AppError::InvalidCredentials);
            }
            Err(e) => return Err(e.into()),
        };

        let tokens = self.keys.issue_pair(user.id)?;
        tx.commit().await?;

        info!(user_id = user.id, "user registered");
        Ok(tokens)
    }

    #[instrument(skip(self, password))]
    pub async fn authenticate(&self, email: &str, password: &str) -> AppResult<TokenPair> {
        let mut tx = self.store.begin().await?;
        let user = tx.find_by_email(email).await?;
        tx.commit().await?;

        let user = match user {
            Some(user) if self.hasher.verify(password, &user.password_hash) => user,
            Some(user) => {
                warn!(user_id = user.id, "login invalid password");
                return Err(AppError::InvalidCredentials);
            }
            None => {
                let _ = self.hasher.verify(password, &self.dummy_hash);
                warn!("login unknown email");
                return Err(AppError::InvalidCredentials);
            }
        };

        let tokens = self.keys.issue_pair(user.id)?;
        info!(user_id = user.id, "user logged in");
        Ok(tokens)
    }

    /// Exchanges a valid refresh token for a new pair. The old refresh token
    /// is not revoked and stays usable until it expires.
    #[instrument(skip_all)]
    pub async fn refresh(&self, refresh_token: &str) -> AppResult<TokenPair> {
        let user_id = self.keys.verify_refresh(refresh_token)?;

        let mut tx = self.store.begin().await?;
        let user = tx.find_by_id(user_id).await?;
        tx.commit().await?;

        let Some(user) = user else {
            warn!(user_id, "refresh for missing user");
            return Err(AppError::Unauthorized);
        };

        let tokens = self.keys.issue_pair(user.id)?;
        info!(user_id = user.id, "tokens refreshed");
        Ok(tokens)
    }
}
