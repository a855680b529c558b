use std::sync::Arc;

use tracing::{info, instrument, warn};

use super::{
    dto::UserUpdate,
    repo_types::User,
    store::{StoreError, UserStore, UserTx},
    validation::{is_valid_email, is_valid_username, normalize_email},
};
use crate::error::{AppError, AppResult};

#[derive(Clone)]
pub struct UsersService {
    store: Arc<dyn UserStore>,
}

impl UsersService {
    pub fn new(store: Arc<dyn UserStore>) -> Self {
        Self { store }
    }

    pub async fn get_by_id(&self, user_id: i64) -> AppResult<User> {
        let mut tx = self.store.begin().await?;
        let user = tx.find_by_id(user_id).await?;
        tx.commit().await?;
        user.ok_or(AppError::NotFound)
    }

    pub async fn get_by_username(&self, username: &str) -> AppResult<User> {
        let mut tx = self.store.begin().await?;
        let user = tx.find_by_username(username).await?;
        tx.commit().await?;
        user.ok_or(AppError::NotFound)
    }

    /// Applies email and username changes in one transaction, each checked
    /// for uniqueness on its own so the error names the offending field.
    #[instrument(skip(self))]
    pub async fn update(&self, user_id: i64, patch: UserUpdate) -> AppResult<User> {
        let email = patch.email.as_deref().map(normalize_email);
        if let Some(email) = &email {
            if !is_valid_email(email) {
                return Err(AppError::BadRequest("Invalid email".into()));
            }
        }
        if let Some(username) = &patch.username {
            if !is_valid_username(username) {
                return Err(AppError::BadRequest(
                    "Username must be 4-64 characters of letters, digits, '_', '.' or '-'".into(),
                ));
            }
        }

        let mut tx = self.store.begin().await?;
        let mut user = tx.find_by_id(user_id).await?.ok_or(AppError::NotFound)?;

        if let Some(email) = email {
            user.email = email;
            user = save(&mut tx, &user, "Email is already in use").await?;
        }
        if let Some(username) = patch.username {
            user.username = username;
            user = save(&mut tx, &user, "Username is already in use").await?;
        }

        tx.commit().await?;
        info!(user_id, "user updated");
        Ok(user)
    }
}

async fn save(tx: &mut Box<dyn UserTx>, user: &User, conflict: &str) -> AppResult<User> {
    match tx.update(user).await {
        Ok(saved) => Ok(saved),
        Err(StoreError::Uniqueness(constraint)) => {
            warn!(user_id = user.id, %constraint, "profile update conflict");
            Err(AppError::BadRequest(conflict.to_string()))
        }
        Err(e) => Err(e.into()),
    }
}
