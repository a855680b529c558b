use async_trait::async_trait;

use super::repo_types::{NewUser, User};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Insert or update would duplicate a unique column. Carries the constraint name.
    #[error("unique constraint violated: {0}")]
    Uniqueness(String),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Transactional user record store.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn begin(&self) -> StoreResult<Box<dyn UserTx>>;
}

/// One open transaction. Dropping it without `commit` rolls everything back.
#[async_trait]
pub trait UserTx: Send {
    async fn insert(&mut self, user: NewUser) -> StoreResult<User>;
    async fn find_by_id(&mut self, id: i64) -> StoreResult<Option<User>>;
    async fn find_by_email(&mut self, email: &str) -> StoreResult<Option<User>>;
    async fn find_by_username(&mut self, username: &str) -> StoreResult<Option<User>>;
    /// Persists email, username and password hash of `user`; returns the stored row.
    async fn update(&mut self, user: &User) -> StoreResult<User>;
    async fn delete(&mut self, id: i64) -> StoreResult<bool>;
    async fn commit(self: Box<Self>) -> StoreResult<()>;
}
