//! In-memory [`UserStore`] for tests. Transactions are serialized by a mutex and
//! work on a copy of the table that replaces the original only on commit.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::repo_types::{NewUser, User};
use super::store::{StoreError, StoreResult, UserStore, UserTx};

#[derive(Debug, Default, Clone)]
struct Table {
    rows: BTreeMap<i64, User>,
    next_id: i64,
}

impl Table {
    fn check_unique(&self, id: Option<i64>, email: &str, username: &str) -> StoreResult<()> {
        for row in self.rows.values().filter(|r| Some(r.id) != id) {
            if row.email == email {
                return Err(StoreError::Uniqueness("users_email_key".into()));
            }
            if row.username == username {
                return Err(StoreError::Uniqueness("users_username_key".into()));
            }
        }
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct MemoryUserStore {
    table: Arc<Mutex<Table>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.table.lock().await.rows.len()
    }

    /// Whether a transaction currently holds the table.
    pub fn in_transaction(&self) -> bool {
        self.table.try_lock().is_err()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn begin(&self) -> StoreResult<Box<dyn UserTx>> {
        let guard = self.table.clone().lock_owned().await;
        let working = guard.clone();
        Ok(Box::new(MemoryTx { guard, working }))
    }
}

struct MemoryTx {
    guard: OwnedMutexGuard<Table>,
    working: Table,
}

#[async_trait]
impl UserTx for MemoryTx {
    async fn insert(&mut self, user: NewUser) -> StoreResult<User> {
        self.working.check_unique(None, &user.email, &user.username)?;
        self.working.next_id += 1;
        let now = OffsetDateTime::now_utc();
        let row = User {
            id: self.working.next_id,
            email: user.email,
            username: user.username,
            password_hash: user.password_hash,
            created_at: now,
            updated_at: now,
        };
        self.working.rows.insert(row.id, row.clone());
        Ok(row)
    }

    async fn find_by_id(&mut self, id: i64) -> StoreResult<Option<User>> {
        Ok(self.working.rows.get(&id).cloned())
    }

    async fn find_by_email(&mut self, email: &str) -> StoreResult<Option<User>> {
        Ok(self.working.rows.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_username(&mut self, username: &str) -> StoreResult<Option<User>> {
        Ok(self.working.rows.values().find(|u| u.username == username).cloned())
    }

    async fn update(&mut self, user: &User) -> StoreResult<User> {
        self.working
            .check_unique(Some(user.id), &user.email, &user.username)?;
        let row = self
            .working
            .rows
            .get_mut(&user.id)
            .ok_or_else(|| StoreError::Other(anyhow::anyhow!("user {} does not exist", user.id)))?;
        row.email = user.email.clone();
        row.username = user.username.clone();
        row.password_hash = user.password_hash.clone();
        row.updated_at = OffsetDateTime::now_utc();
        Ok(row.clone())
    }

    async fn delete(&mut self, id: i64) -> StoreResult<bool> {
        Ok(self.working.rows.remove(&id).is_some())
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        let MemoryTx { mut guard, working } = *self;
        *guard = working;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(email: &str, username: &str) -> NewUser {
        NewUser {
            email: email.into(),
            username: username.into(),
            password_hash: "h".into(),
        }
    }

    #[tokio::test]
    async fn uncommitted_writes_are_rolled_back() {
        let store = MemoryUserStore::new();
        {
            let mut tx = store.begin().await.unwrap();
            tx.insert(new_user("a@x.com", "a")).await.unwrap();
        }
        assert_eq!(store.len().await, 0);

        let mut tx = store.begin().await.unwrap();
        assert!(store.in_transaction());
        tx.insert(new_user("a@x.com", "a")).await.unwrap();
        tx.commit().await.unwrap();
        assert!(!store.in_transaction());
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn duplicate_email_or_username_is_a_uniqueness_error() {
        let store = MemoryUserStore::new();
        let mut tx = store.begin().await.unwrap();
        tx.insert(new_user("a@x.com", "a")).await.unwrap();
        assert!(matches!(
            tx.insert(new_user("a@x.com", "b")).await,
            Err(StoreError::Uniqueness(_))
        ));
        assert!(matches!(
            tx.insert(new_user("b@x.com", "a")).await,
            Err(StoreError::Uniqueness(_))
        ));
    }
}
