//! In-memory [`OperationStore`] for tests, with the same copy-and-swap
//! transactions as the user store.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::repo_types::{NewOperation, Operation, OperationKind};
use super::store::{OperationStore, OperationTx};

#[derive(Debug, Default, Clone)]
struct Table {
    rows: BTreeMap<i64, Operation>,
    next_id: i64,
}

impl Table {
    fn owned(&mut self, user_id: i64, id: i64) -> Option<&mut Operation> {
        self.rows.get_mut(&id).filter(|op| op.user_id == user_id)
    }
}

#[derive(Clone, Default)]
pub struct MemoryOperationStore {
    table: Arc<Mutex<Table>>,
}

impl MemoryOperationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.table.lock().await.rows.len()
    }
}

#[async_trait]
impl OperationStore for MemoryOperationStore {
    async fn begin(&self) -> anyhow::Result<Box<dyn OperationTx>> {
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
impl OperationTx for MemoryTx {
    async fn list(
        &mut self,
        user_id: i64,
        kind: Option<OperationKind>,
    ) -> anyhow::Result<Vec<Operation>> {
        let mut rows: Vec<Operation> = self
            .working
            .rows
            .values()
            .filter(|op| op.user_id == user_id && kind.map_or(true, |k| op.kind == k))
            .cloned()
            .collect();
        rows.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(rows)
    }

    async fn find(&mut self, user_id: i64, id: i64) -> anyhow::Result<Option<Operation>> {
        Ok(self.working.owned(user_id, id).cloned())
    }

    async fn find_for_update(
        &mut self,
        user_id: i64,
        id: i64,
    ) -> anyhow::Result<Option<Operation>> {
        self.find(user_id, id).await
    }

    async fn insert(&mut self, user_id: i64, op: &NewOperation) -> anyhow::Result<Operation> {
        self.working.next_id += 1;
        let row = Operation {
            id: self.working.next_id,
            user_id,
            created_at: OffsetDateTime::now_utc(),
            amount: op.amount,
            kind: op.kind,
            description: op.description.clone(),
        };
        self.working.rows.insert(row.id, row.clone());
        Ok(row)
    }

    async fn update(
        &mut self,
        user_id: i64,
        id: i64,
        op: &NewOperation,
    ) -> anyhow::Result<Option<Operation>> {
        Ok(self.working.owned(user_id, id).map(|row| {
            row.amount = op.amount;
            row.kind = op.kind;
            row.description = op.description.clone();
            row.clone()
        }))
    }

    async fn delete(&mut self, user_id: i64, id: i64) -> anyhow::Result<bool> {
        if self.working.owned(user_id, id).is_none() {
            return Ok(false);
        }
        Ok(self.working.rows.remove(&id).is_some())
    }

    async fn commit(self: Box<Self>) -> anyhow::Result<()> {
        let MemoryTx { mut guard, working } = *self;
        *guard = working;
        Ok(())
    }
}
