use async_trait::async_trait;

use super::repo_types::{NewOperation, Operation, OperationKind};

/// Transactional operation store. Every call is scoped to one owner; rows of
/// other users are never returned or touched.
#[async_trait]
pub trait OperationStore: Send + Sync {
    async fn begin(&self) -> anyhow::Result<Box<dyn OperationTx>>;
}

/// One open transaction. Dropping it without `commit` rolls everything back.
#[async_trait]
pub trait OperationTx: Send {
    /// Newest first, optionally of a single kind.
    async fn list(
        &mut self,
        user_id: i64,
        kind: Option<OperationKind>,
    ) -> anyhow::Result<Vec<Operation>>;
    async fn find(&mut self, user_id: i64, id: i64) -> anyhow::Result<Option<Operation>>;
    /// Like `find`, but the row stays locked until the transaction ends.
    async fn find_for_update(
        &mut self,
        user_id: i64,
        id: i64,
    ) -> anyhow::Result<Option<Operation>>;
    async fn insert(&mut self, user_id: i64, op: &NewOperation) -> anyhow::Result<Operation>;
    async fn update(
        &mut self,
        user_id: i64,
        id: i64,
        op: &NewOperation,
    ) -> anyhow::Result<Option<Operation>>;
    async fn delete(&mut self, user_id: i64, id: i64) -> anyhow::Result<bool>;
    async fn commit(self: Box<Self>) -> anyhow::Result<()>;
}
