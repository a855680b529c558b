use anyhow::Context;
use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};

use super::repo_types::{NewOperation, Operation, OperationKind};
use super::store::{OperationStore, OperationTx};

const OPERATION_COLUMNS: &str = "id, user_id, created_at, amount, kind, description";

/// PostgreSQL-backed [`OperationStore`].
#[derive(Clone)]
pub struct PgOperationStore {
    db: PgPool,
}

impl PgOperationStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl OperationStore for PgOperationStore {
    async fn begin(&self) -> anyhow::Result<Box<dyn OperationTx>> {
        let tx = self.db.begin().await.context("begin tx")?;
        Ok(Box::new(PgOperationTx { tx }))
    }
}

pub struct PgOperationTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl OperationTx for PgOperationTx {
    async fn list(
        &mut self,
        user_id: i64,
        kind: Option<OperationKind>,
    ) -> anyhow::Result<Vec<Operation>> {
        let rows = sqlx::query_as::<_, Operation>(&format!(
            r#"
            SELECT {OPERATION_COLUMNS}
              FROM operations
             WHERE user_id = $1
               AND ($2::text IS NULL OR kind = $2)
             ORDER BY created_at DESC, id DESC
            "#
        ))
        .bind(user_id)
        .bind(kind.map(OperationKind::as_str))
        .fetch_all(&mut *self.tx)
        .await
        .context("list operations by user")?;
        Ok(rows)
    }

    async fn find(&mut self, user_id: i64, id: i64) -> anyhow::Result<Option<Operation>> {
        let row = sqlx::query_as::<_, Operation>(&format!(
            "SELECT {OPERATION_COLUMNS} FROM operations WHERE id = $1 AND user_id = $2"
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(&mut *self.tx)
        .await
        .context("find operation")?;
        Ok(row)
    }

    async fn find_for_update(
        &mut self,
        user_id: i64,
        id: i64,
    ) -> anyhow::Result<Option<Operation>> {
        let row = sqlx::query_as::<_, Operation>(&format!(
            "SELECT {OPERATION_COLUMNS} FROM operations WHERE id = $1 AND user_id = $2 FOR UPDATE"
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(&mut *self.tx)
        .await
        .context("find operation for update")?;
        Ok(row)
    }

    async fn insert(&mut self, user_id: i64, op: &NewOperation) -> anyhow::Result<Operation> {
        let row = sqlx::query_as::<_, Operation>(&format!(
            r#"
            INSERT INTO operations (user_id, amount, kind, description)
            VALUES ($1, $2, $3, $4)
            RETURNING {OPERATION_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(op.amount)
        .bind(op.kind.as_str())
        .bind(op.description.as_deref())
        .fetch_one(&mut *self.tx)
        .await
        .context("insert operation")?;
        Ok(row)
    }

    async fn update(
        &mut self,
        user_id: i64,
        id: i64,
        op: &NewOperation,
    ) -> anyhow::Result<Option<Operation>> {
        let row = sqlx::query_as::<_, Operation>(&format!(
            r#"
            UPDATE operations
               SET amount = $3, kind = $4, description = $5
             WHERE id = $1 AND user_id = $2
            RETURNING {OPERATION_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(user_id)
        .bind(op.amount)
        .bind(op.kind.as_str())
        .bind(op.description.as_deref())
        .fetch_optional(&mut *self.tx)
        .await
        .context("update operation")?;
        Ok(row)
    }

    async fn delete(&mut self, user_id: i64, id: i64) -> anyhow::Result<bool> {
        let res = sqlx::query("DELETE FROM operations WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&mut *self.tx)
            .await
            .context("delete operation")?;
        Ok(res.rows_affected() > 0)
    }

    async fn commit(self: Box<Self>) -> anyhow::Result<()> {
        self.tx.commit().await.context("commit tx")?;
        Ok(())
    }
}
