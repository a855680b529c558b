use std::sync::Arc;

use tracing::{info, instrument};

use super::dto::{OperationCreate, OperationUpdate};
use super::import::parse_operations_csv;
use super::repo_types::{NewOperation, Operation, OperationKind};
use super::store::OperationStore;
use crate::error::{AppError, AppResult};

/// CRUD and bulk import over one user's operations. Foreign rows look missing.
#[derive(Clone)]
pub struct OperationsService {
    store: Arc<dyn OperationStore>,
}

impl OperationsService {
    pub fn new(store: Arc<dyn OperationStore>) -> Self {
        Self { store }
    }

    pub async fn list(
        &self,
        user_id: i64,
        kind: Option<OperationKind>,
    ) -> AppResult<Vec<Operation>> {
        let mut tx = self.store.begin().await?;
        let ops = tx.list(user_id, kind).await?;
        tx.commit().await?;
        Ok(ops)
    }

    pub async fn get(&self, user_id: i64, id: i64) -> AppResult<Operation> {
        let mut tx = self.store.begin().await?;
        let op = tx.find(user_id, id).await?;
        tx.commit().await?;
        op.ok_or(AppError::NotFound)
    }

    #[instrument(skip(self, payload))]
    pub async fn create(&self, user_id: i64, payload: OperationCreate) -> AppResult<Operation> {
        let new = payload.validate()?;
        let mut tx = self.store.begin().await?;
        let op = tx.insert(user_id, &new).await?;
        tx.commit().await?;
        info!(user_id, operation_id = op.id, "operation created");
        Ok(op)
    }

    #[instrument(skip(self, payload))]
    pub async fn update(
        &self,
        user_id: i64,
        id: i64,
        payload: OperationUpdate,
    ) -> AppResult<Operation> {
        let mut tx = self.store.begin().await?;
        let current = tx
            .find_for_update(user_id, id)
            .await?
            .ok_or(AppError::NotFound)?;

        let next = payload.apply(NewOperation {
            amount: current.amount,
            kind: current.kind,
            description: current.description,
        })?;
        let op = tx
            .update(user_id, id, &next)
            .await?
            .ok_or(AppError::NotFound)?;
        tx.commit().await?;

        info!(user_id, operation_id = id, "operation updated");
        Ok(op)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, user_id: i64, id: i64) -> AppResult<()> {
        let mut tx = self.store.begin().await?;
        if !tx.delete(user_id, id).await? {
            return Err(AppError::NotFound);
        }
        tx.commit().await?;
        info!(user_id, operation_id = id, "operation deleted");
        Ok(())
    }

    /// Imports every row of the CSV or none of them.
    #[instrument(skip(self, data), fields(bytes = data.len()))]
    pub async fn import_csv(&self, user_id: i64, data: &[u8]) -> AppResult<usize> {
        let rows = parse_operations_csv(data)?;

        let mut tx = self.store.begin().await?;
        for row in &rows {
            tx.insert(user_id, row).await?;
        }
        tx.commit().await?;

        info!(user_id, imported = rows.len(), "operations imported");
        Ok(rows.len())
    }
}
