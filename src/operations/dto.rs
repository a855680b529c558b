use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use time::OffsetDateTime;

use super::repo_types::{NewOperation, Operation, OperationKind};
use crate::error::{AppError, AppResult};

pub const MAX_DESCRIPTION_LEN: usize = 256;

/// NUMERIC(10, 2): at most eight integer digits.
fn amount_limit() -> Decimal {
    Decimal::new(100_000_000, 0)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationView {
    pub id: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub amount: Decimal,
    #[serde(rename = "type")]
    pub kind: OperationKind,
    pub description: Option<String>,
}

impl From<Operation> for OperationView {
    fn from(op: Operation) -> Self {
        Self {
            id: op.id,
            created_at: op.created_at,
            amount: op.amount,
            kind: op.kind,
            description: op.description,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct OperationCreate {
    pub amount: Decimal,
    #[serde(rename = "type")]
    pub kind: OperationKind,
    #[serde(default)]
    pub description: Option<String>,
}

/// Partial update. `description: null` clears it; an absent field is left alone.
#[derive(Debug, Default, Deserialize)]
pub struct OperationUpdate {
    pub amount: Option<Decimal>,
    #[serde(rename = "type")]
    pub kind: Option<OperationKind>,
    #[serde(default, deserialize_with = "present")]
    pub description: Option<Option<String>>,
}

#[derive(Debug, Deserialize)]
pub struct OperationFilter {
    #[serde(rename = "type")]
    pub kind: Option<OperationKind>,
}

#[derive(Debug, Serialize)]
pub struct ImportSummary {
    pub imported: usize,
}

fn present<'de, D>(de: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(de).map(Some)
}

pub(crate) fn check_amount(amount: Decimal) -> AppResult<Decimal> {
    let rounded = amount.round_dp(2);
    if rounded.abs() >= amount_limit() {
        return Err(AppError::BadRequest("amount is out of range".into()));
    }
    Ok(rounded)
}

pub(crate) fn check_description(description: Option<String>) -> AppResult<Option<String>> {
    match description {
        Some(d) if d.chars().count() > MAX_DESCRIPTION_LEN => Err(AppError::BadRequest(format!(
            "description must be at most {MAX_DESCRIPTION_LEN} characters"
        ))),
        other => Ok(other),
    }
}

impl OperationCreate {
    pub fn validate(self) -> AppResult<NewOperation> {
        Ok(NewOperation {
            amount: check_amount(self.amount)?,
            kind: self.kind,
            description: check_description(self.description)?,
        })
    }
}

impl OperationUpdate {
    /// Applies the provided fields to `current`.
    pub fn apply(self, current: NewOperation) -> AppResult<NewOperation> {
        Ok(NewOperation {
            amount: match self.amount {
                Some(a) => check_amount(a)?,
                None => current.amount,
            },
            kind: self.kind.unwrap_or(current.kind),
            description: match self.description {
                Some(d) => check_description(d)?,
                None => current.description,
            },
        })
    }
}
