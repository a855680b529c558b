use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Income,
    Outcome,
}

impl OperationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            OperationKind::Income => "income",
            OperationKind::Outcome => "outcome",
        }
    }
}

impl FromStr for OperationKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "income" => Ok(OperationKind::Income),
            "outcome" => Ok(OperationKind::Outcome),
            other => Err(format!("unknown operation type '{other}'")),
        }
    }
}

impl TryFrom<String> for OperationKind {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// Operation record in the database.
#[derive(Debug, Clone, FromRow)]
pub struct Operation {
    pub id: i64,
    pub user_id: i64,
    pub created_at: OffsetDateTime,
    pub amount: Decimal,
    #[sqlx(try_from = "String")]
    pub kind: OperationKind,
    pub description: Option<String>,
}

/// Validated fields for a new operation.
#[derive(Debug, Clone, PartialEq)]
pub struct NewOperation {
    pub amount: Decimal,
    pub kind: OperationKind,
    pub description: Option<String>,
}
