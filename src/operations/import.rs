use std::str::FromStr;

use rust_decimal::Decimal;
use serde::Deserialize;

use super::dto::{check_amount, check_description};
use super::repo_types::{NewOperation, OperationKind};
use crate::error::{AppError, AppResult};

#[derive(Debug, Deserialize)]
struct CsvRow {
    amount: String,
    #[serde(rename = "type")]
    kind: OperationKind,
    #[serde(default)]
    description: Option<String>,
}

/// Parses a CSV export with header `amount,type,description`.
///
/// The whole file is rejected on the first bad row; rows are numbered from 1,
/// not counting the header.
pub fn parse_operations_csv(data: &[u8]) -> AppResult<Vec<NewOperation>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(data);

    let mut out = Vec::new();
    for (i, row) in reader.deserialize::<CsvRow>().enumerate() {
        let row_no = i + 1;
        let row = row.map_err(|e| bad_row(row_no, e))?;
        let amount = Decimal::from_str(&row.amount).map_err(|e| bad_row(row_no, e))?;
        out.push(NewOperation {
            amount: check_amount(amount).map_err(|e| bad_row(row_no, e))?,
            kind: row.kind,
            description: check_description(row.description.filter(|d| !d.is_empty()))
                .map_err(|e| bad_row(row_no, e))?,
        });
    }
    Ok(out)
}

fn bad_row(row: usize, e: impl std::fmt::Display) -> AppError {
    AppError::BadRequest(format!("row {row}: {e}"))
}
