use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::Deserialize;
use tracing::{debug, info};

use crate::error::{FraudGraphError, Result};

pub const REQUIRED_COLUMNS: [&str; 8] = [
    "step",
    "amount",
    "nameOrig",
    "nameDest",
    "oldbalanceOrg",
    "newbalanceOrig",
    "oldbalanceDest",
    "newbalanceDest",
];
pub const GROUND_TRUTH_COLUMN: &str = "isFraud";

// Row as it appears in the file. Numeric cells are parsed as floats first so
// that `step` can be truncated and non-finite values reported per row.
#[derive(Debug, Deserialize)]
struct RawTransaction {
    step: f64,
    amount: f64,
    #[serde(rename = "nameOrig")]
    name_orig: String,
    #[serde(rename = "nameDest")]
    name_dest: String,
    #[serde(rename = "oldbalanceOrg")]
    old_balance_orig: f64,
    #[serde(rename = "newbalanceOrig")]
    new_balance_orig: f64,
    #[serde(rename = "oldbalanceDest")]
    old_balance_dest: f64,
    #[serde(rename = "newbalanceDest")]
    new_balance_dest: f64,
    #[serde(rename = "isFraud", default)]
    is_fraud: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub step: i64,
    pub amount: f64,
    pub name_orig: String,
    pub name_dest: String,
    pub old_balance_orig: f64,
    pub new_balance_orig: f64,
    pub old_balance_dest: f64,
    pub new_balance_dest: f64,
    pub is_fraud: Option<bool>,
}

// Everything ingested from one input source. `has_ground_truth` is true only
// when the header carried an `isFraud` column.
#[derive(Debug, Clone)]
pub struct TransactionBatch {
    pub transactions: Vec<Transaction>,
    pub has_ground_truth: bool,
}

impl TransactionBatch {
    pub fn ground_truth(&self) -> Option<Vec<bool>> {
        if !self.has_ground_truth {
            return None;
        }
        self.transactions.iter().map(|tx| tx.is_fraud).collect()
    }
}

fn parse_fraud_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" => Some(true),
        "0" | "false" => Some(false),
        _ => None,
    }
}

fn finite(value: f64, column: &str, row: usize) -> Result<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(FraudGraphError::InvalidInput(format!(
            "row {row}: column '{column}' is not a finite number"
        )))
    }
}

impl RawTransaction {
    fn into_transaction(self, row: usize, has_ground_truth: bool) -> Result<Transaction> {
        let is_fraud = if has_ground_truth {
            let cell = self.is_fraud.unwrap_or_default();
            match parse_fraud_flag(&cell) {
                Some(flag) => Some(flag),
                None => {
                    return Err(FraudGraphError::InvalidInput(format!(
                        "row {row}: column '{GROUND_TRUTH_COLUMN}' must be 0/1 or true/false, got '{cell}'"
                    )))
                }
            }
        } else {
            None
        };

        Ok(Transaction {
            // truncates toward zero, like an integer cast of the time unit
            step: finite(self.step, "step", row)?.trunc() as i64,
            amount: finite(self.amount, "amount", row)?,
            name_orig: self.name_orig,
            name_dest: self.name_dest,
            old_balance_orig: finite(self.old_balance_orig, "oldbalanceOrg", row)?,
            new_balance_orig: finite(self.new_balance_orig, "newbalanceOrig", row)?,
            old_balance_dest: finite(self.old_balance_dest, "oldbalanceDest", row)?,
            new_balance_dest: finite(self.new_balance_dest, "newbalanceDest", row)?,
            is_fraud,
        })
    }
}

pub fn read_transactions_from_reader<R: Read>(reader: R, row_limit: usize) -> Result<TransactionBatch> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    // Validate the header before touching any data row.
    let headers = rdr.headers()?.clone();
    let missing: Vec<&str> = REQUIRED_COLUMNS
        .iter()
        .copied()
        .filter(|column| !headers.iter().any(|h| h == *column))
        .collect();
    if !missing.is_empty() {
        return Err(FraudGraphError::InvalidInput(format!(
            "missing required column(s): {}",
            missing.join(", ")
        )));
    }
    let has_ground_truth = headers.iter().any(|h| h == GROUND_TRUTH_COLUMN);
    debug!(columns = headers.len(), has_ground_truth, "validated input header");

    let mut transactions = Vec::new();
    for (index, result) in rdr.deserialize::<RawTransaction>().take(row_limit).enumerate() {
        let row = index + 1;
        let raw = result.map_err(|e| FraudGraphError::InvalidInput(format!("row {row}: {e}")))?;
        transactions.push(raw.into_transaction(row, has_ground_truth)?);
    }

    info!(rows = transactions.len(), row_limit, "ingested transactions");
    Ok(TransactionBatch {
        transactions,
        has_ground_truth,
    })
}

pub fn read_transactions(file_path: &Path, row_limit: usize) -> Result<TransactionBatch> {
    let file = File::open(file_path).map_err(|e| {
        FraudGraphError::InvalidInput(format!("cannot read {}: {e}", file_path.display()))
    })?;
    read_transactions_from_reader(file, row_limit)
}
