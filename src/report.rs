use std::path::Path;

use serde::Serialize;
use tracing::info;

use crate::csv_reader::TransactionBatch;
use crate::error::{FraudGraphError, Result};
use crate::features::TransactionId;
use crate::scoring::Classification;

// One output line: the input fields plus the graph-derived columns.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultRow {
    pub id: usize,
    pub step: i64,
    pub amount: f64,
    #[serde(rename = "nameOrig")]
    pub name_orig: String,
    #[serde(rename = "nameDest")]
    pub name_dest: String,
    #[serde(rename = "oldbalanceOrg")]
    pub old_balance_orig: f64,
    #[serde(rename = "newbalanceOrig")]
    pub new_balance_orig: f64,
    #[serde(rename = "oldbalanceDest")]
    pub old_balance_dest: f64,
    #[serde(rename = "newbalanceDest")]
    pub new_balance_dest: f64,
    #[serde(rename = "isFraud")]
    pub is_fraud: Option<bool>,
    pub degree: usize,
    pub predicted_fraud: bool,
}

pub fn build_rows(batch: &TransactionBatch, classification: &Classification) -> Vec<ResultRow> {
    batch
        .transactions
        .iter()
        .enumerate()
        .map(|(i, tx)| {
            let id = TransactionId(i);
            let (degree, predicted_fraud) = classification
                .get(id)
                .map_or((0, false), |s| (s.degree, s.predicted_fraud));
            ResultRow {
                id: id.index(),
                step: tx.step,
                amount: tx.amount,
                name_orig: tx.name_orig.clone(),
                name_dest: tx.name_dest.clone(),
                old_balance_orig: tx.old_balance_orig,
                new_balance_orig: tx.new_balance_orig,
                old_balance_dest: tx.old_balance_dest,
                new_balance_dest: tx.new_balance_dest,
                is_fraud: tx.is_fraud,
                degree,
                predicted_fraud,
            }
        })
        .collect()
}

pub fn write_results(file_path: &Path, rows: &[ResultRow]) -> Result<()> {
    let output_err = |e: csv::Error| FraudGraphError::Output(format!("{}: {e}", file_path.display()));
    let mut wtr = csv::Writer::from_path(file_path).map_err(output_err)?;
    for row in rows {
        wtr.serialize(row).map_err(output_err)?;
    }
    wtr.flush()
        .map_err(|e| FraudGraphError::Output(format!("{}: {e}", file_path.display())))?;
    info!(rows = rows.len(), path = %file_path.display(), "exported results");
    Ok(())
}
