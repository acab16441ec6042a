use std::collections::HashMap;

use ndarray::{Array2, ArrayView1};
use tracing::debug;

use crate::csv_reader::Transaction;

pub const FEATURE_DIMENSIONS: usize = 8;

/// Stable identity of a transaction within one run: its 0-based position in
/// the ingested batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct TransactionId(pub usize);

impl TransactionId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Dense integer codes for a categorical column, assigned in order of first
/// appearance. Codes are only meaningful inside the batch that built them.
#[derive(Debug, Default)]
pub struct CategoryEncoder {
    codes: HashMap<String, usize>,
}

impl CategoryEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn encode(&mut self, value: &str) -> usize {
        if let Some(&code) = self.codes.get(value) {
            return code;
        }
        let code = self.codes.len();
        self.codes.insert(value.to_string(), code);
        code
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}

/// One row per transaction. Columns: amount, step, nameOrig code, nameDest
/// code, oldbalanceOrg, newbalanceOrig, oldbalanceDest, newbalanceDest.
#[derive(Debug, Clone)]
pub struct FeatureMatrix {
    ids: Vec<TransactionId>,
    features: Array2<f64>,
}

impl FeatureMatrix {
    pub fn from_transactions(transactions: &[Transaction]) -> Self {
        let n_samples = transactions.len();
        let mut orig_encoder = CategoryEncoder::new();
        let mut dest_encoder = CategoryEncoder::new();

        let mut features = Array2::zeros((n_samples, FEATURE_DIMENSIONS));
        let mut ids = Vec::with_capacity(n_samples);
        for (i, tx) in transactions.iter().enumerate() {
            let vector = [
                tx.amount,
                tx.step as f64,
                orig_encoder.encode(&tx.name_orig) as f64,
                dest_encoder.encode(&tx.name_dest) as f64,
                tx.old_balance_orig,
                tx.new_balance_orig,
                tx.old_balance_dest,
                tx.new_balance_dest,
            ];
            for (j, &value) in vector.iter().enumerate() {
                features[[i, j]] = value;
            }
            ids.push(TransactionId(i));
        }

        debug!(
            transactions = n_samples,
            distinct_origins = orig_encoder.len(),
            distinct_destinations = dest_encoder.len(),
            "normalized feature vectors"
        );

        Self { ids, features }
    }

    // Builds a matrix directly from already-numeric vectors, ids by position.
    #[cfg(test)]
    pub fn from_vectors(vectors: &[[f64; FEATURE_DIMENSIONS]]) -> Self {
        let mut features = Array2::zeros((vectors.len(), FEATURE_DIMENSIONS));
        for (i, vector) in vectors.iter().enumerate() {
            for (j, &value) in vector.iter().enumerate() {
                features[[i, j]] = value;
            }
        }
        Self {
            ids: (0..vectors.len()).map(TransactionId).collect(),
            features,
        }
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn ids(&self) -> &[TransactionId] {
        &self.ids
    }

    pub fn row(&self, id: TransactionId) -> ArrayView1<'_, f64> {
        self.features.row(id.index())
    }
}
