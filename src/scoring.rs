use tracing::debug;

use crate::error::{FraudGraphError, Result};
use crate::features::TransactionId;
use crate::similarity_graph::DegreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoredTransaction {
    pub id: TransactionId,
    pub degree: usize,
    pub predicted_fraud: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub mean_degree: f64,
    pub scored: Vec<ScoredTransaction>,
}

impl Classification {
    pub fn predicted_flags(&self) -> Vec<bool> {
        self.scored.iter().map(|s| s.predicted_fraud).collect()
    }

    pub fn flagged_count(&self) -> usize {
        self.scored.iter().filter(|s| s.predicted_fraud).count()
    }

    // `scored` is ordered by id and ids are dense from 0.
    pub fn get(&self, id: TransactionId) -> Option<&ScoredTransaction> {
        self.scored.get(id.index()).filter(|s| s.id == id)
    }
}

// Mean over the whole population, isolated nodes included. A population of
// zero or one transaction has no meaningful mean and is rejected.
pub fn mean_degree(degrees: &DegreeMap) -> Result<f64> {
    let n = degrees.len();
    if n <= 1 {
        return Err(FraudGraphError::EmptyInput { count: n });
    }
    Ok(degrees.total() as f64 / n as f64)
}

// Flags every transaction whose degree is strictly above the mean.
pub fn classify(degrees: &DegreeMap) -> Result<Classification> {
    let mean_degree = mean_degree(degrees)?;
    let scored = degrees
        .iter()
        .map(|(id, degree)| ScoredTransaction {
            id,
            degree,
            predicted_fraud: degree as f64 > mean_degree,
        })
        .collect();
    Ok(Classification { mean_degree, scored })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OutcomeCounts {
    pub true_positives: usize,
    pub false_positives: usize,
    pub true_negatives: usize,
    pub false_negatives: usize,
}

impl OutcomeCounts {
    pub fn tally(predicted: &[bool], actual: &[bool]) -> Self {
        let mut counts = Self::default();
        for (&p, &a) in predicted.iter().zip(actual) {
            match (p, a) {
                (true, true) => counts.true_positives += 1,
                (true, false) => counts.false_positives += 1,
                (false, false) => counts.true_negatives += 1,
                (false, true) => counts.false_negatives += 1,
            }
        }
        counts
    }

    pub fn matches(&self) -> usize {
        self.true_positives + self.true_negatives
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AccuracyReport {
    pub accuracy: f64,
    pub counts: OutcomeCounts,
}

// Fraction of rows where the prediction matches the ground truth.
pub fn accuracy(predicted: &[bool], actual: &[bool]) -> Result<AccuracyReport> {
    if predicted.len() != actual.len() {
        return Err(FraudGraphError::InvalidInput(format!(
            "{} predictions but {} ground-truth labels",
            predicted.len(),
            actual.len()
        )));
    }
    if predicted.is_empty() {
        return Err(FraudGraphError::EmptyInput { count: 0 });
    }

    let counts = OutcomeCounts::tally(predicted, actual);
    debug!(?counts, "compared predictions with ground truth");

    Ok(AccuracyReport {
        accuracy: counts.matches() as f64 / predicted.len() as f64,
        counts,
    })
}
