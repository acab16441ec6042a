// Runs one batch through normalization, graph construction, degree scoring
// and, when labels are available, accuracy reporting.
use tracing::{info, warn};

use crate::config::DetectorConfig;
use crate::csv_reader::TransactionBatch;
use crate::error::{FraudGraphError, Result};
use crate::features::FeatureMatrix;
use crate::scoring::{accuracy, classify, AccuracyReport, Classification};
use crate::similarity_graph::SimilarityGraph;

#[derive(Debug, Clone)]
pub struct FraudAnalysis {
    pub graph: SimilarityGraph,
    pub classification: Classification,
    pub accuracy: Option<AccuracyReport>,
}

pub fn analyze_transactions(batch: &TransactionBatch, config: &DetectorConfig) -> Result<FraudAnalysis> {
    config.validate()?;
    let n = batch.transactions.len();
    if n <= 1 {
        return Err(FraudGraphError::EmptyInput { count: n });
    }

    let features = FeatureMatrix::from_transactions(&batch.transactions);
    let graph = SimilarityGraph::build(&features, &config.graph_params())?;
    let degrees = graph.degrees();
    let classification = classify(&degrees)?;
    info!(
        mean_degree = classification.mean_degree,
        flagged = classification.flagged_count(),
        "classified transactions by degree"
    );

    let accuracy_report = match batch.ground_truth() {
        Some(actual) => Some(accuracy(&classification.predicted_flags(), &actual)?),
        None => {
            warn!("no isFraud column in input; skipping accuracy");
            None
        }
    };

    Ok(FraudAnalysis {
        graph,
        classification,
        accuracy: accuracy_report,
    })
}
