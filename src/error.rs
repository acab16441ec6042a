// Error kinds surfaced by every stage of the fraud graph pipeline.
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FraudGraphError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("need at least two transactions to compute a mean degree, got {count}")]
    EmptyInput { count: usize },
    #[error("pair evaluation budget exceeded: {pairs} pairs > budget of {budget}")]
    PairBudgetExceeded { pairs: u64, budget: u64 },
    #[error("similarity graph construction exceeded time budget of {0:?}")]
    TimeBudgetExceeded(Duration),
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("failed to write results: {0}")]
    Output(String),
}

impl From<csv::Error> for FraudGraphError {
    fn from(err: csv::Error) -> Self {
        FraudGraphError::InvalidInput(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, FraudGraphError>;
