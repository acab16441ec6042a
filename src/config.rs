use std::str::FromStr;
use std::time::Duration;

use crate::error::{FraudGraphError, Result};
use crate::similarity_graph::GraphParams;

pub const DEFAULT_ROW_LIMIT: usize = 5000;
pub const DEFAULT_DISTANCE_THRESHOLD: f64 = 2000.0;
pub const DEFAULT_PREVIEW_ROWS: usize = 10;

#[derive(Debug, Clone, PartialEq)]
pub struct DetectorConfig {
    pub row_limit: usize,
    pub distance_threshold: f64,
    pub max_pair_evaluations: Option<u64>,
    pub time_budget: Option<Duration>,
    pub thread_count: Option<usize>,
    pub preview_rows: usize,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            row_limit: DEFAULT_ROW_LIMIT,
            distance_threshold: DEFAULT_DISTANCE_THRESHOLD,
            max_pair_evaluations: None,
            time_budget: None,
            thread_count: None,
            preview_rows: DEFAULT_PREVIEW_ROWS,
        }
    }
}

fn parse_var<T: FromStr>(name: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| FraudGraphError::Config(format!("{name}={value} is not a valid value")))
}

impl DetectorConfig {
    // Defaults overridden by any FRAUD_GRAPH_* variables that are set.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(v) = lookup("FRAUD_GRAPH_ROW_LIMIT") {
            config.row_limit = parse_var("FRAUD_GRAPH_ROW_LIMIT", &v)?;
        }
        if let Some(v) = lookup("FRAUD_GRAPH_DISTANCE_THRESHOLD") {
            config.distance_threshold = parse_var("FRAUD_GRAPH_DISTANCE_THRESHOLD", &v)?;
        }
        if let Some(v) = lookup("FRAUD_GRAPH_MAX_PAIRS") {
            config.max_pair_evaluations = Some(parse_var("FRAUD_GRAPH_MAX_PAIRS", &v)?);
        }
        if let Some(v) = lookup("FRAUD_GRAPH_TIME_BUDGET_SECS") {
            let secs: f64 = parse_var("FRAUD_GRAPH_TIME_BUDGET_SECS", &v)?;
            config.time_budget = Some(Duration::try_from_secs_f64(secs).map_err(|e| {
                FraudGraphError::Config(format!("FRAUD_GRAPH_TIME_BUDGET_SECS={v}: {e}"))
            })?);
        }
        if let Some(v) = lookup("FRAUD_GRAPH_THREADS") {
            config.thread_count = Some(parse_var("FRAUD_GRAPH_THREADS", &v)?);
        }
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.row_limit == 0 {
            return Err(FraudGraphError::Config("row limit must be at least 1".into()));
        }
        if !self.distance_threshold.is_finite() || self.distance_threshold <= 0.0 {
            return Err(FraudGraphError::Config(format!(
                "distance threshold must be a positive finite number, got {}",
                self.distance_threshold
            )));
        }
        if self.thread_count == Some(0) {
            return Err(FraudGraphError::Config("thread count must be at least 1".into()));
        }
        Ok(())
    }

    pub fn graph_params(&self) -> GraphParams {
        GraphParams {
            distance_threshold: self.distance_threshold,
            max_pair_evaluations: self.max_pair_evaluations,
            time_budget: self.time_budget,
            thread_count: self.thread_count,
        }
    }
}
