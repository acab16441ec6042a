// Main module for graph-based fraud detection. Loads transactions, connects
// similar ones in an L1 similarity graph and flags highly connected transactions.
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use config::DetectorConfig;
use csv_reader::read_transactions;
use detector::{analyze_transactions, FraudAnalysis};
use report::{build_rows, write_results, ResultRow};

//imports other modules in fraud_graph
mod config;
mod csv_reader;
mod detector;
mod error;
mod features;
mod report;
mod scoring;
mod similarity_graph;

const CSV_FILE_PATH: &str = "Fraud.csv";

/// Flag likely-fraudulent transactions by their degree in a similarity graph.
#[derive(Parser, Debug)]
#[command(name = "fraud_graph")]
#[command(version, about = "Degree-based fraud flags from a transaction similarity graph.")]
struct Cli {
    /// Transaction CSV with a header row.
    #[arg(default_value = CSV_FILE_PATH)]
    input: PathBuf,

    /// Maximum number of rows to read (default: 5000).
    #[arg(long)]
    row_limit: Option<usize>,

    /// L1 distance below which two transactions are connected (default: 2000).
    #[arg(long)]
    threshold: Option<f64>,

    /// Refuse to run if more than this many pairs would be evaluated.
    #[arg(long)]
    max_pairs: Option<u64>,

    /// Abort graph construction after this many seconds.
    #[arg(long)]
    time_budget_secs: Option<f64>,

    /// Worker threads for pair evaluation (default: all cores).
    #[arg(long)]
    threads: Option<usize>,

    /// Rows of the result table to print (default: 10).
    #[arg(long)]
    preview_rows: Option<usize>,

    /// Write the full result table to this CSV file.
    #[arg(short, long)]
    output: Option<PathBuf>,
}

impl Cli {
    // Command-line flags win over FRAUD_GRAPH_* environment values.
    fn apply(&self, mut config: DetectorConfig) -> Result<DetectorConfig> {
        if let Some(row_limit) = self.row_limit {
            config.row_limit = row_limit;
        }
        if let Some(threshold) = self.threshold {
            config.distance_threshold = threshold;
        }
        if let Some(max_pairs) = self.max_pairs {
            config.max_pair_evaluations = Some(max_pairs);
        }
        if let Some(secs) = self.time_budget_secs {
            config.time_budget =
                Some(Duration::try_from_secs_f64(secs).context("invalid --time-budget-secs")?);
        }
        if let Some(threads) = self.threads {
            config.thread_count = Some(threads);
        }
        if let Some(preview_rows) = self.preview_rows {
            config.preview_rows = preview_rows;
        }
        Ok(config)
    }
}

// Holds aggregated figures for the whole run
struct RunMetrics {
    total_transactions: usize,
    edge_count: usize,
    mean_degree: f64,
    flagged: usize,
    flagged_rate: f64,
}

// Calculates overall metrics for the run
// Inputs: finished analysis
// Outputs: RunMetrics with graph size and flag statistics
fn calculate_metrics(analysis: &FraudAnalysis) -> RunMetrics {
    let total_transactions = analysis.graph.node_count();
    let flagged = analysis.classification.flagged_count();
    let flagged_rate = if total_transactions > 0 {
        flagged as f64 / total_transactions as f64
    } else {
        0.0
    };

    RunMetrics {
        total_transactions,
        edge_count: analysis.graph.edge_count(),
        mean_degree: analysis.classification.mean_degree,
        flagged,
        flagged_rate,
    }
}

// Prints the first rows of the result table
// Inputs: result rows and how many of them to show
// Outputs: Prints formatted table to console
fn print_result_table(rows: &[ResultRow], preview_rows: usize) {
    println!(
        "{:>6} {:>5} {:>12} {:>12} {:>12} {:>14} {:>14} {:>14} {:>14} {:>7} {:>6} {:>15}",
        "id", "step", "amount", "nameOrig", "nameDest", "oldbalanceOrg", "newbalanceOrig",
        "oldbalanceDest", "newbalanceDest", "isFraud", "degree", "predicted_fraud"
    );
    for row in rows.iter().take(preview_rows) {
        let is_fraud = match row.is_fraud {
            Some(true) => "1",
            Some(false) => "0",
            None => "-",
        };
        println!(
            "{:>6} {:>5} {:>12.2} {:>12} {:>12} {:>14.2} {:>14.2} {:>14.2} {:>14.2} {:>7} {:>6} {:>15}",
            row.id,
            row.step,
            row.amount,
            row.name_orig,
            row.name_dest,
            row.old_balance_orig,
            row.new_balance_orig,
            row.old_balance_dest,
            row.new_balance_dest,
            is_fraud,
            row.degree,
            row.predicted_fraud
        );
    }
    if rows.len() > preview_rows {
        println!("... {} more rows", rows.len() - preview_rows);
    }
}

// Main entry point for the fraud detection system
// Key steps:
// 1. Resolve configuration from environment and flags
// 2. Load transaction data
// 3. Build the similarity graph and classify by degree
// 4. Display and optionally export results
fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.apply(DetectorConfig::from_env()?)?;
    config.validate()?;

    // Load and validate transaction data
    let batch = read_transactions(&cli.input, config.row_limit)
        .with_context(|| format!("failed to load {}", cli.input.display()))?;

    println!(
        "Similarity graph (threshold={}, rows={})",
        config.distance_threshold,
        batch.transactions.len()
    );
    let analysis = analyze_transactions(&batch, &config)?;

    let rows = build_rows(&batch, &analysis.classification);
    print_result_table(&rows, config.preview_rows);
    if let Some(path) = &cli.output {
        write_results(path, &rows)?;
        println!("Results written to {}", path.display());
    }

    let metrics = calculate_metrics(&analysis);
    println!("\nOverall Metrics:");
    println!("Total Transactions: {}", metrics.total_transactions);
    println!("Edges: {}", metrics.edge_count);
    println!("Mean Degree: {:.3}", metrics.mean_degree);
    println!("Predicted Fraudulent: {} ({:.2}%)", metrics.flagged, metrics.flagged_rate * 100.0);

    match &analysis.accuracy {
        Some(report) => {
            let c = report.counts;
            println!(
                "TP: {}  FP: {}  TN: {}  FN: {}",
                c.true_positives, c.false_positives, c.true_negatives, c.false_negatives
            );
            println!("Accuracy: {:.2}%", report.accuracy * 100.0);
        }
        None => println!("'isFraud' column not found in the data; accuracy not computed."),
    }

    Ok(())
}
