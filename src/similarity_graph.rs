// Pairwise L1 similarity graph over transaction feature vectors.
//
// Construction happens in two phases: every row is evaluated against all later
// rows on the rayon pool, each worker returning its own edge list, and the
// lists are then merged on the calling thread into a petgraph graph that is
// never mutated again.
use std::collections::{BTreeMap, HashMap};
use std::time::{Duration, Instant};

use ndarray::ArrayView1;
use petgraph::graph::{NodeIndex, UnGraph};
use rayon::prelude::*;
use tracing::{debug, info};

use crate::error::{FraudGraphError, Result};
use crate::features::{FeatureMatrix, TransactionId};

/// Sum of absolute differences, accumulated left to right in dimension order.
pub fn l1_distance(a: ArrayView1<'_, f64>, b: ArrayView1<'_, f64>) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y).abs()).sum()
}

// Number of unordered pairs of distinct transactions.
pub fn pair_count(n: usize) -> u64 {
    let n = n as u64;
    n * n.saturating_sub(1) / 2
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimilarEdge {
    pub a: TransactionId,
    pub b: TransactionId,
    pub distance: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GraphParams {
    pub distance_threshold: f64,
    pub max_pair_evaluations: Option<u64>,
    pub time_budget: Option<Duration>,
    pub thread_count: Option<usize>,
}

impl GraphParams {
    #[cfg(test)]
    pub fn with_threshold(distance_threshold: f64) -> Self {
        Self {
            distance_threshold,
            max_pair_evaluations: None,
            time_budget: None,
            thread_count: None,
        }
    }
}

// Edges between row `i` and every later row. Strictly below the threshold.
fn row_edges(features: &FeatureMatrix, i: usize, threshold: f64) -> Vec<SimilarEdge> {
    let ids = features.ids();
    let a = ids[i];
    let row_a = features.row(a);
    ids[i + 1..]
        .iter()
        .filter_map(|&b| {
            let distance = l1_distance(row_a, features.row(b));
            (distance < threshold).then_some(SimilarEdge { a, b, distance })
        })
        .collect()
}

/// Evaluates every unordered pair exactly once and returns the qualifying
/// edges ordered by `(a, b)`.
pub fn similar_pairs(features: &FeatureMatrix, params: &GraphParams) -> Result<Vec<SimilarEdge>> {
    let started = Instant::now();
    let per_row: Vec<Vec<SimilarEdge>> = (0..features.len())
        .into_par_iter()
        .map(|i| {
            if let Some(budget) = params.time_budget {
                if started.elapsed() >= budget {
                    return Err(FraudGraphError::TimeBudgetExceeded(budget));
                }
            }
            Ok(row_edges(features, i, params.distance_threshold))
        })
        .collect::<Result<Vec<_>>>()?;

    let edges: Vec<SimilarEdge> = per_row.into_iter().flatten().collect();
    debug!(edges = edges.len(), elapsed_ms = started.elapsed().as_millis() as u64, "pair evaluation finished");
    Ok(edges)
}

/// Undirected simple graph whose nodes are transactions and whose edges join
/// pairs closer than the distance threshold. Edge weights hold the distance.
#[derive(Debug, Clone)]
pub struct SimilarityGraph {
    graph: UnGraph<TransactionId, f64>,
    nodes: HashMap<TransactionId, NodeIndex>,
}

impl SimilarityGraph {
    pub fn build(features: &FeatureMatrix, params: &GraphParams) -> Result<Self> {
        let pairs = pair_count(features.len());
        if let Some(budget) = params.max_pair_evaluations {
            if pairs > budget {
                return Err(FraudGraphError::PairBudgetExceeded { pairs, budget });
            }
        }
        info!(
            transactions = features.len(),
            pairs,
            threshold = params.distance_threshold,
            "building similarity graph"
        );

        let edges = match params.thread_count {
            Some(threads) => rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .build()
                .map_err(|e| FraudGraphError::Config(format!("cannot start worker pool: {e}")))?
                .install(|| similar_pairs(features, params))?,
            None => similar_pairs(features, params)?,
        };

        let graph = Self::consolidate(features.ids(), &edges);
        info!(nodes = graph.node_count(), edges = graph.edge_count(), "similarity graph built");
        Ok(graph)
    }

    fn consolidate(ids: &[TransactionId], edges: &[SimilarEdge]) -> Self {
        let mut graph = UnGraph::with_capacity(ids.len(), edges.len());
        let nodes: HashMap<TransactionId, NodeIndex> =
            ids.iter().map(|&id| (id, graph.add_node(id))).collect();
        for edge in edges {
            graph.add_edge(nodes[&edge.a], nodes[&edge.b], edge.distance);
        }
        Self { graph, nodes }
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    #[cfg(test)]
    pub fn has_edge(&self, a: TransactionId, b: TransactionId) -> bool {
        self.edge_distance(a, b).is_some()
    }

    #[cfg(test)]
    pub fn edge_distance(&self, a: TransactionId, b: TransactionId) -> Option<f64> {
        let (na, nb) = (self.nodes.get(&a)?, self.nodes.get(&b)?);
        self.graph.find_edge(*na, *nb).map(|e| self.graph[e])
    }

    #[cfg(test)]
    pub fn neighbors(&self, id: TransactionId) -> Vec<TransactionId> {
        let mut neighbors: Vec<TransactionId> = match self.nodes.get(&id) {
            Some(&node) => self.graph.neighbors(node).map(|n| self.graph[n]).collect(),
            None => Vec::new(),
        };
        neighbors.sort();
        neighbors
    }

    #[cfg(test)]
    pub fn degree(&self, id: TransactionId) -> usize {
        self.nodes
            .get(&id)
            .map_or(0, |&node| self.graph.neighbors(node).count())
    }

    // Every edge as an ordered `(low, high)` id pair.
    #[cfg(test)]
    pub fn edges(&self) -> Vec<(TransactionId, TransactionId)> {
        let mut edges: Vec<_> = self
            .graph
            .edge_indices()
            .filter_map(|e| self.graph.edge_endpoints(e))
            .map(|(x, y)| {
                let (a, b) = (self.graph[x], self.graph[y]);
                if a <= b { (a, b) } else { (b, a) }
            })
            .collect();
        edges.sort();
        edges
    }

    pub fn degrees(&self) -> DegreeMap {
        let degrees = self
            .nodes
            .iter()
            .map(|(&id, &node)| (id, self.graph.neighbors(node).count()))
            .collect();
        DegreeMap { degrees }
    }
}

/// Degree of every transaction, including isolated ones.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DegreeMap {
    degrees: BTreeMap<TransactionId, usize>,
}

impl DegreeMap {
    #[cfg(test)]
    pub fn get(&self, id: TransactionId) -> Option<usize> {
        self.degrees.get(&id).copied()
    }

    pub fn len(&self) -> usize {
        self.degrees.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.degrees.is_empty()
    }

    // Twice the edge count.
    pub fn total(&self) -> usize {
        self.degrees.values().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (TransactionId, usize)> + '_ {
        self.degrees.iter().map(|(&id, &degree)| (id, degree))
    }
}

impl FromIterator<(TransactionId, usize)> for DegreeMap {
    fn from_iter<I: IntoIterator<Item = (TransactionId, usize)>>(iter: I) -> Self {
        Self {
            degrees: iter.into_iter().collect(),
        }
    }
}
