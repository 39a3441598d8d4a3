//! Metrics Aggregator: structural and loopiness aggregates
//!
//! Aggregates are content-free: counts, ratios and ids only. Everything
//! the guard measured during construction is read from the build stats.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::ground::GroundSelection;
use crate::lattice::{Lattice, LoopPatternHits};

/// Shape of the lattice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructureMetrics {
    pub node_count: usize,
    pub edge_count: usize,
    pub unique_nodes: usize,
    pub max_depth: usize,
    /// Node count per transform kind, keyed by kind name
    pub kind_counts: BTreeMap<String, usize>,
    pub dedup_saved: usize,
    /// Share of generated candidates suppressed by ARC gating
    pub dedup_ratio: f64,
    pub novelty_pruned: usize,
    pub branching_pruned: usize,
}

/// Loop-marker counts as serialized in run records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoopHitsRecord {
    pub echo_of: usize,
    pub shadow_of: usize,
    pub symbols: usize,
    pub total: usize,
}

impl From<LoopPatternHits> for LoopHitsRecord {
    fn from(hits: LoopPatternHits) -> Self {
        Self {
            echo_of: hits.echo_of,
            shadow_of: hits.shadow_of,
            symbols: hits.symbols,
            total: hits.total(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoopinessMetrics {
    pub loop_pattern_hits: LoopHitsRecord,
    pub invert_nesting_max: usize,
}

/// Everything the policy evaluator may look at
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Aggregates {
    pub structure: StructureMetrics,
    pub loopiness: LoopinessMetrics,
    pub ground: GroundSelection,
}

impl Aggregates {
    pub fn loop_total(&self) -> usize {
        self.loopiness.loop_pattern_hits.total
    }
}

/// `saved / (saved + edges)`, 0 when both are 0.
pub fn dedup_ratio(dedup_saved: usize, edge_count: usize) -> f64 {
    let generated = dedup_saved + edge_count;
    if generated == 0 {
        0.0
    } else {
        dedup_saved as f64 / generated as f64
    }
}

/// Aggregate a finished lattice and its Ground selection.
pub fn aggregate(lattice: &Lattice, ground: &GroundSelection) -> Aggregates {
    let stats = lattice.stats();
    let mut kind_counts = BTreeMap::new();
    for node in lattice.nodes() {
        *kind_counts.entry(node.kind.name().to_string()).or_insert(0) += 1;
    }
    let edge_count = lattice.edges().len();

    Aggregates {
        structure: StructureMetrics {
            node_count: lattice.len(),
            edge_count,
            unique_nodes: stats.unique_nodes,
            max_depth: lattice.max_depth(),
            kind_counts,
            dedup_saved: stats.dedup_saved,
            dedup_ratio: dedup_ratio(stats.dedup_saved, edge_count),
            novelty_pruned: stats.novelty_pruned,
            branching_pruned: stats.branching_pruned,
        },
        loopiness: LoopinessMetrics {
            loop_pattern_hits: stats.loop_hits.into(),
            invert_nesting_max: stats.invert_nesting_max,
        },
        ground: ground.clone(),
    }
}
