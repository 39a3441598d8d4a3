//! Run records: one JSON object per (seed, config) run

use serde::{Deserialize, Serialize};

use crate::config::LatticeConfig;
use crate::error::LatticeResult;
use crate::ground::{GroundSelection, GroundSelector};
use crate::lattice::{Lattice, LatticeBuilder};
use crate::metrics::{aggregate, LoopinessMetrics, StructureMetrics};
use crate::policy::{PolicyEvaluator, PolicyRecord};

/// Config snapshot as written into a record; `novelty: null` means gating off
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    pub novelty: Option<f64>,
    pub depth: i64,
    pub branching: Option<i64>,
    pub rng_seed: u64,
}

impl From<&LatticeConfig> for RunConfig {
    fn from(config: &LatticeConfig) -> Self {
        Self {
            novelty: config.novelty_threshold,
            depth: config.depth_cap,
            branching: config.branching_cap,
            rng_seed: config.rng_seed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub seed: String,
    pub category: Option<String>,
    pub config: RunConfig,
    pub structure: StructureMetrics,
    pub loopiness: LoopinessMetrics,
    pub ground: GroundSelection,
    pub policy: PolicyRecord,
    /// Filled in by a human reviewer, never by the engine
    pub human_closure_rating: Option<f64>,
}

/// A finished run: the lattice plus its record
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub lattice: Lattice,
    pub record: RunRecord,
}

/// Build, select, aggregate and evaluate one seed.
pub fn run_once(
    seed: &str,
    category: Option<&str>,
    config: &LatticeConfig,
    evaluator: &PolicyEvaluator,
) -> LatticeResult<RunOutput> {
    let lattice = LatticeBuilder::new(config.clone())?.build(seed)?;
    let selector = match category {
        Some(category) => GroundSelector::with_category(category),
        None => GroundSelector::new(),
    };
    let ground = selector.select(&lattice);
    let aggregates = aggregate(&lattice, &ground);
    let decision = evaluator.evaluate(&aggregates);

    let record = RunRecord {
        seed: seed.to_string(),
        category: category.map(str::to_string),
        config: RunConfig::from(config),
        structure: aggregates.structure,
        loopiness: aggregates.loopiness,
        ground: aggregates.ground,
        policy: PolicyRecord::advisory(decision),
        human_closure_rating: None,
    };
    Ok(RunOutput { lattice, record })
}
