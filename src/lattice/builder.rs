//! Lattice Builder: bounded depth-first expansion with an explicit stack

use std::collections::BTreeSet;

use log::{debug, info, warn};

use super::guard::LoopGuard;
use super::scorer::Scorer;
use super::transform::{ground_action, GroundCue, TransformKind};
use super::{Lattice, Node};
use crate::config::LatticeConfig;
use crate::error::{LatticeError, LatticeResult};

/// A transform output that may still be dropped by a gate
#[derive(Debug)]
struct Candidate {
    kind: TransformKind,
    text: String,
    novelty: Option<f64>,
    cue: Option<GroundCue>,
}

/// Builds lattices for one validated configuration
#[derive(Debug, Clone)]
pub struct LatticeBuilder {
    config: LatticeConfig,
    scorer: Scorer,
}

impl LatticeBuilder {
    /// Validates `config` before any expansion can happen.
    pub fn new(config: LatticeConfig) -> LatticeResult<Self> {
        config.validate()?;
        if config.depth_cap == 0 {
            warn!("depth_cap is 0, lattices will hold only the seed");
        }
        Ok(Self {
            scorer: Scorer::new(config.rng_seed),
            config,
        })
    }

    pub fn config(&self) -> &LatticeConfig {
        &self.config
    }

    /// Expand `seed` into a finished lattice.
    pub fn build(&self, seed: &str) -> LatticeResult<Lattice> {
        if seed.trim().is_empty() {
            return Err(LatticeError::Config(
                "seed must contain non-whitespace text".to_string(),
            ));
        }

        let depth_cap = self.config.depth_limit();
        let mut guard = LoopGuard::new();
        let mut lattice = Lattice::with_root(seed, self.config.clone());
        guard.observe(TransformKind::Seed, seed, 0);

        let mut stack = vec![0usize];
        while let Some(idx) = stack.pop() {
            let node = lattice.node_at(idx);
            if node.kind.is_terminal() || node.depth >= depth_cap {
                continue;
            }
            let parent_id = node.id.clone();
            let depth = node.depth + 1;
            let invert_run = node.invert_run;

            let candidates = self.generate(&lattice, idx, &mut guard);
            let survivors = self.cap_branching(&parent_id, candidates, &mut guard);
            debug!(
                "expand {} at depth {}: {} children",
                parent_id,
                depth - 1,
                survivors.len()
            );

            let mut descend = Vec::with_capacity(survivors.len());
            for candidate in survivors {
                let run = if candidate.kind == TransformKind::Invert {
                    invert_run + 1
                } else {
                    0
                };
                guard.observe(candidate.kind, &candidate.text, run);
                let sigils: BTreeSet<String> = match candidate.cue {
                    Some(cue) => ["ground", cue.as_str()].iter().map(|s| s.to_string()).collect(),
                    None => BTreeSet::new(),
                };
                let child = Node {
                    id: format!("{}.{}", parent_id, candidate.kind.ordinal()),
                    text: candidate.text,
                    kind: candidate.kind,
                    depth,
                    parent_id: None,
                    parent: None,
                    novelty: candidate.novelty,
                    terminal: candidate.kind.is_terminal(),
                    sigils,
                    invert_run: run,
                };
                let expandable = !child.terminal && depth < depth_cap;
                let child_idx = lattice.push_child(idx, child);
                if expandable {
                    descend.push(child_idx);
                }
            }
            // reversed so the first canonical child is expanded first
            stack.extend(descend.into_iter().rev());
        }

        let stats = guard.finish();
        info!(
            "built lattice: {} nodes, max depth {}, dedup_saved {}, novelty_pruned {}, branching_pruned {}",
            lattice.len(),
            lattice.max_depth(),
            stats.dedup_saved,
            stats.novelty_pruned,
            stats.branching_pruned
        );
        lattice.set_stats(stats);
        Ok(lattice)
    }

    /// Candidates below arena slot `idx` that pass ARC and novelty gating.
    ///
    /// Once the session is grounded no further Ground candidate is generated.
    fn generate(&self, lattice: &Lattice, idx: usize, guard: &mut LoopGuard) -> Vec<Candidate> {
        let parent_text = lattice.node_at(idx).text.as_str();
        let path = lattice.path_texts(idx);
        let mut candidates = Vec::with_capacity(TransformKind::CANONICAL.len());

        for kind in TransformKind::CANONICAL {
            if kind == TransformKind::Ground && guard.grounded() {
                continue;
            }
            let (text, cue) = match kind {
                TransformKind::Ground => {
                    let (text, cue) = ground_action(parent_text);
                    (text, Some(cue))
                }
                _ => (kind.apply(parent_text), None),
            };
            if guard.suppress_duplicate(&path, kind, &text) {
                continue;
            }
            let novelty = match self.config.novelty_threshold {
                Some(threshold) => {
                    let score = self.scorer.novelty(parent_text, &text);
                    if score < threshold {
                        guard.record_novelty_prune();
                        continue;
                    }
                    Some(score)
                }
                None => None,
            };
            candidates.push(Candidate {
                kind,
                text,
                novelty,
                cue,
            });
        }
        candidates
    }

    /// Ground keeps its slot; other kinds compete in seeded admission order.
    fn cap_branching(
        &self,
        node_id: &str,
        candidates: Vec<Candidate>,
        guard: &mut LoopGuard,
    ) -> Vec<Candidate> {
        let cap = match self.config.branching_limit() {
            Some(cap) if candidates.len() > cap => cap,
            _ => return candidates,
        };
        let has_ground = candidates.iter().any(|c| c.kind == TransformKind::Ground);
        let slots = if has_ground { cap - 1 } else { cap };
        let contenders: Vec<TransformKind> = candidates
            .iter()
            .map(|c| c.kind)
            .filter(|k| *k != TransformKind::Ground)
            .collect();
        let admitted: Vec<TransformKind> = self
            .scorer
            .admission_order(node_id, &contenders)
            .into_iter()
            .take(slots)
            .collect();

        let before = candidates.len();
        let kept: Vec<Candidate> = candidates
            .into_iter()
            .filter(|c| c.kind == TransformKind::Ground || admitted.contains(&c.kind))
            .collect();
        guard.record_branching_prune(before - kept.len());
        kept
    }
}

/// Build a lattice from raw bounds; see `LatticeConfig::validate` for errors.
pub fn build_lattice(
    seed: &str,
    depth_cap: i64,
    branching_cap: Option<i64>,
    novelty_threshold: Option<f64>,
    rng_seed: u64,
) -> LatticeResult<Lattice> {
    let config = LatticeConfig::new(depth_cap, branching_cap, novelty_threshold, rng_seed);
    LatticeBuilder::new(config)?.build(seed)
}
