//! Loop/Dedup Guard: ARC gating and loop-pattern counters
//!
//! The guard is owned by a single build. It decides whether a candidate
//! repeats content already materialized in the run, remembers whether the
//! session has been grounded, and keeps every run-level counter the
//! aggregator later reads, so nothing is reconstructed after the fact.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::transform::TransformKind;

pub const ECHO_MARKER: &str = "Echo of [";
pub const SHADOW_MARKER: &str = "Shadow of (";
pub const SYMBOLS_MARKER: &str = "Symbols:";

/// Occurrences of the three loop markers across a whole lattice
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoopPatternHits {
    pub echo_of: usize,
    pub shadow_of: usize,
    pub symbols: usize,
}

impl LoopPatternHits {
    /// Marker occurrences found in a single text.
    pub fn scan(text: &str) -> Self {
        Self {
            echo_of: text.matches(ECHO_MARKER).count(),
            shadow_of: text.matches(SHADOW_MARKER).count(),
            symbols: text.matches(SYMBOLS_MARKER).count(),
        }
    }

    pub fn total(&self) -> usize {
        self.echo_of + self.shadow_of + self.symbols
    }

    fn absorb(&mut self, other: LoopPatternHits) {
        self.echo_of += other.echo_of;
        self.shadow_of += other.shadow_of;
        self.symbols += other.symbols;
    }
}

/// Counters recorded while the lattice is being built
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BuildStats {
    /// Candidates suppressed as duplicates of materialized content
    pub dedup_saved: usize,
    /// Candidates dropped by the novelty threshold
    pub novelty_pruned: usize,
    /// Candidates dropped by the branching cap
    pub branching_pruned: usize,
    /// Distinct text payloads among materialized nodes
    pub unique_nodes: usize,
    pub loop_hits: LoopPatternHits,
    /// Longest run of consecutive Invert transforms on any path
    pub invert_nesting_max: usize,
}

/// Per-build guard state
#[derive(Debug, Default)]
pub struct LoopGuard {
    seen_texts: HashSet<String>,
    materialized: HashSet<(TransformKind, String)>,
    grounded: bool,
    stats: BuildStats,
}

impl LoopGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// ARC gating: true when `candidate` equals a text on the current path,
    /// or when the run already materialized the same text from `kind`.
    ///
    /// A duplicate is counted once per suppressed generation, so the same
    /// text reached from two parents is counted twice.
    pub fn suppress_duplicate(
        &mut self,
        path_texts: &[&str],
        kind: TransformKind,
        candidate: &str,
    ) -> bool {
        let repeated = path_texts.iter().any(|t| *t == candidate)
            || self.materialized.contains(&(kind, candidate.to_string()));
        if repeated {
            self.stats.dedup_saved += 1;
        }
        repeated
    }

    /// True once a Ground node has been materialized; later Ground
    /// candidates are not generated.
    pub fn grounded(&self) -> bool {
        self.grounded
    }

    pub fn record_novelty_prune(&mut self) {
        self.stats.novelty_pruned += 1;
    }

    pub fn record_branching_prune(&mut self, count: usize) {
        self.stats.branching_pruned += count;
    }

    /// Register a materialized node and its invert run length.
    pub fn observe(&mut self, kind: TransformKind, text: &str, invert_run: usize) {
        self.stats.loop_hits.absorb(LoopPatternHits::scan(text));
        if !self.seen_texts.contains(text) {
            self.seen_texts.insert(text.to_string());
        }
        self.materialized.insert((kind, text.to_string()));
        if kind == TransformKind::Ground {
            self.grounded = true;
        }
        self.stats.unique_nodes = self.seen_texts.len();
        self.stats.invert_nesting_max = self.stats.invert_nesting_max.max(invert_run);
    }

    pub fn stats(&self) -> &BuildStats {
        &self.stats
    }

    pub fn finish(self) -> BuildStats {
        self.stats
    }
}
