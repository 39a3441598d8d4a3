//! Lattice: arena-backed tree of transformed texts
//!
//! Nodes live in a flat `Vec` with an id index; parents are arena indices,
//! so a node never owns its parent. A lattice is built once by
//! `LatticeBuilder` and is read-only afterwards.

mod builder;
mod guard;
mod scorer;
mod transform;

pub use builder::{build_lattice, LatticeBuilder};
pub use guard::{BuildStats, LoopGuard, LoopPatternHits, ECHO_MARKER, SHADOW_MARKER, SYMBOLS_MARKER};
pub use scorer::Scorer;
pub use transform::{
    abstract_principle, ground_action, invert, mirror, symbolize, GroundCue, TransformKind,
};

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::config::LatticeConfig;

/// Id of the root node in every lattice
pub const ROOT_ID: &str = "0";

/// A single node of the lattice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Path-derived id: `"0"` for the root, `"{parent}.{ordinal}"` below it
    pub id: String,
    pub text: String,
    pub kind: TransformKind,
    pub depth: usize,
    pub parent_id: Option<String>,
    /// Arena index of the parent
    #[serde(skip)]
    pub parent: Option<usize>,
    /// Novelty relative to the parent; `None` when gating is off
    pub novelty: Option<f64>,
    pub terminal: bool,
    /// Non-empty only on Ground nodes
    pub sigils: BTreeSet<String>,
    /// Consecutive Invert transforms ending at this node
    pub invert_run: usize,
}

/// Directed parent → child edge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub parent_id: String,
    pub child_id: String,
    pub kind: TransformKind,
}

/// A finished lattice with its config snapshot and build statistics
#[derive(Debug, Clone, Serialize)]
pub struct Lattice {
    nodes: Vec<Node>,
    #[serde(skip)]
    index: HashMap<String, usize>,
    edges: Vec<Edge>,
    config: LatticeConfig,
    stats: BuildStats,
}

impl Lattice {
    pub(crate) fn with_root(seed: &str, config: LatticeConfig) -> Self {
        let root = Node {
            id: ROOT_ID.to_string(),
            text: seed.to_string(),
            kind: TransformKind::Seed,
            depth: 0,
            parent_id: None,
            parent: None,
            novelty: None,
            terminal: false,
            sigils: BTreeSet::new(),
            invert_run: 0,
        };
        let mut index = HashMap::new();
        index.insert(root.id.clone(), 0);
        Self {
            nodes: vec![root],
            index,
            edges: Vec::new(),
            config,
            stats: BuildStats::default(),
        }
    }

    /// Append `node` below the arena slot `parent`, returning its index.
    pub(crate) fn push_child(&mut self, parent: usize, mut node: Node) -> usize {
        let parent_id = self.nodes[parent].id.clone();
        node.parent = Some(parent);
        node.parent_id = Some(parent_id.clone());
        self.edges.push(Edge {
            parent_id,
            child_id: node.id.clone(),
            kind: node.kind,
        });
        let idx = self.nodes.len();
        self.index.insert(node.id.clone(), idx);
        self.nodes.push(node);
        idx
    }

    pub(crate) fn set_stats(&mut self, stats: BuildStats) {
        self.stats = stats;
    }

    /// Texts on the path root → `idx`, inclusive.
    pub(crate) fn path_texts(&self, idx: usize) -> Vec<&str> {
        let mut texts = Vec::with_capacity(self.nodes[idx].depth + 1);
        let mut cursor = Some(idx);
        while let Some(i) = cursor {
            texts.push(self.nodes[i].text.as_str());
            cursor = self.nodes[i].parent;
        }
        texts.reverse();
        texts
    }

    pub(crate) fn node_at(&self, idx: usize) -> &Node {
        &self.nodes[idx]
    }

    pub fn root(&self) -> &Node {
        &self.nodes[0]
    }

    pub fn seed(&self) -> &str {
        &self.root().text
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.index.get(id).map(|&i| &self.nodes[i])
    }

    /// Nodes in materialization order: siblings together, subtrees depth-first.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn config(&self) -> &LatticeConfig {
        &self.config
    }

    pub fn stats(&self) -> &BuildStats {
        &self.stats
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false: a lattice holds at least its root.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn max_depth(&self) -> usize {
        self.nodes.iter().map(|n| n.depth).max().unwrap_or(0)
    }

    /// Children of `id` in canonical order.
    pub fn children(&self, id: &str) -> Vec<&Node> {
        self.edges
            .iter()
            .filter(|e| e.parent_id == id)
            .filter_map(|e| self.node(&e.child_id))
            .collect()
    }

    /// Nodes on the path root → `id`, inclusive. Empty for an unknown id.
    pub fn path_to(&self, id: &str) -> Vec<&Node> {
        let mut path = Vec::new();
        let mut cursor = self.index.get(id).copied();
        while let Some(i) = cursor {
            path.push(&self.nodes[i]);
            cursor = self.nodes[i].parent;
        }
        path.reverse();
        path
    }

    pub fn nodes_of_kind(&self, kind: TransformKind) -> impl Iterator<Item = &Node> {
        self.nodes.iter().filter(move |n| n.kind == kind)
    }
}
