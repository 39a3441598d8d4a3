//! Renderers: JSON dump, Markdown tree and Markdown summary
//!
//! These outputs contain node text and are meant for the person who ran
//! the seed. Run records stay text-free.

use std::collections::HashMap;

use crate::error::LatticeResult;
use crate::ground::GroundSelection;
use crate::lattice::{Lattice, Node, Scorer, TransformKind};

const BRANCH: &str = "├─ ";
const BRANCH_LAST: &str = "└─ ";

/// Pretty JSON of nodes, edges, config and build stats.
pub fn to_json(lattice: &Lattice) -> LatticeResult<String> {
    Ok(serde_json::to_string_pretty(lattice)?)
}

fn label(node: &Node) -> String {
    match node.kind {
        TransformKind::Seed => format!("Seed: {}", node.text),
        kind => format!("{}: {}", kind, node.text),
    }
}

/// Indented tree, root first, children in canonical order.
pub fn to_markdown_tree(lattice: &Lattice) -> String {
    let mut children: HashMap<&str, Vec<&Node>> = HashMap::new();
    for edge in lattice.edges() {
        if let Some(child) = lattice.node(&edge.child_id) {
            children.entry(edge.parent_id.as_str()).or_default().push(child);
        }
    }

    let mut lines = Vec::with_capacity(lattice.len());
    let mut stack: Vec<(&Node, String, &str)> = vec![(lattice.root(), String::new(), "")];
    while let Some((node, prefix, branch)) = stack.pop() {
        lines.push(format!("{prefix}{branch}{}", label(node)));
        let child_prefix = match branch {
            "" => prefix,
            BRANCH_LAST => format!("{prefix}   "),
            _ => format!("{prefix}│  "),
        };
        let kids = children.get(node.id.as_str()).map(Vec::as_slice).unwrap_or(&[]);
        for (i, &kid) in kids.iter().enumerate().rev() {
            let branch = if i + 1 == kids.len() { BRANCH_LAST } else { BRANCH };
            stack.push((kid, child_prefix.clone(), branch));
        }
    }
    lines.join("\n")
}

/// Markdown summary: seed, top 3 most novel nodes, Ground action, totals.
///
/// Nodes built without gating have no stored score, so novelty is
/// recomputed against the parent for ranking.
pub fn to_summary_md(lattice: &Lattice, ground: &GroundSelection) -> String {
    let scorer = Scorer::new(lattice.config().rng_seed);
    let mut scored: Vec<(f64, &Node)> = lattice
        .nodes()
        .iter()
        .filter_map(|node| {
            let parent = lattice.node(node.parent_id.as_deref()?)?;
            let score = node
                .novelty
                .unwrap_or_else(|| scorer.novelty(&parent.text, &node.text));
            Some((score, node))
        })
        .collect();
    scored.sort_by(|a, b| b.0.total_cmp(&a.0));

    let ground_text = ground
        .ground_id()
        .and_then(|id| lattice.node(id))
        .map_or("(none)", |n| n.text.as_str());

    let mut out = String::new();
    out.push_str("# EchoLattice Summary\n\n");
    out.push_str("## Seed\n\n");
    out.push_str(lattice.seed());
    out.push_str("\n\n## Top 3 most novel nodes\n\n");
    if scored.is_empty() {
        out.push_str("(none)\n");
    }
    for (rank, (score, node)) in scored.iter().take(3).enumerate() {
        out.push_str(&format!(
            "{}. {}: {} ({:.3})\n",
            rank + 1,
            node.kind,
            node.text,
            score
        ));
    }
    out.push_str("\n## Final Ground action\n\n");
    out.push_str(ground_text);
    out.push_str("\n\n## Totals\n\n");
    out.push_str(&format!("- Nodes: {}\n", lattice.len()));
    out.push_str(&format!("- Edges: {}\n", lattice.edges().len()));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ground::GroundSelector;
    use crate::lattice::build_lattice;

    #[test]
    fn test_tree_shape() {
        let lattice = build_lattice("Silence", 1, None, None, 0).unwrap();
        let tree = to_markdown_tree(&lattice);
        let lines: Vec<&str> = tree.lines().collect();
        assert_eq!(lines.len(), 6);
        assert_eq!(lines[0], "Seed: Silence");
        assert_eq!(lines[1], "├─ Mirror: Echo of [Silence] returns as self-reflection.");
        assert!(lines[5].starts_with("└─ Ground: Action:"));
    }

    #[test]
    fn test_tree_nesting_prefixes() {
        let lattice = build_lattice("Silence", 2, None, None, 0).unwrap();
        let tree = to_markdown_tree(&lattice);
        let lines: Vec<&str> = tree.lines().collect();
        assert_eq!(lines.len(), lattice.len());
        assert!(lines[2].starts_with("│  ├─ Invert: "));
        assert!(lines.last().unwrap().starts_with("└─ Ground: "));
    }

    #[test]
    fn test_summary_sections() {
        let lattice = build_lattice("Silence", 3, None, None, 0).unwrap();
        let ground = GroundSelector::new().select(&lattice);
        let summary = to_summary_md(&lattice, &ground);
        assert!(summary.contains("## Seed\n\nSilence"));
        assert!(summary.contains("Top 3 most novel nodes"));
        assert!(summary.contains("1. "));
        assert!(summary.contains("3. "));
        assert!(!summary.contains("4. "));
        assert!(summary.contains(
            "Action: Pick one small step for silence; write it down and do it for 5 minutes."
        ));
        assert!(summary.contains(&format!("- Nodes: {}", lattice.len())));
    }

    #[test]
    fn test_summary_without_ground() {
        let lattice = build_lattice("Silence", 0, None, None, 0).unwrap();
        let ground = GroundSelector::new().select(&lattice);
        let summary = to_summary_md(&lattice, &ground);
        assert!(summary.contains("(none)"));
        assert!(summary.contains("- Edges: 0"));
    }

    #[test]
    fn test_json_dump() {
        let lattice = build_lattice("Silence", 1, None, None, 0).unwrap();
        let json = to_json(&lattice).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["nodes"].as_array().unwrap().len(), 6);
        assert_eq!(value["edges"].as_array().unwrap().len(), 5);
        assert_eq!(value["config"]["depth_cap"], 1);
        assert_eq!(value["stats"]["unique_nodes"], 6);
    }
}
