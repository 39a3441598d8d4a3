//! Ground Selector: one closing Ground node per lattice
//!
//! Selection runs after construction and only reads the lattice. The
//! builder grounds a session at most once, but any lattice is accepted:
//! the shallowest Ground node wins and ties go to the lexicographically
//! smallest id.

use log::debug;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::channel::GroundChannel;
use crate::lattice::{Lattice, Node, TransformKind};

/// The chosen Ground node, described without any node text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroundSelection {
    /// Ids root → chosen Ground, inclusive; `None` when no Ground exists
    pub ground_path: Option<Vec<String>>,
    pub ground_nodes_count: usize,
    pub ground_reached: bool,
    pub ground_channel: Option<GroundChannel>,
    /// First 4 bytes of the path digest as lowercase hex
    pub ground_hash: Option<String>,
    /// Mean edge novelty along the path; `None` when any edge is unscored
    pub avg_novelty_to_ground: Option<f64>,
}

impl GroundSelection {
    pub fn empty(ground_nodes_count: usize) -> Self {
        Self {
            ground_path: None,
            ground_nodes_count,
            ground_reached: false,
            ground_channel: None,
            ground_hash: None,
            avg_novelty_to_ground: None,
        }
    }

    /// Id of the selected Ground node.
    pub fn ground_id(&self) -> Option<&str> {
        self.ground_path
            .as_ref()
            .and_then(|p| p.last())
            .map(String::as_str)
    }
}

/// Picks the session Ground for a finished lattice
#[derive(Debug, Clone, Default)]
pub struct GroundSelector {
    category: Option<String>,
}

impl GroundSelector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a case category into the channel mapping.
    pub fn with_category(category: impl Into<String>) -> Self {
        Self {
            category: Some(category.into()),
        }
    }

    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    pub fn select(&self, lattice: &Lattice) -> GroundSelection {
        let grounds: Vec<&Node> = lattice.nodes_of_kind(TransformKind::Ground).collect();
        let chosen = grounds
            .iter()
            .min_by(|a, b| a.depth.cmp(&b.depth).then_with(|| a.id.cmp(&b.id)));
        let Some(chosen) = chosen else {
            return GroundSelection::empty(0);
        };

        let path = lattice.path_to(&chosen.id);
        let ids: Vec<String> = path.iter().map(|n| n.id.clone()).collect();
        let scores: Option<Vec<f64>> = path.iter().skip(1).map(|n| n.novelty).collect();
        let avg_novelty_to_ground = match scores {
            Some(scores) if !scores.is_empty() => {
                Some(scores.iter().sum::<f64>() / scores.len() as f64)
            }
            _ => None,
        };
        let hash = ground_hash(lattice.seed(), &ids);
        debug!("selected ground {} among {} candidates", chosen.id, grounds.len());

        GroundSelection {
            ground_nodes_count: grounds.len(),
            ground_reached: true,
            ground_channel: Some(GroundChannel::resolve(lattice.seed(), self.category())),
            ground_hash: Some(hash),
            avg_novelty_to_ground,
            ground_path: Some(ids),
        }
    }
}

/// Stable digest over the seed and the ordered ground path ids.
///
/// Each component is written as its byte length (u64, little-endian)
/// followed by its UTF-8 bytes, after a fixed domain tag.
pub fn ground_hash(seed: &str, path: &[String]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(b"echolattice:ground:v1");
    for part in std::iter::once(seed).chain(path.iter().map(String::as_str)) {
        hasher.update((part.len() as u64).to_le_bytes());
        hasher.update(part.as_bytes());
    }
    hex::encode(&hasher.finalize()[..4])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    use crate::config::LatticeConfig;
    use crate::lattice::{build_lattice, Lattice, Node};

    fn node(id: &str, kind: TransformKind, depth: usize) -> Node {
        Node {
            id: id.to_string(),
            text: format!("{} text", id),
            kind,
            depth,
            parent_id: None,
            parent: None,
            novelty: None,
            terminal: kind.is_terminal(),
            sigils: BTreeSet::new(),
            invert_run: 0,
        }
    }

    #[test]
    fn test_shallowest_then_smallest_id_wins() {
        let mut lattice = Lattice::with_root("Silence", LatticeConfig::default());
        let mirror = lattice.push_child(0, node("0.1", TransformKind::Mirror, 1));
        let invert = lattice.push_child(0, node("0.2", TransformKind::Invert, 1));
        lattice.push_child(mirror, node("0.1.5", TransformKind::Ground, 2));
        lattice.push_child(invert, node("0.2.5", TransformKind::Ground, 2));
        let mirror_child = lattice.push_child(mirror, node("0.1.1", TransformKind::Mirror, 2));
        lattice.push_child(mirror_child, node("0.1.1.5", TransformKind::Ground, 3));

        let selection = GroundSelector::new().select(&lattice);
        assert_eq!(selection.ground_id(), Some("0.1.5"));
        assert_eq!(selection.ground_nodes_count, 3);
        assert_eq!(
            selection.ground_path,
            Some(vec!["0".to_string(), "0.1".to_string(), "0.1.5".to_string()])
        );
    }

    #[test]
    fn test_silence_selects_root_ground() {
        let lattice = build_lattice("Silence", 4, None, None, 42).unwrap();
        let selection = GroundSelector::new().select(&lattice);
        assert_eq!(
            selection.ground_path,
            Some(vec!["0".to_string(), "0.5".to_string()])
        );
        assert_eq!(selection.ground_hash.as_deref(), Some("cfad3333"));
        assert_eq!(selection.ground_nodes_count, 1);
        assert!(selection.ground_reached);
        assert_eq!(selection.avg_novelty_to_ground, None);
        assert_eq!(selection.ground_channel, Some(GroundChannel::Writing));
        assert_eq!(selection.ground_id(), Some("0.5"));
    }

    #[test]
    fn test_gated_average_novelty() {
        let lattice = build_lattice("Silence", 4, None, Some(0.35), 42).unwrap();
        let selection = GroundSelector::new().select(&lattice);
        assert_eq!(selection.ground_hash.as_deref(), Some("cfad3333"));
        assert_eq!(selection.ground_nodes_count, 1);
        let avg = selection.avg_novelty_to_ground.unwrap();
        assert!((avg - 12.0 / 13.0).abs() < 1e-12);
    }

    #[test]
    fn test_hash_depends_on_seed() {
        let lattice = build_lattice("Tell me what to believe.", 4, None, Some(0.55), 42).unwrap();
        let selection = GroundSelector::new().select(&lattice);
        assert_eq!(selection.ground_hash.as_deref(), Some("6968f4d9"));
        assert_eq!(selection.ground_nodes_count, 1);
        let avg = selection.avg_novelty_to_ground.unwrap();
        assert!((avg - 15.0 / 17.0).abs() < 1e-12);

        let bearer = build_lattice("Seed Bearer", 2, None, None, 42).unwrap();
        let selection = GroundSelector::new().select(&bearer);
        assert_eq!(selection.ground_hash.as_deref(), Some("93feee21"));
        assert_eq!(selection.ground_nodes_count, 1);
    }

    #[test]
    fn test_no_ground_gives_empty_selection() {
        let lattice = build_lattice("Silence", 0, None, None, 42).unwrap();
        let selection = GroundSelector::with_category("minimal").select(&lattice);
        assert_eq!(selection, GroundSelection::empty(0));
        assert!(!selection.ground_reached);
        assert!(selection.ground_channel.is_none());
    }

    #[test]
    fn test_category_drives_channel() {
        let lattice = build_lattice("Silence", 2, None, None, 42).unwrap();
        let selection = GroundSelector::with_category("loop").select(&lattice);
        assert_eq!(selection.ground_channel, Some(GroundChannel::Movement));
    }

    #[test]
    fn test_hash_is_length_prefixed() {
        let a = ground_hash("ab", &["0".to_string()]);
        let b = ground_hash("a", &["b0".to_string()]);
        assert_ne!(a, b);
        assert_eq!(a.len(), 8);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_selection_is_deterministic() {
        let first = build_lattice("Seed Bearer", 3, Some(3), Some(0.2), 42).unwrap();
        let second = build_lattice("Seed Bearer", 3, Some(3), Some(0.2), 42).unwrap();
        assert_eq!(
            GroundSelector::new().select(&first),
            GroundSelector::new().select(&second)
        );
    }
}
