//! Deterministic Scorer: novelty and seeded admission order
//!
//! Novelty is a lexical Jaccard distance between a parent text and its
//! candidate child, so it depends on nothing but the node path and the
//! transform kind. Admission order under a branching cap comes from a
//! generator seeded per node path, never from a stream shared across the
//! traversal. The generator is ChaCha8, whose output is fixed across
//! platforms and `rand` releases.

use std::collections::HashSet;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use sha2::{Digest, Sha256};

use super::transform::{words, TransformKind};

/// Pure scoring functions parameterised by the run's rng seed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scorer {
    rng_seed: u64,
}

impl Scorer {
    pub fn new(rng_seed: u64) -> Self {
        Self { rng_seed }
    }

    pub fn rng_seed(&self) -> u64 {
        self.rng_seed
    }

    /// Novelty of `candidate` relative to `parent`, in [0, 1].
    ///
    /// `1 - |A ∩ B| / |A ∪ B|` over lowercase word sets; two texts without
    /// any words score 0.
    pub fn novelty(&self, parent: &str, candidate: &str) -> f64 {
        let parent = parent.to_lowercase();
        let candidate = candidate.to_lowercase();
        let a: HashSet<&str> = words(&parent).into_iter().collect();
        let b: HashSet<&str> = words(&candidate).into_iter().collect();
        let union = a.union(&b).count();
        if union == 0 {
            return 0.0;
        }
        let shared = a.intersection(&b).count();
        1.0 - shared as f64 / union as f64
    }

    /// 64-bit seed for the generator owned by one node path.
    pub fn path_seed(&self, node_id: &str) -> u64 {
        let mut hasher = Sha256::new();
        hasher.update(b"echolattice:admission:v1");
        hasher.update(self.rng_seed.to_le_bytes());
        hasher.update((node_id.len() as u64).to_le_bytes());
        hasher.update(node_id.as_bytes());
        let digest = hasher.finalize();
        let mut head = [0u8; 8];
        head.copy_from_slice(&digest[..8]);
        u64::from_le_bytes(head)
    }

    /// Ordering key for admitting `kind` below `node_id`.
    ///
    /// One key is drawn per canonical kind, in canonical order, so a key
    /// never depends on which siblings survived earlier gates.
    pub fn admission_key(&self, node_id: &str, kind: TransformKind) -> u64 {
        let mut rng = ChaCha8Rng::seed_from_u64(self.path_seed(node_id));
        let mut key = 0;
        for canonical in TransformKind::CANONICAL {
            let draw: u64 = rng.gen();
            if canonical == kind {
                key = draw;
            }
        }
        key
    }

    /// `kinds` sorted into admission order for the children of `node_id`.
    pub fn admission_order(&self, node_id: &str, kinds: &[TransformKind]) -> Vec<TransformKind> {
        let mut keyed: Vec<(u64, usize, TransformKind)> = kinds
            .iter()
            .map(|&k| (self.admission_key(node_id, k), k.ordinal(), k))
            .collect();
        keyed.sort_unstable();
        keyed.into_iter().map(|(_, _, k)| k).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_novelty_identical_is_zero() {
        let scorer = Scorer::new(0);
        assert_eq!(scorer.novelty("Seed Bearer", "Seed Bearer"), 0.0);
    }

    #[test]
    fn test_novelty_disjoint_is_one() {
        let scorer = Scorer::new(0);
        assert_eq!(scorer.novelty("alpha beta", "gamma delta"), 1.0);
    }

    #[test]
    fn test_novelty_is_case_insensitive_jaccard() {
        let scorer = Scorer::new(0);
        // {silence} vs {action, pick, one, small, step, for, silence, write, it, down, and, do, minutes}
        let score = scorer.novelty(
            "Silence",
            "Action: Pick one small step for silence; write it down and do it for 5 minutes.",
        );
        assert!((score - 12.0 / 13.0).abs() < 1e-12);
    }

    #[test]
    fn test_novelty_without_words() {
        let scorer = Scorer::new(0);
        assert_eq!(scorer.novelty("?", "!"), 0.0);
    }

    #[test]
    fn test_novelty_ignores_rng_seed() {
        let a = Scorer::new(1).novelty("one two", "two three");
        let b = Scorer::new(99).novelty("one two", "two three");
        assert_eq!(a, b);
    }

    #[test]
    fn test_admission_key_is_reproducible() {
        let scorer = Scorer::new(42);
        for kind in TransformKind::CANONICAL {
            assert_eq!(
                scorer.admission_key("0.1.2", kind),
                Scorer::new(42).admission_key("0.1.2", kind)
            );
        }
    }

    #[test]
    fn test_admission_keys_come_from_chacha_stream() {
        let scorer = Scorer::new(42);
        let mut rng = ChaCha8Rng::seed_from_u64(scorer.path_seed("0.3"));
        for kind in TransformKind::CANONICAL {
            let expected: u64 = rng.gen();
            assert_eq!(scorer.admission_key("0.3", kind), expected);
        }
    }

    #[test]
    fn test_path_seed_depends_on_inputs() {
        let scorer = Scorer::new(42);
        assert_ne!(scorer.path_seed("0.1"), scorer.path_seed("0.2"));
        assert_ne!(scorer.path_seed("0.1"), Scorer::new(43).path_seed("0.1"));
    }

    #[test]
    fn test_admission_order_is_a_permutation() {
        let scorer = Scorer::new(7);
        let kinds = [
            TransformKind::Mirror,
            TransformKind::Invert,
            TransformKind::Symbolize,
            TransformKind::Abstract,
        ];
        let ordered = scorer.admission_order("0", &kinds);
        assert_eq!(ordered.len(), kinds.len());
        for kind in kinds {
            assert!(ordered.contains(&kind));
        }
        assert_eq!(ordered, scorer.admission_order("0", &kinds));
    }

    #[test]
    fn test_admission_order_independent_of_subset() {
        let scorer = Scorer::new(3);
        let full = scorer.admission_order("0.1", &TransformKind::CANONICAL);
        let subset = scorer.admission_order("0.1", &[TransformKind::Invert, TransformKind::Abstract]);
        let filtered: Vec<TransformKind> = full
            .into_iter()
            .filter(|k| matches!(k, TransformKind::Invert | TransformKind::Abstract))
            .collect();
        assert_eq!(subset, filtered);
    }
}
