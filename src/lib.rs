//! EchoLattice: bounded deterministic symbolic lattices
//!
//! A seed string is expanded by five canonical text transforms into a
//! depth- and branching-bounded tree. One closing Ground node is selected
//! and hashed, the tree is reduced to content-free aggregates, and an
//! advisory policy maps those aggregates to CONTINUE, PRUNE, GROUND_NOW or
//! DEFER. Identical `(seed, config, rng_seed)` always yield identical output.

pub mod config;
pub mod error;
pub mod ground;
pub mod lattice;
pub mod metrics;
pub mod policy;
pub mod report;

pub use config::LatticeConfig;
pub use error::{LatticeError, LatticeResult};
pub use ground::{GroundChannel, GroundSelection, GroundSelector};
pub use lattice::{build_lattice, Edge, Lattice, LatticeBuilder, Node, TransformKind};
pub use metrics::Aggregates;
pub use policy::{Action, PolicyDecision, PolicyEvaluator, PolicyThresholds, ReasonCode};
pub use report::{run_once, RunRecord};

/// Select the Ground node and aggregate a finished lattice.
pub fn derive(lattice: &Lattice) -> (GroundSelection, Aggregates) {
    derive_with(lattice, GroundSelector::new())
}

/// Like [`derive`], with a case category feeding the channel mapping.
pub fn derive_with_category(lattice: &Lattice, category: &str) -> (GroundSelection, Aggregates) {
    derive_with(lattice, GroundSelector::with_category(category))
}

fn derive_with(lattice: &Lattice, selector: GroundSelector) -> (GroundSelection, Aggregates) {
    let ground = selector.select(lattice);
    let aggregates = metrics::aggregate(lattice, &ground);
    (ground, aggregates)
}

/// Evaluate aggregates against the default thresholds.
pub fn evaluate_policy(aggregates: &Aggregates) -> PolicyDecision {
    PolicyEvaluator::default().evaluate(aggregates)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_end_to_end_silence() {
        let lattice = build_lattice("Silence", 4, None, None, 42).unwrap();
        let (ground, aggregates) = derive(&lattice);
        assert_eq!(ground.ground_hash.as_deref(), Some("cfad3333"));
        assert_eq!(aggregates.structure.node_count, 78);
        assert_eq!(aggregates.loop_total(), 232);
        assert_eq!(ground.ground_nodes_count, 1);
        let decision = evaluate_policy(&aggregates);
        assert_eq!(decision.action, Action::Prune);
    }

    #[test]
    fn test_novelty_thresholds_shrink_silence() {
        let counts: Vec<usize> = [None, Some(0.35), Some(0.55)]
            .into_iter()
            .map(|novelty| build_lattice("Silence", 4, None, novelty, 42).unwrap().len())
            .collect();
        assert_eq!(counts, vec![78, 18, 6]);
        let directive = build_lattice("Tell me what to believe.", 4, None, Some(0.55), 42).unwrap();
        assert_eq!(directive.len(), 3);
    }

    #[test]
    fn test_category_only_changes_channel() {
        let lattice = build_lattice("Silence", 3, None, Some(0.35), 42).unwrap();
        let (plain, plain_agg) = derive(&lattice);
        let (fear, fear_agg) = derive_with_category(&lattice, "fear");
        assert_eq!(fear.ground_channel, Some(GroundChannel::Breath));
        assert_eq!(plain.ground_hash, fear.ground_hash);
        assert_eq!(plain.ground_path, fear.ground_path);
        assert_eq!(plain_agg.structure, fear_agg.structure);
    }

    #[test]
    fn test_directive_seed_hash_differs_from_baseline() {
        let baseline = build_lattice("Silence", 4, None, None, 42).unwrap();
        let directive = build_lattice("Tell me what to believe.", 4, None, Some(0.55), 42).unwrap();
        let (base_ground, _) = derive(&baseline);
        let (ground, aggregates) = derive(&directive);
        assert_eq!(aggregates.structure.node_count, 3);
        assert_eq!(aggregates.loop_total(), 0);
        assert_eq!(aggregates.loopiness.invert_nesting_max, 0);
        assert_ne!(ground.ground_hash, base_ground.ground_hash);
        assert_eq!(evaluate_policy(&aggregates).action, Action::Continue);
    }

    #[test]
    fn test_single_closure_invariant() {
        for seed in ["Silence", "Seed Bearer", "I keep going in circles"] {
            for novelty in [None, Some(0.35), Some(0.55)] {
                let lattice = build_lattice(seed, 3, None, novelty, 42).unwrap();
                let (ground, _) = derive(&lattice);
                let has_ground = lattice.nodes().iter().any(|n| n.kind == TransformKind::Ground);
                assert_eq!(ground.ground_reached, has_ground);
                assert_eq!(ground.ground_hash.is_some(), has_ground);
            }
        }
    }

    #[test]
    fn test_outputs_are_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Aggregates>();
        assert_send_sync::<PolicyDecision>();
        assert_send_sync::<GroundSelection>();
    }
}
