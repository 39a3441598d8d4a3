//! Governance policy: thresholds, evaluator and the public-safe record

mod evaluator;
mod record;
mod thresholds;

pub use evaluator::{
    Action, InputValue, PolicyDecision, PolicyEvaluator, PolicyInput, PolicySignals, ReasonCode,
};
pub use record::{PolicyRecord, DEFAULT_MODE, DEFAULT_NOTES, DEFAULT_REDACTIONS, POLICY_VERSION};
pub use thresholds::PolicyThresholds;
