//! Public-safe policy record attached to every run record

use serde::{Deserialize, Serialize};

use super::evaluator::PolicyDecision;

pub const POLICY_VERSION: &str = "Law7Gate-1.0";
pub const DEFAULT_MODE: &str = "advisory";
pub const DEFAULT_REDACTIONS: [&str; 5] = [
    "seed_text",
    "node_text",
    "ground_text",
    "user_content",
    "prompt_text",
];
pub const DEFAULT_NOTES: &str = "symbolic_adjudication_clause_20; memory_isolation_request_202508";

/// Versioned wrapper around a decision; `public_safe` is always true
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyRecord {
    pub version: String,
    pub mode: String,
    pub public_safe: bool,
    pub redactions: Vec<String>,
    pub notes: String,
    pub decision: PolicyDecision,
}

impl PolicyRecord {
    pub fn new(decision: PolicyDecision, mode: impl Into<String>) -> Self {
        Self {
            version: POLICY_VERSION.to_string(),
            mode: mode.into(),
            public_safe: true,
            redactions: DEFAULT_REDACTIONS.iter().map(|r| r.to_string()).collect(),
            notes: DEFAULT_NOTES.to_string(),
            decision,
        }
    }

    pub fn advisory(decision: PolicyDecision) -> Self {
        Self::new(decision, DEFAULT_MODE)
    }
}
