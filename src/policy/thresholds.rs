//! Policy thresholds with defaults and validation

use serde::{Deserialize, Serialize};

use crate::error::{LatticeError, LatticeResult};

/// Cut-offs for PRUNE and GROUND_NOW signals
///
/// Keys serialize in upper snake case so a partial JSON object overrides
/// only the thresholds it names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", default, deny_unknown_fields)]
pub struct PolicyThresholds {
    pub loop_total_prune: u64,
    pub loop_total_ground: u64,
    pub invert_nest_prune: u64,
    pub invert_nest_ground: u64,
    pub dedup_prune: f64,
    pub dedup_ground: f64,
}

impl Default for PolicyThresholds {
    fn default() -> Self {
        Self {
            loop_total_prune: 6,
            loop_total_ground: 10,
            invert_nest_prune: 1,
            invert_nest_ground: 2,
            dedup_prune: 0.25,
            dedup_ground: 0.40,
        }
    }
}

impl PolicyThresholds {
    /// Ground-level thresholds divide the severity ratios, so they must be positive.
    pub fn validate(&self) -> LatticeResult<()> {
        if self.loop_total_ground == 0 || self.invert_nest_ground == 0 {
            return Err(LatticeError::Config(
                "ground-level count thresholds must be >= 1".to_string(),
            ));
        }
        for (name, value) in [("DEDUP_PRUNE", self.dedup_prune), ("DEDUP_GROUND", self.dedup_ground)] {
            if !value.is_finite() || value <= 0.0 || value > 1.0 {
                return Err(LatticeError::Config(format!(
                    "{name} must be in (0, 1], got {value}"
                )));
            }
        }
        if self.loop_total_prune > self.loop_total_ground
            || self.invert_nest_prune > self.invert_nest_ground
            || self.dedup_prune > self.dedup_ground
        {
            return Err(LatticeError::Config(
                "prune thresholds must not exceed ground thresholds".to_string(),
            ));
        }
        Ok(())
    }

    /// Load from a JSON object, keeping defaults for missing keys.
    pub fn from_json(json: &str) -> LatticeResult<Self> {
        let value: serde_json::Value = serde_json::from_str(json)
            .map_err(|e| LatticeError::Config(format!("JSON parse error: {e}")))?;
        if !value.is_object() {
            return Err(LatticeError::Config(
                "thresholds must be a JSON object".to_string(),
            ));
        }
        let thresholds: Self = serde_json::from_value(value)
            .map_err(|e| LatticeError::Config(format!("invalid thresholds: {e}")))?;
        thresholds.validate()?;
        Ok(thresholds)
    }
}
