//! LatticeConfig: the immutable bounds of a single run
//!
//! Depth and branching are signed so that out-of-range values coming from
//! callers are rejected by `validate()` instead of wrapping silently.

use serde::{Deserialize, Serialize};

use crate::error::{LatticeError, LatticeResult};

/// Bounds and seeding for one lattice build
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatticeConfig {
    /// Maximum node depth (root is depth 0). Default: 3.
    pub depth_cap: i64,
    /// Maximum children per node, `None` = unrestricted.
    pub branching_cap: Option<i64>,
    /// Minimum novelty for a candidate to be admitted, `None` = gating off.
    pub novelty_threshold: Option<f64>,
    /// Seed for sibling admission order under a branching cap.
    pub rng_seed: u64,
}

impl Default for LatticeConfig {
    fn default() -> Self {
        Self {
            depth_cap: 3,
            branching_cap: None,
            novelty_threshold: None,
            rng_seed: 0,
        }
    }
}

impl LatticeConfig {
    pub fn new(
        depth_cap: i64,
        branching_cap: Option<i64>,
        novelty_threshold: Option<f64>,
        rng_seed: u64,
    ) -> Self {
        Self {
            depth_cap,
            branching_cap,
            novelty_threshold,
            rng_seed,
        }
    }

    /// Validate configuration parameters.
    pub fn validate(&self) -> LatticeResult<()> {
        if self.depth_cap < 0 {
            return Err(LatticeError::Config(format!(
                "depth_cap must be >= 0, got {}",
                self.depth_cap
            )));
        }
        if let Some(cap) = self.branching_cap {
            if cap < 1 {
                return Err(LatticeError::Config(format!(
                    "branching_cap must be >= 1 when set, got {cap}"
                )));
            }
        }
        if let Some(threshold) = self.novelty_threshold {
            if !threshold.is_finite() || !(0.0..=1.0).contains(&threshold) {
                return Err(LatticeError::Config(format!(
                    "novelty_threshold must be in [0, 1], got {threshold}"
                )));
            }
        }
        Ok(())
    }

    /// Depth cap as an unsigned bound. Only meaningful after `validate()`.
    pub fn depth_limit(&self) -> usize {
        self.depth_cap.max(0) as usize
    }

    /// Branching cap as an unsigned bound. Only meaningful after `validate()`.
    pub fn branching_limit(&self) -> Option<usize> {
        self.branching_cap.map(|cap| cap.max(1) as usize)
    }

    pub fn gating_enabled(&self) -> bool {
        self.novelty_threshold.is_some()
    }

    /// Load from JSON string.
    pub fn from_json(json: &str) -> LatticeResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| LatticeError::Config(format!("JSON parse error: {e}")))
    }
}
