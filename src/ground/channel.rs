//! Ground channels: the closing modality attached to a Ground selection

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Fixed set of closing modalities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroundChannel {
    Writing,
    Breath,
    Movement,
    Social,
    Environment,
}

impl GroundChannel {
    /// Enum order; the seed fallback indexes into this table.
    pub const ALL: [GroundChannel; 5] = [
        GroundChannel::Writing,
        GroundChannel::Breath,
        GroundChannel::Movement,
        GroundChannel::Social,
        GroundChannel::Environment,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            GroundChannel::Writing => "writing",
            GroundChannel::Breath => "breath",
            GroundChannel::Movement => "movement",
            GroundChannel::Social => "social",
            GroundChannel::Environment => "environment",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == name)
    }

    /// Channel for a known case category, case-insensitive.
    pub fn from_category(category: &str) -> Option<Self> {
        match category.trim().to_ascii_lowercase().as_str() {
            "loop" | "rumination" => Some(GroundChannel::Movement),
            "fear" | "anxiety" | "somatic" => Some(GroundChannel::Breath),
            "identity" | "reflection" | "symbolic" | "mythic" => Some(GroundChannel::Writing),
            "directive" | "relational" | "social" => Some(GroundChannel::Social),
            "minimal" | "environment" | "sensory" => Some(GroundChannel::Environment),
            _ => None,
        }
    }

    /// Stable fallback derived from the seed text alone.
    pub fn from_seed(seed: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(b"echolattice:channel:v1");
        hasher.update(seed.as_bytes());
        let digest = hasher.finalize();
        Self::ALL[digest[0] as usize % Self::ALL.len()]
    }

    pub fn resolve(seed: &str, category: Option<&str>) -> Self {
        category
            .and_then(Self::from_category)
            .unwrap_or_else(|| Self::from_seed(seed))
    }
}

impl fmt::Display for GroundChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
