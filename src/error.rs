//! Error hierarchy for lattice construction and the outer record layers
//!
//! The core (builder, selector, aggregator, policy) only ever returns
//! `Config`. The remaining variants belong to the artifact writers and the
//! record verifier.

use thiserror::Error;

/// Root error type for all EchoLattice failures
#[derive(Error, Debug)]
pub enum LatticeError {
    /// Invalid bounds or seed, rejected before any expansion
    #[error("config error: {0}")]
    Config(String),

    /// Two runs with identical inputs disagreed on ground hash or path
    #[error("determinism violation for {key}: {detail}")]
    DeterminismViolation { key: String, detail: String },

    /// A run record does not match the documented shape
    #[error("schema error: {0}")]
    Schema(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type LatticeResult<T> = Result<T, LatticeError>;
