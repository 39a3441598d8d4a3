//! Ground: closing-node selection, channel mapping and content hashing

mod channel;
mod selector;

pub use channel::GroundChannel;
pub use selector::{ground_hash, GroundSelection, GroundSelector};
