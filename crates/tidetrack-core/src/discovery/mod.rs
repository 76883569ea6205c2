//! Runtime discovery of the timecode address by iterative narrowing

mod clock;
mod engine;

pub use clock::ElapsedClock;
pub use engine::{DiscoveryEngine, DiscoveryOutcome};
