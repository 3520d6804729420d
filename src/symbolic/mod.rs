//! Fully symbolic reachability over BDD-encoded marking sets.

pub mod encoding;
pub mod reachability;

pub use encoding::MarkingEncoding;
pub use reachability::{reachable_states, FixedPointLimits, ReachableStates, SymbolicStats};
