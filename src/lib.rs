//! Analysis toolkit for 1-safe place/transition Petri nets.
//!
//! Three coupled analyses share one net representation:
//!
//! - [explicit::explore] enumerates reachable markings as packed bitmasks,
//! - [symbolic::reachable_states] computes the same set as a BDD through a
//!   forward-image fixed point,
//! - [search::deadlock::find_deadlock] and [search::maximize::maximize]
//!   answer reachability queries by alternating an integer-programming
//!   relaxation of the state equation with the symbolic set as the exact
//!   membership oracle.
//!
//! Nets enter either programmatically through [PetriNet::new] or from PNML
//! documents via [read_pnml].

pub mod explicit;
pub mod net;
pub mod search;
pub mod symbolic;
pub mod test_utils;
pub mod xml_parsing;

pub use explicit::{explore, Exploration, MaskedTransition};
pub use net::{PetriNet, Transition};
pub use search::deadlock::find_deadlock;
pub use search::maximize::{maximize, WeightedMarking};
pub use search::{SearchError, SearchLimits, SearchOutcome, StopReason};
pub use symbolic::{reachable_states, FixedPointLimits, MarkingEncoding, ReachableStates, SymbolicStats};
pub use xml_parsing::{read_pnml, read_pnml_file, ParsedNet, PnmlError, ValidationIssue};
