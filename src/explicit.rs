//! Explicit forward exploration over bit-packed markings.
//!
//! Every marking is a single `u64` with bit `i` holding the token of place
//! `i`, and every transition is a pair of masks, so firing is three bitwise
//! operations. This explorer is the baseline the symbolic engine is
//! cross-validated against, and the practical choice for small instances.

use std::collections::{HashSet, VecDeque};

use log::debug;

use crate::net::PetriNet;

/// A transition compiled to its input and output bitmasks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MaskedTransition {
    pre: u64,
    post: u64,
}

impl MaskedTransition {
    pub fn pre(&self) -> u64 {
        self.pre
    }

    pub fn post(&self) -> u64 {
        self.post
    }

    /// Fire the transition from `marking`, or return `None` when it is not
    /// enabled there.
    ///
    /// Enabled means every input place is marked and every pure output place
    /// (in `post` but not in `pre`) is empty; producing into an occupied
    /// non-looped place would violate 1-safety, so such firings do not
    /// happen. Self-looped places pass both checks and keep their token.
    pub fn fire(&self, marking: u64) -> Option<u64> {
        if marking & self.pre != self.pre {
            return None;
        }
        let pure_outputs = self.post & !self.pre;
        if marking & pure_outputs != 0 {
            return None;
        }
        Some((marking & !self.pre) | self.post)
    }
}

/// Compile every transition of `net` into mask form, in transition order.
///
/// # Panics
///
/// Panics if the net has more than 64 places.
pub fn masked_transitions(net: &PetriNet) -> Vec<MaskedTransition> {
    assert!(
        net.place_count() <= 64,
        "bitmask exploration supports at most 64 places"
    );
    net.transitions()
        .iter()
        .map(|transition| MaskedTransition {
            pre: transition
                .pre()
                .iter()
                .fold(0u64, |mask, &place| mask | (1 << place)),
            post: transition
                .post()
                .iter()
                .fold(0u64, |mask, &place| mask | (1 << place)),
        })
        .collect()
}

/// The result of a forward exploration: the set of reachable bitmask
/// markings, possibly truncated when a visited-set limit was hit.
#[derive(Clone, Debug)]
pub struct Exploration {
    pub visited: HashSet<u64>,
    pub truncated: bool,
}

impl Exploration {
    pub fn len(&self) -> usize {
        self.visited.len()
    }

    pub fn is_empty(&self) -> bool {
        self.visited.is_empty()
    }

    pub fn contains(&self, marking: u64) -> bool {
        self.visited.contains(&marking)
    }
}

/// Breadth-first exploration of all markings reachable from the initial one.
///
/// `limit` caps the visited-set size; once reached, the partial set is
/// returned with the `truncated` flag set. Truncation is a signaled result,
/// not an error.
pub fn explore(net: &PetriNet, limit: Option<usize>) -> Exploration {
    let transitions = masked_transitions(net);
    let initial = net.initial_mask();

    let mut visited = HashSet::new();
    visited.insert(initial);
    let mut queue = VecDeque::new();
    queue.push_back(initial);

    while let Some(marking) = queue.pop_front() {
        for transition in &transitions {
            if let Some(successor) = transition.fire(marking) {
                if visited.insert(successor) {
                    queue.push_back(successor);
                    if let Some(limit) = limit {
                        if visited.len() >= limit {
                            debug!("exploration truncated at {} markings", visited.len());
                            return Exploration {
                                visited,
                                truncated: true,
                            };
                        }
                    }
                }
            }
        }
    }

    Exploration {
        visited,
        truncated: false,
    }
}
