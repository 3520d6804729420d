//! Forward symbolic reachability: transition relation construction and the
//! image-based fixed point.
//!
//! The reachable set is computed as the least fixed point of
//! `R := Init | Image(R)` where `Image(S) = (exists x. S & Tr)[y -> x]`.
//! Convergence is detected through the freshly discovered difference
//! becoming empty, which on interned BDDs is a constant-time check.

use std::time::{Duration, Instant};

use biodivine_lib_bdd::Bdd;
use debug_ignore::DebugIgnore;
use log::debug;
use num_bigint::BigInt;

use super::encoding::MarkingEncoding;
use crate::net::{PetriNet, Transition};

/// Caps for the fixed-point computation. Hitting a cap is not an error; the
/// result is returned as-is with [SymbolicStats::converged] left `false`.
#[derive(Clone, Copy, Debug, Default)]
pub struct FixedPointLimits {
    /// Maximum number of image iterations.
    pub max_iterations: Option<usize>,
    /// Maximum node count of the reachable-set BDD.
    pub max_nodes: Option<usize>,
}

/// Observables of one fixed-point run.
#[derive(Clone, Debug)]
pub struct SymbolicStats {
    /// Number of image iterations performed. After iteration `k` the set
    /// holds exactly the markings reachable in at most `k` firings.
    pub iterations: usize,
    /// Largest BDD seen during the run, in nodes.
    pub peak_nodes: usize,
    /// Whether the fixed point was actually reached.
    pub converged: bool,
    pub elapsed: Duration,
}

/// The reachable set together with the encoding that interned it.
///
/// This is the membership oracle consumed by the ILP refinement loop:
/// queries intern temporary nodes but never change the set itself.
#[derive(Clone, Debug)]
pub struct ReachableStates {
    encoding: MarkingEncoding,
    states: DebugIgnore<Bdd>,
    stats: SymbolicStats,
}

impl ReachableStates {
    /// Decide membership of a tuple marking in the reachable set.
    ///
    /// The marking's cube fixes every current-state variable, so the
    /// conjunction with the reachable set is non-empty exactly when the
    /// marking is reachable.
    pub fn contains(&self, marking: &[bool]) -> bool {
        let cube = self.encoding.encode_marking(marking);
        !self.states.and(&cube).is_false()
    }

    /// Exact cardinality of the reachable set.
    pub fn state_count(&self) -> BigInt {
        self.encoding.state_count(&self.states)
    }

    pub fn approx_state_count(&self) -> f64 {
        self.encoding.approx_state_count(&self.states)
    }

    /// The reachable set as a BDD over current-state variables.
    pub fn states(&self) -> &Bdd {
        &self.states.0
    }

    pub fn encoding(&self) -> &MarkingEncoding {
        &self.encoding
    }

    pub fn stats(&self) -> &SymbolicStats {
        &self.stats
    }
}

/// Compute the set of markings reachable from the initial marking of `net`.
pub fn reachable_states(net: &PetriNet, limits: FixedPointLimits) -> ReachableStates {
    let started = Instant::now();
    let encoding = MarkingEncoding::new(net.place_count());
    let relation = transition_relation(&encoding, net);
    let rename = encoding.current_next_equality();
    debug!(
        "transition relation built: {} transitions, {} nodes",
        net.transitions().len(),
        relation.size()
    );

    let mut states = encoding.encode_marking(net.initial_marking());
    let mut peak_nodes = relation.size().max(states.size());
    let mut iterations = 0;
    let mut converged = false;

    loop {
        let iteration_cap_hit = limits
            .max_iterations
            .map(|cap| iterations >= cap)
            .unwrap_or(false);
        let node_cap_hit = limits
            .max_nodes
            .map(|cap| states.size() > cap)
            .unwrap_or(false);
        if iteration_cap_hit || node_cap_hit {
            debug!("fixed point stopped by limit after {} iterations", iterations);
            break;
        }

        iterations += 1;
        let successors = image(&encoding, &relation, &rename, &states);
        let fresh = successors.and_not(&states);
        if fresh.is_false() {
            converged = true;
            break;
        }
        states = states.or(&fresh);
        peak_nodes = peak_nodes.max(states.size());
        debug!(
            "iteration {}: {} nodes, ~{} states",
            iterations,
            states.size(),
            encoding.approx_state_count(&states)
        );
    }

    ReachableStates {
        stats: SymbolicStats {
            iterations,
            peak_nodes,
            converged,
            elapsed: started.elapsed(),
        },
        encoding,
        states: DebugIgnore(states),
    }
}

/// One forward step: all markings reachable by a single firing from `states`.
fn image(encoding: &MarkingEncoding, relation: &Bdd, rename: &Bdd, states: &Bdd) -> Bdd {
    // Successors land on the next-state variables first ...
    let stepped = states.and(relation).exists(encoding.current_variables());
    // ... and are transported back by conjoining x_i <-> y_i and dropping y.
    stepped.and(rename).exists(encoding.next_variables())
}

/// `Tr(x, y)`: the disjunction of the per-transition relations.
fn transition_relation(encoding: &MarkingEncoding, net: &PetriNet) -> Bdd {
    let mut relation = encoding.variables().mk_false();
    for transition in net.transitions() {
        relation = relation.or(&single_transition(encoding, net.place_count(), transition));
    }
    relation
}

/// `Tr_t(x, y)` for a single transition.
///
/// The guard requires every input place marked and every pure output place
/// empty; the latter clause is what keeps the relation 1-safe, since a
/// produce effect into an occupied non-looped place must not be a step.
/// The effect consumes inputs that are not also outputs, produces all
/// outputs (self-loops land here, with the guard already holding `x_i`),
/// and frames every untouched place.
fn single_transition(
    encoding: &MarkingEncoding,
    place_count: usize,
    transition: &Transition,
) -> Bdd {
    let variables = encoding.variables();
    let mut relation = variables.mk_true();

    for &place in transition.pre() {
        relation = relation.and(&variables.mk_var(encoding.current_variable(place)));
    }
    for place in transition.pure_outputs() {
        relation = relation.and(&variables.mk_var(encoding.current_variable(place)).not());
    }

    for place in 0..place_count {
        let next = variables.mk_var(encoding.next_variable(place));
        if transition.pre().contains(&place) && !transition.post().contains(&place) {
            relation = relation.and(&next.not());
        } else if transition.post().contains(&place) {
            relation = relation.and(&next);
        } else {
            let current = variables.mk_var(encoding.current_variable(place));
            relation = relation.and(&current.iff(&next));
        }
    }

    relation
}

#[cfg(test)]
mod tests {
    use super::{reachable_states, FixedPointLimits};
    use crate::explicit::explore;
    use crate::test_utils;
    use num_bigint::BigInt;

    /// The symbolic set and the explicit set must agree marking for marking.
    fn assert_matches_explicit(net: &crate::PetriNet) {
        let explicit = explore(net, None);
        let symbolic = reachable_states(net, FixedPointLimits::default());
        assert!(symbolic.stats().converged);
        assert_eq!(
            symbolic.state_count(),
            BigInt::from(explicit.len()),
            "state counts disagree"
        );
        for mask in 0u64..(1 << net.place_count()) {
            let marking = net.mask_to_marking(mask);
            assert_eq!(
                symbolic.contains(&marking),
                explicit.contains(mask),
                "disagreement on marking {:?}",
                marking
            );
        }
    }

    #[test]
    fn agrees_with_explicit_exploration() {
        assert_matches_explicit(&test_utils::single_consumer());
        assert_matches_explicit(&test_utils::source_transition());
        assert_matches_explicit(&test_utils::mutex());
        assert_matches_explicit(&test_utils::two_philosophers());
        assert_matches_explicit(&test_utils::disconnected_consumers());
        assert_matches_explicit(&test_utils::blocked_self_loop());
    }

    #[test]
    fn relation_forbids_producing_into_occupied_place() {
        // Without the pure-output guard the source transition could fire
        // from the marking it produced, and a third "state" would appear.
        let net = test_utils::source_transition();
        let symbolic = reachable_states(&net, FixedPointLimits::default());
        assert_eq!(symbolic.state_count(), BigInt::from(2));
        assert!(!symbolic.contains(&[true, true]));
    }

    #[test]
    fn self_loop_components_converge_immediately() {
        let net = test_utils::disconnected_self_loops();
        let symbolic = reachable_states(&net, FixedPointLimits::default());
        assert_eq!(symbolic.state_count(), BigInt::from(1));
        // the only image is the initial marking itself
        assert_eq!(symbolic.stats().iterations, 1);
    }

    #[test]
    fn iteration_count_tracks_reachability_depth() {
        // Longest firing sequence in the philosopher net has two steps, so
        // the fixed point needs two growing iterations plus the final check.
        let net = test_utils::two_philosophers();
        let symbolic = reachable_states(&net, FixedPointLimits::default());
        assert_eq!(symbolic.stats().iterations, 3);
    }

    #[test]
    fn iteration_cap_yields_partial_result() {
        let net = test_utils::two_philosophers();
        let capped = reachable_states(
            &net,
            FixedPointLimits {
                max_iterations: Some(1),
                max_nodes: None,
            },
        );
        assert!(!capped.stats().converged);
        assert_eq!(capped.stats().iterations, 1);
        // after one iteration: initial marking plus its two successors
        assert_eq!(capped.state_count(), BigInt::from(3));
    }

    #[test]
    fn cube_intersection_agrees_with_membership() {
        let net = test_utils::mutex();
        let explicit = explore(&net, None);
        let symbolic = reachable_states(&net, FixedPointLimits::default());
        for mask in 0u64..(1 << net.place_count()) {
            let cube = symbolic.encoding().encode_marking(&net.mask_to_marking(mask));
            let non_empty = !symbolic.states().and(&cube).is_false();
            assert_eq!(non_empty, explicit.contains(mask));
        }
    }

    #[test]
    fn stats_report_peak_nodes_and_time() {
        let net = test_utils::mutex();
        let symbolic = reachable_states(&net, FixedPointLimits::default());
        assert!(symbolic.stats().peak_nodes > 0);
        assert!(symbolic.states().size() <= symbolic.stats().peak_nodes);
    }
}
