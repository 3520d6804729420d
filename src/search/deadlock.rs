//! Deadlock search: find a reachable marking that disables every transition.
//!
//! A transition is disabled either by starvation (some input place empty) or,
//! under 1-safety, by blockage (some pure output place already full). The
//! disjunction is encoded with one binary selector per transition that has
//! pure outputs: `z = 0` enforces the starvation branch through a big-M
//! relaxation of the blockage branch, and vice versa.

use good_lp::{
    constraint, default_solver, variable, Expression, ProblemVariables, ResolutionError,
    SolverModel,
};
use log::debug;

use super::{
    extract_marking, no_good_cut, refine, state_equation_constraints, state_equation_vars,
    SearchError, SearchLimits, SearchOutcome,
};
use crate::net::PetriNet;
use crate::symbolic::ReachableStates;

/// Search for a reachable dead marking of `net`, preferring ones reachable
/// through few firings (the relaxation minimizes the total firing count).
///
/// A transition with an empty pre-set can always fire as far as the token
/// game is concerned, so its presence short-circuits the whole task with a
/// definite "no deadlock exists" before any solver call.
pub fn find_deadlock(
    net: &PetriNet,
    oracle: &ReachableStates,
    limits: SearchLimits,
) -> Result<SearchOutcome<Vec<bool>>, SearchError> {
    if let Some(transition) = net.transitions().iter().find(|t| t.pre().is_empty()) {
        debug!(
            "transition {} has no input places, no dead marking exists",
            transition.id()
        );
        return Ok(SearchOutcome::ProvedAbsent);
    }
    refine(
        |excluded| solve_relaxation(net, excluded),
        oracle,
        limits,
    )
}

/// One solve of the deadlock relaxation with the current exclusion list.
fn solve_relaxation(
    net: &PetriNet,
    excluded: &[Vec<bool>],
) -> Result<Option<Vec<bool>>, SearchError> {
    let mut variables = ProblemVariables::new();
    let vars = state_equation_vars(&mut variables, net);
    let mut constraints = state_equation_constraints(net, &vars);

    for transition in net.transitions() {
        let inputs = transition.pre().len();
        let input_tokens: Expression = transition
            .pre()
            .iter()
            .map(|&place| 1.0 * vars.marking[place])
            .sum();
        let blocked: Vec<usize> = transition.pure_outputs().collect();

        if blocked.is_empty() {
            // Only starvation can disable this transition.
            constraints.push(constraint::leq(input_tokens, inputs as f64 - 1.0));
        } else {
            // Starvation when z = 0, blockage when z = 1.
            let z = variables.add(variable().binary());
            constraints.push(constraint::leq(
                input_tokens - inputs as f64 * z,
                inputs as f64 - 1.0,
            ));
            let blocked_tokens: Expression = blocked
                .iter()
                .map(|&place| 1.0 * vars.marking[place])
                .sum();
            constraints.push(constraint::geq(blocked_tokens - z, 0.0));
        }
    }

    let objective: Expression = vars.firing.iter().map(|&sigma| 1.0 * sigma).sum();
    let mut model = variables.minimise(objective).using(default_solver);
    for c in constraints {
        model = model.with(c);
    }
    for marking in excluded {
        model = model.with(no_good_cut(&vars.marking, marking));
    }

    match model.solve() {
        Ok(solution) => Ok(Some(extract_marking(&solution, &vars.marking))),
        Err(ResolutionError::Infeasible) => Ok(None),
        Err(other) => Err(SearchError::Solver(format!("{:?}", other))),
    }
}

#[cfg(test)]
mod tests {
    use super::find_deadlock;
    use crate::explicit::masked_transitions;
    use crate::search::{SearchLimits, SearchOutcome};
    use crate::symbolic::{reachable_states, FixedPointLimits};
    use crate::test_utils;

    #[test]
    fn consuming_net_deadlocks_on_the_empty_marking() {
        let net = test_utils::single_consumer();
        let oracle = reachable_states(&net, FixedPointLimits::default());
        let marking = find_deadlock(&net, &oracle, SearchLimits::default())
            .unwrap()
            .found()
            .expect("deadlock expected");
        assert_eq!(marking, vec![false]);
    }

    #[test]
    fn source_transition_short_circuits_the_search() {
        let net = test_utils::source_transition();
        let oracle = reachable_states(&net, FixedPointLimits::default());
        let outcome = find_deadlock(&net, &oracle, SearchLimits::default()).unwrap();
        assert_eq!(outcome, SearchOutcome::ProvedAbsent);
    }

    #[test]
    fn mutex_never_deadlocks() {
        let net = test_utils::mutex();
        let oracle = reachable_states(&net, FixedPointLimits::default());
        let outcome = find_deadlock(&net, &oracle, SearchLimits::default()).unwrap();
        assert_eq!(outcome, SearchOutcome::ProvedAbsent);
    }

    #[test]
    fn philosophers_deadlock_holding_one_fork_each() {
        let net = test_utils::two_philosophers();
        let oracle = reachable_states(&net, FixedPointLimits::default());
        let marking = find_deadlock(&net, &oracle, SearchLimits::default())
            .unwrap()
            .found()
            .expect("deadlock expected");
        // hold_0 and hold_1 are marked, both forks are gone
        assert_eq!(marking, vec![false, false, true, true]);

        // the witness is reachable and disables every transition
        assert!(oracle.contains(&marking));
        let mask = net.marking_to_mask(&marking);
        for transition in masked_transitions(&net) {
            assert_eq!(transition.fire(mask), None);
        }
    }

    #[test]
    fn initially_dead_net_returns_the_initial_marking() {
        let net = test_utils::blocked_self_loop();
        let oracle = reachable_states(&net, FixedPointLimits::default());
        let marking = find_deadlock(&net, &oracle, SearchLimits::default())
            .unwrap()
            .found()
            .expect("deadlock expected");
        assert_eq!(marking, vec![true, false, false]);
    }

    #[test]
    fn attempt_cap_is_respected() {
        let net = test_utils::two_philosophers();
        let oracle = reachable_states(&net, FixedPointLimits::default());
        // Zero attempts means the loop may not even solve once.
        let outcome = find_deadlock(
            &net,
            &oracle,
            SearchLimits {
                max_attempts: Some(0),
                time_limit: None,
            },
        )
        .unwrap();
        assert!(matches!(outcome, SearchOutcome::Inconclusive(_)));
    }
}
