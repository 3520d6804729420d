//! Counterexample-guided search over the state-equation relaxation.
//!
//! Both search tasks (deadlock feasibility, weighted maximization) share
//! the same shape: an integer program whose feasible markings satisfy the
//! Petri net state equation `M = M0 + C * sigma`, solved repeatedly against
//! the exact symbolic reachability oracle. The state equation only
//! over-approximates reachability, so a candidate confirmed unreachable is
//! excluded by a no-good cut and the program is solved again. The exclusion
//! list grows monotonically, so the loop terminates after at most `2^|P|`
//! refinements.

pub mod deadlock;
pub mod maximize;

use std::time::{Duration, Instant};

use good_lp::{constraint, variable, Constraint, Expression, ProblemVariables, Solution, Variable};
use log::debug;
use thiserror::Error;

use crate::net::PetriNet;
use crate::symbolic::ReachableStates;

/// Errors of the refinement loop.
#[derive(Debug, Error)]
pub enum SearchError {
    /// The solver reported something other than an optimum or infeasibility;
    /// the current task has no answer.
    #[error("ilp solver failed: {0}")]
    Solver(String),
}

/// Caps for one search task, checked between solver calls. The time budget
/// cannot interrupt a running solve, so a single long solve may overshoot it.
#[derive(Clone, Copy, Debug, Default)]
pub struct SearchLimits {
    /// Maximum number of relaxation solves.
    pub max_attempts: Option<usize>,
    /// Wall-clock budget for the whole refinement loop.
    pub time_limit: Option<Duration>,
}

/// Why an inconclusive search stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopReason {
    AttemptLimit,
    TimeLimit,
}

/// The answer of a search task. `ProvedAbsent` is a definite negative;
/// `Inconclusive` only says the configured limits ran out first.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SearchOutcome<T> {
    Found(T),
    ProvedAbsent,
    Inconclusive(StopReason),
}

impl<T> SearchOutcome<T> {
    /// The witness, if one was found.
    pub fn found(self) -> Option<T> {
        match self {
            SearchOutcome::Found(witness) => Some(witness),
            _ => None,
        }
    }
}

/// The decision variables shared by both tasks: one binary token variable
/// per place and one non-negative integer firing count per transition.
pub(crate) struct StateEquationVars {
    pub marking: Vec<Variable>,
    pub firing: Vec<Variable>,
}

pub(crate) fn state_equation_vars(
    variables: &mut ProblemVariables,
    net: &PetriNet,
) -> StateEquationVars {
    let marking = (0..net.place_count())
        .map(|_| variables.add(variable().binary()))
        .collect();
    let firing = (0..net.transitions().len())
        .map(|_| variables.add(variable().integer().min(0)))
        .collect();
    StateEquationVars { marking, firing }
}

/// `M_i - sum_j C[i][j] * sigma_j == M0_i` for every place `i`.
pub(crate) fn state_equation_constraints(
    net: &PetriNet,
    vars: &StateEquationVars,
) -> Vec<Constraint> {
    let incidence = net.incidence();
    (0..net.place_count())
        .map(|place| {
            let delta: Expression = incidence[place]
                .iter()
                .enumerate()
                .filter(|(_, &coefficient)| coefficient != 0)
                .map(|(transition, &coefficient)| coefficient as f64 * vars.firing[transition])
                .sum();
            let initial = if net.initial_marking()[place] { 1.0 } else { 0.0 };
            constraint::eq(1.0 * vars.marking[place] - delta, initial)
        })
        .collect()
}

/// The cut `sum_{i in S1} M_i - sum_{i in S0} M_i <= |S1| - 1`, which
/// excludes exactly the `excluded` point and no other.
pub(crate) fn no_good_cut(marking_vars: &[Variable], excluded: &[bool]) -> Constraint {
    let ones = excluded.iter().filter(|&&bit| bit).count();
    let signed_sum: Expression = marking_vars
        .iter()
        .zip(excluded)
        .map(|(&var, &bit)| if bit { 1.0 * var } else { -1.0 * var })
        .sum();
    constraint::leq(signed_sum, ones as f64 - 1.0)
}

/// Read the candidate marking out of a solution.
pub(crate) fn extract_marking(solution: &impl Solution, marking_vars: &[Variable]) -> Vec<bool> {
    marking_vars
        .iter()
        .map(|&var| solution.value(var) > 0.5)
        .collect()
}

/// The shared outer loop: solve the relaxation, confirm the candidate
/// against the oracle, and otherwise exclude it and try again.
///
/// `solve` receives the append-only exclusion list and returns the optimal
/// candidate of the cut-augmented relaxation, or `None` when it has become
/// infeasible.
pub(crate) fn refine<F>(
    mut solve: F,
    oracle: &ReachableStates,
    limits: SearchLimits,
) -> Result<SearchOutcome<Vec<bool>>, SearchError>
where
    F: FnMut(&[Vec<bool>]) -> Result<Option<Vec<bool>>, SearchError>,
{
    let started = Instant::now();
    let mut excluded: Vec<Vec<bool>> = Vec::new();
    let mut attempt = 0;

    loop {
        if let Some(cap) = limits.max_attempts {
            if attempt >= cap {
                return Ok(SearchOutcome::Inconclusive(StopReason::AttemptLimit));
            }
        }
        if let Some(budget) = limits.time_limit {
            if started.elapsed() >= budget {
                return Ok(SearchOutcome::Inconclusive(StopReason::TimeLimit));
            }
        }
        attempt += 1;

        match solve(&excluded)? {
            None => {
                debug!("attempt {}: relaxation infeasible, no witness exists", attempt);
                return Ok(SearchOutcome::ProvedAbsent);
            }
            Some(candidate) => {
                if oracle.contains(&candidate) {
                    debug!("attempt {}: candidate confirmed reachable", attempt);
                    return Ok(SearchOutcome::Found(candidate));
                }
                debug!(
                    "attempt {}: candidate satisfies the state equation but is unreachable",
                    attempt
                );
                excluded.push(candidate);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbolic::{reachable_states, FixedPointLimits};
    use crate::test_utils;
    use good_lp::{default_solver, ResolutionError, SolverModel};

    /// Feasibility check of the state equation with the marking pinned.
    fn state_equation_admits(net: &PetriNet, marking: &[bool]) -> bool {
        let mut variables = ProblemVariables::new();
        let vars = state_equation_vars(&mut variables, net);
        let mut constraints = state_equation_constraints(net, &vars);
        for (place, &bit) in marking.iter().enumerate() {
            let value = if bit { 1.0 } else { 0.0 };
            constraints.push(constraint::eq(1.0 * vars.marking[place], value));
        }
        let objective: Expression = vars.firing.iter().map(|&sigma| 1.0 * sigma).sum();
        let mut model = variables.minimise(objective).using(default_solver);
        for c in constraints {
            model = model.with(c);
        }
        match model.solve() {
            Ok(_) => true,
            Err(ResolutionError::Infeasible) => false,
            Err(other) => panic!("unexpected solver status: {:?}", other),
        }
    }

    #[test]
    fn every_reachable_marking_satisfies_the_state_equation() {
        let net = test_utils::mutex();
        let explicit = crate::explicit::explore(&net, None);
        for &mask in &explicit.visited {
            assert!(state_equation_admits(&net, &net.mask_to_marking(mask)));
        }
    }

    #[test]
    fn cuts_enumerate_the_relaxation_without_repeats() {
        let net = test_utils::two_philosophers();
        let mut excluded: Vec<Vec<bool>> = Vec::new();
        while let Some(candidate) = solve_all_markings(&net, &excluded).unwrap() {
            assert!(
                !excluded.contains(&candidate),
                "cut failed to exclude a candidate"
            );
            excluded.push(candidate);
            assert!(excluded.len() <= 16, "runaway refinement");
        }
        // The philosopher net's relaxation is exact: one token circulates
        // per fork/hand pair, giving four feasible markings.
        assert_eq!(excluded.len(), 4);
    }

    /// A relaxation with no task constraints at all: any state-equation
    /// solution is a candidate.
    fn solve_all_markings(
        net: &PetriNet,
        excluded: &[Vec<bool>],
    ) -> Result<Option<Vec<bool>>, SearchError> {
        let mut variables = ProblemVariables::new();
        let vars = state_equation_vars(&mut variables, net);
        let constraints = state_equation_constraints(net, &vars);
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

    #[test]
    fn reachable_candidate_ends_the_loop() {
        let net = test_utils::single_consumer();
        let oracle = reachable_states(&net, FixedPointLimits::default());
        let outcome = refine(|_| Ok(Some(vec![true])), &oracle, SearchLimits::default());
        assert_eq!(outcome.unwrap().found(), Some(vec![true]));
    }

    #[test]
    fn attempt_limit_stops_an_endless_refinement() {
        let net = test_utils::source_transition();
        let oracle = reachable_states(&net, FixedPointLimits::default());
        // A solver stub that keeps returning the same unreachable candidate.
        let outcome = refine(
            |_| Ok(Some(vec![true, true])),
            &oracle,
            SearchLimits {
                max_attempts: Some(4),
                time_limit: None,
            },
        );
        assert!(matches!(
            outcome,
            Ok(SearchOutcome::Inconclusive(StopReason::AttemptLimit))
        ));
    }

    #[test]
    fn time_limit_reports_inconclusive() {
        let net = test_utils::source_transition();
        let oracle = reachable_states(&net, FixedPointLimits::default());
        let outcome = refine(
            |_| Ok(Some(vec![true, true])),
            &oracle,
            SearchLimits {
                max_attempts: None,
                time_limit: Some(Duration::ZERO),
            },
        );
        assert!(matches!(
            outcome,
            Ok(SearchOutcome::Inconclusive(StopReason::TimeLimit))
        ));
    }
}
