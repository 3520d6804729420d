//! Weighted maximization: find the reachable marking with the highest
//! weighted token sum.
//!
//! The relaxation maximizes the objective over all state-equation solutions,
//! so candidates arrive in non-increasing objective order; each no-good cut
//! removes a single point without raising the bound of any other, and the
//! first candidate the oracle confirms is therefore the global optimum among
//! reachable markings.

use good_lp::{default_solver, Expression, ProblemVariables, ResolutionError, SolverModel};

use super::{
    extract_marking, no_good_cut, refine, state_equation_constraints, state_equation_vars,
    SearchError, SearchLimits, SearchOutcome,
};
use crate::net::PetriNet;
use crate::symbolic::ReachableStates;

/// A marking together with its weighted token sum.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WeightedMarking {
    pub marking: Vec<bool>,
    pub score: i64,
}

/// Find the reachable marking maximizing `sum_i weights[i] * M_i`.
/// Weights may be negative.
///
/// # Panics
///
/// Panics if `weights` does not have one entry per place.
pub fn maximize(
    net: &PetriNet,
    oracle: &ReachableStates,
    weights: &[i64],
    limits: SearchLimits,
) -> Result<SearchOutcome<WeightedMarking>, SearchError> {
    assert_eq!(weights.len(), net.place_count());
    let outcome = refine(
        |excluded| solve_relaxation(net, weights, excluded),
        oracle,
        limits,
    )?;
    Ok(match outcome {
        SearchOutcome::Found(marking) => {
            let score = weights
                .iter()
                .zip(&marking)
                .filter(|(_, &bit)| bit)
                .map(|(&weight, _)| weight)
                .sum();
            SearchOutcome::Found(WeightedMarking { marking, score })
        }
        SearchOutcome::ProvedAbsent => SearchOutcome::ProvedAbsent,
        SearchOutcome::Inconclusive(reason) => SearchOutcome::Inconclusive(reason),
    })
}

fn solve_relaxation(
    net: &PetriNet,
    weights: &[i64],
    excluded: &[Vec<bool>],
) -> Result<Option<Vec<bool>>, SearchError> {
    let mut variables = ProblemVariables::new();
    let vars = state_equation_vars(&mut variables, net);
    let constraints = state_equation_constraints(net, &vars);

    let objective: Expression = weights
        .iter()
        .zip(&vars.marking)
        .map(|(&weight, &token)| weight as f64 * token)
        .sum();
    let mut model = variables.maximise(objective).using(default_solver);
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
