//! Symbolic encoding of markings into BDD variables.
//!
//! The encoding declares two Boolean variables per place in interleaved
//! order `x_0, y_0, x_1, y_1, ...`: the `x` variables carry the current
//! marking and the `y` variables the next one. Interleaving keeps the nodes
//! of the transition relation small, because each place's current and next
//! bit sit next to each other in the variable order.

use std::ops::Shr;

use biodivine_lib_bdd::{
    Bdd, BddPartialValuation, BddVariable, BddVariableSet, BddVariableSetBuilder,
};
use num_bigint::BigInt;

/// Encoder for markings of a net with a fixed number of places.
///
/// All BDDs handed out by this type live in the variable universe created by
/// [MarkingEncoding::new]; mixing them with BDDs from another encoding is a
/// contract violation.
#[derive(Clone)]
pub struct MarkingEncoding {
    variables: BddVariableSet,
    current: Vec<BddVariable>,
    next: Vec<BddVariable>,
}

impl std::fmt::Debug for MarkingEncoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MarkingEncoding")
            .field("place_count", &self.place_count())
            .finish()
    }
}

impl MarkingEncoding {
    /// Declare `2 * place_count` variables in interleaved current/next order.
    pub fn new(place_count: usize) -> MarkingEncoding {
        let mut builder = BddVariableSetBuilder::new();
        let mut current = Vec::with_capacity(place_count);
        let mut next = Vec::with_capacity(place_count);
        for place in 0..place_count {
            current.push(builder.make_variable(format!("x_{}", place).as_str()));
            next.push(builder.make_variable(format!("y_{}", place).as_str()));
        }
        MarkingEncoding {
            variables: builder.build(),
            current,
            next,
        }
    }

    pub fn place_count(&self) -> usize {
        self.current.len()
    }

    /// The underlying variable universe. Every Boolean operation must go
    /// through [Bdd] values created from this set; there is no way to
    /// compose raw node handles directly, which is the point.
    pub fn variables(&self) -> &BddVariableSet {
        &self.variables
    }

    /// The current-state variable of a place.
    pub fn current_variable(&self, place: usize) -> BddVariable {
        self.current[place]
    }

    /// The next-state variable of a place.
    pub fn next_variable(&self, place: usize) -> BddVariable {
        self.next[place]
    }

    pub fn current_variables(&self) -> &[BddVariable] {
        &self.current
    }

    pub fn next_variables(&self) -> &[BddVariable] {
        &self.next
    }

    /// Encode one marking as a conjunctive clause over the current-state
    /// variables: `x_i` where the place is marked, `!x_i` where it is not.
    pub fn encode_marking(&self, marking: &[bool]) -> Bdd {
        assert_eq!(marking.len(), self.place_count());
        let mut valuation = BddPartialValuation::empty();
        for (&variable, &bit) in self.current.iter().zip(marking) {
            valuation.set_value(variable, bit);
        }
        self.variables.mk_conjunctive_clause(&valuation)
    }

    /// The relation `forall i: x_i <-> y_i`, used to transport a set from
    /// next-state variables back onto current-state ones.
    pub fn current_next_equality(&self) -> Bdd {
        let mut equality = self.variables.mk_true();
        for place in 0..self.place_count() {
            let current = self.variables.mk_var(self.current[place]);
            let next = self.variables.mk_var(self.next[place]);
            equality = equality.and(&current.iff(&next));
        }
        equality
    }

    /// Exact number of markings in a set over current-state variables.
    ///
    /// The BDD cardinality counts valuations of all `2n` variables; a set
    /// that does not constrain the next-state variables is therefore counted
    /// `2^n` times, and shifting right by `n` recovers the marking count.
    pub fn state_count(&self, set: &Bdd) -> BigInt {
        set.exact_cardinality().shr(self.place_count())
    }

    /// Approximate marking count, for progress reporting.
    pub fn approx_state_count(&self, set: &Bdd) -> f64 {
        set.cardinality() / 2.0f64.powi(self.place_count() as i32)
    }
}
