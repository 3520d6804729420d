//! Small example nets shared by the test modules.
//!
//! Each constructor documents its reachable markings, so tests can assert
//! against them without re-deriving the state space by hand.

use crate::net::PetriNet;

fn build(places: &[(&str, u64)], transitions: &[&str], arcs: &[(&str, &str)]) -> PetriNet {
    PetriNet::new(
        places
            .iter()
            .map(|(id, tokens)| (id.to_string(), *tokens)),
        transitions.iter().map(|id| id.to_string()),
        arcs.iter()
            .map(|(source, target)| (source.to_string(), target.to_string())),
    )
}

/// One marked place `p0` and one transition consuming it.
/// Reachable markings: `{p0}` and the empty one; the latter is dead.
pub fn single_consumer() -> PetriNet {
    build(&[("p0", 1)], &["t0"], &[("p0", "t0")])
}

/// A transition with no inputs producing into `p0`; `p1` is isolated.
/// The producer fires exactly once under 1-safety, so the reachable
/// markings are the empty one and `{p0}`.
pub fn source_transition() -> PetriNet {
    build(&[("p0", 0), ("p1", 0)], &["t0"], &[("t0", "p0")])
}

/// Two processes competing for one resource.
/// Place order: a_crit, a_idle, b_crit, b_idle, resource.
/// Reachable markings: both idle, A critical, B critical.
pub fn mutex() -> PetriNet {
    build(
        &[
            ("resource", 1),
            ("a_idle", 1),
            ("b_idle", 1),
            ("a_crit", 0),
            ("b_crit", 0),
        ],
        &["a_enter", "a_exit", "b_enter", "b_exit"],
        &[
            ("resource", "a_enter"),
            ("a_idle", "a_enter"),
            ("a_enter", "a_crit"),
            ("a_crit", "a_exit"),
            ("a_exit", "resource"),
            ("a_exit", "a_idle"),
            ("resource", "b_enter"),
            ("b_idle", "b_enter"),
            ("b_enter", "b_crit"),
            ("b_crit", "b_exit"),
            ("b_exit", "resource"),
            ("b_exit", "b_idle"),
        ],
    )
}

/// Two philosophers who each grab their left fork and only return it after
/// eating with both. Place order: fork_0, fork_1, hold_0, hold_1.
/// Reachable markings: both forks free, one philosopher holding, and the
/// dead marking where each holds one fork.
pub fn two_philosophers() -> PetriNet {
    build(
        &[("fork_0", 1), ("fork_1", 1), ("hold_0", 0), ("hold_1", 0)],
        &["take_0", "take_1", "eat_0", "eat_1"],
        &[
            ("fork_0", "take_0"),
            ("take_0", "hold_0"),
            ("fork_1", "take_1"),
            ("take_1", "hold_1"),
            ("hold_0", "eat_0"),
            ("fork_1", "eat_0"),
            ("eat_0", "fork_0"),
            ("eat_0", "fork_1"),
            ("hold_1", "eat_1"),
            ("fork_0", "eat_1"),
            ("eat_1", "fork_0"),
            ("eat_1", "fork_1"),
        ],
    )
}

/// Two independent components, each a marked place with a self-loop
/// transition. The initial marking is the only reachable one.
pub fn disconnected_self_loops() -> PetriNet {
    build(
        &[("a", 1), ("b", 1)],
        &["ta", "tb"],
        &[("a", "ta"), ("ta", "a"), ("b", "tb"), ("tb", "b")],
    )
}

/// Two independent consumer components; each contributes two markings, so
/// four markings are reachable in total.
/// Place order: p0, p1, q0, q1.
pub fn disconnected_consumers() -> PetriNet {
    build(
        &[("p0", 1), ("p1", 1), ("q0", 0), ("q1", 0)],
        &["t0", "t1"],
        &[("p0", "t0"), ("t0", "q0"), ("p1", "t1"), ("t1", "q1")],
    )
}

/// One transition forking a token into two places; `p3` stays unmarked.
/// Place order: p0, p1, p2, p3. Reachable: `{p0}` and `{p1, p2}`.
pub fn weighted_fork() -> PetriNet {
    build(
        &[("p0", 1), ("p1", 0), ("p2", 0), ("p3", 0)],
        &["t0"],
        &[("p0", "t0"), ("t0", "p1"), ("t0", "p2")],
    )
}

/// A transition self-looping on `a` and `b` while producing into `c`.
/// `b` is never marked, so nothing ever fires; but the self-loops vanish
/// from the incidence matrix, and the state equation wrongly admits the
/// marking `{a, c}`. Place order: a, b, c.
pub fn blocked_self_loop() -> PetriNet {
    build(
        &[("a", 1), ("b", 0), ("c", 0)],
        &["t0"],
        &[
            ("a", "t0"),
            ("b", "t0"),
            ("t0", "a"),
            ("t0", "b"),
            ("t0", "c"),
        ],
    )
}
