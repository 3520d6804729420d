//! Canonical, index-normalized representation of a 1-safe place/transition net.
//!
//! The normalizer consumes the three collections produced by the PNML layer
//! (place id with its initial token count, transition ids, ordered arcs) and
//! assigns every place an index `0..place_count` by sorted identifier. All
//! downstream analyses work exclusively with these indices.

use std::collections::{BTreeSet, HashMap};

use crate::xml_parsing::pnml::ParsedNet;

/// A transition with its pre-set and post-set as place-index sets.
///
/// The sets are ordered so that iteration over them is deterministic, which
/// keeps generated constraint systems and BDDs stable between runs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transition {
    id: String,
    pre: BTreeSet<usize>,
    post: BTreeSet<usize>,
}

impl Transition {
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Input places: every one of them must hold a token for the transition
    /// to be enabled.
    pub fn pre(&self) -> &BTreeSet<usize> {
        &self.pre
    }

    /// Output places, including self-looped ones.
    pub fn post(&self) -> &BTreeSet<usize> {
        &self.post
    }

    /// Output places that are not also inputs. Under the 1-safe firing rule,
    /// all of these must be empty for the transition to be enabled.
    pub fn pure_outputs(&self) -> impl Iterator<Item = usize> + '_ {
        self.post.difference(&self.pre).copied()
    }

    /// Input places that are not also outputs; firing empties them.
    pub fn consumed(&self) -> impl Iterator<Item = usize> + '_ {
        self.pre.difference(&self.post).copied()
    }
}

/// An immutable 1-safe Petri net with index-normalized places and transitions.
#[derive(Clone, Debug)]
pub struct PetriNet {
    place_ids: Vec<String>,
    place_index: HashMap<String, usize>,
    transitions: Vec<Transition>,
    initial_marking: Vec<bool>,
}

impl PetriNet {
    /// Build a net from parser output: places with initial token counts,
    /// transition ids, and the ordered arc list.
    ///
    /// Places are indexed by sorted id, transitions are sorted by id as well.
    /// An arc contributes to a pre-set when it runs place to transition and to
    /// a post-set when it runs transition to place; arcs whose endpoints are
    /// not one of each kind are silently skipped here, since validation is the
    /// parser's responsibility. Token counts above one are clamped to one,
    /// matching the 1-safe reading of the input.
    pub fn new<P, T, A>(places: P, transitions: T, arcs: A) -> PetriNet
    where
        P: IntoIterator<Item = (String, u64)>,
        T: IntoIterator<Item = String>,
        A: IntoIterator<Item = (String, String)>,
    {
        let mut places = places.into_iter().collect::<Vec<_>>();
        places.sort_by(|a, b| a.0.cmp(&b.0));

        let place_ids = places.iter().map(|(id, _)| id.clone()).collect::<Vec<_>>();
        let place_index = place_ids
            .iter()
            .enumerate()
            .map(|(index, id)| (id.clone(), index))
            .collect::<HashMap<_, _>>();
        let initial_marking = places.iter().map(|(_, tokens)| *tokens > 0).collect();

        let mut transition_ids = transitions.into_iter().collect::<Vec<_>>();
        transition_ids.sort();
        let transition_index = transition_ids
            .iter()
            .enumerate()
            .map(|(index, id)| (id.clone(), index))
            .collect::<HashMap<_, _>>();
        let mut transitions = transition_ids
            .into_iter()
            .map(|id| Transition {
                id,
                pre: BTreeSet::new(),
                post: BTreeSet::new(),
            })
            .collect::<Vec<_>>();

        for (source, target) in arcs {
            if let (Some(&place), Some(&transition)) =
                (place_index.get(&source), transition_index.get(&target))
            {
                transitions[transition].pre.insert(place);
            } else if let (Some(&transition), Some(&place)) =
                (transition_index.get(&source), place_index.get(&target))
            {
                transitions[transition].post.insert(place);
            }
        }

        PetriNet {
            place_ids,
            place_index,
            transitions,
            initial_marking,
        }
    }

    pub fn place_count(&self) -> usize {
        self.place_ids.len()
    }

    /// Place identifiers in index order.
    pub fn place_ids(&self) -> &[String] {
        &self.place_ids
    }

    pub fn place_index(&self, id: &str) -> Option<usize> {
        self.place_index.get(id).copied()
    }

    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }

    /// The initial marking in tuple form, over sorted place indices.
    pub fn initial_marking(&self) -> &[bool] {
        &self.initial_marking
    }

    /// The initial marking in bitmask form.
    pub fn initial_mask(&self) -> u64 {
        self.marking_to_mask(&self.initial_marking)
    }

    /// Pack a tuple marking into a bitmask, bit `i` holding the token of
    /// place `i`.
    ///
    /// # Panics
    ///
    /// Panics if the net has more than 64 places or if the tuple length does
    /// not match the place count; both are programmer errors.
    pub fn marking_to_mask(&self, marking: &[bool]) -> u64 {
        assert!(
            self.place_count() <= 64,
            "bitmask markings support at most 64 places"
        );
        assert_eq!(marking.len(), self.place_count());
        marking
            .iter()
            .enumerate()
            .filter(|(_, &bit)| bit)
            .fold(0u64, |mask, (place, _)| mask | (1 << place))
    }

    /// Unpack a bitmask marking into tuple form.
    pub fn mask_to_marking(&self, mask: u64) -> Vec<bool> {
        assert!(
            self.place_count() <= 64,
            "bitmask markings support at most 64 places"
        );
        (0..self.place_count())
            .map(|place| mask & (1 << place) != 0)
            .collect()
    }

    /// The incidence matrix `C`, indexed `[place][transition]`.
    ///
    /// `C[p][t]` is `+1` when `t` produces into `p`, `-1` when it consumes
    /// from `p`, and `0` otherwise; self-looped places contribute `0`, which
    /// is what makes the state equation blind to read arcs.
    pub fn incidence(&self) -> Vec<Vec<i64>> {
        let mut matrix = vec![vec![0i64; self.transitions.len()]; self.place_count()];
        for (t, transition) in self.transitions.iter().enumerate() {
            for place in transition.consumed() {
                matrix[place][t] -= 1;
            }
            for place in transition.pure_outputs() {
                matrix[place][t] += 1;
            }
        }
        matrix
    }
}

impl From<ParsedNet> for PetriNet {
    fn from(parsed: ParsedNet) -> PetriNet {
        PetriNet::new(parsed.places, parsed.transitions, parsed.arcs)
    }
}
