//! # DFA Compiler
//!
//! Lazy subset construction over the pooled NFA.
//!
//! ## Overview
//!
//! A DFA state is identified by its epsilon-closed subset of NFA nodes,
//! kept sorted and deduplicated. States are hash-consed: interning an equal
//! subset always yields the same [`StateId`], so a state's accept code can
//! never change once computed.
//!
//! States materialize on demand while scanning. Each state carries a
//! 128-entry transition table filled lazily for ASCII input; characters
//! above ASCII recompute the move every time. The `FAIL` state is the
//! absence of a transition, never a panic.

use super::nfa::{Accept, Edge, NodeId, NodePool};
use ahash::RandomState;
use hashbrown::HashMap;
use smallvec::SmallVec;

/// Sorted, deduplicated set of NFA node ids; the identity of a DFA state
pub type Subset = SmallVec<[NodeId; 8]>;

/// Index of a materialized DFA state
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct StateId(u32);

impl StateId {
    const fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Debug for StateId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "StateId({})", self.0)
    }
}

/// Lazily computed transition slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Trans {
    Unknown,
    Fail,
    Goto(StateId),
}

/// One materialized DFA state
struct DfaState {
    subset: Subset,
    accept: Option<Accept>,
    ascii: [Trans; 128],
}

/// The subset-construction automaton. Owns the NFA pool it was built from;
/// grows new states and transition entries as unseen input is scanned.
pub struct Dfa {
    pool: NodePool,
    states: Vec<DfaState>,
    memo: HashMap<Subset, StateId, RandomState>,
    start: StateId,
}

impl Dfa {
    /// Build over `pool` with the start state closed from `nfa_start`
    pub(crate) fn new(pool: NodePool, nfa_start: NodeId) -> Self {
        let mut dfa = Self {
            pool,
            states: Vec::new(),
            memo: HashMap::default(),
            start: StateId(0),
        };
        let mut seed = Subset::new();
        seed.push(nfa_start);
        dfa.start = dfa.intern_state(seed);
        dfa
    }

    #[must_use]
    pub const fn start(&self) -> StateId {
        self.start
    }

    /// The state's accept, resolved when the state was interned
    #[must_use]
    pub fn accept(&self, state: StateId) -> Option<Accept> {
        self.states[state.index()].accept
    }

    /// Number of states materialized so far
    #[must_use]
    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    /// Live nodes in the underlying NFA
    #[must_use]
    pub fn nfa_node_count(&self) -> usize {
        self.pool.live_nodes()
    }

    /// One transition; `None` is the FAIL state.
    ///
    /// ASCII moves are cached per state on first computation; wider
    /// characters go through the general path every time.
    pub fn step(&mut self, state: StateId, ch: char) -> Option<StateId> {
        let b = ch as u32;
        if b < 128 {
            match self.states[state.index()].ascii[b as usize] {
                Trans::Goto(next) => Some(next),
                Trans::Fail => None,
                Trans::Unknown => {
                    let next = self.compute_step(state, ch);
                    self.states[state.index()].ascii[b as usize] = match next {
                        Some(id) => Trans::Goto(id),
                        None => Trans::Fail,
                    };
                    next
                }
            }
        } else {
            self.compute_step(state, ch)
        }
    }

    /// The move set for `ch` out of `state`, interned
    fn compute_step(&mut self, state: StateId, ch: char) -> Option<StateId> {
        let mut moved = Subset::new();
        for &id in &self.states[state.index()].subset {
            let node = self.pool[id];
            if node.edge.matches(ch)
                && let Some(next) = node.next
            {
                moved.push(next);
            }
        }
        if moved.is_empty() {
            return None;
        }
        Some(self.intern_state(moved))
    }

    /// Epsilon-close `subset` and return its canonical state, materializing
    /// one if the closed subset is new
    fn intern_state(&mut self, mut subset: Subset) -> StateId {
        let accept = epsilon_closure(&self.pool, &mut subset);
        subset.sort_unstable();
        subset.dedup();

        if let Some(&id) = self.memo.get(&subset) {
            return id;
        }
        let id = StateId(u32::try_from(self.states.len()).unwrap_or(u32::MAX));
        self.memo.insert(subset.clone(), id);
        self.states.push(DfaState {
            subset,
            accept,
            ascii: [Trans::Unknown; 128],
        });
        id
    }
}

impl std::fmt::Debug for Dfa {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dfa")
            .field("states", &self.states.len())
            .field("nfa_nodes", &self.pool.live_nodes())
            .finish()
    }
}

/// Expand `subset` in place with every node reachable over epsilon edges.
///
/// Returns the winning accept among accepting nodes seen: the one with the
/// lowest rule sequence number, i.e. the earliest-declared rule. The walk
/// order does not matter; the result is a set plus a minimum.
pub(crate) fn epsilon_closure(pool: &NodePool, subset: &mut Subset) -> Option<Accept> {
    let mut visited = vec![false; pool.len()];
    let mut accept: Option<Accept> = None;
    let mut i = 0;

    while i < subset.len() {
        let id = subset[i];
        i += 1;
        if visited[id.index()] {
            continue;
        }
        visited[id.index()] = true;

        let node = pool[id];
        if let Some(found) = node.accept {
            accept = match accept {
                Some(best) if best.rule <= found.rule => Some(best),
                _ => Some(found),
            };
        }
        if matches!(node.edge, Edge::Epsilon) {
            if let Some(next) = node.next {
                subset.push(next);
            }
            if let Some(next2) = node.next2 {
                subset.push(next2);
            }
        }
    }
    accept
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::nfa::CharSet;
    use crate::lexer::TokenCode;

    fn accept(rule: u32, code: u32) -> Accept {
        Accept {
            rule,
            code: TokenCode::new(code),
        }
    }

    /// One rule: the fragment's end accepts, an epsilon spine node in front
    fn single_rule(pool: &mut NodePool, f: crate::lexer::nfa::Fragment, acc: Accept) -> NodeId {
        pool[f.end].accept = Some(acc);
        let spine = pool.new_node();
        pool[spine].next = Some(f.start);
        spine
    }

    #[test]
    fn test_single_char_rule() {
        let mut pool = NodePool::new();
        let f = pool.leaf_char('a');
        let start = single_rule(&mut pool, f, accept(0, 1));
        let mut dfa = Dfa::new(pool, start);

        let s0 = dfa.start();
        assert_eq!(dfa.accept(s0), None, "nothing accepted before consuming");

        let s1 = dfa.step(s0, 'a').unwrap();
        assert_eq!(dfa.accept(s1), Some(accept(0, 1)));

        assert_eq!(dfa.step(s0, 'b'), None);
        assert_eq!(dfa.step(s1, 'a'), None, "rule matches exactly one 'a'");
    }

    #[test]
    fn test_closure_reaches_through_epsilons() {
        // a* : start closure must already contain the accept
        let mut pool = NodePool::new();
        let inner = pool.leaf_char('a');
        let f = pool.star(inner);
        let start = single_rule(&mut pool, f, accept(0, 2));
        let mut dfa = Dfa::new(pool, start);

        let s0 = dfa.start();
        assert_eq!(dfa.accept(s0), Some(accept(0, 2)), "star accepts empty");

        let s1 = dfa.step(s0, 'a').unwrap();
        assert_eq!(dfa.accept(s1), Some(accept(0, 2)));
        let s2 = dfa.step(s1, 'a').unwrap();
        assert_eq!(s1, s2, "looping lands in the interned same state");
    }

    #[test]
    fn test_accept_priority_prefers_earliest_rule() {
        // Rule 0 carries the larger code; it must still win the tie.
        let mut pool = NodePool::new();
        let f0 = pool.leaf_char('a');
        pool[f0.end].accept = Some(accept(0, 9));
        let f1 = pool.leaf_char('a');
        pool[f1.end].accept = Some(accept(1, 1));

        let t1 = pool.new_node();
        pool[t1].next = Some(f1.start);
        let t0 = pool.new_node();
        pool[t0].next = Some(f0.start);
        pool[t0].next2 = Some(t1);

        let mut dfa = Dfa::new(pool, t0);
        let s1 = dfa.step(dfa.start(), 'a').unwrap();
        assert_eq!(dfa.accept(s1), Some(accept(0, 9)));
    }

    #[test]
    fn test_hash_consing_is_stable() {
        // a|b unfolded: both paths join, so stepping on 'a' and 'b' reaches
        // the same closed subset and must intern one state.
        let mut pool = NodePool::new();
        let fa = pool.leaf_char('a');
        let fb = pool.leaf_char('b');
        let f = pool.alternate(fa, fb);
        let start = single_rule(&mut pool, f, accept(0, 1));
        let mut dfa = Dfa::new(pool, start);

        let s_a = dfa.step(dfa.start(), 'a').unwrap();
        let s_b = dfa.step(dfa.start(), 'b').unwrap();
        assert_eq!(s_a, s_b);
        assert_eq!(dfa.state_count(), 2);
        assert_eq!(dfa.accept(s_a), Some(accept(0, 1)));
    }

    #[test]
    fn test_cached_and_recomputed_steps_agree() {
        let mut pool = NodePool::new();
        let f = pool.leaf_char('x');
        let start = single_rule(&mut pool, f, accept(0, 1));
        let mut dfa = Dfa::new(pool, start);

        let first = dfa.step(dfa.start(), 'x');
        let second = dfa.step(dfa.start(), 'x');
        assert_eq!(first, second, "cache must agree with computation");

        let miss1 = dfa.step(dfa.start(), 'q');
        let miss2 = dfa.step(dfa.start(), 'q');
        assert_eq!(miss1, None);
        assert_eq!(miss2, None);
    }

    #[test]
    fn test_wide_chars_use_the_general_path() {
        // [^a] accepts anything but 'a', including characters with no slot
        // in the ASCII table
        let mut pool = NodePool::new();
        let f = pool.leaf_class(CharSet::singleton('a'), true);
        let start = single_rule(&mut pool, f, accept(0, 3));
        let mut dfa = Dfa::new(pool, start);

        assert_eq!(dfa.step(dfa.start(), 'a'), None);
        let s = dfa.step(dfa.start(), 'λ').unwrap();
        assert_eq!(dfa.accept(s), Some(accept(0, 3)));
        // Uncached path is deterministic across calls
        assert_eq!(dfa.step(dfa.start(), 'λ'), Some(s));
    }

    #[test]
    fn test_closure_minimum_is_order_independent() {
        let mut pool = NodePool::new();
        let f1 = pool.leaf_char('z');
        pool[f1.end].accept = Some(accept(7, 1));
        let f0 = pool.leaf_char('z');
        pool[f0.end].accept = Some(accept(2, 8));

        // Spine visiting the later-declared rule first
        let t0 = pool.new_node();
        let t1 = pool.new_node();
        pool[t0].next = Some(f1.start);
        pool[t0].next2 = Some(t1);
        pool[t1].next = Some(f0.start);

        let mut subset = Subset::new();
        subset.push(t0);
        assert_eq!(epsilon_closure(&pool, &mut subset), None);

        let mut ends = Subset::new();
        ends.push(f1.end);
        ends.push(f0.end);
        assert_eq!(epsilon_closure(&pool, &mut ends), Some(accept(2, 8)));
    }
}
