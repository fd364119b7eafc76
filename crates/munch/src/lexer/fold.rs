//! # Alternation Folding
//!
//! Merges runs of single-character alternatives into one class node instead
//! of allocating epsilon split/join structure.
//!
//! ## Overview
//!
//! While every alternative in an `|` chain is a bare single character or an
//! already-merged class, the chain collapses into a single [`Edge::Class`]
//! node. A literal character becomes a one-bit class on its first fold.
//!
//! A class leaf is a `(set, complement)` pair denoting either the set itself
//! or everything outside it. Unioning two such leaves follows the complement
//! algebra:
//!
//! ```text
//!  A |  B  ->   A ∪ B
//! ~A | ~B  -> ~(A ∩ B)
//! ~A |  B  -> ~(A ∖ B)
//!  A | ~B  -> ~(B ∖ A)
//! ```
//!
//! This is an optimization, not a semantic change: folded and unfolded
//! constructions accept identical languages, and folding never uses more
//! nodes than the split construction it replaces.

use super::nfa::{CharSet, Edge, Fragment, NodePool};

/// A one-character class in `(set, complement)` form
pub type ClassLeaf = (CharSet, bool);

/// Does this leaf match `ch`?
#[must_use]
pub const fn leaf_matches(leaf: ClassLeaf, ch: char) -> bool {
    leaf.0.contains(ch) != leaf.1
}

/// Union of two possibly-complemented classes
#[must_use]
pub const fn fold_union(a: ClassLeaf, b: ClassLeaf) -> ClassLeaf {
    match (a.1, b.1) {
        (false, false) => (a.0.union(b.0), false),
        (true, true) => (a.0.intersection(b.0), true),
        (true, false) => (a.0.difference(b.0), true),
        (false, true) => (b.0.difference(a.0), true),
    }
}

/// The class form of a fragment, when it is a bare one-character consumer
/// (entry consumes straight into the end, no second branch).
///
/// Literal characters above `\u{FF}` do not fit a Latin-1 bitset and are
/// never foldable.
#[must_use]
pub fn as_class_leaf(pool: &NodePool, f: Fragment) -> Option<ClassLeaf> {
    let node = pool[f.start];
    if node.next != Some(f.end) || node.next2.is_some() {
        return None;
    }
    match node.edge {
        Edge::Char(ch) if (ch as u32) < 0x100 => Some((CharSet::singleton(ch), false)),
        Edge::Class { set, complement } => Some((set, complement)),
        _ => None,
    }
}

/// Fold `b` into `a` when both are class leaves.
///
/// On success `a`'s consuming node carries the combined class and both of
/// `b`'s slots go back to the pool; returns `false` untouched otherwise.
pub fn try_fold(pool: &mut NodePool, a: Fragment, b: Fragment) -> bool {
    let (Some(la), Some(lb)) = (as_class_leaf(pool, a), as_class_leaf(pool, b)) else {
        return false;
    };
    let (set, complement) = fold_union(la, lb);
    pool[a.start].edge = Edge::Class { set, complement };
    pool.discard(b.start);
    pool.discard(b.end);
    true
}
