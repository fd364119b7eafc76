//! # NFA Construction Module
//!
//! Thompson construction over a pooled node arena.
//!
//! ## Overview
//!
//! Automaton nodes live in a [`NodePool`]: a growable array addressed by
//! [`NodeId`] with an explicit free-list, so nodes discarded during
//! construction are reused instead of leaking. Every grammar production
//! yields a [`Fragment`], an entry node plus one dangling blank end node,
//! and compositions splice fragments together:
//!
//! - **Concatenation** copies the second fragment's entry into the first
//!   fragment's end and discards the spare slot.
//! - **Alternation** adds an epsilon split and a join.
//! - **Closures** (`*`, `+`, `?`) wrap the fragment in fresh epsilon nodes.
//!
//! Every composite fragment's entry is a node no edge points at, which is
//! what makes the splice-and-discard in concatenation safe.

use crate::lexer::TokenCode;
use std::fmt;
use std::ops::{Index, IndexMut};

/// Index of a node in its pool
///
/// Cheap to copy and compare. Only valid against the pool that minted it.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(u32);

impl NodeId {
    pub(crate) const fn new(index: usize) -> Self {
        Self(index as u32)
    }

    /// Position in the pool's backing array
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

/// A 256-bit set over the Latin-1 code points.
///
/// Characters above `\u{FF}` are outside every stored set; they can only
/// match a class edge through its complement flag.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct CharSet {
    bits: [u64; 4],
}

impl CharSet {
    /// The set containing no characters
    pub const EMPTY: Self = Self { bits: [0; 4] };

    /// The fixed set an empty class body denotes: code points 0 through space
    #[must_use]
    pub const fn control_and_space() -> Self {
        Self {
            bits: [0x0000_0001_FFFF_FFFF, 0, 0, 0],
        }
    }

    /// The set containing exactly `ch`
    ///
    /// # Panics
    ///
    /// Panics in debug builds if `ch` is above `\u{FF}`.
    #[must_use]
    pub fn singleton(ch: char) -> Self {
        let mut set = Self::EMPTY;
        set.insert(ch);
        set
    }

    /// Add one character. Callers guarantee `ch` is Latin-1.
    pub fn insert(&mut self, ch: char) {
        let b = ch as u32;
        debug_assert!(b < 0x100, "class members are Latin-1");
        self.bits[(b >> 6) as usize] |= 1 << (b & 63);
    }

    /// Add the inclusive range `lo..=hi`. Callers guarantee `lo <= hi` and
    /// both ends Latin-1.
    pub fn insert_range(&mut self, lo: char, hi: char) {
        debug_assert!(lo <= hi);
        for b in lo as u32..=hi as u32 {
            debug_assert!(b < 0x100, "class members are Latin-1");
            self.bits[(b >> 6) as usize] |= 1 << (b & 63);
        }
    }

    #[must_use]
    pub const fn contains(self, ch: char) -> bool {
        let b = ch as u32;
        if b >= 0x100 {
            return false;
        }
        (self.bits[(b >> 6) as usize] >> (b & 63)) & 1 == 1
    }

    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        let (a, b) = (self.bits, other.bits);
        Self {
            bits: [a[0] | b[0], a[1] | b[1], a[2] | b[2], a[3] | b[3]],
        }
    }

    #[must_use]
    pub const fn intersection(self, other: Self) -> Self {
        let (a, b) = (self.bits, other.bits);
        Self {
            bits: [a[0] & b[0], a[1] & b[1], a[2] & b[2], a[3] & b[3]],
        }
    }

    /// Characters in `self` but not in `other`
    #[must_use]
    pub const fn difference(self, other: Self) -> Self {
        let (a, b) = (self.bits, other.bits);
        Self {
            bits: [a[0] & !b[0], a[1] & !b[1], a[2] & !b[2], a[3] & !b[3]],
        }
    }

    /// The Latin-1 complement: every code point below `\u{100}` not in `self`
    #[must_use]
    pub const fn inverted(self) -> Self {
        let a = self.bits;
        Self {
            bits: [!a[0], !a[1], !a[2], !a[3]],
        }
    }

    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.bits[0] == 0 && self.bits[1] == 0 && self.bits[2] == 0 && self.bits[3] == 0
    }
}

impl fmt::Debug for CharSet {
    /// Renders the membership as inclusive ranges, e.g. `CharSet['0'-'9' 'a']`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CharSet[")?;
        let mut first = true;
        let mut b = 0u32;
        while b < 0x100 {
            let lo = b;
            while b < 0x100 && (self.bits[(b >> 6) as usize] >> (b & 63)) & 1 == 1 {
                b += 1;
            }
            if b > lo {
                if !first {
                    write!(f, " ")?;
                }
                first = false;
                let lo_ch = char::from_u32(lo).unwrap_or('\u{FFFD}');
                if b - lo == 1 {
                    write!(f, "{:?}", lo_ch)?;
                } else {
                    let hi_ch = char::from_u32(b - 1).unwrap_or('\u{FFFD}');
                    write!(f, "{:?}-{:?}", lo_ch, hi_ch)?;
                }
            } else {
                b += 1;
            }
        }
        write!(f, "]")
    }
}

/// The consuming edge out of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    /// Slot is on the free-list
    Free,
    /// Consumes exactly this character
    Char(char),
    /// Consumes one character inside the set, or outside it when
    /// `complement` is set
    Class { set: CharSet, complement: bool },
    /// Consumes nothing
    Epsilon,
}

impl Edge {
    /// Does this edge consume `ch`?
    ///
    /// Epsilon and free edges consume nothing. Class membership is bitset
    /// lookup XOR the complement flag, so characters above `\u{FF}` match
    /// only complemented classes.
    #[must_use]
    pub const fn matches(self, ch: char) -> bool {
        match self {
            Self::Char(c) => c == ch,
            Self::Class { set, complement } => set.contains(ch) != complement,
            Self::Epsilon | Self::Free => false,
        }
    }
}

/// Accepting marker: which rule accepts here, by declaration sequence, and
/// the code it was declared with.
///
/// Ties between simultaneously accepting rules resolve to the lowest `rule`,
/// never to the numerically smallest code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Accept {
    /// Declaration sequence number of the rule
    pub rule: u32,
    /// The rule's accept code
    pub code: TokenCode,
}

/// One pooled automaton node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NfaNode {
    /// Slot id, stamped when the slot is created; stable across free-list
    /// reuse
    pub val: NodeId,
    pub edge: Edge,
    pub next: Option<NodeId>,
    /// Second branch, only ever set on epsilon split nodes
    pub next2: Option<NodeId>,
    pub accept: Option<Accept>,
}

/// An under-construction automaton piece: an entry node plus one dangling
/// blank end node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fragment {
    pub start: NodeId,
    pub end: NodeId,
}

/// Growable node arena with an explicit free-list.
///
/// Nodes are addressed by [`NodeId`] and owned exclusively by the pool.
/// [`NodePool::discard`] resets a slot's fields and queues it for reuse;
/// the slot's `val` survives so identity stays meaningful in diagnostics.
pub struct NodePool {
    nodes: Vec<NfaNode>,
    free: Vec<NodeId>,
}

impl NodePool {
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            free: Vec::new(),
        }
    }

    /// Draw a blank epsilon node: pops the free-list, else grows the array
    /// and stamps the next sequential id.
    pub fn new_node(&mut self) -> NodeId {
        if let Some(id) = self.free.pop() {
            let node = &mut self.nodes[id.index()];
            debug_assert!(matches!(node.edge, Edge::Free), "free-list slot in use");
            node.edge = Edge::Epsilon;
            id
        } else {
            let id = NodeId::new(self.nodes.len());
            self.nodes.push(NfaNode {
                val: id,
                edge: Edge::Epsilon,
                next: None,
                next2: None,
                accept: None,
            });
            id
        }
    }

    /// Reset a slot's fields and push it onto the free-list
    pub fn discard(&mut self, id: NodeId) {
        let node = &mut self.nodes[id.index()];
        node.edge = Edge::Free;
        node.next = None;
        node.next2 = None;
        node.accept = None;
        self.free.push(id);
    }

    /// Number of slots ever created
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of slots currently in use (created minus free-listed)
    #[must_use]
    pub fn live_nodes(&self) -> usize {
        self.nodes.len() - self.free.len()
    }

    /// Fragment consuming exactly one character
    pub fn leaf_char(&mut self, ch: char) -> Fragment {
        let start = self.new_node();
        let end = self.new_node();
        self[start].edge = Edge::Char(ch);
        self[start].next = Some(end);
        Fragment { start, end }
    }

    /// Fragment consuming one character of a class
    pub fn leaf_class(&mut self, set: CharSet, complement: bool) -> Fragment {
        let start = self.new_node();
        let end = self.new_node();
        self[start].edge = Edge::Class { set, complement };
        self[start].next = Some(end);
        Fragment { start, end }
    }

    /// Concatenation: splice `b`'s entry into `a`'s end and discard the
    /// spare slot.
    ///
    /// Safe because no edge in the graph targets a fragment's entry node.
    pub fn concat(&mut self, a: Fragment, b: Fragment) -> Fragment {
        let src = self[b.start];
        let dst = &mut self[a.end];
        dst.edge = src.edge;
        dst.next = src.next;
        dst.next2 = src.next2;
        dst.accept = src.accept;
        self.discard(b.start);
        Fragment {
            start: a.start,
            end: b.end,
        }
    }

    /// Alternation: epsilon split into both entries, both ends joined on a
    /// fresh blank node.
    pub fn alternate(&mut self, a: Fragment, b: Fragment) -> Fragment {
        let split = self.new_node();
        let join = self.new_node();
        self[split].next = Some(a.start);
        self[split].next2 = Some(b.start);
        self[a.end].next = Some(join);
        self[b.end].next = Some(join);
        Fragment { start: split, end: join }
    }

    /// Kleene star: a skip epsilon at the entry and a loop epsilon at the
    /// old end.
    pub fn star(&mut self, f: Fragment) -> Fragment {
        let entry = self.new_node();
        let exit = self.new_node();
        self[entry].next = Some(f.start);
        self[entry].next2 = Some(exit);
        self[f.end].next = Some(f.start);
        self[f.end].next2 = Some(exit);
        Fragment { start: entry, end: exit }
    }

    /// One-or-more: a loop epsilon at the old end; the fresh entry keeps the
    /// no-edge-targets-an-entry invariant intact.
    pub fn plus(&mut self, f: Fragment) -> Fragment {
        let entry = self.new_node();
        let exit = self.new_node();
        self[entry].next = Some(f.start);
        self[f.end].next = Some(f.start);
        self[f.end].next2 = Some(exit);
        Fragment { start: entry, end: exit }
    }

    /// Zero-or-one: a skip epsilon at the entry
    pub fn optional(&mut self, f: Fragment) -> Fragment {
        let entry = self.new_node();
        self[entry].next = Some(f.start);
        self[entry].next2 = Some(f.end);
        Fragment {
            start: entry,
            end: f.end,
        }
    }
}

impl Default for NodePool {
    fn default() -> Self {
        Self::new()
    }
}

impl Index<NodeId> for NodePool {
    type Output = NfaNode;

    fn index(&self, id: NodeId) -> &NfaNode {
        &self.nodes[id.index()]
    }
}

impl IndexMut<NodeId> for NodePool {
    fn index_mut(&mut self, id: NodeId) -> &mut NfaNode {
        &mut self.nodes[id.index()]
    }
}

impl fmt::Debug for NodePool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodePool")
            .field("len", &self.nodes.len())
            .field("free", &self.free.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_charset_basic() {
        let mut set = CharSet::EMPTY;
        assert!(set.is_empty());

        set.insert('a');
        set.insert_range('0', '9');

        assert!(set.contains('a'));
        assert!(set.contains('0'));
        assert!(set.contains('5'));
        assert!(set.contains('9'));
        assert!(!set.contains('b'));
        assert!(!set.contains('/'));
        // Wide characters are outside every stored set
        assert!(!set.contains('\u{100}'));
        assert!(!set.contains('λ'));
    }

    #[test]
    fn test_charset_algebra() {
        let mut a = CharSet::EMPTY;
        a.insert_range('a', 'f');
        let mut b = CharSet::EMPTY;
        b.insert_range('d', 'k');

        let union = a.union(b);
        assert!(union.contains('a') && union.contains('k'));

        let inter = a.intersection(b);
        assert!(inter.contains('d') && inter.contains('f'));
        assert!(!inter.contains('a') && !inter.contains('g'));

        let diff = a.difference(b);
        assert!(diff.contains('a') && diff.contains('c'));
        assert!(!diff.contains('d'));

        let inv = a.inverted();
        assert!(!inv.contains('a'));
        assert!(inv.contains('z'));
        assert!(inv.contains('\n'));
        assert!(inv.contains('\u{FF}'));
    }

    #[test]
    fn test_charset_control_and_space() {
        let set = CharSet::control_and_space();
        assert!(set.contains('\0'));
        assert!(set.contains('\t'));
        assert!(set.contains('\n'));
        assert!(set.contains(' '));
        assert!(!set.contains('!'));
        assert!(!set.contains('a'));
    }

    #[test]
    fn test_edge_matches() {
        assert!(Edge::Char('x').matches('x'));
        assert!(!Edge::Char('x').matches('y'));

        let digits = {
            let mut s = CharSet::EMPTY;
            s.insert_range('0', '9');
            s
        };
        let plain = Edge::Class {
            set: digits,
            complement: false,
        };
        assert!(plain.matches('7'));
        assert!(!plain.matches('a'));
        assert!(!plain.matches('λ'));

        let negated = Edge::Class {
            set: digits,
            complement: true,
        };
        assert!(!negated.matches('7'));
        assert!(negated.matches('a'));
        // Wide characters match only through the complement
        assert!(negated.matches('λ'));

        assert!(!Edge::Epsilon.matches('x'));
    }

    #[test]
    fn test_pool_sequential_ids() {
        let mut pool = NodePool::new();
        let a = pool.new_node();
        let b = pool.new_node();
        let c = pool.new_node();

        assert_eq!(a.index(), 0);
        assert_eq!(b.index(), 1);
        assert_eq!(c.index(), 2);
        assert_eq!(pool.len(), 3);
        assert_eq!(pool.live_nodes(), 3);
    }

    #[test]
    fn test_pool_discard_resets_and_reuses() {
        let mut pool = NodePool::new();
        let a = pool.new_node();
        pool[a].edge = Edge::Char('x');
        pool[a].next = Some(a);
        pool[a].accept = Some(Accept {
            rule: 0,
            code: TokenCode::new(1),
        });

        pool.discard(a);
        assert_eq!(pool.live_nodes(), 0);
        assert_eq!(pool[a].edge, Edge::Free);
        assert_eq!(pool[a].next, None);
        assert_eq!(pool[a].accept, None);

        let b = pool.new_node();
        assert_eq!(b, a, "free-listed slot is reused");
        assert_eq!(pool[b].val, a, "slot id survives reuse");
        assert_eq!(pool[b].edge, Edge::Epsilon);
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn test_leaf_char_shape() {
        let mut pool = NodePool::new();
        let f = pool.leaf_char('q');

        assert_eq!(pool[f.start].edge, Edge::Char('q'));
        assert_eq!(pool[f.start].next, Some(f.end));
        assert_eq!(pool[f.start].next2, None);
        assert_eq!(pool[f.end].edge, Edge::Epsilon);
        assert_eq!(pool[f.end].next, None);
    }

    #[test]
    fn test_concat_splices_and_discards() {
        let mut pool = NodePool::new();
        let a = pool.leaf_char('a');
        let b = pool.leaf_char('b');
        assert_eq!(pool.live_nodes(), 4);

        let ab = pool.concat(a, b);

        assert_eq!(ab.start, a.start);
        assert_eq!(ab.end, b.end);
        // a's old end now carries b's consuming edge
        assert_eq!(pool[a.end].edge, Edge::Char('b'));
        assert_eq!(pool[a.end].next, Some(b.end));
        // the spare slot went back to the pool
        assert_eq!(pool.live_nodes(), 3);
        assert_eq!(pool[b.start].edge, Edge::Free);
    }

    #[test]
    fn test_alternate_shape() {
        let mut pool = NodePool::new();
        let a = pool.leaf_char('a');
        let b = pool.leaf_char('b');
        let alt = pool.alternate(a, b);

        let split = pool[alt.start];
        assert_eq!(split.edge, Edge::Epsilon);
        assert_eq!(split.next, Some(a.start));
        assert_eq!(split.next2, Some(b.start));
        assert_eq!(pool[a.end].next, Some(alt.end));
        assert_eq!(pool[b.end].next, Some(alt.end));
        assert_eq!(pool.live_nodes(), 6);
    }

    #[test]
    fn test_star_shape() {
        let mut pool = NodePool::new();
        let a = pool.leaf_char('a');
        let star = pool.star(a);

        let entry = pool[star.start];
        assert_eq!(entry.edge, Edge::Epsilon);
        assert_eq!(entry.next, Some(a.start));
        assert_eq!(entry.next2, Some(star.end), "skip branch");

        let old_end = pool[a.end];
        assert_eq!(old_end.next, Some(a.start), "loop branch");
        assert_eq!(old_end.next2, Some(star.end));
    }

    #[test]
    fn test_plus_has_no_skip() {
        let mut pool = NodePool::new();
        let a = pool.leaf_char('a');
        let plus = pool.plus(a);

        let entry = pool[plus.start];
        assert_eq!(entry.next, Some(a.start));
        assert_eq!(entry.next2, None, "plus must not skip the body");

        let old_end = pool[a.end];
        assert_eq!(old_end.next, Some(a.start));
        assert_eq!(old_end.next2, Some(plus.end));
    }

    #[test]
    fn test_optional_shape() {
        let mut pool = NodePool::new();
        let a = pool.leaf_char('a');
        let opt = pool.optional(a);

        let entry = pool[opt.start];
        assert_eq!(entry.next, Some(a.start));
        assert_eq!(entry.next2, Some(a.end), "skip straight to the end");
        assert_eq!(opt.end, a.end);
    }

    #[test]
    fn test_concat_after_wrapping_keeps_loops_valid() {
        // a+ concatenated on the right: its entry is discarded by the
        // splice, but the loop edges target interior nodes and survive.
        let mut pool = NodePool::new();
        let x = pool.leaf_char('x');
        let a = pool.leaf_char('a');
        let a_start = a.start;
        let plus = pool.plus(a);

        let f = pool.concat(x, plus);

        // x's old end now holds the plus entry's epsilon into the body
        assert_eq!(pool[x.end].next, Some(a_start));
        assert_eq!(pool[a.end].next, Some(a_start), "loop intact");
        assert_eq!(f.end, plus.end);
    }
}
