//! # Operator Interning Module
//!
//! Canonical operator descriptors for lexemes matched by custom rules.
//!
//! ## Overview
//!
//! Every lexeme matched by a user-declared rule is registered here, keyed by
//! `(text, accept code)`. Registering the same pair again returns the existing
//! descriptor, so each distinct operator exists exactly once:
//!
//! - **Memory efficiency**: lexeme text is interned, duplicates share storage
//! - **O(1) comparison**: compare [`OpId`]s instead of string contents
//! - **Stable identity**: a descriptor, once minted, never moves or changes
//!
//! ## Usage
//!
//! ```rust,ignore
//! use munch::intern::OperatorTable;
//! use munch::lexer::TokenCode;
//!
//! let mut table = OperatorTable::new();
//!
//! let id1 = table.intern("<=>", TokenCode::new(4));
//! let id2 = table.intern("<=>", TokenCode::new(4)); // same id as id1
//! let id3 = table.intern("<=>", TokenCode::new(9)); // same text, new code
//!
//! assert_eq!(id1, id2);
//! assert_ne!(id1, id3);
//! assert_eq!(table.text(id1), "<=>");
//! ```

use crate::lexer::TokenCode;
use ahash::RandomState;
use hashbrown::HashMap;
use lasso::{Rodeo, Spur};
use std::fmt;

/// A canonical operator id
///
/// Lightweight handle to a registered operator. Cheap to copy and compare;
/// resolve it through the [`OperatorTable`] that minted it.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OpId(u32);

impl fmt::Debug for OpId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OpId({})", self.0)
    }
}

/// A canonical operator descriptor: interned lexeme text plus the accept code
/// of the rule that matched it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Operator {
    code: TokenCode,
    text: Spur,
}

impl Operator {
    #[must_use]
    pub const fn code(&self) -> TokenCode {
        self.code
    }
}

/// Registry of canonical operators, keyed by `(text, accept code)`.
///
/// Two rules may produce the same lexeme text under different accept codes;
/// those are distinct operators.
pub struct OperatorTable {
    rodeo: Rodeo,
    index: HashMap<(Spur, TokenCode), OpId, RandomState>,
    defs: Vec<Operator>,
}

impl OperatorTable {
    /// Create a new empty table
    #[must_use]
    pub fn new() -> Self {
        Self {
            rodeo: Rodeo::new(),
            index: HashMap::default(),
            defs: Vec::new(),
        }
    }

    /// Register an operator, returning its canonical id
    ///
    /// If `(text, code)` has been registered before, returns the existing id.
    /// Otherwise mints a fresh descriptor.
    pub fn intern(&mut self, text: &str, code: TokenCode) -> OpId {
        let spur = self.rodeo.get_or_intern(text);
        *self.index.entry((spur, code)).or_insert_with(|| {
            let id = OpId(u32::try_from(self.defs.len()).unwrap_or(u32::MAX));
            self.defs.push(Operator { code, text: spur });
            id
        })
    }

    /// Get the id for an already-registered operator, if it exists
    #[must_use]
    pub fn lookup(&self, text: &str, code: TokenCode) -> Option<OpId> {
        let spur = self.rodeo.get(text)?;
        self.index.get(&(spur, code)).copied()
    }

    /// Resolve an operator id to its descriptor
    ///
    /// # Panics
    ///
    /// Panics if the id was not minted by this table.
    #[must_use]
    pub fn resolve(&self, id: OpId) -> &Operator {
        &self.defs[id.0 as usize]
    }

    /// Resolve an operator id to its lexeme text
    ///
    /// # Panics
    ///
    /// Panics if the id was not minted by this table.
    #[must_use]
    pub fn text(&self, id: OpId) -> &str {
        self.rodeo.resolve(&self.defs[id.0 as usize].text)
    }

    /// Get the number of registered operators
    #[must_use]
    pub fn len(&self) -> usize {
        self.defs.len()
    }

    /// Check if the table is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }

    /// Iterate over all registered operators in registration order
    pub fn iter(&self) -> impl Iterator<Item = (OpId, &Operator)> {
        self.defs
            .iter()
            .enumerate()
            .map(|(i, op)| (OpId(i as u32), op))
    }
}

impl Default for OperatorTable {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for OperatorTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperatorTable")
            .field("len", &self.defs.len())
            .finish()
    }
}
