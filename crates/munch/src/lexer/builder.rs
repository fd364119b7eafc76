//! # Lexer Builder
//!
//! Accumulates rules, string operators, and macros, then compiles them into
//! a [`Lexer`].
//!
//! ## Overview
//!
//! Rules accumulate one at a time; each compiles immediately into the shared
//! node pool and is chained into a spine of epsilon splits, so the finished
//! automaton is one connected structure in which every rule is reachable
//! from the start. Declaration order is the accept-priority order.
//!
//! Any compile error is fatal to the whole rule set: it is returned from the
//! failing `add_*` call and latched, and [`LexerBuilder::build`] refuses to
//! produce a lexer afterwards.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use munch::lexer::{LexerBuilder, TokenCode};
//! use munch::text::LineCol;
//!
//! let mut builder = LexerBuilder::new().with_source("grammar.mn");
//! builder.add_macro("DIGIT", "[0-9]");
//! builder.add_rule("{DIGIT}+", LineCol::new(0, 0), TokenCode::new(1))?;
//! builder.add_str("<=>", LineCol::new(1, 0), TokenCode::new(2))?;
//! let lexer = builder.build()?;
//! ```

use super::dfa::Dfa;
use super::nfa::{Accept, NodeId, NodePool};
use super::regex::{self, MacroMap, PatternError};
use super::scanner::Lexer;
use super::token::TokenCode;
use crate::error::{CompileError, LexWarning};
use crate::intern::OperatorTable;
use crate::text::LineCol;
use compact_str::CompactString;
use std::fmt;

/// Epsilon spine linking every rule's fragment into one automaton.
///
/// `hook` is the newest spine node; its second branch stays open for the
/// next rule.
struct RuleChain {
    start: NodeId,
    hook: NodeId,
}

/// Accumulates lexical rules and finalizes them into a [`Lexer`]
pub struct LexerBuilder {
    pool: NodePool,
    chain: Option<RuleChain>,
    rules: u32,
    macros: MacroMap,
    operators: OperatorTable,
    warnings: Vec<LexWarning>,
    source_name: Option<CompactString>,
    failed: Option<CompileError>,
    fold: bool,
}

impl LexerBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            pool: NodePool::new(),
            chain: None,
            rules: 0,
            macros: MacroMap::default(),
            operators: OperatorTable::new(),
            warnings: Vec::new(),
            source_name: None,
            failed: None,
            fold: true,
        }
    }

    /// Stamp errors and warnings with a script file name
    #[must_use]
    pub fn with_source(mut self, name: &str) -> Self {
        self.source_name = Some(name.into());
        self
    }

    /// Toggle alternation folding.
    ///
    /// On by default. Turning it off forces the split construction, which
    /// accepts the same language with more nodes; useful when comparing the
    /// two forms.
    pub fn set_folding(&mut self, enabled: bool) {
        self.fold = enabled;
    }

    /// Declare a pattern rule with the given accept code.
    ///
    /// `pos` is the rule's declaration position in the enclosing script,
    /// used for diagnostics only.
    pub fn add_rule(
        &mut self,
        pattern: &str,
        pos: LineCol,
        code: TokenCode,
    ) -> Result<(), CompileError> {
        self.compile_rule(pattern, pos, code, false)
    }

    /// Declare a literal-text operator rule.
    ///
    /// The text is matched verbatim, with no escape or macro expansion, and
    /// is registered in the operator table up front.
    pub fn add_str(
        &mut self,
        text: &str,
        pos: LineCol,
        code: TokenCode,
    ) -> Result<(), CompileError> {
        self.operators.intern(text, code);
        self.compile_rule(text, pos, code, true)
    }

    /// Define or redefine a macro. Problems with a body surface when a rule
    /// references it.
    pub fn add_macro(&mut self, name: &str, body: &str) {
        self.macros.insert(name.into(), body.into());
    }

    fn compile_rule(
        &mut self,
        pattern: &str,
        pos: LineCol,
        code: TokenCode,
        quoted: bool,
    ) -> Result<(), CompileError> {
        let compiled = regex::compile(&mut self.pool, &self.macros, pattern, quoted, self.fold);
        let (fragment, warnings) = match compiled {
            Ok(ok) => ok,
            Err(e) => return Err(self.fail(pos, e)),
        };
        for kind in warnings {
            self.warnings.push(LexWarning {
                source_name: self.source_name.clone(),
                pos,
                kind,
            });
        }

        let rule = self.rules;
        self.rules += 1;
        self.pool[fragment.end].accept = Some(Accept { rule, code });

        let spine = self.pool.new_node();
        self.pool[spine].next = Some(fragment.start);
        match &mut self.chain {
            Some(chain) => {
                self.pool[chain.hook].next2 = Some(spine);
                chain.hook = spine;
            }
            None => {
                self.chain = Some(RuleChain {
                    start: spine,
                    hook: spine,
                });
            }
        }
        Ok(())
    }

    fn fail(&mut self, pos: LineCol, e: PatternError) -> CompileError {
        let error = CompileError {
            source_name: self.source_name.clone(),
            pos,
            offset: e.offset,
            kind: e.kind,
        };
        if self.failed.is_none() {
            self.failed = Some(error.clone());
        }
        error
    }

    /// Warnings gathered so far, in declaration order
    #[must_use]
    pub fn warnings(&self) -> &[LexWarning] {
        &self.warnings
    }

    /// Drain the gathered warnings
    pub fn take_warnings(&mut self) -> Vec<LexWarning> {
        std::mem::take(&mut self.warnings)
    }

    /// Number of successfully declared rules
    #[must_use]
    pub fn rule_count(&self) -> usize {
        self.rules as usize
    }

    #[must_use]
    pub fn macro_count(&self) -> usize {
        self.macros.len()
    }

    /// Live NFA nodes built so far
    #[must_use]
    pub fn nfa_node_count(&self) -> usize {
        self.pool.live_nodes()
    }

    /// Finalize into a compiled lexer.
    ///
    /// Returns the first rule-compilation error if any `add_*` call failed;
    /// a failed rule set never yields a partial lexer. With no custom rules
    /// the lexer runs the baseline tokenizer alone.
    pub fn build(self) -> Result<Lexer, CompileError> {
        if let Some(error) = self.failed {
            return Err(error);
        }
        let dfa = self.chain.map(|chain| Dfa::new(self.pool, chain.start));
        Ok(Lexer::new(dfa, self.operators))
    }
}

impl Default for LexerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for LexerBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LexerBuilder")
            .field("rules", &self.rules)
            .field("macros", &self.macros.len())
            .field("nfa_nodes", &self.pool.live_nodes())
            .finish()
    }
}
