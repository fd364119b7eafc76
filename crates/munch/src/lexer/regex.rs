//! # Pattern Compiler
//!
//! Recursive-descent compiler from rule pattern text to NFA fragments.
//!
//! ## Overview
//!
//! A [`PatternReader`] advances character by character, translating escapes
//! (`\t`, `\d`, ...) and eagerly substituting `{name}` macro references: the
//! referenced body is wrapped in parentheses and pushed as a new input frame
//! on a depth-bounded stack. The grammar then runs over the resulting unit
//! stream:
//!
//! ```text
//! expr     := cat_expr ('|' cat_expr)*
//! cat_expr := factor+
//! factor   := term ('*' | '+' | '?')?
//! term     := '(' expr ')' | '.' | '[' class ']' | predefined-class | literal
//! ```
//!
//! Alternatives fold into class nodes where possible (see
//! [`fold`](super::fold)). Quoted patterns skip escape and macro expansion
//! entirely; every character is a literal.
//!
//! All structural errors are fatal to the whole rule set. Error offsets
//! point into the declared pattern text, before macro expansion.

use super::fold;
use super::nfa::{CharSet, Fragment, NodePool};
use crate::error::{CompileErrorKind, LexWarningKind};
use ahash::RandomState;
use compact_str::CompactString;
use hashbrown::HashMap;

/// Macro name to body text
pub(crate) type MacroMap = HashMap<CompactString, CompactString, RandomState>;

/// Expansion frames live on a stack of at most this many entries
pub(crate) const MACRO_DEPTH_LIMIT: usize = 16;

/// A compile failure positioned within the declared pattern text
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PatternError {
    pub(crate) offset: usize,
    pub(crate) kind: CompileErrorKind,
}

/// One pattern atom after escape translation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Unit {
    /// A character; `literal` marks it as escape-produced or quoted, which
    /// disables metacharacter dispatch
    Char { ch: char, literal: bool },
    /// An escape denoting a whole predefined class
    Class(PredefClass),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PredefClass {
    Digit,
    NotDigit,
    Space,
    NotSpace,
    Word,
    NotWord,
}

fn digit_set() -> CharSet {
    let mut set = CharSet::EMPTY;
    set.insert_range('0', '9');
    set
}

fn space_set() -> CharSet {
    let mut set = CharSet::EMPTY;
    for ch in [' ', '\t', '\n', '\r', '\x0B', '\x0C'] {
        set.insert(ch);
    }
    set
}

fn word_set() -> CharSet {
    let mut set = CharSet::EMPTY;
    set.insert_range('0', '9');
    set.insert_range('A', 'Z');
    set.insert_range('a', 'z');
    set.insert('_');
    set
}

impl PredefClass {
    /// Set plus complement flag, as a standalone term. Negated forms match
    /// through the complement, so they also accept characters above Latin-1.
    fn as_leaf(self) -> (CharSet, bool) {
        match self {
            Self::Digit => (digit_set(), false),
            Self::NotDigit => (digit_set(), true),
            Self::Space => (space_set(), false),
            Self::NotSpace => (space_set(), true),
            Self::Word => (word_set(), false),
            Self::NotWord => (word_set(), true),
        }
    }

    /// Contribution when written inside a bracketed class. Negated forms
    /// contribute their Latin-1 complement; the class's own `^` still applies
    /// on top.
    fn class_member_set(self) -> CharSet {
        let (set, negated) = self.as_leaf();
        if negated { set.inverted() } else { set }
    }
}

const fn literal(ch: char) -> Unit {
    Unit::Char { ch, literal: true }
}

/// Escape translation, applied outside quoted mode
const fn translate_escape(ch: char) -> Unit {
    match ch {
        't' => literal('\t'),
        'n' => literal('\n'),
        'r' => literal('\r'),
        'f' => literal('\x0C'),
        'd' => Unit::Class(PredefClass::Digit),
        'D' => Unit::Class(PredefClass::NotDigit),
        's' => Unit::Class(PredefClass::Space),
        'S' => Unit::Class(PredefClass::NotSpace),
        'w' => Unit::Class(PredefClass::Word),
        'W' => Unit::Class(PredefClass::NotWord),
        other => literal(other),
    }
}

/// One input frame: the declared pattern at the bottom, macro expansions
/// above it
#[derive(Debug)]
struct Frame {
    text: String,
    pos: usize,
}

impl Frame {
    fn peek(&self) -> Option<char> {
        self.text[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }
}

/// Character-level reader: escape translation and eager macro substitution
struct PatternReader<'m> {
    frames: Vec<Frame>,
    macros: &'m MacroMap,
    quoted: bool,
}

impl<'m> PatternReader<'m> {
    fn new(pattern: &str, macros: &'m MacroMap, quoted: bool) -> Self {
        Self {
            frames: vec![Frame {
                text: pattern.to_owned(),
                pos: 0,
            }],
            macros,
            quoted,
        }
    }

    /// Progress through the declared pattern text, ignoring expansion frames
    fn outer_offset(&self) -> usize {
        self.frames.first().map_or(0, |f| f.pos)
    }

    fn err(&self, kind: CompileErrorKind) -> PatternError {
        PatternError {
            offset: self.outer_offset(),
            kind,
        }
    }

    /// Next character from the innermost frame; never crosses a frame
    /// boundary, so escapes and macro names cannot straddle expansions.
    fn bump_current(&mut self) -> Option<char> {
        self.frames.last_mut()?.bump()
    }

    fn next_unit(&mut self) -> Result<Option<Unit>, PatternError> {
        loop {
            // Drop finished expansions; the root frame stays for its offset.
            while self.frames.len() > 1 && self.frames[self.frames.len() - 1].peek().is_none() {
                self.frames.pop();
            }
            let Some(ch) = self.bump_current() else {
                return Ok(None);
            };

            if self.quoted {
                return Ok(Some(literal(ch)));
            }

            match ch {
                '\\' => {
                    let Some(esc) = self.bump_current() else {
                        return Err(self.err(CompileErrorKind::malformed("trailing backslash")));
                    };
                    return Ok(Some(translate_escape(esc)));
                }
                '{' => {
                    let mut name = CompactString::default();
                    loop {
                        match self.bump_current() {
                            Some('}') => break,
                            Some(c) => name.push(c),
                            None => return Err(self.err(CompileErrorKind::UnterminatedMacro)),
                        }
                    }
                    let Some(body) = self.macros.get(name.as_str()) else {
                        return Err(self.err(CompileErrorKind::UndefinedMacro { name }));
                    };
                    if body.is_empty() {
                        return Err(self.err(CompileErrorKind::EmptyMacroBody { name }));
                    }
                    if self.frames.len() >= MACRO_DEPTH_LIMIT {
                        return Err(self.err(CompileErrorKind::MacroDepthExceeded));
                    }
                    // Parenthesized so the body binds as one term
                    self.frames.push(Frame {
                        text: format!("({body})"),
                        pos: 0,
                    });
                }
                _ => return Ok(Some(Unit::Char { ch, literal: false })),
            }
        }
    }
}

/// The grammar driver: one unit of lookahead over the reader, building
/// fragments in the shared pool
struct PatternCompiler<'a> {
    reader: PatternReader<'a>,
    peeked: Option<Unit>,
    pool: &'a mut NodePool,
    fold: bool,
    warnings: Vec<LexWarningKind>,
}

/// Compile one pattern into a fragment in `pool`.
///
/// `quoted` treats the pattern as literal text; `fold` enables alternation
/// folding (disabled only to compare against the split construction).
pub(crate) fn compile(
    pool: &mut NodePool,
    macros: &MacroMap,
    pattern: &str,
    quoted: bool,
    fold: bool,
) -> Result<(Fragment, Vec<LexWarningKind>), PatternError> {
    let mut compiler = PatternCompiler {
        reader: PatternReader::new(pattern, macros, quoted),
        peeked: None,
        pool,
        fold,
        warnings: Vec::new(),
    };

    let fragment = compiler.parse_expr()?;
    if let Some(Unit::Char { ch, .. }) = compiler.peek()? {
        // Only an unbalanced ')' can survive the expression grammar
        return Err(compiler.err(CompileErrorKind::malformed(&format!("unexpected '{ch}'"))));
    }
    Ok((fragment, compiler.warnings))
}

impl PatternCompiler<'_> {
    fn err(&self, kind: CompileErrorKind) -> PatternError {
        PatternError {
            offset: self.reader.outer_offset(),
            kind,
        }
    }

    fn peek(&mut self) -> Result<Option<Unit>, PatternError> {
        if self.peeked.is_none() {
            self.peeked = self.reader.next_unit()?;
        }
        Ok(self.peeked)
    }

    fn bump(&mut self) -> Result<Option<Unit>, PatternError> {
        let unit = self.peek()?;
        self.peeked = None;
        Ok(unit)
    }

    /// Consume `ch` only as a metacharacter (not escape-produced)
    fn eat_meta(&mut self, ch: char) -> Result<bool, PatternError> {
        match self.peek()? {
            Some(Unit::Char { ch: c, literal: false }) if c == ch => {
                self.peeked = None;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn at_meta(&mut self, ch: char) -> Result<bool, PatternError> {
        Ok(matches!(
            self.peek()?,
            Some(Unit::Char { ch: c, literal: false }) if c == ch
        ))
    }

    fn parse_expr(&mut self) -> Result<Fragment, PatternError> {
        let mut acc = self.parse_cat()?;
        while self.eat_meta('|')? {
            let alt = self.parse_cat()?;
            if !(self.fold && fold::try_fold(self.pool, acc, alt)) {
                acc = self.pool.alternate(acc, alt);
            }
        }
        Ok(acc)
    }

    fn parse_cat(&mut self) -> Result<Fragment, PatternError> {
        let mut acc = self.parse_factor()?;
        while self.peek()?.is_some() && !self.at_meta('|')? && !self.at_meta(')')? {
            let next = self.parse_factor()?;
            acc = self.pool.concat(acc, next);
        }
        Ok(acc)
    }

    fn parse_factor(&mut self) -> Result<Fragment, PatternError> {
        let f = self.parse_term()?;
        if self.eat_meta('*')? {
            Ok(self.pool.star(f))
        } else if self.eat_meta('+')? {
            Ok(self.pool.plus(f))
        } else if self.eat_meta('?')? {
            Ok(self.pool.optional(f))
        } else {
            Ok(f)
        }
    }

    fn parse_term(&mut self) -> Result<Fragment, PatternError> {
        let Some(unit) = self.bump()? else {
            return Err(self.err(CompileErrorKind::malformed("unexpected end of pattern")));
        };
        match unit {
            Unit::Class(pc) => {
                let (set, complement) = pc.as_leaf();
                Ok(self.pool.leaf_class(set, complement))
            }
            Unit::Char { ch, literal: true } => Ok(self.pool.leaf_char(ch)),
            Unit::Char { ch: '(', .. } => {
                let f = self.parse_expr()?;
                if !self.eat_meta(')')? {
                    return Err(self.err(CompileErrorKind::UnmatchedParen));
                }
                Ok(f)
            }
            Unit::Char { ch: '[', .. } => self.parse_class(),
            Unit::Char { ch: '.', .. } => {
                Ok(self.pool.leaf_class(CharSet::singleton('\n'), true))
            }
            Unit::Char { ch: '*' | '+' | '?', .. } => {
                Err(self.err(CompileErrorKind::DanglingQuantifier))
            }
            Unit::Char { ch: ch @ ('|' | ')'), .. } => {
                Err(self.err(CompileErrorKind::malformed(&format!("unexpected '{ch}'"))))
            }
            Unit::Char { ch, .. } => Ok(self.pool.leaf_char(ch)),
        }
    }

    fn check_latin1(&self, ch: char) -> Result<(), PatternError> {
        if (ch as u32) < 0x100 {
            Ok(())
        } else {
            Err(self.err(CompileErrorKind::UnsupportedClassChar { ch }))
        }
    }

    /// Class body scan, entered after `[`.
    ///
    /// `^` negates only as the very first character. A dash at the start or
    /// end is a literal member, with a warning. `a-b` is an inclusive range.
    /// An empty body denotes the fixed control-and-space set.
    fn parse_class(&mut self) -> Result<Fragment, PatternError> {
        let mut set = CharSet::EMPTY;
        let mut members = 0usize;
        let complement = self.eat_meta('^')?;

        loop {
            let Some(unit) = self.bump()? else {
                return Err(self.err(CompileErrorKind::UnmatchedBracket));
            };
            match unit {
                Unit::Char { ch: ']', literal: false } => break,
                Unit::Char { ch: '-', literal: false } => {
                    if members == 0 {
                        self.warnings.push(LexWarningKind::DashAtClassStart);
                    } else if self.at_meta(']')? {
                        self.warnings.push(LexWarningKind::DashAtClassEnd);
                    }
                    set.insert('-');
                    members += 1;
                }
                Unit::Class(pc) => {
                    set = set.union(pc.class_member_set());
                    members += 1;
                }
                Unit::Char { ch, .. } => {
                    if self.eat_meta('-')? {
                        if self.at_meta(']')? {
                            self.warnings.push(LexWarningKind::DashAtClassEnd);
                            self.check_latin1(ch)?;
                            set.insert(ch);
                            set.insert('-');
                            members += 2;
                        } else {
                            let Some(hi_unit) = self.bump()? else {
                                return Err(self.err(CompileErrorKind::UnmatchedBracket));
                            };
                            let Unit::Char { ch: hi, .. } = hi_unit else {
                                return Err(self.err(CompileErrorKind::malformed(
                                    "class range bound is not a single character",
                                )));
                            };
                            self.check_latin1(ch)?;
                            self.check_latin1(hi)?;
                            if ch > hi {
                                return Err(self.err(CompileErrorKind::InvalidClassRange {
                                    lo: ch,
                                    hi,
                                }));
                            }
                            set.insert_range(ch, hi);
                            members += 2;
                        }
                    } else {
                        self.check_latin1(ch)?;
                        set.insert(ch);
                        members += 1;
                    }
                }
            }
        }

        if members == 0 {
            set = CharSet::control_and_space();
        }
        Ok(self.pool.leaf_class(set, complement))
    }
}
