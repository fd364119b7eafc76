//! # Error Types
//!
//! Error and warning types for rule compilation and scanning.
//!
//! ## Overview
//!
//! Failures split along the two phases of the lexer's life:
//!
//! - **Compile errors**: structural problems in a rule's pattern text
//!   (malformed expressions, bad classes, macro trouble). All fatal; the
//!   rule set aborts and no partial lexer is produced.
//! - **Scan errors**: baseline-tokenizer failures on malformed literals
//!   (unterminated strings, bad escapes). A custom-rule rejection is never
//!   an error; it falls back to the baseline tokenizer.
//! - **Warnings**: non-fatal oddities in class syntax, collected on the
//!   builder rather than printed.
//!
//! ## Diagnostics Support
//!
//! When the `diagnostics` feature is enabled, errors integrate with
//! [`miette`] for rich error reporting.

use crate::text::{LineCol, TextRange};
use compact_str::CompactString;
use thiserror::Error;

#[cfg(feature = "diagnostics")]
use miette::Diagnostic;

/// Fatal error compiling a rule's pattern text.
///
/// Carries the rule's declaration position and the byte offset inside the
/// pattern where compilation stopped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[cfg_attr(feature = "diagnostics", derive(Diagnostic))]
#[error("{kind}")]
pub struct CompileError {
    /// Name of the script source the rule came from, when the builder knows it
    pub source_name: Option<CompactString>,
    /// Position of the rule declaration, as supplied by the caller
    pub pos: LineCol,
    /// Byte offset within the pattern text
    pub offset: usize,
    #[source]
    pub kind: CompileErrorKind,
}

/// Kinds of fatal pattern-compilation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[cfg_attr(feature = "diagnostics", derive(Diagnostic))]
pub enum CompileErrorKind {
    #[error("malformed expression: {detail}")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(munch::malformed_expr)))]
    MalformedExpr { detail: CompactString },

    #[error("unmatched '('")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(munch::unmatched_paren)))]
    UnmatchedParen,

    #[error("unmatched '['")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(munch::unmatched_bracket)))]
    UnmatchedBracket,

    #[error("quantifier with no operand")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(munch::dangling_quantifier)))]
    DanglingQuantifier,

    #[error("missing '}}' in macro reference")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(munch::unterminated_macro)))]
    UnterminatedMacro,

    #[error("undefined macro '{name}'")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(munch::undefined_macro)))]
    UndefinedMacro { name: CompactString },

    #[error("empty macro body '{name}'")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(munch::empty_macro_body)))]
    EmptyMacroBody { name: CompactString },

    #[error("macro nesting too deep")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(munch::macro_depth)))]
    MacroDepthExceeded,

    #[error("invalid class range '{lo}-{hi}'")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(munch::invalid_class_range)))]
    InvalidClassRange { lo: char, hi: char },

    #[error("character '{ch}' is outside the Latin-1 class range")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(munch::wide_class_char)))]
    UnsupportedClassChar { ch: char },
}

impl CompileError {
    /// Render the diagnostic location as `file:line:col` (or `line:col`).
    #[must_use]
    pub fn location(&self) -> String {
        match &self.source_name {
            Some(name) => format!("{name}:{}", self.pos),
            None => self.pos.to_string(),
        }
    }
}

impl CompileErrorKind {
    #[must_use]
    pub fn malformed(detail: &str) -> Self {
        Self::MalformedExpr {
            detail: detail.into(),
        }
    }

    #[must_use]
    pub fn undefined_macro(name: &str) -> Self {
        Self::UndefinedMacro { name: name.into() }
    }

    #[must_use]
    pub fn empty_macro_body(name: &str) -> Self {
        Self::EmptyMacroBody { name: name.into() }
    }
}

/// Scan-time error from the baseline tokenizer, with location
#[derive(Debug, Clone, PartialEq, Error)]
#[cfg_attr(feature = "diagnostics", derive(Diagnostic))]
#[error("{kind}")]
pub struct LexError {
    #[cfg_attr(feature = "diagnostics", label)]
    pub span: TextRange,
    #[source]
    pub kind: LexErrorKind,
}

/// Kinds of baseline-tokenizer errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[cfg_attr(feature = "diagnostics", derive(Diagnostic))]
pub enum LexErrorKind {
    #[error("unexpected character: '{ch}'")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(munch::unexpected_char)))]
    UnexpectedChar { ch: char },

    #[error("unterminated string literal")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(munch::unterminated_string)))]
    UnterminatedString,

    #[error("unterminated character literal")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(munch::unterminated_char)))]
    UnterminatedChar,

    #[error("invalid escape sequence: {escape}")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(munch::invalid_escape)))]
    InvalidEscape { escape: CompactString },

    #[error("invalid number format: {reason}")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(munch::invalid_number)))]
    InvalidNumber { reason: CompactString },
}

impl LexError {
    #[must_use]
    pub const fn new(span: TextRange, kind: LexErrorKind) -> Self {
        Self { span, kind }
    }

    #[must_use]
    pub const fn span(&self) -> TextRange {
        self.span
    }

    #[must_use]
    pub const fn kind(&self) -> &LexErrorKind {
        &self.kind
    }
}

impl LexErrorKind {
    #[must_use]
    pub const fn unexpected_char(ch: char) -> Self {
        Self::UnexpectedChar { ch }
    }

    #[must_use]
    pub fn invalid_escape(escape: &str) -> Self {
        Self::InvalidEscape {
            escape: escape.into(),
        }
    }

    #[must_use]
    pub fn invalid_number(reason: &str) -> Self {
        Self::InvalidNumber {
            reason: reason.into(),
        }
    }
}

/// Non-fatal warning raised while compiling a rule.
///
/// Only class-syntax oddities warn today; semantics are unaffected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexWarning {
    pub source_name: Option<CompactString>,
    pub pos: LineCol,
    pub kind: LexWarningKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LexWarningKind {
    /// A dash at the start of a character class, taken as a literal dash
    DashAtClassStart,
    /// A dash at the end of a character class, taken as a literal dash
    DashAtClassEnd,
}

impl LexWarning {
    #[must_use]
    pub fn message(&self) -> String {
        let what = match self.kind {
            LexWarningKind::DashAtClassStart => "dash at start of character class taken literally",
            LexWarningKind::DashAtClassEnd => "dash at end of character class taken literally",
        };
        match &self.source_name {
            Some(name) => format!("{name}:{}: {what}", self.pos),
            None => format!("{}: {what}", self.pos),
        }
    }
}
