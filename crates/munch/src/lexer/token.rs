//! Token types produced by scanning.

use crate::text::TextRange;
use compact_str::CompactString;

#[cfg(feature = "serialize")]
use serde::{Deserialize, Serialize};

/// Accept code attached to a custom rule at declaration time.
///
/// Codes are opaque to the lexer; the surrounding parser assigns them and
/// dispatches on them. Distinct rules may share a code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct TokenCode(u32);

impl TokenCode {
    #[must_use]
    pub const fn new(code: u32) -> Self {
        Self(code)
    }

    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl From<u32> for TokenCode {
    fn from(code: u32) -> Self {
        Self(code)
    }
}

impl From<TokenCode> for u32 {
    fn from(code: TokenCode) -> Self {
        code.0
    }
}

/// Classification of a scanned token.
///
/// `Custom` tokens come from user-declared rules and carry the rule's accept
/// code; the rest come from the baseline tokenizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub enum TokenKind {
    /// Integer literal (decimal or `0x` hexadecimal)
    Int,
    /// Floating-point literal
    Float,
    /// Double-quoted string literal
    Str,
    /// Single-quoted character literal
    Char,
    /// Identifier (`[A-Za-z_][A-Za-z0-9_]*`)
    Ident,
    /// Lexeme matched by a user-declared rule
    Custom(TokenCode),
}

impl TokenKind {
    /// The accept code, for custom tokens.
    #[must_use]
    pub const fn code(self) -> Option<TokenCode> {
        match self {
            Self::Custom(code) => Some(code),
            _ => None,
        }
    }
}

/// Decoded payload of a baseline token.
///
/// Custom tokens carry `None`; their meaning belongs to the parser that
/// declared the rule.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub enum TokenValue {
    None,
    Int(i64),
    Float(f64),
    Str(CompactString),
    Char(char),
}

/// A scanned token: classification, raw lexeme text, source span, and the
/// decoded payload for baseline literals.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct Token {
    pub kind: TokenKind,
    pub text: CompactString,
    pub range: TextRange,
    pub value: TokenValue,
}

impl Token {
    #[must_use]
    pub fn new(kind: TokenKind, text: impl Into<CompactString>, range: TextRange) -> Self {
        Self {
            kind,
            text: text.into(),
            range,
            value: TokenValue::None,
        }
    }

    #[must_use]
    pub fn with_value(mut self, value: TokenValue) -> Self {
        self.value = value;
        self
    }

    /// The accept code, for tokens produced by a custom rule.
    #[must_use]
    pub const fn code(&self) -> Option<TokenCode> {
        self.kind.code()
    }
}
