//! # Munch
//!
//! A maximal-munch lexer with user-declared rules, compiled on demand.
//!
//! ## Overview
//!
//! Munch provides a declarative tokenizer for language frontends. It supports:
//!
//! - **Regex rules**: alternation, quantifiers, character classes, escapes,
//!   and named macro references, compiled rule-by-rule into one automaton
//! - **Quoted literals**: verbatim operator strings registered in an
//!   interning table alongside their token codes
//! - **Lazy subset construction**: DFA states materialize only for inputs
//!   that actually occur, with cached ASCII transitions
//! - **Baseline tokens**: numbers, strings, character literals, and
//!   identifiers recognized without any declared rules
//! - **Precise diagnostics**: compile errors carry rule line/column and
//!   pattern offset; scan errors carry byte spans
//!
//! ## Quick Start
//!
//! This example declares a percentage rule and a comparison operator, then
//! scans a line of input:
//!
//! ```rust
//! use munch::{LexerBuilder, TokenCode, TokenKind};
//! use munch::text::LineCol;
//!
//! // 1. Declare macros and rules with their token codes
//! let mut builder = LexerBuilder::new().with_source("rules.lx");
//! builder.add_macro("DIGIT", "[0-9]");
//! builder.add_rule("{DIGIT}+%", LineCol::new(1, 0), TokenCode::new(100))?;
//! builder.add_str("<=", LineCol::new(2, 0), TokenCode::new(101))?;
//!
//! // 2. Compile the rule set; errors point at the offending declaration
//! let mut lexer = builder.build()?;
//!
//! // 3. Scan; declared rules and baseline tokens interleave freely
//! let tokens = lexer.tokenize("rate <= 75%")?;
//!
//! assert_eq!(tokens.len(), 3);
//! assert_eq!(tokens[0].kind, TokenKind::Ident);
//! assert_eq!(tokens[1].kind, TokenKind::Custom(TokenCode::new(101)));
//! assert_eq!(tokens[2].kind, TokenKind::Custom(TokenCode::new(100)));
//! assert_eq!(tokens[2].text, "75%");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Modules
//!
//! - [`lexer`] - Rule compilation, the NFA/DFA pipeline, and scanning
//! - [`intern`] - Operator interning keyed by lexeme and token code
//! - [`error`] - Compile errors, scan errors, and warnings
//! - [`text`] - Byte offsets, spans, and line/column mapping

pub mod error;
pub mod intern;
pub mod lexer;
pub mod text;

// Re-export commonly used types
pub use error::{CompileError, CompileErrorKind, LexError, LexErrorKind, LexWarning, LexWarningKind};
pub use intern::{OpId, Operator, OperatorTable};
pub use lexer::{CharStream, Lexer, LexerBuilder, Token, TokenCode, TokenKind, TokenValue};
pub use text::{LineCol, LineIndex, TextRange, TextSize};
