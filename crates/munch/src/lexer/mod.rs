//! # Lexer Module
//!
//! Rule compilation and token scanning.
//!
//! ## Overview
//!
//! This module turns lexical rule declarations into a running lexer:
//!
//! - **Pattern parsing**: regex patterns with alternation, concatenation,
//!   quantifiers, character classes, and named macros
//! - **NFA construction**: Thompson fragments in a reusable node pool,
//!   with single-character alternatives folded into classes
//! - **Lazy DFA**: subset construction performed on demand during
//!   scanning, with hash-consed states and a cached ASCII transition table
//! - **Scanning**: maximal-munch matching over the compiled rules, with a
//!   built-in tokenizer for numbers, strings, chars, and identifiers
//!
//! ## Usage
//!
//! ```rust,no_run
//! use munch::{LexerBuilder, TokenCode};
//! use munch::text::LineCol;
//!
//! let mut builder = LexerBuilder::new();
//! builder.add_macro("DIGIT", "[0-9]");
//! builder.add_rule("{DIGIT}+%", LineCol::new(1, 0), TokenCode::new(10))?;
//! builder.add_str("<=", LineCol::new(2, 0), TokenCode::new(11))?;
//!
//! let mut lexer = builder.build()?;
//! for token in lexer.tokenize("42% <= limit")? {
//!     println!("{:?} {:?}", token.kind, token.text);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod builder;
pub mod dfa;
mod fold;
pub mod nfa;
mod regex;
pub mod scanner;
pub mod stream;
pub mod token;

pub use builder::LexerBuilder;
pub use scanner::Lexer;
pub use stream::CharStream;
pub use token::{Token, TokenCode, TokenKind, TokenValue};
