//! # Compiled Lexer
//!
//! Longest-match scanning over the compiled DFA, interleaved with the
//! baseline tokenizer.
//!
//! ## Overview
//!
//! [`Lexer::scan`] skips whitespace, then feeds characters to the DFA one at
//! a time, remembering the last accepting position. When the automaton dies
//! or input ends, the stream rewinds to that checkpoint and the consumed
//! prefix becomes a token of the recorded accept code (maximal munch). If no
//! accepting state was ever reached the stream rewinds fully and the
//! baseline tokenizer takes over: numbers (decimal, hex, simple floats),
//! double-quoted strings, character literals, and identifiers. Custom rules
//! only add acceptance on top of the baseline, never replace it.
//!
//! Whitespace is consumed before rule matching, so custom rules see input
//! starting at the first non-blank character.
//!
//! ## Error Handling
//!
//! A character the DFA rejects is not an error; it just defers to the
//! baseline. Errors come only from malformed baseline literals, as
//! [`LexError`] values.

use super::dfa::Dfa;
use super::nfa::Accept;
use super::stream::{CharStream, StreamCheckpoint};
use super::token::{Token, TokenCode, TokenKind, TokenValue};
use crate::error::{LexError, LexErrorKind};
use crate::intern::OperatorTable;
use crate::text::{TextRange, TextSize};
use compact_str::CompactString;
use std::fmt;

/// The compiled lexer: optional custom-rule DFA, the baseline tokenizer,
/// and the operator-interning table.
///
/// Scanning mutates the lexer: transition caches, new DFA states, and
/// operator registrations grow as unseen input arrives. One parsing context
/// owns one lexer.
pub struct Lexer {
    dfa: Option<Dfa>,
    operators: OperatorTable,
}

impl Lexer {
    pub(crate) fn new(dfa: Option<Dfa>, operators: OperatorTable) -> Self {
        Self { dfa, operators }
    }

    /// The canonical operators registered so far
    #[must_use]
    pub fn operators(&self) -> &OperatorTable {
        &self.operators
    }

    /// DFA states materialized so far; zero without custom rules
    #[must_use]
    pub fn dfa_state_count(&self) -> usize {
        self.dfa.as_ref().map_or(0, Dfa::state_count)
    }

    /// Scan the next token. `Ok(None)` at end of input.
    pub fn scan(&mut self, stream: &mut CharStream<'_>) -> Result<Option<Token>, LexError> {
        skip_whitespace(stream);
        if stream.is_at_end() {
            return Ok(None);
        }

        if let Some(dfa) = &mut self.dfa {
            let start_cp = stream.checkpoint();
            let start = stream.offset();
            let mut state = dfa.start();
            let mut last: Option<(StreamCheckpoint, Accept)> = None;

            while let Some(ch) = stream.peek() {
                let Some(next) = dfa.step(state, ch) else {
                    break;
                };
                stream.bump();
                state = next;
                // Acceptance counts only after consuming, so no rule can
                // produce an empty token.
                if let Some(acc) = dfa.accept(state) {
                    last = Some((stream.checkpoint(), acc));
                }
            }

            if let Some((cp, acc)) = last {
                stream.rewind(cp);
                let text = stream.slice(start_cp);
                self.operators.intern(text, acc.code);
                return Ok(Some(Token::new(
                    TokenKind::Custom(acc.code),
                    text,
                    TextRange::new(start, stream.offset()),
                )));
            }
            stream.rewind(start_cp);
        }

        self.baseline(stream).map(Some)
    }

    /// Whole-input membership probe against the declared rules alone.
    ///
    /// Feeds every character of `input` to the automaton with no whitespace
    /// skipping and no baseline fallback, and reports the accept code if the
    /// entire input forms one lexeme. Handy when debugging a rule set.
    pub fn matches(&mut self, input: &str) -> Option<TokenCode> {
        let dfa = self.dfa.as_mut()?;
        let mut state = dfa.start();
        for ch in input.chars() {
            state = dfa.step(state, ch)?;
        }
        dfa.accept(state).map(|acc| acc.code)
    }

    /// Scan the whole input, stopping at the first baseline error
    pub fn tokenize(&mut self, input: &str) -> Result<Vec<Token>, LexError> {
        let mut stream = CharStream::new(input);
        let mut tokens = Vec::new();
        while let Some(token) = self.scan(&mut stream)? {
            tokens.push(token);
        }
        Ok(tokens)
    }

    /// The built-in fallback: numbers, strings, character literals,
    /// identifiers. Called with at least one character pending.
    fn baseline(&mut self, stream: &mut CharStream<'_>) -> Result<Token, LexError> {
        let start_cp = stream.checkpoint();
        let start = stream.offset();
        let Some(ch) = stream.peek() else {
            return Err(LexError::new(
                TextRange::empty(start),
                LexErrorKind::UnexpectedChar { ch: '\0' },
            ));
        };

        if ch.is_ascii_digit() {
            return self.number(stream, start_cp, start);
        }
        if ch == '"' {
            return self.string(stream, start_cp, start);
        }
        if ch == '\'' {
            return self.char_literal(stream, start_cp, start);
        }
        if is_ident_start(ch) {
            stream.bump();
            while stream.peek().is_some_and(is_ident_continue) {
                stream.bump();
            }
            return Ok(Token::new(
                TokenKind::Ident,
                stream.slice(start_cp),
                TextRange::new(start, stream.offset()),
            ));
        }

        stream.bump();
        Err(LexError::new(
            TextRange::new(start, stream.offset()),
            LexErrorKind::unexpected_char(ch),
        ))
    }

    fn number(
        &mut self,
        stream: &mut CharStream<'_>,
        start_cp: StreamCheckpoint,
        start: TextSize,
    ) -> Result<Token, LexError> {
        let first = stream.bump().unwrap_or('0');

        if first == '0' && (stream.eat('x') || stream.eat('X')) {
            let digits_cp = stream.checkpoint();
            while stream.peek().is_some_and(|c| c.is_ascii_hexdigit()) {
                stream.bump();
            }
            let digits = stream.slice(digits_cp);
            let span = TextRange::new(start, stream.offset());
            if digits.is_empty() {
                return Err(LexError::new(
                    span,
                    LexErrorKind::invalid_number("missing digits after '0x'"),
                ));
            }
            let value = i64::from_str_radix(digits, 16)
                .map_err(|_| LexError::new(span, LexErrorKind::invalid_number("integer out of range")))?;
            return Ok(Token::new(TokenKind::Int, stream.slice(start_cp), span)
                .with_value(TokenValue::Int(value)));
        }

        while stream.peek().is_some_and(|c| c.is_ascii_digit()) {
            stream.bump();
        }

        // A float needs a digit on both sides of the dot
        if stream.peek() == Some('.') && stream.peek_second().is_some_and(|c| c.is_ascii_digit()) {
            stream.bump();
            while stream.peek().is_some_and(|c| c.is_ascii_digit()) {
                stream.bump();
            }
            let text = stream.slice(start_cp);
            let span = TextRange::new(start, stream.offset());
            let value = text
                .parse::<f64>()
                .map_err(|_| LexError::new(span, LexErrorKind::invalid_number("malformed float")))?;
            return Ok(Token::new(TokenKind::Float, text, span)
                .with_value(TokenValue::Float(value)));
        }

        let text = stream.slice(start_cp);
        let span = TextRange::new(start, stream.offset());
        let value = text
            .parse::<i64>()
            .map_err(|_| LexError::new(span, LexErrorKind::invalid_number("integer out of range")))?;
        Ok(Token::new(TokenKind::Int, text, span).with_value(TokenValue::Int(value)))
    }

    fn string(
        &mut self,
        stream: &mut CharStream<'_>,
        start_cp: StreamCheckpoint,
        start: TextSize,
    ) -> Result<Token, LexError> {
        stream.bump();
        let mut value = CompactString::default();

        loop {
            let before = stream.offset();
            match stream.bump() {
                Some('"') => break,
                None | Some('\n') => {
                    return Err(LexError::new(
                        TextRange::new(start, stream.offset()),
                        LexErrorKind::UnterminatedString,
                    ));
                }
                Some('\\') => {
                    let Some(esc) = stream.bump() else {
                        return Err(LexError::new(
                            TextRange::new(start, stream.offset()),
                            LexErrorKind::UnterminatedString,
                        ));
                    };
                    let Some(decoded) = decode_escape(esc) else {
                        return Err(LexError::new(
                            TextRange::new(before, stream.offset()),
                            LexErrorKind::invalid_escape(&format!("\\{esc}")),
                        ));
                    };
                    value.push(decoded);
                }
                Some(ch) => value.push(ch),
            }
        }

        Ok(Token::new(
            TokenKind::Str,
            stream.slice(start_cp),
            TextRange::new(start, stream.offset()),
        )
        .with_value(TokenValue::Str(value)))
    }

    fn char_literal(
        &mut self,
        stream: &mut CharStream<'_>,
        start_cp: StreamCheckpoint,
        start: TextSize,
    ) -> Result<Token, LexError> {
        stream.bump();
        let unterminated = |stream: &CharStream<'_>| {
            LexError::new(
                TextRange::new(start, stream.offset()),
                LexErrorKind::UnterminatedChar,
            )
        };

        let before = stream.offset();
        let value = match stream.bump() {
            None | Some('\'') | Some('\n') => return Err(unterminated(stream)),
            Some('\\') => {
                let Some(esc) = stream.bump() else {
                    return Err(unterminated(stream));
                };
                let Some(decoded) = decode_escape(esc) else {
                    return Err(LexError::new(
                        TextRange::new(before, stream.offset()),
                        LexErrorKind::invalid_escape(&format!("\\{esc}")),
                    ));
                };
                decoded
            }
            Some(ch) => ch,
        };

        if !stream.eat('\'') {
            return Err(unterminated(stream));
        }
        Ok(Token::new(
            TokenKind::Char,
            stream.slice(start_cp),
            TextRange::new(start, stream.offset()),
        )
        .with_value(TokenValue::Char(value)))
    }
}

impl fmt::Debug for Lexer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lexer")
            .field("dfa", &self.dfa)
            .field("operators", &self.operators.len())
            .finish()
    }
}

fn skip_whitespace(stream: &mut CharStream<'_>) {
    while stream
        .peek()
        .is_some_and(|ch| matches!(ch, ' ' | '\t' | '\n' | '\r' | '\x0B' | '\x0C'))
    {
        stream.bump();
    }
}

const fn is_ident_start(ch: char) -> bool {
    ch.is_ascii_alphabetic() || ch == '_'
}

const fn is_ident_continue(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_'
}

/// Escape table shared by string and character literals
const fn decode_escape(esc: char) -> Option<char> {
    match esc {
        'n' => Some('\n'),
        't' => Some('\t'),
        'r' => Some('\r'),
        'f' => Some('\x0C'),
        '0' => Some('\0'),
        '\\' => Some('\\'),
        '"' => Some('"'),
        '\'' => Some('\''),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::builder::LexerBuilder;
    use crate::lexer::token::TokenCode;
    use crate::text::LineCol;

    fn baseline_lexer() -> Lexer {
        LexerBuilder::new().build().unwrap()
    }

    fn lexer_with(rules: &[(&str, u32)]) -> Lexer {
        let mut builder = LexerBuilder::new();
        for (i, (pattern, code)) in rules.iter().enumerate() {
            builder
                .add_rule(pattern, LineCol::new(i as u32, 0), TokenCode::new(*code))
                .unwrap();
        }
        builder.build().unwrap()
    }

    #[test]
    fn test_baseline_integers() {
        let mut lexer = baseline_lexer();
        let tokens = lexer.tokenize("42 0x1F 0").unwrap();

        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[0].value, TokenValue::Int(42));
        assert_eq!(tokens[1].value, TokenValue::Int(31));
        assert_eq!(tokens[1].text, "0x1F");
        assert_eq!(tokens[2].value, TokenValue::Int(0));
    }

    #[test]
    fn test_baseline_floats() {
        let mut lexer = baseline_lexer();
        let tokens = lexer.tokenize("3.25 10.0").unwrap();

        assert_eq!(tokens[0].kind, TokenKind::Float);
        assert_eq!(tokens[0].value, TokenValue::Float(3.25));
        assert_eq!(tokens[1].value, TokenValue::Float(10.0));
    }

    #[test]
    fn test_float_needs_digits_both_sides() {
        let mut lexer = baseline_lexer();
        // "12." is an Int; the dot is then unclassifiable
        let mut stream = CharStream::new("12.");

        let token = lexer.scan(&mut stream).unwrap().unwrap();
        assert_eq!(token.kind, TokenKind::Int);
        assert_eq!(token.value, TokenValue::Int(12));

        let err = lexer.scan(&mut stream).unwrap_err();
        assert_eq!(err.kind, LexErrorKind::unexpected_char('.'));
    }

    #[test]
    fn test_baseline_strings() {
        let mut lexer = baseline_lexer();
        let tokens = lexer.tokenize(r#""hi" "a\tb\"c""#).unwrap();

        assert_eq!(tokens[0].kind, TokenKind::Str);
        assert_eq!(tokens[0].value, TokenValue::Str("hi".into()));
        assert_eq!(tokens[0].text, r#""hi""#);
        assert_eq!(tokens[1].value, TokenValue::Str("a\tb\"c".into()));
    }

    #[test]
    fn test_string_errors() {
        let mut lexer = baseline_lexer();

        let err = lexer.tokenize("\"open").unwrap_err();
        assert_eq!(err.kind, LexErrorKind::UnterminatedString);

        let err = lexer.tokenize("\"a\nb\"").unwrap_err();
        assert_eq!(err.kind, LexErrorKind::UnterminatedString);

        let err = lexer.tokenize(r#""a\qb""#).unwrap_err();
        assert_eq!(err.kind, LexErrorKind::invalid_escape("\\q"));
    }

    #[test]
    fn test_char_literals() {
        let mut lexer = baseline_lexer();
        let tokens = lexer.tokenize(r"'x' '\n'").unwrap();

        assert_eq!(tokens[0].kind, TokenKind::Char);
        assert_eq!(tokens[0].value, TokenValue::Char('x'));
        assert_eq!(tokens[1].value, TokenValue::Char('\n'));

        let err = lexer.tokenize("'ab'").unwrap_err();
        assert_eq!(err.kind, LexErrorKind::UnterminatedChar);

        let err = lexer.tokenize("''").unwrap_err();
        assert_eq!(err.kind, LexErrorKind::UnterminatedChar);
    }

    #[test]
    fn test_baseline_identifiers() {
        let mut lexer = baseline_lexer();
        let tokens = lexer.tokenize("_x abc1 Y_2").unwrap();

        assert_eq!(tokens.len(), 3);
        for token in &tokens {
            assert_eq!(token.kind, TokenKind::Ident);
        }
        assert_eq!(tokens[0].text, "_x");
    }

    #[test]
    fn test_number_errors() {
        let mut lexer = baseline_lexer();

        let err = lexer.tokenize("0x").unwrap_err();
        assert_eq!(
            err.kind,
            LexErrorKind::invalid_number("missing digits after '0x'")
        );

        let err = lexer.tokenize("99999999999999999999").unwrap_err();
        assert_eq!(
            err.kind,
            LexErrorKind::invalid_number("integer out of range")
        );
    }

    #[test]
    fn test_custom_rule_beats_baseline() {
        let mut lexer = lexer_with(&[("abc", 7)]);

        let tokens = lexer.tokenize("abc abd").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Custom(TokenCode::new(7)));
        assert_eq!(tokens[1].kind, TokenKind::Ident, "near miss falls back");
    }

    #[test]
    fn test_matched_lexemes_are_interned() {
        let mut lexer = lexer_with(&[("=+", 3)]);

        lexer.tokenize("= == =").unwrap();
        let ops = lexer.operators();
        assert_eq!(ops.len(), 2, "one operator per distinct lexeme");
        assert!(ops.lookup("=", TokenCode::new(3)).is_some());
        assert!(ops.lookup("==", TokenCode::new(3)).is_some());
    }

    #[test]
    fn test_whitespace_and_spans() {
        let mut lexer = lexer_with(&[("ab", 1)]);
        let tokens = lexer.tokenize("  ab\t9").unwrap();

        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].range.start().into(), 2);
        assert_eq!(tokens[0].range.end().into(), 4);
        assert_eq!(tokens[1].value, TokenValue::Int(9));
    }

    #[test]
    fn test_rejected_prefix_rewinds_fully() {
        // The DFA consumes 'a' then dies on 'q' without ever accepting;
        // the stream must rewind so the baseline sees the whole word.
        let mut lexer = lexer_with(&[("ab", 1)]);
        let tokens = lexer.tokenize("aq").unwrap();

        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, TokenKind::Ident);
        assert_eq!(tokens[0].text, "aq");
    }

    #[test]
    fn test_empty_and_blank_input() {
        let mut lexer = baseline_lexer();
        assert!(lexer.tokenize("").unwrap().is_empty());
        assert!(lexer.tokenize("  \t\n").unwrap().is_empty());
    }

    #[test]
    fn test_matches_probes_rules_only() {
        let mut lexer = lexer_with(&[("a+b", 1)]);

        assert_eq!(lexer.matches("aab"), Some(TokenCode::new(1)));
        assert_eq!(lexer.matches("aa"), None, "no accept mid-pattern");
        assert_eq!(lexer.matches("aabb"), None, "trailing input rejects");
        assert_eq!(lexer.matches("x"), None, "identifiers are baseline only");
        assert_eq!(baseline_lexer().matches("a"), None, "no rules, no matches");
    }
}
