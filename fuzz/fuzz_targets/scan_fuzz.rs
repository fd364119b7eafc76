#![no_main]
use libfuzzer_sys::fuzz_target;
use munch::text::LineCol;
use munch::{LexerBuilder, TokenCode};

fuzz_target!(|data: &[u8]| {
    // Convert bytes to string
    let Ok(input) = std::str::from_utf8(data) else {
        return;
    };

    // A fixed rule set with classes, macros, quantifiers, and operators
    let mut builder = LexerBuilder::new();
    builder.add_macro("DIGIT", "[0-9]");
    builder.add_macro("WORD", "[a-zA-Z_]");
    let rules: &[&str] = &["{DIGIT}+%", "{WORD}+:", "[^\\n]#", "(ab|cd)+"];
    for (line, pattern) in rules.iter().enumerate() {
        builder
            .add_rule(pattern, LineCol::new(line as u32, 0), TokenCode::new(line as u32 + 1))
            .expect("fixed fuzz rules must compile");
    }
    builder
        .add_str("<=", LineCol::new(9, 0), TokenCode::new(9))
        .expect("fixed fuzz rules must compile");
    let Ok(mut lexer) = builder.build() else {
        return;
    };

    // Scanning arbitrary input must never panic, and every reported span
    // must lie inside the input with tokens in strictly increasing order.
    match lexer.tokenize(input) {
        Ok(tokens) => {
            let mut last_end = 0u32;
            for token in &tokens {
                let start: u32 = token.range.start().into();
                let end: u32 = token.range.end().into();
                assert!(start < end, "empty token at {start}");
                assert!(start >= last_end, "overlapping tokens at {start}");
                assert!(end as usize <= input.len(), "span past end of input");
                assert_eq!(
                    &input[start as usize..end as usize],
                    token.text.as_str(),
                    "token text must mirror its span"
                );
                last_end = end;
            }
        }
        Err(err) => {
            let end: u32 = err.span.end().into();
            assert!(end as usize <= input.len(), "error span past end of input");
        }
    }
});
