#![no_main]
use libfuzzer_sys::fuzz_target;
use munch::text::LineCol;
use munch::{LexerBuilder, TokenCode};

fuzz_target!(|data: &[u8]| {
    // Convert bytes to string
    let Ok(pattern) = std::str::from_utf8(data) else {
        return;
    };
    // Parenthesis nesting recurses; keep the stack honest
    if pattern.len() > 512 {
        return;
    }

    let mut builder = LexerBuilder::new();
    builder.add_macro("DIGIT", "[0-9]");
    builder.add_macro("SELF", "{SELF}");
    builder.add_macro("EMPTY", "");

    // Arbitrary patterns either compile or fail with a located error;
    // they must never panic.
    match builder.add_rule(pattern, LineCol::new(0, 0), TokenCode::new(1)) {
        Ok(()) => {
            let Ok(mut lexer) = builder.build() else {
                return;
            };
            for probe in ["", "a", "0", "09", "ab cd", "{DIGIT}", "\u{FF}", "λλ"] {
                let _ = lexer.matches(probe);
                let _ = lexer.tokenize(probe);
            }
        }
        Err(err) => {
            assert!(
                err.offset <= pattern.len(),
                "error offset {} outside pattern of {} bytes",
                err.offset,
                pattern.len()
            );
        }
    }
});
