//! Line and column positions.
//!
//! Rule declarations and compile diagnostics are located by line/column
//! rather than byte offset, since rule text arrives from a script source the
//! lexer never sees as a whole. [`LineIndex`] converts scan-time byte
//! offsets into the same coordinates for uniform reporting.

use crate::text::TextSize;
use memchr::memchr2_iter;
use std::fmt;

#[cfg(feature = "serialize")]
use serde::{Deserialize, Serialize};

/// A line and column position in source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct LineCol {
    /// Zero-based line number
    pub line: u32,
    /// Zero-based column number (in UTF-8 bytes)
    pub column: u32,
}

impl LineCol {
    #[must_use]
    pub const fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for LineCol {
    /// One-based rendering, as editors show it.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line + 1, self.column + 1)
    }
}

/// Line index for converting byte offsets to line/column positions.
///
/// Caches line start offsets for O(log n) lookups; build it once per input
/// when several offsets need converting.
#[derive(Debug, Clone)]
pub struct LineIndex {
    /// Byte offsets of line starts, always beginning with 0
    line_starts: Vec<TextSize>,
    text_len: TextSize,
}

impl LineIndex {
    /// Scans the text once for line breaks (`\n`, `\r\n`, and bare `\r`).
    #[must_use]
    pub fn new(text: &str) -> Self {
        let bytes = text.as_bytes();
        let mut line_starts = vec![TextSize::zero()];

        for i in memchr2_iter(b'\n', b'\r', bytes) {
            if bytes[i] == b'\n' {
                // A \n right after \r was already recorded at the \r.
                if i > 0 && bytes[i - 1] == b'\r' {
                    continue;
                }
                line_starts.push(TextSize::of(i + 1));
            } else if bytes.get(i + 1) == Some(&b'\n') {
                line_starts.push(TextSize::of(i + 2));
            } else {
                line_starts.push(TextSize::of(i + 1));
            }
        }

        Self {
            line_starts,
            text_len: TextSize::of(text.len()),
        }
    }

    /// Convert a byte offset to a line/column position.
    ///
    /// # Panics
    ///
    /// Panics if `offset` is greater than the text length.
    #[must_use]
    pub fn line_col(&self, offset: TextSize) -> LineCol {
        assert!(
            offset.into() <= self.text_len.into(),
            "offset {} exceeds text length {}",
            offset.into(),
            self.text_len.into()
        );

        let line = match self.line_starts.binary_search(&offset) {
            Ok(idx) => idx,
            Err(idx) => idx.saturating_sub(1),
        };

        let line_start = self.line_starts[line];
        LineCol {
            line: u32::try_from(line).unwrap_or(u32::MAX),
            column: offset.into().saturating_sub(line_start.into()),
        }
    }

    #[must_use]
    pub fn line_count(&self) -> u32 {
        u32::try_from(self.line_starts.len()).unwrap_or(u32::MAX)
    }

    /// Byte offset of the start of `line`, or `None` past the last line.
    #[must_use]
    pub fn line_start(&self, line: u32) -> Option<TextSize> {
        self.line_starts.get(line as usize).copied()
    }
}
