//! Line/column positions.
//!
//! The reporter needs 1-based line and column numbers for byte offsets; the
//! printer needs the column a member starts at so it can re-indent the
//! member's text. Both go through `LineMap`.

use serde::Serialize;

/// A zero-based line/character position.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Position {
    pub line: u32,
    pub character: u32,
}

/// Byte offsets of line starts for one source text.
#[derive(Clone, Debug, Default)]
pub struct LineMap {
    line_starts: Vec<u32>,
}

impl LineMap {
    pub fn build(source: &str) -> Self {
        let mut line_starts = vec![0u32];
        for idx in memchr::memchr_iter(b'\n', source.as_bytes()) {
            line_starts.push((idx + 1) as u32);
        }
        LineMap { line_starts }
    }

    /// Convert a byte offset into a zero-based position.
    pub fn position(&self, offset: u32) -> Position {
        let line = match self.line_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(next) => next.saturating_sub(1),
        };
        Position {
            line: line as u32,
            character: offset - self.line_starts[line],
        }
    }

    /// Byte offset of the start of the line containing `offset`.
    pub fn line_start(&self, offset: u32) -> u32 {
        let pos = self.position(offset);
        self.line_starts[pos.line as usize]
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }
}

/// Width (in bytes) of the leading whitespace of the line containing `offset`.
pub fn indentation_of(source: &str, offset: u32) -> usize {
    let bytes = source.as_bytes();
    let offset = (offset as usize).min(bytes.len());
    let line_start = memchr::memrchr(b'\n', &bytes[..offset]).map_or(0, |i| i + 1);
    bytes[line_start..offset]
        .iter()
        .take_while(|b| **b == b' ' || **b == b'\t')
        .count()
}
