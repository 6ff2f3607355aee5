//! Comment ranges.
//!
//! Comments are trivia to the scanner, so they are not part of the parsed
//! tree. The scanner records their ranges and the printer uses them to carry a
//! member's leading comments (JSDoc and friends) over to the flattened class.

use serde::{Deserialize, Serialize};

/// A range representing a comment in the source text.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentRange {
    /// Start position (byte offset)
    pub pos: u32,
    /// End position (byte offset)
    pub end: u32,
    /// Whether this is a multi-line comment
    pub is_multi_line: bool,
    /// Whether this comment has a trailing newline
    pub has_trailing_new_line: bool,
}

impl CommentRange {
    pub fn new(pos: u32, end: u32, is_multi_line: bool, has_trailing_new_line: bool) -> Self {
        CommentRange {
            pos,
            end,
            is_multi_line,
            has_trailing_new_line,
        }
    }

    /// Get the comment text from source.
    pub fn get_text<'a>(&self, source: &'a str) -> &'a str {
        let start = self.pos as usize;
        let end = self.end as usize;
        if end <= source.len() && start < end {
            &source[start..end]
        } else {
            ""
        }
    }
}

/// Comments lying entirely inside `[start, end)`.
///
/// `comments` must be sorted by position, which is how the scanner produces
/// them.
pub fn comments_in_range(comments: &[CommentRange], start: u32, end: u32) -> &[CommentRange] {
    let first = comments.partition_point(|c| c.pos < start);
    let last = comments.partition_point(|c| c.end <= end);
    if first >= last {
        return &[];
    }
    &comments[first..last]
}

/// Check if a comment is a JSDoc comment.
pub fn is_jsdoc_comment(comment: &CommentRange, source: &str) -> bool {
    let text = comment.get_text(source);
    text.starts_with("/**") && !text.starts_with("/***")
}

/// Format a multi-line comment for output, re-indenting continuation lines.
pub fn format_multi_line_comment(text: &str, indent: &str) -> String {
    let lines: Vec<&str> = text.lines().collect();
    if lines.len() <= 1 {
        return text.to_string();
    }

    let mut result = String::new();
    for (i, line) in lines.iter().enumerate() {
        if i > 0 {
            result.push('\n');
            if !line.trim().is_empty() {
                result.push_str(indent);
                // Keep the conventional one-space alignment of ` * ` lines.
                if line.trim_start().starts_with('*') {
                    result.push(' ');
                }
            }
            result.push_str(line.trim_start());
        } else {
            result.push_str(line);
        }
    }
    result
}
