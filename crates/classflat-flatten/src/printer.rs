//! Printer and output assembly.
//!
//! `Printer` renders one flattened class from already rewritten member
//! text. `OutputWriter` splices printed classes back between the untouched
//! top-level statements of the unit.

use crate::text::MemberText;
use classflat_common::PrinterOptions;
use classflat_common::comments::format_multi_line_comment;

/// One member as the printer sees it.
#[derive(Clone, Debug, Default)]
pub struct PrintedMember {
    /// Comments that precede the member in its source, verbatim.
    pub leading_comments: Vec<String>,
    /// Source-attribution note, printed as a `//` comment when enabled.
    pub annotation: Option<String>,
    pub body: MemberText,
    /// Indentation of the member's first line in its source.
    pub source_indent: usize,
    pub trailing_comment: Option<String>,
    pub is_field: bool,
}

pub struct Printer {
    options: PrinterOptions,
    indent: String,
}

impl Printer {
    pub fn new(options: PrinterOptions) -> Self {
        Printer {
            indent: options.indent(),
            options,
        }
    }

    /// Print `header { members }`.
    pub fn print_class(&self, header: &str, members: &[PrintedMember]) -> String {
        let mut out = String::with_capacity(
            header.len() + members.iter().map(|m| m.body.text.len() + 8).sum::<usize>(),
        );
        out.push_str(header);
        if members.is_empty() {
            out.push_str(" {}");
            return out;
        }
        out.push_str(" {\n");
        for (i, member) in members.iter().enumerate() {
            if i > 0 {
                out.push('\n');
                // Consecutive fields stay together; everything else gets a
                // blank line.
                if !(member.is_field && members[i - 1].is_field) {
                    out.push('\n');
                }
            }
            self.write_member(&mut out, member);
        }
        out.push_str("\n}");
        out
    }

    fn write_member(&self, out: &mut String, member: &PrintedMember) {
        for comment in &member.leading_comments {
            out.push_str(&self.indent);
            out.push_str(&format_multi_line_comment(comment.trim(), &self.indent));
            out.push('\n');
        }
        if self.options.annotate_inherited {
            if let Some(annotation) = &member.annotation {
                out.push_str(&self.indent);
                out.push_str("// ");
                out.push_str(annotation);
                out.push('\n');
            }
        }
        out.push_str(&self.reindent(&member.body, member.source_indent));
        if member.is_field && !member.body.ends_with(";") {
            out.push(';');
        }
        if let Some(comment) = &member.trailing_comment {
            out.push(' ');
            out.push_str(comment);
        }
    }

    /// Shift `body` from its source indentation to the member indentation.
    ///
    /// Lines that begin inside a multi-line string or template are copied
    /// as they are.
    pub fn reindent(&self, body: &MemberText, source_indent: usize) -> String {
        let mut out = String::with_capacity(body.text.len() + 16);
        for (i, line) in body.text.trim_end().split('\n').enumerate() {
            if i == 0 {
                out.push_str(&self.indent);
                out.push_str(line.trim_start());
                continue;
            }
            out.push('\n');
            if body.verbatim_lines.get(i - 1).copied().unwrap_or(false) {
                out.push_str(line);
            } else if !line.trim().is_empty() {
                out.push_str(&self.indent);
                out.push_str(strip_indent(line, source_indent));
            }
        }
        out
    }
}

/// Remove up to `width` leading spaces or tabs.
fn strip_indent(line: &str, width: usize) -> &str {
    let strip = line
        .bytes()
        .take(width)
        .take_while(|b| *b == b' ' || *b == b'\t')
        .count();
    &line[strip..]
}

/// Builds the output text of a unit.
#[derive(Debug, Default)]
pub struct OutputWriter {
    out: String,
    /// A class was left out since the last write; the blank lines around
    /// it are merged at the next write.
    pending_join: bool,
}

impl OutputWriter {
    pub fn new() -> Self {
        OutputWriter::default()
    }

    pub fn write(&mut self, piece: &str) {
        if !self.pending_join {
            self.out.push_str(piece);
            return;
        }

        let content = piece.trim_start();
        let leading = &piece[..piece.len() - content.len()];
        let newlines = leading.matches('\n').count();
        // At most one blank line where a class was removed, none at the
        // start of the output.
        let allowed = if self.out.trim().is_empty() {
            self.out.clear();
            0
        } else {
            let content_end = self.out.trim_end().len();
            2usize.saturating_sub(self.out[content_end..].matches('\n').count())
        };
        for _ in 0..newlines.min(allowed) {
            self.out.push('\n');
        }
        if content.is_empty() {
            return;
        }
        self.pending_join = false;
        let indentation = leading.rfind('\n').map_or(leading, |i| &leading[i + 1..]);
        self.out.push_str(indentation);
        self.out.push_str(content);
    }

    /// Record that a class was left out at this point.
    pub fn elide(&mut self) {
        self.pending_join = true;
        // Blank lines already written before the elided class count against
        // the join.
        let trimmed = self.out.trim_end_matches([' ', '\t']).len();
        self.out.truncate(trimmed);
        let content_end = self.out.trim_end().len();
        if self.out[content_end..].matches('\n').count() > 2 {
            self.out.truncate(content_end);
            self.out.push_str("\n\n");
        }
    }

    /// The finished text, ending with exactly one line break.
    pub fn finish(mut self) -> String {
        let trimmed = self.out.trim_end().len();
        self.out.truncate(trimmed);
        if !self.out.is_empty() {
            self.out.push('\n');
        }
        self.out
    }
}
