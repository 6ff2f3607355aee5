//! Text edits over source spans.
//!
//! Member bodies are never re-printed from a tree. Their source text is
//! copied and the `super` sites inside are patched with `TextEdit`s.

use classflat_common::Span;
use classflat_parser::SourceFile;
use classflat_scanner::SyntaxKind;

/// Replace `span` (absolute source offsets) with `replacement`.
///
/// Replacements never contain line breaks.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextEdit {
    pub span: Span,
    pub replacement: String,
}

impl TextEdit {
    pub fn replace(span: Span, replacement: impl Into<String>) -> Self {
        TextEdit {
            span,
            replacement: replacement.into(),
        }
    }

    pub fn delete(span: Span) -> Self {
        TextEdit {
            span,
            replacement: String::new(),
        }
    }
}

/// Member text ready for re-indentation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MemberText {
    pub text: String,
    /// One flag per line break in `text`: whether the line after it starts
    /// inside a template or string literal and must be copied verbatim.
    pub verbatim_lines: Vec<bool>,
}

impl MemberText {
    /// Prepend single-line text, e.g. a synthesized member's name.
    pub fn with_prefix(mut self, prefix: &str) -> Self {
        self.text.insert_str(0, prefix);
        self
    }

    pub fn ends_with(&self, suffix: &str) -> bool {
        self.text.trim_end().ends_with(suffix)
    }
}

/// Copy `region` out of the source with `edits` applied.
///
/// Edits must lie inside `region` and must not overlap; they are sorted
/// here.
pub fn apply_edits(source_file: &SourceFile, region: Span, edits: &mut [TextEdit]) -> MemberText {
    edits.sort_by_key(|edit| (edit.span.start, edit.span.end));
    let text: &str = &source_file.text;
    let protected = multi_line_literals(source_file, region);

    let mut out = MemberText::default();
    let mut cursor = region.start;
    for edit in edits.iter() {
        if edit.span.start < cursor || edit.span.end > region.end {
            continue;
        }
        copy_segment(text, Span::new(cursor, edit.span.start), &protected, &mut out);
        out.text.push_str(&edit.replacement);
        cursor = edit.span.end;
    }
    copy_segment(text, Span::new(cursor, region.end), &protected, &mut out);
    out
}

fn copy_segment(text: &str, segment: Span, protected: &[Span], out: &mut MemberText) {
    let slice = segment.text(text);
    let mut offset = segment.start;
    for piece in slice.split_inclusive('\n') {
        out.text.push_str(piece);
        if piece.ends_with('\n') {
            let newline = offset + piece.len() as u32 - 1;
            out.verbatim_lines.push(
                protected
                    .iter()
                    .any(|span| span.start <= newline && newline < span.end),
            );
        }
        offset += piece.len() as u32;
    }
}

/// Spans of literal tokens inside `region` that contain line breaks.
fn multi_line_literals(source_file: &SourceFile, region: Span) -> Vec<Span> {
    source_file
        .tokens_in(region)
        .iter()
        .filter(|token| {
            matches!(
                token.kind,
                SyntaxKind::NoSubstitutionTemplateLiteral
                    | SyntaxKind::TemplateHead
                    | SyntaxKind::TemplateMiddle
                    | SyntaxKind::TemplateTail
                    | SyntaxKind::StringLiteral
            ) && token.text(&source_file.text).contains('\n')
        })
        .map(|token| token.span())
        .collect()
}

/// Extend a deletion to the whole line when nothing else is on it.
pub fn extend_to_whole_line(text: &str, span: Span) -> Span {
    let bytes = text.as_bytes();
    let start = span.start as usize;
    let end = (span.end as usize).min(bytes.len());
    let line_start = bytes[..start]
        .iter()
        .rposition(|b| *b == b'\n')
        .map_or(0, |i| i + 1);
    let before_blank = bytes[line_start..start]
        .iter()
        .all(|b| *b == b' ' || *b == b'\t');
    let line_end = bytes[end..]
        .iter()
        .position(|b| *b == b'\n')
        .map_or(bytes.len(), |i| end + i);
    let after_blank = bytes[end..line_end]
        .iter()
        .all(|b| *b == b' ' || *b == b'\t' || *b == b'\r');
    if before_blank && after_blank && line_end < bytes.len() {
        Span::new(line_start as u32, line_end as u32 + 1)
    } else {
        span
    }
}
