//! Parser state - token cursor, expectations and error reporting.

use classflat_common::diagnostics::{diagnostic_codes, diagnostic_messages, format_message};
use classflat_common::limits::MAX_BRACKET_DEPTH;
use classflat_common::{CommentRange, Span};
use classflat_scanner::{SyntaxKind, Token, token_text, tokenize};
use std::sync::Arc;

/// A syntax error found while parsing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseDiagnostic {
    pub start: u32,
    pub length: u32,
    pub message: String,
    pub code: u32,
}

/// Parser over a pre-scanned token stream.
///
/// The whole file is tokenized up front. The parser only ever looks a few
/// tokens ahead, but having the tokens in a vector lets later phases walk
/// member bodies without scanning again.
pub struct ParserState {
    pub(crate) file_name: String,
    pub(crate) source: Arc<str>,
    pub(crate) tokens: Vec<Token>,
    pub(crate) comments: Vec<CommentRange>,
    /// Index of the current token.
    pub(crate) pos: usize,
    pub(crate) parse_diagnostics: Vec<ParseDiagnostic>,
    /// Start of the last reported error, to avoid cascades at one position.
    last_error_pos: Option<u32>,
}

impl ParserState {
    pub fn new(file_name: String, source_text: String) -> Self {
        let scanned = tokenize(&source_text);
        let parse_diagnostics = scanned
            .diagnostics
            .iter()
            .map(|d| ParseDiagnostic {
                start: d.pos as u32,
                length: d.length as u32,
                message: d.message.to_string(),
                code: d.code,
            })
            .collect();
        ParserState {
            file_name,
            source: Arc::from(source_text),
            tokens: scanned.tokens,
            comments: scanned.comments,
            pos: 0,
            parse_diagnostics,
            last_error_pos: None,
        }
    }

    pub fn get_diagnostics(&self) -> &[ParseDiagnostic] {
        &self.parse_diagnostics
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    // =========================================================================
    // Token access
    // =========================================================================

    #[inline]
    pub(crate) fn current(&self) -> Token {
        // The token vector always ends with EndOfFileToken and the cursor
        // never moves past it.
        self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    #[inline]
    pub(crate) fn token(&self) -> SyntaxKind {
        self.current().kind
    }

    #[inline]
    pub(crate) fn token_pos(&self) -> u32 {
        self.current().pos
    }

    #[inline]
    pub(crate) fn token_end(&self) -> u32 {
        self.current().end
    }

    #[inline]
    pub(crate) fn is_token(&self, kind: SyntaxKind) -> bool {
        self.token() == kind
    }

    pub(crate) fn token_text(&self) -> &str {
        self.current().text(&self.source)
    }

    /// The token `offset` positions ahead of the current one.
    pub(crate) fn peek(&self, offset: usize) -> Token {
        let idx = (self.pos + offset).min(self.tokens.len() - 1);
        self.tokens[idx]
    }

    #[inline]
    pub(crate) fn peek_kind(&self, offset: usize) -> SyntaxKind {
        self.peek(offset).kind
    }

    /// The token before the current one, if any.
    pub(crate) fn previous(&self) -> Option<Token> {
        self.pos.checked_sub(1).map(|idx| self.tokens[idx])
    }

    /// End of the previously consumed token, or the start of the current
    /// token at the beginning of the file.
    pub(crate) fn previous_token_end(&self) -> u32 {
        self.previous().map_or(self.token_pos(), |t| t.end)
    }

    pub(crate) fn next_token(&mut self) -> SyntaxKind {
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        self.token()
    }

    pub(crate) fn parse_optional(&mut self, kind: SyntaxKind) -> bool {
        if self.is_token(kind) {
            self.next_token();
            true
        } else {
            false
        }
    }

    /// Consume `kind` or report `'x' expected.` at the current token.
    pub(crate) fn parse_expected(&mut self, kind: SyntaxKind) -> bool {
        if self.parse_optional(kind) {
            return true;
        }
        let message = format_message(diagnostic_messages::TOKEN_EXPECTED, &[token_text(kind)]);
        self.parse_error_at_current_token(&message, diagnostic_codes::TOKEN_EXPECTED);
        false
    }

    // =========================================================================
    // Errors
    // =========================================================================

    pub(crate) fn parse_error_at_current_token(&mut self, message: &str, code: u32) {
        let token = self.current();
        self.parse_error_at(token.pos, token.end - token.pos, message, code);
    }

    pub(crate) fn parse_error_at(&mut self, start: u32, length: u32, message: &str, code: u32) {
        if self.last_error_pos == Some(start) {
            return;
        }
        self.last_error_pos = Some(start);
        self.parse_diagnostics.push(ParseDiagnostic {
            start,
            length,
            message: message.to_string(),
            code,
        });
    }

    // =========================================================================
    // Balanced skipping
    // =========================================================================

    /// Skip from the current opening bracket through its matching closer and
    /// return the covered span.
    ///
    /// Template substitutions are already split into separate token kinds by
    /// the scanner, so only the three bracket pairs need counting here.
    pub(crate) fn skip_balanced(&mut self) -> Span {
        let start = self.token_pos();
        let mut closers: Vec<SyntaxKind> = Vec::new();
        loop {
            let kind = self.token();
            match kind {
                SyntaxKind::EndOfFileToken => {
                    let expected = closers.last().copied().unwrap_or(SyntaxKind::CloseBraceToken);
                    let message =
                        format_message(diagnostic_messages::TOKEN_EXPECTED, &[token_text(expected)]);
                    self.parse_error_at_current_token(&message, diagnostic_codes::TOKEN_EXPECTED);
                    return Span::new(start, self.token_pos());
                }
                SyntaxKind::OpenBraceToken
                | SyntaxKind::OpenParenToken
                | SyntaxKind::OpenBracketToken => {
                    if closers.len() >= MAX_BRACKET_DEPTH {
                        self.parse_error_at_current_token(
                            diagnostic_messages::UNEXPECTED_END_OF_TEXT,
                            diagnostic_codes::UNEXPECTED_END_OF_TEXT,
                        );
                        while !self.is_token(SyntaxKind::EndOfFileToken) {
                            self.next_token();
                        }
                        return Span::new(start, self.token_pos());
                    }
                    closers.push(closer_for(kind));
                }
                SyntaxKind::CloseBraceToken
                | SyntaxKind::CloseParenToken
                | SyntaxKind::CloseBracketToken => {
                    if closers.last() == Some(&kind) {
                        closers.pop();
                    } else if let Some(depth) = closers.iter().rposition(|k| *k == kind) {
                        // Unclosed inner brackets: report and resync on this closer.
                        let message = format_message(
                            diagnostic_messages::TOKEN_EXPECTED,
                            &[token_text(closers[closers.len() - 1])],
                        );
                        self.parse_error_at_current_token(&message, diagnostic_codes::TOKEN_EXPECTED);
                        closers.truncate(depth);
                    } else {
                        let message = format_message(
                            diagnostic_messages::UNEXPECTED_TOKEN,
                            &[token_text(kind)],
                        );
                        self.parse_error_at_current_token(&message, diagnostic_codes::UNEXPECTED_TOKEN);
                    }
                    if closers.is_empty() {
                        let end = self.token_end();
                        self.next_token();
                        return Span::new(start, end);
                    }
                }
                _ => {}
            }
            self.next_token();
        }
    }

    /// Skip a TypeScript type argument or parameter list starting at `<`.
    pub(crate) fn skip_type_arguments(&mut self) {
        let mut depth: i32 = 0;
        loop {
            match self.token() {
                SyntaxKind::LessThanToken => depth += 1,
                SyntaxKind::GreaterThanToken => depth -= 1,
                SyntaxKind::GreaterThanGreaterThanToken => depth -= 2,
                SyntaxKind::GreaterThanGreaterThanGreaterThanToken => depth -= 3,
                SyntaxKind::OpenParenToken
                | SyntaxKind::OpenBracketToken
                | SyntaxKind::OpenBraceToken => {
                    self.skip_balanced();
                    continue;
                }
                SyntaxKind::EndOfFileToken | SyntaxKind::SemicolonToken => return,
                _ => {}
            }
            self.next_token();
            if depth <= 0 {
                return;
            }
        }
    }

    // =========================================================================
    // Comments
    // =========================================================================

    /// Start of the comments that sit directly above `pos`, each on its own
    /// line, and no earlier than `floor`.
    pub(crate) fn leading_comments_start(&self, pos: u32, floor: u32) -> u32 {
        let text: &str = &self.source;
        let mut start = pos;
        let upto = self.comments.partition_point(|c| c.end <= pos);
        for comment in self.comments[..upto].iter().rev() {
            if comment.pos < floor {
                break;
            }
            let gap = Span::new(comment.end, start).text(text);
            let newlines = gap.matches('\n').count();
            if !gap.trim().is_empty() || newlines > 1 {
                break;
            }
            if !starts_own_line(text, comment.pos) {
                break;
            }
            start = comment.pos;
        }
        start
    }

    /// A comment starting on the same line right after `end`.
    pub(crate) fn trailing_comment_after(&self, end: u32) -> Option<Span> {
        let text: &str = &self.source;
        let idx = self.comments.partition_point(|c| c.pos < end);
        let comment = self.comments.get(idx)?;
        let gap = Span::new(end, comment.pos).text(text);
        if !gap.trim().is_empty() || gap.contains('\n') {
            return None;
        }
        if comment.is_multi_line && comment.get_text(text).contains('\n') {
            return None;
        }
        Some(Span::new(comment.pos, comment.end))
    }
}

fn closer_for(opener: SyntaxKind) -> SyntaxKind {
    match opener {
        SyntaxKind::OpenParenToken => SyntaxKind::CloseParenToken,
        SyntaxKind::OpenBracketToken => SyntaxKind::CloseBracketToken,
        _ => SyntaxKind::CloseBraceToken,
    }
}

/// Whether only whitespace precedes `pos` on its line.
pub(crate) fn starts_own_line(text: &str, pos: u32) -> bool {
    let before = &text.as_bytes()[..(pos as usize).min(text.len())];
    before
        .iter()
        .rev()
        .take_while(|b| **b != b'\n')
        .all(|b| b.is_ascii_whitespace())
}
