//! Scanner state machine.
//!
//! `ScannerState` turns source text into tokens one `scan()` call at a time.
//! The classflat parser only needs structure (braces, class headers, member
//! boundaries), so the scanner resolves the two context-sensitive corners of
//! JavaScript lexing itself instead of being re-driven by the parser:
//!
//! - `/` starts a regular expression unless the previous token can end an
//!   expression. A closing `}` counts as a statement boundary, and so does
//!   the `)` closing an `if`/`while`/`for`/`with` head.
//! - `}` resumes a template literal when it closes a `${` substitution; a
//!   stack of open braces tells the two apart.

use bitflags::bitflags;
use classflat_common::Span;
use classflat_common::comments::CommentRange;
use classflat_common::diagnostics::{diagnostic_codes, diagnostic_messages};

use crate::syntax_kind::{SyntaxKind, keyword_kind};

bitflags! {
    /// Per-token flags.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct TokenFlags: u8 {
        /// A line terminator appears between the previous token and this one.
        const PRECEDING_LINE_BREAK = 1 << 0;
        /// A literal or template chunk ran into the end of the text.
        const UNTERMINATED = 1 << 1;
        /// An identifier written with a unicode escape.
        const UNICODE_ESCAPE = 1 << 2;
    }
}

/// A scanned token.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Token {
    pub kind: SyntaxKind,
    pub pos: u32,
    pub end: u32,
    pub flags: TokenFlags,
}

impl Token {
    #[inline]
    pub fn span(&self) -> Span {
        Span::new(self.pos, self.end)
    }

    #[inline]
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        self.span().text(source)
    }

    #[inline]
    pub fn has_preceding_line_break(&self) -> bool {
        self.flags.contains(TokenFlags::PRECEDING_LINE_BREAK)
    }
}

/// A lexical error found while scanning.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScannerDiagnostic {
    pub pos: usize,
    pub length: usize,
    pub message: &'static str,
    pub code: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum OpenBrace {
    Block,
    TemplateSubstitution,
}

pub struct ScannerState<'a> {
    text: &'a str,
    bytes: &'a [u8],
    pos: usize,
    token: SyntaxKind,
    token_start: usize,
    token_flags: TokenFlags,
    /// Last non-trivia token, for regex detection.
    previous: SyntaxKind,
    /// One entry per open `(`: whether it opened a control statement head.
    paren_stack: Vec<bool>,
    /// The previous token is a `)` closing a control statement head.
    after_control_head: bool,
    brace_stack: Vec<OpenBrace>,
    comments: Vec<CommentRange>,
    diagnostics: Vec<ScannerDiagnostic>,
}

impl<'a> ScannerState<'a> {
    pub fn new(text: &'a str) -> Self {
        ScannerState {
            text,
            bytes: text.as_bytes(),
            pos: 0,
            token: SyntaxKind::Unknown,
            token_start: 0,
            token_flags: TokenFlags::empty(),
            previous: SyntaxKind::Unknown,
            paren_stack: Vec::new(),
            after_control_head: false,
            brace_stack: Vec::new(),
            comments: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    pub fn source_text(&self) -> &'a str {
        self.text
    }

    #[inline]
    pub fn get_token(&self) -> SyntaxKind {
        self.token
    }

    #[inline]
    pub fn get_token_start(&self) -> usize {
        self.token_start
    }

    #[inline]
    pub fn get_token_end(&self) -> usize {
        self.pos
    }

    pub fn get_token_text(&self) -> &'a str {
        &self.text[self.token_start..self.pos]
    }

    #[inline]
    pub fn get_token_flags(&self) -> TokenFlags {
        self.token_flags
    }

    #[inline]
    pub fn has_preceding_line_break(&self) -> bool {
        self.token_flags.contains(TokenFlags::PRECEDING_LINE_BREAK)
    }

    pub fn current(&self) -> Token {
        Token {
            kind: self.token,
            pos: self.token_start as u32,
            end: self.pos as u32,
            flags: self.token_flags,
        }
    }

    pub fn comment_ranges(&self) -> &[CommentRange] {
        &self.comments
    }

    pub fn get_scanner_diagnostics(&self) -> &[ScannerDiagnostic] {
        &self.diagnostics
    }

    /// Skip a `#!` line at the very start of the text.
    pub fn scan_shebang_trivia(&mut self) {
        if self.pos == 0 && self.bytes.starts_with(b"#!") {
            self.pos = memchr::memchr(b'\n', self.bytes).unwrap_or(self.bytes.len());
        }
    }

    fn error(&mut self, pos: usize, length: usize, message: &'static str, code: u32) {
        self.diagnostics.push(ScannerDiagnostic {
            pos,
            length,
            message,
            code,
        });
    }

    #[inline]
    fn peek(&self, offset: usize) -> u8 {
        self.bytes.get(self.pos + offset).copied().unwrap_or(0)
    }

    /// Scan the next token.
    pub fn scan(&mut self) -> SyntaxKind {
        self.token_flags = TokenFlags::empty();
        self.skip_trivia();
        self.token_start = self.pos;

        let kind = if self.pos >= self.bytes.len() {
            SyntaxKind::EndOfFileToken
        } else {
            self.scan_token()
        };

        self.token = kind;
        if kind != SyntaxKind::EndOfFileToken {
            self.after_control_head = match kind {
                SyntaxKind::OpenParenToken => {
                    self.paren_stack.push(matches!(
                        self.previous,
                        SyntaxKind::IfKeyword
                            | SyntaxKind::WhileKeyword
                            | SyntaxKind::ForKeyword
                            | SyntaxKind::WithKeyword
                    ));
                    false
                }
                SyntaxKind::CloseParenToken => self.paren_stack.pop().unwrap_or(false),
                _ => false,
            };
            self.previous = kind;
        }
        kind
    }

    fn skip_trivia(&mut self) {
        while self.pos < self.bytes.len() {
            match self.bytes[self.pos] {
                b'\n' | b'\r' => {
                    self.token_flags |= TokenFlags::PRECEDING_LINE_BREAK;
                    self.pos += 1;
                }
                b' ' | b'\t' | 0x0b | 0x0c => self.pos += 1,
                b'/' if self.peek(1) == b'/' => {
                    let start = self.pos;
                    let end = memchr::memchr2(b'\n', b'\r', &self.bytes[start..])
                        .map_or(self.bytes.len(), |i| start + i);
                    self.pos = end;
                    self.comments.push(CommentRange::new(
                        start as u32,
                        end as u32,
                        false,
                        end < self.bytes.len(),
                    ));
                }
                b'/' if self.peek(1) == b'*' => {
                    let start = self.pos;
                    let body = &self.bytes[start + 2..];
                    let end = match memchr::memmem::find(body, b"*/") {
                        Some(i) => start + 2 + i + 2,
                        None => {
                            self.error(
                                start,
                                self.bytes.len() - start,
                                diagnostic_messages::ASTERISK_SLASH_EXPECTED,
                                diagnostic_codes::ASTERISK_SLASH_EXPECTED,
                            );
                            self.bytes.len()
                        }
                    };
                    if memchr::memchr2(b'\n', b'\r', &self.bytes[start..end]).is_some() {
                        self.token_flags |= TokenFlags::PRECEDING_LINE_BREAK;
                    }
                    self.pos = end;
                    let trailing = matches!(self.bytes.get(end), Some(b'\n' | b'\r'));
                    self.comments
                        .push(CommentRange::new(start as u32, end as u32, true, trailing));
                }
                0xC2 if self.peek(1) == 0xA0 => self.pos += 2, // NBSP
                0xEF if self.peek(1) == 0xBB && self.peek(2) == 0xBF => self.pos += 3, // BOM
                0xE2 if self.peek(1) == 0x80 && matches!(self.peek(2), 0xA8 | 0xA9) => {
                    // U+2028 / U+2029
                    self.token_flags |= TokenFlags::PRECEDING_LINE_BREAK;
                    self.pos += 3;
                }
                _ => break,
            }
        }
    }

    fn scan_token(&mut self) -> SyntaxKind {
        let ch = self.bytes[self.pos];
        match ch {
            b'{' => {
                self.pos += 1;
                self.brace_stack.push(OpenBrace::Block);
                SyntaxKind::OpenBraceToken
            }
            b'}' => {
                if self.brace_stack.last() == Some(&OpenBrace::TemplateSubstitution) {
                    self.brace_stack.pop();
                    self.pos += 1;
                    return self.scan_template_chunk(false);
                }
                self.brace_stack.pop();
                self.pos += 1;
                SyntaxKind::CloseBraceToken
            }
            b'(' => self.single(SyntaxKind::OpenParenToken),
            b')' => self.single(SyntaxKind::CloseParenToken),
            b'[' => self.single(SyntaxKind::OpenBracketToken),
            b']' => self.single(SyntaxKind::CloseBracketToken),
            b';' => self.single(SyntaxKind::SemicolonToken),
            b',' => self.single(SyntaxKind::CommaToken),
            b':' => self.single(SyntaxKind::ColonToken),
            b'~' => self.single(SyntaxKind::TildeToken),
            b'@' => self.single(SyntaxKind::AtToken),
            b'\'' | b'"' => self.scan_string(ch),
            b'`' => {
                self.pos += 1;
                self.scan_template_chunk(true)
            }
            b'.' => {
                if self.peek(1).is_ascii_digit() {
                    self.scan_number()
                } else if self.peek(1) == b'.' && self.peek(2) == b'.' {
                    self.pos += 3;
                    SyntaxKind::DotDotDotToken
                } else {
                    self.single(SyntaxKind::DotToken)
                }
            }
            b'0'..=b'9' => self.scan_number(),
            b'#' => self.scan_private_identifier(),
            b'/' => {
                let regex_allowed = self.previous == SyntaxKind::CloseBraceToken
                    || self.after_control_head
                    || !self.previous.can_end_expression();
                if regex_allowed {
                    self.scan_regex()
                } else {
                    self.operator(&[
                        ("/=", SyntaxKind::SlashEqualsToken),
                        ("/", SyntaxKind::SlashToken),
                    ])
                }
            }
            b'=' => self.operator(&[
                ("===", SyntaxKind::EqualsEqualsEqualsToken),
                ("==", SyntaxKind::EqualsEqualsToken),
                ("=>", SyntaxKind::EqualsGreaterThanToken),
                ("=", SyntaxKind::EqualsToken),
            ]),
            b'!' => self.operator(&[
                ("!==", SyntaxKind::ExclamationEqualsEqualsToken),
                ("!=", SyntaxKind::ExclamationEqualsToken),
                ("!", SyntaxKind::ExclamationToken),
            ]),
            b'+' => self.operator(&[
                ("++", SyntaxKind::PlusPlusToken),
                ("+=", SyntaxKind::PlusEqualsToken),
                ("+", SyntaxKind::PlusToken),
            ]),
            b'-' => self.operator(&[
                ("--", SyntaxKind::MinusMinusToken),
                ("-=", SyntaxKind::MinusEqualsToken),
                ("-", SyntaxKind::MinusToken),
            ]),
            b'*' => self.operator(&[
                ("**=", SyntaxKind::AsteriskAsteriskEqualsToken),
                ("**", SyntaxKind::AsteriskAsteriskToken),
                ("*=", SyntaxKind::AsteriskEqualsToken),
                ("*", SyntaxKind::AsteriskToken),
            ]),
            b'%' => self.operator(&[
                ("%=", SyntaxKind::PercentEqualsToken),
                ("%", SyntaxKind::PercentToken),
            ]),
            b'<' => self.operator(&[
                ("<<=", SyntaxKind::LessThanLessThanEqualsToken),
                ("<<", SyntaxKind::LessThanLessThanToken),
                ("<=", SyntaxKind::LessThanEqualsToken),
                ("<", SyntaxKind::LessThanToken),
            ]),
            b'>' => self.operator(&[
                (">>>=", SyntaxKind::GreaterThanGreaterThanGreaterThanEqualsToken),
                (">>>", SyntaxKind::GreaterThanGreaterThanGreaterThanToken),
                (">>=", SyntaxKind::GreaterThanGreaterThanEqualsToken),
                (">>", SyntaxKind::GreaterThanGreaterThanToken),
                (">=", SyntaxKind::GreaterThanEqualsToken),
                (">", SyntaxKind::GreaterThanToken),
            ]),
            b'&' => self.operator(&[
                ("&&=", SyntaxKind::AmpersandAmpersandEqualsToken),
                ("&&", SyntaxKind::AmpersandAmpersandToken),
                ("&=", SyntaxKind::AmpersandEqualsToken),
                ("&", SyntaxKind::AmpersandToken),
            ]),
            b'|' => self.operator(&[
                ("||=", SyntaxKind::BarBarEqualsToken),
                ("||", SyntaxKind::BarBarToken),
                ("|=", SyntaxKind::BarEqualsToken),
                ("|", SyntaxKind::BarToken),
            ]),
            b'^' => self.operator(&[
                ("^=", SyntaxKind::CaretEqualsToken),
                ("^", SyntaxKind::CaretToken),
            ]),
            b'?' => {
                // `?.5` is a conditional followed by a number, not optional chaining.
                if self.peek(1) == b'.' && !self.peek(2).is_ascii_digit() {
                    self.pos += 2;
                    SyntaxKind::QuestionDotToken
                } else {
                    self.operator(&[
                        ("??=", SyntaxKind::QuestionQuestionEqualsToken),
                        ("??", SyntaxKind::QuestionQuestionToken),
                        ("?", SyntaxKind::QuestionToken),
                    ])
                }
            }
            b'\\' if self.peek(1) == b'u' => self.scan_identifier(),
            _ if is_identifier_start(ch) => self.scan_identifier(),
            _ if ch >= 0x80 => {
                let c = self.text[self.pos..].chars().next().unwrap_or('\u{FFFD}');
                if c.is_alphabetic() {
                    self.scan_identifier()
                } else {
                    let len = c.len_utf8();
                    self.error(
                        self.pos,
                        len,
                        diagnostic_messages::INVALID_CHARACTER,
                        diagnostic_codes::INVALID_CHARACTER,
                    );
                    self.pos += len;
                    SyntaxKind::Unknown
                }
            }
            _ => {
                self.error(
                    self.pos,
                    1,
                    diagnostic_messages::INVALID_CHARACTER,
                    diagnostic_codes::INVALID_CHARACTER,
                );
                self.pos += 1;
                SyntaxKind::Unknown
            }
        }
    }

    #[inline]
    fn single(&mut self, kind: SyntaxKind) -> SyntaxKind {
        self.pos += 1;
        kind
    }

    /// Longest-match operator scan; `candidates` are ordered longest first.
    fn operator(&mut self, candidates: &[(&str, SyntaxKind)]) -> SyntaxKind {
        let rest = &self.bytes[self.pos..];
        for (text, kind) in candidates {
            if rest.starts_with(text.as_bytes()) {
                self.pos += text.len();
                return *kind;
            }
        }
        self.pos += 1;
        SyntaxKind::Unknown
    }

    fn scan_identifier_part(&mut self) {
        while self.pos < self.bytes.len() {
            let ch = self.bytes[self.pos];
            if is_identifier_part(ch) {
                self.pos += 1;
            } else if ch == b'\\' && self.peek(1) == b'u' {
                self.token_flags |= TokenFlags::UNICODE_ESCAPE;
                self.pos += 2;
                if self.peek(0) == b'{' {
                    while self.pos < self.bytes.len() && self.bytes[self.pos] != b'}' {
                        self.pos += 1;
                    }
                    self.pos = (self.pos + 1).min(self.bytes.len());
                } else {
                    self.pos = (self.pos + 4).min(self.bytes.len());
                }
            } else if ch >= 0x80 {
                match self.text[self.pos..].chars().next() {
                    Some(c) if c.is_alphanumeric() || c == '\u{200C}' || c == '\u{200D}' => {
                        self.pos += c.len_utf8();
                    }
                    _ => break,
                }
            } else {
                break;
            }
        }
    }

    fn scan_identifier(&mut self) -> SyntaxKind {
        self.scan_identifier_part();
        let text = &self.text[self.token_start..self.pos];
        keyword_kind(text).unwrap_or(SyntaxKind::Identifier)
    }

    fn scan_private_identifier(&mut self) -> SyntaxKind {
        self.pos += 1;
        let name_start = self.pos;
        self.scan_identifier_part();
        if self.pos == name_start {
            self.error(
                self.token_start,
                1,
                diagnostic_messages::INVALID_CHARACTER,
                diagnostic_codes::INVALID_CHARACTER,
            );
            return SyntaxKind::Unknown;
        }
        SyntaxKind::PrivateIdentifier
    }

    fn scan_number(&mut self) -> SyntaxKind {
        if self.peek(0) == b'0' && matches!(self.peek(1), b'x' | b'X' | b'o' | b'O' | b'b' | b'B') {
            self.pos += 2;
            while self.peek(0).is_ascii_hexdigit() || self.peek(0) == b'_' {
                self.pos += 1;
            }
        } else {
            while self.peek(0).is_ascii_digit() || self.peek(0) == b'_' {
                self.pos += 1;
            }
            if self.peek(0) == b'.' {
                self.pos += 1;
                while self.peek(0).is_ascii_digit() || self.peek(0) == b'_' {
                    self.pos += 1;
                }
            }
            if matches!(self.peek(0), b'e' | b'E') {
                let sign = usize::from(matches!(self.peek(1), b'+' | b'-'));
                if self.peek(1 + sign).is_ascii_digit() {
                    self.pos += 1 + sign;
                    while self.peek(0).is_ascii_digit() || self.peek(0) == b'_' {
                        self.pos += 1;
                    }
                }
            }
        }
        if self.peek(0) == b'n' {
            self.pos += 1;
            return SyntaxKind::BigIntLiteral;
        }
        SyntaxKind::NumericLiteral
    }

    fn scan_string(&mut self, quote: u8) -> SyntaxKind {
        self.pos += 1;
        loop {
            if self.pos >= self.bytes.len() {
                return self.unterminated_string();
            }
            match self.bytes[self.pos] {
                c if c == quote => {
                    self.pos += 1;
                    return SyntaxKind::StringLiteral;
                }
                b'\\' => {
                    // Escapes include line continuations (`\` + newline).
                    self.pos += 1;
                    if self.peek(0) == b'\r' && self.peek(1) == b'\n' {
                        self.pos += 2;
                    } else if self.pos < self.bytes.len() {
                        self.pos += utf8_len(self.bytes[self.pos]);
                    }
                }
                b'\n' | b'\r' => return self.unterminated_string(),
                _ => self.pos += 1,
            }
        }
    }

    fn unterminated_string(&mut self) -> SyntaxKind {
        self.token_flags |= TokenFlags::UNTERMINATED;
        self.error(
            self.token_start,
            self.pos - self.token_start,
            diagnostic_messages::UNTERMINATED_STRING_LITERAL,
            diagnostic_codes::UNTERMINATED_STRING_LITERAL,
        );
        SyntaxKind::StringLiteral
    }

    /// Scan template text after a backtick (`head`) or after the `}` that
    /// closes a substitution.
    fn scan_template_chunk(&mut self, head: bool) -> SyntaxKind {
        loop {
            if self.pos >= self.bytes.len() {
                self.token_flags |= TokenFlags::UNTERMINATED;
                self.error(
                    self.token_start,
                    self.pos - self.token_start,
                    diagnostic_messages::UNTERMINATED_TEMPLATE_LITERAL,
                    diagnostic_codes::UNTERMINATED_TEMPLATE_LITERAL,
                );
                return if head {
                    SyntaxKind::NoSubstitutionTemplateLiteral
                } else {
                    SyntaxKind::TemplateTail
                };
            }
            match self.bytes[self.pos] {
                b'`' => {
                    self.pos += 1;
                    return if head {
                        SyntaxKind::NoSubstitutionTemplateLiteral
                    } else {
                        SyntaxKind::TemplateTail
                    };
                }
                b'$' if self.peek(1) == b'{' => {
                    self.pos += 2;
                    self.brace_stack.push(OpenBrace::TemplateSubstitution);
                    return if head {
                        SyntaxKind::TemplateHead
                    } else {
                        SyntaxKind::TemplateMiddle
                    };
                }
                b'\\' => self.pos = (self.pos + 2).min(self.bytes.len()),
                _ => self.pos += 1,
            }
        }
    }

    fn scan_regex(&mut self) -> SyntaxKind {
        self.pos += 1;
        let mut in_class = false;
        loop {
            if self.pos >= self.bytes.len() || matches!(self.bytes[self.pos], b'\n' | b'\r') {
                self.token_flags |= TokenFlags::UNTERMINATED;
                self.error(
                    self.token_start,
                    self.pos - self.token_start,
                    diagnostic_messages::UNTERMINATED_REGULAR_EXPRESSION_LITERAL,
                    diagnostic_codes::UNTERMINATED_REGULAR_EXPRESSION_LITERAL,
                );
                return SyntaxKind::RegularExpressionLiteral;
            }
            match self.bytes[self.pos] {
                b'\\' => self.pos = (self.pos + 2).min(self.bytes.len()),
                b'[' => {
                    in_class = true;
                    self.pos += 1;
                }
                b']' => {
                    in_class = false;
                    self.pos += 1;
                }
                b'/' if !in_class => {
                    self.pos += 1;
                    break;
                }
                _ => self.pos += 1,
            }
        }
        // Flags
        while self.pos < self.bytes.len() && self.bytes[self.pos].is_ascii_alphabetic() {
            self.pos += 1;
        }
        SyntaxKind::RegularExpressionLiteral
    }
}

#[inline]
fn is_identifier_start(ch: u8) -> bool {
    ch.is_ascii_alphabetic() || ch == b'_' || ch == b'$'
}

#[inline]
fn is_identifier_part(ch: u8) -> bool {
    ch.is_ascii_alphanumeric() || ch == b'_' || ch == b'$'
}

#[inline]
fn utf8_len(first: u8) -> usize {
    match first {
        0x00..=0x7F => 1,
        0xC0..=0xDF => 2,
        0xE0..=0xEF => 3,
        _ => 4,
    }
}

/// Result of scanning a whole text.
#[derive(Debug, Default)]
pub struct TokenizeResult {
    /// All tokens, ending with `EndOfFileToken`.
    pub tokens: Vec<Token>,
    pub comments: Vec<CommentRange>,
    pub diagnostics: Vec<ScannerDiagnostic>,
}

/// Scan `text` to completion.
pub fn tokenize(text: &str) -> TokenizeResult {
    let mut scanner = ScannerState::new(text);
    scanner.scan_shebang_trivia();
    let mut tokens = Vec::with_capacity(text.len() / 4);
    loop {
        let kind = scanner.scan();
        tokens.push(scanner.current());
        if kind == SyntaxKind::EndOfFileToken {
            break;
        }
    }
    TokenizeResult {
        tokens,
        comments: scanner.comments,
        diagnostics: scanner.diagnostics,
    }
}
