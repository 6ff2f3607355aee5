//! Parser state - top-level statements, class declarations and export clauses.

use super::state::ParserState;
use crate::node::{
    ClassDeclaration, ExportClause, ExportModifier, ExportSpecifier, Heritage, Identifier,
    SourceFile, Statement,
};
use classflat_common::Span;
use classflat_common::diagnostics::{diagnostic_codes, diagnostic_messages, format_message};
use classflat_scanner::{SyntaxKind, token_text};
use tracing::trace;

impl ParserState {
    /// Parse the whole file.
    ///
    /// Only class declarations at the top level of the file are parsed into
    /// nodes. Other statements are skipped with bracket counting and kept as
    /// `Statement::Other` spans that cover the text between classes.
    pub fn parse_source_file(&mut self) -> SourceFile {
        let mut statements = Vec::new();
        let mut export_clauses = Vec::new();
        let mut other_start = 0u32;
        let mut closers: Vec<SyntaxKind> = Vec::new();

        while !self.is_token(SyntaxKind::EndOfFileToken) {
            if closers.is_empty() && self.at_statement_start() {
                if let Some(export) = self.class_declaration_ahead() {
                    let class = self.parse_class_declaration(export, other_start);
                    let full = class.full_span();
                    if full.start > other_start {
                        statements.push(Statement::Other(Span::new(other_start, full.start)));
                    }
                    other_start = class.span.end;
                    statements.push(Statement::Class(class));
                    continue;
                }
                if self.is_token(SyntaxKind::ExportKeyword) {
                    if let Some(clause) = self.try_parse_export_clause() {
                        export_clauses.push(clause);
                        continue;
                    }
                }
            }

            let kind = self.token();
            match kind {
                SyntaxKind::OpenBraceToken => closers.push(SyntaxKind::CloseBraceToken),
                SyntaxKind::OpenParenToken => closers.push(SyntaxKind::CloseParenToken),
                SyntaxKind::OpenBracketToken => closers.push(SyntaxKind::CloseBracketToken),
                SyntaxKind::CloseBraceToken
                | SyntaxKind::CloseParenToken
                | SyntaxKind::CloseBracketToken => {
                    if closers.last() == Some(&kind) {
                        closers.pop();
                    } else if let Some(depth) = closers.iter().rposition(|k| *k == kind) {
                        let expected = closers[closers.len() - 1];
                        let message = format_message(
                            diagnostic_messages::TOKEN_EXPECTED,
                            &[token_text(expected)],
                        );
                        self.parse_error_at_current_token(&message, diagnostic_codes::TOKEN_EXPECTED);
                        closers.truncate(depth);
                    } else {
                        self.parse_error_at_current_token(
                            diagnostic_messages::DECLARATION_OR_STATEMENT_EXPECTED,
                            diagnostic_codes::DECLARATION_OR_STATEMENT_EXPECTED,
                        );
                    }
                }
                _ => {}
            }
            self.next_token();
        }

        if let Some(expected) = closers.last() {
            let message = format_message(diagnostic_messages::TOKEN_EXPECTED, &[token_text(*expected)]);
            self.parse_error_at_current_token(&message, diagnostic_codes::TOKEN_EXPECTED);
        }

        let len = self.source.len() as u32;
        if len > other_start {
            statements.push(Statement::Other(Span::new(other_start, len)));
        }

        SourceFile {
            file_name: self.file_name.clone(),
            text: self.source.clone(),
            statements,
            export_clauses,
            tokens: self.tokens.clone(),
            comments: self.comments.clone(),
        }
    }

    /// Whether the current top-level token begins a statement.
    ///
    /// The cursor is at bracket depth zero, so the previous token is either a
    /// depth-zero token or the closer that brought us back there.
    fn at_statement_start(&self) -> bool {
        match self.previous() {
            None => true,
            Some(prev) => match prev.kind {
                SyntaxKind::SemicolonToken | SyntaxKind::CloseBraceToken => true,
                kind => self.current().has_preceding_line_break() && kind.can_end_expression(),
            },
        }
    }

    /// Recognize `class`, `export class` and `export default class` without
    /// consuming anything.
    fn class_declaration_ahead(&self) -> Option<ExportModifier> {
        match (self.token(), self.peek_kind(1), self.peek_kind(2)) {
            (SyntaxKind::ClassKeyword, _, _) => Some(ExportModifier::None),
            (SyntaxKind::ExportKeyword, SyntaxKind::ClassKeyword, _) => Some(ExportModifier::Named),
            (SyntaxKind::ExportKeyword, SyntaxKind::DefaultKeyword, SyntaxKind::ClassKeyword) => {
                Some(ExportModifier::Default)
            }
            _ => None,
        }
    }

    pub(crate) fn parse_class_declaration(
        &mut self,
        export: ExportModifier,
        comments_floor: u32,
    ) -> ClassDeclaration {
        let start = self.token_pos();
        let leading_comments_start = self.leading_comments_start(start, comments_floor);
        match export {
            ExportModifier::None => {}
            ExportModifier::Named => {
                self.next_token();
            }
            ExportModifier::Default => {
                self.next_token();
                self.next_token();
            }
        }
        self.parse_expected(SyntaxKind::ClassKeyword);

        let name = if self.token().is_identifier() && !self.is_token(SyntaxKind::ImplementsKeyword)
        {
            let identifier = Identifier {
                text: self.token_text().to_string(),
                span: self.current().span(),
            };
            self.next_token();
            Some(identifier)
        } else {
            if export != ExportModifier::Default {
                let message = format_message(
                    diagnostic_messages::TOKEN_EXPECTED,
                    &[token_text(SyntaxKind::Identifier)],
                );
                self.parse_error_at_current_token(&message, diagnostic_codes::TOKEN_EXPECTED);
            }
            None
        };

        if self.is_token(SyntaxKind::LessThanToken) {
            self.skip_type_arguments();
        }

        let heritage = if self.parse_optional(SyntaxKind::ExtendsKeyword) {
            self.parse_heritage()
        } else {
            None
        };

        if self.parse_optional(SyntaxKind::ImplementsKeyword) {
            while !matches!(
                self.token(),
                SyntaxKind::OpenBraceToken | SyntaxKind::EndOfFileToken
            ) {
                if self.is_token(SyntaxKind::LessThanToken) {
                    self.skip_type_arguments();
                } else {
                    self.next_token();
                }
            }
        }

        if !self.is_token(SyntaxKind::OpenBraceToken) {
            self.parse_expected(SyntaxKind::OpenBraceToken);
            let end = self.previous_token_end();
            return ClassDeclaration {
                name,
                export,
                heritage,
                span: Span::new(start, end),
                leading_comments_start,
                body: Span::at(end),
                members: Vec::new(),
            };
        }

        let body_start = self.token_pos();
        self.next_token();
        let members = self.parse_class_members(self.previous_token_end());
        let body_end = if self.is_token(SyntaxKind::CloseBraceToken) {
            let end = self.token_end();
            self.next_token();
            end
        } else {
            self.parse_expected(SyntaxKind::CloseBraceToken);
            self.previous_token_end()
        };

        let class = ClassDeclaration {
            name,
            export,
            heritage,
            span: Span::new(start, body_end),
            leading_comments_start,
            body: Span::new(body_start, body_end),
            members,
        };
        trace!(
            class = class.name_text().unwrap_or("<anonymous>"),
            members = class.members.len(),
            "parsed class declaration"
        );
        class
    }

    /// Parse what follows `extends`.
    ///
    /// A lone identifier (optionally with type arguments) becomes
    /// `Heritage::Identifier`; anything else is kept as an expression span.
    fn parse_heritage(&mut self) -> Option<Heritage> {
        let start = self.token_pos();
        if self.token().is_identifier() {
            let identifier = Identifier {
                text: self.token_text().to_string(),
                span: self.current().span(),
            };
            self.next_token();
            if self.is_token(SyntaxKind::LessThanToken) {
                self.skip_type_arguments();
            }
            if self.at_heritage_end() {
                return Some(Heritage::Identifier(identifier));
            }
        }

        while !self.at_heritage_end() {
            match self.token() {
                SyntaxKind::OpenParenToken | SyntaxKind::OpenBracketToken => {
                    self.skip_balanced();
                }
                _ => {
                    self.next_token();
                }
            }
        }
        let end = self.previous_token_end();
        if end <= start {
            let message = format_message(
                diagnostic_messages::TOKEN_EXPECTED,
                &[token_text(SyntaxKind::Identifier)],
            );
            self.parse_error_at_current_token(&message, diagnostic_codes::TOKEN_EXPECTED);
            return None;
        }
        Some(Heritage::Expression(Span::new(start, end)))
    }

    fn at_heritage_end(&self) -> bool {
        matches!(
            self.token(),
            SyntaxKind::OpenBraceToken | SyntaxKind::ImplementsKeyword | SyntaxKind::EndOfFileToken
        )
    }

    /// Parse `export { a, b as c };` or `export default a;`.
    ///
    /// Re-exports (`export { a } from "m"`) name bindings of another module
    /// and are not recorded. Returns `None` without consuming anything when
    /// the statement is some other kind of export.
    fn try_parse_export_clause(&mut self) -> Option<ExportClause> {
        let start = self.token_pos();
        match self.peek_kind(1) {
            SyntaxKind::OpenBraceToken => {
                self.next_token();
                self.next_token();
                let mut specifiers = Vec::new();
                while !matches!(
                    self.token(),
                    SyntaxKind::CloseBraceToken | SyntaxKind::EndOfFileToken
                ) {
                    let Some(local) = self.parse_module_export_name() else {
                        self.parse_error_at_current_token(
                            &format_message(
                                diagnostic_messages::TOKEN_EXPECTED,
                                &[token_text(SyntaxKind::CloseBraceToken)],
                            ),
                            diagnostic_codes::TOKEN_EXPECTED,
                        );
                        break;
                    };
                    let exported = if self.parse_optional(SyntaxKind::AsKeyword) {
                        self.parse_module_export_name().unwrap_or_else(|| local.clone())
                    } else {
                        local.clone()
                    };
                    specifiers.push(ExportSpecifier { local, exported });
                    if !self.parse_optional(SyntaxKind::CommaToken) {
                        break;
                    }
                }
                self.parse_expected(SyntaxKind::CloseBraceToken);
                let is_reexport = self.is_token(SyntaxKind::Identifier) && self.token_text() == "from";
                if is_reexport {
                    return None;
                }
                self.parse_optional(SyntaxKind::SemicolonToken);
                Some(ExportClause {
                    span: Span::new(start, self.previous_token_end()),
                    specifiers,
                })
            }
            SyntaxKind::DefaultKeyword => {
                let target = self.peek(2);
                let after = self.peek(3);
                let ends_statement = matches!(
                    after.kind,
                    SyntaxKind::SemicolonToken
                        | SyntaxKind::EndOfFileToken
                        | SyntaxKind::CloseBraceToken
                ) || after.has_preceding_line_break();
                if !target.kind.is_identifier() || !ends_statement {
                    return None;
                }
                self.next_token();
                self.next_token();
                let local = self.token_text().to_string();
                self.next_token();
                self.parse_optional(SyntaxKind::SemicolonToken);
                Some(ExportClause {
                    span: Span::new(start, self.previous_token_end()),
                    specifiers: vec![ExportSpecifier {
                        local,
                        exported: "default".to_string(),
                    }],
                })
            }
            _ => None,
        }
    }

    fn parse_module_export_name(&mut self) -> Option<String> {
        let kind = self.token();
        let name = if kind.is_identifier_or_keyword() {
            self.token_text().to_string()
        } else if kind == SyntaxKind::StringLiteral {
            crate::parser::literal_value(self.token_text())
        } else {
            return None;
        };
        self.next_token();
        Some(name)
    }
}
