//! Parser state - class member parsing.

use super::state::ParserState;
use super::{literal_value, numeric_key};
use crate::node::{ClassMember, MemberKind, ModifierFlags, PropertyName, PropertyNameKind};
use classflat_common::Span;
use classflat_common::diagnostics::{diagnostic_codes, diagnostic_messages, format_message};
use classflat_scanner::{SyntaxKind, token_text};

impl ParserState {
    /// Parse members until the class body's closing brace.
    ///
    /// `full_start` is the end of the opening brace. The closing brace is
    /// left for the caller.
    pub(crate) fn parse_class_members(&mut self, mut full_start: u32) -> Vec<ClassMember> {
        let mut members = Vec::new();
        loop {
            match self.token() {
                SyntaxKind::CloseBraceToken | SyntaxKind::EndOfFileToken => break,
                SyntaxKind::SemicolonToken => {
                    self.next_token();
                    full_start = self.previous_token_end();
                    continue;
                }
                _ => {}
            }

            let before = self.pos;
            if let Some(mut member) = self.parse_class_member(full_start) {
                member.trailing_comment = self.trailing_comment_after(member.span.end);
                full_start = member.trailing_comment.map_or(member.span.end, |c| c.end);
                members.push(member);
            }
            if self.pos == before {
                self.parse_error_at_current_token(
                    diagnostic_messages::PROPERTY_OR_METHOD_EXPECTED,
                    diagnostic_codes::PROPERTY_OR_METHOD_EXPECTED,
                );
                self.next_token();
                full_start = self.previous_token_end();
            }
        }
        members
    }

    fn parse_class_member(&mut self, full_start: u32) -> Option<ClassMember> {
        let start = self.token_pos();
        let mut modifiers = ModifierFlags::empty();

        while self.is_token(SyntaxKind::AtToken) {
            modifiers |= ModifierFlags::DECORATED;
            self.parse_decorator();
        }
        modifiers |= self.parse_class_member_modifiers();

        if modifiers.contains(ModifierFlags::STATIC) && self.is_token(SyntaxKind::OpenBraceToken) {
            let body = self.skip_balanced();
            return Some(ClassMember {
                kind: MemberKind::StaticBlock,
                modifiers,
                name: None,
                full_start,
                span: Span::new(start, body.end),
                parameters: None,
                body: Some(body),
                initializer: None,
                trailing_comment: None,
            });
        }

        if self.parse_optional(SyntaxKind::AsteriskToken) {
            modifiers |= ModifierFlags::GENERATOR;
        }

        let Some(name) = self.parse_property_name() else {
            self.parse_error_at_current_token(
                diagnostic_messages::PROPERTY_OR_METHOD_EXPECTED,
                diagnostic_codes::PROPERTY_OR_METHOD_EXPECTED,
            );
            return None;
        };

        // TypeScript optionality and definite-assignment markers.
        if matches!(
            self.token(),
            SyntaxKind::QuestionToken | SyntaxKind::ExclamationToken
        ) {
            self.next_token();
        }

        if matches!(
            self.token(),
            SyntaxKind::OpenParenToken | SyntaxKind::LessThanToken
        ) {
            return Some(self.parse_method_like_member(start, full_start, modifiers, name));
        }

        Some(self.parse_property_member(start, full_start, modifiers, name))
    }

    /// `@expr` where `expr` is a dotted name, optionally called, or a
    /// parenthesized expression.
    fn parse_decorator(&mut self) {
        self.next_token();
        if self.is_token(SyntaxKind::OpenParenToken) {
            self.skip_balanced();
            return;
        }
        if self.token().is_identifier_or_keyword() {
            self.next_token();
            while self.is_token(SyntaxKind::DotToken) && self.peek_kind(1).is_identifier_or_keyword()
            {
                self.next_token();
                self.next_token();
            }
        }
        if self.is_token(SyntaxKind::OpenParenToken) {
            self.skip_balanced();
        }
    }

    /// Parse class member modifiers.
    ///
    /// A modifier keyword only counts as a modifier when a member name (or,
    /// for `static`, a block) follows; `static() {}` and `get = 1` declare
    /// members named `static` and `get`.
    fn parse_class_member_modifiers(&mut self) -> ModifierFlags {
        let mut modifiers = ModifierFlags::empty();
        loop {
            let flag = match self.token() {
                SyntaxKind::StaticKeyword => ModifierFlags::STATIC,
                SyntaxKind::AsyncKeyword => ModifierFlags::ASYNC,
                SyntaxKind::GetKeyword => ModifierFlags::GET,
                SyntaxKind::SetKeyword => ModifierFlags::SET,
                SyntaxKind::AccessorKeyword => ModifierFlags::ACCESSOR,
                SyntaxKind::PublicKeyword => ModifierFlags::PUBLIC,
                SyntaxKind::PrivateKeyword => ModifierFlags::PRIVATE,
                SyntaxKind::ProtectedKeyword => ModifierFlags::PROTECTED,
                SyntaxKind::ReadonlyKeyword => ModifierFlags::READONLY,
                SyntaxKind::AbstractKeyword => ModifierFlags::ABSTRACT,
                SyntaxKind::OverrideKeyword => ModifierFlags::OVERRIDE,
                SyntaxKind::DeclareKeyword => ModifierFlags::DECLARE,
                _ => break,
            };
            let next = self.peek(1);
            let can_follow = match next.kind {
                SyntaxKind::OpenBraceToken => flag == ModifierFlags::STATIC,
                SyntaxKind::OpenBracketToken
                | SyntaxKind::AsteriskToken
                | SyntaxKind::PrivateIdentifier
                | SyntaxKind::StringLiteral
                | SyntaxKind::NumericLiteral
                | SyntaxKind::BigIntLiteral => true,
                kind => kind.is_identifier_or_keyword(),
            };
            if !can_follow {
                break;
            }
            // `async` must be on the same line as the member it modifies.
            if flag == ModifierFlags::ASYNC && next.has_preceding_line_break() {
                break;
            }
            modifiers |= flag;
            self.next_token();
        }
        modifiers
    }

    fn parse_property_name(&mut self) -> Option<PropertyName> {
        let token = self.current();
        let text = self.token_text().to_string();
        let (kind, key) = match token.kind {
            SyntaxKind::PrivateIdentifier => (PropertyNameKind::PrivateIdentifier, text.clone()),
            SyntaxKind::StringLiteral => (PropertyNameKind::StringLiteral, literal_value(&text)),
            SyntaxKind::NumericLiteral | SyntaxKind::BigIntLiteral => {
                (PropertyNameKind::NumericLiteral, numeric_key(&text))
            }
            SyntaxKind::OpenBracketToken => {
                let span = self.skip_balanced();
                let text = span.text(&self.source).to_string();
                let key: String = text.chars().filter(|c| !c.is_whitespace()).collect();
                return Some(PropertyName {
                    kind: PropertyNameKind::Computed,
                    text,
                    key,
                    span,
                });
            }
            kind if kind.is_identifier_or_keyword() => (PropertyNameKind::Identifier, text.clone()),
            _ => return None,
        };
        self.next_token();
        Some(PropertyName {
            kind,
            text,
            key,
            span: token.span(),
        })
    }

    fn parse_method_like_member(
        &mut self,
        start: u32,
        full_start: u32,
        modifiers: ModifierFlags,
        name: PropertyName,
    ) -> ClassMember {
        if self.is_token(SyntaxKind::LessThanToken) {
            self.skip_type_arguments();
        }
        let parameters = if self.is_token(SyntaxKind::OpenParenToken) {
            Some(self.skip_balanced())
        } else {
            self.parse_expected(SyntaxKind::OpenParenToken);
            None
        };

        // Return type annotation.
        if self.parse_optional(SyntaxKind::ColonToken) {
            while !matches!(
                self.token(),
                SyntaxKind::OpenBraceToken
                    | SyntaxKind::SemicolonToken
                    | SyntaxKind::CloseBraceToken
                    | SyntaxKind::EndOfFileToken
            ) {
                match self.token() {
                    SyntaxKind::OpenParenToken | SyntaxKind::OpenBracketToken => {
                        self.skip_balanced();
                    }
                    SyntaxKind::LessThanToken => self.skip_type_arguments(),
                    _ => {
                        self.next_token();
                    }
                }
            }
        }

        let body = if self.is_token(SyntaxKind::OpenBraceToken) {
            Some(self.skip_balanced())
        } else {
            // Overload signatures and abstract members have no body.
            self.parse_optional(SyntaxKind::SemicolonToken);
            None
        };

        let is_constructor = !modifiers.contains(ModifierFlags::STATIC)
            && matches!(
                name.kind,
                PropertyNameKind::Identifier | PropertyNameKind::StringLiteral
            )
            && name.key == "constructor";
        let kind = if modifiers.contains(ModifierFlags::GET) {
            MemberKind::GetAccessor
        } else if modifiers.contains(ModifierFlags::SET) {
            MemberKind::SetAccessor
        } else if is_constructor {
            MemberKind::Constructor
        } else {
            MemberKind::Method
        };

        ClassMember {
            kind,
            modifiers,
            name: Some(name),
            full_start,
            span: Span::new(start, self.previous_token_end()),
            parameters,
            body,
            initializer: None,
            trailing_comment: None,
        }
    }

    fn parse_property_member(
        &mut self,
        start: u32,
        full_start: u32,
        modifiers: ModifierFlags,
        name: PropertyName,
    ) -> ClassMember {
        // Type annotation.
        if self.parse_optional(SyntaxKind::ColonToken) {
            while !self.at_field_end() && !self.is_token(SyntaxKind::EqualsToken) {
                self.skip_field_token();
            }
        }

        let initializer = if self.parse_optional(SyntaxKind::EqualsToken) {
            let init_start = self.token_pos();
            while !self.at_field_end() {
                self.skip_field_token();
            }
            let init_end = self.previous_token_end();
            if init_end <= init_start {
                let message = format_message(
                    diagnostic_messages::TOKEN_EXPECTED,
                    &[token_text(SyntaxKind::Identifier)],
                );
                self.parse_error_at_current_token(&message, diagnostic_codes::TOKEN_EXPECTED);
                None
            } else {
                Some(Span::new(init_start, init_end))
            }
        } else {
            None
        };

        if !self.parse_optional(SyntaxKind::SemicolonToken) && !self.at_field_end() {
            let message = format_message(
                diagnostic_messages::TOKEN_EXPECTED,
                &[token_text(SyntaxKind::SemicolonToken)],
            );
            self.parse_error_at_current_token(&message, diagnostic_codes::TOKEN_EXPECTED);
        }

        ClassMember {
            kind: MemberKind::Property,
            modifiers,
            name: Some(name),
            full_start,
            span: Span::new(start, self.previous_token_end()),
            parameters: None,
            body: None,
            initializer,
            trailing_comment: None,
        }
    }

    fn skip_field_token(&mut self) {
        match self.token() {
            SyntaxKind::OpenParenToken
            | SyntaxKind::OpenBracketToken
            | SyntaxKind::OpenBraceToken => {
                self.skip_balanced();
            }
            _ => {
                self.next_token();
            }
        }
    }

    /// Whether a field declaration ends before the current token.
    ///
    /// Besides `;` and the class body's `}`, a field ends where automatic
    /// semicolon insertion applies: a line break after a token that can end
    /// an expression, followed by a token that cannot continue one.
    fn at_field_end(&self) -> bool {
        let token = self.current();
        match token.kind {
            SyntaxKind::SemicolonToken | SyntaxKind::CloseBraceToken | SyntaxKind::EndOfFileToken => {
                return true;
            }
            _ => {}
        }
        if !token.has_preceding_line_break() {
            return false;
        }
        let Some(prev) = self.previous() else {
            return false;
        };
        prev.kind.can_end_expression() && starts_class_element(token.kind)
    }
}

/// Tokens that can begin a class element but cannot continue an expression.
fn starts_class_element(kind: SyntaxKind) -> bool {
    match kind {
        SyntaxKind::InKeyword | SyntaxKind::InstanceOfKeyword | SyntaxKind::AsKeyword => false,
        SyntaxKind::PrivateIdentifier
        | SyntaxKind::StringLiteral
        | SyntaxKind::NumericLiteral
        | SyntaxKind::AtToken => true,
        kind => kind.is_identifier_or_keyword(),
    }
}
