//! Class-level AST.
//!
//! The parser is structural: it understands top-level class declarations,
//! their members, and `export` clauses. Everything else in a file is kept as
//! opaque source spans. Member bodies and initializers are spans too; later
//! phases rewrite them through the token stream rather than a full
//! expression tree.

use bitflags::bitflags;
use classflat_common::{CommentRange, Span};
use classflat_scanner::Token;
use serde::Serialize;
use std::sync::Arc;

/// A parsed source file.
#[derive(Clone, Debug)]
pub struct SourceFile {
    pub file_name: String,
    pub text: Arc<str>,
    /// Top-level items in source order. `Other` spans cover everything that
    /// is not a class declaration, trivia included, so concatenating every
    /// statement's text reproduces the file.
    pub statements: Vec<Statement>,
    /// `export { A, B as C }` and `export default A` statements. Their text
    /// also lives inside an `Other` statement.
    pub export_clauses: Vec<ExportClause>,
    pub tokens: Vec<Token>,
    pub comments: Vec<CommentRange>,
}

impl SourceFile {
    pub fn classes(&self) -> impl Iterator<Item = &ClassDeclaration> {
        self.statements.iter().filter_map(|statement| match statement {
            Statement::Class(class) => Some(class),
            Statement::Other(_) => None,
        })
    }

    #[inline]
    pub fn text_of(&self, span: Span) -> &str {
        span.text(&self.text)
    }

    /// Tokens whose start lies inside `span`.
    pub fn tokens_in(&self, span: Span) -> &[Token] {
        let first = self.tokens.partition_point(|token| token.pos < span.start);
        let last = self.tokens.partition_point(|token| token.pos < span.end);
        &self.tokens[first..last.max(first)]
    }
}

#[derive(Clone, Debug)]
pub enum Statement {
    Class(ClassDeclaration),
    Other(Span),
}

impl Statement {
    pub fn span(&self) -> Span {
        match self {
            Statement::Class(class) => class.full_span(),
            Statement::Other(span) => *span,
        }
    }
}

/// How a class declaration is exported at its declaration site.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ExportModifier {
    #[default]
    None,
    /// `export class A {}`
    Named,
    /// `export default class A {}`
    Default,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Identifier {
    pub text: String,
    pub span: Span,
}

/// The `extends` clause of a class.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Heritage {
    /// `extends Base` (type arguments, if any, are dropped).
    Identifier(Identifier),
    /// Anything else: `extends mixin(Base)`, `extends ns.Base`, ...
    Expression(Span),
}

impl Heritage {
    pub fn span(&self) -> Span {
        match self {
            Heritage::Identifier(identifier) => identifier.span,
            Heritage::Expression(span) => *span,
        }
    }
}

#[derive(Clone, Debug)]
pub struct ClassDeclaration {
    pub name: Option<Identifier>,
    pub export: ExportModifier,
    pub heritage: Option<Heritage>,
    /// From the `export`/`class` keyword through the closing brace.
    pub span: Span,
    /// Start of the comments attached directly above the declaration.
    pub leading_comments_start: u32,
    /// `{ ... }` including both braces.
    pub body: Span,
    pub members: Vec<ClassMember>,
}

impl ClassDeclaration {
    pub fn name_text(&self) -> Option<&str> {
        self.name.as_ref().map(|name| name.text.as_str())
    }

    /// Span including the attached leading comments.
    pub fn full_span(&self) -> Span {
        Span::new(self.leading_comments_start, self.span.end)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum MemberKind {
    Property,
    Method,
    GetAccessor,
    SetAccessor,
    Constructor,
    StaticBlock,
}

impl MemberKind {
    pub fn is_function_like(self) -> bool {
        !matches!(self, MemberKind::Property | MemberKind::StaticBlock)
    }
}

bitflags! {
    /// Modifiers written in front of a class member.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct ModifierFlags: u16 {
        const STATIC = 1 << 0;
        const ASYNC = 1 << 1;
        const GENERATOR = 1 << 2;
        const GET = 1 << 3;
        const SET = 1 << 4;
        const ACCESSOR = 1 << 5;
        // TypeScript-only modifiers, carried through untouched.
        const PUBLIC = 1 << 6;
        const PRIVATE = 1 << 7;
        const PROTECTED = 1 << 8;
        const READONLY = 1 << 9;
        const ABSTRACT = 1 << 10;
        const OVERRIDE = 1 << 11;
        const DECLARE = 1 << 12;
        const DECORATED = 1 << 13;
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum PropertyNameKind {
    Identifier,
    PrivateIdentifier,
    StringLiteral,
    NumericLiteral,
    Computed,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PropertyName {
    pub kind: PropertyNameKind,
    /// Source text of the name, e.g. `"a-b"` with its quotes.
    pub text: String,
    /// Normalized key: the string value for string literals, the source text
    /// with whitespace removed for computed names.
    pub key: String,
    pub span: Span,
}

impl PropertyName {
    #[inline]
    pub fn is_private(&self) -> bool {
        self.kind == PropertyNameKind::PrivateIdentifier
    }

    #[inline]
    pub fn is_computed(&self) -> bool {
        self.kind == PropertyNameKind::Computed
    }
}

#[derive(Clone, Debug)]
pub struct ClassMember {
    pub kind: MemberKind,
    pub modifiers: ModifierFlags,
    /// `None` only for static blocks.
    pub name: Option<PropertyName>,
    /// End of the previous member (or the body's `{`); the range up to
    /// `span.start` holds this member's leading trivia.
    pub full_start: u32,
    /// From the first decorator or modifier through the body's `}` or the
    /// field's terminating `;`.
    pub span: Span,
    /// Parameter list including parentheses, for function-like members.
    pub parameters: Option<Span>,
    /// `{ ... }` of a function-like member or static block.
    pub body: Option<Span>,
    /// Expression after `=` in a field declaration.
    pub initializer: Option<Span>,
    /// A comment on the same line right after the member.
    pub trailing_comment: Option<Span>,
}

impl ClassMember {
    #[inline]
    pub fn is_static(&self) -> bool {
        self.modifiers.contains(ModifierFlags::STATIC)
    }

    #[inline]
    pub fn is_private(&self) -> bool {
        self.name.as_ref().is_some_and(PropertyName::is_private)
    }

    pub fn key(&self) -> &str {
        self.name.as_ref().map_or("", |name| name.key.as_str())
    }

    pub fn leading_trivia(&self) -> Span {
        Span::new(self.full_start, self.span.start)
    }
}

/// `export { A, B as C }` or `export default A`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExportClause {
    pub span: Span,
    pub specifiers: Vec<ExportSpecifier>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExportSpecifier {
    pub local: String,
    pub exported: String,
}

impl ExportSpecifier {
    #[inline]
    pub fn is_default(&self) -> bool {
        self.exported == "default"
    }
}
