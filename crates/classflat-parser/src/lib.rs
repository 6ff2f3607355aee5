//! Parser for the classflat compiler.
//!
//! This crate turns JavaScript source text into a class-level tree:
//! - `SourceFile` - top-level class declarations and opaque statement spans
//! - `ClassDeclaration` / `ClassMember` - class headers and members
//! - `ExportClause` - `export { ... }` statements that export classes
//!
//! Function bodies and initializers are not parsed into expressions. They
//! are kept as spans over the token stream, which the flattener walks when
//! it rewrites `super` references.

pub mod node;
pub use node::{
    ClassDeclaration, ClassMember, ExportClause, ExportModifier, ExportSpecifier, Heritage,
    Identifier, MemberKind, ModifierFlags, PropertyName, PropertyNameKind, SourceFile, Statement,
};

pub mod parser;
pub use parser::{ParseDiagnostic, ParserState};

use classflat_common::Diagnostic;

/// A parsed file together with its syntax errors.
#[derive(Debug)]
pub struct ParseResult {
    pub source_file: SourceFile,
    pub diagnostics: Vec<Diagnostic>,
}

impl ParseResult {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }
}

/// Scan and parse `text`, converting syntax errors into compile-error
/// diagnostics.
pub fn parse_source_file(file_name: &str, text: &str) -> ParseResult {
    let mut parser = ParserState::new(file_name.to_string(), text.to_string());
    let source_file = parser.parse_source_file();
    let diagnostics = parser
        .get_diagnostics()
        .iter()
        .map(|d| Diagnostic::compile_error(file_name, d.start, d.length, d.message.clone(), d.code))
        .collect();
    ParseResult {
        source_file,
        diagnostics,
    }
}

#[cfg(test)]
#[path = "tests/parser_tests.rs"]
mod parser_tests;
