//! JavaScript scanner/tokenizer for the classflat compiler.
//!
//! This crate provides the lexical analysis phase:
//! - `SyntaxKind` - Token types
//! - `ScannerState` - Tokenizer state machine
//! - `Token` / `TokenFlags` - Scanned tokens with their source positions
//!
//! Comments and whitespace are trivia: they never become tokens, but comment
//! ranges are recorded and a preceding line break is flagged on the next
//! token so the parser can apply automatic semicolon insertion.

pub mod syntax_kind;
pub use syntax_kind::{SyntaxKind, keyword_kind, token_text};

pub mod scanner;
pub use scanner::{ScannerDiagnostic, ScannerState, Token, TokenFlags, TokenizeResult, tokenize};

#[cfg(test)]
#[path = "tests/scanner_tests.rs"]
mod scanner_tests;
