//! Common types and utilities for the classflat compiler.
//!
//! This crate provides foundational types used across all classflat crates:
//! - Source spans (`Span`) and line/column mapping (`LineMap`)
//! - Comment ranges for preserving member documentation
//! - Diagnostics (`Diagnostic`, `DiagnosticKind`, codes and message templates)
//! - Flattening and printer options
//! - Compiler limits and thresholds

// Span - Source location tracking (byte offsets)
pub mod span;
pub use span::Span;

// Position types for line/column source locations
pub mod position;
pub use position::{LineMap, Position};

// Comment parsing utilities
pub mod comments;
pub use comments::CommentRange;

// Diagnostics shared by the parser and the flattener
pub mod diagnostics;
pub use diagnostics::{Diagnostic, DiagnosticCategory, DiagnosticKind};

// Options recognized by the flattener and the printer
pub mod options;
pub use options::{FlattenOptions, PrinterOptions};

// Centralized limits and thresholds
pub mod limits;

#[cfg(test)]
#[path = "tests/position_tests.rs"]
mod position_tests;

#[cfg(test)]
#[path = "tests/options_tests.rs"]
mod options_tests;
