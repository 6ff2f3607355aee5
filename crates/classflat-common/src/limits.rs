//! Centralized limits and thresholds.
//!
//! Cycles are detected with visited sets, not by running out of stack; these
//! limits only bound the work done on pathological but acyclic input.

/// Maximum number of ancestors followed when linearizing one class.
///
/// Chains longer than this are truncated at the limit and reported with
/// `CF9009`. Real hierarchies are a handful of levels deep.
pub const MAX_INHERITANCE_DEPTH: usize = 256;

/// Maximum nesting of brackets the parser tracks while skipping bodies.
///
/// Bodies are skipped iteratively, so this is about rejecting garbage input
/// early rather than protecting the stack.
pub const MAX_BRACKET_DEPTH: usize = 4096;

/// Maximum `$n` suffix tried when a synthesized member name collides.
pub const MAX_SYNTHETIC_NAME_SUFFIX: u32 = 10_000;
