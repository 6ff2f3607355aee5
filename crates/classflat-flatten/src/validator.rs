//! Inheritance validator.
//!
//! Reports parents that are not declared in the unit and inheritance cycles.
//! Validation only appends diagnostics; it never stops compilation.

use crate::graph::InheritanceGraph;
use crate::registry::ClassRegistry;
use classflat_common::diagnostics::diagnostic_codes;
use classflat_common::limits::MAX_INHERITANCE_DEPTH;
use classflat_common::{Diagnostic, DiagnosticKind};
use rustc_hash::FxHashSet;
use tracing::debug;

pub fn validate_inheritance(
    file: &str,
    registry: &ClassRegistry,
    graph: &InheritanceGraph,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let before = diagnostics.len();

    for descriptor in registry.iter() {
        let Some(parent) = descriptor.parent.as_deref() else {
            continue;
        };

        if !registry.contains(parent) {
            let span = descriptor.heritage_span().unwrap_or_else(|| descriptor.name_span());
            diagnostics.push(
                Diagnostic::from_code(
                    DiagnosticKind::MissingParent,
                    diagnostic_codes::CLASS_EXTENDS_UNDECLARED_CLASS,
                    file,
                    span.start,
                    span.len(),
                    &[descriptor.name.as_str(), parent],
                )
                .with_classes([descriptor.name.as_str(), parent]),
            );
            continue;
        }

        if let Some(walk) = find_cycle(&descriptor.name, graph) {
            let path = walk.join(" -> ");
            let span = descriptor.name_span();
            diagnostics.push(
                Diagnostic::from_code(
                    DiagnosticKind::CircularInheritance,
                    diagnostic_codes::CLASS_INHERITANCE_IS_CIRCULAR,
                    file,
                    span.start,
                    span.len(),
                    &[descriptor.name.as_str(), path.as_str()],
                )
                .with_classes(walk[..walk.len() - 1].iter().map(String::as_str)),
            );
        }
    }

    debug!(
        file,
        diagnostics = diagnostics.len() - before,
        "inheritance validated"
    );
}

/// Follow parent links from `start` with a fresh visited set.
///
/// Returns the walk, ending with the first class seen twice, when it
/// revisits a class. The walk may enter a cycle that `start` is not part of.
pub(crate) fn find_cycle(start: &str, graph: &InheritanceGraph) -> Option<Vec<String>> {
    let mut visited: FxHashSet<&str> = FxHashSet::default();
    let mut walk = vec![start.to_string()];
    visited.insert(start);
    let mut current = start;
    while let Some(parent) = graph.parent_of(current) {
        walk.push(parent.to_string());
        if !visited.insert(parent) {
            return Some(walk);
        }
        if walk.len() > MAX_INHERITANCE_DEPTH {
            return None;
        }
        current = parent;
    }
    None
}
