//! Member collector / linearizer.
//!
//! `linearize` walks a class's ancestor chain base first and merges each
//! class's own members on top of what its ancestors contributed.

use crate::members::{ConstructorChain, MemberSet, MethodHistory};
use crate::registry::ClassRegistry;
use classflat_common::limits::MAX_INHERITANCE_DEPTH;
use rustc_hash::FxHashSet;
use tracing::{debug, trace};

/// The override-resolved view of one class and its ancestors.
#[derive(Clone, Debug, Default)]
pub struct Linearization {
    pub target: String,
    /// Classes that contributed members, base first, ending with `target`.
    pub chain: Vec<String>,
    pub members: MemberSet,
    pub history: MethodHistory,
    pub constructors: ConstructorChain,
    /// The walk revisited a class (inheritance cycle).
    pub hit_cycle: bool,
    /// The walk stopped at `MAX_INHERITANCE_DEPTH`.
    pub truncated: bool,
}

impl Linearization {
    /// Position of `class` in the chain, base = 0.
    pub fn chain_index(&self, class: &str) -> Option<usize> {
        self.chain.iter().position(|name| name == class)
    }

    /// Whether `ancestor` comes strictly before `class` in the chain.
    pub fn is_strict_ancestor(&self, ancestor: &str, class: &str) -> bool {
        match (self.chain_index(ancestor), self.chain_index(class)) {
            (Some(a), Some(c)) => a < c,
            _ => false,
        }
    }
}

/// Linearize `class_name`.
///
/// Missing parents end the chain (the class is a root from there). A class
/// seen twice contributes nothing the second time, so cycles terminate.
pub fn linearize(registry: &ClassRegistry, class_name: &str) -> Linearization {
    let mut linearization = Linearization {
        target: class_name.to_string(),
        ..Linearization::default()
    };
    let mut visited: FxHashSet<String> = FxHashSet::default();
    collect(registry, class_name, 0, &mut visited, &mut linearization);
    debug!(
        class = class_name,
        chain = ?linearization.chain,
        members = linearization.members.len(),
        constructors = linearization.constructors.len(),
        "linearized class"
    );
    linearization
}

fn collect(
    registry: &ClassRegistry,
    class_name: &str,
    depth: usize,
    visited: &mut FxHashSet<String>,
    linearization: &mut Linearization,
) {
    if !visited.insert(class_name.to_string()) {
        trace!(class = class_name, "cycle reached during linearization");
        linearization.hit_cycle = true;
        return;
    }
    let Some(descriptor) = registry.get(class_name) else {
        return;
    };

    if let Some(parent) = descriptor.parent.as_deref() {
        if depth + 1 >= MAX_INHERITANCE_DEPTH {
            linearization.truncated = true;
        } else {
            collect(registry, parent, depth + 1, visited, linearization);
        }
    }

    linearization.chain.push(descriptor.name.clone());
    for (identity, entry) in descriptor.members.iter() {
        linearization
            .history
            .entry(identity.clone())
            .or_default()
            .push(entry.clone());
        let displaced = linearization.members.insert(identity.clone(), entry.clone());
        for old in displaced {
            trace!(
                member = %identity,
                from = old.owner.as_str(),
                to = class_name,
                "member overridden"
            );
        }
    }
    if let Some(constructor) = &descriptor.members.constructor {
        linearization.constructors.push(constructor.clone());
        linearization.members.constructor = Some(constructor.clone());
    }
}
