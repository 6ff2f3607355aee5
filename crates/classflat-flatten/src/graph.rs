//! Inheritance graph.

use crate::registry::ClassRegistry;
use indexmap::IndexMap;
use serde::Serialize;

/// Child → parent edges and parent → children lists, in declaration order.
///
/// Edges are recorded for every declared identifier parent, including
/// parents that are not registered; the validator reports those.
#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InheritanceGraph {
    parents: IndexMap<String, String>,
    children: IndexMap<String, Vec<String>>,
}

impl InheritanceGraph {
    pub fn build(registry: &ClassRegistry) -> Self {
        let mut graph = InheritanceGraph::default();
        for descriptor in registry.iter() {
            if let Some(parent) = &descriptor.parent {
                graph.add_edge(&descriptor.name, parent);
            }
        }
        graph
    }

    pub fn add_edge(&mut self, child: &str, parent: &str) {
        self.parents.insert(child.to_string(), parent.to_string());
        self.children
            .entry(parent.to_string())
            .or_default()
            .push(child.to_string());
    }

    pub fn parent_of(&self, class: &str) -> Option<&str> {
        self.parents.get(class).map(String::as_str)
    }

    pub fn children_of(&self, class: &str) -> &[String] {
        self.children.get(class).map_or(&[], Vec::as_slice)
    }

    /// Whether another class in the unit extends `class`.
    pub fn has_children(&self, class: &str) -> bool {
        !self.children_of(class).is_empty()
    }

    pub fn edge_count(&self) -> usize {
        self.parents.len()
    }

    /// Iterate `(child, parent)` edges in declaration order.
    pub fn edges(&self) -> impl Iterator<Item = (&str, &str)> {
        self.parents
            .iter()
            .map(|(child, parent)| (child.as_str(), parent.as_str()))
    }
}
