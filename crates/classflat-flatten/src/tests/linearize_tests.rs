//! Tests for the registry, validator and linearizer.

use crate::graph::InheritanceGraph;
use crate::linearize::linearize;
use crate::members::{IdentityKind, MemberIdentity, Visibility};
use crate::registry::{ClassRegistry, ExportKind};
use crate::validator::{find_cycle, validate_inheritance};
use classflat_common::limits::MAX_INHERITANCE_DEPTH;
use classflat_common::{Diagnostic, DiagnosticKind};
use classflat_parser::parse_source_file;

fn build(source: &str) -> (ClassRegistry, InheritanceGraph, Vec<Diagnostic>) {
    let parsed = parse_source_file("test.js", source);
    assert!(!parsed.has_errors(), "{:?}", parsed.diagnostics);
    let mut diagnostics = Vec::new();
    let (registry, graph) = ClassRegistry::build(&parsed.source_file, &mut diagnostics);
    validate_inheritance("test.js", &registry, &graph, &mut diagnostics);
    (registry, graph, diagnostics)
}

fn method(name: &str) -> MemberIdentity {
    MemberIdentity::new(false, IdentityKind::Method, Visibility::Public, name)
}

#[test]
fn registry_records_parents_and_exports() {
    let (registry, graph, diagnostics) = build(
        "export class A {}\nclass B extends A {}\nexport default class C extends B {}\n",
    );
    assert!(diagnostics.is_empty());
    assert_eq!(registry.names().collect::<Vec<_>>(), vec!["A", "B", "C"]);
    assert_eq!(registry.get("A").map(|d| d.export), Some(ExportKind::Named));
    assert_eq!(registry.get("B").map(|d| d.export), Some(ExportKind::None));
    assert_eq!(registry.get("C").map(|d| d.export), Some(ExportKind::Default));
    assert_eq!(graph.parent_of("C"), Some("B"));
    assert_eq!(graph.children_of("A"), ["B".to_string()]);
    assert!(!graph.has_children("C"));
}

#[test]
fn export_clause_marks_class_exported() {
    let (registry, _, _) = build("class A {}\nclass B {}\nexport { A };\nexport default B;\n");
    let a = registry.get("A").expect("A");
    assert_eq!(a.export, ExportKind::Named);
    assert!(a.exported_via_clause);
    assert_eq!(registry.get("B").map(|d| d.export), Some(ExportKind::Default));
}

#[test]
fn duplicate_declaration_keeps_first_and_warns() {
    let (registry, _, diagnostics) = build("class A { m() {} }\nclass A { n() {} }\n");
    assert_eq!(registry.len(), 1);
    assert!(registry.get("A").expect("A").members.contains(&method("m")));
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].kind, DiagnosticKind::DuplicateClass);
    assert!(!diagnostics[0].is_error());
    assert_eq!(diagnostics[0].related_information.len(), 1);
}

#[test]
fn expression_heritage_is_rootless_with_warning() {
    let (registry, graph, diagnostics) = build("class A extends mixin(B) {}\n");
    let a = registry.get("A").expect("A");
    assert!(a.parent.is_none());
    assert!(a.heritage_expression.is_some());
    assert_eq!(graph.edge_count(), 0);
    assert_eq!(diagnostics[0].kind, DiagnosticKind::UnsupportedHeritage);
}

#[test]
fn missing_parent_is_reported_and_treated_as_root() {
    let (registry, _, diagnostics) = build("class Child extends Ghost { m() {} }\n");
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].kind, DiagnosticKind::MissingParent);
    assert_eq!(diagnostics[0].code, 9001);
    assert_eq!(diagnostics[0].classes, vec!["Child", "Ghost"]);

    let linearization = linearize(&registry, "Child");
    assert_eq!(linearization.chain, vec!["Child"]);
    assert!(linearization.members.contains(&method("m")));
}

#[test]
fn cycle_is_reported_for_each_class_on_it() {
    let (registry, graph, diagnostics) = build("class A extends B {}\nclass B extends A {}\n");
    let cycles: Vec<_> = diagnostics
        .iter()
        .filter(|d| d.kind == DiagnosticKind::CircularInheritance)
        .collect();
    assert_eq!(cycles.len(), 2);
    assert!(cycles[0].message_text.contains("A -> B -> A"));
    assert!(cycles[1].message_text.contains("B -> A -> B"));

    assert_eq!(
        find_cycle("A", &graph),
        Some(vec!["A".to_string(), "B".to_string(), "A".to_string()])
    );
    let linearization = linearize(&registry, "A");
    assert!(linearization.hit_cycle);
    assert_eq!(linearization.chain, vec!["B", "A"]);
}

#[test]
fn class_leading_into_a_cycle_is_reported() {
    let (_, graph, diagnostics) =
        build("class A extends B {}\nclass B extends C {}\nclass C extends B {}\n");
    assert_eq!(
        find_cycle("A", &graph),
        Some(vec!["A".to_string(), "B".to_string(), "C".to_string(), "B".to_string()])
    );
    assert_eq!(diagnostics.len(), 3);
}

#[test]
fn linearization_merges_base_first_with_overrides() {
    let source = "
class A {
  x = 1;
  m() {}
  n() {}
  constructor() {}
}
class B extends A {
  y = 2;
  m() {}
}
class C extends B {
  n() {}
  constructor() { super(); }
}
";
    let (registry, _, _) = build(source);
    let linearization = linearize(&registry, "C");
    assert_eq!(linearization.chain, vec!["A", "B", "C"]);

    let order: Vec<_> = linearization
        .members
        .iter()
        .map(|(identity, entry)| format!("{}:{}", identity.name, entry.owner))
        .collect();
    assert_eq!(order, vec!["x:A", "y:B", "m:B", "n:C"]);

    let history: Vec<_> = linearization.history[&method("m")]
        .iter()
        .map(|entry| entry.owner.as_str())
        .collect();
    assert_eq!(history, vec!["A", "B"]);

    let constructors: Vec<_> = linearization
        .constructors
        .iter()
        .map(|entry| entry.owner.as_str())
        .collect();
    assert_eq!(constructors, vec!["A", "C"]);
    assert_eq!(
        linearization.members.constructor.as_ref().map(|e| e.owner.as_str()),
        Some("C")
    );
}

#[test]
fn siblings_do_not_see_each_other() {
    let source = "class A { base() {} }\nclass B extends A { onlyB() {} }\nclass C extends A { onlyC() {} }\n";
    let (registry, _, _) = build(source);
    let b = linearize(&registry, "B");
    let c = linearize(&registry, "C");
    assert!(b.members.contains(&method("onlyB")));
    assert!(!b.members.contains(&method("onlyC")));
    assert!(c.members.contains(&method("onlyC")));
    assert!(!c.members.contains(&method("onlyB")));
    assert_eq!(b.members.len(), 2);
}

#[test]
fn bodiless_overloads_are_not_members() {
    let (registry, _, _) = build("class A {\n  m(a: string): void;\n  m(a: any) {}\n}\n");
    let a = registry.get("A").expect("A");
    let entry = a.members.get(&method("m")).expect("m");
    assert_eq!(entry.slot, crate::members::MemberSlot::Member(1));
}

#[test]
fn very_deep_chain_is_truncated() {
    let mut source = String::from("class C0 {}\n");
    for i in 1..300 {
        source.push_str(&format!("class C{i} extends C{} {{}}\n", i - 1));
    }
    let (registry, _, diagnostics) = build(&source);
    assert!(diagnostics.is_empty());
    let linearization = linearize(&registry, "C299");
    assert!(linearization.truncated);
    assert_eq!(linearization.chain.len(), MAX_INHERITANCE_DEPTH);
    assert_eq!(linearization.chain.last().map(String::as_str), Some("C299"));
}
