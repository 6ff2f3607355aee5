//! Tests for `super` resolution and rewriting on a single class.

use crate::linearize::linearize;
use crate::members::{MemberIdentity, MemberSlot};
use crate::registry::ClassRegistry;
use crate::super_calls::{RewriteOutput, SuperRewriter, SynthesizedKind};
use classflat_parser::parse_source_file;

struct Rewritten {
    /// Final member texts, keyed by member name.
    members: Vec<(String, String)>,
    constructor: Option<String>,
    output: RewriteOutput,
}

impl Rewritten {
    fn member(&self, name: &str) -> &str {
        self.members
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, text)| text.as_str())
            .unwrap_or_else(|| panic!("no member {name}"))
    }

    fn synthesized_names(&self) -> Vec<&str> {
        self.output
            .synthesized
            .iter()
            .map(|s| s.name.as_str())
            .collect()
    }

    fn codes(&self) -> Vec<u32> {
        self.output.diagnostics.iter().map(|d| d.code).collect()
    }
}

fn rewrite(source: &str, class: &str) -> Rewritten {
    let parsed = parse_source_file("test.js", source);
    assert!(!parsed.has_errors(), "{:?}", parsed.diagnostics);
    let source_file = parsed.source_file;
    let mut diagnostics = Vec::new();
    let (registry, _) = ClassRegistry::build(&source_file, &mut diagnostics);
    let linearization = linearize(&registry, class);

    let mut rewriter = SuperRewriter::new(&source_file, &registry, &linearization);
    let entries: Vec<(MemberIdentity, String, MemberSlot)> = linearization
        .members
        .iter()
        .map(|(identity, entry)| (identity.clone(), entry.owner.clone(), entry.slot))
        .collect();
    let mut members = Vec::new();
    for (identity, owner, slot) in entries {
        for index in slot.indices() {
            if let Some(text) = rewriter.rewrite_member(&owner, index) {
                members.push((identity.name.clone(), text.text));
            }
        }
    }
    let constructor = rewriter.rewrite_constructor_chain().map(|text| text.text);
    Rewritten {
        members,
        constructor,
        output: rewriter.finish(),
    }
}

#[test]
fn super_method_call_points_at_synthesized_copy() {
    let source = "class A { m() { return 1; } }\nclass B extends A { m() { return super.m() + 1; } }\n";
    let result = rewrite(source, "B");
    assert_eq!(result.member("m"), "m() { return this.__A_m() + 1; }");
    assert_eq!(result.synthesized_names(), vec!["__A_m"]);
    assert_eq!(result.output.synthesized[0].text.text, "__A_m() { return 1; }");
    assert!(result.output.diagnostics.is_empty());
}

#[test]
fn property_named_super_is_not_a_super_reference() {
    let source = "
class A { foo() { return 1; } }
class B extends A {
  foo() { return this.super.foo() + super.foo(); }
  bar() { return this?.super.foo(); }
}
";
    let result = rewrite(source, "B");
    assert_eq!(
        result.member("foo"),
        "foo() { return this.super.foo() + this.__A_foo(); }"
    );
    assert_eq!(result.member("bar"), "bar() { return this?.super.foo(); }");
    assert_eq!(result.synthesized_names(), vec!["__A_foo"]);
    assert!(result.output.diagnostics.is_empty());
}

#[test]
fn multi_level_super_chain_unrolls_in_discovery_order() {
    let source = "
class A { m() { return 'a'; } }
class B extends A { m() { return super.m() + 'b'; } }
class C extends B { m() { return super.m() + 'c'; } }
";
    let result = rewrite(source, "C");
    assert_eq!(result.member("m"), "m() { return this.__B_m() + 'c'; }");
    assert_eq!(result.synthesized_names(), vec!["__B_m", "__A_m"]);
    assert_eq!(
        result.output.synthesized[0].text.text,
        "__B_m() { return this.__A_m() + 'b'; }"
    );
}

#[test]
fn super_reference_skips_non_overriding_intermediate() {
    let source = "
class A { m() { return 1; } }
class B extends A {}
class C extends B { m() { return super.m(); } }
";
    let result = rewrite(source, "C");
    assert_eq!(result.member("m"), "m() { return this.__A_m(); }");
}

#[test]
fn same_ancestor_method_is_synthesized_once() {
    let source = "
class A { m() { return 1; } }
class B extends A {
  m() { return super.m(); }
  n() { return super.m() * 2; }
}
";
    let result = rewrite(source, "B");
    assert_eq!(result.synthesized_names(), vec!["__A_m"]);
    assert_eq!(result.member("n"), "n() { return this.__A_m() * 2; }");
}

#[test]
fn getter_super_read_becomes_call() {
    let source = "class A { get size() { return 1; } }\nclass B extends A { get size() { return super.size * 2; } }\n";
    let result = rewrite(source, "B");
    assert_eq!(result.member("size"), "get size() { return this.__A_get_size() * 2; }");
    assert_eq!(result.output.synthesized[0].kind, SynthesizedKind::Getter);
    assert_eq!(result.output.synthesized[0].text.text, "__A_get_size() { return 1; }");
}

#[test]
fn static_super_call_resolves_static_member() {
    let source = "class A { static create() { return 1; } }\nclass B extends A { static create() { return super.create(); } }\n";
    let result = rewrite(source, "B");
    assert_eq!(
        result.member("create"),
        "static create() { return this.__A_create(); }"
    );
    assert!(result.output.synthesized[0].text.text.starts_with("static __A_create()"));
}

#[test]
fn async_and_generator_prefixes_are_kept() {
    let source = "
class A { async load() { return 1; } *items() { yield 1; } }
class B extends A {
  async load() { return await super.load(); }
  *items() { yield* super.items(); }
}
";
    let result = rewrite(source, "B");
    let texts: Vec<_> = result
        .output
        .synthesized
        .iter()
        .map(|s| s.text.text.as_str())
        .collect();
    assert!(texts.contains(&"async __A_load() { return 1; }"));
    assert!(texts.contains(&"*__A_items() { yield 1; }"));
}

#[test]
fn super_in_arrow_field_initializer_is_rewritten() {
    let source = "class A { greet() { return 'hi'; } }\nclass B extends A { handler = () => super.greet(); }\n";
    let result = rewrite(source, "B");
    assert_eq!(result.member("handler"), "handler = () => this.__A_greet();");
}

#[test]
fn synthesized_name_avoids_collisions() {
    let source = "class A { m() {} }\nclass B extends A { __A_m() {} m() { super.m(); } }\n";
    let result = rewrite(source, "B");
    assert_eq!(result.synthesized_names(), vec!["__A_m$1"]);
    assert_eq!(result.member("m"), "m() { this.__A_m$1(); }");
}

#[test]
fn nested_class_bodies_keep_their_own_super() {
    let source = "
class A { m() {} }
class B extends A {
  m() { return class extends Other { n() { return super.n(); } }; }
}
";
    let result = rewrite(source, "B");
    assert!(result.member("m").contains("return super.n();"));
    assert!(result.output.diagnostics.is_empty());
    assert!(result.output.synthesized.is_empty());
}

#[test]
fn unresolvable_references_are_left_with_diagnostics() {
    let source = "
class A { x = 1; }
class B extends A {
  a() { return super['m'](); }
  b() { super.y = 2; }
  c() { return super.x; }
  d() { return super.missing(); }
}
";
    let result = rewrite(source, "B");
    assert_eq!(result.codes(), vec![9004, 9005, 9006, 9003]);
    assert_eq!(result.member("a"), "a() { return super['m'](); }");
    assert_eq!(result.member("b"), "b() { super.y = 2; }");
    assert!(result.output.diagnostics.iter().all(|d| d.classes == vec!["B"]));
}

#[test]
fn compound_assignment_and_increment_through_super_are_rejected() {
    let source = "class A { get n() { return 1; } }\nclass B extends A { a() { super.n += 1; } b() { ++super.n; } }\n";
    let result = rewrite(source, "B");
    assert_eq!(result.codes(), vec![9005, 9005]);
}

#[test]
fn constructor_chain_links_each_super_call_to_previous_link() {
    let source = "
class A { constructor(x) { this.x = x; } }
class B extends A { constructor(x) { super(x); this.y = 1; } }
class C extends B { constructor() { super(5); } }
";
    let result = rewrite(source, "C");
    assert_eq!(
        result.constructor.as_deref(),
        Some("constructor() { this.__B_constructor(5); }")
    );
    let links: Vec<_> = result
        .output
        .constructor_links
        .iter()
        .map(|link| link.text.text.as_str())
        .collect();
    assert_eq!(
        links,
        vec![
            "__A_constructor(x) { this.x = x; }",
            "__B_constructor(x) { this.__A_constructor(x); this.y = 1; }",
        ]
    );
}

#[test]
fn chained_super_in_expression_position_evaluates_to_this() {
    let source = "
class A { constructor(x) { this.x = x; } }
class B extends A { constructor(x) { const self = super(x); self.y = 2; } }
class C extends B { constructor() { super(1); } }
";
    let result = rewrite(source, "C");
    let link = result
        .output
        .constructor_links
        .iter()
        .map(|link| link.text.text.as_str())
        .find(|text| text.starts_with("__B_constructor"))
        .expect("link for B");
    assert_eq!(
        link,
        "__B_constructor(x) { const self = (this.__A_constructor(x), this); self.y = 2; }"
    );
    assert_eq!(
        result.constructor.as_deref(),
        Some("constructor() { this.__B_constructor(1); }")
    );
}

#[test]
fn base_link_super_statement_is_removed_with_its_line() {
    let source = "
class A {}
class B extends A {
  constructor() {
    super();
    this.b = 1;
  }
}
";
    let result = rewrite(source, "B");
    assert_eq!(
        result.constructor.as_deref(),
        Some("constructor() {\n    this.b = 1;\n  }")
    );
}

#[test]
fn base_link_super_with_side_effects_keeps_arguments() {
    let source = "class A {}\nclass B extends A { constructor() { super(init()); } }\n";
    let result = rewrite(source, "B");
    assert_eq!(
        result.constructor.as_deref(),
        Some("constructor() { void [init()]; }")
    );
}

#[test]
fn base_link_super_in_expression_position_becomes_this() {
    let source = "class A {}\nclass B extends A { constructor() { const self = super(); } }\n";
    let result = rewrite(source, "B");
    assert_eq!(
        result.constructor.as_deref(),
        Some("constructor() { const self = this; }")
    );
}

#[test]
fn super_property_inside_constructor_is_resolved() {
    let source = "class A { init() {} }\nclass B extends A { constructor() { super(); super.init(); } }\n";
    let result = rewrite(source, "B");
    assert_eq!(
        result.constructor.as_deref(),
        Some("constructor() {  this.__A_init(); }")
    );
}
