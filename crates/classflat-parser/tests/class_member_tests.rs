//! Class member parsing through the public API.

use classflat_parser::{
    ClassDeclaration, MemberKind, ModifierFlags, PropertyNameKind, parse_source_file,
};

fn parse_class(source: &str) -> (ClassDeclaration, bool) {
    let result = parse_source_file("members.js", source);
    let has_errors = result.has_errors();
    let class = result
        .source_file
        .classes()
        .next()
        .cloned()
        .expect("expected a class declaration");
    (class, has_errors)
}

fn kinds(class: &ClassDeclaration) -> Vec<(MemberKind, String)> {
    class
        .members
        .iter()
        .map(|m| (m.kind, m.key().to_string()))
        .collect()
}

#[test]
fn member_kinds() {
    let source = r#"
class A {
  x = 1;
  static count = 0;
  #secret;
  constructor(a) { this.a = a; }
  get value() { return this.x; }
  set value(v) { this.x = v; }
  static create() { return new A(); }
  async *stream() {}
  static { A.count = 1; }
}
"#;
    let (class, has_errors) = parse_class(source);
    assert!(!has_errors);
    assert_eq!(
        kinds(&class),
        vec![
            (MemberKind::Property, "x".to_string()),
            (MemberKind::Property, "count".to_string()),
            (MemberKind::Property, "#secret".to_string()),
            (MemberKind::Constructor, "constructor".to_string()),
            (MemberKind::GetAccessor, "value".to_string()),
            (MemberKind::SetAccessor, "value".to_string()),
            (MemberKind::Method, "create".to_string()),
            (MemberKind::Method, "stream".to_string()),
            (MemberKind::StaticBlock, String::new()),
        ]
    );
    assert!(class.members[1].is_static());
    assert!(class.members[2].is_private());
    assert!(class.members[6].is_static());
    let stream = &class.members[7];
    assert!(stream.modifiers.contains(ModifierFlags::ASYNC | ModifierFlags::GENERATOR));
}

#[test]
fn modifier_keywords_as_member_names() {
    let source = "class A { static() {} get = 1; set(v) {} async() {} static static = 2; }";
    let (class, has_errors) = parse_class(source);
    assert!(!has_errors);
    assert_eq!(
        kinds(&class),
        vec![
            (MemberKind::Method, "static".to_string()),
            (MemberKind::Property, "get".to_string()),
            (MemberKind::Method, "set".to_string()),
            (MemberKind::Method, "async".to_string()),
            (MemberKind::Property, "static".to_string()),
        ]
    );
    assert!(class.members[4].is_static());
}

#[test]
fn fields_without_semicolons() {
    let source = "class A {\n  a = 1\n  b = () => {\n    return 2\n  }\n  c\n  m() {}\n}\n";
    let (class, has_errors) = parse_class(source);
    assert!(!has_errors);
    assert_eq!(class.members.len(), 4);
    let b = &class.members[1];
    let init = b.initializer.expect("initializer");
    assert_eq!(init.text(source), "() => {\n    return 2\n  }");
    assert!(class.members[2].initializer.is_none());
    assert_eq!(class.members[3].kind, MemberKind::Method);
}

#[test]
fn multi_line_field_initializer_continues_across_operators() {
    let source = "class A {\n  total = 1 +\n    2\n  name = 'x'\n}\n";
    let (class, _) = parse_class(source);
    assert_eq!(class.members.len(), 2);
    assert_eq!(
        class.members[0].initializer.expect("init").text(source),
        "1 +\n    2"
    );
}

#[test]
fn property_name_forms() {
    let source = "class A { 'quoted-name'() {} 42() {} [Symbol.iterator]() {} #p() {} }";
    let (class, has_errors) = parse_class(source);
    assert!(!has_errors);
    let names: Vec<(PropertyNameKind, &str)> = class
        .members
        .iter()
        .filter_map(|m| m.name.as_ref())
        .map(|n| (n.kind, n.key.as_str()))
        .collect();
    assert_eq!(
        names,
        vec![
            (PropertyNameKind::StringLiteral, "quoted-name"),
            (PropertyNameKind::NumericLiteral, "42"),
            (PropertyNameKind::Computed, "[Symbol.iterator]"),
            (PropertyNameKind::PrivateIdentifier, "#p"),
        ]
    );
}

#[test]
fn string_named_constructor_is_a_constructor() {
    let (class, _) = parse_class("class A { 'constructor'() {} }");
    assert_eq!(class.members[0].kind, MemberKind::Constructor);
    let (class, _) = parse_class("class A { static constructor() {} }");
    assert_eq!(class.members[0].kind, MemberKind::Method);
}

#[test]
fn member_spans_and_trivia() {
    let source = "class A {\n  /** Says hi. */\n  hi() { return 'hi'; } // greeting\n  x = 1;\n}\n";
    let (class, _) = parse_class(source);
    let hi = &class.members[0];
    assert_eq!(hi.span.text(source), "hi() { return 'hi'; }");
    assert!(hi.leading_trivia().text(source).contains("/** Says hi. */"));
    assert_eq!(
        hi.trailing_comment.expect("trailing comment").text(source),
        "// greeting"
    );
    assert_eq!(hi.body.expect("body").text(source), "{ return 'hi'; }");
    assert_eq!(hi.parameters.expect("params").text(source), "()");
    let x = &class.members[1];
    assert_eq!(x.span.text(source), "x = 1;");
    assert!(!x.leading_trivia().text(source).contains("greeting"));
}

#[test]
fn decorators_and_typescript_modifiers() {
    let source = "class A { @observable private readonly name: string = 'n'; @log() public run(): void {} }";
    let (class, has_errors) = parse_class(source);
    assert!(!has_errors);
    assert_eq!(class.members.len(), 2);
    let name = &class.members[0];
    assert!(name.modifiers.contains(ModifierFlags::DECORATED | ModifierFlags::PRIVATE));
    assert_eq!(name.initializer.expect("init").text(source), "'n'");
    assert_eq!(class.members[1].kind, MemberKind::Method);
}

#[test]
fn garbage_member_reports_and_recovers() {
    let source = "class A { ) m() {} }";
    let (class, has_errors) = parse_class(source);
    assert!(has_errors);
    assert_eq!(kinds(&class), vec![(MemberKind::Method, "m".to_string())]);
}
