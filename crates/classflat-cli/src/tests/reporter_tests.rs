use super::reporter::Reporter;
use classflat_common::{Diagnostic, DiagnosticKind};

const SOURCE: &str = "class Base {}\nclass Dog extends Animal {\n  bark() {}\n}\n";

fn missing_parent() -> Diagnostic {
    let start = SOURCE.find("Animal").expect("Animal") as u32;
    Diagnostic::from_code(DiagnosticKind::MissingParent, 9001, "zoo.js", start, 6, &["Dog", "Animal"])
        .with_classes(["Dog"])
}

fn reporter() -> Reporter {
    let mut reporter = Reporter::new(false);
    reporter.add_source("zoo.js", SOURCE);
    reporter
}

#[test]
fn formats_location_code_and_snippet() {
    let rendered = reporter().format_diagnostic(&missing_parent());
    let mut lines = rendered.lines();

    let header = lines.next().expect("header");
    assert!(header.starts_with("zoo.js:2:19 - error CF9001: "), "{header}");
    assert_eq!(lines.next(), Some("    2   class Dog extends Animal {"));
    assert_eq!(lines.next(), Some(format!("        {}~~~~~~", " ".repeat(18)).as_str()));
    assert_eq!(lines.next(), None);
}

#[test]
fn warnings_use_warning_label() {
    let start = SOURCE.find("Base").expect("Base") as u32;
    let warning = Diagnostic::from_code(DiagnosticKind::DuplicateClass, 9007, "zoo.js", start, 4, &["Base"]);
    let rendered = reporter().format_diagnostic(&warning);
    assert!(rendered.starts_with("zoo.js:1:7 - warning CF9007: "));
}

#[test]
fn related_information_is_rendered_below() {
    let related = missing_parent().with_related("zoo.js", 0, 5, "Declared here.");
    let rendered = reporter().format_diagnostic(&related);
    assert!(rendered.contains("\n  Related: zoo.js:1:1 - Declared here.\n    1   class Base {}"));
}

#[test]
fn unknown_file_falls_back_to_name_without_snippet() {
    let diagnostic =
        Diagnostic::from_code(DiagnosticKind::MissingParent, 9001, "/no/such/file.js", 10, 3, &["A", "B"]);
    let rendered = reporter().format_diagnostic(&diagnostic);
    assert!(rendered.starts_with("/no/such/file.js - error CF9001: "));
    assert_eq!(rendered.lines().count(), 1);
}

#[test]
fn summary_counts_errors_only() {
    let reporter = reporter();
    let warning = Diagnostic::from_code(DiagnosticKind::DuplicateClass, 9007, "zoo.js", 0, 1, &["Base"]);
    assert_eq!(reporter.summary(std::slice::from_ref(&warning)), None);
    assert_eq!(
        reporter.summary(&[missing_parent(), warning]).as_deref(),
        Some("Found 1 error in zoo.js.")
    );
}

#[test]
fn json_output_carries_positions_and_prefixed_codes() {
    let json = reporter().render_json(&[missing_parent()]).expect("json");
    let value: serde_json::Value = serde_json::from_str(&json).expect("parse");
    let entry = &value[0];
    assert_eq!(entry["file"], "zoo.js");
    assert_eq!(entry["line"], 2);
    assert_eq!(entry["column"], 19);
    assert_eq!(entry["code"], "CF9001");
    assert_eq!(entry["category"], "error");
    assert_eq!(entry["kind"], "missing-parent");
    assert_eq!(entry["classes"][0], "Dog");
}
