use clap::Parser;
use std::path::{Path, PathBuf};

use super::args::CliArgs;
use super::config::{ResolvedConfig, resolve_config};
use super::driver::{ExitStatus, discover_sources, has_supported_extension, run, show_config_json};

const ANIMALS: &str = "class Animal {
  constructor(name) {
    this.name = name;
  }

  speak() {
    return `${this.name} makes a sound`;
  }
}

class Dog extends Animal {
  speak() {
    return super.speak() + ' (woof)';
  }
}
";

fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("failed to create test dir");
    }
    std::fs::write(&path, contents).expect("failed to write test file");
    path
}

fn args(argv: &[&str]) -> CliArgs {
    let mut full = vec!["classflat"];
    full.extend_from_slice(argv);
    CliArgs::try_parse_from(full).expect("args should parse")
}

fn relative_names(base: &Path, files: &[PathBuf]) -> Vec<String> {
    files
        .iter()
        .map(|path| {
            path.strip_prefix(base)
                .unwrap_or(path)
                .to_string_lossy()
                .replace('\\', "/")
        })
        .collect()
}

#[test]
fn supported_extensions() {
    assert!(has_supported_extension(Path::new("a.js")));
    assert!(has_supported_extension(Path::new("a/b.mjs")));
    assert!(has_supported_extension(Path::new("c.jsx")));
    assert!(!has_supported_extension(Path::new("d.json")));
    assert!(!has_supported_extension(Path::new("README")));
}

#[test]
fn single_file_compiles_to_stdout() {
    let temp = tempfile::tempdir().expect("temp dir");
    write_file(temp.path(), "animals.js", ANIMALS);

    let result = run(&args(&["animals.js"]), temp.path()).expect("run");

    assert_eq!(result.exit_status(), ExitStatus::Success);
    assert!(result.stdout.contains("class Dog {"));
    assert!(result.stdout.contains("__Animal_speak()"));
    assert!(!result.stdout.contains("class Animal"));
    assert!(!result.stdout.starts_with("// "));
    assert!(result.emitted_files.is_empty());
}

#[test]
fn directory_walk_skips_unsupported_files_and_node_modules() {
    let temp = tempfile::tempdir().expect("temp dir");
    write_file(temp.path(), "src/a.js", "class A {}\n");
    write_file(temp.path(), "src/nested/b.mjs", "class B {}\n");
    write_file(temp.path(), "src/notes.md", "# notes\n");
    write_file(temp.path(), "src/node_modules/dep/index.js", "class Dep {}\n");

    let config = ResolvedConfig::default();
    let entries = discover_sources(&[PathBuf::from("src")], &config, temp.path()).expect("discover");
    let relative: Vec<_> = entries
        .iter()
        .map(|entry| entry.relative.to_string_lossy().replace('\\', "/"))
        .collect();
    assert_eq!(relative, vec!["a.js", "nested/b.mjs"]);
}

#[test]
fn config_globs_select_sources_when_no_inputs_are_given() {
    let temp = tempfile::tempdir().expect("temp dir");
    write_file(
        temp.path(),
        "classflat.json",
        r#"{ "include": ["src"], "exclude": ["**/*.test.js"] }"#,
    );
    write_file(temp.path(), "src/shape.js", "class Shape {}\n");
    write_file(temp.path(), "src/shape.test.js", "class ShapeTest {}\n");
    write_file(temp.path(), "scripts/build.js", "class Build {}\n");

    let cli = args(&[]);
    let config = resolve_config(&cli, temp.path()).expect("config");
    let entries = discover_sources(&cli.files, &config, temp.path()).expect("discover");
    let paths: Vec<_> = entries.iter().map(|entry| entry.path.clone()).collect();
    assert_eq!(relative_names(temp.path(), &paths), vec!["src/shape.js"]);
}

#[test]
fn no_inputs_and_no_config_is_an_error() {
    let temp = tempfile::tempdir().expect("temp dir");
    let err = run(&args(&[]), temp.path()).expect_err("nothing to compile");
    assert!(err.to_string().contains("no input files"));
}

#[test]
fn missing_input_is_an_error() {
    let temp = tempfile::tempdir().expect("temp dir");
    let err = run(&args(&["missing.js"]), temp.path()).expect_err("missing input");
    assert!(err.to_string().contains("input not found"));
}

#[test]
fn out_dir_mirrors_input_layout() {
    let temp = tempfile::tempdir().expect("temp dir");
    write_file(temp.path(), "src/zoo/animals.js", ANIMALS);
    write_file(temp.path(), "src/plain.js", "const x = 1;\n");

    let result = run(&args(&["src", "--out-dir", "dist"]), temp.path()).expect("run");

    assert!(result.stdout.is_empty());
    let written = std::fs::read_to_string(temp.path().join("dist/zoo/animals.js")).expect("output");
    assert!(written.contains("class Dog {"));
    assert_eq!(
        std::fs::read_to_string(temp.path().join("dist/plain.js")).expect("output"),
        "const x = 1;\n"
    );
    assert_eq!(result.emitted_files.len(), 2);
}

#[test]
fn split_writes_one_file_per_emitted_class() {
    let temp = tempfile::tempdir().expect("temp dir");
    let source = format!("{ANIMALS}\nexport class Cat extends Animal {{}}\n");
    write_file(temp.path(), "animals.js", &source);

    let result = run(&args(&["animals.js", "--out-dir", "out", "--split"]), temp.path()).expect("run");

    let mut names = relative_names(&temp.path().join("out"), &result.emitted_files);
    names.sort();
    assert_eq!(names, vec!["Cat.js", "Dog.js"]);
    let cat = std::fs::read_to_string(temp.path().join("out/Cat.js")).expect("Cat.js");
    assert!(cat.starts_with("export class Cat {"));
    assert!(cat.contains("speak()"));
}

#[test]
fn syntax_error_skips_unit_but_compiles_the_rest() {
    let temp = tempfile::tempdir().expect("temp dir");
    write_file(temp.path(), "bad.js", "class Broken {\n  m() {\n");
    write_file(temp.path(), "good.js", ANIMALS);

    let result = run(&args(&["bad.js", "good.js"]), temp.path()).expect("run");

    assert_eq!(result.failed_units, 1);
    assert_eq!(result.exit_status(), ExitStatus::DiagnosticsOutputsSkipped);
    assert!(result.stdout.contains("class Dog {"));
    assert!(!result.stdout.contains("Broken"));
    assert!(result.diagnostics.iter().all(|d| d.file.ends_with("bad.js")));
}

#[test]
fn error_diagnostics_keep_output_but_fail_the_run() {
    let temp = tempfile::tempdir().expect("temp dir");
    write_file(temp.path(), "orphan.js", "class Orphan extends Missing {}\n");

    let result = run(&args(&["orphan.js"]), temp.path()).expect("run");

    assert_eq!(result.exit_status(), ExitStatus::DiagnosticsOutputsGenerated);
    assert_eq!(result.diagnostics[0].code, 9001);
    assert!(result.stdout.contains("class Orphan"));

    let unchecked = run(&args(&["orphan.js", "--no-validate"]), temp.path()).expect("run");
    assert_eq!(unchecked.exit_status(), ExitStatus::Success);
}

#[test]
fn multiple_units_on_stdout_are_labelled() {
    let temp = tempfile::tempdir().expect("temp dir");
    write_file(temp.path(), "a.js", "class A {}\n");
    write_file(temp.path(), "b.js", "class B {}\n");

    let result = run(&args(&["a.js", "b.js"]), temp.path()).expect("run");
    let a = result.stdout.find("a.js\nclass A {}").expect("a");
    let b = result.stdout.find("b.js\nclass B {}").expect("b");
    assert!(a < b);
}

#[test]
fn emit_graph_prints_edges_per_unit() {
    let temp = tempfile::tempdir().expect("temp dir");
    write_file(temp.path(), "animals.js", ANIMALS);

    let result = run(&args(&["animals.js", "--emit-graph"]), temp.path()).expect("run");
    // The graph follows the compiled text and is the only line that is a lone `{`.
    let json_start = result.stdout.find("\n{\n").expect("graph json") + 1;
    let graph: serde_json::Value =
        serde_json::from_str(&result.stdout[json_start..]).expect("valid json");
    let unit = graph
        .as_object()
        .and_then(|units| units.values().next())
        .expect("one unit");
    assert_eq!(unit["parents"]["Dog"], "Animal");
    assert_eq!(unit["children"]["Animal"][0], "Dog");
}

#[test]
fn show_config_reports_resolved_options() {
    let temp = tempfile::tempdir().expect("temp dir");
    write_file(
        temp.path(),
        "classflat.json",
        r#"{ "compilerOptions": { "exportOnly": "true" }, "include": ["src"] }"#,
    );
    write_file(temp.path(), "src/a.js", "class A {}\n");

    let cli = args(&["--indent", "4"]);
    let config = resolve_config(&cli, temp.path()).expect("config");
    let files = discover_sources(&cli.files, &config, temp.path()).expect("discover");
    let json: serde_json::Value =
        serde_json::from_str(&show_config_json(&config, &files).expect("json")).expect("parse");

    assert_eq!(json["compilerOptions"]["exportOnly"], true);
    assert_eq!(json["compilerOptions"]["indentWidth"], 4);
    assert_eq!(json["compilerOptions"]["excludeIntermediate"], true);
    assert_eq!(json["include"][0], "src");
    assert_eq!(json["files"].as_array().map(Vec::len), Some(1));
}
