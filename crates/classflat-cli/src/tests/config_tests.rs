use clap::Parser;
use std::path::{Path, PathBuf};

use super::args::CliArgs;
use super::config::{
    apply_cli_overrides, build_glob_set, load_config, parse_config, resolve_config,
    resolve_flatten_options,
};
use classflat_common::FlattenOptions;

fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).expect("failed to write test file");
    path
}

#[test]
fn parses_jsonc_with_trailing_commas() {
    let input = r#"
    {
      // comment
      "compilerOptions": {
        "exportOnly": true, /* inline */
        "indentWidth": 4,
      },
      "include": ["src/**/*",],
      "outDir": "dist",
    }
    "#;

    let config = parse_config(input).expect("should parse JSONC");
    let options = config.compiler_options.expect("compilerOptions missing");

    assert_eq!(options.export_only, Some(true));
    assert_eq!(options.indent_width, Some(4));
    assert_eq!(options.exclude_intermediate, None);
    assert_eq!(config.include, Some(vec!["src/**/*".to_string()]));
    assert_eq!(config.out_dir.as_deref(), Some("dist"));
}

#[test]
fn comment_markers_inside_strings_are_kept() {
    let config = parse_config(r#"{ "outDir": "build//out/*x*/" }"#).expect("parse");
    assert_eq!(config.out_dir.as_deref(), Some("build//out/*x*/"));
}

#[test]
fn boolean_options_accept_strings_and_aliases() {
    let config = parse_config(
        r#"{ "compilerOptions": { "validateInheritance": "false", "preserveComments": "yes" } }"#,
    )
    .expect("parse");
    let options = resolve_flatten_options(config.compiler_options.as_ref());

    assert!(!options.validate_inheritance);
    assert!(options.annotate_inherited);
    assert!(options.exclude_intermediate);
}

#[test]
fn invalid_boolean_string_is_an_error() {
    let err = parse_config(r#"{ "compilerOptions": { "exportOnly": "maybe" } }"#)
        .expect_err("should reject");
    assert!(format!("{err:#}").contains("invalid boolean value"));
}

#[test]
fn load_config_merges_extends() {
    let temp = tempfile::tempdir().expect("temp dir");

    write_file(
        temp.path(),
        "classflat.base.json",
        r#"{
          "compilerOptions": {"exportOnly": true, "indentWidth": 4},
          "include": ["src"],
          "exclude": ["dist"]
        }"#,
    );
    let child = write_file(
        temp.path(),
        "classflat.json",
        r#"{
          "extends": "./classflat.base.json",
          "compilerOptions": {"indentWidth": 8},
          "exclude": ["vendor"]
        }"#,
    );

    let config = load_config(&child).expect("load");
    let options = config.compiler_options.expect("compilerOptions");
    assert_eq!(options.export_only, Some(true));
    assert_eq!(options.indent_width, Some(8));
    assert_eq!(config.include, Some(vec!["src".to_string()]));
    assert_eq!(config.exclude, Some(vec!["vendor".to_string()]));
}

#[test]
fn extends_cycle_is_reported() {
    let temp = tempfile::tempdir().expect("temp dir");
    write_file(temp.path(), "a.json", r#"{ "extends": "./b.json" }"#);
    let a = temp.path().join("a.json");
    write_file(temp.path(), "b.json", r#"{ "extends": "./a.json" }"#);

    let err = load_config(&a).expect_err("cycle");
    assert!(format!("{err:#}").contains("cycle"));
}

#[test]
fn cli_flags_override_config() {
    let mut options = FlattenOptions {
        exclude_intermediate: true,
        export_only: false,
        annotate_inherited: false,
        validate_inheritance: true,
        indent_width: 4,
    };
    let args = CliArgs::try_parse_from([
        "classflat",
        "--include-intermediate",
        "--no-validate",
        "--indent",
        "2",
    ])
    .expect("args");
    apply_cli_overrides(&mut options, &args);

    assert!(!options.exclude_intermediate);
    assert!(!options.validate_inheritance);
    assert_eq!(options.indent_width, 2);
    assert!(!options.export_only);
}

#[test]
fn resolve_config_discovers_file_in_working_directory() {
    let temp = tempfile::tempdir().expect("temp dir");
    write_file(
        temp.path(),
        "classflat.json",
        r#"{ "compilerOptions": { "annotateInherited": true }, "outDir": "out" }"#,
    );
    let args = CliArgs::try_parse_from(["classflat"]).expect("args");

    let resolved = resolve_config(&args, temp.path()).expect("resolve");
    assert!(resolved.options.annotate_inherited);
    assert_eq!(resolved.out_dir, Some(temp.path().join("out")));
    assert_eq!(resolved.base_dir, temp.path());
    assert!(resolved.config_path.is_some());
}

#[test]
fn missing_project_path_is_an_error() {
    let temp = tempfile::tempdir().expect("temp dir");
    let args = CliArgs::try_parse_from(["classflat", "-p", "nope.json"]).expect("args");
    let err = resolve_config(&args, temp.path()).expect_err("missing config");
    assert!(err.to_string().contains("config not found"));
}

#[test]
fn bare_directory_glob_matches_nested_files() {
    let set = build_glob_set(&["src".to_string(), "*.mjs".to_string()])
        .expect("globs")
        .expect("non-empty");
    assert!(set.is_match("src/a/b.js"));
    assert!(set.is_match("main.mjs"));
    assert!(!set.is_match("lib/c.js"));
    assert!(build_glob_set(&[]).expect("globs").is_none());
}
