use clap::Parser;

use super::args::{CliArgs, DiagnosticsFormat};

#[test]
fn parses_defaults() {
    let args = CliArgs::try_parse_from(["classflat"]).expect("default args should parse");

    assert!(args.files.is_empty());
    assert!(args.project.is_none());
    assert!(args.out_dir.is_none());
    assert!(!args.split);
    assert!(!args.include_intermediate);
    assert!(!args.export_only);
    assert!(!args.annotate);
    assert!(!args.no_validate);
    assert_eq!(args.indent, None);
    assert_eq!(args.diagnostics, DiagnosticsFormat::Text);
}

#[test]
fn parses_common_flags() {
    let args = CliArgs::try_parse_from([
        "classflat",
        "--out-dir",
        "dist",
        "--split",
        "--project",
        "configs/classflat.json",
        "--include-intermediate",
        "--export-only",
        "--annotate",
        "--no-validate",
        "--indent",
        "4",
        "--diagnostics",
        "json",
        "--emit-graph",
        "src/shapes.js",
        "lib",
    ])
    .expect("flagged args should parse");

    assert_eq!(args.out_dir.as_deref(), Some(std::path::Path::new("dist")));
    assert_eq!(
        args.project.as_deref(),
        Some(std::path::Path::new("configs/classflat.json"))
    );
    assert!(args.split);
    assert!(args.include_intermediate);
    assert!(args.export_only);
    assert!(args.annotate);
    assert!(args.no_validate);
    assert_eq!(args.indent, Some(4));
    assert_eq!(args.diagnostics, DiagnosticsFormat::Json);
    assert!(args.emit_graph);
    assert_eq!(
        args.files,
        vec![
            std::path::PathBuf::from("src/shapes.js"),
            std::path::PathBuf::from("lib")
        ]
    );
}

#[test]
fn accepts_camel_case_aliases() {
    let args = CliArgs::try_parse_from([
        "classflat",
        "--outDir",
        "out",
        "--exportOnly",
        "--preserve-comments",
        "--showConfig",
    ])
    .expect("aliases should parse");

    assert!(args.out_dir.is_some());
    assert!(args.export_only);
    assert!(args.annotate);
    assert!(args.show_config);
}

#[test]
fn split_requires_out_dir() {
    assert!(CliArgs::try_parse_from(["classflat", "--split", "a.js"]).is_err());
}

#[test]
fn indent_outside_range_is_rejected() {
    assert!(CliArgs::try_parse_from(["classflat", "--indent", "0"]).is_err());
    assert!(CliArgs::try_parse_from(["classflat", "--indent", "12"]).is_err());
}
