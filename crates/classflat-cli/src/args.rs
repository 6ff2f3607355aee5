use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// CLI arguments for the classflat binary.
#[derive(Parser, Debug)]
#[command(
    name = "classflat",
    version,
    about = "Flatten JavaScript class hierarchies into standalone classes"
)]
pub struct CliArgs {
    // ==================== Command-line Only Options ====================
    /// Print the resolved configuration as JSON instead of compiling.
    #[arg(long = "show-config", alias = "showConfig")]
    pub show_config: bool,

    /// Print the names of the files that would be compiled and stop.
    #[arg(long = "list-files", alias = "listFiles")]
    pub list_files: bool,

    /// Path to classflat.json or a directory containing it.
    #[arg(short = 'p', long = "project")]
    pub project: Option<PathBuf>,

    // ==================== Flattening ====================
    /// Also emit classes that are extended by another class in the unit.
    #[arg(long = "include-intermediate", alias = "includeIntermediate")]
    pub include_intermediate: bool,

    /// Emit only exported classes.
    #[arg(long = "export-only", alias = "exportOnly")]
    pub export_only: bool,

    /// Mark inherited and synthesized members with a source comment.
    #[arg(long, alias = "preserve-comments")]
    pub annotate: bool,

    /// Skip the missing-parent and cycle checks.
    #[arg(long = "no-validate", alias = "noValidate")]
    pub no_validate: bool,

    /// Indentation width for class members.
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=8))]
    pub indent: Option<u8>,

    // ==================== Emit ====================
    /// Write compiled units under this directory instead of stdout.
    #[arg(long = "out-dir", alias = "outDir")]
    pub out_dir: Option<PathBuf>,

    /// Write every emitted class to its own file (requires --out-dir).
    #[arg(long, requires = "out_dir")]
    pub split: bool,

    /// Print the inheritance graph of each unit as JSON.
    #[arg(long = "emit-graph", alias = "emitGraph")]
    pub emit_graph: bool,

    // ==================== Output Formatting ====================
    /// Diagnostic output format.
    #[arg(long, value_enum, default_value_t = DiagnosticsFormat::Text)]
    pub diagnostics: DiagnosticsFormat,

    /// Color diagnostics even when stderr is not a terminal.
    #[arg(long)]
    pub pretty: bool,

    /// Input files or directories.
    #[arg(value_name = "FILES")]
    pub files: Vec<PathBuf>,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum DiagnosticsFormat {
    #[default]
    Text,
    Json,
}
