use anyhow::{Context, Result, bail};
use classflat_common::{Diagnostic, FlattenOptions};
use classflat_flatten::{CompileError, CompileOutput, compile, extract_classes};
use globset::GlobSet;
use rayon::prelude::*;
use rustc_hash::FxHashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::args::CliArgs;
use crate::config::{ResolvedConfig, build_glob_set, resolve_config};

/// Extensions picked up when walking directories.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["js", "mjs", "cjs", "jsx", "ts"];

/// Directories never descended into.
const SKIPPED_DIRECTORIES: &[&str] = &["node_modules", ".git"];

/// tsc-style exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    Success = 0,
    /// At least one unit failed to parse; its output was not written.
    DiagnosticsOutputsSkipped = 1,
    /// Every unit compiled but error diagnostics were reported.
    DiagnosticsOutputsGenerated = 2,
}

impl ExitStatus {
    pub fn code(self) -> i32 {
        self as i32
    }
}

/// One input file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceEntry {
    pub path: PathBuf,
    /// Path relative to the input root; mirrors the layout under `--out-dir`.
    pub relative: PathBuf,
}

impl SourceEntry {
    /// Name used in diagnostics.
    pub fn display_name(&self) -> String {
        self.path.display().to_string()
    }
}

/// Result of a driver run, before anything is printed.
#[derive(Debug, Default)]
pub struct CompilationResult {
    pub diagnostics: Vec<Diagnostic>,
    /// Compiled units (when no out dir is set) followed by graphs, if requested.
    pub stdout: String,
    pub emitted_files: Vec<PathBuf>,
    pub files: Vec<PathBuf>,
    pub failed_units: usize,
    /// `(display name, text)` of every unit read, for snippet rendering.
    pub sources: Vec<(String, String)>,
}

impl CompilationResult {
    pub fn exit_status(&self) -> ExitStatus {
        if self.failed_units > 0 {
            ExitStatus::DiagnosticsOutputsSkipped
        } else if self.diagnostics.iter().any(Diagnostic::is_error) {
            ExitStatus::DiagnosticsOutputsGenerated
        } else {
            ExitStatus::Success
        }
    }
}

/// Resolve the config, compile every input and write outputs.
pub fn run(args: &CliArgs, cwd: &Path) -> Result<CompilationResult> {
    let config = resolve_config(args, cwd)?;
    let entries = discover_sources(&args.files, &config, cwd)?;
    run_with_config(args, &config, entries)
}

pub fn run_with_config(
    args: &CliArgs,
    config: &ResolvedConfig,
    entries: Vec<SourceEntry>,
) -> Result<CompilationResult> {
    info!(files = entries.len(), "compiling");
    let units = read_sources(entries)?;
    let outcomes = compile_units(&units, &config.options);

    let mut result = CompilationResult {
        files: units.iter().map(|(entry, _)| entry.path.clone()).collect(),
        ..CompilationResult::default()
    };
    let mut graphs = serde_json::Map::new();
    let multiple = units.len() > 1;

    for ((entry, text), outcome) in units.iter().zip(outcomes) {
        let name = entry.display_name();
        result.sources.push((name.clone(), text.clone()));
        let output = match outcome {
            Ok(output) => output,
            Err(err) => {
                debug!(file = name.as_str(), "unit not compiled: {err}");
                result.failed_units += 1;
                result.diagnostics.extend(err.diagnostics().iter().cloned());
                continue;
            }
        };

        if args.emit_graph {
            let graph = serde_json::to_value(&output.graph).context("failed to serialize graph")?;
            graphs.insert(name.clone(), graph);
        }

        match &config.out_dir {
            Some(out_dir) if args.split => {
                let written = write_split(out_dir, entry, &output)?;
                result.emitted_files.extend(written);
            }
            Some(out_dir) => {
                let path = out_dir.join(&entry.relative);
                write_file(&path, &output.text)?;
                result.emitted_files.push(path);
            }
            None => {
                if multiple {
                    result.stdout.push_str(&format!("// {name}\n"));
                }
                result.stdout.push_str(&output.text);
            }
        }
        result.diagnostics.extend(output.diagnostics);
    }

    if args.emit_graph {
        let json = serde_json::to_string_pretty(&serde_json::Value::Object(graphs))
            .context("failed to serialize graph")?;
        result.stdout.push_str(&json);
        result.stdout.push('\n');
    }

    Ok(result)
}

/// Compile units in parallel; results keep the input order.
pub fn compile_units(
    units: &[(SourceEntry, String)],
    options: &FlattenOptions,
) -> Vec<Result<CompileOutput, CompileError>> {
    units
        .par_iter()
        .map(|(entry, text)| compile(&entry.display_name(), text, options))
        .collect()
}

fn read_sources(entries: Vec<SourceEntry>) -> Result<Vec<(SourceEntry, String)>> {
    entries
        .into_iter()
        .map(|entry| {
            let text = std::fs::read_to_string(&entry.path)
                .with_context(|| format!("failed to read {}", entry.path.display()))?;
            Ok((entry, text))
        })
        .collect()
}

/// Write each emitted class of a compiled unit to `<out-dir>/<dir>/<Class>.<ext>`.
fn write_split(out_dir: &Path, entry: &SourceEntry, output: &CompileOutput) -> Result<Vec<PathBuf>> {
    let extension = entry
        .path
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("js");
    let directory = match entry.relative.parent() {
        Some(parent) => out_dir.join(parent),
        None => out_dir.to_path_buf(),
    };
    let fragments = extract_classes(&entry.display_name(), &output.text)
        .with_context(|| format!("failed to split compiled output of {}", entry.path.display()))?;

    let mut written = Vec::with_capacity(fragments.len());
    for fragment in fragments {
        let path = directory.join(format!("{}.{extension}", fragment.name));
        write_file(&path, &fragment.text)?;
        written.push(path);
    }
    Ok(written)
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
    }
    std::fs::write(path, contents).with_context(|| format!("failed to write {}", path.display()))?;
    debug!(path = %path.display(), "wrote output");
    Ok(())
}

// =============================================================================
// Source Discovery
// =============================================================================

pub fn has_supported_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| SUPPORTED_EXTENSIONS.contains(&ext))
}

/// Collect the input files.
///
/// Files named on the command line are always compiled. Directories, and the
/// config's base directory when no inputs are given, are walked and filtered by
/// extension and by the config's `include`/`exclude` globs.
pub fn discover_sources(
    inputs: &[PathBuf],
    config: &ResolvedConfig,
    cwd: &Path,
) -> Result<Vec<SourceEntry>> {
    let include = build_glob_set(&config.include)?;
    let exclude = build_glob_set(&config.exclude)?;
    let filter = SourceFilter {
        include: include.as_ref(),
        exclude: exclude.as_ref(),
        skip_dir: config.out_dir.as_deref(),
    };

    let mut entries = Vec::new();
    if inputs.is_empty() {
        if config.config_path.is_none() {
            bail!("no input files; pass files or directories, or add a classflat.json");
        }
        walk_directory(&config.base_dir, &filter, &mut entries);
    }

    for input in inputs {
        let path = cwd.join(input);
        if path.is_dir() {
            walk_directory(&path, &filter, &mut entries);
        } else if path.is_file() {
            let relative = path.file_name().map_or_else(|| input.clone(), PathBuf::from);
            entries.push(SourceEntry { path, relative });
        } else {
            bail!("input not found: {}", input.display());
        }
    }

    let mut seen = FxHashSet::default();
    entries.retain(|entry| seen.insert(entry.path.clone()));
    Ok(entries)
}

struct SourceFilter<'a> {
    include: Option<&'a GlobSet>,
    exclude: Option<&'a GlobSet>,
    skip_dir: Option<&'a Path>,
}

impl SourceFilter<'_> {
    fn accepts(&self, relative: &Path) -> bool {
        if !has_supported_extension(relative) {
            return false;
        }
        if let Some(include) = self.include
            && !include.is_match(relative)
        {
            return false;
        }
        !self.exclude.is_some_and(|exclude| exclude.is_match(relative))
    }
}

fn walk_directory(root: &Path, filter: &SourceFilter<'_>, entries: &mut Vec<SourceEntry>) {
    let walker = WalkDir::new(root)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            if !entry.file_type().is_dir() || entry.depth() == 0 {
                return true;
            }
            let skipped_name = entry
                .file_name()
                .to_str()
                .is_some_and(|name| SKIPPED_DIRECTORIES.contains(&name));
            !skipped_name && filter.skip_dir != Some(entry.path())
        });

    for entry in walker.filter_map(|entry| entry.ok()) {
        if !entry.file_type().is_file() {
            continue;
        }
        let Ok(relative) = entry.path().strip_prefix(root) else {
            continue;
        };
        if filter.accepts(relative) {
            entries.push(SourceEntry {
                path: entry.path().to_path_buf(),
                relative: relative.to_path_buf(),
            });
        }
    }
}

// =============================================================================
// --show-config / --list-files
// =============================================================================

pub fn show_config_json(config: &ResolvedConfig, files: &[SourceEntry]) -> Result<String> {
    let mut root = serde_json::Map::new();
    root.insert(
        "compilerOptions".to_string(),
        serde_json::to_value(&config.options).context("failed to serialize options")?,
    );
    if !config.include.is_empty() {
        root.insert("include".to_string(), config.include.clone().into());
    }
    if !config.exclude.is_empty() {
        root.insert("exclude".to_string(), config.exclude.clone().into());
    }
    if let Some(out_dir) = &config.out_dir {
        root.insert("outDir".to_string(), out_dir.display().to_string().into());
    }
    let files: Vec<serde_json::Value> = files
        .iter()
        .map(|entry| entry.display_name().into())
        .collect();
    root.insert("files".to_string(), files.into());

    serde_json::to_string_pretty(&serde_json::Value::Object(root)).context("failed to serialize config")
}
