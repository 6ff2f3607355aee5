use anyhow::{Context, Result, bail};
use classflat_common::FlattenOptions;
use globset::{Glob, GlobSet, GlobSetBuilder};
use rustc_hash::FxHashSet;
use serde::{Deserialize, Deserializer};
use std::path::{Path, PathBuf};

use crate::args::CliArgs;

/// Name of the config file looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "classflat.json";

/// Optional boolean that accepts both `true` and `"true"`.
fn deserialize_bool_or_string<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum BoolOrString {
        Bool(bool),
        String(String),
    }

    match Option::<BoolOrString>::deserialize(deserializer)? {
        None => Ok(None),
        Some(BoolOrString::Bool(b)) => Ok(Some(b)),
        Some(BoolOrString::String(s)) => match s.trim().to_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(Some(true)),
            "false" | "0" | "no" | "off" => Ok(Some(false)),
            _ => Err(Error::custom(format!(
                "invalid boolean value: '{s}'. Expected true, false, 'true', or 'false'"
            ))),
        },
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ClassflatConfig {
    #[serde(default)]
    pub extends: Option<String>,
    #[serde(default)]
    pub compiler_options: Option<CompilerOptions>,
    #[serde(default)]
    pub include: Option<Vec<String>>,
    #[serde(default)]
    pub exclude: Option<Vec<String>>,
    #[serde(default)]
    pub out_dir: Option<String>,
}

/// `compilerOptions` as written; unset fields fall back to `FlattenOptions::default()`.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct CompilerOptions {
    #[serde(default, deserialize_with = "deserialize_bool_or_string")]
    pub exclude_intermediate: Option<bool>,
    #[serde(default, deserialize_with = "deserialize_bool_or_string")]
    pub export_only: Option<bool>,
    #[serde(
        default,
        alias = "preserveComments",
        deserialize_with = "deserialize_bool_or_string"
    )]
    pub annotate_inherited: Option<bool>,
    #[serde(default, deserialize_with = "deserialize_bool_or_string")]
    pub validate_inheritance: Option<bool>,
    #[serde(default)]
    pub indent_width: Option<u8>,
}

/// Config after `extends` merging, CLI overrides and path resolution.
#[derive(Debug, Clone, Default)]
pub struct ResolvedConfig {
    pub options: FlattenOptions,
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    pub out_dir: Option<PathBuf>,
    /// Directory that relative `include`/`exclude`/`outDir` entries are taken from.
    pub base_dir: PathBuf,
    pub config_path: Option<PathBuf>,
}

pub fn parse_config(source: &str) -> Result<ClassflatConfig> {
    let stripped = strip_jsonc(source);
    let normalized = remove_trailing_commas(&stripped);
    let config = serde_json::from_str(&normalized).context("failed to parse classflat.json")?;
    Ok(config)
}

pub fn load_config(path: &Path) -> Result<ClassflatConfig> {
    let mut visited = FxHashSet::default();
    load_config_inner(path, &mut visited)
}

fn load_config_inner(path: &Path, visited: &mut FxHashSet<PathBuf>) -> Result<ClassflatConfig> {
    let canonical = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    if !visited.insert(canonical.clone()) {
        bail!("config extends cycle detected at {}", canonical.display());
    }

    let source = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config: {}", path.display()))?;
    let mut config =
        parse_config(&source).with_context(|| format!("failed to parse config: {}", path.display()))?;

    if let Some(extends) = config.extends.take() {
        let base_dir = path.parent().unwrap_or_else(|| Path::new(""));
        let base_config = load_config_inner(&base_dir.join(extends), visited)?;
        config = merge_configs(base_config, config);
    }

    visited.remove(&canonical);
    Ok(config)
}

/// Child values win field by field; `compilerOptions` merge per option.
fn merge_configs(base: ClassflatConfig, child: ClassflatConfig) -> ClassflatConfig {
    let compiler_options = match (base.compiler_options, child.compiler_options) {
        (Some(base), Some(child)) => Some(CompilerOptions {
            exclude_intermediate: child.exclude_intermediate.or(base.exclude_intermediate),
            export_only: child.export_only.or(base.export_only),
            annotate_inherited: child.annotate_inherited.or(base.annotate_inherited),
            validate_inheritance: child.validate_inheritance.or(base.validate_inheritance),
            indent_width: child.indent_width.or(base.indent_width),
        }),
        (base, child) => child.or(base),
    };

    ClassflatConfig {
        extends: None,
        compiler_options,
        include: child.include.or(base.include),
        exclude: child.exclude.or(base.exclude),
        out_dir: child.out_dir.or(base.out_dir),
    }
}

pub fn resolve_flatten_options(options: Option<&CompilerOptions>) -> FlattenOptions {
    let mut resolved = FlattenOptions::default();
    let Some(options) = options else {
        return resolved;
    };

    if let Some(value) = options.exclude_intermediate {
        resolved.exclude_intermediate = value;
    }
    if let Some(value) = options.export_only {
        resolved.export_only = value;
    }
    if let Some(value) = options.annotate_inherited {
        resolved.annotate_inherited = value;
    }
    if let Some(value) = options.validate_inheritance {
        resolved.validate_inheritance = value;
    }
    if let Some(value) = options.indent_width {
        resolved.indent_width = value;
    }
    resolved
}

/// Command-line flags only ever switch behavior on, so they override the config.
pub fn apply_cli_overrides(options: &mut FlattenOptions, args: &CliArgs) {
    if args.include_intermediate {
        options.exclude_intermediate = false;
    }
    if args.export_only {
        options.export_only = true;
    }
    if args.annotate {
        options.annotate_inherited = true;
    }
    if args.no_validate {
        options.validate_inheritance = false;
    }
    if let Some(indent) = args.indent {
        options.indent_width = indent;
    }
}

pub(crate) fn find_config(cwd: &Path) -> Option<PathBuf> {
    let candidate = cwd.join(CONFIG_FILE_NAME);
    candidate.is_file().then_some(candidate)
}

pub fn resolve_config_path(cwd: &Path, project: Option<&Path>) -> Result<Option<PathBuf>> {
    let Some(project) = project else {
        return Ok(find_config(cwd));
    };

    let mut candidate = if project.is_absolute() {
        project.to_path_buf()
    } else {
        cwd.join(project)
    };

    if candidate.is_dir() {
        candidate = candidate.join(CONFIG_FILE_NAME);
    }

    if !candidate.exists() {
        bail!("config not found at {}", candidate.display());
    }

    if !candidate.is_file() {
        bail!("project path is not a file: {}", candidate.display());
    }

    Ok(Some(candidate))
}

/// Load the config for `args` (if any) and fold in the command-line flags.
pub fn resolve_config(args: &CliArgs, cwd: &Path) -> Result<ResolvedConfig> {
    let path = resolve_config_path(cwd, args.project.as_deref())?;
    let config = match path.as_deref() {
        Some(path) => load_config(path)?,
        None => ClassflatConfig::default(),
    };
    let base_dir = path
        .as_deref()
        .and_then(Path::parent)
        .map_or_else(|| cwd.to_path_buf(), Path::to_path_buf);

    let mut options = resolve_flatten_options(config.compiler_options.as_ref());
    apply_cli_overrides(&mut options, args);

    let out_dir = match &args.out_dir {
        Some(dir) => Some(cwd.join(dir)),
        None => config.out_dir.as_ref().map(|dir| base_dir.join(dir)),
    };

    Ok(ResolvedConfig {
        options,
        include: config.include.unwrap_or_default(),
        exclude: config.exclude.unwrap_or_default(),
        out_dir,
        base_dir,
        config_path: path,
    })
}

/// Compile `include`/`exclude` patterns. An empty pattern list yields `None`.
pub fn build_glob_set(patterns: &[String]) -> Result<Option<GlobSet>> {
    if patterns.is_empty() {
        return Ok(None);
    }
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let pattern = pattern.trim_start_matches("./");
        builder.add(Glob::new(pattern).with_context(|| format!("invalid glob pattern '{pattern}'"))?);
        // A bare directory name matches everything below it.
        if !pattern.contains('*') && !pattern.contains('.') {
            let nested = format!("{}/**", pattern.trim_end_matches('/'));
            builder.add(Glob::new(&nested).with_context(|| format!("invalid glob pattern '{nested}'"))?);
        }
    }
    Ok(Some(builder.build().context("failed to build glob set")?))
}

fn strip_jsonc(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    let mut in_string = false;
    let mut escape = false;
    let mut in_line_comment = false;
    let mut in_block_comment = false;

    while let Some(ch) = chars.next() {
        if in_line_comment {
            if ch == '\n' {
                in_line_comment = false;
                out.push(ch);
            }
            continue;
        }

        if in_block_comment {
            if ch == '*' && chars.peek() == Some(&'/') {
                chars.next();
                in_block_comment = false;
            } else if ch == '\n' {
                out.push(ch);
            }
            continue;
        }

        if in_string {
            out.push(ch);
            if escape {
                escape = false;
            } else if ch == '\\' {
                escape = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }

        if ch == '"' {
            in_string = true;
            out.push(ch);
            continue;
        }

        if ch == '/' {
            match chars.peek() {
                Some('/') => {
                    chars.next();
                    in_line_comment = true;
                    continue;
                }
                Some('*') => {
                    chars.next();
                    in_block_comment = true;
                    continue;
                }
                _ => {}
            }
        }

        out.push(ch);
    }

    out
}

fn remove_trailing_commas(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    let mut in_string = false;
    let mut escape = false;

    while let Some(ch) = chars.next() {
        if in_string {
            out.push(ch);
            if escape {
                escape = false;
            } else if ch == '\\' {
                escape = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }

        if ch == '"' {
            in_string = true;
            out.push(ch);
            continue;
        }

        if ch == ',' {
            let mut lookahead = chars.clone();
            while lookahead.peek().is_some_and(|next| next.is_whitespace()) {
                lookahead.next();
            }
            if matches!(lookahead.peek(), Some('}' | ']')) {
                continue;
            }
        }

        out.push(ch);
    }

    out
}
