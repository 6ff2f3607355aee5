use anyhow::{Context, Result};
use classflat_common::diagnostics::DiagnosticRelatedInformation;
use classflat_common::{Diagnostic, DiagnosticCategory, DiagnosticKind, LineMap};
use colored::Colorize;
use rustc_hash::FxHashMap;
use serde::Serialize;
use std::path::Path;

/// Prefix printed before diagnostic codes (`CF9001`).
pub const CODE_PREFIX: &str = "CF";

pub struct Reporter {
    color: bool,
    sources: FxHashMap<String, String>,
    line_maps: FxHashMap<String, LineMap>,
}

/// One diagnostic as written by `--diagnostics json`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonDiagnostic<'a> {
    file: &'a str,
    /// 1-based; absent when the file could not be read.
    #[serde(skip_serializing_if = "Option::is_none")]
    line: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    column: Option<u32>,
    code: String,
    category: DiagnosticCategory,
    kind: DiagnosticKind,
    message: &'a str,
    #[serde(skip_serializing_if = "<[String]>::is_empty")]
    classes: &'a [String],
}

impl Reporter {
    pub fn new(color: bool) -> Self {
        Reporter {
            color,
            sources: FxHashMap::default(),
            line_maps: FxHashMap::default(),
        }
    }

    /// Register source text for `file` so it is not re-read from disk.
    pub fn add_source(&mut self, file: impl Into<String>, text: impl Into<String>) {
        let file = file.into();
        self.line_maps.remove(&file);
        self.sources.insert(file, text.into());
    }

    pub fn render(&mut self, diagnostics: &[Diagnostic]) -> String {
        let mut out = String::new();
        for (index, diagnostic) in diagnostics.iter().enumerate() {
            if index > 0 {
                out.push('\n');
            }
            out.push_str(&self.format_diagnostic(diagnostic));
        }
        out
    }

    pub fn render_json(&mut self, diagnostics: &[Diagnostic]) -> Result<String> {
        let entries: Vec<JsonDiagnostic<'_>> = diagnostics
            .iter()
            .map(|diagnostic| {
                let position = self.position_for(&diagnostic.file, diagnostic.start);
                JsonDiagnostic {
                    file: &diagnostic.file,
                    line: position.map(|(line, _)| line),
                    column: position.map(|(_, column)| column),
                    code: format!("{CODE_PREFIX}{}", diagnostic.code),
                    category: diagnostic.category,
                    kind: diagnostic.kind,
                    message: &diagnostic.message_text,
                    classes: &diagnostic.classes,
                }
            })
            .collect();
        serde_json::to_string_pretty(&entries).context("failed to serialize diagnostics")
    }

    /// One-line summary in the tsc style: `Found 2 errors in 1 file.`
    pub fn summary(&self, diagnostics: &[Diagnostic]) -> Option<String> {
        let errors = diagnostics.iter().filter(|d| d.is_error()).count();
        if errors == 0 {
            return None;
        }
        let mut files: Vec<&str> = diagnostics
            .iter()
            .filter(|d| d.is_error())
            .map(|d| d.file.as_str())
            .collect();
        files.sort_unstable();
        files.dedup();

        let noun = if errors == 1 { "error" } else { "errors" };
        let text = match files.as_slice() {
            [file] => format!("Found {errors} {noun} in {file}."),
            _ => format!("Found {errors} {noun} in {} files.", files.len()),
        };
        Some(if self.color { text.bold().to_string() } else { text })
    }

    pub fn format_diagnostic(&mut self, diagnostic: &Diagnostic) -> String {
        let location = self.format_location(&diagnostic.file, diagnostic.start);
        let category = self.format_category(diagnostic.category);
        let code = self.format_code(diagnostic.code);

        let mut output = String::new();
        if let Some(location) = location {
            output.push_str(&location);
        } else if !diagnostic.file.is_empty() {
            output.push_str(&diagnostic.file);
        } else {
            output.push_str("<unknown>");
        }

        output.push_str(" - ");
        output.push_str(&category);
        if !code.is_empty() {
            output.push(' ');
            output.push_str(&code);
        }
        output.push_str(": ");
        output.push_str(&diagnostic.message_text);

        if let Some(snippet) =
            self.format_snippet(&diagnostic.file, diagnostic.start, diagnostic.length)
        {
            output.push_str(&snippet);
        }

        for related in &diagnostic.related_information {
            output.push('\n');
            output.push_str(&self.format_related(related));
            if let Some(snippet) = self.format_snippet(&related.file, related.start, related.length)
            {
                output.push_str(&snippet);
            }
        }

        output
    }

    /// Source line with the span underlined, e.g.
    ///
    /// ```text
    ///     3   class Dog extends Animal {
    ///                           ~~~~~~
    /// ```
    fn format_snippet(&mut self, file: &str, start: u32, length: u32) -> Option<String> {
        if file.is_empty() || length == 0 {
            return None;
        }

        let (line_num, column) = self.position_for(file, start)?;
        let source = self.sources.get(file)?;
        let line_text = source.lines().nth((line_num - 1) as usize)?;

        // Underline up to the end of the span or of the line, whichever is first.
        let column = (column - 1) as usize;
        let mut underline = String::new();
        for (offset, ch) in line_text.char_indices() {
            let width = if ch == '\t' { 4 } else { 1 };
            if offset < column {
                underline.push_str(&" ".repeat(width));
            } else if offset < column + length as usize {
                underline.push_str(&"~".repeat(width));
            } else {
                break;
            }
        }
        if !underline.contains('~') {
            underline.push('~');
        }

        let underline = if self.color {
            underline.red().to_string()
        } else {
            underline
        };
        Some(format!("\n  {line_num:>3}   {line_text}\n        {underline}"))
    }

    fn format_related(&mut self, related: &DiagnosticRelatedInformation) -> String {
        let location = self
            .format_location(&related.file, related.start)
            .unwrap_or_else(|| related.file.clone());
        let prefix = if self.color {
            "  Related".dimmed().to_string()
        } else {
            "  Related".to_string()
        };

        format!("{prefix}: {location} - {}", related.message_text)
    }

    fn format_location(&mut self, file: &str, offset: u32) -> Option<String> {
        if file.is_empty() {
            return None;
        }

        let (line, column) = self.position_for(file, offset)?;
        Some(format!("{file}:{line}:{column}"))
    }

    /// 1-based line and column of `offset` in `file`.
    fn position_for(&mut self, file: &str, offset: u32) -> Option<(u32, u32)> {
        self.ensure_source(file)?;
        if !self.line_maps.contains_key(file) {
            let source = self.sources.get(file)?;
            self.line_maps.insert(file.to_string(), LineMap::build(source));
        }

        let position = self.line_maps.get(file)?.position(offset);
        Some((position.line + 1, position.character + 1))
    }

    fn ensure_source(&mut self, file: &str) -> Option<()> {
        if !self.sources.contains_key(file) {
            let contents = std::fs::read_to_string(Path::new(file)).ok()?;
            self.sources.insert(file.to_string(), contents);
        }
        Some(())
    }

    fn format_category(&self, category: DiagnosticCategory) -> String {
        let label = category.name();
        if !self.color {
            return label.to_string();
        }

        match category {
            DiagnosticCategory::Error => label.red().bold().to_string(),
            DiagnosticCategory::Warning => label.yellow().bold().to_string(),
            DiagnosticCategory::Message => label.cyan().bold().to_string(),
        }
    }

    fn format_code(&self, code: u32) -> String {
        if code == 0 {
            return String::new();
        }

        let label = format!("{CODE_PREFIX}{code}");
        if self.color {
            label.bright_blue().to_string()
        } else {
            label
        }
    }
}
