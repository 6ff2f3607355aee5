//! Class extraction: one self-contained fragment per top-level class.

use crate::CompileError;
use classflat_parser::parse_source_file;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ExtractedClass {
    /// Class name; `default` for an anonymous default export.
    pub name: String,
    /// Declaration with its leading comments, ending in a line break.
    pub text: String,
}

/// Split a unit (usually compiler output) into one fragment per class.
///
/// Anonymous classes that are not default exports have no name to file
/// them under and are skipped.
pub fn extract_classes(file_name: &str, source: &str) -> Result<Vec<ExtractedClass>, CompileError> {
    let parsed = parse_source_file(file_name, source);
    if parsed.has_errors() {
        return Err(CompileError::Syntax {
            file: file_name.to_string(),
            diagnostics: parsed.diagnostics,
        });
    }
    let source_file = parsed.source_file;

    let mut classes = Vec::new();
    for declaration in source_file.classes() {
        let name = match declaration.name_text() {
            Some(name) => name.to_string(),
            None if declaration.export == classflat_parser::ExportModifier::Default => {
                "default".to_string()
            }
            None => continue,
        };
        let mut text = source_file.text_of(declaration.full_span()).to_string();
        text.push('\n');
        classes.push(ExtractedClass { name, text });
    }
    Ok(classes)
}
