//! Options recognized by the flattener and the printer.
//!
//! `FlattenOptions` is what a caller passes to `compile`; the CLI fills it from
//! `classflat.json` (`compilerOptions`) and command-line flags.

use serde::{Deserialize, Deserializer, Serialize};

/// Accept both `true` and `"true"` for boolean options, the way hand-written
/// JSON configs tend to mix them.
pub fn deserialize_bool_or_string<'de, D>(deserializer: D) -> Result<bool, D::Error>
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

    match BoolOrString::deserialize(deserializer)? {
        BoolOrString::Bool(b) => Ok(b),
        BoolOrString::String(s) => match s.trim().to_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(true),
            "false" | "0" | "no" | "off" => Ok(false),
            _ => Err(Error::custom(format!(
                "invalid boolean value: '{s}'. Expected true, false, 'true', or 'false'"
            ))),
        },
    }
}

/// Options controlling which classes are emitted and how.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FlattenOptions {
    /// Omit classes that are extended by another class in the unit.
    #[serde(deserialize_with = "deserialize_bool_or_string")]
    pub exclude_intermediate: bool,
    /// Omit classes that were not exported, regardless of chain position.
    #[serde(deserialize_with = "deserialize_bool_or_string")]
    pub export_only: bool,
    /// Mark inherited and synthesized members with a source-attribution comment.
    #[serde(alias = "preserveComments", deserialize_with = "deserialize_bool_or_string")]
    pub annotate_inherited: bool,
    /// Run the inheritance validator and report its diagnostics.
    #[serde(deserialize_with = "deserialize_bool_or_string")]
    pub validate_inheritance: bool,
    /// Indentation used for class members in the output.
    pub indent_width: u8,
}

impl Default for FlattenOptions {
    fn default() -> Self {
        FlattenOptions {
            exclude_intermediate: true,
            export_only: false,
            annotate_inherited: false,
            validate_inheritance: true,
            indent_width: 2,
        }
    }
}

impl FlattenOptions {
    pub fn printer_options(&self) -> PrinterOptions {
        PrinterOptions {
            indent_width: self.indent_width.clamp(1, 8),
            annotate_inherited: self.annotate_inherited,
        }
    }
}

/// Cosmetic options for the printer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrinterOptions {
    pub indent_width: u8,
    pub annotate_inherited: bool,
}

impl Default for PrinterOptions {
    fn default() -> Self {
        PrinterOptions {
            indent_width: 2,
            annotate_inherited: false,
        }
    }
}

impl PrinterOptions {
    pub fn indent(&self) -> String {
        " ".repeat(self.indent_width as usize)
    }
}
