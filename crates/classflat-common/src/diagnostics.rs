//! Diagnostic types and message lookup.
//!
//! Diagnostics are values, never panics: the scanner and parser push
//! `compile-error` diagnostics, the flattener pushes the recoverable kinds.
//! Message templates use `{0}`, `{1}`, ... placeholders filled by
//! [`format_message`].

use serde::Serialize;
use std::fmt;

// =============================================================================
// Diagnostic Types
// =============================================================================

/// Diagnostic category.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticCategory {
    Warning = 0,
    Error = 1,
    Message = 3,
}

impl DiagnosticCategory {
    pub fn name(self) -> &'static str {
        match self {
            DiagnosticCategory::Warning => "warning",
            DiagnosticCategory::Error => "error",
            DiagnosticCategory::Message => "message",
        }
    }
}

impl fmt::Display for DiagnosticCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What went wrong, independent of the message wording.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiagnosticKind {
    /// A class extends a name that is not declared in the unit.
    MissingParent,
    /// Following parent links from a class comes back around.
    CircularInheritance,
    /// A `super` reference whose target cannot be resolved statically.
    UnresolvedSuperCall,
    /// A class name declared more than once at the top level.
    DuplicateClass,
    /// A heritage clause that is not a plain identifier.
    UnsupportedHeritage,
    /// An acyclic ancestor chain longer than the linearizer follows.
    ChainTooDeep,
    /// A field initializer that reads `this` now runs before an ancestor
    /// constructor it used to follow.
    FieldInitializerOrder,
    /// The unit cannot be parsed; compilation of the unit aborts.
    CompileError,
}

impl DiagnosticKind {
    pub fn name(self) -> &'static str {
        match self {
            DiagnosticKind::MissingParent => "missing-parent",
            DiagnosticKind::CircularInheritance => "circular-inheritance",
            DiagnosticKind::UnresolvedSuperCall => "unresolved-super-call",
            DiagnosticKind::DuplicateClass => "duplicate-class",
            DiagnosticKind::UnsupportedHeritage => "unsupported-heritage",
            DiagnosticKind::ChainTooDeep => "chain-too-deep",
            DiagnosticKind::FieldInitializerOrder => "field-initializer-order",
            DiagnosticKind::CompileError => "compile-error",
        }
    }
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Related information for a diagnostic (e.g. where the parent was declared).
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DiagnosticRelatedInformation {
    pub file: String,
    pub start: u32,
    pub length: u32,
    pub message_text: String,
}

/// A single diagnostic with location, kind and the classes involved.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub category: DiagnosticCategory,
    pub code: u32,
    pub file: String,
    pub start: u32,
    pub length: u32,
    pub message_text: String,
    /// Offending class name(s); the first is the class being reported on.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub classes: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub related_information: Vec<DiagnosticRelatedInformation>,
}

impl Diagnostic {
    /// Create a diagnostic from a registered message code.
    ///
    /// The category comes from the message table; unknown codes are errors.
    #[must_use]
    pub fn from_code(
        kind: DiagnosticKind,
        code: u32,
        file: impl Into<String>,
        start: u32,
        length: u32,
        args: &[&str],
    ) -> Self {
        let (category, message_text) = match get_diagnostic_message(code) {
            Some(msg) => (msg.category, format_message(msg.message, args)),
            None => (DiagnosticCategory::Error, args.join(" ")),
        };
        Diagnostic {
            kind,
            category,
            code,
            file: file.into(),
            start,
            length,
            message_text,
            classes: Vec::new(),
            related_information: Vec::new(),
        }
    }

    /// Create a `compile-error` diagnostic with a free-form message.
    #[must_use]
    pub fn compile_error(
        file: impl Into<String>,
        start: u32,
        length: u32,
        message: impl Into<String>,
        code: u32,
    ) -> Self {
        Diagnostic {
            kind: DiagnosticKind::CompileError,
            category: DiagnosticCategory::Error,
            code,
            file: file.into(),
            start,
            length,
            message_text: message.into(),
            classes: Vec::new(),
            related_information: Vec::new(),
        }
    }

    /// Attach the class names this diagnostic is about.
    #[must_use]
    pub fn with_classes<I, S>(mut self, classes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.classes.extend(classes.into_iter().map(Into::into));
        self
    }

    /// Add related information to this diagnostic.
    #[must_use]
    pub fn with_related(
        mut self,
        file: impl Into<String>,
        start: u32,
        length: u32,
        message: impl Into<String>,
    ) -> Self {
        self.related_information.push(DiagnosticRelatedInformation {
            file: file.into(),
            start,
            length,
            message_text: message.into(),
        });
        self
    }

    pub fn is_error(&self) -> bool {
        self.category == DiagnosticCategory::Error
    }
}

/// Format a diagnostic message by replacing {0}, {1}, etc. with arguments.
#[must_use]
pub fn format_message(template: &str, args: &[&str]) -> String {
    let mut result = template.to_string();
    for (i, arg) in args.iter().enumerate() {
        result = result.replace(&format!("{{{i}}}"), arg);
    }
    result
}

/// A diagnostic message definition with code, category, and message template.
#[derive(Clone, Copy, Debug)]
pub struct DiagnosticMessage {
    pub code: u32,
    pub category: DiagnosticCategory,
    pub message: &'static str,
}

// =============================================================================
// Codes and messages
// =============================================================================

pub mod diagnostic_codes {
    // Scanner / parser (compile-error)
    pub const UNTERMINATED_STRING_LITERAL: u32 = 1002;
    pub const UNTERMINATED_TEMPLATE_LITERAL: u32 = 1160;
    pub const UNTERMINATED_REGULAR_EXPRESSION_LITERAL: u32 = 1161;
    pub const ASTERISK_SLASH_EXPECTED: u32 = 1010;
    pub const INVALID_CHARACTER: u32 = 1127;
    pub const TOKEN_EXPECTED: u32 = 1005;
    pub const DECLARATION_OR_STATEMENT_EXPECTED: u32 = 1128;
    pub const UNEXPECTED_TOKEN: u32 = 1012;
    pub const PROPERTY_OR_METHOD_EXPECTED: u32 = 1068;
    pub const UNEXPECTED_END_OF_TEXT: u32 = 1126;

    // Flattening
    pub const CLASS_EXTENDS_UNDECLARED_CLASS: u32 = 9001;
    pub const CLASS_INHERITANCE_IS_CIRCULAR: u32 = 9002;
    pub const SUPER_MEMBER_HAS_NO_ANCESTOR_IMPLEMENTATION: u32 = 9003;
    pub const COMPUTED_SUPER_ACCESS_CANNOT_BE_RESOLVED: u32 = 9004;
    pub const ASSIGNMENT_THROUGH_SUPER_CANNOT_BE_FLATTENED: u32 = 9005;
    pub const SUPER_REFERS_TO_FIELD: u32 = 9006;
    pub const DUPLICATE_CLASS_DECLARATION: u32 = 9007;
    pub const HERITAGE_EXPRESSION_NOT_SUPPORTED: u32 = 9008;
    pub const INHERITANCE_CHAIN_TOO_DEEP: u32 = 9009;
    pub const FIELD_INITIALIZER_RUNS_BEFORE_ANCESTOR_CONSTRUCTOR: u32 = 9010;
}

pub mod diagnostic_messages {
    pub const UNTERMINATED_STRING_LITERAL: &str = "Unterminated string literal.";
    pub const UNTERMINATED_TEMPLATE_LITERAL: &str = "Unterminated template literal.";
    pub const UNTERMINATED_REGULAR_EXPRESSION_LITERAL: &str =
        "Unterminated regular expression literal.";
    pub const ASTERISK_SLASH_EXPECTED: &str = "'*/' expected.";
    pub const INVALID_CHARACTER: &str = "Invalid character.";
    pub const TOKEN_EXPECTED: &str = "'{0}' expected.";
    pub const DECLARATION_OR_STATEMENT_EXPECTED: &str = "Declaration or statement expected.";
    pub const UNEXPECTED_TOKEN: &str = "Unexpected token '{0}'.";
    pub const PROPERTY_OR_METHOD_EXPECTED: &str = "Property or method expected.";
    pub const UNEXPECTED_END_OF_TEXT: &str = "Unexpected end of text.";

    pub const CLASS_EXTENDS_UNDECLARED_CLASS: &str =
        "Class '{0}' extends '{1}', which is not declared in this unit; '{0}' is flattened as a root class.";
    pub const CLASS_INHERITANCE_IS_CIRCULAR: &str =
        "Class '{0}' has circular inheritance: {1}.";
    pub const SUPER_MEMBER_HAS_NO_ANCESTOR_IMPLEMENTATION: &str =
        "'super.{1}' in class '{0}' has no ancestor implementation; the reference is left unrewritten.";
    pub const COMPUTED_SUPER_ACCESS_CANNOT_BE_RESOLVED: &str =
        "Computed 'super[...]' access in class '{0}' cannot be resolved statically; the reference is left unrewritten.";
    pub const ASSIGNMENT_THROUGH_SUPER_CANNOT_BE_FLATTENED: &str =
        "Assignment to 'super.{1}' in class '{0}' cannot be flattened; the reference is left unrewritten.";
    pub const SUPER_REFERS_TO_FIELD: &str =
        "'super.{1}' in class '{0}' refers to a field, which is not reachable through 'super'; the reference is left unrewritten.";
    pub const DUPLICATE_CLASS_DECLARATION: &str =
        "Duplicate class declaration '{0}'; only the first declaration is flattened.";
    pub const HERITAGE_EXPRESSION_NOT_SUPPORTED: &str =
        "Class '{0}' extends an expression, not a class name; it is flattened as a root class.";
    pub const INHERITANCE_CHAIN_TOO_DEEP: &str =
        "Inheritance chain of class '{0}' exceeds {1} levels; ancestors beyond the limit are ignored.";
    pub const FIELD_INITIALIZER_RUNS_BEFORE_ANCESTOR_CONSTRUCTOR: &str =
        "Initializer of field '{1}' in class '{0}' reads 'this' and now runs before the constructor of '{2}'.";
}

use DiagnosticCategory::{Error, Warning};

pub static DIAGNOSTIC_MESSAGES: &[DiagnosticMessage] = &[
    DiagnosticMessage {
        code: diagnostic_codes::UNTERMINATED_STRING_LITERAL,
        category: Error,
        message: diagnostic_messages::UNTERMINATED_STRING_LITERAL,
    },
    DiagnosticMessage {
        code: diagnostic_codes::UNTERMINATED_TEMPLATE_LITERAL,
        category: Error,
        message: diagnostic_messages::UNTERMINATED_TEMPLATE_LITERAL,
    },
    DiagnosticMessage {
        code: diagnostic_codes::UNTERMINATED_REGULAR_EXPRESSION_LITERAL,
        category: Error,
        message: diagnostic_messages::UNTERMINATED_REGULAR_EXPRESSION_LITERAL,
    },
    DiagnosticMessage {
        code: diagnostic_codes::ASTERISK_SLASH_EXPECTED,
        category: Error,
        message: diagnostic_messages::ASTERISK_SLASH_EXPECTED,
    },
    DiagnosticMessage {
        code: diagnostic_codes::INVALID_CHARACTER,
        category: Error,
        message: diagnostic_messages::INVALID_CHARACTER,
    },
    DiagnosticMessage {
        code: diagnostic_codes::TOKEN_EXPECTED,
        category: Error,
        message: diagnostic_messages::TOKEN_EXPECTED,
    },
    DiagnosticMessage {
        code: diagnostic_codes::DECLARATION_OR_STATEMENT_EXPECTED,
        category: Error,
        message: diagnostic_messages::DECLARATION_OR_STATEMENT_EXPECTED,
    },
    DiagnosticMessage {
        code: diagnostic_codes::UNEXPECTED_TOKEN,
        category: Error,
        message: diagnostic_messages::UNEXPECTED_TOKEN,
    },
    DiagnosticMessage {
        code: diagnostic_codes::PROPERTY_OR_METHOD_EXPECTED,
        category: Error,
        message: diagnostic_messages::PROPERTY_OR_METHOD_EXPECTED,
    },
    DiagnosticMessage {
        code: diagnostic_codes::UNEXPECTED_END_OF_TEXT,
        category: Error,
        message: diagnostic_messages::UNEXPECTED_END_OF_TEXT,
    },
    DiagnosticMessage {
        code: diagnostic_codes::CLASS_EXTENDS_UNDECLARED_CLASS,
        category: Error,
        message: diagnostic_messages::CLASS_EXTENDS_UNDECLARED_CLASS,
    },
    DiagnosticMessage {
        code: diagnostic_codes::CLASS_INHERITANCE_IS_CIRCULAR,
        category: Error,
        message: diagnostic_messages::CLASS_INHERITANCE_IS_CIRCULAR,
    },
    DiagnosticMessage {
        code: diagnostic_codes::SUPER_MEMBER_HAS_NO_ANCESTOR_IMPLEMENTATION,
        category: Error,
        message: diagnostic_messages::SUPER_MEMBER_HAS_NO_ANCESTOR_IMPLEMENTATION,
    },
    DiagnosticMessage {
        code: diagnostic_codes::COMPUTED_SUPER_ACCESS_CANNOT_BE_RESOLVED,
        category: Error,
        message: diagnostic_messages::COMPUTED_SUPER_ACCESS_CANNOT_BE_RESOLVED,
    },
    DiagnosticMessage {
        code: diagnostic_codes::ASSIGNMENT_THROUGH_SUPER_CANNOT_BE_FLATTENED,
        category: Error,
        message: diagnostic_messages::ASSIGNMENT_THROUGH_SUPER_CANNOT_BE_FLATTENED,
    },
    DiagnosticMessage {
        code: diagnostic_codes::SUPER_REFERS_TO_FIELD,
        category: Error,
        message: diagnostic_messages::SUPER_REFERS_TO_FIELD,
    },
    DiagnosticMessage {
        code: diagnostic_codes::DUPLICATE_CLASS_DECLARATION,
        category: Warning,
        message: diagnostic_messages::DUPLICATE_CLASS_DECLARATION,
    },
    DiagnosticMessage {
        code: diagnostic_codes::HERITAGE_EXPRESSION_NOT_SUPPORTED,
        category: Warning,
        message: diagnostic_messages::HERITAGE_EXPRESSION_NOT_SUPPORTED,
    },
    DiagnosticMessage {
        code: diagnostic_codes::INHERITANCE_CHAIN_TOO_DEEP,
        category: Error,
        message: diagnostic_messages::INHERITANCE_CHAIN_TOO_DEEP,
    },
    DiagnosticMessage {
        code: diagnostic_codes::FIELD_INITIALIZER_RUNS_BEFORE_ANCESTOR_CONSTRUCTOR,
        category: Warning,
        message: diagnostic_messages::FIELD_INITIALIZER_RUNS_BEFORE_ANCESTOR_CONSTRUCTOR,
    },
];

/// Look up a diagnostic message definition by code.
#[must_use]
pub fn get_diagnostic_message(code: u32) -> Option<&'static DiagnosticMessage> {
    DIAGNOSTIC_MESSAGES.iter().find(|m| m.code == code)
}

/// Get the message template for a diagnostic code.
#[must_use]
pub fn get_message_template(code: u32) -> Option<&'static str> {
    get_diagnostic_message(code).map(|m| m.message)
}
