//! Class hierarchy flattening.
//!
//! `compile` takes one unit of JavaScript source and rewrites every emitted
//! class so that it no longer inherits from anything:
//! - `registry` / `graph` - top-level classes, exports and parent edges
//! - `validator` - missing parents and inheritance cycles
//! - `linearize` - override-resolved member set of one class
//! - `super_calls` - `super.x` and `super(...)` rewriting
//! - `assembler` / `printer` - flattened class text and output splicing
//! - `extract` - one fragment per class
//!
//! Each call builds and drops its own registry; nothing is shared between
//! units, so callers may compile units on as many threads as they like.

pub mod assembler;
pub use assembler::{FlattenedClass, FlattenedMember, MemberOrigin};

pub mod extract;
pub use extract::{ExtractedClass, extract_classes};

pub mod graph;
pub use graph::InheritanceGraph;

pub mod linearize;
pub use linearize::{Linearization, linearize};

pub mod members;
pub use members::{MemberBucket, MemberEntry, MemberIdentity, MemberSet};

pub mod printer;

pub mod registry;
pub use registry::{ClassDescriptor, ClassRegistry, ExportKind};

pub mod super_calls;

pub mod text;

pub mod validator;
pub use validator::validate_inheritance;

use classflat_common::{Diagnostic, FlattenOptions, Span};
use classflat_parser::{Statement, parse_source_file};
use printer::OutputWriter;
use rustc_hash::FxHashSet;
use thiserror::Error;
use tracing::{debug, trace};

/// A unit that could not be compiled.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("{file}: {} syntax error(s); the unit was not compiled", .diagnostics.len())]
    Syntax {
        file: String,
        diagnostics: Vec<Diagnostic>,
    },
}

impl CompileError {
    pub fn diagnostics(&self) -> &[Diagnostic] {
        match self {
            CompileError::Syntax { diagnostics, .. } => diagnostics,
        }
    }

    pub fn file(&self) -> &str {
        match self {
            CompileError::Syntax { file, .. } => file,
        }
    }
}

/// Everything one `compile` call produced.
#[derive(Debug)]
pub struct CompileOutput {
    pub text: String,
    pub diagnostics: Vec<Diagnostic>,
    pub registry: ClassRegistry,
    pub graph: InheritanceGraph,
    /// Emitted classes, in source order.
    pub classes: Vec<FlattenedClass>,
}

impl CompileOutput {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    pub fn class(&self, name: &str) -> Option<&FlattenedClass> {
        self.classes.iter().find(|class| class.name == name)
    }
}

/// Whether a registered class appears in the output.
pub fn should_emit(descriptor: &ClassDescriptor, graph: &InheritanceGraph, options: &FlattenOptions) -> bool {
    if options.export_only {
        return descriptor.is_exported();
    }
    descriptor.is_exported() || !options.exclude_intermediate || !graph.has_children(&descriptor.name)
}

/// Flatten every class of one unit.
pub fn compile(file_name: &str, source: &str, options: &FlattenOptions) -> Result<CompileOutput, CompileError> {
    let parsed = parse_source_file(file_name, source);
    if parsed.has_errors() {
        return Err(CompileError::Syntax {
            file: file_name.to_string(),
            diagnostics: parsed.diagnostics,
        });
    }
    let source_file = parsed.source_file;
    let mut diagnostics = parsed.diagnostics;

    let (registry, graph) = ClassRegistry::build(&source_file, &mut diagnostics);
    if options.validate_inheritance {
        validate_inheritance(&source_file.file_name, &registry, &graph, &mut diagnostics);
    }

    let mut writer = OutputWriter::new();
    let mut classes = Vec::new();
    for (index, statement) in source_file.statements.iter().enumerate() {
        let declaration = match statement {
            Statement::Other(span) => {
                writer.write(source_file.text_of(*span));
                continue;
            }
            Statement::Class(declaration) => declaration,
        };
        // Anonymous and duplicate declarations are not registered.
        let Some(descriptor) = registry.by_statement(index) else {
            writer.write(source_file.text_of(declaration.full_span()));
            continue;
        };
        if !should_emit(descriptor, &graph, options) {
            trace!(class = descriptor.name.as_str(), "class not emitted");
            writer.elide();
            continue;
        }
        let flattened =
            assembler::assemble_class(&source_file, &registry, descriptor, options, &mut diagnostics);
        let leading =
            source_file.text_of(Span::new(declaration.leading_comments_start, declaration.span.start));
        writer.write(leading);
        writer.write(&flattened.text);
        classes.push(flattened);
    }

    // The same ancestor body can be copied into several classes; report each
    // problem in it once.
    let mut seen = FxHashSet::default();
    diagnostics.retain(|d| seen.insert((d.code, d.start)));

    debug!(
        file = file_name,
        emitted = classes.len(),
        registered = registry.len(),
        diagnostics = diagnostics.len(),
        "unit compiled"
    );
    Ok(CompileOutput {
        text: writer.finish(),
        diagnostics,
        registry,
        graph,
        classes,
    })
}

#[cfg(test)]
#[path = "tests/members_tests.rs"]
mod members_tests;

#[cfg(test)]
#[path = "tests/linearize_tests.rs"]
mod linearize_tests;

#[cfg(test)]
#[path = "tests/super_calls_tests.rs"]
mod super_calls_tests;

#[cfg(test)]
#[path = "tests/printer_tests.rs"]
mod printer_tests;
