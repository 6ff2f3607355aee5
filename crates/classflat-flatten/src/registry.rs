//! Class registry builder.
//!
//! One registry per compilation unit: every named top-level class, keyed by
//! name in declaration order, with its parent, export form and own members.

use crate::graph::InheritanceGraph;
use crate::members::{MemberEntry, MemberIdentity, MemberSet, MemberSlot};
use classflat_common::diagnostics::diagnostic_codes;
use classflat_common::{Diagnostic, DiagnosticKind, Span};
use classflat_parser::{
    ClassDeclaration, ClassMember, ExportModifier, Heritage, MemberKind, SourceFile, Statement,
};
use indexmap::IndexMap;
use serde::Serialize;
use tracing::{debug, trace};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ExportKind {
    #[default]
    None,
    Default,
    Named,
}

impl From<ExportModifier> for ExportKind {
    fn from(modifier: ExportModifier) -> Self {
        match modifier {
            ExportModifier::None => ExportKind::None,
            ExportModifier::Named => ExportKind::Named,
            ExportModifier::Default => ExportKind::Default,
        }
    }
}

#[derive(Clone, Debug)]
pub struct ClassDescriptor {
    pub name: String,
    /// Parent named by a plain identifier in the `extends` clause.
    pub parent: Option<String>,
    /// The `extends` expression when it is not a plain identifier. Such a
    /// class is a root for linearization purposes.
    pub heritage_expression: Option<Span>,
    pub export: ExportKind,
    /// The export comes from a separate `export { ... }` or `export default X`
    /// statement rather than the declaration itself.
    pub exported_via_clause: bool,
    /// Index of the declaration in `SourceFile::statements`.
    pub statement_index: usize,
    pub declaration: ClassDeclaration,
    /// The class's own members, override-resolved within the class.
    pub members: MemberSet,
}

impl ClassDescriptor {
    fn from_declaration(name: String, statement_index: usize, declaration: &ClassDeclaration) -> Self {
        let (parent, heritage_expression) = match &declaration.heritage {
            Some(Heritage::Identifier(identifier)) => (Some(identifier.text.clone()), None),
            Some(Heritage::Expression(span)) => (None, Some(*span)),
            None => (None, None),
        };
        let members = collect_own_members(&name, &declaration.members);
        ClassDescriptor {
            export: declaration.export.into(),
            exported_via_clause: false,
            name,
            parent,
            heritage_expression,
            statement_index,
            declaration: declaration.clone(),
            members,
        }
    }

    #[inline]
    pub fn is_exported(&self) -> bool {
        self.export != ExportKind::None
    }

    /// A member of this class's declaration by index.
    pub fn member(&self, index: usize) -> Option<&ClassMember> {
        self.declaration.members.get(index)
    }

    pub fn span(&self) -> Span {
        self.declaration.span
    }

    /// Span of the class name, falling back to the declaration.
    pub fn name_span(&self) -> Span {
        self.declaration
            .name
            .as_ref()
            .map_or(self.declaration.span, |name| name.span)
    }

    /// Span of the `extends` target.
    pub fn heritage_span(&self) -> Option<Span> {
        self.declaration.heritage.as_ref().map(Heritage::span)
    }
}

/// Categorize a class's members into a `MemberSet`.
///
/// Later declarations of the same identity replace earlier ones, as they do
/// at runtime. Bodiless signatures (overloads, abstract members) are not
/// members of the emitted class.
fn collect_own_members(owner: &str, members: &[ClassMember]) -> MemberSet {
    let mut set = MemberSet::new();
    for (index, member) in members.iter().enumerate() {
        if member.kind.is_function_like() && member.body.is_none() {
            continue;
        }
        let identity = MemberIdentity::of_member(member, owner, index);
        match member.kind {
            MemberKind::Constructor => {
                if set.constructor.is_none() {
                    set.constructor = Some(MemberEntry::new(owner, MemberSlot::Member(index)));
                }
            }
            MemberKind::GetAccessor => set.insert_accessor_half(identity, owner, index, true),
            MemberKind::SetAccessor => set.insert_accessor_half(identity, owner, index, false),
            _ => {
                set.insert(identity, MemberEntry::new(owner, MemberSlot::Member(index)));
            }
        }
    }
    set
}

#[derive(Clone, Debug, Default)]
pub struct ClassRegistry {
    classes: IndexMap<String, ClassDescriptor>,
}

impl ClassRegistry {
    /// Build the registry and inheritance graph for one parsed unit.
    ///
    /// Duplicate declarations and expression heritage produce warnings in
    /// `diagnostics`; nothing here is fatal.
    pub fn build(
        source_file: &SourceFile,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> (ClassRegistry, InheritanceGraph) {
        let file = source_file.file_name.as_str();
        let mut registry = ClassRegistry::default();

        for (statement_index, statement) in source_file.statements.iter().enumerate() {
            let Statement::Class(declaration) = statement else {
                continue;
            };
            let Some(name) = declaration.name_text() else {
                trace!("skipping anonymous class declaration");
                continue;
            };

            if let Some(first) = registry.classes.get(name) {
                let name_span = declaration.name.as_ref().map_or(declaration.span, |n| n.span);
                let first_span = first.name_span();
                diagnostics.push(
                    Diagnostic::from_code(
                        DiagnosticKind::DuplicateClass,
                        diagnostic_codes::DUPLICATE_CLASS_DECLARATION,
                        file,
                        name_span.start,
                        name_span.len(),
                        &[name],
                    )
                    .with_classes([name])
                    .with_related(
                        file,
                        first_span.start,
                        first_span.len(),
                        format!("'{name}' was first declared here."),
                    ),
                );
                continue;
            }

            let descriptor =
                ClassDescriptor::from_declaration(name.to_string(), statement_index, declaration);
            if let Some(span) = descriptor.heritage_expression {
                diagnostics.push(
                    Diagnostic::from_code(
                        DiagnosticKind::UnsupportedHeritage,
                        diagnostic_codes::HERITAGE_EXPRESSION_NOT_SUPPORTED,
                        file,
                        span.start,
                        span.len(),
                        &[name],
                    )
                    .with_classes([name]),
                );
            }
            trace!(
                class = name,
                parent = descriptor.parent.as_deref().unwrap_or(""),
                members = descriptor.members.len(),
                "registered class"
            );
            registry.classes.insert(name.to_string(), descriptor);
        }

        // Export clauses refer to classes declared anywhere in the unit.
        for clause in &source_file.export_clauses {
            for specifier in &clause.specifiers {
                let Some(descriptor) = registry.classes.get_mut(&specifier.local) else {
                    continue;
                };
                if descriptor.export != ExportKind::None && !descriptor.exported_via_clause {
                    continue;
                }
                descriptor.export = if specifier.is_default() {
                    ExportKind::Default
                } else {
                    ExportKind::Named
                };
                descriptor.exported_via_clause = true;
            }
        }

        let graph = InheritanceGraph::build(&registry);
        debug!(
            file,
            classes = registry.len(),
            edges = graph.edge_count(),
            "class registry built"
        );
        (registry, graph)
    }

    pub fn get(&self, name: &str) -> Option<&ClassDescriptor> {
        self.classes.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.classes.contains_key(name)
    }

    /// Descriptors in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &ClassDescriptor> {
        self.classes.values()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.classes.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// The descriptor registered for the declaration at `statement_index`.
    pub fn by_statement(&self, statement_index: usize) -> Option<&ClassDescriptor> {
        self.classes
            .values()
            .find(|descriptor| descriptor.statement_index == statement_index)
    }
}
