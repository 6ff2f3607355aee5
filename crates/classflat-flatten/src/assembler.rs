//! Flattened class assembler.
//!
//! Combines a class's linearization with the super rewriter's output into
//! the member list of the flattened class, in bucket order:
//! static fields, static methods, instance fields, constructor, accessors,
//! instance methods, then synthesized members.

use crate::linearize::{Linearization, linearize};
use crate::members::{IdentityKind, MemberBucket, MemberEntry, MemberIdentity};
use crate::printer::{PrintedMember, Printer};
use crate::registry::{ClassDescriptor, ClassRegistry, ExportKind};
use crate::super_calls::{SuperRewriter, SynthesizedKind, SynthesizedMember};
use crate::text::MemberText;
use classflat_common::diagnostics::diagnostic_codes;
use classflat_common::limits::MAX_INHERITANCE_DEPTH;
use classflat_common::position::indentation_of;
use classflat_common::comments::comments_in_range;
use classflat_common::{Diagnostic, DiagnosticKind, FlattenOptions};
use classflat_parser::{ClassMember, MemberKind, SourceFile};
use classflat_scanner::{SyntaxKind, Token};
use serde::Serialize;
use tracing::debug;

/// Where a member of the flattened class came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum MemberOrigin {
    /// Declared by the class itself.
    Own,
    /// Declared by an ancestor and not overridden.
    Inherited,
    /// Ancestor body reached through `super`, copied under a new name.
    SuperImplementation,
    /// Non-final link of the constructor chain.
    ConstructorLink,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlattenedMember {
    /// Name in the flattened class; `constructor` for the constructor and
    /// `static` for static blocks.
    pub name: String,
    /// Class that declared the body.
    pub owner: String,
    pub origin: MemberOrigin,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bucket: Option<MemberBucket>,
}

/// One class as it appears in the output.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlattenedClass {
    pub name: String,
    pub export: ExportKind,
    /// Contributing classes, base first.
    pub chain: Vec<String>,
    pub members: Vec<FlattenedMember>,
    /// Printed class, without the comments that precede it in the source.
    pub text: String,
}

impl FlattenedClass {
    pub fn member(&self, name: &str) -> Option<&FlattenedMember> {
        self.members.iter().find(|member| member.name == name)
    }

    pub fn synthesized(&self) -> impl Iterator<Item = &FlattenedMember> {
        self.members.iter().filter(|member| {
            matches!(
                member.origin,
                MemberOrigin::SuperImplementation | MemberOrigin::ConstructorLink
            )
        })
    }
}

/// `export default class X`, `export class X` or `class X`.
///
/// Classes exported through a separate clause keep that clause, so their
/// header carries no export keyword.
pub fn class_header(descriptor: &ClassDescriptor) -> String {
    let keyword = match descriptor.export {
        _ if descriptor.exported_via_clause => "class",
        ExportKind::Default => "export default class",
        ExportKind::Named => "export class",
        ExportKind::None => "class",
    };
    format!("{keyword} {}", descriptor.name)
}

/// Flatten one registered class.
pub fn assemble_class(
    source_file: &SourceFile,
    registry: &ClassRegistry,
    descriptor: &ClassDescriptor,
    options: &FlattenOptions,
    diagnostics: &mut Vec<Diagnostic>,
) -> FlattenedClass {
    let printer = Printer::new(options.printer_options());

    if descriptor.heritage_expression.is_some() {
        // Nothing to flatten against; keep the class as written.
        let text = source_file.text_of(descriptor.span()).to_string();
        return FlattenedClass {
            name: descriptor.name.clone(),
            export: descriptor.export,
            chain: vec![descriptor.name.clone()],
            members: Vec::new(),
            text,
        };
    }

    let linearization = linearize(registry, &descriptor.name);
    if linearization.truncated {
        let span = descriptor.name_span();
        let limit = MAX_INHERITANCE_DEPTH.to_string();
        diagnostics.push(
            Diagnostic::from_code(
                DiagnosticKind::ChainTooDeep,
                diagnostic_codes::INHERITANCE_CHAIN_TOO_DEEP,
                source_file.file_name.as_str(),
                span.start,
                span.len(),
                &[descriptor.name.as_str(), limit.as_str()],
            )
            .with_classes([descriptor.name.as_str()]),
        );
    }

    report_field_order(source_file, registry, &linearization, diagnostics);

    let mut rewriter = SuperRewriter::new(source_file, registry, &linearization);
    let mut printed = Vec::new();
    let mut members = Vec::new();
    let mut context = Assembly {
        source_file,
        registry,
        target: &descriptor.name,
        printed: &mut printed,
        members: &mut members,
    };

    for (identity, entry) in linearization.members.iter_before_constructor() {
        context.push_entry(&mut rewriter, identity, entry);
    }
    if let Some(constructor) = rewriter.rewrite_constructor_chain() {
        context.push_constructor(&linearization, constructor);
    }
    for (identity, entry) in linearization.members.iter_after_constructor() {
        context.push_entry(&mut rewriter, identity, entry);
    }

    let output = rewriter.finish();
    for synthesized in output.synthesized.iter().chain(&output.constructor_links) {
        context.push_synthesized(synthesized);
    }
    diagnostics.extend(output.diagnostics);

    let text = printer.print_class(&class_header(descriptor), &printed);
    debug!(
        class = descriptor.name.as_str(),
        members = members.len(),
        chain = linearization.chain.len(),
        "assembled flattened class"
    );
    FlattenedClass {
        name: descriptor.name.clone(),
        export: descriptor.export,
        chain: linearization.chain,
        members,
        text,
    }
}

/// Instance fields are initialized before the whole constructor chain, so
/// an initializer that reads `this` may miss state an ancestor constructor
/// used to set first.
fn report_field_order(
    source_file: &SourceFile,
    registry: &ClassRegistry,
    linearization: &Linearization,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let target = linearization.target.as_str();
    for (identity, entry) in linearization.members.iter_before_constructor() {
        if identity.kind != IdentityKind::Field || identity.is_static {
            continue;
        }
        let Some(ancestor) = linearization
            .constructors
            .iter()
            .rev()
            .find(|constructor| linearization.is_strict_ancestor(&constructor.owner, &entry.owner))
        else {
            continue;
        };
        let member = entry
            .slot
            .indices()
            .next()
            .and_then(|index| registry.get(&entry.owner)?.member(index));
        let Some(initializer) = member.and_then(|member| member.initializer) else {
            continue;
        };
        if !reads_this_eagerly(source_file.tokens_in(initializer)) {
            continue;
        }
        let span = member
            .and_then(|member| member.name.as_ref())
            .map_or(initializer, |name| name.span);
        diagnostics.push(
            Diagnostic::from_code(
                DiagnosticKind::FieldInitializerOrder,
                diagnostic_codes::FIELD_INITIALIZER_RUNS_BEFORE_ANCESTOR_CONSTRUCTOR,
                source_file.file_name.as_str(),
                span.start,
                span.len(),
                &[target, identity.name.as_str(), ancestor.owner.as_str()],
            )
            .with_classes([target]),
        );
    }
}

/// `this` read at initialization time. Initializers containing a function
/// or arrow do not count.
fn reads_this_eagerly(tokens: &[Token]) -> bool {
    tokens.iter().any(|token| token.kind == SyntaxKind::ThisKeyword)
        && !tokens.iter().any(|token| {
            matches!(
                token.kind,
                SyntaxKind::EqualsGreaterThanToken | SyntaxKind::FunctionKeyword
            )
        })
}

struct Assembly<'a, 'o> {
    source_file: &'a SourceFile,
    registry: &'a ClassRegistry,
    target: &'a str,
    printed: &'o mut Vec<PrintedMember>,
    members: &'o mut Vec<FlattenedMember>,
}

impl<'a> Assembly<'a, '_> {
    fn source_member(&self, owner: &str, index: usize) -> Option<&'a ClassMember> {
        let registry: &'a ClassRegistry = self.registry;
        registry.get(owner)?.member(index)
    }

    fn push_entry(
        &mut self,
        rewriter: &mut SuperRewriter<'_>,
        identity: &MemberIdentity,
        entry: &MemberEntry,
    ) {
        let inherited = entry.owner != self.target;
        for index in entry.slot.indices() {
            let Some(member) = self.source_member(&entry.owner, index) else {
                continue;
            };
            let Some(body) = rewriter.rewrite_member(&entry.owner, index) else {
                continue;
            };
            let annotation = inherited.then(|| format!("inherited from {}", entry.owner));
            let printed = self.printed_member(member, body, annotation);
            self.printed.push(printed);
        }
        let name = if identity.kind == IdentityKind::StaticBlock {
            "static".to_string()
        } else {
            identity.name.clone()
        };
        self.members.push(FlattenedMember {
            name,
            owner: entry.owner.clone(),
            origin: if inherited {
                MemberOrigin::Inherited
            } else {
                MemberOrigin::Own
            },
            bucket: Some(identity.bucket()),
        });
    }

    fn push_constructor(&mut self, linearization: &Linearization, body: MemberText) {
        let Some(entry) = linearization.constructors.last() else {
            return;
        };
        let inherited = entry.owner != self.target;
        let Some(index) = entry.slot.indices().next() else {
            return;
        };
        let Some(member) = self.source_member(&entry.owner, index) else {
            return;
        };
        let printed = self.printed_member(
            member,
            body,
            inherited.then(|| format!("inherited from {}", entry.owner)),
        );
        self.printed.push(printed);
        self.members.push(FlattenedMember {
            name: "constructor".to_string(),
            owner: entry.owner.clone(),
            origin: if inherited {
                MemberOrigin::Inherited
            } else {
                MemberOrigin::Own
            },
            bucket: None,
        });
    }

    fn push_synthesized(&mut self, synthesized: &SynthesizedMember) {
        let Some(member) = self.source_member(&synthesized.owner, synthesized.member_index) else {
            return;
        };
        let mut printed = self.printed_member(
            member,
            synthesized.text.clone(),
            Some(format!("super implementation from {}", synthesized.owner)),
        );
        // The source member's leading comments describe the original name.
        printed.leading_comments.clear();
        printed.trailing_comment = None;
        self.printed.push(printed);
        self.members.push(FlattenedMember {
            name: synthesized.name.clone(),
            owner: synthesized.owner.clone(),
            origin: match synthesized.kind {
                SynthesizedKind::Constructor => MemberOrigin::ConstructorLink,
                SynthesizedKind::Method | SynthesizedKind::Getter => {
                    MemberOrigin::SuperImplementation
                }
            },
            bucket: None,
        });
    }

    fn printed_member(
        &self,
        member: &ClassMember,
        body: MemberText,
        annotation: Option<String>,
    ) -> PrintedMember {
        let text: &str = &self.source_file.text;
        let trivia = member.leading_trivia();
        let leading_comments = comments_in_range(&self.source_file.comments, trivia.start, trivia.end)
            .iter()
            .map(|comment| comment.get_text(text).to_string())
            .collect();
        PrintedMember {
            leading_comments,
            annotation,
            body,
            source_indent: indentation_of(text, member.span.start),
            trailing_comment: member
                .trailing_comment
                .map(|span| span.text(text).to_string()),
            is_field: member.kind == MemberKind::Property,
        }
    }
}
