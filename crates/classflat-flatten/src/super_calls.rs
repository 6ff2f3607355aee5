//! Super-call resolver and rewriter.
//!
//! Inside a flattened class there is no `super`. Every `super.name` in an
//! emitted member is bound to the nearest ancestor definition of `name` as
//! seen from the class that wrote the reference. That ancestor body is then
//! copied into the class under a synthesized private name, and the
//! reference becomes `this.<synthesized name>`. Copied bodies are rewritten
//! the same way, with their own owner as the starting point, so chains of
//! `super` calls unroll into chains of synthesized members.
//!
//! Constructors chain the same way: every constructor in the ancestry except
//! the last becomes `__<Owner>_constructor`, and each `super(...)` call is
//! pointed at the previous link.

use crate::linearize::Linearization;
use crate::members::{IdentityKind, MemberIdentity, MemberSlot, Visibility};
use crate::registry::ClassRegistry;
use crate::text::{MemberText, TextEdit, apply_edits, extend_to_whole_line};
use classflat_common::diagnostics::diagnostic_codes;
use classflat_common::limits::MAX_SYNTHETIC_NAME_SUFFIX;
use classflat_common::{Diagnostic, DiagnosticKind, Span};
use classflat_parser::{ClassMember, MemberKind, ModifierFlags, SourceFile};
use classflat_scanner::{SyntaxKind, Token};
use indexmap::IndexMap;
use rustc_hash::FxHashSet;
use serde::Serialize;
use tracing::{debug, trace};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SynthesizedKind {
    /// Copy of an ancestor method.
    Method,
    /// Copy of an ancestor getter, emitted as a plain method.
    Getter,
    /// A non-final link of the constructor chain.
    Constructor,
}

/// A member that does not exist in any source class: an ancestor body the
/// flattened class reaches through `super`.
#[derive(Clone, Debug)]
pub struct SynthesizedMember {
    pub name: String,
    /// Class whose member was copied.
    pub owner: String,
    pub kind: SynthesizedKind,
    pub is_static: bool,
    /// Index of the copied member in the owner's declaration.
    pub member_index: usize,
    pub text: MemberText,
}

/// Where `super.name` lands.
enum SuperTarget {
    Method { owner: String, index: usize, is_static: bool },
    Getter { owner: String, index: usize, is_static: bool },
    Field,
    Missing,
}

/// How `super(...)` calls are rewritten while scanning a constructor body.
#[derive(Clone, Copy)]
enum ConstructorMode<'n> {
    NotConstructor,
    /// Point `super` at the previous link of the chain.
    Chained(&'n str),
    /// First constructor of the chain: there is nothing to call.
    Base,
}

/// Everything the rewriter produced besides the rewritten members.
#[derive(Debug, Default)]
pub struct RewriteOutput {
    /// Copies of ancestor methods and getters, in discovery order.
    pub synthesized: Vec<SynthesizedMember>,
    /// Non-final constructor links, base first.
    pub constructor_links: Vec<SynthesizedMember>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Rewrites `super` references for one target class.
pub struct SuperRewriter<'a> {
    source_file: &'a SourceFile,
    registry: &'a ClassRegistry,
    linearization: &'a Linearization,
    taken_names: FxHashSet<String>,
    synthesized: IndexMap<(String, MemberIdentity), SynthesizedMember>,
    constructor_links: Vec<SynthesizedMember>,
    diagnostics: Vec<Diagnostic>,
    reported: FxHashSet<(u32, u32)>,
}

impl<'a> SuperRewriter<'a> {
    pub fn new(
        source_file: &'a SourceFile,
        registry: &'a ClassRegistry,
        linearization: &'a Linearization,
    ) -> Self {
        let mut taken_names: FxHashSet<String> = linearization
            .members
            .iter()
            .map(|(identity, _)| identity.name.clone())
            .collect();
        taken_names.insert("constructor".to_string());
        SuperRewriter {
            source_file,
            registry,
            linearization,
            taken_names,
            synthesized: IndexMap::new(),
            constructor_links: Vec::new(),
            diagnostics: Vec::new(),
            reported: FxHashSet::default(),
        }
    }

    /// Text of a member that keeps its own name in the flattened class.
    pub fn rewrite_member(&mut self, owner: &str, index: usize) -> Option<MemberText> {
        let member = self.member(owner, index)?;
        let is_static = member.is_static();
        let mut edits = Vec::new();
        for span in scan_regions(member) {
            self.collect_edits(owner, is_static, span, ConstructorMode::NotConstructor, &mut edits);
        }
        Some(apply_edits(self.source_file, member.span, &mut edits))
    }

    /// Rewrite the constructor chain and return the final constructor.
    ///
    /// Non-final links are collected as synthesized members.
    pub fn rewrite_constructor_chain(&mut self) -> Option<MemberText> {
        let linearization = self.linearization;
        let chain = &linearization.constructors;
        let (last, links) = chain.split_last()?;
        let mut previous: Option<String> = None;

        for entry in links {
            let MemberSlot::Member(index) = entry.slot else {
                continue;
            };
            let Some(member) = self.member(&entry.owner, index) else {
                continue;
            };
            let name = self.reserve_name(&format!("__{}_constructor", entry.owner));
            let mode = match previous.as_deref() {
                Some(link) => ConstructorMode::Chained(link),
                None => ConstructorMode::Base,
            };
            let region = Span::new(name_end(member), member.span.end);
            let mut edits = Vec::new();
            self.collect_edits(&entry.owner, false, region, mode, &mut edits);
            let text = apply_edits(self.source_file, region, &mut edits).with_prefix(&name);
            trace!(link = name.as_str(), owner = entry.owner.as_str(), "constructor link");
            self.constructor_links.push(SynthesizedMember {
                name: name.clone(),
                owner: entry.owner.clone(),
                kind: SynthesizedKind::Constructor,
                is_static: false,
                member_index: index,
                text,
            });
            previous = Some(name);
        }

        let MemberSlot::Member(index) = last.slot else {
            return None;
        };
        let member = self.member(&last.owner, index)?;
        let mode = match previous.as_deref() {
            Some(link) => ConstructorMode::Chained(link),
            None => ConstructorMode::Base,
        };
        let mut edits = Vec::new();
        let region = Span::new(name_end(member), member.span.end);
        self.collect_edits(&last.owner, false, region, mode, &mut edits);
        Some(apply_edits(self.source_file, member.span, &mut edits))
    }

    pub fn finish(self) -> RewriteOutput {
        debug!(
            class = self.linearization.target.as_str(),
            synthesized = self.synthesized.len(),
            constructor_links = self.constructor_links.len(),
            diagnostics = self.diagnostics.len(),
            "super references rewritten"
        );
        RewriteOutput {
            synthesized: self.synthesized.into_values().collect(),
            constructor_links: self.constructor_links,
            diagnostics: self.diagnostics,
        }
    }

    fn member(&self, owner: &str, index: usize) -> Option<&'a ClassMember> {
        let registry: &'a ClassRegistry = self.registry;
        registry.get(owner)?.member(index)
    }

    // =========================================================================
    // Token scan
    // =========================================================================

    /// Collect edits for every `super` reference in `region`, as written in
    /// class `context`.
    fn collect_edits(
        &mut self,
        context: &str,
        is_static: bool,
        region: Span,
        mode: ConstructorMode<'_>,
        edits: &mut Vec<TextEdit>,
    ) {
        let source_file = self.source_file;
        let tokens = &source_file.tokens;
        let first = tokens.partition_point(|t| t.pos < region.start);
        let end = tokens.partition_point(|t| t.end <= region.end);

        let mut i = first;
        while i < end {
            let token = tokens[i];
            match token.kind {
                SyntaxKind::ClassKeyword if starts_nested_class(tokens, i) => {
                    // A nested class has its own `super`.
                    i = skip_nested_class(tokens, i, end);
                    continue;
                }
                // `obj.super` is a property name, not a super reference.
                SyntaxKind::SuperKeyword if !follows_member_access(tokens, i) => {
                    let next = tokens.get(i + 1).map_or(SyntaxKind::EndOfFileToken, |t| t.kind);
                    match next {
                        SyntaxKind::DotToken => {
                            self.rewrite_property(context, is_static, tokens, i, edits);
                        }
                        SyntaxKind::QuestionDotToken | SyntaxKind::OpenBracketToken => {
                            self.report(
                                DiagnosticKind::UnresolvedSuperCall,
                                diagnostic_codes::COMPUTED_SUPER_ACCESS_CANNOT_BE_RESOLVED,
                                token.span(),
                                &[context],
                            );
                        }
                        SyntaxKind::OpenParenToken => {
                            if let Some(resume) = self.rewrite_super_call(tokens, i, end, mode, edits) {
                                i = resume;
                                continue;
                            }
                        }
                        _ => {}
                    }
                }
                _ => {}
            }
            i += 1;
        }
    }

    fn rewrite_property(
        &mut self,
        context: &str,
        is_static: bool,
        tokens: &[Token],
        at: usize,
        edits: &mut Vec<TextEdit>,
    ) {
        let Some(name_token) = tokens.get(at + 2).copied() else {
            return;
        };
        if !name_token.kind.is_identifier_or_keyword() {
            return;
        }
        let name = name_token.text(&self.source_file.text).to_string();
        let site = Span::new(tokens[at].pos, name_token.end);

        let after = tokens.get(at + 3).map(|t| (t.kind, t.has_preceding_line_break()));
        let before = at.checked_sub(1).map(|i| tokens[i].kind);
        let assigned = match after {
            Some((kind, _)) if kind.is_assignment_operator() => true,
            Some((SyntaxKind::PlusPlusToken | SyntaxKind::MinusMinusToken, false)) => true,
            _ => matches!(
                before,
                Some(SyntaxKind::PlusPlusToken | SyntaxKind::MinusMinusToken)
            ),
        };
        if assigned {
            self.report(
                DiagnosticKind::UnresolvedSuperCall,
                diagnostic_codes::ASSIGNMENT_THROUGH_SUPER_CANNOT_BE_FLATTENED,
                site,
                &[context, name.as_str()],
            );
            return;
        }

        match self.find_target(context, is_static, &name) {
            SuperTarget::Method { owner, index, is_static } => {
                let synth = self.synthesize(&owner, index, is_static, &name, SynthesizedKind::Method);
                edits.push(TextEdit::replace(site, format!("this.{synth}")));
            }
            SuperTarget::Getter { owner, index, is_static } => {
                let synth = self.synthesize(&owner, index, is_static, &name, SynthesizedKind::Getter);
                edits.push(TextEdit::replace(site, format!("this.{synth}()")));
            }
            SuperTarget::Field => self.report(
                DiagnosticKind::UnresolvedSuperCall,
                diagnostic_codes::SUPER_REFERS_TO_FIELD,
                site,
                &[context, name.as_str()],
            ),
            SuperTarget::Missing => self.report(
                DiagnosticKind::UnresolvedSuperCall,
                diagnostic_codes::SUPER_MEMBER_HAS_NO_ANCESTOR_IMPLEMENTATION,
                site,
                &[context, name.as_str()],
            ),
        }
    }

    /// Rewrite `super(...)` at `at`. Returns the token index to resume from
    /// when the arguments were consumed.
    fn rewrite_super_call(
        &mut self,
        tokens: &[Token],
        at: usize,
        end: usize,
        mode: ConstructorMode<'_>,
        edits: &mut Vec<TextEdit>,
    ) -> Option<usize> {
        let keyword = tokens[at];
        match mode {
            ConstructorMode::NotConstructor => None,
            ConstructorMode::Chained(link) => {
                let close = matching_paren(tokens, at + 1, end);
                match close {
                    Some(close) if !is_statement(tokens, at, close) => {
                        // `super(...)` evaluates to `this`.
                        edits.push(TextEdit::replace(keyword.span(), format!("(this.{link}")));
                        edits.push(TextEdit::replace(tokens[close].span(), "), this)"));
                    }
                    _ => edits.push(TextEdit::replace(keyword.span(), format!("this.{link}"))),
                }
                None
            }
            ConstructorMode::Base => {
                let close = matching_paren(tokens, at + 1, end)?;
                let open = tokens[at + 1];
                let close_token = tokens[close];
                let args = &tokens[at + 2..close];
                let after = tokens.get(close + 1).copied();

                if is_statement(tokens, at, close) {
                    if args.iter().all(|t| is_side_effect_free(t.kind)) {
                        let end_pos = match after {
                            Some(t) if t.kind == SyntaxKind::SemicolonToken => t.end,
                            _ => close_token.end,
                        };
                        let span = extend_to_whole_line(
                            &self.source_file.text,
                            Span::new(keyword.pos, end_pos),
                        );
                        edits.push(TextEdit::delete(span));
                        let resume = match after {
                            Some(t) if t.kind == SyntaxKind::SemicolonToken => close + 2,
                            _ => close + 1,
                        };
                        return Some(resume);
                    }
                    edits.push(TextEdit::replace(Span::new(keyword.pos, open.end), "void ["));
                    edits.push(TextEdit::replace(close_token.span(), "]"));
                } else if args.is_empty() {
                    edits.push(TextEdit::replace(
                        Span::new(keyword.pos, close_token.end),
                        "this",
                    ));
                    return Some(close + 1);
                } else {
                    edits.push(TextEdit::replace(Span::new(keyword.pos, open.end), "(void ["));
                    edits.push(TextEdit::replace(close_token.span(), "], this)"));
                }
                None
            }
        }
    }

    // =========================================================================
    // Resolution
    // =========================================================================

    /// Nearest definition of `name` strictly above `context` in the chain.
    fn find_target(&self, context: &str, is_static: bool, name: &str) -> SuperTarget {
        let linearization = self.linearization;
        let nearest = |kind: IdentityKind| {
            let identity = MemberIdentity::new(is_static, kind, Visibility::Public, name);
            linearization
                .history
                .get(&identity)?
                .iter()
                .rev()
                .filter(|entry| linearization.is_strict_ancestor(&entry.owner, context))
                .find_map(|entry| {
                    // Setter-only accessors cannot be read through `super`.
                    let index = match entry.slot {
                        MemberSlot::Member(index) => index,
                        MemberSlot::Accessor { getter, .. } => getter?,
                    };
                    Some((linearization.chain_index(&entry.owner)?, entry.owner.clone(), index))
                })
        };

        let method = nearest(IdentityKind::Method);
        let getter = nearest(IdentityKind::Accessor);
        match (method, getter) {
            (Some((m, owner, index)), Some((g, _, _))) if m >= g => SuperTarget::Method { owner, index, is_static },
            (Some((_, owner, index)), None) => SuperTarget::Method { owner, index, is_static },
            (_, Some((_, owner, index))) => SuperTarget::Getter { owner, index, is_static },
            (None, None) => {
                let field = MemberIdentity::new(is_static, IdentityKind::Field, Visibility::Public, name);
                let has_field = linearization.history.get(&field).is_some_and(|entries| {
                    entries
                        .iter()
                        .any(|entry| linearization.is_strict_ancestor(&entry.owner, context))
                });
                if has_field {
                    SuperTarget::Field
                } else {
                    SuperTarget::Missing
                }
            }
        }
    }

    /// Synthesize (once) the copy of `owner`'s member and return its name.
    fn synthesize(
        &mut self,
        owner: &str,
        index: usize,
        is_static: bool,
        name: &str,
        kind: SynthesizedKind,
    ) -> String {
        let identity_kind = match kind {
            SynthesizedKind::Getter => IdentityKind::Accessor,
            _ => IdentityKind::Method,
        };
        let key = (
            owner.to_string(),
            MemberIdentity::new(is_static, identity_kind, Visibility::Public, name),
        );
        if let Some(existing) = self.synthesized.get(&key) {
            return existing.name.clone();
        }
        let Some(member) = self.member(owner, index) else {
            return name.to_string();
        };

        let base = match kind {
            SynthesizedKind::Getter => format!("__{owner}_get_{}", sanitize(name)),
            _ => format!("__{owner}_{}", sanitize(name)),
        };
        let synth_name = self.reserve_name(&base);
        // Reserve before recursing so mutual references terminate.
        self.synthesized.insert(
            key.clone(),
            SynthesizedMember {
                name: synth_name.clone(),
                owner: owner.to_string(),
                kind,
                is_static,
                member_index: index,
                text: MemberText::default(),
            },
        );

        let mut prefix = String::new();
        if is_static {
            prefix.push_str("static ");
        }
        if member.modifiers.contains(ModifierFlags::ASYNC) {
            prefix.push_str("async ");
        }
        if member.modifiers.contains(ModifierFlags::GENERATOR) {
            prefix.push('*');
        }
        prefix.push_str(&synth_name);

        let region = Span::new(name_end(member), member.span.end);
        let mut edits = Vec::new();
        self.collect_edits(owner, is_static, region, ConstructorMode::NotConstructor, &mut edits);
        let text = apply_edits(self.source_file, region, &mut edits).with_prefix(&prefix);
        trace!(
            name = synth_name.as_str(),
            owner,
            member = name,
            "synthesized super implementation"
        );
        if let Some(entry) = self.synthesized.get_mut(&key) {
            entry.text = text;
        }
        synth_name
    }

    /// First free name among `base`, `base$1`, `base$2`, ...
    fn reserve_name(&mut self, base: &str) -> String {
        let mut candidate = base.to_string();
        let mut suffix = 1;
        while self.taken_names.contains(&candidate) && suffix <= MAX_SYNTHETIC_NAME_SUFFIX {
            candidate = format!("{base}${suffix}");
            suffix += 1;
        }
        self.taken_names.insert(candidate.clone());
        candidate
    }

    fn report(&mut self, kind: DiagnosticKind, code: u32, span: Span, args: &[&str]) {
        if !self.reported.insert((span.start, code)) {
            return;
        }
        let class = args.first().copied().unwrap_or_default();
        self.diagnostics.push(
            Diagnostic::from_code(
                kind,
                code,
                self.source_file.file_name.as_str(),
                span.start,
                span.len(),
                args,
            )
            .with_classes([class]),
        );
    }
}

/// Spans of a member that may contain `super` references.
fn scan_regions(member: &ClassMember) -> Vec<Span> {
    match member.kind {
        MemberKind::Property => member.initializer.into_iter().collect(),
        MemberKind::StaticBlock => member.body.into_iter().collect(),
        _ => vec![Span::new(name_end(member), member.span.end)],
    }
}

/// End of the member's name, or its start when it has none.
fn name_end(member: &ClassMember) -> u32 {
    member.name.as_ref().map_or(member.span.start, |name| name.span.end)
}

/// Identifier-safe form of a member name.
fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_alphanumeric() || c == '_' || c == '$' { c } else { '_' })
        .collect()
}

fn is_side_effect_free(kind: SyntaxKind) -> bool {
    kind.is_identifier()
        || matches!(
            kind,
            SyntaxKind::NumericLiteral
                | SyntaxKind::BigIntLiteral
                | SyntaxKind::StringLiteral
                | SyntaxKind::NoSubstitutionTemplateLiteral
                | SyntaxKind::ThisKeyword
                | SyntaxKind::NullKeyword
                | SyntaxKind::TrueKeyword
                | SyntaxKind::FalseKeyword
                | SyntaxKind::CommaToken
                | SyntaxKind::DotToken
                | SyntaxKind::DotDotDotToken
        )
}

/// Whether the call spanning `at..=close` stands alone as a statement.
fn is_statement(tokens: &[Token], at: usize, close: usize) -> bool {
    let before = at.checked_sub(1).map(|i| tokens[i].kind);
    let starts = tokens[at].has_preceding_line_break()
        || matches!(
            before,
            Some(SyntaxKind::OpenBraceToken | SyntaxKind::SemicolonToken | SyntaxKind::CloseBraceToken)
        );
    let ends = tokens.get(close + 1).is_none_or(|t| {
        matches!(t.kind, SyntaxKind::SemicolonToken | SyntaxKind::CloseBraceToken)
            || t.has_preceding_line_break()
    });
    starts && ends
}

fn follows_member_access(tokens: &[Token], at: usize) -> bool {
    at.checked_sub(1).is_some_and(|i| {
        matches!(tokens[i].kind, SyntaxKind::DotToken | SyntaxKind::QuestionDotToken)
    })
}

/// `class` that begins a class declaration or expression, as opposed to a
/// property named `class`.
fn starts_nested_class(tokens: &[Token], at: usize) -> bool {
    let after = tokens.get(at + 1).map(|t| t.kind);
    !follows_member_access(tokens, at)
        && !matches!(
            after,
            Some(
                SyntaxKind::ColonToken
                    | SyntaxKind::OpenParenToken
                    | SyntaxKind::CommaToken
                    | SyntaxKind::EqualsToken
                    | SyntaxKind::CloseBraceToken
            )
        )
}

/// Index just past the body of the class starting at `at`.
fn skip_nested_class(tokens: &[Token], at: usize, end: usize) -> usize {
    let mut depth = 0usize;
    let mut i = at + 1;
    // The heritage clause may contain parentheses or brackets.
    while i < end {
        match tokens[i].kind {
            SyntaxKind::OpenParenToken | SyntaxKind::OpenBracketToken => depth += 1,
            SyntaxKind::CloseParenToken | SyntaxKind::CloseBracketToken => {
                depth = depth.saturating_sub(1);
            }
            SyntaxKind::OpenBraceToken if depth == 0 => break,
            _ => {}
        }
        i += 1;
    }
    let mut braces = 0usize;
    while i < end {
        match tokens[i].kind {
            SyntaxKind::OpenBraceToken | SyntaxKind::TemplateHead => braces += 1,
            SyntaxKind::CloseBraceToken | SyntaxKind::TemplateTail => {
                braces = braces.saturating_sub(1);
                if braces == 0 {
                    return i + 1;
                }
            }
            _ => {}
        }
        i += 1;
    }
    end
}

/// Index of the `)` matching the `(` at `open`.
fn matching_paren(tokens: &[Token], open: usize, end: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (offset, token) in tokens[open..end].iter().enumerate() {
        match token.kind {
            SyntaxKind::OpenParenToken => depth += 1,
            SyntaxKind::CloseParenToken => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(open + offset);
                }
            }
            _ => {}
        }
    }
    None
}
