use crate::{SyntaxKind, tokenize};

fn kinds(source: &str) -> Vec<SyntaxKind> {
    tokenize(source).tokens.iter().map(|t| t.kind).collect()
}

#[test]
fn scans_class_header() {
    assert_eq!(
        kinds("export default class Dog extends Animal {}"),
        vec![
            SyntaxKind::ExportKeyword,
            SyntaxKind::DefaultKeyword,
            SyntaxKind::ClassKeyword,
            SyntaxKind::Identifier,
            SyntaxKind::ExtendsKeyword,
            SyntaxKind::Identifier,
            SyntaxKind::OpenBraceToken,
            SyntaxKind::CloseBraceToken,
            SyntaxKind::EndOfFileToken,
        ]
    );
}

#[test]
fn private_names_and_contextual_keywords() {
    let result = tokenize("static #count = 0; get value() {}");
    let tokens = &result.tokens;
    assert_eq!(tokens[0].kind, SyntaxKind::StaticKeyword);
    assert_eq!(tokens[1].kind, SyntaxKind::PrivateIdentifier);
    assert_eq!(tokens[1].text("static #count = 0; get value() {}"), "#count");
    assert_eq!(tokens[5].kind, SyntaxKind::GetKeyword);
    assert!(tokens[5].kind.is_identifier());
    assert!(SyntaxKind::SuperKeyword.is_identifier_or_keyword());
    assert!(!SyntaxKind::SuperKeyword.is_identifier());
}

#[test]
fn braces_inside_strings_and_comments_are_not_tokens() {
    let source = "a = '{'; // }\n/* { */ b = \"}\";";
    let braces = kinds(source)
        .into_iter()
        .filter(|k| matches!(k, SyntaxKind::OpenBraceToken | SyntaxKind::CloseBraceToken))
        .count();
    assert_eq!(braces, 0);
    assert_eq!(tokenize(source).comments.len(), 2);
}

#[test]
fn template_substitutions_nest() {
    let source = "`a${ {x: `b${1}`}.x }c`";
    let ks = kinds(source);
    assert_eq!(ks[0], SyntaxKind::TemplateHead);
    assert!(ks.contains(&SyntaxKind::TemplateMiddle) || ks.contains(&SyntaxKind::TemplateTail));
    assert_eq!(ks[ks.len() - 2], SyntaxKind::TemplateTail);
    assert!(tokenize(source).diagnostics.is_empty());
}

#[test]
fn slash_after_operand_is_division_otherwise_regex() {
    let div = kinds("x = a / b / c");
    assert_eq!(div.iter().filter(|k| **k == SyntaxKind::SlashToken).count(), 2);

    let re = kinds("x = /{[}]/g.test(s)");
    assert_eq!(re[2], SyntaxKind::RegularExpressionLiteral);
    assert!(!re.contains(&SyntaxKind::OpenBraceToken));

    let after_return = kinds("return /ab+c/i");
    assert_eq!(after_return[1], SyntaxKind::RegularExpressionLiteral);
}

#[test]
fn slash_after_control_statement_head_is_regex() {
    let source = "if (x) /a}/.test(x); while (f(y)) /b/.exec(y); z = (a) / 2";
    let result = tokenize(source);
    assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);
    let kinds: Vec<_> = result.tokens.iter().map(|t| t.kind).collect();
    assert_eq!(kinds[4], SyntaxKind::RegularExpressionLiteral);
    assert_eq!(
        kinds
            .iter()
            .filter(|k| **k == SyntaxKind::RegularExpressionLiteral)
            .count(),
        2
    );
    assert_eq!(kinds.iter().filter(|k| **k == SyntaxKind::SlashToken).count(), 1);
    assert!(!kinds.contains(&SyntaxKind::CloseBraceToken));
}

#[test]
fn compound_operators_use_longest_match() {
    assert_eq!(
        kinds("a >>>= b ?? c?.d === e")[..9],
        [
            SyntaxKind::Identifier,
            SyntaxKind::GreaterThanGreaterThanGreaterThanEqualsToken,
            SyntaxKind::Identifier,
            SyntaxKind::QuestionQuestionToken,
            SyntaxKind::Identifier,
            SyntaxKind::QuestionDotToken,
            SyntaxKind::Identifier,
            SyntaxKind::EqualsEqualsEqualsToken,
            SyntaxKind::Identifier,
        ]
    );
    assert!(SyntaxKind::PlusEqualsToken.is_assignment_operator());
    assert!(!SyntaxKind::EqualsEqualsToken.is_assignment_operator());
}

#[test]
fn line_breaks_are_flagged_on_the_next_token() {
    let result = tokenize("x = 1\ny = 2");
    let y = result.tokens[3];
    assert_eq!(y.kind, SyntaxKind::Identifier);
    assert!(y.has_preceding_line_break());
    assert!(!result.tokens[1].has_preceding_line_break());
}

#[test]
fn unterminated_literals_report_diagnostics() {
    assert_eq!(tokenize("'abc").diagnostics.len(), 1);
    assert_eq!(tokenize("`abc${x}").diagnostics.len(), 1);
    assert_eq!(tokenize("/* never closed").diagnostics.len(), 1);
    assert_eq!(tokenize("x = 'a\nb'").diagnostics.len(), 2);
}

#[test]
fn numbers_and_shebang() {
    let ks = kinds("#!/usr/bin/env node\nx = 0x1F + 1_000.5e-3 + 10n + .5");
    assert_eq!(ks[0], SyntaxKind::Identifier);
    assert_eq!(
        ks.iter().filter(|k| **k == SyntaxKind::NumericLiteral).count(),
        3
    );
    assert!(ks.contains(&SyntaxKind::BigIntLiteral));
}
