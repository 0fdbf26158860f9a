use treelox::ast_printer::Ast;
use treelox::error::Diagnostics;
use treelox::parser::Parser;
use treelox::scanner::Scanner;
use treelox::stmt::Stmt;

fn parse_expr(source: &str) -> String {
    let mut diagnostics = Diagnostics::new();
    let mut ids = 0;
    let tokens = Scanner::new(source).scan_tokens(&mut diagnostics);
    let expr = Parser::new(tokens, &mut ids, &mut diagnostics)
        .parse_expression()
        .expect("expression should parse");

    assert!(
        !diagnostics.had_error(),
        "unexpected errors: {:?}",
        diagnostics.errors()
    );

    Ast.print(&expr)
}

fn parse_program(source: &str) -> (Vec<Stmt>, Diagnostics) {
    let mut diagnostics = Diagnostics::new();
    let mut ids = 0;
    let tokens = Scanner::new(source).scan_tokens(&mut diagnostics);
    let statements = Parser::new(tokens, &mut ids, &mut diagnostics).parse();

    (statements, diagnostics)
}

#[test]
fn multiplication_binds_tighter_than_addition() {
    assert_eq!(parse_expr("1 + 2 * 3"), "(+ 1.0 (* 2.0 3.0))");
    assert_eq!(parse_expr("1 * 2 + 3"), "(+ (* 1.0 2.0) 3.0)");
}

#[test]
fn comparison_binds_tighter_than_equality() {
    assert_eq!(parse_expr("1 < 2 == true"), "(== (< 1.0 2.0) true)");
}

#[test]
fn unary_is_right_associative() {
    assert_eq!(parse_expr("!!false"), "(! (! false))");
    assert_eq!(parse_expr("--1"), "(- (- 1.0))");
}

#[test]
fn grouping_overrides_precedence() {
    assert_eq!(parse_expr("(1 + 2) * 3"), "(* (group (+ 1.0 2.0)) 3.0)");
}

#[test]
fn assignment_is_right_associative() {
    assert_eq!(parse_expr("a = b = 1"), "(= a (= b 1.0))");
}

#[test]
fn logical_operators_nest_by_precedence() {
    // `or` is looser than `and`.
    assert_eq!(parse_expr("a or b and c"), "(or a (and b c))");
}

#[test]
fn calls_and_gets_chain_left_associatively() {
    assert_eq!(parse_expr("a.b(c).d"), "(. (call (. a b) c) d)");
    assert_eq!(parse_expr("f(1)(2)"), "(call (call f 1.0) 2.0)");
}

#[test]
fn property_assignment_becomes_set() {
    assert_eq!(parse_expr("a.b = 1"), "(= (. a b) 1.0)");
}

#[test]
fn invalid_assignment_target_is_reported_but_not_fatal() {
    let (statements, diagnostics) = parse_program("1 + 2 = 3; print 4;");

    assert!(diagnostics.had_error());
    assert!(diagnostics.errors()[0]
        .to_string()
        .contains("Invalid assignment target."));

    // The print statement after the bad one still parsed.
    assert_eq!(statements.len(), 2);
}

#[test]
fn synchronization_bounds_error_cascades() {
    // Two independently malformed statements: both reported, one error
    // each, and the valid statement in between survives.
    let (statements, diagnostics) = parse_program("var 1 = 2;\nprint 3;\nvar = 4;");

    assert_eq!(diagnostics.errors().len(), 2);
    assert_eq!(statements.len(), 1);
    assert!(matches!(statements[0], Stmt::Print(_)));
}

#[test]
fn class_declaration_with_superclass_and_methods() {
    let (statements, diagnostics) = parse_program(
        "class Cruller < Doughnut { cook() { return 1; } finish(topping) {} }",
    );

    assert!(!diagnostics.had_error());
    assert_eq!(statements.len(), 1);

    match &statements[0] {
        Stmt::Class {
            name,
            superclass,
            methods,
        } => {
            assert_eq!(name.lexeme, "Cruller");
            assert!(superclass.is_some());
            assert_eq!(methods.len(), 2);
            assert_eq!(methods[0].name.lexeme, "cook");
            assert_eq!(methods[1].params.len(), 1);
        }

        other => panic!("expected class statement, got {:?}", other),
    }
}

#[test]
fn argument_cap_is_reported_without_aborting() {
    let args = (0..256).map(|_| "1").collect::<Vec<_>>().join(", ");
    let source = format!("f({});", args);

    let (statements, diagnostics) = parse_program(&source);

    assert!(diagnostics.had_error());
    assert!(diagnostics
        .errors()
        .iter()
        .any(|e| e.to_string().contains("Can't have more than 255 arguments.")));

    // The call still parsed as a statement.
    assert_eq!(statements.len(), 1);
}

#[test]
fn trailing_tokens_after_a_lone_expression_are_an_error() {
    let mut diagnostics = Diagnostics::new();
    let mut ids = 0;
    let tokens = Scanner::new("1 2").scan_tokens(&mut diagnostics);
    let expr = Parser::new(tokens, &mut ids, &mut diagnostics).parse_expression();

    assert!(expr.is_none());
    assert!(diagnostics.errors()[0]
        .to_string()
        .contains("Expect end of expression."));
}

#[test]
fn super_requires_a_method_name() {
    let (_, diagnostics) = parse_program("print super;");

    assert!(diagnostics.had_error());
    assert!(diagnostics.errors()[0]
        .to_string()
        .contains("Expect '.' after 'super'."));
}

#[test]
fn missing_semicolon_is_anchored_at_the_offending_token() {
    let (_, diagnostics) = parse_program("print 1\nprint 2;");

    assert!(diagnostics.had_error());

    let rendered = diagnostics.errors()[0].to_string();
    assert!(rendered.contains("[line 2]"));
    assert!(rendered.contains("Expect ';' after value."));
}
