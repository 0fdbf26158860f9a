use treelox::error::Diagnostics;
use treelox::interpreter::Interpreter;
use treelox::parser::Parser;
use treelox::resolver::Resolver;
use treelox::scanner::Scanner;
use treelox::stmt::Stmt;

/// Scan + parse + resolve, returning the interpreter (with its populated
/// resolution table), the statements, and the collected diagnostics.
fn resolve(source: &str) -> (Interpreter, Vec<Stmt>, Diagnostics) {
    let mut diagnostics = Diagnostics::new();
    let mut interpreter = Interpreter::new();

    let tokens = Scanner::new(source).scan_tokens(&mut diagnostics);
    let statements = Parser::new(tokens, interpreter.expr_ids(), &mut diagnostics).parse();

    assert!(
        !diagnostics.had_error(),
        "source should be syntactically valid: {:?}",
        diagnostics.errors()
    );

    Resolver::new(&mut interpreter, &mut diagnostics).resolve(&statements);

    (interpreter, statements, diagnostics)
}

fn resolve_errors(source: &str) -> Vec<String> {
    let (_, _, diagnostics) = resolve(source);

    diagnostics.errors().iter().map(|e| e.to_string()).collect()
}

#[test]
fn globals_get_no_table_entry() {
    let (interpreter, _, diagnostics) = resolve("var a = 1; print a;");

    assert!(!diagnostics.had_error());
    assert!(interpreter.locals().is_empty());
}

#[test]
fn locals_are_recorded_with_scope_distances() {
    let (interpreter, _, diagnostics) = resolve(
        "{ var a = 1; { print a; } print a; }",
    );

    assert!(!diagnostics.had_error());

    // Two local reads: one through a nested block (distance 1), one in the
    // declaring block (distance 0).
    let mut distances: Vec<usize> = interpreter.locals().values().copied().collect();
    distances.sort_unstable();
    assert_eq!(distances, vec![0, 1]);
}

#[test]
fn resolution_is_deterministic_and_stable() {
    let source = "{ var a = 1; fun f(x) { { print a + x; } } f(2); }";

    let (first, statements, mut diagnostics) = resolve(source);

    // Resolving the identical AST again must reproduce the same table:
    // entries never change once recorded.
    let mut second = Interpreter::new();
    Resolver::new(&mut second, &mut diagnostics).resolve(&statements);

    assert!(!diagnostics.had_error());
    assert_eq!(first.locals(), second.locals());
}

#[test]
fn later_submissions_do_not_disturb_earlier_table_entries() {
    // Two parses drawing from one session counter: the second submission's
    // locals must land under fresh ids, not overwrite the first's.
    let mut diagnostics = Diagnostics::new();
    let mut interpreter = Interpreter::new();

    for source in ["{ var a = 1; print a; }", "{ var b = 2; print b; }"] {
        let tokens = Scanner::new(source).scan_tokens(&mut diagnostics);
        let statements = Parser::new(tokens, interpreter.expr_ids(), &mut diagnostics).parse();

        Resolver::new(&mut interpreter, &mut diagnostics).resolve(&statements);
    }

    assert!(!diagnostics.had_error());
    assert_eq!(interpreter.locals().len(), 2);
}

#[test]
fn reading_a_local_in_its_own_initializer_is_an_error() {
    let errors = resolve_errors("var a = 1; { var a = a; }");

    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("Can't read local variable in its own initializer."));
}

#[test]
fn duplicate_declaration_in_same_block_is_an_error() {
    let errors = resolve_errors("{ var a = 1; var a = 2; }");

    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("Already a variable with this name in this scope."));
}

#[test]
fn shadowing_in_a_nested_block_is_fine() {
    let errors = resolve_errors("{ var a = 1; { var a = 2; print a; } }");

    assert!(errors.is_empty());
}

#[test]
fn return_outside_a_function_is_an_error() {
    let errors = resolve_errors("return 1;");

    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("Can't return from top-level code."));
}

#[test]
fn returning_a_value_from_an_initializer_is_an_error() {
    let errors = resolve_errors("class C { init() { return 1; } }");

    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("Can't return a value from an initializer."));
}

#[test]
fn bare_return_in_an_initializer_is_allowed() {
    let errors = resolve_errors("class C { init() { return; } }");

    assert!(errors.is_empty());
}

#[test]
fn this_outside_a_class_is_an_error() {
    let errors = resolve_errors("print this;");

    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("Can't use 'this' outside of a class."));
}

#[test]
fn this_in_a_standalone_function_is_an_error() {
    let errors = resolve_errors("fun f() { return this; }");

    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("Can't use 'this' outside of a class."));
}

#[test]
fn super_outside_a_class_is_an_error() {
    let errors = resolve_errors("fun f() { super.m(); }");

    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("Can't use 'super' outside of a class."));
}

#[test]
fn super_without_a_superclass_is_an_error() {
    let errors = resolve_errors("class C { m() { super.m(); } }");

    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("Can't use 'super' in a class with no superclass."));
}

#[test]
fn a_class_cannot_inherit_from_itself() {
    let errors = resolve_errors("class C < C {}");

    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("A class can't inherit from itself."));
}

#[test]
fn resolution_continues_past_errors() {
    // Three independent misuses in one pass.
    let errors = resolve_errors("return 1;\nprint this;\n{ var a = 1; var a = 2; }");

    assert_eq!(errors.len(), 3);
}
