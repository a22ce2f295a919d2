//! Error reporting tests: every diagnostic the compiler can produce,
//! with its kind and rough location.

use sylc_compiler::{compile_to_ir, CompileError, SemanticErrorKind};

fn expect_semantic(src: &str, kind: SemanticErrorKind) -> (usize, usize) {
    match compile_to_ir(src) {
        Err(CompileError::Semantic {
            kind: got,
            line,
            col,
            ..
        }) => {
            assert_eq!(got, kind, "wrong semantic error kind for:\n{src}");
            (line, col)
        }
        Err(other) => panic!("expected semantic error, got {other} for:\n{src}"),
        Ok(_) => panic!("expected {kind:?}, but compilation succeeded for:\n{src}"),
    }
}

// ── Lexical and syntax ──────────────────────────────────────────────────

#[test]
fn unexpected_character_is_a_lexical_error() {
    let err = compile_to_ir("int main() { return 1 @ 2; }").unwrap_err();
    assert!(matches!(err, CompileError::Lexical { .. }), "got {err}");
}

#[test]
fn missing_semicolon_is_a_parse_error() {
    let err = compile_to_ir("int main() { return 1 }").unwrap_err();
    assert!(matches!(err, CompileError::Parse { .. }), "got {err}");
    assert!(
        err.to_string().contains("expected ';'"),
        "message should name the expected token, got: {err}"
    );
}

#[test]
fn const_without_initializer_is_a_parse_error() {
    let err = compile_to_ir("int main() { const int x; return 0; }").unwrap_err();
    assert!(matches!(err, CompileError::Parse { .. }), "got {err}");
}

#[test]
fn error_positions_are_one_based() {
    // The bad token sits on line 2.
    let (line, _) = expect_semantic(
        "int main() {\n  return y;\n}",
        SemanticErrorKind::UndefinedVariable,
    );
    assert_eq!(line, 2);
}

// ── Name resolution ─────────────────────────────────────────────────────

#[test]
fn undefined_variable() {
    expect_semantic("int main() { return y; }", SemanticErrorKind::UndefinedVariable);
}

#[test]
fn undefined_function() {
    expect_semantic("int main() { return f(); }", SemanticErrorKind::UndefinedFunction);
}

#[test]
fn functions_are_not_visible_before_their_definition() {
    expect_semantic(
        "int main() { return f(); } int f() { return 1; }",
        SemanticErrorKind::UndefinedFunction,
    );
}

#[test]
fn recursion_into_the_function_being_defined_is_fine() {
    let src = "int fib(int n) { if (n < 2) { return n; } return fib(n - 1) + fib(n - 2); }
               int main() { return fib(10); }";
    assert!(compile_to_ir(src).is_ok());
}

#[test]
fn redefinition_in_the_same_scope() {
    expect_semantic(
        "int main() { int x = 1; int x = 2; return 0; }",
        SemanticErrorKind::Redefinition,
    );
}

#[test]
fn redefinition_of_a_function_name() {
    expect_semantic(
        "int f() { return 1; } int f() { return 2; } int main() { return 0; }",
        SemanticErrorKind::Redefinition,
    );
}

#[test]
fn duplicate_parameter_names() {
    expect_semantic(
        "int f(int a, int a) { return a; } int main() { return 0; }",
        SemanticErrorKind::Redefinition,
    );
}

#[test]
fn shadowing_across_scopes_is_not_a_redefinition() {
    let src = "int x = 1; int main() { int x = 2; { int x = 3; } return x; }";
    assert!(compile_to_ir(src).is_ok());
}

// ── Kind mismatches ─────────────────────────────────────────────────────

#[test]
fn indexing_a_scalar() {
    expect_semantic(
        "int main() { int x = 0; return x[0]; }",
        SemanticErrorKind::NotAnArray,
    );
}

#[test]
fn too_many_subscripts_on_an_array() {
    expect_semantic(
        "int main() { int a[2]; return a[0][1]; }",
        SemanticErrorKind::NotAnArray,
    );
}

#[test]
fn calling_a_variable() {
    expect_semantic(
        "int main() { int x = 0; return x(); }",
        SemanticErrorKind::NotAFunction,
    );
}

#[test]
fn using_a_function_as_a_value() {
    expect_semantic(
        "int f() { return 1; } int main() { return f + 1; }",
        SemanticErrorKind::NotAVariable,
    );
}

#[test]
fn assigning_to_a_constant() {
    expect_semantic(
        "int main() { const int c = 1; c = 2; return 0; }",
        SemanticErrorKind::NotAVariable,
    );
}

#[test]
fn assigning_to_a_whole_array() {
    expect_semantic(
        "int main() { int a[2]; a = 0; return 0; }",
        SemanticErrorKind::NotAVariable,
    );
}

// ── Calls ───────────────────────────────────────────────────────────────

#[test]
fn wrong_argument_count() {
    expect_semantic(
        "int f(int a) { return a; } int main() { return f(1, 2); }",
        SemanticErrorKind::ArgumentCountMismatch,
    );
}

#[test]
fn intrinsic_argument_counts_are_checked() {
    expect_semantic(
        "int main() { putint(); return 0; }",
        SemanticErrorKind::ArgumentCountMismatch,
    );
}

#[test]
fn void_call_used_as_a_value() {
    expect_semantic(
        "void f() { putint(1); } int main() { return f(); }",
        SemanticErrorKind::VoidValueUsed,
    );
}

// ── Control flow ────────────────────────────────────────────────────────

#[test]
fn break_outside_a_loop() {
    expect_semantic(
        "int main() { break; return 0; }",
        SemanticErrorKind::BreakOutsideLoop,
    );
}

#[test]
fn continue_outside_a_loop() {
    expect_semantic(
        "int main() { continue; return 0; }",
        SemanticErrorKind::ContinueOutsideLoop,
    );
}

#[test]
fn value_return_in_a_void_function() {
    expect_semantic(
        "void f() { return 1; } int main() { return 0; }",
        SemanticErrorKind::ReturnTypeMismatch,
    );
}

#[test]
fn bare_return_in_an_int_function() {
    expect_semantic(
        "int main() { return; }",
        SemanticErrorKind::ReturnTypeMismatch,
    );
}

// ── Constants and initializers ──────────────────────────────────────────

#[test]
fn const_initializer_must_fold() {
    expect_semantic(
        "int main() { const int x = getint(); return x; }",
        SemanticErrorKind::NonConstantExpression,
    );
}

#[test]
fn global_initializer_must_fold() {
    expect_semantic(
        "int g = getint(); int main() { return g; }",
        SemanticErrorKind::NonConstantExpression,
    );
}

#[test]
fn array_dimension_must_fold() {
    expect_semantic(
        "int main() { int n = 3; int a[n]; return 0; }",
        SemanticErrorKind::NonConstantExpression,
    );
}

#[test]
fn array_dimension_must_be_positive() {
    expect_semantic(
        "int main() { int a[0]; return 0; }",
        SemanticErrorKind::InvalidArrayDimension,
    );
}

#[test]
fn constant_division_by_zero() {
    expect_semantic(
        "int main() { return 1 / 0; }",
        SemanticErrorKind::DivisionByZero,
    );
}

#[test]
fn constant_modulo_by_zero() {
    expect_semantic(
        "int main() { const int x = 5 % 0; return x; }",
        SemanticErrorKind::DivisionByZero,
    );
}

#[test]
fn brace_initializer_on_a_scalar() {
    expect_semantic(
        "int main() { int x = {1}; return 0; }",
        SemanticErrorKind::InvalidInitializer,
    );
}

#[test]
fn expression_initializer_on_an_array() {
    expect_semantic(
        "int main() { int a[2] = 1; return 0; }",
        SemanticErrorKind::InvalidInitializer,
    );
}

#[test]
fn too_many_initializer_values() {
    expect_semantic(
        "int main() { int a[2] = {1, 2, 3}; return 0; }",
        SemanticErrorKind::InvalidInitializer,
    );
}

#[test]
fn error_display_format() {
    let err = compile_to_ir("int main() { break; return 0; }").unwrap_err();
    let text = err.to_string();
    assert!(
        text.starts_with("SemanticError:BreakOutsideLoop"),
        "got: {text}"
    );
    assert!(text.contains("(1:14)"), "got: {text}");
}
