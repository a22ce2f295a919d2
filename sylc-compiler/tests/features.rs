//! End-to-end source-to-IR tests for the language features.

use std::collections::HashSet;
use sylc_compiler::compile_to_ir;
use sylc_compiler::ir::Program;

fn ir_text(src: &str) -> String {
    compile_to_ir(src).expect("compilation failed").to_text()
}

fn program(src: &str) -> Program {
    compile_to_ir(src).expect("compilation failed")
}

// ── Constant folding ────────────────────────────────────────────────────

#[test]
fn fully_constant_return_folds_to_an_immediate() {
    let text = ir_text("int main() { return (1 + 2) * 3; }");
    assert!(text.contains("ret 9"), "expected folded return, got:\n{text}");
    let program = program("int main() { return (1 + 2) * 3; }");
    assert_eq!(
        program.functions[0].blocks.len(),
        1,
        "straight-line code should stay a single block"
    );
    assert!(
        program.functions[0].blocks[0].instrs.is_empty(),
        "a folded expression should emit no instructions"
    );
}

#[test]
fn constant_condition_still_linearizes_the_branch() {
    let text = ir_text("int main() { if (1 < 2) { return 1; } return 0; }");
    assert!(
        text.contains("br 1, %then_0, %endif_1"),
        "folded condition should appear as an immediate branch, got:\n{text}"
    );
}

#[test]
fn named_constants_fold_through_expressions() {
    let text = ir_text("const int N = 6; int main() { return N * 7; }");
    assert!(text.contains("ret 42"), "got:\n{text}");
    assert!(
        !text.contains("@N"),
        "a const scalar should not get storage, got:\n{text}"
    );
}

#[test]
fn const_array_with_constant_index_folds() {
    let text = ir_text("const int a[3] = {1, 2, 3}; int main() { return a[1]; }");
    assert!(text.contains("ret 2"), "got:\n{text}");
}

// ── Logical operators ───────────────────────────────────────────────────

#[test]
fn logical_and_evaluates_both_sides() {
    // No short-circuiting: the call must survive a constant-false
    // left operand.
    let text = ir_text(
        "int f() { putint(1); return 1; }
         int main() { int x = 0 && f(); return x; }",
    );
    assert!(
        text.contains("call @f()"),
        "right operand of && must still be evaluated, got:\n{text}"
    );
}

#[test]
fn logical_operands_are_normalized_to_booleans() {
    let text = ir_text("int main() { int a = getint(); return a && 2; }");
    assert!(
        text.contains("= ne"),
        "&& operands should be compared against zero, got:\n{text}"
    );
    assert!(text.contains("= and"), "got:\n{text}");
}

// ── Control flow ────────────────────────────────────────────────────────

#[test]
fn if_else_produces_branch_and_join() {
    let text = ir_text(
        "int main() {
           int a = getint();
           if (a) { return 1; } else { return 2; }
         }",
    );
    assert!(text.contains("br %1, %then_0, %else_1"), "got:\n{text}");
    assert!(text.contains("ret 1"), "got:\n{text}");
    assert!(text.contains("ret 2"), "got:\n{text}");
}

#[test]
fn while_loop_gets_one_label_set() {
    let text = ir_text(
        "int main() {
           int i = 0;
           while (i < 10) { i = i + 1; }
           return i;
         }",
    );
    assert!(text.contains("%while_entry_0:"), "got:\n{text}");
    assert!(text.contains("%while_body_1:"), "got:\n{text}");
    assert!(text.contains("%while_end_2:"), "got:\n{text}");
    assert!(
        text.contains("jump %while_entry_0"),
        "loop body must jump back to the condition, got:\n{text}"
    );
}

#[test]
fn break_and_continue_target_the_innermost_loop() {
    let text = ir_text(
        "int main() {
           int a = getint();
           while (a) {
             while (a) { break; }
             continue;
           }
           return 0;
         }",
    );
    assert!(
        text.contains("jump %while_end_5"),
        "break must exit the inner loop, got:\n{text}"
    );
    assert!(
        text.contains("jump %while_entry_0"),
        "continue must re-test the outer condition, got:\n{text}"
    );
}

#[test]
fn every_block_has_a_unique_label() {
    let program = program(
        "int main() {
           int i = 0;
           while (i < 3) {
             if (i == 1) { i = i + 2; } else { i = i + 1; }
           }
           return i;
         }",
    );
    let func = &program.functions[0];
    let labels: HashSet<&str> = func.blocks.iter().map(|b| b.label.as_str()).collect();
    assert_eq!(labels.len(), func.blocks.len(), "duplicate block label");
}

#[test]
fn code_after_return_lands_in_an_unreachable_block() {
    let program = program("int main() { return 1; putint(2); return 0; }");
    let func = &program.functions[0];
    assert!(
        func.blocks.iter().any(|b| b.label.starts_with("unreachable")),
        "trailing statements should be parked in a dead block"
    );
    assert_eq!(func.blocks[0].label, "entry");
}

// ── Returns ─────────────────────────────────────────────────────────────

#[test]
fn void_function_gets_a_synthesized_return() {
    let text = ir_text("void f() { putint(1); } int main() { f(); return 0; }");
    assert!(text.contains("fun @f() {"), "got:\n{text}");
    assert!(
        text.contains("\n  ret\n"),
        "falling off the end of f must synthesize a bare ret, got:\n{text}"
    );
}

#[test]
fn int_function_falling_off_the_end_returns_zero() {
    let text = ir_text("int main() { putint(1); }");
    assert!(text.contains("ret 0"), "got:\n{text}");
}

// ── Scoping ─────────────────────────────────────────────────────────────

#[test]
fn inner_declaration_shadows_and_unshadows() {
    let text = ir_text(
        "int main() {
           int x = 1;
           { int x = 2; }
           return x;
         }",
    );
    assert!(text.contains("@x_0 = alloc i32"), "got:\n{text}");
    assert!(text.contains("@x_1 = alloc i32"), "got:\n{text}");
    assert!(
        text.contains("%0 = load @x_0"),
        "final read must see the outer x, got:\n{text}"
    );
}

#[test]
fn local_may_shadow_a_parameter() {
    let text = ir_text("int f(int x) { int x = 2; return x; } int main() { return f(1); }");
    assert!(text.contains("@x_0"), "parameter slot, got:\n{text}");
    assert!(text.contains("@x_1"), "shadowing local slot, got:\n{text}");
}

// ── Globals and arrays ──────────────────────────────────────────────────

#[test]
fn globals_fold_their_initializers() {
    let text = ir_text("const int N = 10; int g = N + 1; int main() { return g; }");
    assert!(text.contains("global @g = alloc i32, 11"), "got:\n{text}");
}

#[test]
fn global_array_initializer_flattens_row_major_with_zero_fill() {
    let text = ir_text("int arr[2][2] = {{1, 2}, {3}}; int main() { return 0; }");
    assert!(
        text.contains("global @arr = alloc [i32, 4], {1, 2, 3, 0}"),
        "got:\n{text}"
    );
}

#[test]
fn uninitialized_global_array_is_zeroinit() {
    let text = ir_text("int buf[8]; int main() { return 0; }");
    assert!(
        text.contains("global @buf = alloc [i32, 8], zeroinit"),
        "got:\n{text}"
    );
}

#[test]
fn local_array_initializer_stores_elements_and_gaps() {
    let text = ir_text(
        "int main() {
           int a[2][3] = {{1, 2}, 5};
           return a[1][0];
         }",
    );
    assert!(text.contains("@a_0 = alloc [i32, 6]"), "got:\n{text}");
    assert!(
        text.contains("store 5,"),
        "row-major slot 3 must receive 5, got:\n{text}"
    );
    assert!(
        text.contains("store 0,"),
        "gaps must be stored as zero, got:\n{text}"
    );
}

#[test]
fn multi_dim_index_scales_by_suffix_product() {
    let text = ir_text(
        "int main() {
           int a[2][3] = {};
           return a[1][0];
         }",
    );
    // Row stride of a [2][3] array is 3 words = 12 bytes; with both
    // indices constant the offset folds to a single immediate.
    assert!(text.contains("getptr @a_0, 12"), "got:\n{text}");
}

#[test]
fn whole_array_argument_decays_to_a_pointer() {
    let text = ir_text(
        "int first(int a[]) { return a[0]; }
         int main() {
           int b[4];
           b[0] = 7;
           return first(b);
         }",
    );
    assert!(
        text.contains("getptr @b_0, 0"),
        "passing b should take its address, got:\n{text}"
    );
    assert!(text.contains("call @first("), "got:\n{text}");
}

#[test]
fn array_parameter_indexes_through_the_loaded_pointer() {
    let text = ir_text(
        "int get(int a[][3], int i, int j) { return a[i][j]; }
         int main() { return 0; }",
    );
    assert!(
        text.contains("fun @get(@p0: i32, @p1: i32, @p2: i32): i32"),
        "got:\n{text}"
    );
    assert!(
        text.contains("getptr %"),
        "indexing a parameter must go through the pointer value, got:\n{text}"
    );
}

#[test]
fn array_parameter_strides_scale_by_trailing_dims() {
    let text = ir_text(
        "int get(int a[][3], int i) { return a[i][2]; }
         int main() { return 0; }",
    );
    // For `int a[][3]` the first subscript steps 3 words (12 bytes)
    // and the second steps 1 word; the constant second index folds.
    assert!(text.contains("mul %1, 12"), "got:\n{text}");
    assert!(text.contains("add %2, 8"), "got:\n{text}");
}

// ── Intrinsics ──────────────────────────────────────────────────────────

#[test]
fn intrinsics_are_declared_and_callable_without_definition() {
    let text = ir_text("int main() { putint(getint()); return 0; }");
    assert!(text.starts_with("decl @getint(): i32\n"), "got:\n{text}");
    assert!(text.contains("decl @putarray(i32, *i32)"), "got:\n{text}");
    assert!(text.contains("call @getint()"), "got:\n{text}");
    assert!(text.contains("call @putint("), "got:\n{text}");
}

// ── Lexical details ─────────────────────────────────────────────────────

#[test]
fn hex_and_octal_literals() {
    let text = ir_text("int main() { return 0x10 + 010; }");
    assert!(text.contains("ret 24"), "16 + 8, got:\n{text}");
}

#[test]
fn comments_are_skipped() {
    let text = ir_text(
        "// line comment
         int main() { /* block
                         comment */ return 1; }",
    );
    assert!(text.contains("ret 1"), "got:\n{text}");
}
