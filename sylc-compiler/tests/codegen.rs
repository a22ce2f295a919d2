//! Source-to-assembly tests: frame discipline, calling convention and
//! instruction selection.

use sylc_compiler::compile_to_riscv;

fn asm(src: &str) -> String {
    compile_to_riscv(src).expect("compilation failed")
}

// ── Structure ───────────────────────────────────────────────────────────

#[test]
fn minimal_program_shape() {
    let text = asm("int main() { return 0; }");
    assert!(text.contains("  .text\n"), "got:\n{text}");
    assert!(text.contains("  .globl main\n"), "got:\n{text}");
    assert!(text.contains("main:\n"), "got:\n{text}");
    assert!(text.contains("  li a0, 0\n"), "got:\n{text}");
    assert!(text.trim_end().ends_with("ret"), "got:\n{text}");
}

#[test]
fn leaf_function_does_not_save_ra() {
    let text = asm("int main() { return 0; }");
    assert!(!text.contains("sw ra,"), "got:\n{text}");
}

#[test]
fn calling_function_saves_and_restores_ra() {
    let text = asm("int main() { putint(1); return 0; }");
    assert!(text.contains("sw ra,"), "got:\n{text}");
    assert!(text.contains("lw ra,"), "got:\n{text}");
    assert!(text.contains("  call putint\n"), "got:\n{text}");
}

#[test]
fn frame_is_released_before_every_ret() {
    let text = asm(
        "int main() {
           int a = getint();
           if (a) { return 1; }
           return 2;
         }",
    );
    let adjusts = text.matches("addi sp, sp,").count();
    // One allocation plus one release per ret (two rets here).
    assert_eq!(adjusts, 3, "got:\n{text}");
}

#[test]
fn block_labels_are_prefixed_per_function() {
    let text = asm(
        "int f() { while (0) {} return 1; }
         int main() { while (0) {} return f(); }",
    );
    assert!(text.contains("f_while_entry_0:"), "got:\n{text}");
    assert!(text.contains("main_while_entry_0:"), "got:\n{text}");
    assert!(text.contains("j main_while_entry_0"), "got:\n{text}");
}

// ── Instruction selection ───────────────────────────────────────────────

#[test]
fn relational_operators_expand_to_slt_sequences() {
    let lt = asm("int main() { int a = getint(); return a < 3; }");
    assert!(lt.contains("slt t0, t0, t1"), "got:\n{lt}");

    let le = asm("int main() { int a = getint(); return a <= 3; }");
    assert!(le.contains("sgt t0, t0, t1"), "got:\n{le}");
    assert!(le.contains("seqz t0, t0"), "got:\n{le}");

    let eq = asm("int main() { int a = getint(); return a == 3; }");
    assert!(eq.contains("xor t0, t0, t1"), "got:\n{eq}");
    assert!(eq.contains("seqz t0, t0"), "got:\n{eq}");

    let ne = asm("int main() { int a = getint(); return a != 3; }");
    assert!(ne.contains("snez t0, t0"), "got:\n{ne}");
}

#[test]
fn division_and_modulo_lower_to_div_and_rem() {
    let text = asm("int main() { int a = getint(); return a / 3 + a % 3; }");
    assert!(text.contains("div t0, t0, t1"), "got:\n{text}");
    assert!(text.contains("rem t0, t0, t1"), "got:\n{text}");
}

#[test]
fn every_temporary_is_spilled_to_the_frame() {
    // Spill-everything: each value-producing instruction ends in a
    // store back to the frame.
    let text = asm("int main() { int a = getint(); return a + a * a; }");
    let spills = text
        .lines()
        .filter(|l| l.trim().starts_with("sw t0,") || l.trim().starts_with("sw a0,"))
        .count();
    assert!(spills >= 4, "expected one spill per value, got:\n{text}");
}

#[test]
fn branch_lowering_uses_bnez_plus_jump() {
    let text = asm(
        "int main() {
           int a = getint();
           if (a) { return 1; }
           return 0;
         }",
    );
    assert!(text.contains("bnez t0, main_then_0"), "got:\n{text}");
    assert!(text.contains("j main_endif_1"), "got:\n{text}");
}

// ── Calling convention ──────────────────────────────────────────────────

#[test]
fn first_eight_arguments_go_in_registers() {
    let text = asm(
        "int f(int a, int b) { return a + b; }
         int main() { return f(1, 2); }",
    );
    assert!(text.contains("li a0, 1"), "got:\n{text}");
    assert!(text.contains("li a1, 2"), "got:\n{text}");
    // Inside f, the parameters come back out of a0/a1.
    assert!(text.contains("mv t0, a0"), "got:\n{text}");
    assert!(text.contains("mv t0, a1"), "got:\n{text}");
}

#[test]
fn ninth_argument_goes_on_the_stack() {
    let text = asm(
        "int f(int a, int b, int c, int d, int e, int g, int h, int i, int j) { return j; }
         int main() { return f(1, 2, 3, 4, 5, 6, 7, 8, 9); }",
    );
    assert!(text.contains("li a7, 8"), "got:\n{text}");
    assert!(
        text.contains("sw t0, 0(sp)"),
        "ninth argument must be stored at the bottom of the caller frame, got:\n{text}"
    );
    assert!(text.contains("call f"), "got:\n{text}");
}

#[test]
fn call_result_is_read_from_a0() {
    let text = asm("int main() { return getint(); }");
    assert!(text.contains("sw a0,"), "result spilled, got:\n{text}");
    assert!(text.contains("lw a0,"), "result reloaded for ret, got:\n{text}");
}

// ── Globals ─────────────────────────────────────────────────────────────

#[test]
fn globals_are_emitted_in_the_data_section() {
    let text = asm("int g = 5; int z[4]; int main() { return g; }");
    assert!(text.contains("  .data\n"), "got:\n{text}");
    assert!(text.contains("g:\n  .word 5"), "got:\n{text}");
    assert!(text.contains("z:\n  .zero 16"), "got:\n{text}");
    assert!(text.contains("la t1, g"), "global access goes through la, got:\n{text}");
}

#[test]
fn global_array_initializer_words_in_order() {
    let text = asm("int arr[3] = {7, 8, 9}; int main() { return 0; }");
    assert!(
        text.contains("arr:\n  .word 7\n  .word 8\n  .word 9"),
        "got:\n{text}"
    );
}

#[test]
fn large_frame_offsets_go_through_a_scratch_register() {
    // 1000 words of locals push later slots past the 12-bit
    // immediate range.
    let text = asm(
        "int main() {
           int a[1000];
           int b[1000];
           b[999] = 1;
           return b[999];
         }",
    );
    assert!(
        text.contains("li t2,"),
        "expected scratch-register addressing for big offsets, got:\n{text}"
    );
}
