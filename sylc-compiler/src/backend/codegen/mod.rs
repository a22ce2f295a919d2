//! Assembly emission driver: sections, prologues, epilogues and
//! globals. Per-instruction lowering lives in `lowering`.

mod lowering;

use super::abi::{fits_imm12, Reg};
use super::frame::FrameLayout;
use super::instruction::{render, AsmItem, RvInstr};
use crate::ir::{Function, Global, Program};

/// Lower a whole program to RV32 assembly text.
pub fn compile_ir_to_riscv(program: &Program) -> String {
    let mut cg = Codegen::default();
    cg.gen_program(program);
    render(&cg.items)
}

#[derive(Default)]
pub(super) struct Codegen {
    items: Vec<AsmItem>,
}

impl Codegen {
    pub(super) fn push(&mut self, instr: RvInstr) {
        self.items.push(AsmItem::Instr(instr));
    }

    fn gen_program(&mut self, program: &Program) {
        self.items.push(AsmItem::Directive(".text".to_string()));
        for func in &program.functions {
            self.items.push(AsmItem::Blank);
            self.items
                .push(AsmItem::Directive(format!(".globl {}", func.name)));
            self.gen_function(func);
        }

        if !program.globals.is_empty() {
            self.items.push(AsmItem::Blank);
            self.items.push(AsmItem::Directive(".data".to_string()));
            for global in &program.globals {
                self.gen_global(global);
            }
        }
    }

    fn gen_function(&mut self, func: &Function) {
        let frame = FrameLayout::build(func);

        self.items.push(AsmItem::Label(func.name.clone()));
        self.adjust_sp(-frame.size);
        if frame.save_ra {
            self.store_word(Reg::Ra, Reg::Sp, frame.ra_offset());
        }

        for block in &func.blocks {
            // Block labels are function-scoped in the IR; prefixing
            // keeps them unique in the flat assembly namespace.
            self.items
                .push(AsmItem::Label(local_label(func, &block.label)));
            for instr in &block.instrs {
                self.lower_instr(&frame, instr);
            }
            self.lower_term(&frame, func, &block.term);
        }
    }

    fn gen_global(&mut self, global: &Global) {
        self.items
            .push(AsmItem::Directive(format!(".globl {}", global.name)));
        self.items.push(AsmItem::Label(global.name.clone()));
        if global.init.iter().all(|&v| v == 0) {
            self.items
                .push(AsmItem::Directive(format!(".zero {}", global.words * 4)));
        } else {
            for value in &global.init {
                self.items
                    .push(AsmItem::Directive(format!(".word {value}")));
            }
        }
    }

    pub(super) fn epilogue(&mut self, frame: &FrameLayout) {
        if frame.save_ra {
            self.load_word(Reg::Ra, Reg::Sp, frame.ra_offset());
        }
        self.adjust_sp(frame.size);
        self.push(RvInstr::Ret);
    }

    fn adjust_sp(&mut self, delta: i32) {
        if delta == 0 {
            return;
        }
        if fits_imm12(delta) {
            self.push(RvInstr::Addi(Reg::Sp, Reg::Sp, delta));
        } else {
            self.push(RvInstr::Li(Reg::T0, delta));
            self.push(RvInstr::Add(Reg::Sp, Reg::Sp, Reg::T0));
        }
    }

    /// `lw rd, offset(base)`, detouring through `t2` when the offset
    /// does not fit the 12-bit immediate.
    pub(super) fn load_word(&mut self, rd: Reg, base: Reg, offset: i32) {
        if fits_imm12(offset) {
            self.push(RvInstr::Lw(rd, offset, base));
        } else {
            self.push(RvInstr::Li(Reg::T2, offset));
            self.push(RvInstr::Add(Reg::T2, base, Reg::T2));
            self.push(RvInstr::Lw(rd, 0, Reg::T2));
        }
    }

    /// `sw rs, offset(base)`; `rs` must not be `t2`.
    pub(super) fn store_word(&mut self, rs: Reg, base: Reg, offset: i32) {
        if fits_imm12(offset) {
            self.push(RvInstr::Sw(rs, offset, base));
        } else {
            self.push(RvInstr::Li(Reg::T2, offset));
            self.push(RvInstr::Add(Reg::T2, base, Reg::T2));
            self.push(RvInstr::Sw(rs, 0, Reg::T2));
        }
    }
}

pub(super) fn local_label(func: &Function, label: &str) -> String {
    format!("{}_{}", func.name, label)
}
