//! Per-instruction lowering.
//!
//! Operands are fetched from their spill slots into `t0`/`t1`, the
//! operation runs, and the result goes straight back to the
//! destination's slot. Comparison operators have no single RV32
//! instruction and expand to the usual `slt`/`sgt`/`xor` plus
//! `seqz`/`snez` sequences.

use super::super::abi::{fits_imm12, Reg, ARG_REGS};
use super::super::frame::FrameLayout;
use super::super::instruction::RvInstr;
use super::{local_label, Codegen};
use crate::ir::{Addr, BinOp, Function, Instr, Operand, Terminator};

impl Codegen {
    pub(super) fn lower_instr(&mut self, frame: &FrameLayout, instr: &Instr) {
        match instr {
            Instr::Binary { dst, op, lhs, rhs } => {
                self.load_operand(frame, lhs, Reg::T0);
                self.load_operand(frame, rhs, Reg::T1);
                self.lower_binop(*op);
                self.store_word(Reg::T0, Reg::Sp, frame.temp_offset(*dst));
            }

            // Allocations are pure frame-layout facts.
            Instr::Alloc { .. } => {}

            Instr::Load { dst, addr } => {
                match addr {
                    Addr::Slot(name) => {
                        self.load_word(Reg::T0, Reg::Sp, frame.slot_offset(name));
                    }
                    _ => {
                        self.load_addr(frame, addr, Reg::T1);
                        self.push(RvInstr::Lw(Reg::T0, 0, Reg::T1));
                    }
                }
                self.store_word(Reg::T0, Reg::Sp, frame.temp_offset(*dst));
            }

            Instr::Store { addr, src } => {
                self.load_operand(frame, src, Reg::T0);
                match addr {
                    Addr::Slot(name) => {
                        self.store_word(Reg::T0, Reg::Sp, frame.slot_offset(name));
                    }
                    _ => {
                        self.load_addr(frame, addr, Reg::T1);
                        self.push(RvInstr::Sw(Reg::T0, 0, Reg::T1));
                    }
                }
            }

            Instr::GetPtr { dst, base, offset } => {
                self.load_addr(frame, base, Reg::T0);
                self.load_operand(frame, offset, Reg::T1);
                self.push(RvInstr::Add(Reg::T0, Reg::T0, Reg::T1));
                self.store_word(Reg::T0, Reg::Sp, frame.temp_offset(*dst));
            }

            Instr::Call { dst, func, args } => {
                for (i, arg) in args.iter().enumerate() {
                    if i < 8 {
                        self.load_operand(frame, arg, ARG_REGS[i]);
                    } else {
                        self.load_operand(frame, arg, Reg::T0);
                        self.store_word(Reg::T0, Reg::Sp, ((i - 8) * 4) as i32);
                    }
                }
                self.push(RvInstr::Call(func.clone()));
                if let Some(dst) = dst {
                    self.store_word(Reg::A0, Reg::Sp, frame.temp_offset(*dst));
                }
            }
        }
    }

    pub(super) fn lower_term(
        &mut self,
        frame: &FrameLayout,
        func: &Function,
        term: &Terminator,
    ) {
        match term {
            Terminator::Branch {
                cond,
                then_label,
                else_label,
            } => {
                self.load_operand(frame, cond, Reg::T0);
                self.push(RvInstr::Bnez(Reg::T0, local_label(func, then_label)));
                self.push(RvInstr::J(local_label(func, else_label)));
            }
            Terminator::Jump(label) => {
                self.push(RvInstr::J(local_label(func, label)));
            }
            Terminator::Ret(value) => {
                if let Some(value) = value {
                    self.load_operand(frame, value, Reg::A0);
                }
                self.epilogue(frame);
            }
        }
    }

    /// Computes `t0 <- t0 op t1`.
    fn lower_binop(&mut self, op: BinOp) {
        match op {
            BinOp::Add => self.push(RvInstr::Add(Reg::T0, Reg::T0, Reg::T1)),
            BinOp::Sub => self.push(RvInstr::Sub(Reg::T0, Reg::T0, Reg::T1)),
            BinOp::Mul => self.push(RvInstr::Mul(Reg::T0, Reg::T0, Reg::T1)),
            BinOp::Div => self.push(RvInstr::Div(Reg::T0, Reg::T0, Reg::T1)),
            BinOp::Mod => self.push(RvInstr::Rem(Reg::T0, Reg::T0, Reg::T1)),
            BinOp::And => self.push(RvInstr::And(Reg::T0, Reg::T0, Reg::T1)),
            BinOp::Or => self.push(RvInstr::Or(Reg::T0, Reg::T0, Reg::T1)),
            BinOp::Lt => self.push(RvInstr::Slt(Reg::T0, Reg::T0, Reg::T1)),
            BinOp::Gt => self.push(RvInstr::Sgt(Reg::T0, Reg::T0, Reg::T1)),
            BinOp::Le => {
                self.push(RvInstr::Sgt(Reg::T0, Reg::T0, Reg::T1));
                self.push(RvInstr::Seqz(Reg::T0, Reg::T0));
            }
            BinOp::Ge => {
                self.push(RvInstr::Slt(Reg::T0, Reg::T0, Reg::T1));
                self.push(RvInstr::Seqz(Reg::T0, Reg::T0));
            }
            BinOp::Eq => {
                self.push(RvInstr::Xor(Reg::T0, Reg::T0, Reg::T1));
                self.push(RvInstr::Seqz(Reg::T0, Reg::T0));
            }
            BinOp::Ne => {
                self.push(RvInstr::Xor(Reg::T0, Reg::T0, Reg::T1));
                self.push(RvInstr::Snez(Reg::T0, Reg::T0));
            }
        }
    }

    fn load_operand(&mut self, frame: &FrameLayout, op: &Operand, rd: Reg) {
        match op {
            Operand::Imm(n) => self.push(RvInstr::Li(rd, *n)),
            Operand::Temp(t) => self.load_word(rd, Reg::Sp, frame.temp_offset(*t)),
            Operand::Arg(i) => {
                let i = *i as usize;
                if i < 8 {
                    self.push(RvInstr::Mv(rd, ARG_REGS[i]));
                } else {
                    self.load_word(rd, Reg::Sp, frame.incoming_arg_offset(i));
                }
            }
        }
    }

    /// Materialize the address behind `addr` into `rd`.
    fn load_addr(&mut self, frame: &FrameLayout, addr: &Addr, rd: Reg) {
        match addr {
            Addr::Slot(name) => {
                let offset = frame.slot_offset(name);
                if fits_imm12(offset) {
                    self.push(RvInstr::Addi(rd, Reg::Sp, offset));
                } else {
                    self.push(RvInstr::Li(rd, offset));
                    self.push(RvInstr::Add(rd, Reg::Sp, rd));
                }
            }
            Addr::Global(name) => self.push(RvInstr::La(rd, name.clone())),
            Addr::Ptr(t) => self.load_word(rd, Reg::Sp, frame.temp_offset(*t)),
        }
    }
}
