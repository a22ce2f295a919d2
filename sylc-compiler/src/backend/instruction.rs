//! Typed RV32 assembly output.
//!
//! Codegen builds a list of [`AsmItem`]s and stringifies it once at the
//! end. Keeping instructions as data rather than formatting on the fly
//! makes the lowering testable without string matching on whitespace.

use super::abi::Reg;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RvInstr {
    Li(Reg, i32),
    La(Reg, String),
    Mv(Reg, Reg),
    /// `lw rd, offset(base)`
    Lw(Reg, i32, Reg),
    /// `sw rs, offset(base)`
    Sw(Reg, i32, Reg),
    Add(Reg, Reg, Reg),
    Addi(Reg, Reg, i32),
    Sub(Reg, Reg, Reg),
    Mul(Reg, Reg, Reg),
    Div(Reg, Reg, Reg),
    Rem(Reg, Reg, Reg),
    And(Reg, Reg, Reg),
    Or(Reg, Reg, Reg),
    Xor(Reg, Reg, Reg),
    Slt(Reg, Reg, Reg),
    Sgt(Reg, Reg, Reg),
    Seqz(Reg, Reg),
    Snez(Reg, Reg),
    Bnez(Reg, String),
    J(String),
    Call(String),
    Ret,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AsmItem {
    Directive(String),
    Label(String),
    Instr(RvInstr),
    Blank,
}

impl fmt::Display for RvInstr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RvInstr::Li(rd, imm) => write!(f, "li {rd}, {imm}"),
            RvInstr::La(rd, sym) => write!(f, "la {rd}, {sym}"),
            RvInstr::Mv(rd, rs) => write!(f, "mv {rd}, {rs}"),
            RvInstr::Lw(rd, off, base) => write!(f, "lw {rd}, {off}({base})"),
            RvInstr::Sw(rs, off, base) => write!(f, "sw {rs}, {off}({base})"),
            RvInstr::Add(rd, rs1, rs2) => write!(f, "add {rd}, {rs1}, {rs2}"),
            RvInstr::Addi(rd, rs, imm) => write!(f, "addi {rd}, {rs}, {imm}"),
            RvInstr::Sub(rd, rs1, rs2) => write!(f, "sub {rd}, {rs1}, {rs2}"),
            RvInstr::Mul(rd, rs1, rs2) => write!(f, "mul {rd}, {rs1}, {rs2}"),
            RvInstr::Div(rd, rs1, rs2) => write!(f, "div {rd}, {rs1}, {rs2}"),
            RvInstr::Rem(rd, rs1, rs2) => write!(f, "rem {rd}, {rs1}, {rs2}"),
            RvInstr::And(rd, rs1, rs2) => write!(f, "and {rd}, {rs1}, {rs2}"),
            RvInstr::Or(rd, rs1, rs2) => write!(f, "or {rd}, {rs1}, {rs2}"),
            RvInstr::Xor(rd, rs1, rs2) => write!(f, "xor {rd}, {rs1}, {rs2}"),
            RvInstr::Slt(rd, rs1, rs2) => write!(f, "slt {rd}, {rs1}, {rs2}"),
            RvInstr::Sgt(rd, rs1, rs2) => write!(f, "sgt {rd}, {rs1}, {rs2}"),
            RvInstr::Seqz(rd, rs) => write!(f, "seqz {rd}, {rs}"),
            RvInstr::Snez(rd, rs) => write!(f, "snez {rd}, {rs}"),
            RvInstr::Bnez(rs, label) => write!(f, "bnez {rs}, {label}"),
            RvInstr::J(label) => write!(f, "j {label}"),
            RvInstr::Call(name) => write!(f, "call {name}"),
            RvInstr::Ret => write!(f, "ret"),
        }
    }
}

impl fmt::Display for AsmItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AsmItem::Directive(d) => write!(f, "  {d}"),
            AsmItem::Label(name) => write!(f, "{name}:"),
            AsmItem::Instr(instr) => write!(f, "  {instr}"),
            AsmItem::Blank => Ok(()),
        }
    }
}

/// Render a list of items as the final assembly text.
pub fn render(items: &[AsmItem]) -> String {
    let mut out = String::new();
    for item in items {
        out.push_str(&item.to_string());
        out.push('\n');
    }
    out
}
