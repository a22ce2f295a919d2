//! The slice of the RV32 calling convention the generated code uses.

use std::fmt;

/// Registers the backend touches. Expression operands move through
/// `t0`/`t1`, `t2` is the address scratch for frame offsets that do not
/// fit an immediate, and `a0`-`a7` carry arguments and return values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reg {
    Zero,
    Ra,
    Sp,
    T0,
    T1,
    T2,
    A0,
    A1,
    A2,
    A3,
    A4,
    A5,
    A6,
    A7,
}

/// Argument registers in ABI order; arguments past the eighth go on
/// the caller's stack.
pub const ARG_REGS: [Reg; 8] = [
    Reg::A0,
    Reg::A1,
    Reg::A2,
    Reg::A3,
    Reg::A4,
    Reg::A5,
    Reg::A6,
    Reg::A7,
];

/// Bounds of the 12-bit signed immediate in loads, stores and `addi`.
pub const IMM_MIN: i32 = -2048;
pub const IMM_MAX: i32 = 2047;

/// Whether `value` fits the 12-bit immediate field.
pub fn fits_imm12(value: i32) -> bool {
    (IMM_MIN..=IMM_MAX).contains(&value)
}

impl fmt::Display for Reg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Reg::Zero => "zero",
            Reg::Ra => "ra",
            Reg::Sp => "sp",
            Reg::T0 => "t0",
            Reg::T1 => "t1",
            Reg::T2 => "t2",
            Reg::A0 => "a0",
            Reg::A1 => "a1",
            Reg::A2 => "a2",
            Reg::A3 => "a3",
            Reg::A4 => "a4",
            Reg::A5 => "a5",
            Reg::A6 => "a6",
            Reg::A7 => "a7",
        };
        write!(f, "{name}")
    }
}
