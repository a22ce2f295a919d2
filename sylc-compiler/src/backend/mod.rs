//! IR to RV32 assembly.

pub mod abi;
pub mod codegen;
pub mod frame;
pub mod instruction;

pub use codegen::compile_ir_to_riscv;
