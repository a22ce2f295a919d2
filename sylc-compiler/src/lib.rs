pub mod backend;
pub mod frontend;
pub mod ir;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CompileError {
    #[error("Lexical error ({line}:{col}): unexpected character")]
    Lexical { line: usize, col: usize },

    #[error("Parse error ({line}:{col}): {message}")]
    Parse {
        line: usize,
        col: usize,
        message: String,
    },

    #[error("SemanticError:{kind} ({line}:{col}) - {message}")]
    Semantic {
        kind: SemanticErrorKind,
        line: usize,
        col: usize,
        message: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SemanticErrorKind {
    Redefinition,
    UndefinedVariable,
    UndefinedFunction,
    BreakOutsideLoop,
    ContinueOutsideLoop,
    NonConstantExpression,
    DivisionByZero,
    NotAnArray,
    NotAFunction,
    NotAVariable,
    ArgumentCountMismatch,
    VoidValueUsed,
    InvalidArrayDimension,
    InvalidInitializer,
    ReturnTypeMismatch,
}

impl std::fmt::Display for SemanticErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SemanticErrorKind::Redefinition => write!(f, "Redefinition"),
            SemanticErrorKind::UndefinedVariable => write!(f, "UndefinedVariable"),
            SemanticErrorKind::UndefinedFunction => write!(f, "UndefinedFunction"),
            SemanticErrorKind::BreakOutsideLoop => write!(f, "BreakOutsideLoop"),
            SemanticErrorKind::ContinueOutsideLoop => write!(f, "ContinueOutsideLoop"),
            SemanticErrorKind::NonConstantExpression => write!(f, "NonConstantExpression"),
            SemanticErrorKind::DivisionByZero => write!(f, "DivisionByZero"),
            SemanticErrorKind::NotAnArray => write!(f, "NotAnArray"),
            SemanticErrorKind::NotAFunction => write!(f, "NotAFunction"),
            SemanticErrorKind::NotAVariable => write!(f, "NotAVariable"),
            SemanticErrorKind::ArgumentCountMismatch => write!(f, "ArgumentCountMismatch"),
            SemanticErrorKind::VoidValueUsed => write!(f, "VoidValueUsed"),
            SemanticErrorKind::InvalidArrayDimension => write!(f, "InvalidArrayDimension"),
            SemanticErrorKind::InvalidInitializer => write!(f, "InvalidInitializer"),
            SemanticErrorKind::ReturnTypeMismatch => write!(f, "ReturnTypeMismatch"),
        }
    }
}

/// Compile source text to the linear IR.
pub fn compile_to_ir(source: &str) -> Result<ir::Program, CompileError> {
    let unit = frontend::parse(source)?;
    ir::ir_generator::lower(&unit, source)
}

/// Compile source text all the way to RV32 assembly.
pub fn compile_to_riscv(source: &str) -> Result<String, CompileError> {
    let ir = compile_to_ir(source)?;
    Ok(backend::compile_ir_to_riscv(&ir))
}
