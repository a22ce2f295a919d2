//! Abstract syntax tree for the SyL language.
//!
//! One variant per grammar alternative; nodes carry the byte span of the
//! source text they were parsed from so later phases can report accurate
//! locations. The tree is immutable once parsing finishes.

pub use crate::frontend::lexer::Span;

/// A whole translation unit: declarations and function definitions in
/// source order.
#[derive(Debug, Clone)]
pub struct CompUnit {
    pub items: Vec<GlobalItem>,
}

#[derive(Debug, Clone)]
pub enum GlobalItem {
    Decl(Decl),
    Func(FuncDef),
}

/// `const int a = 1, b[2] = {1, 2};` or `int x, y = 3;`
#[derive(Debug, Clone)]
pub struct Decl {
    pub is_const: bool,
    pub defs: Vec<VarDef>,
}

#[derive(Debug, Clone)]
pub struct VarDef {
    pub name: String,
    /// Array dimension expressions; empty for a scalar.
    pub dims: Vec<Expr>,
    pub init: Option<InitVal>,
    pub span: Span,
}

/// An initializer: a single expression or a brace list.
#[derive(Debug, Clone)]
pub enum InitVal {
    Expr(Expr),
    List(Vec<InitVal>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FuncType {
    Int,
    Void,
}

#[derive(Debug, Clone)]
pub struct FuncDef {
    pub ret: FuncType,
    pub name: String,
    pub params: Vec<FuncParam>,
    pub body: Block,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct FuncParam {
    pub name: String,
    /// `None` for a scalar parameter. `Some(dims)` for an array parameter
    /// `int a[][d1][d2]...`: the unsized first dimension decays to a
    /// pointer, `dims` holds the declared trailing dimensions.
    pub array_dims: Option<Vec<Expr>>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct Block {
    pub items: Vec<BlockItem>,
}

#[derive(Debug, Clone)]
pub enum BlockItem {
    Decl(Decl),
    Stmt(Stmt),
}

#[derive(Debug, Clone)]
pub enum Stmt {
    Assign {
        target: LVal,
        value: Expr,
        span: Span,
    },
    /// Expression statement; `None` for the empty statement `;`.
    Expr(Option<Expr>),
    Block(Block),
    If {
        cond: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
        span: Span,
    },
    While {
        cond: Expr,
        body: Box<Stmt>,
        span: Span,
    },
    Break(Span),
    Continue(Span),
    Return {
        value: Option<Expr>,
        span: Span,
    },
}

/// A (possibly indexed) assignable location: `x`, `a[i]`, `m[i][j]`.
#[derive(Debug, Clone)]
pub struct LVal {
    pub name: String,
    pub indices: Vec<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum Expr {
    Number(Span, i32),
    LVal(LVal),
    Call {
        name: String,
        args: Vec<Expr>,
        span: Span,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
        span: Span,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
        span: Span,
    },
}

impl Expr {
    pub fn span(&self) -> Span {
        match self {
            Expr::Number(span, _) => *span,
            Expr::LVal(lv) => lv.span,
            Expr::Call { span, .. } => *span,
            Expr::Unary { span, .. } => *span,
            Expr::Binary { span, .. } => *span,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Lt,
    Gt,
    Le,
    Ge,
    Eq,
    Neq,
    And,
    Or,
}
