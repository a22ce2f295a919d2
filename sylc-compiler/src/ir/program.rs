//! In-memory form of the linear IR.
//!
//! A [`Program`] is a list of global allocations plus a list of
//! functions; each function is a sequence of labelled basic blocks, and
//! every block ends in exactly one [`Terminator`]. Values are immutable
//! temporaries numbered per function (`%0`, `%1`, ...). Named storage
//! (locals and globals) is only touched through `load` and `store`.
//!
//! [`Program::to_text`] renders the whole thing in the textual IR
//! format the CLI emits.

use std::fmt;

/// Per-function temporary id, printed as `%N`.
pub type TempId = u32;

/// A value an instruction can consume.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operand {
    Imm(i32),
    Temp(TempId),
    /// The i-th incoming function argument. Only valid in the entry
    /// block, where the prologue copies arguments into local slots.
    Arg(u8),
}

/// A memory location for `load`, `store` and `getptr`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Addr {
    /// A named local allocation inside the current function.
    Slot(String),
    /// A named global allocation.
    Global(String),
    /// A computed address held in a temporary.
    Ptr(TempId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
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
    Ne,
    And,
    Or,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instr {
    /// `%dst = op lhs, rhs`
    Binary {
        dst: TempId,
        op: BinOp,
        lhs: Operand,
        rhs: Operand,
    },
    /// `@name = alloc ...` — reserve `words` 4-byte words of stack space.
    Alloc { name: String, words: usize },
    /// `%dst = load addr`
    Load { dst: TempId, addr: Addr },
    /// `store src, addr`
    Store { addr: Addr, src: Operand },
    /// `%dst = getptr base, offset` — `base` plus a byte offset.
    GetPtr {
        dst: TempId,
        base: Addr,
        offset: Operand,
    },
    /// `%dst = call @func(args)`; `dst` is `None` for void calls.
    Call {
        dst: Option<TempId>,
        func: String,
        args: Vec<Operand>,
    },
}

/// The single exit point of a basic block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Terminator {
    Branch {
        cond: Operand,
        then_label: String,
        else_label: String,
    },
    Jump(String),
    Ret(Option<Operand>),
}

#[derive(Debug, Clone)]
pub struct BasicBlock {
    pub label: String,
    pub instrs: Vec<Instr>,
    pub term: Terminator,
}

#[derive(Debug, Clone)]
pub struct Function {
    pub name: String,
    pub param_count: usize,
    pub returns_value: bool,
    pub blocks: Vec<BasicBlock>,
}

/// A global variable definition.
#[derive(Debug, Clone)]
pub struct Global {
    pub name: String,
    /// Size in 4-byte words; 1 for a scalar.
    pub words: usize,
    /// Word-by-word initial values, always `words` long.
    pub init: Vec<i32>,
    pub is_array: bool,
}

#[derive(Debug, Clone, Default)]
pub struct Program {
    pub globals: Vec<Global>,
    pub functions: Vec<Function>,
}

/// The runtime library every program may call into.
pub const INTRINSIC_DECLS: &[&str] = &[
    "decl @getint(): i32",
    "decl @getch(): i32",
    "decl @getarray(*i32): i32",
    "decl @putint(i32)",
    "decl @putch(i32)",
    "decl @putarray(i32, *i32)",
    "decl @starttime()",
    "decl @stoptime()",
];

impl Program {
    /// Render the textual form of the IR.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        for decl in INTRINSIC_DECLS {
            out.push_str(decl);
            out.push('\n');
        }
        out.push('\n');

        for global in &self.globals {
            if global.is_array {
                if global.init.iter().all(|&v| v == 0) {
                    out.push_str(&format!(
                        "global @{} = alloc [i32, {}], zeroinit\n",
                        global.name, global.words
                    ));
                } else {
                    let values: Vec<String> =
                        global.init.iter().map(|v| v.to_string()).collect();
                    out.push_str(&format!(
                        "global @{} = alloc [i32, {}], {{{}}}\n",
                        global.name,
                        global.words,
                        values.join(", ")
                    ));
                }
            } else {
                out.push_str(&format!(
                    "global @{} = alloc i32, {}\n",
                    global.name, global.init[0]
                ));
            }
        }
        if !self.globals.is_empty() {
            out.push('\n');
        }

        for (i, func) in self.functions.iter().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            func.write_text(&mut out);
        }
        out
    }
}

impl Function {
    fn write_text(&self, out: &mut String) {
        let params: Vec<String> = (0..self.param_count)
            .map(|i| format!("@p{i}: i32"))
            .collect();
        let ret = if self.returns_value { ": i32" } else { "" };
        out.push_str(&format!(
            "fun @{}({}){} {{\n",
            self.name,
            params.join(", "),
            ret
        ));
        for block in &self.blocks {
            out.push_str(&format!("%{}:\n", block.label));
            for instr in &block.instrs {
                out.push_str(&format!("  {instr}\n"));
            }
            out.push_str(&format!("  {}\n", block.term));
        }
        out.push_str("}\n");
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Imm(n) => write!(f, "{n}"),
            Operand::Temp(t) => write!(f, "%{t}"),
            Operand::Arg(i) => write!(f, "@p{i}"),
        }
    }
}

impl fmt::Display for Addr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Addr::Slot(name) | Addr::Global(name) => write!(f, "@{name}"),
            Addr::Ptr(t) => write!(f, "%{t}"),
        }
    }
}

impl fmt::Display for BinOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BinOp::Add => "add",
            BinOp::Sub => "sub",
            BinOp::Mul => "mul",
            BinOp::Div => "div",
            BinOp::Mod => "mod",
            BinOp::Lt => "lt",
            BinOp::Gt => "gt",
            BinOp::Le => "le",
            BinOp::Ge => "ge",
            BinOp::Eq => "eq",
            BinOp::Ne => "ne",
            BinOp::And => "and",
            BinOp::Or => "or",
        };
        write!(f, "{name}")
    }
}

impl fmt::Display for Instr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instr::Binary { dst, op, lhs, rhs } => {
                write!(f, "%{dst} = {op} {lhs}, {rhs}")
            }
            Instr::Alloc { name, words } => {
                if *words == 1 {
                    write!(f, "@{name} = alloc i32")
                } else {
                    write!(f, "@{name} = alloc [i32, {words}]")
                }
            }
            Instr::Load { dst, addr } => write!(f, "%{dst} = load {addr}"),
            Instr::Store { addr, src } => write!(f, "store {src}, {addr}"),
            Instr::GetPtr { dst, base, offset } => {
                write!(f, "%{dst} = getptr {base}, {offset}")
            }
            Instr::Call { dst, func, args } => {
                let args: Vec<String> = args.iter().map(|a| a.to_string()).collect();
                match dst {
                    Some(dst) => write!(f, "%{dst} = call @{func}({})", args.join(", ")),
                    None => write!(f, "call @{func}({})", args.join(", ")),
                }
            }
        }
    }
}

impl fmt::Display for Terminator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Terminator::Branch {
                cond,
                then_label,
                else_label,
            } => write!(f, "br {cond}, %{then_label}, %{else_label}"),
            Terminator::Jump(label) => write!(f, "jump %{label}"),
            Terminator::Ret(Some(value)) => write!(f, "ret {value}"),
            Terminator::Ret(None) => write!(f, "ret"),
        }
    }
}
