//! The instruction set emitted into a basic block (§4.4, §6 "IR text:
//! line-oriented, opaque to the core"). Each variant renders to exactly
//! one line; `Display` is the "abstract builder" output format — the
//! back-end that actually consumes this text is out of scope.

use std::fmt;

use super::value::{BlockId, ValueId};

#[derive(Debug, Clone)]
pub enum Instr {
    ConstInt { result: ValueId, ty: String, value: u64 },
    ConstFloat { result: ValueId, ty: String, value: f64 },
    ConstBool { result: ValueId, value: bool },
    ConstString { result: ValueId, value: String },
    /// Reads the `index`-th incoming parameter of the enclosing function
    /// (§4.4 "Function handling": parameters are materialized into the
    /// entry block's allocas by loading their incoming value first).
    Arg { result: ValueId, ty: String, index: u32 },
    Alloca { result: ValueId, ty: String, name: String },
    Load { result: ValueId, ty: String, ptr: ValueId },
    Store { ptr: ValueId, value: ValueId },
    Binary { result: ValueId, op: &'static str, ty: String, lhs: ValueId, rhs: ValueId },
    Unary { result: ValueId, op: &'static str, ty: String, operand: ValueId },
    /// An explicit or implicit cast (§4.3 cast lattice); `mode` is one of
    /// the lowercase `CastMode` variant names (`widen`, `truncate`, …).
    Cast { result: ValueId, mode: &'static str, from_ty: String, to_ty: String, value: ValueId },
    Call { result: Option<ValueId>, callee: String, ty: String, args: Vec<ValueId> },
    Br { target: BlockId },
    CondBr { cond: ValueId, then_block: BlockId, else_block: BlockId },
    Ret { value: Option<ValueId> },
    Unreachable,
    /// A debug source location preceding the instructions it governs
    /// (§4.4 "Debug info"); function prologues emit one with `line: 0` to
    /// suppress stepping into the allocas.
    DebugLocation { line: usize, column: usize },
    /// `llvm.dbg.declare`-equivalent tying a variable definition to its
    /// alloca, emitted only when debug info is enabled.
    DebugDeclare { name: String, ptr: ValueId },
}

impl Instr {
    /// Whether this instruction ends a basic block (§8 "every basic block
    /// ends in exactly one terminator instruction").
    pub fn is_terminator(&self) -> bool {
        matches!(self, Instr::Br { .. } | Instr::CondBr { .. } | Instr::Ret { .. } | Instr::Unreachable)
    }
}

impl fmt::Display for Instr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instr::ConstInt { result, ty, value } => write!(f, "  {result} = const {ty} {value}"),
            Instr::ConstFloat { result, ty, value } => write!(f, "  {result} = const {ty} {value}"),
            Instr::ConstBool { result, value } => write!(f, "  {result} = const bool {value}"),
            Instr::ConstString { result, value } => write!(f, "  {result} = const string {value:?}"),
            Instr::Arg { result, ty, index } => write!(f, "  {result} = arg {ty} {index}"),
            Instr::Alloca { result, ty, name } => write!(f, "  {result} = alloca {ty}, \"{name}\""),
            Instr::Load { result, ty, ptr } => write!(f, "  {result} = load {ty}, {ptr}"),
            Instr::Store { ptr, value } => write!(f, "  store {value}, {ptr}"),
            Instr::Binary { result, op, ty, lhs, rhs } => {
                write!(f, "  {result} = {op} {ty} {lhs}, {rhs}")
            }
            Instr::Unary { result, op, ty, operand } => write!(f, "  {result} = {op} {ty} {operand}"),
            Instr::Cast { result, mode, from_ty, to_ty, value } => {
                write!(f, "  {result} = cast.{mode} {from_ty} {value} to {to_ty}")
            }
            Instr::Call { result, callee, ty, args } => {
                let arg_list = args.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ");
                match result {
                    Some(result) => write!(f, "  {result} = call {ty} @{callee}({arg_list})"),
                    None => write!(f, "  call {ty} @{callee}({arg_list})"),
                }
            }
            Instr::Br { target } => write!(f, "  br {target}"),
            Instr::CondBr { cond, then_block, else_block } => {
                write!(f, "  condbr {cond}, {then_block}, {else_block}")
            }
            Instr::Ret { value: Some(value) } => write!(f, "  ret {value}"),
            Instr::Ret { value: None } => write!(f, "  ret void"),
            Instr::Unreachable => write!(f, "  unreachable"),
            Instr::DebugLocation { line, column } => write!(f, "  !dbg.loc {line}:{column}"),
            Instr::DebugDeclare { name, ptr } => write!(f, "  !dbg.declare \"{name}\", {ptr}"),
        }
    }
}
