//! The IR generator: walks the checked AST and produces the abstract,
//! line-oriented textual IR (§4.4, §6 "IR text").

mod builder;
mod generator;
mod instr;
mod value;

pub use builder::{Block, Function, Global, IrBuilder, IrModule, Param};
pub use generator::IrGenerator;
pub use instr::Instr;
pub use value::{BlockId, FunctionId, Linkage, ValueId};

use crate::ast::Ast;
use crate::config::Config;
use crate::diagnostics::DiagnosticSink;
use crate::error::IrError;

/// Generate an [`IrModule`] from a checked AST (§4.4 "Pass structure").
/// Does not write a module-interface file; see
/// [`IrGenerator::generate_and_write_module_file`] for that.
pub fn generate(ast: &Ast, config: &Config, sink: &mut dyn DiagnosticSink) -> Result<IrModule, IrError> {
    IrGenerator::new(ast, config).generate(sink)
}
