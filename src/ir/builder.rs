//! The abstract IR builder (§4.4 "Pass structure": "a builder cursor
//! addressing the current basic block"). Owns every function, block, and
//! instruction produced during generation and knows how to render the
//! whole module as line-oriented text (§6 "IR text").

use std::fmt;

use super::instr::Instr;
use super::value::{BlockId, FunctionId, Linkage, ValueId};

#[derive(Debug, Clone)]
pub struct Block {
    pub id: BlockId,
    pub name: String,
    pub instructions: Vec<Instr>,
}

impl Block {
    pub fn is_terminated(&self) -> bool {
        self.instructions.last().is_some_and(Instr::is_terminator)
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}:", self.name)?;
        for instr in &self.instructions {
            writeln!(f, "{instr}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct Param {
    pub name: String,
    pub ty: String,
}

#[derive(Debug, Clone)]
pub struct Function {
    pub id: FunctionId,
    pub name: String,
    pub mangled_name: Option<String>,
    pub params: Vec<Param>,
    pub return_type: String,
    pub linkage: Linkage,
    pub is_declaration: bool,
    pub blocks: Vec<Block>,
}

impl Function {
    pub fn linkage_name(&self) -> &str {
        self.mangled_name.as_deref().unwrap_or(&self.name)
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let param_list = self
            .params
            .iter()
            .map(|p| format!("{}: {}", p.name, p.ty))
            .collect::<Vec<_>>()
            .join(", ");

        if self.is_declaration {
            return writeln!(
                f,
                "declare {} @{}({}) -> {}",
                self.linkage,
                self.linkage_name(),
                param_list,
                self.return_type
            );
        }

        writeln!(
            f,
            "function {} @{}({}) -> {} {{",
            self.linkage,
            self.linkage_name(),
            param_list,
            self.return_type
        )?;
        for block in &self.blocks {
            write!(f, "{block}")?;
        }
        writeln!(f, "}}")
    }
}

#[derive(Debug, Clone)]
pub struct Global {
    pub name: String,
    pub ty: String,
    pub linkage: Linkage,
    pub is_mutable: bool,
    pub initializer: String,
}

impl fmt::Display for Global {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mutability = if self.is_mutable { "mut" } else { "const" };
        writeln!(f, "global {} {mutability} {}: {} = {}", self.linkage, self.name, self.ty, self.initializer)
    }
}

/// A fully generated module, ready to be rendered as text or to feed the
/// module-interface writer.
#[derive(Debug, Clone, Default)]
pub struct IrModule {
    pub name: Option<String>,
    pub globals: Vec<Global>,
    pub functions: Vec<Function>,
}

impl fmt::Display for IrModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(name) = &self.name {
            writeln!(f, "; module {name}")?;
        }
        for global in &self.globals {
            write!(f, "{global}")?;
        }
        for function in &self.functions {
            write!(f, "{function}")?;
        }
        Ok(())
    }
}

/// Accumulates functions/blocks/instructions while the generator walks the
/// AST. Tracks the current function and current block as indices so the
/// generator never has to thread them through every call explicitly.
#[derive(Debug, Default)]
pub struct IrBuilder {
    module: IrModule,
    next_value: u32,
    next_block: u32,
    next_function: u32,
    current_function: Option<usize>,
    current_block: Option<usize>,
}

impl IrBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_module_name(&mut self, name: String) {
        self.module.name = Some(name);
    }

    pub fn add_global(&mut self, global: Global) {
        self.module.globals.push(global);
    }

    pub fn has_global(&self, name: &str) -> bool {
        self.module.globals.iter().any(|g| g.name == name)
    }

    fn fresh_value(&mut self) -> ValueId {
        let id = ValueId(self.next_value);
        self.next_value += 1;
        id
    }

    fn fresh_block_id(&mut self) -> BlockId {
        let id = BlockId(self.next_block);
        self.next_block += 1;
        id
    }

    fn fresh_function_id(&mut self) -> FunctionId {
        let id = FunctionId(self.next_function);
        self.next_function += 1;
        id
    }

    /// Begin a new function; it becomes the current function with no
    /// blocks yet. `function.id` is overwritten with a freshly allocated
    /// id — callers don't need to pick one.
    pub fn start_function(&mut self, mut function: Function) -> FunctionId {
        let id = self.fresh_function_id();
        function.id = id;
        self.module.functions.push(function);
        self.current_function = Some(self.module.functions.len() - 1);
        self.current_block = None;
        id
    }

    pub fn has_function(&self, name: &str) -> Option<&Function> {
        self.module.functions.iter().find(|f| f.name == name)
    }

    pub fn finish_function(&mut self) {
        self.current_function = None;
        self.current_block = None;
    }

    fn current_function_mut(&mut self) -> &mut Function {
        let index = self.current_function.expect("no current function");
        &mut self.module.functions[index]
    }

    /// Append a new block named `name` to the current function and make
    /// it the insertion point.
    pub fn append_block(&mut self, name: impl Into<String>) -> BlockId {
        let id = self.fresh_block_id();
        let block = Block { id, name: name.into(), instructions: Vec::new() };
        self.current_function_mut().blocks.push(block);
        self.current_block = Some(self.current_function_mut().blocks.len() - 1);
        id
    }

    pub fn position_at_end(&mut self, block: BlockId) {
        let index = self
            .current_function_mut()
            .blocks
            .iter()
            .position(|b| b.id == block)
            .expect("unknown block");
        self.current_block = Some(index);
    }

    pub fn current_block_id(&self) -> Option<BlockId> {
        let function = self.module.functions.get(self.current_function?)?;
        let block = function.blocks.get(self.current_block?)?;
        Some(block.id)
    }

    /// Whether the current block already ends in a terminator — callers
    /// use this to avoid emitting dead code after an early return.
    pub fn current_block_is_terminated(&self) -> bool {
        let Some(fi) = self.current_function else { return false };
        let Some(bi) = self.current_block else { return false };
        self.module.functions[fi].blocks[bi].is_terminated()
    }

    fn current_block_mut(&mut self) -> &mut Block {
        let fi = self.current_function.expect("no current function");
        let bi = self.current_block.expect("no current block");
        &mut self.module.functions[fi].blocks[bi]
    }

    /// Push an instruction into the current block, returning a fresh
    /// result value id if the caller asks for one.
    pub fn emit(&mut self, build: impl FnOnce(ValueId) -> Instr) -> ValueId {
        let result = self.fresh_value();
        let instr = build(result);
        self.current_block_mut().instructions.push(instr);
        result
    }

    /// Push a void instruction (no result value).
    pub fn emit_void(&mut self, instr: Instr) {
        self.current_block_mut().instructions.push(instr);
    }

    /// Allocate storage in the function's entry block regardless of the
    /// current insertion point (§4.4: "Variable definitions allocate in
    /// the function entry block"). The entry block is always the first
    /// one appended by [`Self::start_function`]'s caller.
    pub fn emit_alloca(&mut self, ty: String, name: String) -> ValueId {
        let result = self.fresh_value();
        let fi = self.current_function.expect("no current function");
        let instr = Instr::Alloca { result, ty, name };
        self.module.functions[fi].blocks[0].instructions.push(instr);
        result
    }

    /// Sweep every block of `function_id`'s function: truncate after the
    /// first terminator, append `unreachable` to any block with none
    /// (§4.4 "Function handling" step 4, §8 invariant).
    pub fn seal_function(&mut self, function_id: FunctionId) {
        let function = self
            .module
            .functions
            .iter_mut()
            .find(|f| f.id == function_id)
            .expect("unknown function");

        for block in &mut function.blocks {
            if let Some(pos) = block.instructions.iter().position(Instr::is_terminator) {
                block.instructions.truncate(pos + 1);
            } else {
                block.instructions.push(Instr::Unreachable);
            }
        }
    }

    pub fn finish(self) -> IrModule {
        self.module
    }
}
