//! The AST-walking IR generator (§4.4).

use crate::ast::{
    Ast, AssignOperator, BinaryOperator, ImportForm, NodeId, NodeKind, SubscriptKind, UnaryOperator,
};
use crate::config::Config;
use crate::diagnostics::{Diagnostic, DiagnosticSink};
use crate::error::IrError;
use crate::module_file::{ExportedFunction, ExportedGlobal, ExportedSymbol, ModuleInterface};
use crate::source::Span;
use crate::symbols::{Symbol, SymbolKind, SymbolTable, ValueHandle};
use crate::types::{self, CastMode, TypeId, TypeKind, TypeRegistry};

use super::builder::{Function, Global, IrBuilder, IrModule, Param as IrParam};
use super::instr::Instr;
use super::value::{Linkage, ValueId};

/// An expression's generated value: its type, its materialized rvalue (if
/// it has one — `void`-typed expressions carry none), and, for
/// expressions that denote storage, the pointer and mutability needed to
/// assign through it (§4.3 "Lvalue discipline").
struct GenValue {
    type_id: TypeId,
    rvalue: Option<ValueId>,
    place: Option<Place>,
}

struct Place {
    ptr: ValueId,
    is_mutable: bool,
}

pub struct IrGenerator<'a> {
    ast: &'a Ast,
    config: &'a Config,
    types: TypeRegistry,
    symbols: SymbolTable,
    builder: IrBuilder,
    module_name: Option<String>,
    current_return_type: Option<TypeId>,
    current_function_id: Option<super::value::FunctionId>,
}

impl<'a> IrGenerator<'a> {
    pub fn new(ast: &'a Ast, config: &'a Config) -> Self {
        Self {
            ast,
            config,
            types: TypeRegistry::new(),
            symbols: SymbolTable::new(),
            builder: IrBuilder::new(),
            module_name: None,
            current_return_type: None,
            current_function_id: None,
        }
    }

    pub fn generate(mut self, sink: &mut dyn DiagnosticSink) -> Result<IrModule, IrError> {
        self.symbols.push_frame();

        for &stmt in self.ast.top_level_statements() {
            if let Err(diag) = self.gen_top_level(stmt) {
                sink.report(diag);
            }
        }

        self.symbols.pop_frame();

        if sink.has_errors() {
            return Err(IrError(Diagnostic::without_location(
                crate::diagnostics::Severity::Error,
                "one or more semantic errors occurred",
            )));
        }

        Ok(self.builder.finish())
    }

    /// Generate IR, then write a `.vamod` next to `output_path` if the
    /// configuration requests it (§4.4 "Export writing").
    pub fn generate_and_write_module_file(
        ast: &'a Ast,
        config: &'a Config,
        output_path: &std::path::Path,
        sink: &mut dyn DiagnosticSink,
    ) -> Result<IrModule, IrError> {
        let mut generator = Self::new(ast, config);
        generator.symbols.push_frame();

        for &stmt in generator.ast.top_level_statements() {
            if let Err(diag) = generator.gen_top_level(stmt) {
                sink.report(diag);
            }
        }

        if sink.has_errors() {
            generator.symbols.pop_frame();
            return Err(IrError(Diagnostic::without_location(
                crate::diagnostics::Severity::Error,
                "one or more semantic errors occurred",
            )));
        }

        if generator.config.generate_module_file {
            let interface = generator.export_interface();
            let vamod_path = output_path.with_extension("vamod");
            if let Err(e) = interface.write(&vamod_path) {
                generator.symbols.pop_frame();
                return Err(IrError(Diagnostic::without_location(
                    crate::diagnostics::Severity::Error,
                    format!("failed to write module interface: {e}"),
                )));
            }
        }

        generator.symbols.pop_frame();
        Ok(generator.builder.finish())
    }

    fn export_interface(&self) -> ModuleInterface {
        let mut exports = Vec::new();
        for symbol in self.symbols.exports() {
            if symbol.is_function {
                let TypeKind::Function { params, return_type } = self.types.kind(self.types.resolve(symbol.type_id)).clone() else {
                    continue;
                };
                exports.push(ExportedSymbol::Function(ExportedFunction {
                    name: symbol.name.clone(),
                    return_type: self.types.name(return_type).to_owned(),
                    params: params.iter().map(|p| self.types.name(*p).to_owned()).collect(),
                    mangled: symbol.mangled_name.is_some(),
                    mangled_name: symbol.mangled_name.clone(),
                }));
            } else {
                exports.push(ExportedSymbol::Global(ExportedGlobal {
                    name: symbol.name.clone(),
                    type_name: self.types.name(symbol.type_id).to_owned(),
                    is_mutable: symbol.is_mutable,
                }));
            }
        }
        ModuleInterface { module_name: self.module_name.clone(), exports }
    }

    fn span(&self, node: NodeId) -> Span {
        self.ast.node(node).span
    }

    fn resolve_type_name(&self, name: &str, span: Span) -> Result<TypeId, Diagnostic> {
        self.types
            .find(name)
            .ok_or_else(|| Diagnostic::error(format!("undefined type '{name}'"), span))
    }

    // ---- top level ----

    fn gen_top_level(&mut self, node: NodeId) -> Result<(), Diagnostic> {
        let is_export = self.ast.node(node).is_export;
        match &self.ast.node(node).kind.clone() {
            NodeKind::FunctionDef { .. } => self.gen_function(node, is_export),
            NodeKind::GlobalVariableDef { inner } => self.gen_global_variable(*inner, is_export),
            NodeKind::Import { name, form, .. } => self.gen_import(name, *form, self.span(node)),
            NodeKind::Module { name } => {
                self.module_name = Some(name.clone());
                self.builder.set_module_name(name.clone());
                Ok(())
            }
            NodeKind::Alias { new_name, existing_name } => self.gen_alias(new_name, existing_name, self.span(node)),
            NodeKind::EmptyStmt => Ok(()),
            other => Err(Diagnostic::error(
                format!("'{}' is not valid at the top level", other.tag()),
                self.span(node),
            )),
        }
    }

    fn gen_alias(&mut self, new_name: &str, existing_name: &str, span: Span) -> Result<(), Diagnostic> {
        let underlying = self.resolve_type_name(existing_name, span)?;
        self.types
            .alias(new_name, underlying)
            .map(|_| ())
            .map_err(|_| Diagnostic::error(format!("type '{new_name}' is already defined"), span))
    }

    fn gen_import(&mut self, name: &str, form: ImportForm, span: Span) -> Result<(), Diagnostic> {
        let path = match form {
            ImportForm::Path => std::path::PathBuf::from(name),
            ImportForm::Dotted => std::path::PathBuf::from(format!("{name}.vamod")),
        };

        let interface = ModuleInterface::read(&path)
            .map_err(|e| Diagnostic::error(format!("could not import '{name}': {e}"), span))?;

        for export in &interface.exports {
            self.register_imported_symbol(export, span)?;
        }
        Ok(())
    }

    fn register_imported_symbol(&mut self, export: &ExportedSymbol, span: Span) -> Result<(), Diagnostic> {
        match export {
            ExportedSymbol::Function(f) => {
                let return_type = self.resolve_type_name(&f.return_type, span)?;
                let mut params = Vec::with_capacity(f.params.len());
                for p in &f.params {
                    params.push(self.resolve_type_name(p, span)?);
                }
                let type_id = self.types.function_type(params, return_type);

                if self.symbols.contains_in_current_frame(&f.name) {
                    // Duplicate imports are tolerated when identical (§4.4).
                    return Ok(());
                }

                self.symbols
                    .define(Symbol {
                        name: f.name.clone(),
                        type_id,
                        value: None,
                        is_mutable: false,
                        is_export: false,
                        is_function: true,
                        source_location: span,
                        prototype: None,
                        mangled_name: f.mangled_name.clone(),
                    })
                    .map_err(|_| Diagnostic::error(format!("conflicting import of '{}'", f.name), span))
            }
            ExportedSymbol::Global(g) => {
                let type_id = self.resolve_type_name(&g.type_name, span)?;
                if self.symbols.contains_in_current_frame(&g.name) {
                    return Ok(());
                }
                self.symbols
                    .define(Symbol {
                        name: g.name.clone(),
                        type_id,
                        value: None,
                        is_mutable: g.is_mutable,
                        is_export: false,
                        is_function: false,
                        source_location: span,
                        prototype: None,
                        mangled_name: None,
                    })
                    .map_err(|_| Diagnostic::error(format!("conflicting import of '{}'", g.name), span))
            }
        }
    }

    fn gen_global_variable(&mut self, def_node: NodeId, is_export: bool) -> Result<(), Diagnostic> {
        let NodeKind::VariableDef { name, type_name, is_mutable, init } = self.ast.node(def_node).kind.clone() else {
            unreachable!("GlobalVariableDef always wraps a VariableDef");
        };
        let span = self.span(def_node);

        let literal_type = self.literal_node_type(init, span)?;
        let type_id = match &type_name {
            Some(declared) => {
                let declared_id = self.resolve_type_name(declared, span)?;
                self.check_implicit_cast_allowed(literal_type, declared_id, span)?;
                declared_id
            }
            None => literal_type,
        };

        let initializer = self.render_constant_initializer(init, span)?;
        let linkage = if is_export { Linkage::WeakOdr } else { Linkage::Internal };
        self.builder.add_global(Global {
            name: name.clone(),
            ty: self.types.name(type_id).to_owned(),
            linkage,
            is_mutable,
            initializer,
        });

        self.symbols
            .define(Symbol {
                name: name.clone(),
                type_id,
                value: None,
                is_mutable,
                is_export,
                is_function: false,
                source_location: span,
                prototype: None,
                mangled_name: None,
            })
            .map_err(|_| Diagnostic::error(format!("'{name}' is already defined"), span))
    }

    /// Global initializers must be constants (§4.4); only literal
    /// expressions qualify.
    fn literal_node_type(&mut self, node: NodeId, span: Span) -> Result<TypeId, Diagnostic> {
        match &self.ast.node(node).kind {
            NodeKind::IntegerLiteral { meta, .. } => {
                let name = if meta.is_byte { "byte" } else { int_width_name(meta.width) };
                self.resolve_type_name(name, span)
            }
            NodeKind::FloatLiteral { meta, .. } => self.resolve_type_name(float_width_name(meta.width), span),
            NodeKind::BoolLiteral { .. } => self.resolve_type_name("bool", span),
            NodeKind::StringLiteral { kind, .. } => {
                let name = match kind {
                    crate::lexer::StringKind::Managed => "string",
                    crate::lexer::StringKind::CString => "cstring",
                };
                self.resolve_type_name(name, span)
            }
            NodeKind::CharLiteral { kind, .. } => {
                let name = match kind {
                    crate::lexer::CharKind::Unicode => "char",
                    crate::lexer::CharKind::Byte => "bchar",
                };
                self.resolve_type_name(name, span)
            }
            _ => Err(Diagnostic::error("global variable initializer must be a constant literal", span)),
        }
    }

    fn render_constant_initializer(&self, node: NodeId, span: Span) -> Result<String, Diagnostic> {
        match &self.ast.node(node).kind {
            NodeKind::IntegerLiteral { value, .. } => Ok(value.to_string()),
            NodeKind::FloatLiteral { value, .. } => Ok(value.to_string()),
            NodeKind::BoolLiteral { value } => Ok(value.to_string()),
            NodeKind::StringLiteral { value, .. } => Ok(format!("{value:?}")),
            NodeKind::CharLiteral { value, .. } => Ok(value.to_string()),
            _ => Err(Diagnostic::error("global variable initializer must be a constant literal", span)),
        }
    }

    // ---- functions ----

    fn gen_function(&mut self, node: NodeId, is_export: bool) -> Result<(), Diagnostic> {
        let NodeKind::FunctionDef { prototype, body, is_declaration } = self.ast.node(node).kind.clone() else {
            unreachable!("gen_function called on a non-FunctionDef node");
        };
        let NodeKind::Prototype { name, return_type, params, is_main, mangle } = self.ast.node(prototype).kind.clone() else {
            unreachable!("FunctionDef.prototype is always a Prototype node");
        };
        let span = self.span(node);

        let return_type_id = match &return_type {
            Some(name) => self.resolve_type_name(name, span)?,
            None => self.resolve_type_name("void", span)?,
        };

        let mut param_type_ids = Vec::with_capacity(params.len());
        let mut param_names = Vec::with_capacity(params.len());
        for &param_node in &params {
            let NodeKind::Param { def, .. } = self.ast.node(param_node).kind.clone() else {
                unreachable!("Prototype.params always contains Param nodes");
            };
            let NodeKind::VariableDef { name: param_name, type_name, .. } = self.ast.node(def).kind.clone() else {
                unreachable!("Param.def is always a VariableDef node");
            };
            let type_name = type_name.expect("function parameters always carry an explicit type");
            param_type_ids.push(self.resolve_type_name(&type_name, span)?);
            param_names.push(param_name);
        }

        if is_main {
            let i32_id = self.resolve_type_name("i32", span)?;
            if return_type_id != i32_id || !param_type_ids.is_empty() {
                return Err(Diagnostic::error("'main' must take no parameters and return i32", span));
            }
        }

        let function_type = self.types.function_type(param_type_ids.clone(), return_type_id);

        if let Some(existing) = self.symbols.find(&name, Some(SymbolKind::Function)) {
            if existing.type_id != function_type {
                return Err(Diagnostic::error(format!("'{name}' redeclared with a different signature"), span)
                    .with_note(existing.source_location, "previous declaration here"));
            }
        }

        let mangled_name = if is_export && mangle && !is_main {
            Some(self.mangle(&name, &param_type_ids, return_type_id))
        } else {
            None
        };

        let linkage = if is_export || is_main || is_declaration { Linkage::External } else { Linkage::Internal };

        if !self.symbols.contains_in_current_frame(&name) {
            self.symbols
                .define(Symbol {
                    name: name.clone(),
                    type_id: function_type,
                    value: None,
                    is_mutable: false,
                    is_export,
                    is_function: true,
                    source_location: span,
                    prototype: Some(prototype),
                    mangled_name: mangled_name.clone(),
                })
                .map_err(|_| Diagnostic::error(format!("'{name}' is already defined"), span))?;
        }

        if is_declaration {
            let ir_params = param_names
                .iter()
                .zip(&param_type_ids)
                .map(|(n, t)| IrParam { name: n.clone(), ty: self.types.name(*t).to_owned() })
                .collect();
            self.builder.start_function(Function {
                // overwritten by `start_function` with a freshly allocated id
                id: super::value::FunctionId(0),
                name: name.clone(),
                mangled_name,
                params: ir_params,
                return_type: self.types.name(return_type_id).to_owned(),
                linkage,
                is_declaration: true,
                blocks: Vec::new(),
            });
            self.builder.finish_function();
            return Ok(());
        }

        let ir_params: Vec<IrParam> = param_names
            .iter()
            .zip(&param_type_ids)
            .map(|(n, t)| IrParam { name: n.clone(), ty: self.types.name(*t).to_owned() })
            .collect();

        let function_id = self.builder.start_function(Function {
            id: super::value::FunctionId(0),
            name: name.clone(),
            mangled_name,
            params: ir_params,
            return_type: self.types.name(return_type_id).to_owned(),
            linkage,
            is_declaration: false,
            blocks: Vec::new(),
        });
        self.current_function_id = Some(function_id);
        self.current_return_type = Some(return_type_id);

        self.builder.append_block("entry");
        self.symbols.push_frame();

        for (index, ((param_name, param_type), param_node)) in
            param_names.iter().zip(&param_type_ids).zip(&params).enumerate()
        {
            let param_span = self.span(*param_node);
            let ty_name = self.types.name(*param_type).to_owned();
            let incoming = self.builder.emit(|result| Instr::Arg {
                result,
                ty: ty_name.clone(),
                index: index as u32,
            });
            let ptr = self.builder.emit_alloca(ty_name, param_name.clone());
            self.builder.emit_void(Instr::Store { ptr, value: incoming });
            self.symbols
                .define(Symbol {
                    name: param_name.clone(),
                    type_id: *param_type,
                    value: Some(ValueHandle(ptr.0)),
                    is_mutable: true,
                    is_export: false,
                    is_function: false,
                    source_location: param_span,
                    prototype: None,
                    mangled_name: None,
                })
                .map_err(|_| Diagnostic::error(format!("duplicate parameter name '{param_name}'"), param_span))?;
        }

        self.gen_block(body)?;

        if !self.builder.current_block_is_terminated() {
            if return_type_id == self.resolve_type_name("void", span)? {
                self.builder.emit_void(Instr::Ret { value: None });
            } else {
                self.symbols.pop_frame();
                self.current_function_id = None;
                self.current_return_type = None;
                return Err(Diagnostic::error(
                    format!("function '{name}' does not return a value on every path"),
                    span,
                ));
            }
        }

        self.builder.seal_function(function_id);
        self.symbols.pop_frame();
        self.builder.finish_function();
        self.current_function_id = None;
        self.current_return_type = None;

        Ok(())
    }

    fn mangle(&self, name: &str, params: &[TypeId], return_type: TypeId) -> String {
        let canonical = self.types.function_signature(params, return_type);
        let sanitized: String = canonical
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect();
        format!("_Va{}{}_{}", name.len(), name, sanitized)
    }

    // ---- statements ----

    fn gen_block(&mut self, node: NodeId) -> Result<(), Diagnostic> {
        let NodeKind::Block { statements } = self.ast.node(node).kind.clone() else {
            unreachable!("gen_block called on a non-Block node");
        };
        self.symbols.push_frame();
        for stmt in statements {
            self.gen_stmt(stmt)?;
            if self.builder.current_block_is_terminated() {
                break;
            }
        }
        self.symbols.pop_frame();
        Ok(())
    }

    fn gen_stmt(&mut self, node: NodeId) -> Result<(), Diagnostic> {
        match self.ast.node(node).kind.clone() {
            NodeKind::EmptyStmt | NodeKind::Empty => Ok(()),
            NodeKind::Block { .. } => self.gen_block(node),
            NodeKind::ExprStmt { expr } => self.gen_expr(expr).map(|_| ()),
            NodeKind::If { condition, then_branch, else_branch } => self.gen_if(condition, then_branch, else_branch),
            NodeKind::While { condition, body } => self.gen_while(condition, body),
            NodeKind::For { init, end, step, body } => self.gen_for(init, end, step, body),
            NodeKind::Return { value } => self.gen_return(value, self.span(node)),
            NodeKind::VariableDef { .. } => self.gen_local_variable(node),
            NodeKind::Import { name, form, .. } => self.gen_import(&name, form, self.span(node)),
            NodeKind::Module { name } => {
                self.module_name = Some(name.clone());
                self.builder.set_module_name(name);
                Ok(())
            }
            NodeKind::Alias { new_name, existing_name } => {
                self.gen_alias(&new_name, &existing_name, self.span(node))
            }
            NodeKind::ForEach { .. } => Err(Diagnostic::error("'foreach' is not implemented", self.span(node))),
            other => Err(Diagnostic::error(format!("'{}' is not a valid statement", other.tag()), self.span(node))),
        }
    }

    fn gen_local_variable(&mut self, node: NodeId) -> Result<(), Diagnostic> {
        let NodeKind::VariableDef { name, type_name, is_mutable, init } = self.ast.node(node).kind.clone() else {
            unreachable!();
        };
        let span = self.span(node);
        let init_value = self.gen_expr(init)?;

        let type_id = match &type_name {
            Some(declared) => self.resolve_type_name(declared, span)?,
            None => init_value.type_id,
        };

        let rvalue = self.require_rvalue(&init_value, span)?;
        let casted = self.implicit_cast(rvalue, init_value.type_id, type_id, span)?;

        let ty_name = self.types.name(type_id).to_owned();
        let ptr = self.builder.emit_alloca(ty_name, name.clone());
        self.builder.emit_void(Instr::Store { ptr, value: casted });
        if self.config.emit_debug {
            self.builder.emit_void(Instr::DebugDeclare { name: name.clone(), ptr });
        }

        self.symbols
            .define(Symbol {
                name: name.clone(),
                type_id,
                value: Some(ValueHandle(ptr.0)),
                is_mutable,
                is_export: false,
                is_function: false,
                source_location: span,
                prototype: None,
                mangled_name: None,
            })
            .map_err(|_| Diagnostic::error(format!("'{name}' is already defined in this scope"), span))
    }

    fn gen_if(&mut self, condition: NodeId, then_branch: NodeId, else_branch: NodeId) -> Result<(), Diagnostic> {
        let cond_span = self.span(condition);
        let cond = self.gen_expr(condition)?;
        let cond_rvalue = self.require_rvalue(&cond, cond_span)?;
        let bool_id = self.resolve_type_name("bool", cond_span)?;
        let cond_value = self.implicit_cast(cond_rvalue, cond.type_id, bool_id, cond_span)?;

        // Capture the predecessor block before appending any branch block —
        // `append_block` repositions the cursor to the newly appended
        // block, so this must happen first or the condbr ends up in the
        // wrong block.
        let predecessor = self.builder.current_block_id();

        let then_block = self.builder.append_block("if.then");
        let else_block = self.builder.append_block("if.else");
        let merge_block = self.builder.append_block("if.merge");

        if let Some(pred) = predecessor {
            self.builder.position_at_end(pred);
        }
        self.builder
            .emit_void(Instr::CondBr { cond: cond_value, then_block, else_block });

        self.builder.position_at_end(then_block);
        self.gen_stmt(then_branch)?;
        if !self.builder.current_block_is_terminated() {
            self.builder.emit_void(Instr::Br { target: merge_block });
        }

        self.builder.position_at_end(else_block);
        self.gen_stmt(else_branch)?;
        if !self.builder.current_block_is_terminated() {
            self.builder.emit_void(Instr::Br { target: merge_block });
        }

        self.builder.position_at_end(merge_block);
        Ok(())
    }

    fn gen_while(&mut self, condition: NodeId, body: NodeId) -> Result<(), Diagnostic> {
        let cond_block = self.builder.append_block("while.cond");
        self.builder.emit_void(Instr::Br { target: cond_block });
        self.builder.position_at_end(cond_block);

        let cond_span = self.span(condition);
        let cond = self.gen_expr(condition)?;
        let cond_rvalue = self.require_rvalue(&cond, cond_span)?;
        let bool_id = self.resolve_type_name("bool", cond_span)?;
        let cond_value = self.implicit_cast(cond_rvalue, cond.type_id, bool_id, cond_span)?;

        let body_block = self.builder.append_block("while.body");
        let merge_block = self.builder.append_block("while.merge");

        // `append_block` moved the cursor to `merge_block`; the condbr
        // belongs in `cond_block`.
        self.builder.position_at_end(cond_block);
        self.builder
            .emit_void(Instr::CondBr { cond: cond_value, then_block: body_block, else_block: merge_block });

        self.builder.position_at_end(body_block);
        self.gen_stmt(body)?;
        if !self.builder.current_block_is_terminated() {
            self.builder.emit_void(Instr::Br { target: cond_block });
        }

        self.builder.position_at_end(merge_block);
        Ok(())
    }

    fn gen_for(&mut self, init: NodeId, end: NodeId, step: NodeId, body: NodeId) -> Result<(), Diagnostic> {
        self.symbols.push_frame();
        if !matches!(self.ast.node(init).kind, NodeKind::Empty) {
            self.gen_stmt(init)?;
        }

        let cond_block = self.builder.append_block("for.cond");
        self.builder.emit_void(Instr::Br { target: cond_block });
        self.builder.position_at_end(cond_block);

        let cond_span = self.span(end);
        let cond = self.gen_expr(end)?;
        let cond_rvalue = self.require_rvalue(&cond, cond_span)?;
        let bool_id = self.resolve_type_name("bool", cond_span)?;
        let cond_value = self.implicit_cast(cond_rvalue, cond.type_id, bool_id, cond_span)?;

        let body_block = self.builder.append_block("for.body");
        let step_block = self.builder.append_block("for.step");
        let merge_block = self.builder.append_block("for.merge");

        // `append_block` moved the cursor to `merge_block`; the condbr
        // belongs in `cond_block`.
        self.builder.position_at_end(cond_block);
        self.builder
            .emit_void(Instr::CondBr { cond: cond_value, then_block: body_block, else_block: merge_block });

        self.builder.position_at_end(body_block);
        self.gen_stmt(body)?;
        if !self.builder.current_block_is_terminated() {
            self.builder.emit_void(Instr::Br { target: step_block });
        }

        self.builder.position_at_end(step_block);
        if !matches!(self.ast.node(step).kind, NodeKind::Empty) {
            self.gen_expr(step)?;
        }
        if !self.builder.current_block_is_terminated() {
            self.builder.emit_void(Instr::Br { target: cond_block });
        }

        self.builder.position_at_end(merge_block);
        self.symbols.pop_frame();
        Ok(())
    }

    fn gen_return(&mut self, value: NodeId, span: Span) -> Result<(), Diagnostic> {
        let return_type = self.current_return_type.expect("return outside a function");
        let void_id = self.resolve_type_name("void", span)?;

        if matches!(self.ast.node(value).kind, NodeKind::Empty) {
            if return_type != void_id {
                return Err(Diagnostic::error("missing return value for a non-void function", span));
            }
            self.builder.emit_void(Instr::Ret { value: None });
            return Ok(());
        }

        let result = self.gen_expr(value)?;
        let rvalue = self.require_rvalue(&result, span)?;
        let casted = self.implicit_cast(rvalue, result.type_id, return_type, span)?;
        self.builder.emit_void(Instr::Ret { value: Some(casted) });
        Ok(())
    }

    // ---- expressions ----

    fn gen_expr(&mut self, node: NodeId) -> Result<GenValue, Diagnostic> {
        let span = self.span(node);
        match self.ast.node(node).kind.clone() {
            NodeKind::IntegerLiteral { value, meta } => {
                let name = if meta.is_byte { "byte" } else { int_width_name(meta.width) };
                let type_id = self.resolve_type_name(name, span)?;
                let ty = self.types.name(type_id).to_owned();
                let rvalue = self.builder.emit(|result| Instr::ConstInt { result, ty, value });
                Ok(GenValue { type_id, rvalue: Some(rvalue), place: None })
            }
            NodeKind::FloatLiteral { value, meta } => {
                let type_id = self.resolve_type_name(float_width_name(meta.width), span)?;
                let ty = self.types.name(type_id).to_owned();
                let rvalue = self.builder.emit(|result| Instr::ConstFloat { result, ty, value });
                Ok(GenValue { type_id, rvalue: Some(rvalue), place: None })
            }
            NodeKind::BoolLiteral { value } => {
                let type_id = self.resolve_type_name("bool", span)?;
                let rvalue = self.builder.emit(|result| Instr::ConstBool { result, value });
                Ok(GenValue { type_id, rvalue: Some(rvalue), place: None })
            }
            NodeKind::StringLiteral { value, kind } => {
                let name = match kind {
                    crate::lexer::StringKind::Managed => "string",
                    crate::lexer::StringKind::CString => "cstring",
                };
                let type_id = self.resolve_type_name(name, span)?;
                let rvalue = self.builder.emit(|result| Instr::ConstString { result, value });
                Ok(GenValue { type_id, rvalue: Some(rvalue), place: None })
            }
            NodeKind::CharLiteral { value, kind } => {
                let name = match kind {
                    crate::lexer::CharKind::Unicode => "char",
                    crate::lexer::CharKind::Byte => "bchar",
                };
                let type_id = self.resolve_type_name(name, span)?;
                let ty = self.types.name(type_id).to_owned();
                let rvalue = self.builder.emit(|result| Instr::ConstInt { result, ty, value: value as u64 });
                Ok(GenValue { type_id, rvalue: Some(rvalue), place: None })
            }
            NodeKind::VariableRef { name } | NodeKind::Identifier { name } => self.gen_name_ref(&name, span),
            NodeKind::BinaryOp { op, lhs, rhs } => self.gen_binary(op, lhs, rhs, span),
            NodeKind::UnaryOp { op, operand } => self.gen_unary(op, operand, span),
            NodeKind::AssignOp { op, target, value } => self.gen_assign(op, target, value, span),
            NodeKind::Call { callee, args } => self.gen_call(callee, args, span),
            NodeKind::Cast { value, type_name } => self.gen_cast(value, &type_name, span),
            NodeKind::Subscript { kind: SubscriptKind::Range, .. } => {
                Err(Diagnostic::error("range subscripts are not implemented", span))
            }
            NodeKind::Subscript { kind: SubscriptKind::Index, .. } => {
                Err(Diagnostic::error("subscripting is not implemented", span))
            }
            other => Err(Diagnostic::error(format!("'{}' is not a valid expression", other.tag()), span)),
        }
    }

    fn gen_name_ref(&mut self, name: &str, span: Span) -> Result<GenValue, Diagnostic> {
        let symbol = self
            .symbols
            .find(name, None)
            .ok_or_else(|| Diagnostic::error(format!("undefined symbol '{name}'"), span))?;

        if symbol.is_function {
            return Ok(GenValue { type_id: symbol.type_id, rvalue: None, place: None });
        }

        let ptr = symbol.value.map(|h| ValueId(h.0));
        let type_id = symbol.type_id;
        let is_mutable = symbol.is_mutable;

        match ptr {
            Some(ptr) => {
                let ty = self.types.name(type_id).to_owned();
                let loaded = self.builder.emit(|result| Instr::Load { result, ty, ptr });
                Ok(GenValue { type_id, rvalue: Some(loaded), place: Some(Place { ptr, is_mutable }) })
            }
            None => Ok(GenValue { type_id, rvalue: None, place: None }),
        }
    }

    fn require_rvalue(&self, value: &GenValue, span: Span) -> Result<ValueId, Diagnostic> {
        value
            .rvalue
            .ok_or_else(|| Diagnostic::error("a void-typed expression has no usable value", span))
    }

    fn gen_binary(&mut self, op: BinaryOperator, lhs: NodeId, rhs: NodeId, span: Span) -> Result<GenValue, Diagnostic> {
        let lhs_value = self.gen_expr(lhs)?;
        let rhs_value = self.gen_expr(rhs)?;

        let lhs_kind = self.types.resolve(lhs_value.type_id);
        types::binary_operator_allowed(self.types.kind(lhs_kind), op)
            .map_err(|_| Diagnostic::error("operator is not supported for this type", span))?;

        let lhs_rvalue = self.require_rvalue(&lhs_value, span)?;
        let rhs_rvalue = self.require_rvalue(&rhs_value, span)?;
        let rhs_casted = self.implicit_cast(rhs_rvalue, rhs_value.type_id, lhs_value.type_id, span)?;

        let is_comparison = matches!(
            op,
            BinaryOperator::Eq
                | BinaryOperator::NotEq
                | BinaryOperator::Lt
                | BinaryOperator::LtEq
                | BinaryOperator::Gt
                | BinaryOperator::GtEq
        );
        let result_type = if is_comparison {
            self.resolve_type_name("bool", span)?
        } else {
            lhs_value.type_id
        };

        let mnemonic = binary_mnemonic(op);
        let ty = self.types.name(lhs_value.type_id).to_owned();
        let rvalue = self.builder.emit(|result| Instr::Binary {
            result,
            op: mnemonic,
            ty,
            lhs: lhs_rvalue,
            rhs: rhs_casted,
        });
        Ok(GenValue { type_id: result_type, rvalue: Some(rvalue), place: None })
    }

    fn gen_unary(&mut self, op: UnaryOperator, operand: NodeId, span: Span) -> Result<GenValue, Diagnostic> {
        let value = self.gen_expr(operand)?;
        let kind = self.types.resolve(value.type_id);
        types::unary_operator_allowed(self.types.kind(kind), op)
            .map_err(|_| Diagnostic::error("operator is not supported for this type", span))?;

        let rvalue = self.require_rvalue(&value, span)?;
        let mnemonic = unary_mnemonic(op);
        let ty = self.types.name(value.type_id).to_owned();
        let result = self.builder.emit(|result| Instr::Unary { result, op: mnemonic, ty, operand: rvalue });
        Ok(GenValue { type_id: value.type_id, rvalue: Some(result), place: None })
    }

    fn gen_assign(&mut self, op: AssignOperator, target: NodeId, value: NodeId, span: Span) -> Result<GenValue, Diagnostic> {
        let target_value = self.gen_expr(target)?;
        let place = target_value
            .place
            .ok_or_else(|| Diagnostic::error("assignment target is not an lvalue", span))?;
        if !place.is_mutable {
            return Err(Diagnostic::error("cannot assign to an immutable binding", span));
        }

        let rhs_value = self.gen_expr(value)?;
        let rhs_rvalue = self.require_rvalue(&rhs_value, span)?;

        let stored = match op.underlying_binary() {
            None => self.implicit_cast(rhs_rvalue, rhs_value.type_id, target_value.type_id, span)?,
            Some(binary) => {
                let target_kind = self.types.resolve(target_value.type_id);
                types::binary_operator_allowed(self.types.kind(target_kind), binary)
                    .map_err(|_| Diagnostic::error("compound assignment operator is not supported for this type", span))?;
                let current = target_value
                    .rvalue
                    .ok_or_else(|| Diagnostic::error("a void-typed expression has no usable value", span))?;
                let rhs_casted = self.implicit_cast(rhs_rvalue, rhs_value.type_id, target_value.type_id, span)?;
                let mnemonic = binary_mnemonic(binary);
                let ty = self.types.name(target_value.type_id).to_owned();
                self.builder.emit(|result| Instr::Binary { result, op: mnemonic, ty, lhs: current, rhs: rhs_casted })
            }
        };

        self.builder.emit_void(Instr::Store { ptr: place.ptr, value: stored });
        Ok(GenValue { type_id: target_value.type_id, rvalue: Some(stored), place: Some(place) })
    }

    /// A call whose callee does not resolve to a function symbol is
    /// constructor-like cast syntax, which is parsed but not implemented
    /// (see the AST's `Call` doc comment).
    fn gen_call(&mut self, callee: NodeId, args: Vec<NodeId>, span: Span) -> Result<GenValue, Diagnostic> {
        let NodeKind::VariableRef { name } = self.ast.node(callee).kind.clone() else {
            return Err(Diagnostic::error("only a plain function name can be called", span));
        };

        let symbol = self
            .symbols
            .find(&name, None)
            .ok_or_else(|| Diagnostic::error(format!("undefined symbol '{name}'"), span))?
            .clone();

        if !symbol.is_function {
            return Err(Diagnostic::error(
                format!("'{name}' is not callable; constructor-like cast syntax is not implemented"),
                span,
            ));
        }

        let resolved = self.types.resolve(symbol.type_id);
        let TypeKind::Function { params, return_type } = self.types.kind(resolved).clone() else {
            unreachable!("is_function symbols always carry a Function type");
        };

        if params.len() != args.len() {
            return Err(Diagnostic::error(
                format!("'{name}' expects {} argument(s), got {}", params.len(), args.len()),
                span,
            ));
        }

        let mut arg_values = Vec::with_capacity(args.len());
        for (arg_node, param_type) in args.iter().zip(&params) {
            let arg_span = self.span(*arg_node);
            let arg = self.gen_expr(*arg_node)?;
            let arg_rvalue = self.require_rvalue(&arg, arg_span)?;
            let casted = self.implicit_cast(arg_rvalue, arg.type_id, *param_type, arg_span)?;
            arg_values.push(casted);
        }

        let callee_name = symbol.mangled_name.clone().unwrap_or_else(|| name.clone());
        let void_id = self.resolve_type_name("void", span)?;
        let ty = self.types.name(return_type).to_owned();

        if return_type == void_id {
            self.builder.emit_void(Instr::Call { result: None, callee: callee_name, ty, args: arg_values });
            Ok(GenValue { type_id: return_type, rvalue: None, place: None })
        } else {
            let result = self
                .builder
                .emit(|result| Instr::Call { result: Some(result), callee: callee_name, ty, args: arg_values });
            Ok(GenValue { type_id: return_type, rvalue: Some(result), place: None })
        }
    }

    fn gen_cast(&mut self, value: NodeId, type_name: &str, span: Span) -> Result<GenValue, Diagnostic> {
        let source = self.gen_expr(value)?;
        let target = self.resolve_type_name(type_name, span)?;
        let rvalue = self.require_rvalue(&source, span)?;

        let from_kind = self.types.resolve(source.type_id);
        let to_kind = self.types.resolve(target);
        let mode = types::classify_cast(self.types.kind(from_kind), self.types.kind(to_kind));
        if mode == CastMode::Disallowed {
            return Err(Diagnostic::error(
                format!("no cast exists from '{}' to '{type_name}'", self.types.name(source.type_id)),
                span,
            ));
        }

        let from_ty = self.types.name(source.type_id).to_owned();
        let to_ty = self.types.name(target).to_owned();
        let mode_name = cast_mode_name(mode);
        let result = self.builder.emit(|result| Instr::Cast {
            result,
            mode: mode_name,
            from_ty,
            to_ty,
            value: rvalue,
        });
        Ok(GenValue { type_id: target, rvalue: Some(result), place: None })
    }

    fn check_implicit_cast_allowed(&self, from: TypeId, to: TypeId, span: Span) -> Result<(), Diagnostic> {
        let from_kind = self.types.resolve(from);
        let to_kind = self.types.resolve(to);
        let mode = types::classify_cast(self.types.kind(from_kind), self.types.kind(to_kind));
        if types::cast_is_implicit(mode) {
            Ok(())
        } else {
            Err(Diagnostic::error(
                format!(
                    "cannot implicitly convert '{}' to '{}'",
                    self.types.name(from),
                    self.types.name(to)
                ),
                span,
            )
            .with_note(span, "only identity and same-family widening conversions are implicit"))
        }
    }

    /// Implicitly cast `value` (currently typed `from`) to `to`, emitting a
    /// `Cast` instruction unless the conversion is a no-op identity.
    fn implicit_cast(&mut self, value: ValueId, from: TypeId, to: TypeId, span: Span) -> Result<ValueId, Diagnostic> {
        if from == to {
            return Ok(value);
        }
        let from_kind = self.types.resolve(from);
        let to_kind = self.types.resolve(to);
        let mode = types::classify_cast(self.types.kind(from_kind), self.types.kind(to_kind));

        if mode == CastMode::Identity {
            return Ok(value);
        }
        if !types::cast_is_implicit(mode) {
            return Err(Diagnostic::error(
                format!("cannot implicitly convert '{}' to '{}'", self.types.name(from), self.types.name(to)),
                span,
            ));
        }

        let from_ty = self.types.name(from).to_owned();
        let to_ty = self.types.name(to).to_owned();
        let mode_name = cast_mode_name(mode);
        Ok(self.builder.emit(|result| Instr::Cast { result, mode: mode_name, from_ty, to_ty, value }))
    }
}

fn int_width_name(width: crate::lexer::IntWidth) -> &'static str {
    use crate::lexer::IntWidth::*;
    match width {
        W8 => "i8",
        W16 => "i16",
        W32 => "i32",
        W64 => "i64",
    }
}

fn float_width_name(width: crate::lexer::FloatWidth) -> &'static str {
    use crate::lexer::FloatWidth::*;
    match width {
        W32 => "f32",
        W64 => "f64",
    }
}

fn binary_mnemonic(op: BinaryOperator) -> &'static str {
    use BinaryOperator::*;
    match op {
        Add => "add",
        Sub => "sub",
        Mul => "mul",
        Div => "div",
        Mod => "mod",
        Rem => "rem",
        Pow => "pow",
        And => "and",
        Or => "or",
        Eq => "eq",
        NotEq => "ne",
        Lt => "lt",
        LtEq => "le",
        Gt => "gt",
        GtEq => "ge",
        Instanceof => "instanceof",
        Dot => "dot",
    }
}

fn unary_mnemonic(op: UnaryOperator) -> &'static str {
    use UnaryOperator::*;
    match op {
        Plus => "plus",
        Minus => "neg",
        Not => "not",
        Sizeof => "sizeof",
        Typeof => "typeof",
        Addressof => "addressof",
    }
}

fn cast_mode_name(mode: CastMode) -> &'static str {
    match mode {
        CastMode::Identity => "identity",
        CastMode::Widen => "widen",
        CastMode::Truncate => "truncate",
        CastMode::IntToFloat => "int_to_float",
        CastMode::FloatToInt => "float_to_int",
        CastMode::ZeroExtend => "zero_extend",
        CastMode::ZeroExtendThenFloat => "zero_extend_then_float",
        CastMode::TruncateToBool => "truncate_to_bool",
        CastMode::BitReinterpret => "bit_reinterpret",
        CastMode::Disallowed => "disallowed",
    }
}
