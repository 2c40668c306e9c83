//! # vac
//!
//! This library is the front-end and middle-end of the Va compiler. It
//! combines lexer, parser, and AST-walking IR generator behind two entry
//! points, [`compile_source`] and [`compile_file`]; the `vac` binary is a
//! thin CLI wrapper around them.

pub mod ast;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod ir;
pub mod lexer;
pub mod module_file;
pub mod parser;
pub mod source;
pub mod symbols;
pub mod types;

use std::path::Path;

use ast::Ast;
use config::Config;
use diagnostics::{Diagnostic, DiagnosticSink, Severity};
use error::IrError;
use ir::{IrGenerator, IrModule};
use source::{FileId, SourceCache};

/// The result of a successful compile: the parsed AST (useful for
/// `--dump-parsed`-style tooling) alongside the generated IR module.
#[derive(Debug, Clone)]
pub struct CompileOutput {
    pub ast: Ast,
    pub module: IrModule,
}

/// Parse and generate IR for a single already-loaded source file (§6). If
/// `module_output_path` is given and `config.generate_module_file` is set,
/// a `.vamod` is written alongside it in the same generation pass.
///
/// Diagnostics from every stage are reported to `sink`; a lexer or parser
/// failure short-circuits before IR generation is attempted, but IR
/// generation itself accumulates as many diagnostics as it can in one pass
/// (§4.2 "errors are recoverable at the top level").
pub fn compile_source(
    file: FileId,
    source: &str,
    config: &Config,
    module_output_path: Option<&Path>,
    sink: &mut dyn DiagnosticSink,
) -> Result<CompileOutput, IrError> {
    let (tokens, lex_had_error) = lexer::lex(file, source, sink);

    if lex_had_error {
        return Err(IrError(Diagnostic::without_location(
            Severity::Error,
            "one or more lexical errors occurred",
        )));
    }

    let ast = match parser::Parser::parse(file, tokens, sink) {
        Ok(ast) => ast,
        Err(parser_error) => return Err(IrError(parser_error.0)),
    };

    let module = match module_output_path {
        Some(path) => IrGenerator::generate_and_write_module_file(&ast, config, path, sink)?,
        None => ir::generate(&ast, config, sink)?,
    };

    Ok(CompileOutput { ast, module })
}

/// Read `path` into `cache`, then compile it (§6).
pub fn compile_file(
    path: impl AsRef<Path>,
    cache: &SourceCache,
    config: &Config,
    module_output_path: Option<&Path>,
    sink: &mut dyn DiagnosticSink,
) -> std::io::Result<Result<CompileOutput, IrError>> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)?;
    let file = cache.insert(path, content);
    let source = cache.content(file);

    Ok(compile_source(file, &source, config, module_output_path, sink))
}
