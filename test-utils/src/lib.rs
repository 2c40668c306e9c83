//! Shared helpers for driving the compiler in-process during tests,
//! instead of spawning a built binary and inspecting its process output.

use vac::config::Config;
use vac::diagnostics::{DiagnosticSink, VecSink};
use vac::ir::IrModule;
use vac::source::SourceCache;
use vac::CompileOutput;

/// Compile `src` as a single file named `name`, asserting the compile
/// succeeds, and return the generated module.
pub fn check_compilation(name: &str, src: &str) -> IrModule {
    check_compilation_with(name, src, &Config::default()).module
}

/// Compile `src` with a caller-supplied `Config`, asserting the compile
/// succeeds, and return the whole [`CompileOutput`] (AST and module).
pub fn check_compilation_with(name: &str, src: &str, config: &Config) -> CompileOutput {
    let cache = SourceCache::new();
    let file = cache.insert(name, src.to_owned());
    let mut sink = VecSink::new();

    match vac::compile_source(file, src, config, None, &mut sink) {
        Ok(output) => output,
        Err(err) => panic!("expected {name} to compile, got: {err}\n{:#?}", sink.diagnostics),
    }
}

/// Compile `src`, asserting it fails, and assert that at least one
/// reported error message contains `expected_substring`.
pub fn check_failing_compilation(name: &str, src: &str, expected_substring: &str) {
    let cache = SourceCache::new();
    let file = cache.insert(name, src.to_owned());
    let config = Config::default();
    let mut sink = VecSink::new();

    let result = vac::compile_source(file, src, &config, None, &mut sink);

    assert!(result.is_err(), "expected {name} to fail to compile, but it succeeded");
    assert!(sink.has_errors(), "compile failed but no error diagnostic was reported");
    assert!(
        sink.errors().any(|d| d.message.contains(expected_substring)),
        "expected an error containing {expected_substring:?}, got: {:#?}",
        sink.diagnostics
    );
}
