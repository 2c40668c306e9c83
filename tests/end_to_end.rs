//! End-to-end scenarios exercising the compiler through the public
//! `vac::compile_source` entry point. Since there is no back end to run a
//! produced binary against, assertions are made against the generated IR
//! text and diagnostics instead of process stdout.

use std::sync::Mutex;

use test_utils::{check_compilation, check_compilation_with, check_failing_compilation};
use vac::config::Config;
use vac::diagnostics::VecSink;
use vac::source::SourceCache;

#[test]
fn empty_function() {
    let module = check_compilation("empty_function.va", "def main() -> i32 { return 0; }");

    let function = module.functions.iter().find(|f| f.name == "main").expect("main function");
    assert_eq!(function.linkage.to_string(), "external");
    assert_eq!(function.blocks.len(), 1);

    let entry = &function.blocks[0];
    assert_eq!(entry.instructions.len(), 2);
    assert_eq!(entry.instructions.last().unwrap().to_string().trim(), "ret %0");
}

#[test]
fn if_else_inference() {
    let src = "def f() -> i32 { let x = 1; if (x == 1) return 2; else return 3; }";
    let module = check_compilation("if_else_inference.va", src);

    let function = module.functions.iter().find(|f| f.name == "f").expect("f function");
    // entry, then, else, merge
    assert_eq!(function.blocks.len(), 4);

    let then_block = &function.blocks[1];
    assert!(then_block.is_terminated());
    assert!(then_block.instructions.iter().any(|i| matches!(i, vac::ir::Instr::Ret { .. })));

    let else_block = &function.blocks[2];
    assert!(else_block.is_terminated());
    assert!(else_block.instructions.iter().any(|i| matches!(i, vac::ir::Instr::Ret { .. })));

    let merge_block = &function.blocks[3];
    assert!(matches!(merge_block.instructions.last(), Some(vac::ir::Instr::Unreachable)));
}

#[test]
fn multiple_functions_each_get_sealed() {
    let src = "def first() -> i32 { if (1 == 1) return 1; else return 0; } \
               def second() -> i32 { if (1 == 1) return 2; else return 0; }";
    let module = check_compilation("multiple_functions.va", src);

    for name in ["first", "second"] {
        let function = module.functions.iter().find(|f| f.name == name).unwrap_or_else(|| panic!("{name} function"));
        for block in &function.blocks {
            assert!(block.is_terminated(), "{name}'s block {:?} was never sealed: {block}", block.id);
        }
    }

    let first = module.functions.iter().find(|f| f.name == "first").unwrap();
    let second = module.functions.iter().find(|f| f.name == "second").unwrap();
    assert_ne!(first.id, second.id, "every function must get its own id");
}

#[test]
fn implicit_cast_on_return_success() {
    let module = check_compilation("implicit_cast_success.va", "def f() -> i64 { return 1; }");
    let function = module.functions.iter().find(|f| f.name == "f").unwrap();
    let entry = &function.blocks[0];
    assert!(entry.instructions.iter().any(|i| matches!(i, vac::ir::Instr::Cast { .. })));
}

#[test]
fn implicit_cast_on_return_failure() {
    check_failing_compilation(
        "implicit_cast_failure.va",
        "def f() -> i16 { return 1; }",
        "cannot implicitly convert",
    );
}

#[test]
fn mutability_rejects_plain_let_reassignment() {
    check_failing_compilation(
        "mutability_reject.va",
        "def f() -> i32 { let x = 1; x = 2; return x; }",
        "immutable",
    );
}

#[test]
fn mutability_accepts_mut_let_reassignment() {
    let module = check_compilation(
        "mutability_accept.va",
        "def f() -> i32 { let mut x = 1; x = 2; return x; }",
    );
    assert!(module.functions.iter().any(|f| f.name == "f"));
}

/// Guards the process-wide current directory, which the `.vamod` path
/// resolution in `gen_import` is relative to. Only this test changes it.
static CWD_LOCK: Mutex<()> = Mutex::new(());

#[test]
fn module_round_trip() {
    let _guard = CWD_LOCK.lock().unwrap();

    let dir = std::env::temp_dir().join(format!("vac-module-round-trip-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let previous = std::env::current_dir().unwrap();
    std::env::set_current_dir(&dir).unwrap();

    let result = (|| {
        let module_a_config = Config {
            generate_module_file: true,
            ..Config::default()
        };
        let cache_a = SourceCache::new();
        let file_a = cache_a.insert("A.va", String::new());
        let src_a = "export def add(a: i32, b: i32) -> i32 { return a + b; }";
        let mut sink_a = VecSink::new();
        vac::compile_source(file_a, src_a, &module_a_config, Some(&dir.join("A")), &mut sink_a)
            .expect("module A should compile");

        assert!(dir.join("A.vamod").exists());

        let output_b = check_compilation_with(
            "B.va",
            "import A; def main() -> i32 { return add(1, 2); }",
            &Config::default(),
        );

        let main_fn = output_b.module.functions.iter().find(|f| f.name == "main").unwrap();
        let rendered = main_fn.to_string();
        assert!(rendered.contains("call i32 @_Va3add_"), "expected a mangled call, got:\n{rendered}");
    })();

    std::env::set_current_dir(&previous).unwrap();
    std::fs::remove_dir_all(&dir).ok();
    result
}

#[test]
fn parse_error_recovery() {
    let cache = SourceCache::new();
    let src = "let x = ; def g() {}";
    let file = cache.insert("parse_error_recovery.va", src.to_owned());
    let config = Config::default();
    let mut sink = VecSink::new();

    let result = vac::compile_source(file, src, &config, None, &mut sink);

    let err = result.expect_err("a file with a syntax error must fail the overall compile");
    assert!(err.0.message.contains("syntax error"));
    assert_eq!(sink.diagnostics.len(), 1, "expected exactly one reported diagnostic: {:#?}", sink.diagnostics);
    assert!(sink.diagnostics[0].message.contains("expected an expression"));
}
