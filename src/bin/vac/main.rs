//! # vac
//!
//! This binary is the compiler front/middle-end of Va. It combines lexer,
//! parser, and IR generator into a single application; back-end code
//! generation is out of scope (§1).

mod cli;

use std::io::Write as _;
use std::path::Path;
use std::process::ExitCode;

use clap::Parser;
use log::{error, info};

use cli::Cli;
use vac::compile_file;
use vac::config::{Config, EmitKind, OutputTarget};
use vac::diagnostics::LogSink;
use vac::source::SourceCache;

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            eprint!("{err}");
            return ExitCode::from(255);
        }
    };

    let config = cli.to_config();

    simple_logger::init_with_level((&cli.verbosity).into()).unwrap();

    let cache = SourceCache::new();
    let mut had_failure = false;

    for input in &config.input_filenames {
        if !run_one(input, &cache, &config) {
            had_failure = true;
        }
    }

    if had_failure {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

/// Compile a single file, writing whatever `--emit` asked for. Returns
/// whether the compile succeeded.
fn run_one(input: &Path, cache: &SourceCache, config: &Config) -> bool {
    info!("compiling {}", input.display());

    let mut sink = LogSink::new(cache);
    let module_output_path = module_file_path(input, config);

    let output = match compile_file(input, cache, config, Some(&module_output_path), &mut sink) {
        Ok(Ok(output)) => output,
        Ok(Err(compile_error)) => {
            error!("{compile_error}");
            return false;
        }
        Err(io_error) => {
            error!("could not read {}: {io_error}", input.display());
            return false;
        }
    };

    let rendered = match config.emit {
        EmitKind::None => return true,
        EmitKind::Ast => output.ast.dump(),
        EmitKind::Ir => output.module.to_string(),
        EmitKind::Bitcode | EmitKind::Asm | EmitKind::Object => {
            error!("--emit={:?} has no back end in this build", config.emit);
            return false;
        }
    };

    write_output(&rendered, &config.output_filename).is_ok()
}

fn module_file_path(input: &Path, config: &Config) -> std::path::PathBuf {
    match &config.output_filename {
        OutputTarget::File(path) => path.with_extension("vamod"),
        OutputTarget::Stdout => input.with_extension("vamod"),
    }
}

fn write_output(rendered: &str, target: &OutputTarget) -> std::io::Result<()> {
    match target {
        OutputTarget::Stdout => {
            print!("{rendered}");
            std::io::stdout().flush()
        }
        OutputTarget::File(path) => std::fs::write(path, rendered),
    }
}
