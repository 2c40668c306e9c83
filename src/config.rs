//! The configuration surface recognized by the core (§6). Populated by the
//! out-of-scope CLI collaborator (`src/bin/vac/cli.rs`); the core never
//! parses flags itself.

use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptLevel {
    O0,
    O1,
    O2,
    O3,
    Os,
    Oz,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmitKind {
    None,
    Ast,
    Ir,
    Bitcode,
    Asm,
    Object,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoggingLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Err,
    Critical,
    Off,
}

impl From<LoggingLevel> for log::LevelFilter {
    fn from(value: LoggingLevel) -> Self {
        match value {
            LoggingLevel::Trace => log::LevelFilter::Trace,
            LoggingLevel::Debug => log::LevelFilter::Debug,
            LoggingLevel::Info => log::LevelFilter::Info,
            LoggingLevel::Warn => log::LevelFilter::Warn,
            LoggingLevel::Err => log::LevelFilter::Error,
            LoggingLevel::Critical => log::LevelFilter::Error,
            LoggingLevel::Off => log::LevelFilter::Off,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntSize {
    Pointer,
    Bits32,
    Bits64,
}

/// Where IR/AST-dump/etc. text goes. `"-"` on the CLI means [`OutputTarget::Stdout`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
    Stdout,
    File(PathBuf),
}

impl From<&str> for OutputTarget {
    fn from(value: &str) -> Self {
        if value == "-" {
            OutputTarget::Stdout
        } else {
            OutputTarget::File(PathBuf::from(value))
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub opt_level: OptLevel,
    pub emit: EmitKind,
    pub logging_level: LoggingLevel,
    pub emit_debug: bool,
    pub strip_debug: bool,
    pub strip_source_filename: bool,
    pub generate_module_file: bool,
    pub input_filenames: Vec<PathBuf>,
    pub output_filename: OutputTarget,
    pub jobs: usize,
    pub int_size: IntSize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            opt_level: OptLevel::O0,
            emit: EmitKind::Ir,
            logging_level: LoggingLevel::Err,
            emit_debug: false,
            strip_debug: false,
            strip_source_filename: false,
            generate_module_file: true,
            input_filenames: Vec::new(),
            output_filename: OutputTarget::Stdout,
            jobs: 0,
            int_size: IntSize::Pointer,
        }
    }
}
