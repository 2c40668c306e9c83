//! # Cli
//!
//! This module contains everything needed for parsing the CLI arguments for vac.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use vac::config::{Config, EmitKind, IntSize, LoggingLevel, OptLevel, OutputTarget};

/// Struct containing the CLI configuration for vac.
#[derive(Parser, Debug)]
#[command(author, version, about)]
#[command(propagate_version = true)]
pub struct Cli {
    /// The Va source files to compile.
    #[arg(required = true)]
    pub input: Vec<PathBuf>,

    /// What to emit: the parsed AST, the generated IR, or nothing (just
    /// check for errors).
    #[arg(value_enum, long, default_value_t = Emit::Ir)]
    pub emit: Emit,

    /// Where to write the emitted output. `-` (the default) means stdout.
    #[arg(short, long, default_value = "-")]
    pub output: String,

    /// Optimization level. Recognized but not yet acted on by this
    /// front/middle-end; kept for forward compatibility with a future
    /// back end.
    #[arg(value_enum, short = 'O', long, default_value_t = Opt::O0)]
    pub opt: Opt,

    /// Emit debug-info instructions (`!dbg.loc`/`!dbg.declare`) into the IR.
    #[arg(short = 'g', long)]
    pub debug: bool,

    /// Do not write a `.vamod` module-interface file alongside the output.
    #[arg(long)]
    pub no_module_file: bool,

    /// Pointer-sized integer width to assume when resolving the `int`
    /// alias.
    #[arg(value_enum, long, default_value_t = IntSizeArg::Pointer)]
    pub int_size: IntSizeArg,

    /// Number of parallel compile jobs. `0` (the default) means "pick a
    /// reasonable default"; the core treats this as advisory only, since
    /// it never spawns threads itself.
    #[arg(short = 'j', long, default_value_t = 0)]
    pub jobs: usize,

    /// Specify the log level of the compiler.
    #[arg(value_enum, short, long, default_value_t = LogLevel::default())]
    pub verbosity: LogLevel,
}

impl Cli {
    pub fn init() -> Self {
        Cli::parse()
    }

    pub fn to_config(&self) -> Config {
        Config {
            opt_level: self.opt.into(),
            emit: self.emit.into(),
            logging_level: (&self.verbosity).into(),
            emit_debug: self.debug,
            strip_debug: false,
            strip_source_filename: false,
            generate_module_file: !self.no_module_file,
            input_filenames: self.input.clone(),
            output_filename: OutputTarget::from(self.output.as_str()),
            jobs: self.jobs,
            int_size: self.int_size.into(),
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Emit {
    None,
    Ast,
    Ir,
}

impl From<Emit> for EmitKind {
    fn from(value: Emit) -> Self {
        match value {
            Emit::None => EmitKind::None,
            Emit::Ast => EmitKind::Ast,
            Emit::Ir => EmitKind::Ir,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Opt {
    O0,
    O1,
    O2,
    O3,
    Os,
    Oz,
}

impl From<Opt> for OptLevel {
    fn from(value: Opt) -> Self {
        match value {
            Opt::O0 => OptLevel::O0,
            Opt::O1 => OptLevel::O1,
            Opt::O2 => OptLevel::O2,
            Opt::O3 => OptLevel::O3,
            Opt::Os => OptLevel::Os,
            Opt::Oz => OptLevel::Oz,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum IntSizeArg {
    Pointer,
    Bits32,
    Bits64,
}

impl From<IntSizeArg> for IntSize {
    fn from(value: IntSizeArg) -> Self {
        match value {
            IntSizeArg::Pointer => IntSize::Pointer,
            IntSizeArg::Bits32 => IntSize::Bits32,
            IntSizeArg::Bits64 => IntSize::Bits64,
        }
    }
}

/// Enum for specifying the log level of vac.
#[derive(ValueEnum, Clone, Default, Debug)]
pub enum LogLevel {
    /// The default log level. Only critical errors will be logged.
    #[default]
    #[value(alias("0"))]
    Error,

    /// A log level, where also warnings (like unused variables) are logged.
    #[value(alias("1"))]
    Warn,

    /// Also log information about the general state of the compiler, e.g., which files are
    /// compiled, etc.
    #[value(alias("2"))]
    Info,

    /// Log everything which happens internally in the compiler.
    /// Note: This output can be quite clunky, since _very much_ will be logged.
    #[value(alias("3"))]
    Debug,

    /// Log extra information. This can include more precise debug output or even non-important
    /// errors.
    #[value(alias("4"))]
    Trace,
}

impl From<&LogLevel> for LoggingLevel {
    fn from(value: &LogLevel) -> Self {
        match value {
            LogLevel::Error => LoggingLevel::Err,
            LogLevel::Warn => LoggingLevel::Warn,
            LogLevel::Info => LoggingLevel::Info,
            LogLevel::Debug => LoggingLevel::Debug,
            LogLevel::Trace => LoggingLevel::Trace,
        }
    }
}

impl From<&LogLevel> for log::Level {
    fn from(value: &LogLevel) -> Self {
        match value {
            LogLevel::Error => log::Level::Error,
            LogLevel::Warn => log::Level::Warn,
            LogLevel::Info => log::Level::Info,
            LogLevel::Debug => log::Level::Debug,
            LogLevel::Trace => log::Level::Trace,
        }
    }
}
