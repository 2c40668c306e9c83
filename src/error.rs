//! Stage-specific error types.
//!
//! Each stage returns its own error type rather than a single catch-all;
//! every one carries a [`Diagnostic`] so the caller can render or log it
//! uniformly. `Bug` distinguishes internal invariant violations (§7) from
//! ordinary user errors and is not expected to be recovered from.

use std::fmt;

use crate::diagnostics::Diagnostic;

#[derive(Debug, Clone)]
pub struct LexError(pub Diagnostic);

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.message)
    }
}

impl std::error::Error for LexError {}

#[derive(Debug, Clone)]
pub struct ParseError(pub Diagnostic);

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.message)
    }
}

impl std::error::Error for ParseError {}

#[derive(Debug, Clone)]
pub struct TypeError(pub Diagnostic);

impl fmt::Display for TypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.message)
    }
}

impl std::error::Error for TypeError {}

#[derive(Debug, Clone)]
pub struct IrError(pub Diagnostic);

impl fmt::Display for IrError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.message)
    }
}

impl std::error::Error for IrError {}

#[derive(Debug)]
pub enum ModuleFileError {
    Io(std::io::Error),
    BadMagic,
    UnsupportedVersion(u32),
    Truncated,
    InvalidUtf8,
}

impl fmt::Display for ModuleFileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModuleFileError::Io(e) => write!(f, "I/O error reading module interface: {e}"),
            ModuleFileError::BadMagic => write!(f, "not a .vamod file (bad magic number)"),
            ModuleFileError::UnsupportedVersion(v) => {
                write!(f, "unsupported .vamod version {v}")
            }
            ModuleFileError::Truncated => write!(f, "truncated .vamod file"),
            ModuleFileError::InvalidUtf8 => write!(f, "invalid UTF-8 in .vamod file"),
        }
    }
}

impl std::error::Error for ModuleFileError {}

impl From<std::io::Error> for ModuleFileError {
    fn from(e: std::io::Error) -> Self {
        ModuleFileError::Io(e)
    }
}

/// An internal invariant violation. Distinct from user-facing errors: the
/// compiler itself is wrong, not the input program.
#[derive(Debug, Clone)]
pub struct Bug(pub String);

impl fmt::Display for Bug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "internal compiler error: {}", self.0)
    }
}

impl std::error::Error for Bug {}

impl Bug {
    #[track_caller]
    pub fn panic(message: impl Into<String>) -> ! {
        panic!("internal compiler error: {}", message.into())
    }
}
