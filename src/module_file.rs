//! The `.vamod` module-interface codec (§3 "Module-interface file", §4.3
//! "Export writing"): a small binary archive of a module's exported
//! function prototypes and global variables, written next to a module's
//! output file and read back in by importers.
//!
//! Format: a 4-byte magic, a `u32` version, an optional module-name entry,
//! then a `u32` count of tagged, length-prefixed export records. No
//! external serialization crate is used — the format is small, stable,
//! and entirely owned by this compiler, so a hand-rolled reader/writer
//! keeps the on-disk shape explicit.

use std::fs::File;
use std::io::{self, Read, Write};
use std::path::Path;

use crate::error::ModuleFileError;

const MAGIC: &[u8; 4] = b"VAMD";
const VERSION: u32 = 1;

const TAG_FUNCTION: u8 = 0;
const TAG_GLOBAL: u8 = 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedFunction {
    pub name: String,
    pub return_type: String,
    pub params: Vec<String>,
    /// Whether this function was emitted under a mangled linkage name
    /// (`false` when the definition carried `nomangle`).
    pub mangled: bool,
    pub mangled_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedGlobal {
    pub name: String,
    pub type_name: String,
    pub is_mutable: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportedSymbol {
    Function(ExportedFunction),
    Global(ExportedGlobal),
}

impl ExportedSymbol {
    pub fn name(&self) -> &str {
        match self {
            ExportedSymbol::Function(f) => &f.name,
            ExportedSymbol::Global(g) => &g.name,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleInterface {
    pub module_name: Option<String>,
    pub exports: Vec<ExportedSymbol>,
}

impl ModuleInterface {
    pub fn write(&self, path: impl AsRef<Path>) -> Result<(), ModuleFileError> {
        let mut file = File::create(path)?;
        write_all_bytes(&mut file, MAGIC)?;
        write_u32(&mut file, VERSION)?;
        write_opt_str(&mut file, self.module_name.as_deref())?;
        write_u32(&mut file, self.exports.len() as u32)?;
        for export in &self.exports {
            write_export(&mut file, export)?;
        }
        Ok(())
    }

    pub fn read(path: impl AsRef<Path>) -> Result<Self, ModuleFileError> {
        let mut file = File::open(path)?;
        let mut magic = [0u8; 4];
        file.read_exact(&mut magic).map_err(|_| ModuleFileError::Truncated)?;
        if &magic != MAGIC {
            return Err(ModuleFileError::BadMagic);
        }

        let version = read_u32(&mut file)?;
        if version != VERSION {
            return Err(ModuleFileError::UnsupportedVersion(version));
        }

        let module_name = read_opt_str(&mut file)?;
        let count = read_u32(&mut file)?;
        let mut exports = Vec::with_capacity(count as usize);
        for _ in 0..count {
            exports.push(read_export(&mut file)?);
        }

        Ok(Self { module_name, exports })
    }
}

fn write_all_bytes(w: &mut impl Write, bytes: &[u8]) -> Result<(), ModuleFileError> {
    w.write_all(bytes)?;
    Ok(())
}

fn write_u32(w: &mut impl Write, value: u32) -> Result<(), ModuleFileError> {
    w.write_all(&value.to_le_bytes())?;
    Ok(())
}

fn write_u8(w: &mut impl Write, value: u8) -> Result<(), ModuleFileError> {
    w.write_all(&[value])?;
    Ok(())
}

fn write_str(w: &mut impl Write, s: &str) -> Result<(), ModuleFileError> {
    write_u32(w, s.len() as u32)?;
    w.write_all(s.as_bytes())?;
    Ok(())
}

fn write_opt_str(w: &mut impl Write, s: Option<&str>) -> Result<(), ModuleFileError> {
    match s {
        Some(s) => {
            write_u8(w, 1)?;
            write_str(w, s)
        }
        None => write_u8(w, 0),
    }
}

fn write_str_list(w: &mut impl Write, items: &[String]) -> Result<(), ModuleFileError> {
    write_u32(w, items.len() as u32)?;
    for item in items {
        write_str(w, item)?;
    }
    Ok(())
}

fn write_export(w: &mut impl Write, export: &ExportedSymbol) -> Result<(), ModuleFileError> {
    match export {
        ExportedSymbol::Function(f) => {
            write_u8(w, TAG_FUNCTION)?;
            write_str(w, &f.name)?;
            write_str(w, &f.return_type)?;
            write_str_list(w, &f.params)?;
            write_u8(w, f.mangled as u8)?;
            write_opt_str(w, f.mangled_name.as_deref())?;
        }
        ExportedSymbol::Global(g) => {
            write_u8(w, TAG_GLOBAL)?;
            write_str(w, &g.name)?;
            write_str(w, &g.type_name)?;
            write_u8(w, g.is_mutable as u8)?;
        }
    }
    Ok(())
}

fn read_exact(r: &mut impl Read, buf: &mut [u8]) -> Result<(), ModuleFileError> {
    r.read_exact(buf).map_err(|e| match e.kind() {
        io::ErrorKind::UnexpectedEof => ModuleFileError::Truncated,
        _ => ModuleFileError::Io(e),
    })
}

fn read_u32(r: &mut impl Read) -> Result<u32, ModuleFileError> {
    let mut buf = [0u8; 4];
    read_exact(r, &mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

fn read_u8(r: &mut impl Read) -> Result<u8, ModuleFileError> {
    let mut buf = [0u8; 1];
    read_exact(r, &mut buf)?;
    Ok(buf[0])
}

fn read_str(r: &mut impl Read) -> Result<String, ModuleFileError> {
    let len = read_u32(r)? as usize;
    let mut buf = vec![0u8; len];
    read_exact(r, &mut buf)?;
    String::from_utf8(buf).map_err(|_| ModuleFileError::InvalidUtf8)
}

fn read_opt_str(r: &mut impl Read) -> Result<Option<String>, ModuleFileError> {
    if read_u8(r)? == 1 {
        Ok(Some(read_str(r)?))
    } else {
        Ok(None)
    }
}

fn read_str_list(r: &mut impl Read) -> Result<Vec<String>, ModuleFileError> {
    let len = read_u32(r)? as usize;
    let mut items = Vec::with_capacity(len);
    for _ in 0..len {
        items.push(read_str(r)?);
    }
    Ok(items)
}

fn read_export(r: &mut impl Read) -> Result<ExportedSymbol, ModuleFileError> {
    let tag = read_u8(r)?;
    match tag {
        TAG_FUNCTION => Ok(ExportedSymbol::Function(ExportedFunction {
            name: read_str(r)?,
            return_type: read_str(r)?,
            params: read_str_list(r)?,
            mangled: read_u8(r)? != 0,
            mangled_name: read_opt_str(r)?,
        })),
        TAG_GLOBAL => Ok(ExportedSymbol::Global(ExportedGlobal {
            name: read_str(r)?,
            type_name: read_str(r)?,
            is_mutable: read_u8(r)? != 0,
        })),
        _ => Err(ModuleFileError::Truncated),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_preserves_exported_symbol_set() {
        let dir = std::env::temp_dir().join(format!("vac-vamod-test-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("a.vamod");

        let iface = ModuleInterface {
            module_name: Some("a.b".to_owned()),
            exports: vec![
                ExportedSymbol::Function(ExportedFunction {
                    name: "add".to_owned(),
                    return_type: "i32".to_owned(),
                    params: vec!["i32".to_owned(), "i32".to_owned()],
                    mangled: true,
                    mangled_name: Some("_Va3add_i32_i32".to_owned()),
                }),
                ExportedSymbol::Global(ExportedGlobal {
                    name: "counter".to_owned(),
                    type_name: "i64".to_owned(),
                    is_mutable: true,
                }),
            ],
        };

        iface.write(&path).unwrap();
        let read_back = ModuleInterface::read(&path).unwrap();
        assert_eq!(iface, read_back);

        std::fs::remove_file(&path).ok();
        std::fs::remove_dir(&dir).ok();
    }

    #[test]
    fn bad_magic_is_rejected() {
        let dir = std::env::temp_dir().join(format!("vac-vamod-badmagic-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("bad.vamod");
        std::fs::write(&path, b"nope").unwrap();

        assert!(matches!(ModuleInterface::read(&path), Err(ModuleFileError::BadMagic)));

        std::fs::remove_file(&path).ok();
        std::fs::remove_dir(&dir).ok();
    }
}
