//! Source file cache and source locations.
//!
//! A [`SourceCache`] owns every file read during a compile. Tokens and AST
//! nodes never borrow file contents directly; they carry a [`FileId`] plus
//! line/column/offset/length and look the text back up through the cache
//! when they need it (e.g. to render a caret underline).

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

/// A stable handle to a loaded source file. Cheap to copy, valid for the
/// lifetime of the [`SourceCache`] that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FileId(u32);

#[derive(Debug)]
struct FileEntry {
    path: PathBuf,
    content: Arc<str>,
}

/// Read-mostly cache of loaded source files (§5: insertions are guarded by
/// a lock, reads are lock-free after initial population).
#[derive(Default)]
pub struct SourceCache {
    files: RwLock<Vec<FileEntry>>,
    by_path: RwLock<HashMap<PathBuf, FileId>>,
}

impl SourceCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a source file's contents, validating UTF-8. Returns the
    /// existing handle if this path was already inserted.
    pub fn insert(&self, path: impl AsRef<Path>, content: String) -> FileId {
        let path = path.as_ref().to_path_buf();

        if let Some(id) = self.by_path.read().unwrap().get(&path) {
            return *id;
        }

        let mut files = self.files.write().unwrap();
        let id = FileId(files.len() as u32);
        files.push(FileEntry {
            path: path.clone(),
            content: Arc::from(content),
        });
        self.by_path.write().unwrap().insert(path, id);
        id
    }

    pub fn path(&self, id: FileId) -> PathBuf {
        self.files.read().unwrap()[id.0 as usize].path.clone()
    }

    pub fn content(&self, id: FileId) -> Arc<str> {
        Arc::clone(&self.files.read().unwrap()[id.0 as usize].content)
    }

    /// Return the 1-indexed source line of a file, without its terminator.
    pub fn line(&self, id: FileId, line: usize) -> Option<String> {
        let content = self.content(id);
        content.lines().nth(line.checked_sub(1)?).map(str::to_owned)
    }
}

/// A single point in a source file: line and column are 1-indexed and
/// count Unicode scalar values, not bytes; `offset`/`length` are byte
/// offsets into the file for exact slicing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub file: FileId,
    pub line: usize,
    pub column: usize,
    pub offset: usize,
    pub length: usize,
}

impl Span {
    pub fn new(file: FileId, line: usize, column: usize, offset: usize, length: usize) -> Self {
        Self {
            file,
            line,
            column,
            offset,
            length,
        }
    }

    /// A zero-width span at the same start position, used for synthetic
    /// nodes (e.g. an empty `else` branch) that still need a location.
    pub fn zero(file: FileId, line: usize, column: usize, offset: usize) -> Self {
        Self::new(file, line, column, offset, 0)
    }

    pub fn end_column(&self) -> usize {
        self.column + self.length
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_is_idempotent_by_path() {
        let cache = SourceCache::new();
        let a = cache.insert("foo.va", "let x = 1;".to_owned());
        let b = cache.insert("foo.va", "let x = 1;".to_owned());
        assert_eq!(a, b);
    }

    #[test]
    fn line_lookup_is_one_indexed() {
        let cache = SourceCache::new();
        let id = cache.insert("foo.va", "first\nsecond\nthird".to_owned());
        assert_eq!(cache.line(id, 2).as_deref(), Some("second"));
    }
}
