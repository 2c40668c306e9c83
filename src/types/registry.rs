//! The type registry: owned type entries with lookup by canonical name and
//! by back-end handle (§4.3 "Type registry").
//!
//! Modeled on [`crate::source::SourceCache`]'s arena-plus-name-index shape:
//! a flat `Vec` of entries addressed by a small [`TypeId`], with a
//! `HashMap` from canonical name to id layered on top for `find`.

use std::collections::HashMap;
use std::fmt;

use crate::lexer::{FloatWidth, IntWidth};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeId(u32);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeKind {
    Void,
    Int(IntWidth),
    Float(FloatWidth),
    Bool,
    Char,
    /// `bchar`: a byte-sized character (§4.3 cast lattice row `bchar`).
    BChar,
    Byte,
    String,
    CString,
    Function {
        params: Vec<TypeId>,
        return_type: TypeId,
    },
    /// Introduced by a `use` statement (§4.4 "Alias"): a distinct named
    /// type that behaves exactly like `underlying` for casting purposes.
    Alias {
        underlying: TypeId,
    },
}

#[derive(Debug, Clone)]
struct TypeEntry {
    name: String,
    kind: TypeKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DuplicateTypeName;

impl fmt::Display for DuplicateTypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "a type with this name is already registered")
    }
}

impl std::error::Error for DuplicateTypeName {}

/// Owns every type known to a single compile. Primitives are inserted at
/// construction; function types on first use; alias types when a `use`
/// statement is processed (§4.3).
#[derive(Debug, Clone)]
pub struct TypeRegistry {
    entries: Vec<TypeEntry>,
    by_name: HashMap<String, TypeId>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            entries: Vec::new(),
            by_name: HashMap::new(),
        };
        for (name, kind) in Self::primitives() {
            registry.insert_checked(name, kind).expect("primitive names are distinct");
        }
        registry
    }

    fn primitives() -> Vec<(&'static str, TypeKind)> {
        vec![
            ("void", TypeKind::Void),
            ("i8", TypeKind::Int(IntWidth::W8)),
            ("i16", TypeKind::Int(IntWidth::W16)),
            ("i32", TypeKind::Int(IntWidth::W32)),
            ("i64", TypeKind::Int(IntWidth::W64)),
            ("f32", TypeKind::Float(FloatWidth::W32)),
            ("f64", TypeKind::Float(FloatWidth::W64)),
            ("bool", TypeKind::Bool),
            ("char", TypeKind::Char),
            ("bchar", TypeKind::BChar),
            ("byte", TypeKind::Byte),
            ("string", TypeKind::String),
            ("cstring", TypeKind::CString),
        ]
    }

    fn insert_checked(&mut self, name: impl Into<String>, kind: TypeKind) -> Result<TypeId, DuplicateTypeName> {
        let name = name.into();
        if self.by_name.contains_key(&name) {
            return Err(DuplicateTypeName);
        }
        let id = TypeId(self.entries.len() as u32);
        self.entries.push(TypeEntry { name: name.clone(), kind });
        self.by_name.insert(name, id);
        Ok(id)
    }

    pub fn find(&self, name: &str) -> Option<TypeId> {
        self.by_name.get(name).copied()
    }

    pub fn name(&self, id: TypeId) -> &str {
        &self.entries[id.0 as usize].name
    }

    pub fn kind(&self, id: TypeId) -> &TypeKind {
        &self.entries[id.0 as usize].kind
    }

    /// Resolve through `Alias` links to the underlying concrete kind,
    /// used everywhere casting/operation rules need the real type family.
    pub fn resolve(&self, id: TypeId) -> TypeId {
        let mut current = id;
        while let TypeKind::Alias { underlying } = self.kind(current) {
            current = *underlying;
        }
        current
    }

    /// Insert (or reuse) a function type, keyed by its canonical signature
    /// string so two identical prototypes share one `TypeId` (§4.3
    /// "Function types are inserted on first use").
    pub fn function_type(&mut self, params: Vec<TypeId>, return_type: TypeId) -> TypeId {
        let canonical = self.function_signature(&params, return_type);
        if let Some(id) = self.find(&canonical) {
            return id;
        }
        self.insert_checked(canonical, TypeKind::Function { params, return_type })
            .expect("canonical signature was just checked absent")
    }

    /// Canonical string form of a function type (§3 "Types are process-wide
    /// keyed by a canonical string form"): `"ret(param1,param2,…)"`.
    pub fn function_signature(&self, params: &[TypeId], return_type: TypeId) -> String {
        let param_names: Vec<&str> = params.iter().map(|p| self.name(*p)).collect();
        format!("{}({})", self.name(return_type), param_names.join(","))
    }

    /// Register a `use new_name = existing_name;` alias (§4.3, §4.4).
    /// Errors if `new_name` is already registered (re-insertion rule).
    pub fn alias(&mut self, new_name: &str, underlying: TypeId) -> Result<TypeId, DuplicateTypeName> {
        self.insert_checked(new_name, TypeKind::Alias { underlying })
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primitives_are_preregistered() {
        let registry = TypeRegistry::new();
        let i32_id = registry.find("i32").expect("i32 should be registered");
        assert_eq!(registry.kind(i32_id), &TypeKind::Int(IntWidth::W32));
    }

    #[test]
    fn function_types_are_deduplicated_by_signature() {
        let mut registry = TypeRegistry::new();
        let i32_id = registry.find("i32").unwrap();
        let a = registry.function_type(vec![i32_id, i32_id], i32_id);
        let b = registry.function_type(vec![i32_id, i32_id], i32_id);
        assert_eq!(a, b);
    }

    #[test]
    fn alias_resolves_to_underlying() {
        let mut registry = TypeRegistry::new();
        let i64_id = registry.find("i64").unwrap();
        let alias_id = registry.alias("Handle", i64_id).unwrap();
        assert_eq!(registry.resolve(alias_id), i64_id);
    }

    #[test]
    fn function_signature_is_ret_then_params() {
        let registry = TypeRegistry::new();
        let i32_id = registry.find("i32").unwrap();
        let bool_id = registry.find("bool").unwrap();
        assert_eq!(registry.function_signature(&[i32_id, bool_id], i32_id), "i32(i32,bool)");
    }

    #[test]
    fn duplicate_type_name_is_rejected() {
        let mut registry = TypeRegistry::new();
        let i64_id = registry.find("i64").unwrap();
        assert!(registry.alias("i64", i64_id).is_err());
    }
}
