//! The type system (§4.3): a registry of known types, the cast lattice
//! between them, and per-kind operator support tables.

mod cast;
mod ops;
mod registry;

pub use cast::{classify as classify_cast, is_implicit as cast_is_implicit, CastMode};
pub use ops::{
    assign_operator_allowed, binary_operator_allowed, is_callable, unary_operator_allowed, UnsupportedOperator,
};
pub use registry::{DuplicateTypeName, TypeId, TypeKind, TypeRegistry};
